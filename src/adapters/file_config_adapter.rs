//! INI file configuration adapter.
//!
//! Integer and boolean keys that are present but malformed fall back to the
//! caller's default and log a warning.

use std::path::Path;

use configparser::ini::Ini;
use tracing::warn;

use crate::domain::error::RatchetError;
use crate::ports::config_port::ConfigPort;

#[derive(Debug)]
pub struct FileConfigAdapter {
    ini: Ini,
}

impl FileConfigAdapter {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, RatchetError> {
        let path = path.as_ref();
        let mut ini = Ini::new();
        ini.load(path).map_err(|reason| RatchetError::ConfigParse {
            file: path.display().to_string(),
            reason,
        })?;
        Ok(Self { ini })
    }

    pub fn from_string(content: &str) -> Result<Self, RatchetError> {
        let mut ini = Ini::new();
        ini.read(content.to_string())
            .map_err(|reason| RatchetError::ConfigParse {
                file: "<string>".into(),
                reason,
            })?;
        Ok(Self { ini })
    }

    fn typed<T>(
        &self,
        section: &str,
        key: &str,
        default: T,
        parse: impl Fn(&str) -> Option<T>,
    ) -> T {
        let Some(raw) = self.get_string(section, key) else {
            return default;
        };
        parse(&raw).unwrap_or_else(|| {
            warn!(section, key, value = %raw, "ignoring malformed config value");
            default
        })
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Some(true),
        "false" | "no" | "off" | "0" => Some(false),
        _ => None,
    }
}

impl ConfigPort for FileConfigAdapter {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.ini.get(section, key).map(|v| v.trim().to_string())
    }

    fn get_int(&self, section: &str, key: &str, default: i64) -> i64 {
        self.typed(section, key, default, |v| v.parse().ok())
    }

    fn get_bool(&self, section: &str, key: &str, default: bool) -> bool {
        self.typed(section, key, default, parse_bool)
    }
}
