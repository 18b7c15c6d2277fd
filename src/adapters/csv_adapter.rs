//! CSV file market data adapter.
//!
//! Layout: one file per symbol and interval, `<base>/<SYMBOL>_<interval>.csv`,
//! with header `timestamp,open,high,low,close,volume`. Timestamps are epoch
//! milliseconds (kline open time) or RFC 3339.

use crate::domain::candle::Candle;
use crate::domain::error::RatchetError;
use crate::ports::data_port::MarketDataPort;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use std::collections::BTreeSet;
use std::fs;
use std::path::PathBuf;
use std::str::FromStr;

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, symbol: &str, interval: &str) -> PathBuf {
        self.base_path.join(format!("{}_{}.csv", symbol, interval))
    }
}

pub(crate) fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(millis) = value.parse::<i64>() {
        return DateTime::from_timestamp_millis(millis);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

fn decimal_column(
    record: &csv::StringRecord,
    index: usize,
    name: &str,
    symbol: &str,
) -> Result<Decimal, RatchetError> {
    let raw = record.get(index).ok_or_else(|| RatchetError::Fetch {
        symbol: symbol.to_string(),
        reason: format!("missing {} column", name),
    })?;
    Decimal::from_str(raw.trim()).map_err(|e| RatchetError::Fetch {
        symbol: symbol.to_string(),
        reason: format!("invalid {} value '{}': {}", name, raw, e),
    })
}

impl MarketDataPort for CsvAdapter {
    fn fetch_candles(&self, symbol: &str, interval: &str) -> Result<Vec<Candle>, RatchetError> {
        let path = self.csv_path(symbol, interval);
        let content = fs::read_to_string(&path).map_err(|e| RatchetError::Fetch {
            symbol: symbol.to_string(),
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let mut candles = Vec::new();

        for result in rdr.records() {
            let record = result.map_err(|e| RatchetError::Fetch {
                symbol: symbol.to_string(),
                reason: format!("CSV parse error: {}", e),
            })?;

            let raw_ts = record.get(0).ok_or_else(|| RatchetError::Fetch {
                symbol: symbol.to_string(),
                reason: "missing timestamp column".into(),
            })?;
            let timestamp = parse_timestamp(raw_ts).ok_or_else(|| RatchetError::Fetch {
                symbol: symbol.to_string(),
                reason: format!("invalid timestamp '{}'", raw_ts),
            })?;

            candles.push(Candle {
                timestamp,
                open: decimal_column(&record, 1, "open", symbol)?,
                high: decimal_column(&record, 2, "high", symbol)?,
                low: decimal_column(&record, 3, "low", symbol)?,
                close: decimal_column(&record, 4, "close", symbol)?,
                volume: decimal_column(&record, 5, "volume", symbol)?,
            });
        }

        candles.sort_by_key(|c| c.timestamp);
        Ok(candles)
    }

    fn list_symbols(
        &self,
        interval: &str,
        quote_assets: &[String],
    ) -> Result<Vec<String>, RatchetError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| RatchetError::Fetch {
            symbol: "*".into(),
            reason: format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ),
        })?;

        let quotes: Vec<String> = quote_assets.iter().map(|q| q.to_uppercase()).collect();
        let suffix = format!("_{}.csv", interval);
        let mut symbols = BTreeSet::new();

        for entry in entries {
            let entry = entry.map_err(|e| RatchetError::Fetch {
                symbol: "*".into(),
                reason: format!("directory entry error: {}", e),
            })?;

            let name = entry.file_name();
            let name_str = name.to_string_lossy();
            let Some(symbol) = name_str.strip_suffix(suffix.as_str()) else {
                continue;
            };
            if symbol.is_empty() {
                continue;
            }
            if quotes.is_empty() || quotes.iter().any(|q| symbol.ends_with(q.as_str())) {
                symbols.insert(symbol.to_string());
            }
        }

        Ok(symbols.into_iter().collect())
    }
}
