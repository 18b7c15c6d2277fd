//! Signal export adapter implementing ChartPort.
//!
//! Writes the buy and sell signals of a traded run to `<dir>/<title>.csv` so
//! they can be plotted by an external tool over the candle file.

use crate::domain::backtest::Signal;
use crate::domain::candle_series::CandleSeries;
use crate::ports::chart_port::ChartPort;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub struct SignalCsvAdapter {
    output_dir: PathBuf,
}

impl SignalCsvAdapter {
    pub fn new(output_dir: PathBuf) -> Self {
        Self { output_dir }
    }

    pub fn output_path(&self, title: &str) -> PathBuf {
        let file_name: String = title
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' { c } else { '_' })
            .collect();
        self.output_dir.join(format!("{}.csv", file_name))
    }

    fn write(&self, path: &Path, buys: &[Signal], sells: &[Signal]) -> Result<(), csv::Error> {
        fs::create_dir_all(&self.output_dir)?;
        let mut writer = csv::Writer::from_path(path)?;
        writer.write_record(["side", "timestamp", "price"])?;

        let rows = buys
            .iter()
            .map(|s| ("buy", s))
            .chain(sells.iter().map(|s| ("sell", s)));
        for (side, signal) in rows {
            writer.write_record([
                side.to_string(),
                signal.timestamp.to_rfc3339(),
                signal.price.to_string(),
            ])?;
        }

        writer.flush()?;
        Ok(())
    }
}

impl ChartPort for SignalCsvAdapter {
    fn render(&self, series: &CandleSeries, buys: &[Signal], sells: &[Signal], title: &str) {
        let path = self.output_path(title);
        match self.write(&path, buys, sells) {
            Ok(()) => debug!(
                symbol = %series.symbol,
                path = %path.display(),
                buys = buys.len(),
                sells = sells.len(),
                "wrote signal file"
            ),
            Err(e) => warn!(symbol = %series.symbol, path = %path.display(), "failed to write signals: {}", e),
        }
    }
}
