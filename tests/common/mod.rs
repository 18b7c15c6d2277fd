#![allow(dead_code)]

use chrono::{DateTime, Utc};
use ratchet::domain::backtest::Signal;
pub use ratchet::domain::candle::Candle;
use ratchet::domain::candle_series::CandleSeries;
use ratchet::domain::error::RatchetError;
use ratchet::domain::indicator::IndicatorType;
use ratchet::domain::strategy::Strategy;
use ratchet::ports::chart_port::ChartPort;
use ratchet::ports::data_port::MarketDataPort;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::Mutex;

pub struct MockDataPort {
    pub data: HashMap<String, Vec<Candle>>,
    pub errors: HashMap<String, String>,
    pub fetches: Mutex<Vec<String>>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
            fetches: Mutex::new(Vec::new()),
        }
    }

    pub fn with_candles(mut self, symbol: &str, candles: Vec<Candle>) -> Self {
        self.data.insert(symbol.to_string(), candles);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }

    pub fn fetch_count(&self, symbol: &str) -> usize {
        self.fetches
            .lock()
            .unwrap()
            .iter()
            .filter(|s| s.as_str() == symbol)
            .count()
    }
}

impl MarketDataPort for MockDataPort {
    fn fetch_candles(&self, symbol: &str, _interval: &str) -> Result<Vec<Candle>, RatchetError> {
        self.fetches.lock().unwrap().push(symbol.to_string());
        if let Some(reason) = self.errors.get(symbol) {
            return Err(RatchetError::Fetch {
                symbol: symbol.to_string(),
                reason: reason.clone(),
            });
        }
        Ok(self.data.get(symbol).cloned().unwrap_or_default())
    }

    fn list_symbols(
        &self,
        _interval: &str,
        quote_assets: &[String],
    ) -> Result<Vec<String>, RatchetError> {
        let mut symbols: Vec<String> = self
            .data
            .keys()
            .filter(|s| quote_assets.is_empty() || quote_assets.iter().any(|q| s.ends_with(q.as_str())))
            .cloned()
            .collect();
        symbols.sort();
        Ok(symbols)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChartCall {
    pub symbol: String,
    pub title: String,
    pub buys: Vec<Signal>,
    pub sells: Vec<Signal>,
}

pub struct RecordingChart {
    pub calls: RefCell<Vec<ChartCall>>,
}

impl RecordingChart {
    pub fn new() -> Self {
        Self {
            calls: RefCell::new(Vec::new()),
        }
    }
}

impl ChartPort for RecordingChart {
    fn render(&self, series: &CandleSeries, buys: &[Signal], sells: &[Signal], title: &str) {
        self.calls.borrow_mut().push(ChartCall {
            symbol: series.symbol.clone(),
            title: title.to_string(),
            buys: buys.to_vec(),
            sells: sells.to_vec(),
        });
    }
}

pub fn ts(hour: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(1_704_067_200_000 + hour * 3_600_000).unwrap()
}

pub fn candle(hour: i64, high: Decimal, low: Decimal, close: Decimal) -> Candle {
    Candle {
        timestamp: ts(hour),
        open: close,
        high,
        low,
        close,
        volume: dec!(1000),
    }
}

pub fn flat_candles(n: usize, price: Decimal) -> Vec<Candle> {
    (0..n as i64)
        .map(|i| candle(i, price, price, price))
        .collect()
}

/// Enter at 100, ratchet on candle 2, stop out at 101.8875 on candle 3.
pub fn ratchet_scenario() -> Vec<Candle> {
    vec![
        candle(0, dec!(100), dec!(100), dec!(100)),
        candle(1, dec!(103), dec!(90), dec!(95)),
        candle(2, dec!(106), dec!(100), dec!(105)),
        candle(3, dec!(104), dec!(100), dec!(101)),
        candle(4, dec!(100), dec!(100), dec!(100)),
    ]
}

/// Enter at 100, stop out at 85 on candle 1.
pub fn stop_out_scenario() -> Vec<Candle> {
    vec![
        candle(0, dec!(100), dec!(100), dec!(100)),
        candle(1, dec!(101), dec!(80), dec!(90)),
        candle(2, dec!(90), dec!(90), dec!(90)),
    ]
}

/// An MA-dip variant whose reference is the close itself at full price, so
/// it signals on every candle at the close.
pub fn buy_every_candle() -> Strategy {
    let mut strategy = Strategy::ma_dip();
    let rule = strategy.rule_mut();
    rule.indicator = IndicatorType::Sma(1);
    rule.discount = Decimal::ONE;
    strategy
}
