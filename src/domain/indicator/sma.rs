//! Simple Moving Average indicator.
//!
//! SMA(n)[i] = mean(C[i-n+1..=i]). Warmup: first (n-1) candles are `None`.

use crate::domain::candle::Candle;
use crate::domain::indicator::stddev::mean;
use crate::domain::indicator::{IndicatorSeries, IndicatorType};
use rust_decimal::Decimal;

pub fn calculate_sma(candles: &[Candle], period: usize) -> IndicatorSeries {
    let closes: Vec<Decimal> = candles.iter().map(|c| c.close).collect();
    let values = (0..closes.len())
        .map(|i| {
            if period == 0 || i + 1 < period {
                None
            } else {
                mean(&closes[i + 1 - period..=i])
            }
        })
        .collect();

    IndicatorSeries {
        indicator_type: IndicatorType::Sma(period),
        values,
    }
}
