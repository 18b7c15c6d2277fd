//! Lower Bollinger Band indicator.
//!
//! Lower = SMA(n) - (multiplier × sample StdDev(n)) over closing prices.
//!
//! Default parameters: period=14, multiplier=2.0
//! Warmup: first (period-1) candles are `None`.

use crate::domain::candle::Candle;
use crate::domain::indicator::stddev::{mean, sample_stddev};
use crate::domain::indicator::{IndicatorSeries, IndicatorType};
use rust_decimal::Decimal;

pub fn calculate_lower_bollinger(
    candles: &[Candle],
    period: usize,
    stddev_mult_x100: u32,
) -> IndicatorSeries {
    let closes: Vec<Decimal> = candles.iter().map(|c| c.close).collect();
    let mult = Decimal::new(stddev_mult_x100 as i64, 2);

    let values = (0..closes.len())
        .map(|i| {
            if period < 2 || i + 1 < period {
                return None;
            }
            let window = &closes[i + 1 - period..=i];
            let middle = mean(window)?;
            let stddev = sample_stddev(window)?;
            middle.checked_sub(mult.checked_mul(stddev)?)
        })
        .collect();

    IndicatorSeries {
        indicator_type: IndicatorType::LowerBollinger {
            period,
            stddev_mult_x100,
        },
        values,
    }
}
