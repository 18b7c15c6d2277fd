//! Smoothed Moving Average indicator.
//!
//! Exponentially weighted mean of every close so far with `alpha = 1/n`,
//! normalized by the sum of weights:
//! SMMA[i] = sum(w^k * C[i-k]) / sum(w^k) for k in 0..=i, where w = (n-1)/n.
//! Warmup: first (n-1) candles are `None`.

use crate::domain::candle::Candle;
use crate::domain::indicator::{IndicatorSeries, IndicatorType};
use rust_decimal::Decimal;

pub fn calculate_smma(candles: &[Candle], period: usize) -> IndicatorSeries {
    if period == 0 || candles.len() < period {
        return IndicatorSeries {
            indicator_type: IndicatorType::Smma(period),
            values: vec![None; candles.len()],
        };
    }

    let n = Decimal::from(period);
    let decay = (n - Decimal::ONE) / n;
    let mut values = Vec::with_capacity(candles.len());
    // weighted sum of closes and sum of weights; None once either overflows
    let mut sums = Some((Decimal::ZERO, Decimal::ZERO));

    for (i, candle) in candles.iter().enumerate() {
        sums = sums.and_then(|(weighted, weights)| {
            Some((
                weighted.checked_mul(decay)?.checked_add(candle.close)?,
                weights.checked_mul(decay)?.checked_add(Decimal::ONE)?,
            ))
        });
        if i + 1 < period {
            values.push(None);
        } else {
            values.push(sums.and_then(|(weighted, weights)| weighted.checked_div(weights)));
        }
    }

    IndicatorSeries {
        indicator_type: IndicatorType::Smma(period),
        values,
    }
}
