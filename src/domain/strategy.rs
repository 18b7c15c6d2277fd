//! Entry-signal strategies.
//!
//! A strategy is anything implementing [`SignalFunction`]: a pure, deterministic
//! decision at one candle index returning the entry price, or `None`. The two
//! built-in strategies are dip buyers that enter when the close trades below a
//! discounted reference indicator.

use crate::domain::candle_series::CandleSeries;
use crate::domain::indicator::IndicatorType;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

pub trait SignalFunction {
    fn name(&self) -> &str;

    /// Indicator columns the series must carry for `evaluate` to fire.
    fn indicators(&self) -> Vec<IndicatorType>;

    fn evaluate(&self, series: &CandleSeries, index: usize) -> Option<Decimal>;

    /// Signal on the most recent candle.
    fn evaluate_latest(&self, series: &CandleSeries) -> Option<Decimal> {
        self.evaluate(series, series.last_index())
    }
}

/// Buy at `discount * reference` once the close is at or below that level,
/// capped at the candle high.
#[derive(Debug, Clone, PartialEq)]
pub struct DipRule {
    pub indicator: IndicatorType,
    pub discount: Decimal,
}

impl DipRule {
    pub fn evaluate(&self, series: &CandleSeries, index: usize) -> Option<Decimal> {
        let reference = series.indicator_at(&self.indicator, index)?;
        let candle = series.candle(index)?;
        let buy_price = self.discount.checked_mul(reference)?;
        if buy_price >= candle.close {
            Some(buy_price.min(candle.high))
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Strategy {
    /// Dip below a slow moving average.
    MaDip(DipRule),
    /// Dip below the lower Bollinger band.
    BandDip(DipRule),
}

impl Strategy {
    pub const MA_DIP: &'static str = "ma_dip";
    pub const BAND_DIP: &'static str = "band_dip";

    pub fn ma_dip() -> Self {
        Strategy::MaDip(DipRule {
            indicator: IndicatorType::Smma(30),
            discount: dec!(0.96),
        })
    }

    pub fn band_dip() -> Self {
        Strategy::BandDip(DipRule {
            indicator: IndicatorType::LowerBollinger {
                period: 14,
                stddev_mult_x100: 200,
            },
            discount: dec!(0.975),
        })
    }

    /// Default-parameter strategy for a configuration name.
    pub fn by_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            Self::MA_DIP => Some(Self::ma_dip()),
            Self::BAND_DIP => Some(Self::band_dip()),
            _ => None,
        }
    }

    pub fn rule(&self) -> &DipRule {
        match self {
            Strategy::MaDip(rule) | Strategy::BandDip(rule) => rule,
        }
    }

    pub fn rule_mut(&mut self) -> &mut DipRule {
        match self {
            Strategy::MaDip(rule) | Strategy::BandDip(rule) => rule,
        }
    }
}

impl SignalFunction for Strategy {
    fn name(&self) -> &str {
        match self {
            Strategy::MaDip(_) => Self::MA_DIP,
            Strategy::BandDip(_) => Self::BAND_DIP,
        }
    }

    fn indicators(&self) -> Vec<IndicatorType> {
        vec![self.rule().indicator]
    }

    fn evaluate(&self, series: &CandleSeries, index: usize) -> Option<Decimal> {
        self.rule().evaluate(series, index)
    }
}
