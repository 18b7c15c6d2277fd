//! OHLCV candle representation.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

#[derive(Debug, Clone, PartialEq)]
pub struct Candle {
    pub timestamp: DateTime<Utc>,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: Decimal,
}

impl Candle {
    /// Positive prices with `low <= open, close <= high` and non-negative volume.
    pub fn is_well_formed(&self) -> bool {
        self.low > Decimal::ZERO
            && self.low <= self.high
            && self.open >= self.low
            && self.open <= self.high
            && self.close >= self.low
            && self.close <= self.high
            && self.volume >= Decimal::ZERO
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sample_candle() -> Candle {
        Candle {
            timestamp: DateTime::from_timestamp_millis(1_700_000_000_000).unwrap(),
            open: dec!(100),
            high: dec!(110),
            low: dec!(90),
            close: dec!(105),
            volume: dec!(1234.5),
        }
    }

    #[test]
    fn well_formed_candle() {
        assert!(sample_candle().is_well_formed());
    }

    #[test]
    fn high_below_low_is_malformed() {
        let c = Candle {
            high: dec!(80),
            ..sample_candle()
        };
        assert!(!c.is_well_formed());
    }

    #[test]
    fn close_outside_range_is_malformed() {
        let c = Candle {
            close: dec!(111),
            ..sample_candle()
        };
        assert!(!c.is_well_formed());
    }

    #[test]
    fn zero_price_is_malformed() {
        let c = Candle {
            low: Decimal::ZERO,
            open: Decimal::ZERO,
            ..sample_candle()
        };
        assert!(!c.is_well_formed());
    }

    #[test]
    fn negative_volume_is_malformed() {
        let c = Candle {
            volume: dec!(-1),
            ..sample_candle()
        };
        assert!(!c.is_well_formed());
    }
}
