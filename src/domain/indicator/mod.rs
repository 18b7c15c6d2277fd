//! Technical indicator implementations.
//!
//! - `IndicatorType`: indicator identity + parameters (serves as HashMap key)
//! - `IndicatorSeries`: one optional value per candle; `None` during warmup
//!
//! All indicators are computed from closing prices in exact decimal arithmetic.

pub mod bollinger;
pub mod sma;
pub mod smma;
pub mod stddev;

use crate::domain::candle::Candle;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndicatorType {
    Sma(usize),
    Smma(usize),
    LowerBollinger {
        period: usize,
        stddev_mult_x100: u32,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorSeries {
    pub indicator_type: IndicatorType,
    pub values: Vec<Option<Decimal>>,
}

impl IndicatorSeries {
    pub fn value_at(&self, index: usize) -> Option<Decimal> {
        self.values.get(index).copied().flatten()
    }
}

impl IndicatorType {
    /// Number of candles needed before the first defined value.
    pub fn lookback(&self) -> usize {
        match self {
            IndicatorType::Sma(period) | IndicatorType::Smma(period) => *period,
            IndicatorType::LowerBollinger { period, .. } => *period,
        }
    }

    pub fn calculate(&self, candles: &[Candle]) -> IndicatorSeries {
        match *self {
            IndicatorType::Sma(period) => sma::calculate_sma(candles, period),
            IndicatorType::Smma(period) => smma::calculate_smma(candles, period),
            IndicatorType::LowerBollinger {
                period,
                stddev_mult_x100,
            } => bollinger::calculate_lower_bollinger(candles, period, stddev_mult_x100),
        }
    }
}

impl fmt::Display for IndicatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorType::Sma(period) => write!(f, "SMA({})", period),
            IndicatorType::Smma(period) => write!(f, "SMMA({})", period),
            IndicatorType::LowerBollinger {
                period,
                stddev_mult_x100,
            } => {
                let mult = Decimal::new(*stddev_mult_x100 as i64, 2).normalize();
                write!(f, "LOWER_BOLLINGER({},{})", period, mult)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("invalid indicator '{input}': {reason}")]
pub struct IndicatorParseError {
    pub input: String,
    pub reason: String,
}

impl IndicatorParseError {
    fn new(input: &str, reason: impl Into<String>) -> Self {
        Self {
            input: input.to_string(),
            reason: reason.into(),
        }
    }
}

/// Accepts `SMA(n)`, `SMMA(n)`, `LOWER_BOLLINGER(n,k)` (case-insensitive)
/// and the column aliases `fast_sma`, `slow_sma`, `low_boll`.
impl FromStr for IndicatorType {
    type Err = IndicatorParseError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let trimmed = input.trim();
        match trimmed.to_lowercase().as_str() {
            "fast_sma" => return Ok(IndicatorType::Smma(10)),
            "slow_sma" => return Ok(IndicatorType::Smma(30)),
            "low_boll" => {
                return Ok(IndicatorType::LowerBollinger {
                    period: 14,
                    stddev_mult_x100: 200,
                });
            }
            _ => {}
        }

        let open = trimmed
            .find('(')
            .ok_or_else(|| IndicatorParseError::new(input, "expected NAME(args)"))?;
        let args = trimmed[open + 1..]
            .strip_suffix(')')
            .ok_or_else(|| IndicatorParseError::new(input, "missing closing parenthesis"))?;
        let name = trimmed[..open].trim().to_uppercase();
        let args: Vec<&str> = args.split(',').map(str::trim).collect();

        let parse_period = |s: &str, minimum: usize| -> Result<usize, IndicatorParseError> {
            let period: usize = s
                .parse()
                .map_err(|_| IndicatorParseError::new(input, format!("bad period '{}'", s)))?;
            if period < minimum {
                return Err(IndicatorParseError::new(
                    input,
                    format!("period must be at least {}", minimum),
                ));
            }
            Ok(period)
        };

        match (name.as_str(), args.as_slice()) {
            ("SMA", [p]) => Ok(IndicatorType::Sma(parse_period(p, 1)?)),
            ("SMMA", [p]) => Ok(IndicatorType::Smma(parse_period(p, 1)?)),
            ("LOWER_BOLLINGER", [p, k]) => {
                let period = parse_period(p, 2)?;
                let mult = Decimal::from_str(k).map_err(|_| {
                    IndicatorParseError::new(input, format!("bad multiplier '{}'", k))
                })?;
                let stddev_mult_x100 = (mult * Decimal::ONE_HUNDRED)
                    .round()
                    .to_u32()
                    .filter(|m| *m > 0)
                    .ok_or_else(|| IndicatorParseError::new(input, "multiplier must be positive"))?;
                Ok(IndicatorType::LowerBollinger {
                    period,
                    stddev_mult_x100,
                })
            }
            ("SMA" | "SMMA" | "LOWER_BOLLINGER", _) => {
                Err(IndicatorParseError::new(input, "wrong number of arguments"))
            }
            _ => Err(IndicatorParseError::new(
                input,
                format!("unknown indicator '{}'", name),
            )),
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indicator_type_display() {
        assert_eq!(IndicatorType::Sma(20).to_string(), "SMA(20)");
        assert_eq!(IndicatorType::Smma(30).to_string(), "SMMA(30)");
        let boll = IndicatorType::LowerBollinger {
            period: 14,
            stddev_mult_x100: 250,
        };
        assert_eq!(boll.to_string(), "LOWER_BOLLINGER(14,2.5)");
    }

    #[test]
    fn parse_aliases() {
        assert_eq!("slow_sma".parse::<IndicatorType>(), Ok(IndicatorType::Smma(30)));
        assert_eq!("fast_sma".parse::<IndicatorType>(), Ok(IndicatorType::Smma(10)));
        assert_eq!(
            "low_boll".parse::<IndicatorType>(),
            Ok(IndicatorType::LowerBollinger {
                period: 14,
                stddev_mult_x100: 200
            })
        );
    }

    #[test]
    fn parse_explicit_forms() {
        assert_eq!(" sma(20) ".parse::<IndicatorType>(), Ok(IndicatorType::Sma(20)));
        assert_eq!("SMMA(30)".parse::<IndicatorType>(), Ok(IndicatorType::Smma(30)));
        assert_eq!(
            "LOWER_BOLLINGER(20, 2.5)".parse::<IndicatorType>(),
            Ok(IndicatorType::LowerBollinger {
                period: 20,
                stddev_mult_x100: 250
            })
        );
    }

    #[test]
    fn parse_display_roundtrip() {
        let boll = IndicatorType::LowerBollinger {
            period: 14,
            stddev_mult_x100: 200,
        };
        assert_eq!(boll.to_string().parse::<IndicatorType>(), Ok(boll));
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!("RSI(14)".parse::<IndicatorType>().is_err());
        assert!("SMA".parse::<IndicatorType>().is_err());
        assert!("SMA(20".parse::<IndicatorType>().is_err());
        assert!("SMA(0)".parse::<IndicatorType>().is_err());
        assert!("SMA(abc)".parse::<IndicatorType>().is_err());
        assert!("SMA(10,2)".parse::<IndicatorType>().is_err());
        assert!("LOWER_BOLLINGER(1,2)".parse::<IndicatorType>().is_err());
        assert!("LOWER_BOLLINGER(14,-2)".parse::<IndicatorType>().is_err());
    }

    #[test]
    fn indicator_type_hash_eq() {
        use std::collections::HashMap;

        let mut map = HashMap::new();
        map.insert(IndicatorType::Smma(30), "slow");
        map.insert(IndicatorType::Sma(30), "simple");

        assert_eq!(map.get(&IndicatorType::Smma(30)), Some(&"slow"));
        assert_eq!(map.get(&IndicatorType::Sma(30)), Some(&"simple"));
    }

    #[test]
    fn value_at_out_of_range_is_none() {
        let series = IndicatorSeries {
            indicator_type: IndicatorType::Sma(1),
            values: vec![Some(Decimal::ONE)],
        };
        assert_eq!(series.value_at(0), Some(Decimal::ONE));
        assert_eq!(series.value_at(1), None);
    }
}
