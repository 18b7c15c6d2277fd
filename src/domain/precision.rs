//! Wide decimal arithmetic for the ratchet engine.
//!
//! Candle prices and reported balances are `rust_decimal::Decimal`, which holds
//! at most 28 digits. Stops, targets and the running balance are carried as
//! `BigDecimal` and rounded to [`ENGINE_PRECISION`] significant digits after
//! every product or quotient, so long ratchet chains keep their accuracy even
//! for sub-satoshi prices.

use bigdecimal::BigDecimal;
use num_bigint::BigInt;
use rust_decimal::Decimal;

/// Significant digits kept by every engine product and quotient.
pub const ENGINE_PRECISION: u64 = 30;

const DECIMAL_MAX_SCALE: i64 = 28;

/// Exact conversion into the engine's decimal type.
pub fn widen(value: Decimal) -> BigDecimal {
    BigDecimal::new(BigInt::from(value.mantissa()), i64::from(value.scale()))
}

pub fn product(a: &BigDecimal, b: &BigDecimal) -> BigDecimal {
    (a * b).with_prec(ENGINE_PRECISION)
}

/// `a / b` at engine precision. `b` must be non-zero.
pub fn quotient(a: &BigDecimal, b: &BigDecimal) -> BigDecimal {
    (a / b).with_prec(ENGINE_PRECISION)
}

/// Nearest `Decimal`, or `None` when `value` is outside its range.
///
/// A 96-bit mantissa holds every 28-digit integer and some 29-digit ones.
pub fn narrow(value: &BigDecimal) -> Option<Decimal> {
    [29, 28]
        .into_iter()
        .find_map(|digits| to_decimal(value.with_prec(digits)))
}

fn to_decimal(value: BigDecimal) -> Option<Decimal> {
    let (mantissa, scale) = value.round(DECIMAL_MAX_SCALE).into_bigint_and_exponent();
    let (mantissa, scale) = if scale < 0 {
        let shift = u32::try_from(-scale).ok()?;
        (mantissa * BigInt::from(10).pow(shift), 0)
    } else {
        (mantissa, scale)
    };
    let mantissa = i128::try_from(&mantissa).ok()?;
    let scale = u32::try_from(scale).ok()?;
    Decimal::try_from_i128_with_scale(mantissa, scale)
        .ok()
        .map(|d| d.normalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::str::FromStr;

    fn big(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).unwrap()
    }

    #[test]
    fn widen_is_exact() {
        assert_eq!(widen(dec!(101.8875)), big("101.8875"));
        assert_eq!(widen(dec!(-0.00000123)), big("-0.00000123"));
        assert_eq!(widen(Decimal::MAX), big("79228162514264337593543950335"));
    }

    #[test]
    fn narrow_round_trips_reported_values() {
        assert_eq!(narrow(&big("101.8875")), Some(dec!(101.8875)));
        assert_eq!(narrow(&big("85.000")), Some(dec!(85)));
        assert_eq!(narrow(&big("85.000")).unwrap().to_string(), "85");
        assert_eq!(narrow(&widen(Decimal::MAX)), Some(Decimal::MAX));
        assert_eq!(
            narrow(&big("12345678901234567890.123456789")),
            Some(dec!(12345678901234567890.123456789))
        );
    }

    #[test]
    fn narrow_rejects_out_of_range() {
        assert_eq!(narrow(&big("1E+40")), None);
        assert_eq!(narrow(&big("79228162514264337593543950336000")), None);
        assert_eq!(narrow(&big("1E+27")).map(|d| d.to_string().len()), Some(28));
    }

    #[test]
    fn narrow_rounds_tiny_values_to_decimal_scale() {
        assert_eq!(narrow(&big("1E-40")), Some(Decimal::ZERO));
    }

    #[test]
    fn long_ratchet_chain_keeps_thirty_digits() {
        // 0.00000123 * 1.045 * 1.04^10 * 0.975
        let mut value = product(&big("0.00000123"), &big("1.045"));
        for _ in 0..10 {
            value = product(&value, &big("1.04"));
        }
        value = product(&value, &big("0.975"));

        assert_eq!(value, big("0.0000018550661918292985308512256"));
        let reported = narrow(&value).unwrap();
        assert_eq!(reported, dec!(0.0000018550661918292985308512));
        assert_ne!(widen(reported), value);
    }

    #[test]
    fn quotient_is_rounded() {
        let third = quotient(&big("1"), &big("3"));
        assert_eq!(third.digits(), ENGINE_PRECISION);
        assert_eq!(quotient(&big("101.8875"), &big("100")), big("1.018875"));
    }
}
