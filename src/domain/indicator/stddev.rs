//! Window statistics shared by the moving-average and band indicators.
//!
//! Standard deviation is the sample form (divides by n-1), matching the
//! band definition used by the exchange charting conventions.

use rust_decimal::{Decimal, MathematicalOps};

pub fn mean(window: &[Decimal]) -> Option<Decimal> {
    if window.is_empty() {
        return None;
    }
    let sum = window
        .iter()
        .try_fold(Decimal::ZERO, |acc, x| acc.checked_add(*x))?;
    sum.checked_div(Decimal::from(window.len()))
}

/// sqrt(sum((x - mean)^2) / (n - 1)); `None` for fewer than two values.
pub fn sample_stddev(window: &[Decimal]) -> Option<Decimal> {
    if window.len() < 2 {
        return None;
    }
    let avg = mean(window)?;
    let sum_sq = window.iter().try_fold(Decimal::ZERO, |acc, x| {
        let diff = x.checked_sub(avg)?;
        acc.checked_add(diff.checked_mul(diff)?)
    })?;
    sum_sq.checked_div(Decimal::from(window.len() - 1))?.sqrt()
}
