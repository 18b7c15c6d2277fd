//! Chart output port trait.

use crate::domain::backtest::Signal;
use crate::domain::candle_series::CandleSeries;

/// Receives the signals of runs that traded. Fire-and-forget: implementations
/// log their own failures.
pub trait ChartPort {
    fn render(&self, series: &CandleSeries, buys: &[Signal], sells: &[Signal], title: &str);
}
