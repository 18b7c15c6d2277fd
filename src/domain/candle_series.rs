//! Candle series for one symbol with derived indicator columns.

use crate::domain::candle::Candle;
use crate::domain::error::RatchetError;
use crate::domain::indicator::{IndicatorSeries, IndicatorType};
use rust_decimal::Decimal;
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct CandleSeries {
    pub symbol: String,
    candles: Vec<Candle>,
    indicators: HashMap<IndicatorType, IndicatorSeries>,
}

impl CandleSeries {
    /// Build a series and compute every requested indicator column.
    ///
    /// Fails with `InsufficientData` when `candles` is empty, or when a candle is
    /// malformed (`bars` then reports how many leading candles were usable).
    pub fn new(
        symbol: impl Into<String>,
        candles: Vec<Candle>,
        indicator_types: &[IndicatorType],
    ) -> Result<Self, RatchetError> {
        let symbol = symbol.into();
        if candles.is_empty() {
            return Err(RatchetError::InsufficientData {
                symbol,
                bars: 0,
                minimum: 1,
            });
        }
        if let Some(bad) = candles.iter().position(|c| !c.is_well_formed()) {
            return Err(RatchetError::InsufficientData {
                symbol,
                bars: bad,
                minimum: candles.len(),
            });
        }

        let indicators = indicator_types
            .iter()
            .map(|ty| (*ty, ty.calculate(&candles)))
            .collect();

        Ok(Self {
            symbol,
            candles,
            indicators,
        })
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    /// Always false for a constructed series; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    pub fn candles(&self) -> &[Candle] {
        &self.candles
    }

    pub fn candle(&self, index: usize) -> Option<&Candle> {
        self.candles.get(index)
    }

    pub fn last_index(&self) -> usize {
        self.candles.len().saturating_sub(1)
    }

    pub fn has_indicator(&self, indicator: &IndicatorType) -> bool {
        self.indicators.contains_key(indicator)
    }

    pub fn indicator(&self, indicator: &IndicatorType) -> Option<&IndicatorSeries> {
        self.indicators.get(indicator)
    }

    /// Indicator value at `index`; `None` during warmup or if the column is absent.
    pub fn indicator_at(&self, indicator: &IndicatorType, index: usize) -> Option<Decimal> {
        self.indicators
            .get(indicator)
            .and_then(|series| series.value_at(index))
    }
}
