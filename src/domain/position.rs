//! Open position tracking with ratcheting stop-loss and profit target.

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use super::backtest::RatchetConfig;
use super::precision::{narrow, product, quotient, widen};

/// An open long position.
///
/// `entry_price` is the original cost basis and never changes; every ratchet
/// moves `reference_price` to the target that was hit and re-derives the stop
/// and target from it. Derived levels are kept at engine precision.
#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    pub entry_index: usize,
    pub entry_timestamp: DateTime<Utc>,
    pub entry_price: Decimal,
    pub reference_price: BigDecimal,
    pub stop_loss: BigDecimal,
    pub target: BigDecimal,
    pub ratchets: u32,
}

impl Position {
    pub fn open(
        index: usize,
        timestamp: DateTime<Utc>,
        price: Decimal,
        config: &RatchetConfig,
    ) -> Self {
        let reference = widen(price);
        Position {
            entry_index: index,
            entry_timestamp: timestamp,
            entry_price: price,
            stop_loss: product(&reference, &widen(config.initial_stop_loss)),
            target: product(&reference, &widen(config.initial_profit_target)),
            reference_price: reference,
            ratchets: 0,
        }
    }

    /// The entry (or last ratchet) candle is never its own exit candle.
    pub fn is_active_at(&self, index: usize) -> bool {
        index > self.entry_index
    }

    pub fn should_stop_loss(&self, low: Decimal) -> bool {
        widen(low) < self.stop_loss
    }

    pub fn should_ratchet(&self, high: Decimal) -> bool {
        widen(high) > self.target
    }

    /// Move the reference up to the target just hit, in place.
    pub fn ratchet(&mut self, index: usize, config: &RatchetConfig) {
        self.stop_loss = product(&self.target, &widen(config.incremental_stop_loss));
        let target = product(&self.target, &widen(config.incremental_profit_target));
        self.reference_price = std::mem::replace(&mut self.target, target);
        self.entry_index = index;
        self.ratchets += 1;
    }

    /// Balance multiplier when stopped out: stop / original entry price.
    pub fn exit_multiplier(&self) -> BigDecimal {
        quotient(&self.stop_loss, &widen(self.entry_price))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClosedTrade {
    pub entry_timestamp: DateTime<Utc>,
    pub exit_timestamp: DateTime<Utc>,
    pub entry_price: Decimal,
    pub exit_price: Decimal,
    pub ratchets: u32,
}

impl ClosedTrade {
    /// Close at the stop. `None` if the stop does not fit a `Decimal`.
    pub fn close(position: &Position, exit_timestamp: DateTime<Utc>) -> Option<Self> {
        Some(ClosedTrade {
            entry_timestamp: position.entry_timestamp,
            exit_timestamp,
            entry_price: position.entry_price,
            exit_price: narrow(&position.stop_loss)?,
            ratchets: position.ratchets,
        })
    }

    pub fn is_win(&self) -> bool {
        self.exit_price > self.entry_price
    }
}
