//! Ratchet backtest engine.
//!
//! Walks a candle series once, holding at most one long position. A position is
//! opened on a strategy signal and closed only by its stop-loss; each time the
//! profit target is exceeded, the stop and target ratchet upward instead of
//! closing. Positions still open at the end of the series are not liquidated
//! and do not contribute to the balance.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::debug;

use super::candle_series::CandleSeries;
use super::error::RatchetError;
use super::position::{ClosedTrade, Position};
use super::precision::{narrow, product, widen};
use super::strategy::SignalFunction;

#[derive(Debug, Clone, PartialEq)]
pub struct RatchetConfig {
    pub start_balance: Decimal,
    pub initial_stop_loss: Decimal,
    pub initial_profit_target: Decimal,
    pub incremental_stop_loss: Decimal,
    pub incremental_profit_target: Decimal,
}

impl Default for RatchetConfig {
    fn default() -> Self {
        RatchetConfig {
            start_balance: dec!(100),
            initial_stop_loss: dec!(0.85),
            initial_profit_target: dec!(1.045),
            incremental_stop_loss: dec!(0.975),
            incremental_profit_target: dec!(1.04),
        }
    }
}

impl RatchetConfig {
    /// Requires `0 < stop_loss < 1 < profit_target` for both ratio pairs and a
    /// positive start balance.
    pub fn validate(&self) -> Result<(), RatchetError> {
        if self.start_balance <= Decimal::ZERO {
            return Err(RatchetError::invalid(
                "backtest",
                "start_balance",
                "start_balance must be positive",
            ));
        }
        check_stop_loss("initial_stop_loss", self.initial_stop_loss)?;
        check_profit_target("initial_profit_target", self.initial_profit_target)?;
        check_stop_loss("incremental_stop_loss", self.incremental_stop_loss)?;
        check_profit_target("incremental_profit_target", self.incremental_profit_target)?;
        Ok(())
    }
}

fn check_stop_loss(key: &str, value: Decimal) -> Result<(), RatchetError> {
    if value <= Decimal::ZERO || value >= Decimal::ONE {
        return Err(RatchetError::invalid(
            "ratchet",
            key,
            format!("{} must be between 0 and 1 (exclusive), got {}", key, value),
        ));
    }
    Ok(())
}

fn check_profit_target(key: &str, value: Decimal) -> Result<(), RatchetError> {
    if value <= Decimal::ONE {
        return Err(RatchetError::invalid(
            "ratchet",
            key,
            format!("{} must be greater than 1, got {}", key, value),
        ));
    }
    Ok(())
}

/// A recorded entry or exit, for reporting and charting.
#[derive(Debug, Clone, PartialEq)]
pub struct Signal {
    pub timestamp: DateTime<Utc>,
    pub price: Decimal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestResult {
    pub symbol: String,
    pub strategy_name: String,
    pub start_balance: Decimal,
    pub end_balance: Decimal,
    pub buy_signals: Vec<Signal>,
    pub sell_signals: Vec<Signal>,
    pub trades: Vec<ClosedTrade>,
    pub open_position: Option<Position>,
}

impl BacktestResult {
    /// `100 * (end / start - 1)`, rounded half-to-even to 3 places.
    ///
    /// `run_backtest` only returns results for which this is representable.
    pub fn return_pct(&self) -> Decimal {
        (Decimal::ONE_HUNDRED * (self.end_balance / self.start_balance - Decimal::ONE)).round_dp(3)
    }

    /// True when the run moved the balance at all.
    pub fn is_traded(&self) -> bool {
        self.end_balance != self.start_balance
    }
}

/// Simulate `strategy` over `series`.
///
/// Indices `0..len-1` are visited; the final candle can neither open a
/// position nor be observed as an exit. Stop-loss is checked before the
/// target, so a candle breaching both closes the position.
///
/// Stops, targets and the balance are carried at engine precision. A run
/// whose exit price, final balance or return does not fit a `Decimal` fails
/// with `Overflow`.
pub fn run_backtest<S>(
    series: &CandleSeries,
    strategy: &S,
    config: &RatchetConfig,
) -> Result<BacktestResult, RatchetError>
where
    S: SignalFunction + ?Sized,
{
    config.validate()?;
    if series.is_empty() {
        return Err(RatchetError::InsufficientData {
            symbol: series.symbol.clone(),
            bars: 0,
            minimum: 1,
        });
    }

    let overflow = || RatchetError::Overflow {
        context: format!("{} on {}", strategy.name(), series.symbol),
    };
    let mut balance = widen(config.start_balance);
    let mut position: Option<Position> = None;
    let mut buy_signals = Vec::new();
    let mut sell_signals = Vec::new();
    let mut trades = Vec::new();

    for (i, candle) in series.candles()[..series.last_index()].iter().enumerate() {
        match position.as_mut() {
            None => {
                let Some(price) = strategy.evaluate(series, i) else {
                    continue;
                };
                if price <= Decimal::ZERO {
                    debug!(symbol = %series.symbol, index = i, %price, "ignoring non-positive signal price");
                    continue;
                }
                let opened = Position::open(i, candle.timestamp, price, config);
                debug!(
                    symbol = %series.symbol,
                    strategy = strategy.name(),
                    index = i,
                    %price,
                    stop_loss = %opened.stop_loss,
                    target = %opened.target,
                    "entry"
                );
                buy_signals.push(Signal {
                    timestamp: candle.timestamp,
                    price,
                });
                position = Some(opened);
            }
            Some(pos) if pos.is_active_at(i) => {
                if pos.should_stop_loss(candle.low) {
                    let trade = ClosedTrade::close(pos, candle.timestamp).ok_or_else(overflow)?;
                    balance = product(&balance, &pos.exit_multiplier());
                    debug!(
                        symbol = %series.symbol,
                        strategy = strategy.name(),
                        index = i,
                        exit = %trade.exit_price,
                        ratchets = trade.ratchets,
                        %balance,
                        "stop-loss exit"
                    );
                    sell_signals.push(Signal {
                        timestamp: candle.timestamp,
                        price: trade.exit_price,
                    });
                    trades.push(trade);
                    position = None;
                } else if pos.should_ratchet(candle.high) {
                    pos.ratchet(i, config);
                    debug!(
                        symbol = %series.symbol,
                        strategy = strategy.name(),
                        index = i,
                        stop_loss = %pos.stop_loss,
                        target = %pos.target,
                        "ratchet"
                    );
                }
            }
            Some(_) => {}
        }
    }

    let end_balance = narrow(&balance).ok_or_else(overflow)?;
    end_balance
        .checked_div(config.start_balance)
        .and_then(|ratio| ratio.checked_sub(Decimal::ONE))
        .and_then(|gain| gain.checked_mul(Decimal::ONE_HUNDRED))
        .ok_or_else(overflow)?;

    Ok(BacktestResult {
        symbol: series.symbol.clone(),
        strategy_name: strategy.name().to_string(),
        start_balance: config.start_balance,
        end_balance,
        buy_signals,
        sell_signals,
        trades,
        open_position: position,
    })
}
