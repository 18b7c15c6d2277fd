//! Per-strategy aggregation of backtest results.

use rust_decimal::Decimal;
use std::fmt;

use super::backtest::BacktestResult;
use super::error::RatchetError;

#[derive(Debug, Clone, PartialEq)]
pub struct StrategyStats {
    pub strategy_name: String,
    pub profitable_count: usize,
    pub unprofitable_count: usize,
    pub total_start_balance: Decimal,
    pub total_end_balance: Decimal,
    pub per_trade_profits: Vec<Decimal>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Summary {
    /// No run ever moved its balance.
    NoTrades {
        strategy_name: String,
        profitable_count: usize,
        unprofitable_count: usize,
    },
    Stats(SummaryStats),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SummaryStats {
    pub strategy_name: String,
    pub profitable_count: usize,
    pub unprofitable_count: usize,
    pub total_profit: Decimal,
    pub least_profitable: Decimal,
    pub most_profitable: Decimal,
    pub total_start_balance: Decimal,
    pub total_end_balance: Decimal,
    pub profitability_pct: Decimal,
}

impl StrategyStats {
    pub fn new(strategy_name: impl Into<String>) -> Self {
        StrategyStats {
            strategy_name: strategy_name.into(),
            profitable_count: 0,
            unprofitable_count: 0,
            total_start_balance: Decimal::ZERO,
            total_end_balance: Decimal::ZERO,
            per_trade_profits: Vec::new(),
        }
    }

    /// Add one run's balances to the totals. Leaves the totals untouched on
    /// overflow.
    pub fn update(
        &mut self,
        start_balance: Decimal,
        end_balance: Decimal,
    ) -> Result<(), RatchetError> {
        let totals = self
            .total_start_balance
            .checked_add(start_balance)
            .zip(self.total_end_balance.checked_add(end_balance));
        let Some((total_start, total_end)) = totals else {
            return Err(RatchetError::Overflow {
                context: format!("{} totals", self.strategy_name),
            });
        };
        self.total_start_balance = total_start;
        self.total_end_balance = total_end;
        Ok(())
    }

    /// Classify one run and fold it into the totals if it moved the balance.
    pub fn record(&mut self, result: &BacktestResult) -> Result<(), RatchetError> {
        let (start, end) = (result.start_balance, result.end_balance);
        if end == start {
            return Ok(());
        }
        self.update(start, end)?;
        if end > start {
            self.profitable_count += 1;
        } else {
            self.unprofitable_count += 1;
        }
        self.per_trade_profits.push(end - start);
        Ok(())
    }

    pub fn summary(&self) -> Summary {
        let (Some(least), Some(most)) = (
            self.per_trade_profits.iter().min(),
            self.per_trade_profits.iter().max(),
        ) else {
            return Summary::NoTrades {
                strategy_name: self.strategy_name.clone(),
                profitable_count: self.profitable_count,
                unprofitable_count: self.unprofitable_count,
            };
        };

        let profitability_pct = if self.total_start_balance > Decimal::ZERO {
            Decimal::ONE_HUNDRED * (self.total_end_balance / self.total_start_balance - Decimal::ONE)
        } else {
            Decimal::ZERO
        };

        Summary::Stats(SummaryStats {
            strategy_name: self.strategy_name.clone(),
            profitable_count: self.profitable_count,
            unprofitable_count: self.unprofitable_count,
            total_profit: self.per_trade_profits.iter().copied().sum(),
            least_profitable: *least,
            most_profitable: *most,
            total_start_balance: self.total_start_balance,
            total_end_balance: self.total_end_balance,
            profitability_pct,
        })
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Summary::NoTrades {
                strategy_name,
                profitable_count,
                unprofitable_count,
            } => {
                writeln!(f, "{} STATS:", strategy_name)?;
                writeln!(f, "Profitable Symbols: {}", profitable_count)?;
                writeln!(f, "Unprofitable Symbols: {}", unprofitable_count)?;
                write!(f, "No trades")
            }
            Summary::Stats(s) => {
                writeln!(f, "{} STATS:", s.strategy_name)?;
                writeln!(f, "Profitable Symbols: {}", s.profitable_count)?;
                writeln!(f, "Unprofitable Symbols: {}", s.unprofitable_count)?;
                writeln!(f, "Overall Profits: {}", s.total_profit.round_dp(2))?;
                writeln!(f, "Least Profitable Trade: {}", s.least_profitable.round_dp(2))?;
                writeln!(f, "Most Profitable Trade: {}", s.most_profitable.round_dp(2))?;
                writeln!(
                    f,
                    "With an initial balance of {} and a final balance of {}",
                    s.total_start_balance.round_dp(0),
                    s.total_end_balance.round_dp(2)
                )?;
                write!(f, "The profitability is {}%", s.profitability_pct.round_dp(2))
            }
        }
    }
}
