//! Multi-symbol run orchestration.
//!
//! Each symbol is fetched once with the union of every strategy's indicators,
//! then every strategy is simulated over it. Per-symbol work may run on the
//! rayon pool, but results are always folded into the aggregators in symbol
//! order so a parallel run reports exactly what a sequential one would.

use chrono::{DateTime, Utc};
use rayon::prelude::*;
use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use crate::domain::aggregate::StrategyStats;
use crate::domain::backtest::{run_backtest, BacktestResult, RatchetConfig};
use crate::domain::candle_series::CandleSeries;
use crate::domain::error::RatchetError;
use crate::domain::indicator::IndicatorType;
use crate::domain::strategy::{SignalFunction, Strategy};
use crate::ports::chart_port::ChartPort;
use crate::ports::data_port::MarketDataPort;

/// A symbol, or one (symbol, strategy) pair, that produced no result.
#[derive(Debug, Clone, PartialEq)]
pub struct RunFailure {
    pub symbol: String,
    /// `None` when the symbol failed before any strategy ran.
    pub strategy_name: Option<String>,
    pub reason: String,
}

#[derive(Debug, Clone)]
pub struct RunReport {
    /// One entry per strategy, in configuration order.
    pub stats: Vec<StrategyStats>,
    pub results: Vec<BacktestResult>,
    pub failures: Vec<RunFailure>,
    pub symbols_tested: usize,
}

struct SymbolOutcome {
    symbol: String,
    series: Result<CandleSeries, RatchetError>,
    results: Vec<Result<BacktestResult, RatchetError>>,
}

/// Indicator columns needed by any of `strategies`, first-seen order.
pub fn indicator_union(strategies: &[Strategy]) -> Vec<IndicatorType> {
    let mut indicators = Vec::new();
    for indicator in strategies.iter().flat_map(|s| s.indicators()) {
        if !indicators.contains(&indicator) {
            indicators.push(indicator);
        }
    }
    indicators
}

pub fn load_series(
    data: &dyn MarketDataPort,
    symbol: &str,
    interval: &str,
    indicators: &[IndicatorType],
) -> Result<CandleSeries, RatchetError> {
    let candles = data.fetch_candles(symbol, interval)?;
    let longest = indicators.iter().map(IndicatorType::lookback).max().unwrap_or(0);
    if candles.len() < longest {
        debug!(
            symbol,
            candles = candles.len(),
            lookback = longest,
            "history shorter than indicator lookback"
        );
    }
    CandleSeries::new(symbol, candles, indicators)
}

fn run_symbol(
    data: &(dyn MarketDataPort + Sync),
    symbol: &str,
    interval: &str,
    indicators: &[IndicatorType],
    strategies: &[Strategy],
    config: &RatchetConfig,
) -> SymbolOutcome {
    let series = load_series(data, symbol, interval, indicators);
    let results = match &series {
        Ok(series) => strategies
            .iter()
            .map(|strategy| run_backtest(series, strategy, config))
            .collect(),
        Err(_) => Vec::new(),
    };
    SymbolOutcome {
        symbol: symbol.to_string(),
        series,
        results,
    }
}

/// Backtest every strategy against every symbol.
///
/// Only configuration errors abort the batch. A symbol whose data cannot be
/// fetched, or a pair whose simulation fails, is logged and listed in
/// `failures` without contributing to the statistics.
pub fn run_backtests(
    data: &(dyn MarketDataPort + Sync),
    chart: Option<&dyn ChartPort>,
    symbols: &[String],
    interval: &str,
    strategies: &[Strategy],
    config: &RatchetConfig,
    parallel: bool,
) -> Result<RunReport, RatchetError> {
    config.validate()?;
    let indicators = indicator_union(strategies);

    info!(
        symbols = symbols.len(),
        strategies = strategies.len(),
        interval,
        parallel,
        "starting backtests"
    );

    let outcomes: Vec<SymbolOutcome> = if parallel {
        symbols
            .par_iter()
            .map(|symbol| run_symbol(data, symbol, interval, &indicators, strategies, config))
            .collect()
    } else {
        symbols
            .iter()
            .map(|symbol| run_symbol(data, symbol, interval, &indicators, strategies, config))
            .collect()
    };

    let mut report = RunReport {
        stats: strategies
            .iter()
            .map(|s| StrategyStats::new(s.name()))
            .collect(),
        results: Vec::new(),
        failures: Vec::new(),
        symbols_tested: 0,
    };

    for outcome in outcomes {
        let series = match outcome.series {
            Ok(series) => series,
            Err(e) => {
                warn!(symbol = %outcome.symbol, "skipping symbol: {}", e);
                report.failures.push(RunFailure {
                    symbol: outcome.symbol,
                    strategy_name: None,
                    reason: e.to_string(),
                });
                continue;
            }
        };
        report.symbols_tested += 1;

        for (index, result) in outcome.results.into_iter().enumerate() {
            let strategy_name = strategies[index].name();
            let result = result.and_then(|result| {
                report.stats[index].record(&result)?;
                Ok(result)
            });
            match result {
                Ok(result) => {
                    if let Some(chart) = chart.filter(|_| result.is_traded()) {
                        let title = format!("{} on {}", strategy_name, series.symbol);
                        chart.render(&series, &result.buy_signals, &result.sell_signals, &title);
                    }
                    info!(
                        symbol = %result.symbol,
                        strategy = strategy_name,
                        end_balance = %result.end_balance,
                        return_pct = %result.return_pct(),
                        "backtest complete"
                    );
                    report.results.push(result);
                }
                Err(e) => {
                    warn!(symbol = %series.symbol, strategy = strategy_name, "backtest failed: {}", e);
                    report.failures.push(RunFailure {
                        symbol: series.symbol.clone(),
                        strategy_name: Some(strategy_name.to_string()),
                        reason: e.to_string(),
                    });
                }
            }
        }
    }

    info!(
        tested = report.symbols_tested,
        failed = report.failures.len(),
        "backtests finished"
    );
    Ok(report)
}

/// What a strategy would do on the most recent candle of a symbol.
#[derive(Debug, Clone, PartialEq)]
pub struct LatestSignal {
    pub symbol: String,
    pub strategy_name: String,
    pub timestamp: DateTime<Utc>,
    pub close: Decimal,
    pub price: Option<Decimal>,
}

/// Evaluate every strategy on the final candle of every symbol.
pub fn evaluate_latest(
    data: &dyn MarketDataPort,
    symbols: &[String],
    interval: &str,
    strategies: &[Strategy],
) -> (Vec<LatestSignal>, Vec<RunFailure>) {
    let indicators = indicator_union(strategies);
    let mut signals = Vec::new();
    let mut failures = Vec::new();

    for symbol in symbols {
        let series = match load_series(data, symbol, interval, &indicators) {
            Ok(series) => series,
            Err(e) => {
                warn!(symbol = %symbol, "skipping symbol: {}", e);
                failures.push(RunFailure {
                    symbol: symbol.clone(),
                    strategy_name: None,
                    reason: e.to_string(),
                });
                continue;
            }
        };
        let Some(last) = series.candle(series.last_index()) else {
            continue;
        };

        for strategy in strategies {
            signals.push(LatestSignal {
                symbol: symbol.clone(),
                strategy_name: strategy.name().to_string(),
                timestamp: last.timestamp,
                close: last.close,
                price: strategy.evaluate_latest(&series),
            });
        }
    }

    (signals, failures)
}
