//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{error, info};

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::signal_csv_adapter::SignalCsvAdapter;
use crate::domain::backtest::RatchetConfig;
use crate::domain::config_validation::{self, DEFAULT_INTERVAL};
use crate::domain::error::RatchetError;
use crate::domain::runner::{evaluate_latest, run_backtests, RunFailure};
use crate::domain::strategy::{SignalFunction, Strategy};
use crate::domain::universe::{discover_symbols, parse_symbols};
use crate::ports::chart_port::ChartPort;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::MarketDataPort;

#[derive(Parser, Debug)]
#[command(name = "ratchet", about = "Trailing stop-loss strategy backtester")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Backtest every enabled strategy against every symbol
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        /// Comma-separated symbols, overriding the config universe
        #[arg(long)]
        symbols: Option<String>,
        #[arg(long)]
        interval: Option<String>,
    },
    /// Show which strategies signal a buy on the latest candle
    Evaluate {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        symbols: Option<String>,
        #[arg(long)]
        interval: Option<String>,
    },
    /// List symbols available from the configured data source
    ListSymbols {
        #[arg(short, long)]
        config: PathBuf,
        /// Comma-separated quote assets, e.g. BTC,USDT
        #[arg(long)]
        quote_assets: Option<String>,
        #[arg(long)]
        interval: Option<String>,
    },
    /// Validate a configuration file without fetching data
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub type DataSource = Box<dyn MarketDataPort + Sync>;

pub fn run(cli: Cli) -> ExitCode {
    let outcome = match cli.command {
        Command::Backtest {
            config,
            symbols,
            interval,
        } => run_backtest(&config, symbols.as_deref(), interval.as_deref()),
        Command::Evaluate {
            config,
            symbols,
            interval,
        } => run_evaluate(&config, symbols.as_deref(), interval.as_deref()),
        Command::ListSymbols {
            config,
            quote_assets,
            interval,
        } => run_list_symbols(&config, quote_assets.as_deref(), interval.as_deref()),
        Command::Validate { config } => run_validate(&config),
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            (&e).into()
        }
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, RatchetError> {
    info!("loading config from {}", path.display());
    FileConfigAdapter::from_file(path)
}

pub fn build_ratchet_config(config: &dyn ConfigPort) -> Result<RatchetConfig, RatchetError> {
    config_validation::ratchet_config(config)
}

pub fn build_strategies(config: &dyn ConfigPort) -> Result<Vec<Strategy>, RatchetError> {
    config_validation::strategies(config)
}

pub fn resolve_interval(interval_override: Option<&str>, config: &dyn ConfigPort) -> String {
    interval_override
        .map(str::to_string)
        .or_else(|| config.get_string("backtest", "interval"))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| DEFAULT_INTERVAL.to_string())
}

/// Symbols from the override, the config list, or the provider listing for
/// the configured quote assets, in that order of precedence.
pub fn resolve_symbols(
    symbols_override: Option<&str>,
    config: &dyn ConfigPort,
    data: &dyn MarketDataPort,
    interval: &str,
) -> Result<Vec<String>, RatchetError> {
    if let Some(list) = symbols_override {
        return parse_symbols(list).map_err(|e| e.into_config_error("backtest", "symbols"));
    }
    if let Some(list) = config.get_string("backtest", "symbols") {
        return parse_symbols(&list).map_err(|e| e.into_config_error("backtest", "symbols"));
    }
    if let Some(list) = config.get_string("backtest", "quote_assets") {
        let quotes =
            parse_symbols(&list).map_err(|e| e.into_config_error("backtest", "quote_assets"))?;
        return discover_symbols(data, interval, &quotes);
    }
    Err(RatchetError::ConfigMissing {
        section: "backtest".into(),
        key: "symbols".into(),
    })
}

pub fn open_data_source(config: &dyn ConfigPort) -> Result<DataSource, RatchetError> {
    config_validation::validate_source(config)?;
    let source = config
        .get_string("backtest", "source")
        .unwrap_or_else(|| "csv".to_string())
        .trim()
        .to_lowercase();

    match source.as_str() {
        #[cfg(feature = "sqlite")]
        "sqlite" => {
            use crate::adapters::sqlite_adapter::SqliteAdapter;
            info!("using sqlite candle store");
            Ok(Box::new(SqliteAdapter::from_config(config)?))
        }
        _ => {
            let data_dir = config
                .get_string("backtest", "data_dir")
                .ok_or_else(|| RatchetError::ConfigMissing {
                    section: "backtest".into(),
                    key: "data_dir".into(),
                })?;
            info!("using csv candles from {}", data_dir);
            Ok(Box::new(CsvAdapter::new(PathBuf::from(data_dir.trim()))))
        }
    }
}

pub fn build_chart(config: &dyn ConfigPort) -> Option<SignalCsvAdapter> {
    config
        .get_string("backtest", "signals_dir")
        .map(|dir| SignalCsvAdapter::new(PathBuf::from(dir.trim())))
}

fn run_backtest(
    config_path: &Path,
    symbols_override: Option<&str>,
    interval_override: Option<&str>,
) -> Result<(), RatchetError> {
    let config = load_config(config_path)?;
    let ratchet = build_ratchet_config(&config)?;
    let strategies = build_strategies(&config)?;
    let interval = resolve_interval(interval_override, &config);
    let parallel = config.get_bool("backtest", "parallel", false);

    let data = open_data_source(&config)?;
    let symbols = resolve_symbols(symbols_override, &config, data.as_ref(), &interval)?;
    let chart = build_chart(&config);

    let report = run_backtests(
        data.as_ref(),
        chart.as_ref().map(|c| c as &dyn ChartPort),
        &symbols,
        &interval,
        &strategies,
        &ratchet,
        parallel,
    )?;

    for result in report.results.iter().filter(|r| r.is_traded()) {
        let wins = result.trades.iter().filter(|t| t.is_win()).count();
        println!(
            "{} {}: {} -> {} ({}%), {} trades, {} won",
            result.symbol,
            result.strategy_name,
            result.start_balance,
            result.end_balance.round_dp(4),
            result.return_pct(),
            result.trades.len(),
            wins
        );
    }
    if !report.results.is_empty() {
        println!();
    }

    for stats in &report.stats {
        println!("{}\n", stats.summary());
    }

    print_failures(&report.failures);
    Ok(())
}

fn run_evaluate(
    config_path: &Path,
    symbols_override: Option<&str>,
    interval_override: Option<&str>,
) -> Result<(), RatchetError> {
    let config = load_config(config_path)?;
    let strategies = build_strategies(&config)?;
    let interval = resolve_interval(interval_override, &config);

    let data = open_data_source(&config)?;
    let symbols = resolve_symbols(symbols_override, &config, data.as_ref(), &interval)?;

    let (signals, failures) = evaluate_latest(data.as_ref(), &symbols, &interval, &strategies);
    for signal in &signals {
        match signal.price {
            Some(price) => println!(
                "{} {}: BUY at {} (close {}, {})",
                signal.symbol,
                signal.strategy_name,
                price,
                signal.close,
                signal.timestamp.to_rfc3339()
            ),
            None => println!(
                "{} {}: no signal (close {}, {})",
                signal.symbol,
                signal.strategy_name,
                signal.close,
                signal.timestamp.to_rfc3339()
            ),
        }
    }

    print_failures(&failures);
    Ok(())
}

fn run_list_symbols(
    config_path: &Path,
    quote_assets: Option<&str>,
    interval_override: Option<&str>,
) -> Result<(), RatchetError> {
    let config = load_config(config_path)?;
    let interval = resolve_interval(interval_override, &config);
    let data = open_data_source(&config)?;

    let quotes = match quote_assets
        .map(str::to_string)
        .or_else(|| config.get_string("backtest", "quote_assets"))
    {
        Some(list) => {
            parse_symbols(&list).map_err(|e| e.into_config_error("backtest", "quote_assets"))?
        }
        None => Vec::new(),
    };

    let symbols = data.list_symbols(&interval, &quotes)?;
    if symbols.is_empty() {
        info!("no symbols found");
    }
    for symbol in &symbols {
        println!("{}", symbol);
    }
    info!("{} symbols found", symbols.len());
    Ok(())
}

fn run_validate(config_path: &Path) -> Result<(), RatchetError> {
    let config = load_config(config_path)?;
    config_validation::validate_all(&config)?;

    let ratchet = build_ratchet_config(&config)?;
    let strategies = build_strategies(&config)?;

    println!("Interval: {}", resolve_interval(None, &config));
    println!(
        "Ratchet: start {} | stop {} target {} | incremental stop {} target {}",
        ratchet.start_balance,
        ratchet.initial_stop_loss,
        ratchet.initial_profit_target,
        ratchet.incremental_stop_loss,
        ratchet.incremental_profit_target
    );
    for strategy in &strategies {
        let rule = strategy.rule();
        println!(
            "Strategy {}: buy at {} x {}",
            strategy.name(),
            rule.discount,
            rule.indicator
        );
    }
    println!("Configuration is valid.");
    Ok(())
}

fn print_failures(failures: &[RunFailure]) {
    if failures.is_empty() {
        return;
    }
    println!("Failed runs: {}", failures.len());
    for failure in failures {
        match &failure.strategy_name {
            Some(strategy) => println!("  {} {}: {}", failure.symbol, strategy, failure.reason),
            None => println!("  {}: {}", failure.symbol, failure.reason),
        }
    }
}
