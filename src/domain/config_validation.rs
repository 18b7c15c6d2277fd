//! Configuration validation and typed loading.
//!
//! Everything is checked before any candle is fetched, so a bad ratio or an
//! unknown strategy fails the whole run up front.

use crate::domain::backtest::RatchetConfig;
use crate::domain::error::RatchetError;
use crate::domain::indicator::IndicatorType;
use crate::domain::strategy::Strategy;
use crate::domain::universe::parse_symbols;
use crate::ports::config_port::ConfigPort;
use rust_decimal::Decimal;
use std::str::FromStr;

pub const DEFAULT_INTERVAL: &str = "4h";
pub const DEFAULT_STRATEGIES: &str = "ma_dip, band_dip";

/// Strict decimal lookup: a missing key yields `default`, a present but
/// unparsable value is an error rather than a silent fallback.
pub fn read_decimal(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: Decimal,
) -> Result<Decimal, RatchetError> {
    match config.get_string(section, key) {
        None => Ok(default),
        Some(raw) => Decimal::from_str(raw.trim()).map_err(|e| {
            RatchetError::invalid(section, key, format!("'{}' is not a decimal: {}", raw, e))
        }),
    }
}

pub fn validate_all(config: &dyn ConfigPort) -> Result<(), RatchetError> {
    validate_backtest_config(config)?;
    ratchet_config(config)?;
    strategies(config)?;
    Ok(())
}

pub fn validate_backtest_config(config: &dyn ConfigPort) -> Result<(), RatchetError> {
    validate_source(config)?;
    validate_interval(config)?;
    validate_universe(config)?;
    Ok(())
}

pub fn validate_source(config: &dyn ConfigPort) -> Result<(), RatchetError> {
    let source = config
        .get_string("backtest", "source")
        .unwrap_or_else(|| "csv".to_string());

    match source.trim().to_lowercase().as_str() {
        "csv" => require(config, "backtest", "data_dir"),
        "sqlite" if cfg!(feature = "sqlite") => require(config, "sqlite", "path"),
        "sqlite" => Err(RatchetError::invalid(
            "backtest",
            "source",
            "built without sqlite support",
        )),
        other => Err(RatchetError::invalid(
            "backtest",
            "source",
            format!("unknown source '{}', expected csv or sqlite", other),
        )),
    }
}

fn require(config: &dyn ConfigPort, section: &str, key: &str) -> Result<(), RatchetError> {
    match config.get_string(section, key) {
        Some(s) if !s.trim().is_empty() => Ok(()),
        _ => Err(RatchetError::ConfigMissing {
            section: section.to_string(),
            key: key.to_string(),
        }),
    }
}

fn validate_interval(config: &dyn ConfigPort) -> Result<(), RatchetError> {
    match config.get_string("backtest", "interval") {
        Some(s) if s.trim().is_empty() => Err(RatchetError::invalid(
            "backtest",
            "interval",
            "interval must not be empty",
        )),
        _ => Ok(()),
    }
}

fn validate_universe(config: &dyn ConfigPort) -> Result<(), RatchetError> {
    if let Some(symbols) = config.get_string("backtest", "symbols") {
        return parse_symbols(&symbols)
            .map(|_| ())
            .map_err(|e| e.into_config_error("backtest", "symbols"));
    }
    if let Some(quotes) = config.get_string("backtest", "quote_assets") {
        return parse_symbols(&quotes)
            .map(|_| ())
            .map_err(|e| e.into_config_error("backtest", "quote_assets"));
    }
    Err(RatchetError::ConfigMissing {
        section: "backtest".to_string(),
        key: "symbols".to_string(),
    })
}

/// Balance and ratio settings, defaulting any missing key.
pub fn ratchet_config(config: &dyn ConfigPort) -> Result<RatchetConfig, RatchetError> {
    let defaults = RatchetConfig::default();
    let ratchet = RatchetConfig {
        start_balance: read_decimal(config, "backtest", "start_balance", defaults.start_balance)?,
        initial_stop_loss: read_decimal(
            config,
            "ratchet",
            "initial_stop_loss",
            defaults.initial_stop_loss,
        )?,
        initial_profit_target: read_decimal(
            config,
            "ratchet",
            "initial_profit_target",
            defaults.initial_profit_target,
        )?,
        incremental_stop_loss: read_decimal(
            config,
            "ratchet",
            "incremental_stop_loss",
            defaults.incremental_stop_loss,
        )?,
        incremental_profit_target: read_decimal(
            config,
            "ratchet",
            "incremental_profit_target",
            defaults.incremental_profit_target,
        )?,
    };
    ratchet.validate()?;
    Ok(ratchet)
}

/// Enabled strategies in configuration order, with per-strategy overrides of
/// the reference indicator and discount applied.
pub fn strategies(config: &dyn ConfigPort) -> Result<Vec<Strategy>, RatchetError> {
    let enabled = config
        .get_string("strategies", "enabled")
        .unwrap_or_else(|| DEFAULT_STRATEGIES.to_string());
    let names =
        parse_symbols(&enabled).map_err(|e| e.into_config_error("strategies", "enabled"))?;

    let mut strategies = Vec::with_capacity(names.len());
    for name in names {
        let name = name.to_lowercase();
        let mut strategy = Strategy::by_name(&name).ok_or_else(|| {
            RatchetError::invalid(
                "strategies",
                "enabled",
                format!("unknown strategy '{}'", name),
            )
        })?;

        let rule = strategy.rule_mut();
        if let Some(raw) = config.get_string(&name, "indicator") {
            rule.indicator = IndicatorType::from_str(&raw)
                .map_err(|e| RatchetError::invalid(&name, "indicator", e.to_string()))?;
        }
        rule.discount = read_decimal(config, &name, "discount", rule.discount)?;
        if rule.discount <= Decimal::ZERO {
            return Err(RatchetError::invalid(
                &name,
                "discount",
                format!("discount must be positive, got {}", rule.discount),
            ));
        }

        strategies.push(strategy);
    }

    Ok(strategies)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::file_config_adapter::FileConfigAdapter;
    use crate::domain::strategy::SignalFunction;
    use rust_decimal_macros::dec;

    fn make_config(content: &str) -> FileConfigAdapter {
        FileConfigAdapter::from_string(content).unwrap()
    }

    #[test]
    fn valid_backtest_config_passes() {
        let config = make_config(
            r#"
[backtest]
source = csv
data_dir = /var/lib/candles
interval = 1h
symbols = ETHBTC, BNBBTC
start_balance = 250
"#,
        );
        assert!(validate_backtest_config(&config).is_ok());
        assert!(validate_all(&config).is_ok());
    }

    #[test]
    fn quote_assets_accepted_instead_of_symbols() {
        let config = make_config("[backtest]\ndata_dir = /tmp\nquote_assets = BTC,USDT\n");
        assert!(validate_backtest_config(&config).is_ok());
    }

    #[test]
    fn missing_universe_fails() {
        let config = make_config("[backtest]\ndata_dir = /tmp\n");
        let err = validate_backtest_config(&config).unwrap_err();
        assert!(matches!(err, RatchetError::ConfigMissing { key, .. } if key == "symbols"));
    }

    #[test]
    fn duplicate_symbol_fails() {
        let config = make_config("[backtest]\ndata_dir = /tmp\nsymbols = ETHBTC,ethbtc\n");
        let err = validate_backtest_config(&config).unwrap_err();
        assert!(matches!(err, RatchetError::ConfigInvalid { key, .. } if key == "symbols"));
    }

    #[test]
    fn csv_source_requires_data_dir() {
        let config = make_config("[backtest]\nsymbols = ETHBTC\n");
        let err = validate_backtest_config(&config).unwrap_err();
        assert!(matches!(err, RatchetError::ConfigMissing { key, .. } if key == "data_dir"));
    }

    #[test]
    fn unknown_source_fails() {
        let config = make_config("[backtest]\nsource = ftp\nsymbols = ETHBTC\n");
        let err = validate_backtest_config(&config).unwrap_err();
        assert!(matches!(err, RatchetError::ConfigInvalid { key, .. } if key == "source"));
    }

    #[cfg(feature = "sqlite")]
    #[test]
    fn sqlite_source_requires_path() {
        let config = make_config("[backtest]\nsource = sqlite\nsymbols = ETHBTC\n");
        let err = validate_backtest_config(&config).unwrap_err();
        assert!(
            matches!(err, RatchetError::ConfigMissing { section, key } if section == "sqlite" && key == "path")
        );
    }

    #[test]
    fn ratchet_config_defaults() {
        let config = make_config("[backtest]\n");
        assert_eq!(ratchet_config(&config).unwrap(), RatchetConfig::default());
    }

    #[test]
    fn ratchet_config_reads_overrides() {
        let config = make_config(
            "[backtest]\nstart_balance = 1000\n[ratchet]\ninitial_stop_loss = 0.9\nincremental_profit_target = 1.02\n",
        );
        let ratchet = ratchet_config(&config).unwrap();
        assert_eq!(ratchet.start_balance, dec!(1000));
        assert_eq!(ratchet.initial_stop_loss, dec!(0.9));
        assert_eq!(ratchet.initial_profit_target, dec!(1.045));
        assert_eq!(ratchet.incremental_profit_target, dec!(1.02));
    }

    #[test]
    fn ratchet_config_rejects_garbage() {
        let config = make_config("[ratchet]\ninitial_stop_loss = lots\n");
        let err = ratchet_config(&config).unwrap_err();
        assert!(matches!(err, RatchetError::ConfigInvalid { key, .. } if key == "initial_stop_loss"));
    }

    #[test]
    fn ratchet_config_rejects_out_of_bounds_ratio() {
        let config = make_config("[ratchet]\ninitial_stop_loss = 1.2\n");
        let err = ratchet_config(&config).unwrap_err();
        assert!(matches!(err, RatchetError::ConfigInvalid { key, .. } if key == "initial_stop_loss"));

        let config = make_config("[ratchet]\nincremental_profit_target = 1\n");
        let err = ratchet_config(&config).unwrap_err();
        assert!(
            matches!(err, RatchetError::ConfigInvalid { key, .. } if key == "incremental_profit_target")
        );
    }

    #[test]
    fn zero_start_balance_fails() {
        let config = make_config("[backtest]\nstart_balance = 0\n");
        let err = ratchet_config(&config).unwrap_err();
        assert!(matches!(err, RatchetError::ConfigInvalid { key, .. } if key == "start_balance"));
    }

    #[test]
    fn strategies_default_to_both() {
        let config = make_config("[backtest]\n");
        let names: Vec<String> = strategies(&config)
            .unwrap()
            .iter()
            .map(|s| s.name().to_string())
            .collect();
        assert_eq!(names, vec!["ma_dip", "band_dip"]);
    }

    #[test]
    fn strategy_overrides_apply() {
        let config = make_config(
            "[strategies]\nenabled = band_dip\n[band_dip]\nindicator = low_boll\ndiscount = 0.99\n",
        );
        let parsed = strategies(&config).unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].name(), "band_dip");
        assert_eq!(parsed[0].rule().discount, dec!(0.99));
        assert_eq!(
            parsed[0].rule().indicator,
            IndicatorType::LowerBollinger {
                period: 14,
                stddev_mult_x100: 200
            }
        );
    }

    #[test]
    fn unknown_strategy_fails() {
        let config = make_config("[strategies]\nenabled = ma_dip, moon_shot\n");
        let err = strategies(&config).unwrap_err();
        assert!(matches!(err, RatchetError::ConfigInvalid { reason, .. } if reason.contains("moon_shot")));
    }

    #[test]
    fn bad_indicator_fails() {
        let config = make_config("[strategies]\nenabled = ma_dip\n[ma_dip]\nindicator = RSI(14)\n");
        let err = strategies(&config).unwrap_err();
        assert!(
            matches!(err, RatchetError::ConfigInvalid { section, key, .. } if section == "ma_dip" && key == "indicator")
        );
    }

    #[test]
    fn non_positive_discount_fails() {
        let config = make_config("[strategies]\nenabled = ma_dip\n[ma_dip]\ndiscount = 0\n");
        let err = strategies(&config).unwrap_err();
        assert!(matches!(err, RatchetError::ConfigInvalid { key, .. } if key == "discount"));
    }
}
