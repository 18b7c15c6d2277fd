//! Symbol universe for multi-symbol backtesting.
//!
//! Symbols come either from an explicit comma-separated list or from the data
//! provider's listing, filtered by quote asset.

use crate::domain::error::RatchetError;
use crate::ports::data_port::MarketDataPort;
use std::collections::HashSet;
use tracing::info;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum UniverseError {
    #[error("empty token in symbol list")]
    EmptyToken,

    #[error("duplicate symbol: {0}")]
    DuplicateSymbol(String),
}

impl UniverseError {
    pub fn into_config_error(self, section: &str, key: &str) -> RatchetError {
        RatchetError::invalid(section, key, self.to_string())
    }
}

/// Parse a comma-separated list into uppercase tokens, preserving order.
pub fn parse_symbols(input: &str) -> Result<Vec<String>, UniverseError> {
    let mut symbols = Vec::new();
    let mut seen = HashSet::new();

    for token in input.split(',') {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return Err(UniverseError::EmptyToken);
        }
        let symbol = trimmed.to_uppercase();
        if !seen.insert(symbol.clone()) {
            return Err(UniverseError::DuplicateSymbol(symbol));
        }
        symbols.push(symbol);
    }

    Ok(symbols)
}

/// True when `symbol` is quoted in one of `quote_assets` (all symbols match an
/// empty filter).
pub fn matches_quote(symbol: &str, quote_assets: &[String]) -> bool {
    quote_assets.is_empty()
        || quote_assets
            .iter()
            .any(|q| symbol.len() > q.len() && symbol.ends_with(q.to_uppercase().as_str()))
}

/// Ask the provider for every symbol with `interval` candles quoted in
/// `quote_assets`.
pub fn discover_symbols(
    data: &dyn MarketDataPort,
    interval: &str,
    quote_assets: &[String],
) -> Result<Vec<String>, RatchetError> {
    let symbols: Vec<String> = data
        .list_symbols(interval, quote_assets)?
        .into_iter()
        .filter(|s| matches_quote(s, quote_assets))
        .collect();

    if symbols.is_empty() {
        return Err(RatchetError::InsufficientData {
            symbol: "*".to_string(),
            bars: 0,
            minimum: 1,
        });
    }

    info!(count = symbols.len(), interval, quotes = ?quote_assets, "discovered symbols");
    Ok(symbols)
}
