//! Market data access port trait.

use crate::domain::candle::Candle;
use crate::domain::error::RatchetError;

pub trait MarketDataPort {
    /// Candles for `symbol` at `interval` (e.g. `1h`, `4h`), oldest first.
    fn fetch_candles(&self, symbol: &str, interval: &str) -> Result<Vec<Candle>, RatchetError>;

    /// Symbols with candles at `interval` quoted in one of `quote_assets`;
    /// every such symbol if `quote_assets` is empty.
    fn list_symbols(
        &self,
        interval: &str,
        quote_assets: &[String],
    ) -> Result<Vec<String>, RatchetError>;
}
