//! SQLite candle store adapter.
//!
//! Prices and volume are stored as decimal text so values round-trip exactly.

use crate::domain::candle::Candle;
use crate::domain::error::RatchetError;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::MarketDataPort;
use chrono::DateTime;
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::params;
use rust_decimal::Decimal;
use std::str::FromStr;

pub struct SqliteAdapter {
    pool: Pool<SqliteConnectionManager>,
}

fn db_error(e: impl std::fmt::Display) -> RatchetError {
    RatchetError::Database {
        reason: e.to_string(),
    }
}

fn decimal_from_sql(idx: usize, raw: String) -> rusqlite::Result<Decimal> {
    Decimal::from_str(&raw).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

impl SqliteAdapter {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, RatchetError> {
        let db_path =
            config
                .get_string("sqlite", "path")
                .ok_or_else(|| RatchetError::ConfigMissing {
                    section: "sqlite".into(),
                    key: "path".into(),
                })?;

        let pool_size = config.get_int("sqlite", "pool_size", 4).max(1) as u32;

        let manager = SqliteConnectionManager::file(&db_path);
        let pool = Pool::builder()
            .max_size(pool_size)
            .build(manager)
            .map_err(db_error)?;

        Ok(Self { pool })
    }

    pub fn in_memory() -> Result<Self, RatchetError> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder().max_size(1).build(manager).map_err(db_error)?;

        Ok(Self { pool })
    }

    pub fn initialize_schema(&self) -> Result<(), RatchetError> {
        let conn = self.pool.get().map_err(db_error)?;

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS candles (
                symbol TEXT NOT NULL,
                interval TEXT NOT NULL,
                open_time INTEGER NOT NULL,
                open TEXT NOT NULL,
                high TEXT NOT NULL,
                low TEXT NOT NULL,
                close TEXT NOT NULL,
                volume TEXT NOT NULL,
                PRIMARY KEY (symbol, interval, open_time)
            );
            CREATE INDEX IF NOT EXISTS idx_candles_symbol ON candles(symbol);",
        )
        .map_err(db_error)?;

        Ok(())
    }

    pub fn insert_candles(
        &self,
        symbol: &str,
        interval: &str,
        candles: &[Candle],
    ) -> Result<(), RatchetError> {
        let mut conn = self.pool.get().map_err(db_error)?;
        let tx = conn.transaction().map_err(db_error)?;

        for candle in candles {
            tx.execute(
                "INSERT OR REPLACE INTO candles
                    (symbol, interval, open_time, open, high, low, close, volume)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    symbol,
                    interval,
                    candle.timestamp.timestamp_millis(),
                    candle.open.to_string(),
                    candle.high.to_string(),
                    candle.low.to_string(),
                    candle.close.to_string(),
                    candle.volume.to_string()
                ],
            )
            .map_err(db_error)?;
        }

        tx.commit().map_err(db_error)?;
        Ok(())
    }
}

impl MarketDataPort for SqliteAdapter {
    fn fetch_candles(&self, symbol: &str, interval: &str) -> Result<Vec<Candle>, RatchetError> {
        let fetch_error = |e: rusqlite::Error| RatchetError::Fetch {
            symbol: symbol.to_string(),
            reason: e.to_string(),
        };

        let conn = self.pool.get().map_err(db_error)?;
        let mut stmt = conn
            .prepare(
                "SELECT open_time, open, high, low, close, volume
                 FROM candles
                 WHERE symbol = ?1 AND interval = ?2
                 ORDER BY open_time ASC",
            )
            .map_err(fetch_error)?;

        let rows = stmt
            .query_map(params![symbol, interval], |row| {
                let millis: i64 = row.get(0)?;
                let timestamp = DateTime::from_timestamp_millis(millis).ok_or(
                    rusqlite::Error::IntegralValueOutOfRange(0, millis),
                )?;
                Ok(Candle {
                    timestamp,
                    open: decimal_from_sql(1, row.get(1)?)?,
                    high: decimal_from_sql(2, row.get(2)?)?,
                    low: decimal_from_sql(3, row.get(3)?)?,
                    close: decimal_from_sql(4, row.get(4)?)?,
                    volume: decimal_from_sql(5, row.get(5)?)?,
                })
            })
            .map_err(fetch_error)?;

        let mut candles = Vec::new();
        for row in rows {
            candles.push(row.map_err(fetch_error)?);
        }

        Ok(candles)
    }

    fn list_symbols(
        &self,
        interval: &str,
        quote_assets: &[String],
    ) -> Result<Vec<String>, RatchetError> {
        let conn = self.pool.get().map_err(db_error)?;
        let mut stmt = conn
            .prepare("SELECT DISTINCT symbol FROM candles WHERE interval = ?1 ORDER BY symbol")
            .map_err(db_error)?;

        let rows = stmt
            .query_map(params![interval], |row| row.get::<_, String>(0))
            .map_err(db_error)?;

        let quotes: Vec<String> = quote_assets.iter().map(|q| q.to_uppercase()).collect();
        let mut symbols = Vec::new();
        for row in rows {
            let symbol = row.map_err(db_error)?;
            if quotes.is_empty() || quotes.iter().any(|q| symbol.ends_with(q.as_str())) {
                symbols.push(symbol);
            }
        }

        Ok(symbols)
    }
}
