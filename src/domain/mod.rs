//! Core domain types and logic.

pub mod candle;
pub mod candle_series;
pub mod indicator;
pub mod strategy;
pub mod position;
pub mod precision;
pub mod backtest;
pub mod aggregate;
pub mod runner;
pub mod universe;
pub mod config_validation;
pub mod error;
