//! Core domain types and the pure backtest engine.

pub mod backtest;
pub mod config_validation;
pub mod error;
pub mod execution;
pub mod indicator;
pub mod metrics;
pub mod ohlcv;
pub mod pipeline;
pub mod position;
pub mod rule;
pub mod rule_eval;
pub mod strategy;
