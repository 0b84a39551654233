//! stratbench: rule-driven strategy backtester.
//!
//! Hexagonal architecture: the pure engine lives in [`domain`], port traits in
//! [`ports`], file-backed implementations in [`adapters`].

pub mod domain;
pub mod ports;
pub mod adapters;
pub mod cli;
pub mod logging;
