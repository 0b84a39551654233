#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime};
use serde_json::{json, Value};
use std::collections::HashMap;
use stratbench::domain::error::StratbenchError;
pub use stratbench::domain::ohlcv::{BarSeries, OhlcvBar};
use stratbench::ports::data_port::DataPort;

pub struct MockDataPort {
    pub data: HashMap<String, BarSeries>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_series(mut self, symbol: &str, series: BarSeries) -> Self {
        self.data.insert(symbol.to_string(), series);
        self
    }

    pub fn with_closes(self, symbol: &str, closes: &[f64]) -> Self {
        self.with_series(symbol, series_from_closes(closes))
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_bars(
        &self,
        symbol: &str,
        timeframe: &str,
        start: Option<NaiveDateTime>,
    ) -> Result<BarSeries, StratbenchError> {
        if let Some(reason) = self.errors.get(symbol) {
            return Err(StratbenchError::Data {
                reason: reason.clone(),
            });
        }
        let series = self
            .data
            .get(symbol)
            .ok_or_else(|| StratbenchError::NoData {
                symbol: symbol.to_string(),
                timeframe: timeframe.to_string(),
            })?;
        Ok(match start {
            Some(start) => series.since(start),
            None => series.clone(),
        })
    }

    fn list_symbols(&self, _timeframe: &str) -> Result<Vec<String>, StratbenchError> {
        let mut symbols: Vec<String> = self.data.keys().cloned().collect();
        symbols.sort();
        Ok(symbols)
    }
}

pub fn day(offset: usize) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
        + chrono::Duration::days(offset as i64)
}

pub fn make_bar(offset: usize, close: f64) -> OhlcvBar {
    OhlcvBar {
        datetime: day(offset),
        open: Some(close - 0.5),
        high: Some(close + 1.0),
        low: Some(close - 1.0),
        close: Some(close),
        volume: Some(1000.0),
    }
}

pub fn series_from_closes(closes: &[f64]) -> BarSeries {
    BarSeries::new(
        closes
            .iter()
            .enumerate()
            .map(|(i, &c)| make_bar(i, c))
            .collect(),
    )
    .unwrap()
}

/// Gently oscillating prices, long enough for every default warmup.
pub fn wave_closes(count: usize, base: f64) -> Vec<f64> {
    (0..count)
        .map(|i| base + 10.0 * (i as f64 / 6.0).sin() + i as f64 * 0.05)
        .collect()
}

/// `close >= level` entry, take-profit exit.
pub fn threshold_item(symbol: &str, level: f64, take_profit: f64) -> Value {
    json!({
        "symbol": symbol,
        "investment": 100,
        "max_loss": 0,
        "timeframe": "1d",
        "since_ipo": true,
        "entry_rules": [{"indicator": "close", "operator": ">=", "value": level}],
        "exit_conditions": [{"type": "take_profit", "value": take_profit}]
    })
}

/// RSI mean-reversion strategy with every exit kind.
pub fn rsi_item(symbol: &str) -> Value {
    json!({
        "symbol": symbol,
        "investment": 1000,
        "max_loss": 50,
        "timeframe": "1d",
        "since_ipo": true,
        "entry_rules": [
            {"indicator": "rsi", "params": {"period": 14}, "operator": "<", "value": 40}
        ],
        "exit_conditions": [
            {"type": "take_profit", "value": 60},
            {"type": "stop_loss", "value": 40},
            {"type": "indicator", "indicator_rule":
                {"indicator": "rsi", "params": {"period": 14}, "operator": ">", "value": 65}}
        ]
    })
}
