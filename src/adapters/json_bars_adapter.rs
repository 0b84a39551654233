//! JSON bar files in the market-data provider shape.
//!
//! `<dir>/<SYMBOL>_<timeframe>.json` holds `{"values": [...]}` (a bare array
//! is accepted too). Rows carry `datetime` plus OHLCV fields as strings or
//! numbers, newest first; they are normalized and sorted ascending.

use crate::adapters::csv_adapter::list_with_suffix;
use crate::adapters::normalize::{into_series, json_number, parse_datetime};
use crate::domain::error::StratbenchError;
use crate::domain::ohlcv::{BarSeries, OhlcvBar};
use crate::ports::data_port::DataPort;
use chrono::NaiveDateTime;
use serde_json::Value;
use std::fs;
use std::path::PathBuf;

pub struct JsonBarsAdapter {
    base_path: PathBuf,
}

impl JsonBarsAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn json_path(&self, symbol: &str, timeframe: &str) -> PathBuf {
        self.base_path.join(format!("{}_{}.json", symbol, timeframe))
    }
}

fn rows(document: &Value) -> Result<&Vec<Value>, StratbenchError> {
    if let Some(message) = document
        .get("status")
        .filter(|s| s.as_str() == Some("error"))
        .and_then(|_| document.get("message"))
    {
        return Err(StratbenchError::Data {
            reason: format!("provider error: {}", message),
        });
    }
    match document {
        Value::Array(rows) => Ok(rows),
        _ => document
            .get("values")
            .and_then(Value::as_array)
            .ok_or_else(|| StratbenchError::Data {
                reason: "expected a \"values\" array".into(),
            }),
    }
}

fn parse_row(row: &Value) -> Result<OhlcvBar, StratbenchError> {
    let raw = row
        .get("datetime")
        .or_else(|| row.get("date"))
        .and_then(Value::as_str)
        .ok_or_else(|| StratbenchError::Data {
            reason: format!("row without datetime: {}", row),
        })?;
    Ok(OhlcvBar {
        datetime: parse_datetime(raw)?,
        open: json_number(row.get("open")),
        high: json_number(row.get("high")),
        low: json_number(row.get("low")),
        close: json_number(row.get("close")),
        volume: json_number(row.get("volume")),
    })
}

impl DataPort for JsonBarsAdapter {
    fn fetch_bars(
        &self,
        symbol: &str,
        timeframe: &str,
        start: Option<NaiveDateTime>,
    ) -> Result<BarSeries, StratbenchError> {
        let path = self.json_path(symbol, timeframe);
        if !path.is_file() {
            return Err(StratbenchError::NoData {
                symbol: symbol.to_string(),
                timeframe: timeframe.to_string(),
            });
        }

        let text = fs::read_to_string(&path)?;
        let document: Value = serde_json::from_str(&text).map_err(|e| StratbenchError::Data {
            reason: format!("invalid JSON in {}: {}", path.display(), e),
        })?;
        let bars = rows(&document)?
            .iter()
            .map(parse_row)
            .collect::<Result<Vec<_>, _>>()?;

        into_series(bars, start)
    }

    fn list_symbols(&self, timeframe: &str) -> Result<Vec<String>, StratbenchError> {
        list_with_suffix(&self.base_path, &format!("_{}.json", timeframe))
    }
}
