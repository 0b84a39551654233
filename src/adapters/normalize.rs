//! Shared parsing for file-backed data adapters.
//!
//! Providers send numbers as numbers, numeric strings, empty strings or
//! sentinels like `"NaN"`; all of these end up as `Some(f64)` or `None`
//! before a bar is built.

use crate::domain::error::StratbenchError;
use crate::domain::ohlcv::{BarSeries, OhlcvBar};
use chrono::{NaiveDate, NaiveDateTime};
use serde_json::Value;
use tracing::warn;

const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

pub fn parse_datetime(raw: &str) -> Result<NaiveDateTime, StratbenchError> {
    let s = raw.trim();
    let s = s.strip_suffix('Z').unwrap_or(s);
    let s = s.split('.').next().unwrap_or(s);
    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
            return Ok(dt);
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .ok_or_else(|| StratbenchError::Data {
            reason: format!("unrecognized datetime {raw:?}"),
        })
}

/// Missing-value markers and non-finite numbers become `None`.
pub fn parse_number(raw: &str) -> Option<f64> {
    let s = raw.trim();
    match s.to_lowercase().as_str() {
        "" | "null" | "none" | "nan" | "n/a" | "-" => None,
        _ => s.parse::<f64>().ok().filter(|v| v.is_finite()),
    }
}

pub fn json_number(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite()),
        Value::String(s) => parse_number(s),
        _ => None,
    }
}

/// Sort ascending, drop repeated timestamps (first one wins), cut at
/// `start`, and build the series.
pub fn into_series(
    mut bars: Vec<OhlcvBar>,
    start: Option<NaiveDateTime>,
) -> Result<BarSeries, StratbenchError> {
    bars.sort_by_key(|b| b.datetime);
    let before = bars.len();
    bars.dedup_by_key(|b| b.datetime);
    if bars.len() != before {
        warn!(
            dropped = before - bars.len(),
            "duplicate timestamps in source data"
        );
    }
    if let Some(start) = start {
        bars.retain(|b| b.datetime >= start);
    }
    BarSeries::new(bars)
}
