//! Technical indicator implementations.
//!
//! This module provides the types shared by every indicator:
//! - `Column`: a per-bar series where `None` marks an undefined value
//! - `IndicatorKind`: closed set of supported kinds plus an `Unsupported` arm
//! - `IndicatorParams`: the loose parameter mapping carried by a rule
//! - `IndicatorSpec`: kind + params + the rule scope that requested it
//!
//! Every calculator takes a source column and returns a column of the same
//! length. Bars inside the warmup window are `None`.

pub mod bollinger;
pub mod cci;
pub mod ema;
pub mod macd;
pub mod rsi;
pub mod sma;
pub mod stddev;

pub use ema::calculate_ema;
pub use sma::calculate_sma;

use crate::domain::ohlcv::PriceField;
use serde::{Deserialize, Serialize};
use std::fmt;

pub type Column = Vec<Option<f64>>;

pub const RSI_COLUMN: &str = "RSI";
pub const SMA_COLUMN: &str = "SMA";
pub const EMA_COLUMN: &str = "EMA";
pub const MACD_COLUMN: &str = "MACD";
pub const MACD_SIGNAL_COLUMN: &str = "MACD_SIGNAL";
pub const MACD_HIST_COLUMN: &str = "MACD_HIST";
pub const CCI_COLUMN: &str = "CCI";
pub const BB_UPPER_COLUMN: &str = "BB_UPPER";
pub const BB_MIDDLE_COLUMN: &str = "BB_MIDDLE";
pub const BB_LOWER_COLUMN: &str = "BB_LOWER";

pub const DEFAULT_RSI_PERIOD: usize = 14;
pub const DEFAULT_MA_PERIOD: usize = 20;
pub const DEFAULT_CCI_PERIOD: usize = 20;
pub const DEFAULT_BBANDS_PERIOD: usize = 20;
pub const DEFAULT_BBANDS_STDDEV: f64 = 2.0;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum IndicatorKind {
    Rsi,
    Sma,
    Ema,
    Macd,
    Cci,
    Bbands,
    Price(PriceField),
    Unsupported(String),
}

impl IndicatorKind {
    pub fn parse(name: &str) -> Self {
        let lowered = name.trim().to_lowercase();
        match lowered.as_str() {
            "rsi" => IndicatorKind::Rsi,
            "sma" => IndicatorKind::Sma,
            "ema" => IndicatorKind::Ema,
            "macd" => IndicatorKind::Macd,
            "cci" => IndicatorKind::Cci,
            "bbands" | "bollinger" => IndicatorKind::Bbands,
            other => match PriceField::parse(other) {
                Some(field) => IndicatorKind::Price(field),
                None => IndicatorKind::Unsupported(name.trim().to_string()),
            },
        }
    }

    /// Columns the pipeline writes for this kind. Price kinds read raw bar
    /// columns and write nothing.
    pub fn output_columns(&self) -> &'static [&'static str] {
        match self {
            IndicatorKind::Rsi => &[RSI_COLUMN],
            IndicatorKind::Sma => &[SMA_COLUMN],
            IndicatorKind::Ema => &[EMA_COLUMN],
            IndicatorKind::Macd => &[MACD_COLUMN, MACD_SIGNAL_COLUMN, MACD_HIST_COLUMN],
            IndicatorKind::Cci => &[CCI_COLUMN],
            IndicatorKind::Bbands => &[BB_UPPER_COLUMN, BB_MIDDLE_COLUMN, BB_LOWER_COLUMN],
            IndicatorKind::Price(_) | IndicatorKind::Unsupported(_) => &[],
        }
    }

    /// The column a rule on this kind observes. `None` for unsupported kinds.
    pub fn observed_column(&self, params: &IndicatorParams) -> Option<String> {
        let name = match self {
            IndicatorKind::Rsi => RSI_COLUMN,
            IndicatorKind::Sma => SMA_COLUMN,
            IndicatorKind::Ema => EMA_COLUMN,
            IndicatorKind::Macd => MACD_COLUMN,
            IndicatorKind::Cci => CCI_COLUMN,
            IndicatorKind::Bbands => match params.band.as_deref().map(str::to_lowercase) {
                Some(band) if band == "upper" => BB_UPPER_COLUMN,
                Some(band) if band == "lower" => BB_LOWER_COLUMN,
                _ => BB_MIDDLE_COLUMN,
            },
            IndicatorKind::Price(field) => field.column_name(),
            IndicatorKind::Unsupported(_) => return None,
        };
        Some(name.to_string())
    }

    pub fn is_supported(&self) -> bool {
        !matches!(self, IndicatorKind::Unsupported(_))
    }
}

impl From<String> for IndicatorKind {
    fn from(value: String) -> Self {
        IndicatorKind::parse(&value)
    }
}

impl From<IndicatorKind> for String {
    fn from(kind: IndicatorKind) -> Self {
        kind.to_string()
    }
}

impl fmt::Display for IndicatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorKind::Rsi => write!(f, "rsi"),
            IndicatorKind::Sma => write!(f, "sma"),
            IndicatorKind::Ema => write!(f, "ema"),
            IndicatorKind::Macd => write!(f, "macd"),
            IndicatorKind::Cci => write!(f, "cci"),
            IndicatorKind::Bbands => write!(f, "bbands"),
            IndicatorKind::Price(field) => write!(f, "{}", field.column_name()),
            IndicatorKind::Unsupported(name) => write!(f, "{}", name),
        }
    }
}

/// Loose parameter mapping as sent by clients. Numbers arrive as JSON
/// numbers of any shape, so they are kept as `f64` and converted on use.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndicatorParams {
    #[serde(default, alias = "window", skip_serializing_if = "Option::is_none")]
    pub period: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fast: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slow: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signal: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stddev: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub band: Option<String>,
}

fn as_window(value: Option<f64>, default: usize) -> usize {
    match value {
        Some(v) if v.is_finite() && v >= 0.0 => v as usize,
        _ => default,
    }
}

impl IndicatorParams {
    pub fn with_period(period: usize) -> Self {
        Self {
            period: Some(period as f64),
            ..Self::default()
        }
    }

    pub fn period_or(&self, default: usize) -> usize {
        as_window(self.period, default)
    }

    pub fn fast_or(&self, default: usize) -> usize {
        as_window(self.fast, default)
    }

    pub fn slow_or(&self, default: usize) -> usize {
        as_window(self.slow, default)
    }

    pub fn signal_or(&self, default: usize) -> usize {
        as_window(self.signal, default)
    }

    pub fn stddev_or(&self, default: f64) -> f64 {
        match self.stddev {
            Some(v) if v.is_finite() && v > 0.0 => v,
            _ => default,
        }
    }

    pub fn source_field(&self) -> PriceField {
        PriceField::parse_or_close(self.source.as_deref())
    }
}

/// Which part of a strategy asked for an indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleScope {
    Entry,
    Exit,
    /// Moving average requested through a rule's `compare_to`.
    Compare,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorSpec {
    pub kind: IndicatorKind,
    pub params: IndicatorParams,
    pub scope: RuleScope,
}

impl IndicatorSpec {
    pub fn new(kind: IndicatorKind, params: IndicatorParams, scope: RuleScope) -> Self {
        Self {
            kind,
            params,
            scope,
        }
    }
}

/// Column name for a moving average requested via `compare_to`.
pub fn compare_column(kind: &IndicatorKind, period: usize) -> String {
    match kind {
        IndicatorKind::Ema => format!("{}_{}", EMA_COLUMN, period),
        _ => format!("{}_{}", SMA_COLUMN, period),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!(IndicatorKind::parse("RSI"), IndicatorKind::Rsi);
        assert_eq!(IndicatorKind::parse(" macd "), IndicatorKind::Macd);
        assert_eq!(IndicatorKind::parse("Bollinger"), IndicatorKind::Bbands);
    }

    #[test]
    fn parse_price_fields() {
        assert_eq!(
            IndicatorKind::parse("close"),
            IndicatorKind::Price(PriceField::Close)
        );
        assert_eq!(
            IndicatorKind::parse("Volume"),
            IndicatorKind::Price(PriceField::Volume)
        );
    }

    #[test]
    fn parse_unknown_keeps_name() {
        let kind = IndicatorKind::parse("ichimoku");
        assert_eq!(kind, IndicatorKind::Unsupported("ichimoku".into()));
        assert!(!kind.is_supported());
        assert!(kind.output_columns().is_empty());
        assert_eq!(kind.observed_column(&IndicatorParams::default()), None);
    }

    #[test]
    fn serde_round_trips_through_string() {
        let kind: IndicatorKind = serde_json::from_str("\"EMA\"").unwrap();
        assert_eq!(kind, IndicatorKind::Ema);
        assert_eq!(serde_json::to_string(&kind).unwrap(), "\"ema\"");
    }

    #[test]
    fn observed_column_for_bbands_band() {
        let mut params = IndicatorParams::default();
        assert_eq!(
            IndicatorKind::Bbands.observed_column(&params).as_deref(),
            Some(BB_MIDDLE_COLUMN)
        );
        params.band = Some("Lower".into());
        assert_eq!(
            IndicatorKind::Bbands.observed_column(&params).as_deref(),
            Some(BB_LOWER_COLUMN)
        );
    }

    #[test]
    fn macd_writes_three_columns() {
        assert_eq!(
            IndicatorKind::Macd.output_columns(),
            &[MACD_COLUMN, MACD_SIGNAL_COLUMN, MACD_HIST_COLUMN]
        );
    }

    #[test]
    fn params_accept_window_alias_and_floats() {
        let params: IndicatorParams =
            serde_json::from_str(r#"{"window": 14.0, "source": "high"}"#).unwrap();
        assert_eq!(params.period_or(20), 14);
        assert_eq!(params.source_field(), PriceField::High);
    }

    #[test]
    fn params_fall_back_to_defaults() {
        let params = IndicatorParams {
            period: Some(-3.0),
            stddev: Some(0.0),
            ..IndicatorParams::default()
        };
        assert_eq!(params.period_or(14), 14);
        assert_eq!(params.fast_or(12), 12);
        assert!((params.stddev_or(2.0) - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn compare_column_names() {
        assert_eq!(compare_column(&IndicatorKind::Sma, 50), "SMA_50");
        assert_eq!(compare_column(&IndicatorKind::Ema, 9), "EMA_9");
    }
}
