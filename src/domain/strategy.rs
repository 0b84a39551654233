//! Strategy specification as submitted per stock in a batch request.

use crate::domain::error::StratbenchError;
use crate::domain::indicator::{IndicatorSpec, RuleScope};
use crate::domain::rule::{extract_exit_rules, ExitCondition, Rule};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Deserializer, Serialize};

pub const TIMEFRAMES: [&str; 8] = ["1m", "5m", "15m", "1h", "4h", "1d", "1w", "1M"];

fn default_timeframe() -> String {
    "1d".to_string()
}

/// Accepts `YYYY-MM-DD`, a full ISO timestamp, an empty string or null.
fn lenient_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => {
            let day = s.get(..10).unwrap_or(s);
            NaiveDate::parse_from_str(day, "%Y-%m-%d")
                .map(Some)
                .map_err(|_| serde::de::Error::custom(format!("invalid start_date {s:?}")))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategySpec {
    pub symbol: String,
    pub investment: f64,
    #[serde(default, alias = "maxLoss")]
    pub max_loss: f64,
    #[serde(default = "default_timeframe")]
    pub timeframe: String,
    #[serde(default, deserialize_with = "lenient_date")]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub since_ipo: bool,
    #[serde(default)]
    pub entry_rules: Vec<Rule>,
    #[serde(default)]
    pub exit_conditions: Vec<ExitCondition>,
}

impl StrategySpec {
    /// Parse one request item. A malformed item only fails itself.
    pub fn from_value(value: &serde_json::Value) -> Result<Self, StratbenchError> {
        StrategySpec::deserialize(value).map_err(|e| StratbenchError::InvalidStrategy {
            symbol: symbol_hint(value),
            reason: e.to_string(),
        })
    }

    /// First bar to load; `None` means full history.
    pub fn history_start(&self) -> Option<NaiveDateTime> {
        if self.since_ipo {
            return None;
        }
        self.start_date
            .map(|date| NaiveDateTime::new(date, NaiveTime::MIN))
    }

    pub fn exit_rules(&self) -> Vec<&Rule> {
        extract_exit_rules(&self.exit_conditions)
    }

    /// Smallest take-profit threshold; any one firing closes the position.
    pub fn take_profit(&self) -> Option<f64> {
        self.exit_conditions
            .iter()
            .filter_map(|c| match c {
                ExitCondition::TakeProfit { value } => *value,
                _ => None,
            })
            .reduce(f64::min)
    }

    /// Smallest stop-loss threshold, as a positive loss amount.
    pub fn stop_loss(&self) -> Option<f64> {
        self.exit_conditions
            .iter()
            .filter_map(|c| match c {
                ExitCondition::StopLoss { value } => *value,
                _ => None,
            })
            .reduce(f64::min)
    }

    pub fn indicator_specs(&self) -> Vec<IndicatorSpec> {
        let entry = self
            .entry_rules
            .iter()
            .flat_map(|r| r.indicator_specs(RuleScope::Entry));
        let exit = self
            .exit_rules()
            .into_iter()
            .flat_map(|r| r.indicator_specs(RuleScope::Exit));
        entry.chain(exit).collect()
    }
}

pub fn symbol_hint(value: &serde_json::Value) -> String {
    value
        .get("symbol")
        .and_then(serde_json::Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .unwrap_or("<unknown>")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::indicator::IndicatorKind;
    use serde_json::json;

    fn sample_json() -> serde_json::Value {
        json!({
            "symbol": "NVDA",
            "investment": 1000,
            "max_loss": 50,
            "timeframe": "1d",
            "start_date": "2024-03-01T00:00:00.000Z",
            "since_ipo": false,
            "entry_rules": [
                {"indicator": "rsi", "params": {"period": 14}, "operator": "<", "value": 30}
            ],
            "exit_conditions": [
                {"type": "take_profit", "value": 100},
                {"type": "take_profit", "value": 40},
                {"type": "stop_loss", "value": 25},
                {"type": "indicator", "indicator_rule":
                    {"indicator": "macd", "operator": "crossesBelow", "value": 0}}
            ]
        })
    }

    #[test]
    fn parses_request_item() {
        let spec = StrategySpec::from_value(&sample_json()).unwrap();
        assert_eq!(spec.symbol, "NVDA");
        assert_eq!(spec.start_date, NaiveDate::from_ymd_opt(2024, 3, 1));
        assert_eq!(spec.entry_rules.len(), 1);
        assert_eq!(spec.exit_conditions.len(), 4);
    }

    #[test]
    fn thresholds_take_smallest() {
        let spec = StrategySpec::from_value(&sample_json()).unwrap();
        assert_eq!(spec.take_profit(), Some(40.0));
        assert_eq!(spec.stop_loss(), Some(25.0));
    }

    #[test]
    fn specs_cover_entry_then_exit() {
        let spec = StrategySpec::from_value(&sample_json()).unwrap();
        let specs = spec.indicator_specs();
        assert_eq!(specs.len(), 2);
        assert_eq!(specs[0].kind, IndicatorKind::Rsi);
        assert_eq!(specs[0].scope, RuleScope::Entry);
        assert_eq!(specs[1].kind, IndicatorKind::Macd);
        assert_eq!(specs[1].scope, RuleScope::Exit);
    }

    #[test]
    fn since_ipo_ignores_start_date() {
        let mut spec = StrategySpec::from_value(&sample_json()).unwrap();
        assert!(spec.history_start().is_some());
        spec.since_ipo = true;
        assert_eq!(spec.history_start(), None);
    }

    #[test]
    fn empty_start_date_is_none() {
        let mut value = sample_json();
        value["start_date"] = json!("");
        let spec = StrategySpec::from_value(&value).unwrap();
        assert_eq!(spec.start_date, None);
    }

    #[test]
    fn malformed_item_reports_symbol() {
        let value = json!({"symbol": "AAPL", "investment": "lots"});
        match StrategySpec::from_value(&value) {
            Err(StratbenchError::InvalidStrategy { symbol, .. }) => assert_eq!(symbol, "AAPL"),
            other => panic!("expected InvalidStrategy, got {other:?}"),
        }
    }

    #[test]
    fn defaults_apply() {
        let spec = StrategySpec::from_value(&json!({"symbol": "MSFT", "investment": 10})).unwrap();
        assert_eq!(spec.timeframe, "1d");
        assert!(spec.entry_rules.is_empty());
        assert_eq!(spec.take_profit(), None);
        assert_eq!(spec.stop_loss(), None);
    }
}
