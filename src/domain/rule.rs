//! Rule definitions as received in a backtest request.
//!
//! - `Rule`: one per-bar test of an indicator (or price) against a threshold
//! - `Operator`: comparison, crossover and range operators
//! - `RuleValue`: the threshold, which clients send as a number or a boolean
//! - `CompareTo`: optional explicit comparison series
//! - `ExitCondition`: take-profit / stop-loss thresholds or an indicator rule

use crate::domain::indicator::{
    compare_column, IndicatorKind, IndicatorParams, IndicatorSpec, RuleScope, DEFAULT_MA_PERIOD,
};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Operator {
    Gt,
    Lt,
    Ge,
    Le,
    CrossesAbove,
    CrossesBelow,
    Between,
    Unknown(String),
}

impl From<String> for Operator {
    fn from(value: String) -> Self {
        match value.trim() {
            ">" => Operator::Gt,
            "<" => Operator::Lt,
            ">=" => Operator::Ge,
            "<=" => Operator::Le,
            other => match other.to_lowercase().replace('_', "").as_str() {
                "crossesabove" => Operator::CrossesAbove,
                "crossesbelow" => Operator::CrossesBelow,
                "between" => Operator::Between,
                _ => Operator::Unknown(value),
            },
        }
    }
}

impl From<Operator> for String {
    fn from(op: Operator) -> Self {
        op.to_string()
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operator::Gt => write!(f, ">"),
            Operator::Lt => write!(f, "<"),
            Operator::Ge => write!(f, ">="),
            Operator::Le => write!(f, "<="),
            Operator::CrossesAbove => write!(f, "crossesAbove"),
            Operator::CrossesBelow => write!(f, "crossesBelow"),
            Operator::Between => write!(f, "between"),
            Operator::Unknown(raw) => write!(f, "{}", raw),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RuleValue {
    Number(f64),
    Flag(bool),
}

impl RuleValue {
    pub fn as_f64(self) -> f64 {
        match self {
            RuleValue::Number(v) => v,
            RuleValue::Flag(true) => 1.0,
            RuleValue::Flag(false) => 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", rename_all = "lowercase")]
pub enum CompareTo {
    Price,
    Sma,
    Ema,
    #[default]
    None,
}

impl From<String> for CompareTo {
    fn from(value: String) -> Self {
        match value.trim().to_lowercase().as_str() {
            "price" | "close" => CompareTo::Price,
            "sma" => CompareTo::Sma,
            "ema" => CompareTo::Ema,
            _ => CompareTo::None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub indicator: IndicatorKind,
    #[serde(default, deserialize_with = "null_as_default")]
    pub params: IndicatorParams,
    pub operator: Operator,
    #[serde(default)]
    pub value: Option<RuleValue>,
    #[serde(default)]
    pub value2: Option<f64>,
    #[serde(default, alias = "compareTo", deserialize_with = "null_as_default")]
    pub compare_to: CompareTo,
    #[serde(default, alias = "comparePeriod")]
    pub compare_period: Option<f64>,
}

impl Rule {
    pub fn new(indicator: IndicatorKind, operator: Operator, value: Option<f64>) -> Self {
        Self {
            indicator,
            params: IndicatorParams::default(),
            operator,
            value: value.map(RuleValue::Number),
            value2: None,
            compare_to: CompareTo::None,
            compare_period: None,
        }
    }

    /// Constant comparison level. Absent, non-positive and `false` values
    /// all yield `None`, which makes the rule compare against close.
    pub fn threshold(&self) -> Option<f64> {
        match self.value? {
            RuleValue::Number(v) if v > 0.0 => Some(v),
            RuleValue::Flag(true) => Some(1.0),
            _ => None,
        }
    }

    pub fn compare_period(&self) -> usize {
        match self.compare_period {
            Some(p) if p.is_finite() && p >= 1.0 => p as usize,
            _ => DEFAULT_MA_PERIOD,
        }
    }

    /// Moving average kind requested through `compare_to`, if any.
    pub fn compare_kind(&self) -> Option<IndicatorKind> {
        match self.compare_to {
            CompareTo::Sma => Some(IndicatorKind::Sma),
            CompareTo::Ema => Some(IndicatorKind::Ema),
            CompareTo::Price | CompareTo::None => None,
        }
    }

    pub fn compare_column(&self) -> Option<String> {
        self.compare_kind()
            .map(|kind| compare_column(&kind, self.compare_period()))
    }

    /// Indicator computations this rule depends on.
    pub fn indicator_specs(&self, scope: RuleScope) -> Vec<IndicatorSpec> {
        let mut specs = Vec::new();
        if !matches!(self.indicator, IndicatorKind::Price(_)) {
            specs.push(IndicatorSpec::new(
                self.indicator.clone(),
                self.params.clone(),
                scope,
            ));
        }
        if let Some(kind) = self.compare_kind() {
            specs.push(IndicatorSpec::new(
                kind,
                IndicatorParams::with_period(self.compare_period()),
                RuleScope::Compare,
            ));
        }
        specs
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.indicator, self.operator)?;
        match self.compare_to {
            CompareTo::Price => write!(f, " price"),
            CompareTo::Sma | CompareTo::Ema => {
                write!(f, " {}", self.compare_column().unwrap_or_default())
            }
            CompareTo::None => match (self.value, self.value2) {
                (Some(v), Some(v2)) => write!(f, " {}..{}", v.as_f64(), v2),
                (Some(v), None) => write!(f, " {}", v.as_f64()),
                (None, _) => write!(f, " close"),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ExitCondition {
    TakeProfit {
        #[serde(default)]
        value: Option<f64>,
    },
    StopLoss {
        #[serde(default)]
        value: Option<f64>,
    },
    Indicator {
        #[serde(default)]
        indicator_rule: Option<Rule>,
    },
}

impl ExitCondition {
    pub fn indicator_rule(&self) -> Option<&Rule> {
        match self {
            ExitCondition::Indicator { indicator_rule } => indicator_rule.as_ref(),
            _ => None,
        }
    }
}

/// Nested rules of every `indicator`-typed exit condition, in order.
pub fn extract_exit_rules(conditions: &[ExitCondition]) -> Vec<&Rule> {
    conditions
        .iter()
        .filter_map(ExitCondition::indicator_rule)
        .collect()
}
