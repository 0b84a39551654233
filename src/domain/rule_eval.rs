//! Signal evaluation over an indicator frame.
//!
//! # Evaluation Semantics
//!
//! - Entry signal: AND of every entry rule; no rules means never enter
//! - Exit signal: OR of every `indicator` exit condition's nested rule
//! - Comparison series: `compare_to` column if set, else the rule's
//!   threshold broadcast, else close
//! - `crossesAbove`/`crossesBelow`: false at index 0 and whenever either
//!   bar of the pair has a missing value
//! - Unknown operators and unsupported indicators: false on every bar

use crate::domain::error::StratbenchError;
use crate::domain::indicator::Column;
use crate::domain::ohlcv::PriceField;
use crate::domain::pipeline::IndicatorFrame;
use crate::domain::rule::{extract_exit_rules, CompareTo, ExitCondition, Operator, Rule};
use tracing::warn;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Signals {
    pub entry: Vec<bool>,
    pub exit: Vec<bool>,
}

impl Signals {
    pub fn entry_at(&self, index: usize) -> bool {
        self.entry.get(index).copied().unwrap_or(false)
    }

    pub fn exit_at(&self, index: usize) -> bool {
        self.exit.get(index).copied().unwrap_or(false)
    }
}

pub fn evaluate(
    frame: &IndicatorFrame,
    entry_rules: &[Rule],
    exit_conditions: &[ExitCondition],
) -> Result<Signals, StratbenchError> {
    let len = frame.len();
    if len == 0 {
        return Ok(Signals::default());
    }

    let entry = if entry_rules.is_empty() {
        vec![false; len]
    } else {
        let mut acc = vec![true; len];
        for rule in entry_rules {
            let series = evaluate_rule(frame, rule)?;
            for (a, s) in acc.iter_mut().zip(series) {
                *a = *a && s;
            }
        }
        acc
    };

    let mut exit = vec![false; len];
    for rule in extract_exit_rules(exit_conditions) {
        let series = evaluate_rule(frame, rule)?;
        for (a, s) in exit.iter_mut().zip(series) {
            *a = *a || s;
        }
    }

    Ok(Signals { entry, exit })
}

/// Per-bar boolean test of a single rule.
pub fn evaluate_rule(frame: &IndicatorFrame, rule: &Rule) -> Result<Vec<bool>, StratbenchError> {
    let len = frame.len();
    let Some(name) = rule.indicator.observed_column(&rule.params) else {
        warn!(rule = %rule, "rule references an unsupported indicator; never true");
        return Ok(vec![false; len]);
    };
    let observed = require_column(frame, rule, &name)?;
    let comparison = comparison_series(frame, rule)?;
    let signal = match &rule.operator {
        Operator::Gt => pointwise(&observed, &comparison, |o, c| o > c),
        Operator::Lt => pointwise(&observed, &comparison, |o, c| o < c),
        Operator::Ge => pointwise(&observed, &comparison, |o, c| o >= c),
        Operator::Le => pointwise(&observed, &comparison, |o, c| o <= c),
        Operator::CrossesAbove => crossing(&observed, &comparison, |po, pc, o, c| po <= pc && o > c),
        Operator::CrossesBelow => crossing(&observed, &comparison, |po, pc, o, c| po >= pc && o < c),
        Operator::Between => between(&observed, rule),
        Operator::Unknown(op) => {
            warn!(rule = %rule, operator = %op, "unknown operator; never true");
            vec![false; len]
        }
    };
    Ok(signal)
}

fn require_column(
    frame: &IndicatorFrame,
    rule: &Rule,
    name: &str,
) -> Result<Column, StratbenchError> {
    frame
        .column(name)
        .ok_or_else(|| StratbenchError::MissingIndicatorColumn {
            rule: rule.to_string(),
            column: name.to_string(),
        })
}

fn comparison_series(frame: &IndicatorFrame, rule: &Rule) -> Result<Column, StratbenchError> {
    let close = || frame.bars().column(PriceField::Close);
    match rule.compare_to {
        CompareTo::Price => Ok(close()),
        CompareTo::Sma | CompareTo::Ema => match rule.compare_column() {
            Some(name) => require_column(frame, rule, &name),
            None => Ok(close()),
        },
        CompareTo::None => Ok(match rule.threshold() {
            Some(level) => vec![Some(level); frame.len()],
            None => close(),
        }),
    }
}

fn pointwise(
    observed: &[Option<f64>],
    comparison: &[Option<f64>],
    test: impl Fn(f64, f64) -> bool,
) -> Vec<bool> {
    observed
        .iter()
        .zip(comparison)
        .map(|(o, c)| matches!((o, c), (Some(o), Some(c)) if test(*o, *c)))
        .collect()
}

fn crossing(
    observed: &[Option<f64>],
    comparison: &[Option<f64>],
    test: impl Fn(f64, f64, f64, f64) -> bool,
) -> Vec<bool> {
    (0..observed.len())
        .map(|i| {
            if i == 0 {
                return false;
            }
            match (observed[i - 1], comparison[i - 1], observed[i], comparison[i]) {
                (Some(po), Some(pc), Some(o), Some(c)) => test(po, pc, o, c),
                _ => false,
            }
        })
        .collect()
}

/// Inclusive range between `value` and `value2`, in either order.
fn between(observed: &[Option<f64>], rule: &Rule) -> Vec<bool> {
    let (Some(a), Some(b)) = (rule.value.map(|v| v.as_f64()), rule.value2) else {
        warn!(rule = %rule, "between needs value and value2; never true");
        return vec![false; observed.len()];
    };
    let (lower, upper) = (a.min(b), a.max(b));
    observed
        .iter()
        .map(|o| matches!(o, Some(v) if *v >= lower && *v <= upper))
        .collect()
}
