//! Up-front validation of run configuration and strategy specs.
//!
//! Nothing is fetched or computed for an input that fails here.

use crate::domain::error::StratbenchError;
use crate::domain::rule::{ExitCondition, Operator, Rule};
use crate::domain::strategy::{StrategySpec, TIMEFRAMES};
use crate::ports::config_port::ConfigPort;

pub const DATA_SOURCES: [&str; 2] = ["csv", "json"];
pub const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];
pub const LOG_FORMATS: [&str; 2] = ["pretty", "json"];

pub fn validate_run_config(config: &dyn ConfigPort) -> Result<(), StratbenchError> {
    validate_data_dir(config)?;
    validate_choice(config, "data", "source", &DATA_SOURCES)?;
    validate_workers(config)?;
    validate_choice(config, "logging", "level", &LOG_LEVELS)?;
    validate_choice(config, "logging", "format", &LOG_FORMATS)?;
    Ok(())
}

fn validate_data_dir(config: &dyn ConfigPort) -> Result<(), StratbenchError> {
    config
        .get_string("data", "dir")
        .map(|_| ())
        .ok_or_else(|| StratbenchError::ConfigMissing {
            section: "data".to_string(),
            key: "dir".to_string(),
        })
}

/// Optional keys: absent is fine, present must be one of `allowed`.
fn validate_choice(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    allowed: &[&str],
) -> Result<(), StratbenchError> {
    match config.get_string(section, key) {
        Some(value) if !allowed.contains(&value.to_lowercase().as_str()) => {
            Err(StratbenchError::ConfigInvalid {
                section: section.to_string(),
                key: key.to_string(),
                reason: format!("{value:?} is not one of {}", allowed.join(", ")),
            })
        }
        _ => Ok(()),
    }
}

fn validate_workers(config: &dyn ConfigPort) -> Result<(), StratbenchError> {
    let Some(raw) = config.get_string("run", "workers") else {
        return Ok(());
    };
    match raw.parse::<i64>() {
        Ok(n) if n >= 0 => Ok(()),
        _ => Err(StratbenchError::ConfigInvalid {
            section: "run".to_string(),
            key: "workers".to_string(),
            reason: format!("{raw:?} is not a non-negative integer"),
        }),
    }
}

pub fn validate_strategy(spec: &StrategySpec) -> Result<(), StratbenchError> {
    let invalid = |reason: String| StratbenchError::InvalidStrategy {
        symbol: if spec.symbol.trim().is_empty() {
            "<unknown>".to_string()
        } else {
            spec.symbol.clone()
        },
        reason,
    };

    if spec.symbol.trim().is_empty() {
        return Err(invalid("symbol must not be empty".to_string()));
    }
    if !spec.investment.is_finite() || spec.investment <= 0.0 {
        return Err(invalid(format!(
            "investment must be positive, got {}",
            spec.investment
        )));
    }
    if !spec.max_loss.is_finite() || spec.max_loss < 0.0 {
        return Err(invalid(format!(
            "max_loss must be non-negative, got {}",
            spec.max_loss
        )));
    }
    if !TIMEFRAMES.contains(&spec.timeframe.as_str()) {
        return Err(invalid(format!(
            "unknown timeframe {:?} (expected one of {})",
            spec.timeframe,
            TIMEFRAMES.join(", ")
        )));
    }
    if spec.entry_rules.is_empty() {
        return Err(invalid("entry_rules must not be empty".to_string()));
    }
    if spec.exit_conditions.is_empty() {
        return Err(invalid("exit_conditions must not be empty".to_string()));
    }

    for (i, rule) in spec.entry_rules.iter().enumerate() {
        validate_rule(rule).map_err(|reason| invalid(format!("entry rule {i}: {reason}")))?;
    }

    for (i, condition) in spec.exit_conditions.iter().enumerate() {
        match condition {
            ExitCondition::TakeProfit { value } | ExitCondition::StopLoss { value } => {
                if !value.is_some_and(|v| v.is_finite() && v > 0.0) {
                    return Err(invalid(format!(
                        "exit condition {i}: threshold must be a positive number"
                    )));
                }
            }
            ExitCondition::Indicator { indicator_rule } => match indicator_rule {
                Some(rule) => validate_rule(rule)
                    .map_err(|reason| invalid(format!("exit condition {i}: {reason}")))?,
                None => {
                    return Err(invalid(format!(
                        "exit condition {i}: indicator exit needs an indicator_rule"
                    )));
                }
            },
        }
    }

    Ok(())
}

fn validate_rule(rule: &Rule) -> Result<(), String> {
    if rule.operator == Operator::Between && (rule.value.is_none() || rule.value2.is_none()) {
        return Err(format!("`{rule}` needs both value and value2"));
    }
    Ok(())
}
