//! Backtest orchestration: one strategy against one bar series, and the
//! batch runner that fans a request out across strategies.
//!
//! A single run is pure: pipeline, evaluator, simulator, summarizer, in
//! that order, over a private copy of the bars. The batch runner only adds
//! validation and data access around it, and keeps every item's outcome
//! independent of the others.

use crate::domain::config_validation::validate_strategy;
use crate::domain::error::StratbenchError;
use crate::domain::execution::{simulate, ExitThresholds, SimulationResult};
use crate::domain::metrics::{summarize, Summary};
use crate::domain::ohlcv::BarSeries;
use crate::domain::pipeline::{compute_for_strategy, IndicatorFrame};
use crate::domain::position::Trade;
use crate::domain::rule_eval::{evaluate, Signals};
use crate::domain::strategy::{symbol_hint, StrategySpec};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use rayon::prelude::*;
use serde::Serialize;
use serde_json::Value;
use std::path::Path;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestRun {
    pub frame: IndicatorFrame,
    pub signals: Signals,
    pub simulation: SimulationResult,
    pub summary: Summary,
}

impl BacktestRun {
    pub fn trades(&self) -> &[Trade] {
        &self.simulation.trades
    }
}

pub fn run_strategy(bars: &BarSeries, spec: &StrategySpec) -> Result<BacktestRun, StratbenchError> {
    let frame = compute_for_strategy(bars, spec);
    let signals = evaluate(&frame, &spec.entry_rules, &spec.exit_conditions)?;
    let thresholds = ExitThresholds {
        take_profit: spec.take_profit(),
        stop_loss: spec.stop_loss(),
    };
    let simulation = simulate(frame.bars(), &signals, thresholds, spec.investment);
    let summary = summarize(&simulation.trades, spec.investment);

    Ok(BacktestRun {
        frame,
        signals,
        simulation,
        summary,
    })
}

/// Raw request items; each is parsed on its own so one malformed item
/// cannot fail the batch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BacktestRequest {
    pub stocks: Vec<Value>,
}

impl BacktestRequest {
    /// Accepts `{"stocks": [...]}` or a bare array of strategy items.
    pub fn from_value(value: Value) -> Result<Self, StratbenchError> {
        match value {
            Value::Array(stocks) => Ok(Self { stocks }),
            Value::Object(mut map) => match map.remove("stocks") {
                Some(Value::Array(stocks)) => Ok(Self { stocks }),
                _ => Err(StratbenchError::Request {
                    reason: "expected a \"stocks\" array".to_string(),
                }),
            },
            _ => Err(StratbenchError::Request {
                reason: "request must be a JSON object or array".to_string(),
            }),
        }
    }

    pub fn from_json(text: &str) -> Result<Self, StratbenchError> {
        Self::from_value(serde_json::from_str(text)?)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, StratbenchError> {
        Self::from_json(&std::fs::read_to_string(path)?)
    }
}

#[derive(Debug)]
pub struct StrategyOutcome {
    pub symbol: String,
    pub result: Result<BacktestRun, StratbenchError>,
}

/// Wire shape of one outcome.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum OutcomeReport<'a> {
    Completed {
        symbol: &'a str,
        trades: &'a [Trade],
        summary: &'a Summary,
    },
    Failed {
        symbol: &'a str,
        error: String,
    },
}

impl StrategyOutcome {
    pub fn report(&self) -> OutcomeReport<'_> {
        match &self.result {
            Ok(run) => OutcomeReport::Completed {
                symbol: &self.symbol,
                trades: run.trades(),
                summary: &run.summary,
            },
            Err(e) => OutcomeReport::Failed {
                symbol: &self.symbol,
                error: e.to_string(),
            },
        }
    }

    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchOptions {
    pub parallel: bool,
    /// 0 uses rayon's default thread count.
    pub workers: usize,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            parallel: true,
            workers: 0,
        }
    }
}

impl BatchOptions {
    pub fn from_config(config: &dyn ConfigPort) -> Self {
        Self {
            parallel: config.get_bool("run", "parallel", true),
            workers: usize::try_from(config.get_int("run", "workers", 0)).unwrap_or(0),
        }
    }

    pub fn sequential() -> Self {
        Self {
            parallel: false,
            workers: 0,
        }
    }
}

/// One outcome per request item, in request order.
pub fn run_batch(
    data: &dyn DataPort,
    request: &BacktestRequest,
    options: &BatchOptions,
) -> Vec<StrategyOutcome> {
    info!(
        strategies = request.stocks.len(),
        parallel = options.parallel,
        "starting batch"
    );

    if !options.parallel {
        return request.stocks.iter().map(|item| run_item(data, item)).collect();
    }

    let run_all = || {
        request
            .stocks
            .par_iter()
            .map(|item| run_item(data, item))
            .collect::<Vec<_>>()
    };

    if options.workers == 0 {
        return run_all();
    }
    match rayon::ThreadPoolBuilder::new()
        .num_threads(options.workers)
        .build()
    {
        Ok(pool) => pool.install(run_all),
        Err(e) => {
            warn!(error = %e, "could not build worker pool; using the global pool");
            run_all()
        }
    }
}

/// Parse, validate, fetch and run a single request item.
pub fn run_item(data: &dyn DataPort, item: &Value) -> StrategyOutcome {
    let symbol = symbol_hint(item);
    let result = StrategySpec::from_value(item).and_then(|spec| {
        validate_strategy(&spec)?;
        let bars = data.fetch_bars(&spec.symbol, &spec.timeframe, spec.history_start())?;
        run_strategy(&bars, &spec)
    });

    match &result {
        Ok(run) => info!(
            symbol = %symbol,
            bars = run.frame.len(),
            trades = run.summary.num_trades,
            total_profit = run.summary.total_profit,
            "strategy finished"
        ),
        Err(e) => warn!(symbol = %symbol, error = %e, "strategy failed"),
    }

    StrategyOutcome { symbol, result }
}
