//! Indicator pipeline: turns a bar series plus indicator specs into a frame
//! of named derived columns.
//!
//! Specs are applied in order. A spec whose kind writes an existing column
//! replaces it (last write wins). Unsupported kinds are logged and skipped;
//! the pipeline itself never fails.

use crate::domain::indicator::bollinger::calculate_bollinger;
use crate::domain::indicator::cci::calculate_cci;
use crate::domain::indicator::macd::{self, calculate_macd};
use crate::domain::indicator::rsi::calculate_rsi;
use crate::domain::indicator::{
    calculate_ema, calculate_sma, compare_column, Column, IndicatorKind, IndicatorSpec,
    RuleScope, BB_LOWER_COLUMN, BB_MIDDLE_COLUMN, BB_UPPER_COLUMN, CCI_COLUMN,
    DEFAULT_BBANDS_PERIOD, DEFAULT_BBANDS_STDDEV, DEFAULT_CCI_PERIOD, DEFAULT_MA_PERIOD,
    DEFAULT_RSI_PERIOD, EMA_COLUMN, MACD_COLUMN, MACD_HIST_COLUMN, MACD_SIGNAL_COLUMN,
    RSI_COLUMN, SMA_COLUMN,
};
use crate::domain::ohlcv::{BarSeries, PriceField};
use crate::domain::strategy::StrategySpec;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// A run's private copy of the bars plus every derived column.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndicatorFrame {
    bars: BarSeries,
    columns: BTreeMap<String, Column>,
}

impl IndicatorFrame {
    pub fn new(bars: BarSeries) -> Self {
        Self {
            bars,
            columns: BTreeMap::new(),
        }
    }

    pub fn bars(&self) -> &BarSeries {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// Raw price columns by lowercase name, derived columns by exact name.
    pub fn column(&self, name: &str) -> Option<Column> {
        if let Some(column) = self.columns.get(name) {
            return Some(column.clone());
        }
        PriceField::parse(name)
            .filter(|field| field.column_name() == name)
            .map(|field| self.bars.column(field))
    }

    pub fn derived(&self, name: &str) -> Option<&[Option<f64>]> {
        self.columns.get(name).map(Vec::as_slice)
    }

    pub fn derived_names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    /// Returns true when an earlier column of the same name was replaced.
    pub fn set_column(&mut self, name: impl Into<String>, column: Column) -> bool {
        let name = name.into();
        let replaced = self.columns.insert(name.clone(), column).is_some();
        if replaced {
            warn!(column = %name, "derived column overwritten by a later indicator");
        }
        replaced
    }
}

pub fn compute(bars: &BarSeries, specs: &[IndicatorSpec]) -> IndicatorFrame {
    let mut frame = IndicatorFrame::new(bars.clone());
    for spec in specs {
        apply_spec(&mut frame, spec);
    }
    frame
}

/// Entry specs first, then the specs of `indicator` exit conditions.
pub fn compute_for_strategy(bars: &BarSeries, strategy: &StrategySpec) -> IndicatorFrame {
    compute(bars, &strategy.indicator_specs())
}

fn apply_spec(frame: &mut IndicatorFrame, spec: &IndicatorSpec) {
    let params = &spec.params;
    let source = frame.bars.column(params.source_field());

    if spec.scope == RuleScope::Compare {
        let period = params.period_or(DEFAULT_MA_PERIOD);
        let column = match spec.kind {
            IndicatorKind::Ema => calculate_ema(&source, period),
            _ => calculate_sma(&source, period),
        };
        frame.set_column(compare_column(&spec.kind, period), column);
        return;
    }

    match &spec.kind {
        IndicatorKind::Rsi => {
            let period = params.period_or(DEFAULT_RSI_PERIOD);
            frame.set_column(RSI_COLUMN, calculate_rsi(&source, period));
        }
        IndicatorKind::Sma => {
            let period = params.period_or(DEFAULT_MA_PERIOD);
            frame.set_column(SMA_COLUMN, calculate_sma(&source, period));
        }
        IndicatorKind::Ema => {
            let period = params.period_or(DEFAULT_MA_PERIOD);
            frame.set_column(EMA_COLUMN, calculate_ema(&source, period));
        }
        IndicatorKind::Macd => {
            let columns = calculate_macd(
                &source,
                params.fast_or(macd::DEFAULT_FAST),
                params.slow_or(macd::DEFAULT_SLOW),
                params.signal_or(macd::DEFAULT_SIGNAL),
            );
            frame.set_column(MACD_COLUMN, columns.line);
            frame.set_column(MACD_SIGNAL_COLUMN, columns.signal);
            frame.set_column(MACD_HIST_COLUMN, columns.histogram);
        }
        IndicatorKind::Cci => {
            let period = params.period_or(DEFAULT_CCI_PERIOD);
            let typical = frame.bars.typical_prices();
            frame.set_column(CCI_COLUMN, calculate_cci(&typical, period));
        }
        IndicatorKind::Bbands => {
            let bands = calculate_bollinger(
                &source,
                params.period_or(DEFAULT_BBANDS_PERIOD),
                params.stddev_or(DEFAULT_BBANDS_STDDEV),
            );
            frame.set_column(BB_UPPER_COLUMN, bands.upper);
            frame.set_column(BB_MIDDLE_COLUMN, bands.middle);
            frame.set_column(BB_LOWER_COLUMN, bands.lower);
        }
        IndicatorKind::Price(field) => {
            debug!(column = field.column_name(), "price column needs no computation");
        }
        IndicatorKind::Unsupported(name) => {
            warn!(indicator = %name, "indicator not implemented; skipping");
        }
    }
}
