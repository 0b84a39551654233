//! MACD (Moving Average Convergence Divergence) indicator.
//!
//! MACD Line = EMA(fast) - EMA(slow)
//! Signal Line = EMA(signal) of the defined MACD Line values
//! Histogram = MACD Line - Signal Line
//!
//! Default parameters: fast=12, slow=26, signal=9
//! Warmup: max(fast, slow) - 1 bars for the line, plus signal - 1 for the
//! signal and histogram.

use crate::domain::indicator::{calculate_ema, Column};

pub const DEFAULT_FAST: usize = 12;
pub const DEFAULT_SLOW: usize = 26;
pub const DEFAULT_SIGNAL: usize = 9;

#[derive(Debug, Clone, PartialEq)]
pub struct MacdColumns {
    pub line: Column,
    pub signal: Column,
    pub histogram: Column,
}

pub fn calculate_macd(
    values: &[Option<f64>],
    fast: usize,
    slow: usize,
    signal_period: usize,
) -> MacdColumns {
    let ema_fast = calculate_ema(values, fast);
    let ema_slow = calculate_ema(values, slow);

    let line: Column = ema_fast
        .iter()
        .zip(&ema_slow)
        .map(|(f, s)| Some((*f)? - (*s)?))
        .collect();

    let signal = calculate_ema(&line, signal_period);

    let histogram = line
        .iter()
        .zip(&signal)
        .map(|(l, s)| Some((*l)? - (*s)?))
        .collect();

    MacdColumns {
        line,
        signal,
        histogram,
    }
}
