//! Commodity Channel Index.
//!
//! TP = (high + low + close) / 3
//! CCI = (TP - SMA(TP, n)) / (0.015 * MeanDeviation(TP, n))
//! Undefined during warmup and wherever the mean deviation is zero.

use crate::domain::indicator::{calculate_sma, Column};

const LAMBERT_CONSTANT: f64 = 0.015;

pub fn calculate_cci(typical_prices: &[Option<f64>], period: usize) -> Column {
    let sma = calculate_sma(typical_prices, period);

    sma.iter()
        .enumerate()
        .map(|(i, mean)| {
            let mean = (*mean)?;
            let tp = typical_prices[i]?;
            let window = &typical_prices[i + 1 - period..=i];
            let mean_dev = window
                .iter()
                .map(|v| v.map(|v| (v - mean).abs()))
                .sum::<Option<f64>>()?
                / period as f64;
            if mean_dev == 0.0 {
                return None;
            }
            Some((tp - mean) / (LAMBERT_CONSTANT * mean_dev))
        })
        .collect()
}
