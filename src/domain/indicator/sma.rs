//! Simple Moving Average indicator.
//!
//! SMA(n)[i] = mean(values[i-n+1..=i]).
//! Warmup: first (n-1) bars are undefined, as is any window holding a gap.

use crate::domain::indicator::Column;

pub fn calculate_sma(values: &[Option<f64>], period: usize) -> Column {
    if period == 0 {
        return vec![None; values.len()];
    }

    (0..values.len())
        .map(|i| {
            if i + 1 < period {
                return None;
            }
            let window = &values[i + 1 - period..=i];
            let sum = window.iter().copied().sum::<Option<f64>>()?;
            Some(sum / period as f64)
        })
        .collect()
}
