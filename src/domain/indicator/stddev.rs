//! Rolling standard deviation.
//!
//! Population standard deviation over n values.
//! STDDEV(n)[i] = sqrt(sum((V[i-j] - SMA(n)[i])^2 for j in 0..n-1) / n)
//! Warmup: first (n-1) bars are undefined.

use crate::domain::indicator::Column;

pub fn calculate_stddev(values: &[Option<f64>], period: usize) -> Column {
    if period == 0 {
        return vec![None; values.len()];
    }

    (0..values.len())
        .map(|i| {
            if i + 1 < period {
                return None;
            }
            let window = values[i + 1 - period..=i]
                .iter()
                .copied()
                .collect::<Option<Vec<f64>>>()?;

            let mean = window.iter().sum::<f64>() / period as f64;
            let variance = window
                .iter()
                .map(|v| {
                    let diff = v - mean;
                    diff * diff
                })
                .sum::<f64>()
                / period as f64;

            Some(variance.sqrt())
        })
        .collect()
}
