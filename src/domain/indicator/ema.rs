//! Exponential Moving Average indicator.
//!
//! k = 2/(n+1), seed with the SMA of the first n defined values, then
//! EMA[i] = V[i]*k + EMA[i-1]*(1-k).
//! Leading gaps shift the warmup; an interior gap yields an undefined bar and
//! leaves the running average untouched.

use crate::domain::indicator::Column;

pub fn calculate_ema(values: &[Option<f64>], period: usize) -> Column {
    if period == 0 {
        return vec![None; values.len()];
    }

    let k = 2.0 / (period as f64 + 1.0);
    let mut out = Vec::with_capacity(values.len());
    let mut seen = 0usize;
    let mut sum = 0.0;
    let mut ema: Option<f64> = None;

    for value in values {
        let Some(v) = *value else {
            out.push(None);
            continue;
        };

        match ema {
            Some(prev) => {
                let next = v * k + prev * (1.0 - k);
                ema = Some(next);
                out.push(Some(next));
            }
            None => {
                seen += 1;
                sum += v;
                if seen == period {
                    let seed = sum / period as f64;
                    ema = Some(seed);
                    out.push(Some(seed));
                } else {
                    out.push(None);
                }
            }
        }
    }

    out
}
