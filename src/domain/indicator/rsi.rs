//! RSI (Relative Strength Index) indicator implementation.
//!
//! Uses Wilder's smoothing for average gain/loss calculation:
//! - First average: simple mean of gains/losses over the first n changes
//! - Subsequent: avg = (prev_avg * (n-1) + current) / n
//!
//! Formula: RSI = 100 - (100 / (1 + avg_gain / avg_loss))
//! If avg_loss == 0: RSI = 100
//!
//! Warmup: first n bars are undefined (n changes are needed for the seed).
//! A change touching a missing value is undefined and does not advance the
//! averages.

use crate::domain::indicator::Column;

fn rsi_from(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        100.0
    } else {
        100.0 - (100.0 / (1.0 + avg_gain / avg_loss))
    }
}

pub fn calculate_rsi(values: &[Option<f64>], period: usize) -> Column {
    let mut out = vec![None; values.len()];
    if period == 0 || values.len() < 2 {
        return out;
    }

    let mut seen = 0usize;
    let mut gain_sum = 0.0;
    let mut loss_sum = 0.0;
    let mut averages: Option<(f64, f64)> = None;

    for i in 1..values.len() {
        let (Some(prev), Some(curr)) = (values[i - 1], values[i]) else {
            continue;
        };
        let change = curr - prev;
        let gain = if change > 0.0 { change } else { 0.0 };
        let loss = if change < 0.0 { -change } else { 0.0 };

        averages = match averages {
            Some((avg_gain, avg_loss)) => Some((
                (avg_gain * (period - 1) as f64 + gain) / period as f64,
                (avg_loss * (period - 1) as f64 + loss) / period as f64,
            )),
            None => {
                seen += 1;
                gain_sum += gain;
                loss_sum += loss;
                if seen == period {
                    Some((gain_sum / period as f64, loss_sum / period as f64))
                } else {
                    None
                }
            }
        };

        if let Some((avg_gain, avg_loss)) = averages {
            out[i] = Some(rsi_from(avg_gain, avg_loss));
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn defined(prices: &[f64]) -> Vec<Option<f64>> {
        prices.iter().copied().map(Some).collect()
    }

    #[test]
    fn rsi_empty() {
        assert!(calculate_rsi(&[], 14).is_empty());
    }

    #[test]
    fn rsi_single_bar() {
        let series = calculate_rsi(&defined(&[100.0]), 14);
        assert_eq!(series, vec![None]);
    }

    #[test]
    fn rsi_warmup_period() {
        let prices: Vec<f64> = (1..=15).map(|i| 100.0 + (i as f64 % 5.0) * 2.0).collect();
        let series = calculate_rsi(&defined(&prices), 14);

        assert_eq!(series.len(), 15);
        for (i, v) in series.iter().enumerate().take(14) {
            assert!(v.is_none(), "Bar {} should be undefined", i);
        }
        assert!(series[14].is_some(), "Bar 14 should be defined");
    }

    #[test]
    fn rsi_all_gains_no_losses() {
        let prices: Vec<f64> = (0..15).map(|i| 100.0 + i as f64).collect();
        let series = calculate_rsi(&defined(&prices), 14);
        assert!((series[14].unwrap() - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn rsi_all_losses_no_gains() {
        let prices: Vec<f64> = (0..15).map(|i| 100.0 - i as f64).collect();
        let series = calculate_rsi(&defined(&prices), 14);
        assert!(series[14].unwrap().abs() < f64::EPSILON);
    }

    #[test]
    fn rsi_in_range() {
        let prices: Vec<f64> = (1..=40)
            .map(|i| 100.0 + (i as f64 % 7.0 - 3.0) * 2.0)
            .collect();
        let series = calculate_rsi(&defined(&prices), 14);

        for rsi in series.iter().flatten() {
            assert!((0.0..=100.0).contains(rsi), "RSI {} out of range", rsi);
        }
    }

    #[test]
    fn rsi_wilder_smoothing_step() {
        // period 2: changes +2, -1 seed avg_gain 1.0, avg_loss 0.5
        let series = calculate_rsi(&defined(&[10.0, 12.0, 11.0, 14.0]), 2);
        let seed = 100.0 - 100.0 / (1.0 + 1.0 / 0.5);
        assert!((series[2].unwrap() - seed).abs() < 1e-12);

        let avg_gain = (1.0 * 1.0 + 3.0) / 2.0;
        let avg_loss = (0.5 * 1.0 + 0.0) / 2.0;
        let expected = 100.0 - 100.0 / (1.0 + avg_gain / avg_loss);
        assert!((series[3].unwrap() - expected).abs() < 1e-12);
    }

    #[test]
    fn rsi_missing_close_delays_seed() {
        let values = vec![Some(10.0), None, Some(12.0), Some(11.0), Some(13.0)];
        let series = calculate_rsi(&values, 2);
        assert_eq!(series[1], None);
        assert_eq!(series[2], None);
        assert_eq!(series[3], None);
        assert!(series[4].is_some());
    }

    #[test]
    fn rsi_zero_period() {
        let series = calculate_rsi(&defined(&[100.0, 101.0]), 0);
        assert_eq!(series, vec![None, None]);
    }
}
