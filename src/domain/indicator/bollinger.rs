//! Bollinger Bands indicator.
//!
//! Bollinger Bands consist of:
//! - Middle: Simple Moving Average (SMA) over n periods
//! - Upper: Middle + (multiplier × StdDev)
//! - Lower: Middle - (multiplier × StdDev)
//!
//! Where StdDev is population standard deviation (divides by N, not N-1).
//! Warmup: first (period-1) bars are undefined.

use crate::domain::indicator::stddev::calculate_stddev;
use crate::domain::indicator::{calculate_sma, Column};

#[derive(Debug, Clone, PartialEq)]
pub struct BollingerColumns {
    pub upper: Column,
    pub middle: Column,
    pub lower: Column,
}

pub fn calculate_bollinger(values: &[Option<f64>], period: usize, multiplier: f64) -> BollingerColumns {
    let middle = calculate_sma(values, period);
    let stddev = calculate_stddev(values, period);

    let band = |sign: f64| -> Column {
        middle
            .iter()
            .zip(&stddev)
            .map(|(m, s)| Some(m.as_ref()? + sign * multiplier * s.as_ref()?))
            .collect()
    };

    BollingerColumns {
        upper: band(1.0),
        lower: band(-1.0),
        middle,
    }
}
