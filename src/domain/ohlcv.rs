//! OHLCV bar representation and the immutable bar series.

use crate::domain::error::StratbenchError;
use chrono::NaiveDateTime;

/// One historical sample. `None` marks a value the provider did not supply
/// (or supplied as a sentinel); adapters normalize before construction.
#[derive(Debug, Clone, PartialEq)]
pub struct OhlcvBar {
    pub datetime: NaiveDateTime,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: Option<f64>,
    pub volume: Option<f64>,
}

impl OhlcvBar {
    /// (high + low + close) / 3
    pub fn typical_price(&self) -> Option<f64> {
        Some((self.high? + self.low? + self.close?) / 3.0)
    }

    pub fn field(&self, field: PriceField) -> Option<f64> {
        match field {
            PriceField::Open => self.open,
            PriceField::High => self.high,
            PriceField::Low => self.low,
            PriceField::Close => self.close,
            PriceField::Volume => self.volume,
        }
    }
}

/// Raw columns of a bar that indicators and rules can read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PriceField {
    Open,
    High,
    Low,
    Close,
    Volume,
}

impl PriceField {
    pub const ALL: [PriceField; 5] = [
        PriceField::Open,
        PriceField::High,
        PriceField::Low,
        PriceField::Close,
        PriceField::Volume,
    ];

    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "open" => Some(PriceField::Open),
            "high" => Some(PriceField::High),
            "low" => Some(PriceField::Low),
            "close" | "price" => Some(PriceField::Close),
            "volume" => Some(PriceField::Volume),
            _ => None,
        }
    }

    /// Source-column lookup: anything unrecognized reads close.
    pub fn parse_or_close(name: Option<&str>) -> Self {
        name.and_then(Self::parse).unwrap_or(PriceField::Close)
    }

    pub fn column_name(self) -> &'static str {
        match self {
            PriceField::Open => "open",
            PriceField::High => "high",
            PriceField::Low => "low",
            PriceField::Close => "close",
            PriceField::Volume => "volume",
        }
    }
}

/// Bars in strictly increasing timestamp order. Read-only once built, so a
/// single series can be shared by every run in a batch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BarSeries {
    bars: Vec<OhlcvBar>,
}

impl BarSeries {
    pub fn new(bars: Vec<OhlcvBar>) -> Result<Self, StratbenchError> {
        if let Some(pos) = bars
            .windows(2)
            .position(|w| w[1].datetime <= w[0].datetime)
        {
            return Err(StratbenchError::InvalidBarSeries {
                reason: format!(
                    "timestamp {} at index {} does not follow {}",
                    bars[pos + 1].datetime,
                    pos + 1,
                    bars[pos].datetime
                ),
            });
        }
        Ok(Self { bars })
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn bars(&self) -> &[OhlcvBar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&OhlcvBar> {
        self.bars.get(index)
    }

    /// One raw column as a value-or-missing series.
    pub fn column(&self, field: PriceField) -> Vec<Option<f64>> {
        self.bars.iter().map(|b| b.field(field)).collect()
    }

    pub fn closes(&self) -> Vec<Option<f64>> {
        self.column(PriceField::Close)
    }

    pub fn typical_prices(&self) -> Vec<Option<f64>> {
        self.bars.iter().map(OhlcvBar::typical_price).collect()
    }

    /// Sub-series starting at the first bar at or after `start`.
    pub fn since(&self, start: NaiveDateTime) -> BarSeries {
        let from = self.bars.partition_point(|b| b.datetime < start);
        BarSeries {
            bars: self.bars[from..].to_vec(),
        }
    }
}
