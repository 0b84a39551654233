//! Data access port trait.

use crate::domain::error::StratbenchError;
use crate::domain::ohlcv::BarSeries;
use chrono::NaiveDateTime;

/// Source of historical bars. Shared read-only across batch workers.
pub trait DataPort: Send + Sync {
    /// Bars for `symbol` at `timeframe`, ascending, starting at the first
    /// bar at or after `start` (full history when `None`).
    fn fetch_bars(
        &self,
        symbol: &str,
        timeframe: &str,
        start: Option<NaiveDateTime>,
    ) -> Result<BarSeries, StratbenchError>;

    fn list_symbols(&self, timeframe: &str) -> Result<Vec<String>, StratbenchError>;
}
