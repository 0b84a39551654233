//! Report output port trait.

use crate::domain::backtest::StrategyOutcome;
use crate::domain::error::StratbenchError;

/// Port for writing batch results.
pub trait ReportPort {
    fn write(&self, outcomes: &[StrategyOutcome]) -> Result<(), StratbenchError>;
}
