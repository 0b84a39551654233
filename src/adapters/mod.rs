//! File-backed implementations of the ports.

pub mod csv_adapter;
pub mod csv_series_adapter;
pub mod file_config_adapter;
pub mod json_bars_adapter;
pub mod json_report_adapter;
pub mod normalize;

use crate::domain::error::StratbenchError;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use csv_adapter::CsvAdapter;
use json_bars_adapter::JsonBarsAdapter;
use std::path::PathBuf;

/// Data adapter selected by `[data] source` (csv by default) rooted at
/// `[data] dir`.
pub fn data_port_from_config(config: &dyn ConfigPort) -> Result<Box<dyn DataPort>, StratbenchError> {
    let dir = config
        .get_string("data", "dir")
        .map(PathBuf::from)
        .ok_or_else(|| StratbenchError::ConfigMissing {
            section: "data".to_string(),
            key: "dir".to_string(),
        })?;
    let source = config
        .get_string("data", "source")
        .unwrap_or_else(|| "csv".to_string())
        .to_lowercase();

    match source.as_str() {
        "csv" => Ok(Box::new(CsvAdapter::new(dir))),
        "json" => Ok(Box::new(JsonBarsAdapter::new(dir))),
        other => Err(StratbenchError::ConfigInvalid {
            section: "data".to_string(),
            key: "source".to_string(),
            reason: format!("unknown data source {other:?}"),
        }),
    }
}
