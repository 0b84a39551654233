//! CSV file data adapter.
//!
//! One file per symbol and timeframe: `<dir>/<SYMBOL>_<timeframe>.csv` with
//! a header row naming `datetime` (or `date`), `open`, `high`, `low`,
//! `close` and `volume` in any order.

use crate::adapters::normalize::{into_series, parse_datetime, parse_number};
use crate::domain::error::StratbenchError;
use crate::domain::ohlcv::{BarSeries, OhlcvBar};
use crate::ports::data_port::DataPort;
use chrono::NaiveDateTime;
use std::fs;
use std::path::PathBuf;

pub struct CsvAdapter {
    base_path: PathBuf,
}

struct ColumnIndex {
    datetime: usize,
    open: Option<usize>,
    high: Option<usize>,
    low: Option<usize>,
    close: Option<usize>,
    volume: Option<usize>,
}

impl ColumnIndex {
    fn from_headers(headers: &csv::StringRecord) -> Result<Self, StratbenchError> {
        let find = |names: &[&str]| {
            headers
                .iter()
                .position(|h| names.contains(&h.trim().to_lowercase().as_str()))
        };
        let datetime = find(&["datetime", "date", "timestamp", "time"]).ok_or_else(|| {
            StratbenchError::Data {
                reason: "missing datetime column".into(),
            }
        })?;
        Ok(Self {
            datetime,
            open: find(&["open"]),
            high: find(&["high"]),
            low: find(&["low"]),
            close: find(&["close"]),
            volume: find(&["volume"]),
        })
    }

    fn value(record: &csv::StringRecord, index: Option<usize>) -> Option<f64> {
        index.and_then(|i| record.get(i)).and_then(parse_number)
    }
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, symbol: &str, timeframe: &str) -> PathBuf {
        self.base_path.join(format!("{}_{}.csv", symbol, timeframe))
    }
}

impl DataPort for CsvAdapter {
    fn fetch_bars(
        &self,
        symbol: &str,
        timeframe: &str,
        start: Option<NaiveDateTime>,
    ) -> Result<BarSeries, StratbenchError> {
        let path = self.csv_path(symbol, timeframe);
        if !path.is_file() {
            return Err(StratbenchError::NoData {
                symbol: symbol.to_string(),
                timeframe: timeframe.to_string(),
            });
        }

        let mut rdr = csv::ReaderBuilder::new()
            .flexible(true)
            .from_path(&path)
            .map_err(|e| StratbenchError::Data {
                reason: format!("failed to read {}: {}", path.display(), e),
            })?;
        let headers = rdr.headers().map_err(|e| StratbenchError::Data {
            reason: format!("CSV header error in {}: {}", path.display(), e),
        })?;
        let columns = ColumnIndex::from_headers(headers)?;

        let mut bars = Vec::new();
        for (row, result) in rdr.records().enumerate() {
            let record = result.map_err(|e| StratbenchError::Data {
                reason: format!("CSV parse error: {}", e),
            })?;
            let raw = record.get(columns.datetime).unwrap_or_default();
            let datetime = parse_datetime(raw).map_err(|e| StratbenchError::Data {
                reason: format!("{} row {}: {}", path.display(), row + 1, e),
            })?;

            bars.push(OhlcvBar {
                datetime,
                open: ColumnIndex::value(&record, columns.open),
                high: ColumnIndex::value(&record, columns.high),
                low: ColumnIndex::value(&record, columns.low),
                close: ColumnIndex::value(&record, columns.close),
                volume: ColumnIndex::value(&record, columns.volume),
            });
        }

        into_series(bars, start)
    }

    fn list_symbols(&self, timeframe: &str) -> Result<Vec<String>, StratbenchError> {
        list_with_suffix(&self.base_path, &format!("_{}.csv", timeframe))
    }
}

/// Symbols of files in `dir` named `<SYMBOL><suffix>`, sorted.
pub(crate) fn list_with_suffix(
    dir: &std::path::Path,
    suffix: &str,
) -> Result<Vec<String>, StratbenchError> {
    let entries = fs::read_dir(dir).map_err(|e| StratbenchError::Data {
        reason: format!("failed to read directory {}: {}", dir.display(), e),
    })?;

    let mut symbols = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| StratbenchError::Data {
            reason: format!("directory entry error: {}", e),
        })?;
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if let Some(symbol) = name.strip_suffix(suffix) {
            if !symbol.is_empty() {
                symbols.push(symbol.to_string());
            }
        }
    }

    symbols.sort();
    Ok(symbols)
}
