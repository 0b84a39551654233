//! Annotated per-bar series of each completed run, one CSV per symbol.
//!
//! Columns: datetime, OHLCV, every derived indicator column (sorted by
//! name), entry/exit signals, then the simulator annotation. Missing values
//! are written as empty fields.

use crate::domain::backtest::{BacktestRun, StrategyOutcome};
use crate::domain::error::StratbenchError;
use crate::domain::ohlcv::PriceField;
use crate::ports::report_port::ReportPort;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

pub struct CsvSeriesAdapter {
    dir: PathBuf,
}

fn csv_error(e: csv::Error) -> StratbenchError {
    StratbenchError::Data {
        reason: format!("CSV write error: {}", e),
    }
}

fn cell(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// File-name-safe symbol (`BRK/B` becomes `BRK_B`).
fn file_stem(symbol: &str) -> String {
    symbol
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

impl CsvSeriesAdapter {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn series_path(&self, symbol: &str) -> PathBuf {
        self.dir.join(format!("{}_series.csv", file_stem(symbol)))
    }

    fn write_run(path: &Path, run: &BacktestRun) -> Result<(), StratbenchError> {
        let mut wtr = csv::Writer::from_path(path).map_err(csv_error)?;
        let derived: Vec<&str> = run.frame.derived_names().collect();

        let mut header = vec!["datetime"];
        header.extend(PriceField::ALL.iter().map(|f| f.column_name()));
        header.extend(derived.iter().copied());
        header.extend(["entry_signal", "exit_signal", "in_position", "position", "pnl"]);
        wtr.write_record(&header).map_err(csv_error)?;

        let bars = run.frame.bars().bars();
        for (i, bar) in bars.iter().enumerate() {
            let mut row = vec![bar.datetime.format("%Y-%m-%d %H:%M:%S").to_string()];
            row.extend(PriceField::ALL.iter().map(|f| cell(bar.field(*f))));
            row.extend(
                derived
                    .iter()
                    .map(|name| cell(run.frame.derived(name).and_then(|c| c[i]))),
            );
            let annotation = run.simulation.annotations.get(i).cloned().unwrap_or_default();
            row.push(run.signals.entry_at(i).to_string());
            row.push(run.signals.exit_at(i).to_string());
            row.push(annotation.in_position.to_string());
            row.push(
                annotation
                    .position
                    .map(|p| p.as_str().to_string())
                    .unwrap_or_default(),
            );
            row.push(cell(annotation.pnl));
            wtr.write_record(&row).map_err(csv_error)?;
        }

        wtr.flush()?;
        Ok(())
    }
}

impl ReportPort for CsvSeriesAdapter {
    fn write(&self, outcomes: &[StrategyOutcome]) -> Result<(), StratbenchError> {
        fs::create_dir_all(&self.dir)?;
        for outcome in outcomes {
            let Ok(run) = &outcome.result else {
                continue;
            };
            let path = self.series_path(&outcome.symbol);
            Self::write_run(&path, run)?;
            debug!(symbol = %outcome.symbol, path = %path.display(), "series written");
        }
        Ok(())
    }
}
