//! JSON batch report: `{"results": [...]}` in request order.

use crate::domain::backtest::{OutcomeReport, StrategyOutcome};
use crate::domain::error::StratbenchError;
use crate::ports::report_port::ReportPort;
use serde::Serialize;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

#[derive(Serialize)]
struct BatchReport<'a> {
    results: Vec<OutcomeReport<'a>>,
}

/// Writes to `output` when set, stdout otherwise.
pub struct JsonReportAdapter {
    output: Option<PathBuf>,
}

impl JsonReportAdapter {
    pub fn new(output: Option<PathBuf>) -> Self {
        Self { output }
    }

    pub fn render(outcomes: &[StrategyOutcome]) -> Result<String, StratbenchError> {
        let report = BatchReport {
            results: outcomes.iter().map(StrategyOutcome::report).collect(),
        };
        Ok(serde_json::to_string_pretty(&report)?)
    }
}

impl ReportPort for JsonReportAdapter {
    fn write(&self, outcomes: &[StrategyOutcome]) -> Result<(), StratbenchError> {
        let text = Self::render(outcomes)?;
        match &self.output {
            Some(path) => {
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    std::fs::create_dir_all(parent)?;
                }
                let mut writer = BufWriter::new(File::create(path)?);
                writeln!(writer, "{}", text)?;
                writer.flush()?;
            }
            None => {
                let mut stdout = io::stdout().lock();
                writeln!(stdout, "{}", text)?;
            }
        }
        Ok(())
    }
}
