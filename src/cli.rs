//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::csv_series_adapter::CsvSeriesAdapter;
use crate::adapters::data_port_from_config;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::json_report_adapter::JsonReportAdapter;
use crate::domain::backtest::{run_batch, BacktestRequest, BatchOptions, StrategyOutcome};
use crate::domain::config_validation::{validate_run_config, validate_strategy};
use crate::domain::error::StratbenchError;
use crate::domain::strategy::StrategySpec;
use crate::logging::{self, LogSettings};
use crate::ports::config_port::ConfigPort;
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(name = "stratbench", about = "Rule-driven strategy backtester")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run every strategy in a batch request
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        request: PathBuf,
        /// Write the JSON report here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Also write the annotated bar series of each run as CSV
        #[arg(long)]
        series_dir: Option<PathBuf>,
    },
    /// Check a batch request without fetching data
    Validate {
        #[arg(short, long)]
        request: PathBuf,
    },
    /// List symbols with data for a timeframe
    ListSymbols {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long, default_value = "1d")]
        timeframe: String,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Backtest {
            config,
            request,
            output,
            series_dir,
        } => run_backtest(&config, &request, output, series_dir),
        Command::Validate { request } => run_validate(&request),
        Command::ListSymbols { config, timeframe } => run_list_symbols(&config, &timeframe),
    }
}

fn fail(err: &StratbenchError) -> ExitCode {
    eprintln!("error: {err}");
    err.into()
}

/// Load and validate the INI config, then install logging from it.
pub fn load_config(path: &Path) -> Result<FileConfigAdapter, ExitCode> {
    let config = FileConfigAdapter::from_file(path).map_err(|e| fail(&e))?;
    validate_run_config(&config).map_err(|e| fail(&e))?;
    logging::init(&LogSettings::from_config(&config));
    Ok(config)
}

/// Runs a request against the data source named in `config`.
pub fn execute_backtest(
    config: &dyn ConfigPort,
    request: &BacktestRequest,
) -> Result<Vec<StrategyOutcome>, StratbenchError> {
    let data = data_port_from_config(config)?;
    let options = BatchOptions::from_config(config);
    Ok(run_batch(data.as_ref(), request, &options))
}

fn run_backtest(
    config_path: &Path,
    request_path: &Path,
    output: Option<PathBuf>,
    series_dir: Option<PathBuf>,
) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let request = match BacktestRequest::from_file(request_path) {
        Ok(r) => r,
        Err(e) => return fail(&e),
    };

    let outcomes = match execute_backtest(&config, &request) {
        Ok(o) => o,
        Err(e) => return fail(&e),
    };

    if let Err(e) = JsonReportAdapter::new(output).write(&outcomes) {
        return fail(&e);
    }
    if let Some(dir) = series_dir {
        if let Err(e) = CsvSeriesAdapter::new(dir).write(&outcomes) {
            return fail(&e);
        }
    }

    let failed = outcomes.iter().filter(|o| !o.is_ok()).count();
    eprintln!(
        "{} strategies run, {} failed",
        outcomes.len(),
        failed
    );
    ExitCode::SUCCESS
}

fn run_validate(request_path: &Path) -> ExitCode {
    eprintln!("Validating request: {}", request_path.display());
    let request = match BacktestRequest::from_file(request_path) {
        Ok(r) => r,
        Err(e) => return fail(&e),
    };

    let mut first_error: Option<StratbenchError> = None;
    for (i, item) in request.stocks.iter().enumerate() {
        let checked = StrategySpec::from_value(item).and_then(|spec| {
            validate_strategy(&spec)?;
            Ok(spec)
        });
        match checked {
            Ok(spec) => {
                eprintln!("  [{i}] {}: ok", spec.symbol);
                for rule in &spec.entry_rules {
                    eprintln!("      entry: {rule}");
                }
                for rule in spec.exit_rules() {
                    eprintln!("      exit:  {rule}");
                }
            }
            Err(e) => {
                eprintln!("  [{i}] error: {e}");
                first_error.get_or_insert(e);
            }
        }
    }

    match first_error {
        Some(e) => (&e).into(),
        None => {
            eprintln!("\nRequest is valid ({} strategies).", request.stocks.len());
            ExitCode::SUCCESS
        }
    }
}

fn run_list_symbols(config_path: &Path, timeframe: &str) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    let data = match data_port_from_config(&config) {
        Ok(d) => d,
        Err(e) => return fail(&e),
    };

    match data.list_symbols(timeframe) {
        Ok(symbols) if symbols.is_empty() => {
            eprintln!("No symbols found for timeframe {}", timeframe);
            ExitCode::SUCCESS
        }
        Ok(symbols) => {
            for symbol in &symbols {
                println!("{}", symbol);
            }
            eprintln!("{} symbols found", symbols.len());
            ExitCode::SUCCESS
        }
        Err(e) => fail(&e),
    }
}
