//! Command-line front end: compute Cox gradients or survival metrics for
//! scores and sign-encoded labels stored in CSV files.

use std::fs::File;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand, ValueEnum};
use ndarray::Array1;
use serde::Serialize;

use coxboost::{
    ConcordanceIndex, CoxLoss, GradientStrategy, MetricFn, MetricValue, ObjectiveFn, Parallelism,
    PartialLikelihood, SurvivalError, run_with_threads,
};

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print per-sample gradient and hessian of the Cox loss
    Grad {
        #[command(flatten)]
        input: InputArgs,

        #[arg(long, value_enum, default_value_t = StrategyArg::Linear)]
        strategy: StrategyArg,
    },
    /// Print survival metrics for the scores
    Eval {
        #[command(flatten)]
        input: InputArgs,

        #[arg(long, value_enum, default_value_t = MetricArg::All)]
        metric: MetricArg,

        /// Risk differences at or below this are treated as ties
        #[arg(long, default_value_t = coxboost::training::DEFAULT_TIED_TOL)]
        tied_tol: f64,
    },
}

#[derive(Debug, Args)]
struct InputArgs {
    /// CSV file with one risk score per row (first column)
    #[arg(long)]
    scores: PathBuf,

    /// CSV file with one sign-encoded label per row (first column)
    #[arg(long)]
    labels: PathBuf,

    /// Treat the first row of each file as data instead of a header
    #[arg(long)]
    no_header: bool,

    /// Worker threads; 0 uses all cores, 1 runs sequentially
    #[arg(long, default_value_t = 1)]
    threads: usize,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum StrategyArg {
    Linear,
    Dense,
}

impl From<StrategyArg> for GradientStrategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::Linear => GradientStrategy::Linear,
            StrategyArg::Dense => GradientStrategy::Dense,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum MetricArg {
    All,
    PartialLikelihood,
    Concordance,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Survival(#[from] SurvivalError),

    #[error(transparent)]
    Config(#[from] coxboost::ConfigError),

    #[error("{}: {source}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{}, row {row}: cannot parse {value:?} as a number", path.display())]
    Parse { path: PathBuf, row: usize, value: String },

    #[error("{}, row {row}: missing value", path.display())]
    MissingValue { path: PathBuf, row: usize },

    #[error("failed to build thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("failed to write output: {0}")]
    Output(#[from] io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Serialize)]
struct GradientRow {
    grad: f64,
    hess: f64,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report_error(&err, &mut io::stderr().lock());
            ExitCode::FAILURE
        }
    }
}

/// One line per failure on stderr; nothing goes through the logger.
fn report_error(err: &CliError, out: &mut impl Write) {
    let _ = writeln!(out, "error: {err}");
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Command::Grad { input, strategy } => {
            run_with_threads(input.threads, |par| run_grad(&input, strategy, par))?
        }
        Command::Eval {
            input,
            metric,
            tied_tol,
        } => run_with_threads(input.threads, |par| run_eval(&input, metric, tied_tol, par))?,
    }
}

fn run_grad(input: &InputArgs, strategy: StrategyArg, parallelism: Parallelism) -> Result<(), CliError> {
    let (scores, labels) = read_inputs(input)?;
    let loss = CoxLoss::builder()
        .strategy(strategy.into())
        .parallelism(parallelism)
        .build();

    let (grad, hess) = loss.compute_gradients(scores.view(), &labels)?;
    log::info!("computed {} gradients with {:?}", grad.len(), loss.strategy);

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match input.format {
        OutputFormat::Text => {
            writeln!(out, "grad,hess")?;
            for (g, h) in grad.iter().zip(&hess) {
                writeln!(out, "{g},{h}")?;
            }
        }
        OutputFormat::Json => {
            let rows: Vec<GradientRow> = grad
                .iter()
                .zip(&hess)
                .map(|(&grad, &hess)| GradientRow { grad, hess })
                .collect();
            serde_json::to_writer_pretty(&mut out, &rows)?;
            writeln!(out)?;
        }
    }
    Ok(())
}

fn run_eval(
    input: &InputArgs,
    metric: MetricArg,
    tied_tol: f64,
    parallelism: Parallelism,
) -> Result<(), CliError> {
    let (scores, labels) = read_inputs(input)?;
    let concordance = ConcordanceIndex::builder()
        .tied_tol(tied_tol)
        .parallelism(parallelism)
        .build()?;

    let mut values: Vec<MetricValue> = Vec::new();
    if matches!(metric, MetricArg::All | MetricArg::PartialLikelihood) {
        values.push(PartialLikelihood.evaluate(scores.view(), &labels)?);
    }
    if matches!(metric, MetricArg::All | MetricArg::Concordance) {
        values.push(concordance.evaluate(scores.view(), &labels)?);
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match input.format {
        OutputFormat::Text => {
            for value in &values {
                writeln!(out, "{value}")?;
            }
        }
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut out, &values)?;
            writeln!(out)?;
        }
    }
    Ok(())
}

fn read_inputs(input: &InputArgs) -> Result<(Array1<f64>, Array1<f64>), CliError> {
    let scores = read_column(&input.scores, !input.no_header)?;
    let labels = read_column(&input.labels, !input.no_header)?;
    log::debug!(
        "read {} scores from {} and {} labels from {}",
        scores.len(),
        input.scores.display(),
        labels.len(),
        input.labels.display()
    );
    Ok((Array1::from(scores), Array1::from(labels)))
}

fn read_column(path: &Path, has_headers: bool) -> Result<Vec<f64>, CliError> {
    let file = File::open(path).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_column(file, path, has_headers)
}

/// Parse the first column of a CSV stream as `f64`.
fn parse_column<R: Read>(reader: R, path: &Path, has_headers: bool) -> Result<Vec<f64>, CliError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(has_headers)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut values = Vec::new();
    for (row, record) in reader.records().enumerate() {
        let record = record.map_err(|source| CliError::Csv {
            path: path.to_path_buf(),
            source,
        })?;
        let field = record.get(0).ok_or_else(|| CliError::MissingValue {
            path: path.to_path_buf(),
            row,
        })?;
        let value = field.parse::<f64>().map_err(|_| CliError::Parse {
            path: path.to_path_buf(),
            row,
            value: field.to_string(),
        })?;
        values.push(value);
    }
    Ok(values)
}
