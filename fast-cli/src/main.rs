//! # fast - Fourier Amplitude Sensitivity Testing from the command line
//!
//! Drives `fast-core` for tooling that evaluates models outside this process.
//!
//! ## Workflow
//! 1. `fast sample` writes the search-curve points for the model to evaluate
//! 2. the model is run on every point, outputs are collected into a run file
//! 3. `fast analyze` turns the run file into a sensitivity report
//!
//! `fast frequencies` prints the frequency assignment on its own.

mod run_file;
mod workers;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use fast_core::{
    CurveSpan, Method, SampleGenerator, SearchCurve, SensitivityEngine, SensitivityReport,
    DEFAULT_HARMONIC_ORDER,
};
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use run_file::{Outputs, SampleFile};

#[derive(Parser)]
#[command(name = "fast", version, about = "Fourier Amplitude Sensitivity Testing")]
struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, ValueEnum)]
enum MethodArg {
    Classic,
    Efast,
}

impl From<MethodArg> for Method {
    fn from(arg: MethodArg) -> Self {
        match arg {
            MethodArg::Classic => Method::Classic,
            MethodArg::Efast => Method::Efast,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Print the frequency assignment for a number of factors
    Frequencies {
        #[arg(short, long)]
        params: usize,
        #[arg(short = 'm', long, default_value_t = DEFAULT_HARMONIC_ORDER)]
        order: usize,
        #[arg(long, value_enum, default_value = "efast")]
        method: MethodArg,
    },
    /// Write search-curve samples for the model to evaluate
    Sample {
        /// JSON array of factor bounds: [{"min": 0.0, "max": 1.0}, ...]
        #[arg(short, long)]
        bounds: PathBuf,
        #[arg(short = 'm', long, default_value_t = DEFAULT_HARMONIC_ORDER)]
        order: usize,
        #[arg(long, value_enum, default_value = "efast")]
        method: MethodArg,
        /// Samples per curve (defaults to the minimum for the factor count)
        #[arg(short = 'n', long)]
        samples: Option<usize>,
        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Compute sensitivity indices from a run file
    Analyze {
        run: PathBuf,
        /// Write the report to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Worker threads for eFAST (defaults to available parallelism)
        #[arg(short, long)]
        workers: Option<usize>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Frequencies { params, order, method } => frequencies(params, order, method.into()),
        Command::Sample { bounds, order, method, samples, output } => {
            sample(bounds, order, method.into(), samples, output)
        }
        Command::Analyze { run, output, workers } => analyze(run, output, workers),
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn build_engine(order: usize) -> Result<SensitivityEngine> {
    Ok(SensitivityEngine::new().with_harmonic_order(order)?)
}

fn frequency_sets(engine: &SensitivityEngine, params: usize, method: Method) -> Result<Vec<Vec<usize>>> {
    let sets = match method {
        Method::Classic => vec![engine.classic_frequencies(params)?],
        Method::Efast => engine.efast_frequencies(params)?,
    };
    Ok(sets)
}

fn frequencies(params: usize, order: usize, method: Method) -> Result<()> {
    let engine = build_engine(order)?;
    let sets = frequency_sets(&engine, params, method)?;
    info!(params, order, ?method, curves = sets.len(), "[FREQ] Frequency assignment ready");
    println!("{}", serde_json::to_string_pretty(&sets)?);
    Ok(())
}

fn sample(
    bounds: PathBuf,
    order: usize,
    method: Method,
    samples: Option<usize>,
    output: Option<PathBuf>,
) -> Result<()> {
    let bounds = run_file::load_bounds(&bounds)?;
    let params = bounds.len();
    let engine = build_engine(order)?;
    let minimum = engine.minimum_runs(params)?;
    let num_samples = samples.unwrap_or(minimum);
    if num_samples < minimum {
        warn!(num_samples, minimum, "[SAMPLE] Fewer samples than the analysis will accept");
    }

    let curve = SearchCurve::new(match method {
        Method::Classic => CurveSpan::Half,
        Method::Efast => CurveSpan::Full,
    });
    let frequencies = frequency_sets(&engine, params, method)?;
    let curves = frequencies
        .iter()
        .map(|set| curve.generate(&bounds, set, num_samples))
        .collect::<fast_core::Result<Vec<_>>>()?;
    info!(params, num_samples, curves = curves.len(), "[SAMPLE] Search curves generated");

    let file = SampleFile {
        method,
        num_params: params,
        harmonic_order: order,
        frequencies,
        curves,
    };
    match output {
        Some(path) => run_file::write_json(&file, &path)?,
        None => println!("{}", serde_json::to_string_pretty(&file)?),
    }
    Ok(())
}

fn analyze(run: PathBuf, output: Option<PathBuf>, workers: Option<usize>) -> Result<()> {
    let run = run_file::load_run(&run)?;
    let engine = build_engine(run.harmonic_order)?;
    info!(method = ?run.method, num_params = run.num_params, "[ANALYZE] Run file loaded");

    let report = match &run.outputs {
        Outputs::Single(outputs) => engine
            .classic_report(outputs, run.num_params)
            .context("classic analysis failed")?,
        Outputs::PerFactor(outputs) => {
            let workers = workers.unwrap_or_else(|| {
                std::thread::available_parallelism().map_or(1, |n| n.get())
            });
            let factors = workers::efast_parallel(&engine, outputs, run.num_params, workers)
                .context("eFAST analysis failed")?;
            SensitivityReport::from_efast(
                engine.harmonic_order(),
                outputs.first().map_or(0, Vec::len),
                factors,
            )
        }
    };

    for factor in report.ranked() {
        info!(
            factor = factor.factor,
            first_order = factor.first_order,
            total_order = ?factor.total_order,
            "[ANALYZE] Sensitivity"
        );
    }

    match output {
        Some(path) => {
            run_file::save_report(&report, &path)?;
            info!(path = %path.display(), "[ANALYZE] Report saved");
        }
        None => println!("{}", serde_json::to_string_pretty(&report)?),
    }
    Ok(())
}
