//! # minte
//!
//! Command-line interface for the malaria intervention emulator.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use emulator_facade::{
    calculate_overall_dn0, Emulator, EmulatorConfig, EmulatorResults, ModelType, Predictor,
    RunOptions, ScenarioParameters, DEFAULT_TIME_STEPS,
};
use serde::Serialize;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "minte")]
#[command(about = "Malaria intervention emulator CLI", long_about = None)]
struct Cli {
    /// Directory holding the pretrained model artifacts
    #[arg(long, global = true)]
    models_dir: Option<PathBuf>,

    /// Emulator configuration file (JSON)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run scenarios through the emulator
    Run {
        /// Scenario parameters (JSON, `kind` = raw | aggregated)
        #[arg(short, long)]
        input: PathBuf,

        /// Outcome to predict (prevalence, cases); repeatable
        #[arg(short, long = "predictor", default_value = "prevalence")]
        predictors: Vec<Predictor>,

        /// Model architecture (LSTM, GRU); repeatable
        #[arg(short, long = "model-type", default_value = "LSTM")]
        model_types: Vec<ModelType>,

        /// Number of daily steps to predict
        #[arg(short, long, default_value_t = DEFAULT_TIME_STEPS)]
        time_steps: usize,

        /// Record per-stage timings
        #[arg(long)]
        benchmark: bool,

        /// Output file (.json or .csv); JSON to stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Load every model artifact up front and report what is missing
    Preload {
        /// Fail on the first missing artifact
        #[arg(long)]
        strict: bool,

        /// Log each model as it loads
        #[arg(short, long)]
        verbose: bool,
    },

    /// Aggregate net usage into dn0 and overall net use
    Dn0 {
        /// Pyrethroid resistance level in [0, 1]
        #[arg(short, long)]
        resistance: f64,

        /// Net usage as CODE=FRACTION (py_only, py_pbo, py_pyrrole, py_ppf); repeatable
        #[arg(short, long = "usage", value_parser = parse_usage)]
        usage: Vec<(String, f64)>,
    },
}

/// Parse `py_only=0.4` style usage arguments
fn parse_usage(arg: &str) -> std::result::Result<(String, f64), String> {
    let (code, fraction) = arg
        .split_once('=')
        .ok_or_else(|| format!("expected CODE=FRACTION, got '{arg}'"))?;
    let fraction = fraction
        .trim()
        .parse::<f64>()
        .map_err(|e| format!("invalid fraction in '{arg}': {e}"))?;
    Ok((code.trim().to_string(), fraction))
}

/// Configuration file, then `MINTER_MODELS_DIR`, then `--models-dir`
fn load_config(config: Option<&Path>, models_dir: Option<PathBuf>) -> Result<EmulatorConfig> {
    let base = match config {
        Some(path) => EmulatorConfig::from_file(path)
            .with_context(|| format!("Failed to load configuration {:?}", path))?,
        None => EmulatorConfig::default(),
    };
    let config = base.with_env_overrides();
    let config = match models_dir {
        Some(dir) => config.with_models_dir(dir),
        None => config,
    };
    tracing::debug!(models_dir = %config.models_dir.display(), "resolved configuration");
    Ok(config)
}

/// Load scenario parameters from a JSON file
fn load_parameters(path: &Path) -> Result<ScenarioParameters> {
    let file = File::open(path).with_context(|| format!("Failed to open {:?}", path))?;
    serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Failed to parse scenario parameters in {:?}", path))
}

/// One flat output row for CSV export
#[derive(Serialize)]
struct CsvRow<'a> {
    predictor: Predictor,
    scenario_tag: &'a str,
    model_type: ModelType,
    timestep: usize,
    value: f64,
    eir: f64,
    prevalence: Option<f64>,
    resistance: Option<f64>,
    dn0_use: f64,
    dn0_future: f64,
    itn_use: f64,
    itn_future: f64,
    #[serde(rename = "Q0")]
    q0: f64,
    phi_bednets: f64,
    seasonal: f64,
    routine: f64,
    irs_use: f64,
    irs_future: f64,
    lsm: f64,
}

fn write_csv<W: Write>(results: &EmulatorResults, writer: W) -> Result<()> {
    let mut writer = csv::Writer::from_writer(writer);
    for table in results.tables() {
        for row in table.rows() {
            writer.serialize(CsvRow {
                predictor: table.predictor,
                scenario_tag: &row.scenario_tag,
                model_type: row.model_type,
                timestep: row.timestep,
                value: row.value,
                eir: row.scenario.eir,
                prevalence: row.scenario.prevalence,
                resistance: row.scenario.resistance,
                dn0_use: row.scenario.dn0_use,
                dn0_future: row.scenario.dn0_future,
                itn_use: row.scenario.itn_use,
                itn_future: row.scenario.itn_future,
                q0: row.scenario.q0,
                phi_bednets: row.scenario.phi_bednets,
                seasonal: row.scenario.seasonal,
                routine: row.scenario.routine,
                irs_use: row.scenario.irs_use,
                irs_future: row.scenario.irs_future,
                lsm: row.scenario.lsm,
            })?;
        }
    }
    writer.flush()?;
    Ok(())
}

/// Write results to file (format by extension) or stdout as JSON
fn write_results(results: &EmulatorResults, output: Option<&Path>) -> Result<()> {
    let Some(path) = output else {
        let stdout = std::io::stdout();
        serde_json::to_writer_pretty(stdout.lock(), results)?;
        println!();
        return Ok(());
    };

    let file = File::create(path).with_context(|| format!("Failed to create output {:?}", path))?;
    let writer = BufWriter::new(file);
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();
    match ext.as_str() {
        "csv" => write_csv(results, writer)?,
        "json" | "" => serde_json::to_writer_pretty(writer, results)?,
        other => bail!("Unsupported output format '.{other}', expected .json or .csv"),
    }
    println!("Results written to {:?}", path);
    Ok(())
}

fn run_scenarios(
    config: EmulatorConfig,
    input: PathBuf,
    options: RunOptions,
    output: Option<PathBuf>,
) -> Result<()> {
    let parameters = load_parameters(&input)?;
    let emulator = Emulator::from_config(config)?;
    let results = emulator
        .run_scenarios(&parameters, &options)
        .context("Emulator run failed")?;

    for table in results.tables() {
        eprintln!("{}: {} rows", table.predictor, table.len());
        for summary in table.summary_by_scenario() {
            eprintln!(
                "  {:<20} {:<5} mean {:.4}  min {:.4}  max {:.4}",
                summary.scenario_tag,
                summary.model_type.as_str(),
                summary.mean,
                summary.min,
                summary.max
            );
        }
    }
    if let Some(benchmarks) = &results.benchmarks {
        eprintln!("\nTimings:");
        for line in benchmarks.as_rows() {
            eprintln!("  {line}");
        }
    }

    write_results(&results, output.as_deref())
}

fn run_preload(mut config: EmulatorConfig, strict: bool, verbose: bool) -> Result<()> {
    config.strict_warm_up |= strict;
    let emulator = Emulator::from_config(config)?;
    let report = emulator.preload(verbose).context("Model warm-up failed")?;

    println!("Models directory: {}", emulator.cache().location());
    for key in &report.loaded {
        println!("  loaded   {key}");
    }
    for key in &report.missing {
        println!("  missing  {key}");
    }
    if !report.is_complete() {
        bail!("{} model artifact(s) missing", report.missing.len());
    }
    Ok(())
}

fn run_dn0(resistance: f64, usage: Vec<(String, f64)>) -> Result<()> {
    let result = calculate_overall_dn0(
        resistance,
        usage.iter().map(|(code, fraction)| (code.as_str(), *fraction)),
    )?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "minte=info,emulator_core=info".into()),
        )
        .init();

    let result = load_config(cli.config.as_deref(), cli.models_dir).and_then(|config| {
        match cli.command {
            Commands::Run {
                input,
                predictors,
                model_types,
                time_steps,
                benchmark,
                output,
            } => {
                let options = RunOptions::new()
                    .predictors(predictors)
                    .model_types(model_types)
                    .time_steps(time_steps)
                    .benchmark(benchmark);
                run_scenarios(config, input, options, output)
            }

            Commands::Preload { strict, verbose } => run_preload(config, strict, verbose),

            Commands::Dn0 { resistance, usage } => run_dn0(resistance, usage),
        }
    });

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
