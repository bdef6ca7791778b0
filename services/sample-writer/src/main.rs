//! Sample file writer.
//!
//! Builds each requested run (built-in presets or a YAML runs file) and
//! writes it as netCDF-4 into the output directory:
//! - `daily-mean`: grouped daily means, `TSTdm20200101000000120IMPGS01GL.nc`
//! - `instantaneous`: grouped hourly snapshots, `TSTin20200101000000120IMPGS01GL.nc`
//! - `cdop3`: flat legacy CDOP-3 layout, `test.nc`

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, ValueEnum};
use netcdf_io::{silence_hdf5_errors, write_tree};
use sample_data::{builtin_runs, RunConfig, RunsFile};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "sample-writer")]
#[command(about = "Write synthetic CF/GERDA netCDF sample files")]
struct Args {
    /// Directory the sample files are written to
    #[arg(long, env = "SAMPLE_OUTPUT_DIR", default_value = ".")]
    output_dir: PathBuf,

    /// Run to generate; repeat for several (default: daily-mean and instantaneous)
    #[arg(short, long = "run")]
    runs: Vec<String>,

    /// YAML file with run presets, used instead of the built-in runs
    #[arg(long, env = "SAMPLE_CONFIG")]
    config: Option<PathBuf>,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Log output format
    #[arg(long, value_enum, default_value = "text")]
    log_format: LogFormat,

    /// Print the resolved runs as JSON and exit
    #[arg(long)]
    print_config: bool,
}

fn init_tracing(log_level: &str, format: LogFormat) -> Result<()> {
    let level = match log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true);
    match format {
        LogFormat::Json => tracing::subscriber::set_global_default(builder.json().finish())?,
        LogFormat::Text => tracing::subscriber::set_global_default(builder.finish())?,
    }
    Ok(())
}

fn resolve_runs(config: Option<&Path>, names: &[String]) -> Result<Vec<RunConfig>> {
    match config {
        Some(path) => {
            let file = RunsFile::load(path)
                .with_context(|| format!("Failed to load runs from {}", path.display()))?;
            Ok(file.select(names)?)
        }
        None => Ok(builtin_runs(names)?),
    }
}

fn write_run(run: &RunConfig, output_dir: &Path, created: DateTime<Utc>) -> Result<PathBuf> {
    let sample = run
        .build(created)
        .with_context(|| format!("Failed to build run '{}'", run.name))?;
    let path = output_dir.join(&sample.file_name);
    write_tree(&sample.tree, &sample.encoding, &path)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}

fn main() -> Result<()> {
    // Load environment from .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();
    init_tracing(&args.log_level, args.log_format)?;

    let runs = resolve_runs(args.config.as_deref(), &args.runs)?;
    if args.print_config {
        println!("{}", serde_json::to_string_pretty(&runs)?);
        return Ok(());
    }

    silence_hdf5_errors();
    std::fs::create_dir_all(&args.output_dir)
        .with_context(|| format!("Failed to create {}", args.output_dir.display()))?;

    let created = Utc::now();
    info!(runs = runs.len(), output_dir = %args.output_dir.display(), "Writing samples");
    for run in &runs {
        let path = write_run(run, &args.output_dir, created)?;
        info!(run = %run.name, path = %path.display(), "Wrote sample");
    }
    Ok(())
}
