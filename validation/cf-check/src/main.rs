//! Verification CLI for generated sample files.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use netcdf_io::{
    check_file, compare_files, default_flat_path, flatten_file, silence_hdf5_errors,
    DEFAULT_CHECKER,
};
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Parser)]
#[command(name = "cf-check")]
#[command(about = "Flatten, CF-check and compare netCDF sample files", long_about = None)]
struct Cli {
    /// Log level
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Log output format
    #[arg(long, global = true, value_enum, default_value = "text")]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Flatten the groups of a file into one namespace
    Flatten {
        /// Grouped input file
        input: PathBuf,
        /// Flat output file
        output: PathBuf,
    },

    /// Flatten a file and run the CF checker on the flat copy
    Check {
        /// Generated file
        input: PathBuf,

        /// Where to write the flat copy (default: <stem>.flat.nc next to the input)
        #[arg(long)]
        flat: Option<PathBuf>,

        /// Checker executable
        #[arg(long, env = "CFCHECKS_BIN", default_value = DEFAULT_CHECKER)]
        checker: String,
    },

    /// Compare a generated file with a stored reference
    Compare {
        /// Freshly generated file
        test: PathBuf,
        /// Reference file
        reference: PathBuf,
    },
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
        .with_target(true)
        .with_writer(std::io::stderr);
    match format {
        LogFormat::Json => tracing::subscriber::set_global_default(builder.json().finish())?,
        LogFormat::Text => tracing::subscriber::set_global_default(builder.finish())?,
    }
    Ok(())
}

fn main() -> Result<()> {
    // Load environment from .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(&cli.log_level, cli.log_format)?;
    silence_hdf5_errors();

    match cli.command {
        Commands::Flatten { input, output } => {
            flatten_file(&input, &output)
                .with_context(|| format!("Failed to flatten {}", input.display()))?;
        }
        Commands::Check {
            input,
            flat,
            checker,
        } => {
            let flat = flat.unwrap_or_else(|| default_flat_path(&input));
            let outcome = check_file(&input, &flat, &checker)
                .with_context(|| format!("Failed to check {}", input.display()))?;
            print!("{}", outcome.stdout);
            eprint!("{}", outcome.stderr);
            if !outcome.success() {
                error!(code = outcome.code, file = %flat.display(), "CF check failed");
                std::process::exit(outcome.code);
            }
            info!(file = %flat.display(), "CF check passed");
        }
        Commands::Compare { test, reference } => {
            compare_files(&test, &reference).with_context(|| {
                format!(
                    "{} does not match reference {}",
                    test.display(),
                    reference.display()
                )
            })?;
            info!(test = %test.display(), reference = %reference.display(), "Files match");
        }
    }
    Ok(())
}
