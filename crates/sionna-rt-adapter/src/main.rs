//! sionna-rt-driver: CLI tool for turning an exported simulation into a
//! Sionna RT solver script

use anyhow::{Context, Result};
use clap::Parser;
use sionna_rt_adapter::driver::{self, DriverConfig};
use std::fs::{self, File};
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::EnvFilter;

/// Used when `RUST_LOG` is unset
const DEFAULT_LOG_FILTER: &str = "debug";

#[derive(Parser, Debug)]
#[command(name = "sionna-rt-driver")]
#[command(about = "Generate the Sionna RT solver script for an exported simulation")]
#[command(version)]
struct Args {
    /// Simulation input JSON file (input_files/input_file.json)
    #[arg(short, long)]
    inputfile: PathBuf,

    /// Output folder for the solver script, log and results
    #[arg(short, long)]
    outputfolder: PathBuf,
}

fn main() -> Result<()> {
    let args = Args::parse();

    fs::create_dir_all(&args.outputfolder)
        .with_context(|| format!("Failed to create output folder: {:?}", args.outputfolder))?;

    // Log to stdout and to the solver log in the output folder
    let log_path = args.outputfolder.join(DriverConfig::default().log_file);
    let log_file = File::create(&log_path)
        .with_context(|| format!("Failed to create log file: {:?}", log_path))?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .with_ansi(false)
        .with_writer(std::io::stdout.and(Mutex::new(log_file)))
        .init();

    let script = driver::prepare(&args.inputfile, &args.outputfolder)
        .with_context(|| format!("Failed to prepare solver run for {:?}", args.inputfile))?;

    tracing::info!("Generated solver script: {:?}", script);
    Ok(())
}
