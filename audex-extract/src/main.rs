//! audex - main entry point
//!
//! Extracts the audio stream of a media file to a raw interleaved PCM file.
//!
//! Exit codes: 0 on success, 1 on bad arguments, and a distinct non-zero code
//! per failure class otherwise (see `audex_extract::Error::exit_code`).

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use audex_common::Settings;
use audex_extract::error::USAGE_EXIT_CODE;
use audex_extract::{Error, ExtractConfig};
use clap::error::ErrorKind;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("GIT_HASH"),
    ", built ",
    env!("BUILD_TIMESTAMP"),
    ", ",
    env!("BUILD_PROFILE"),
    ")"
);

/// Command-line arguments for audex
#[derive(Parser, Debug)]
#[command(name = "audex")]
#[command(about = "Extract the audio stream of a media file as raw interleaved PCM")]
#[command(version, long_version = LONG_VERSION)]
struct Args {
    /// Input media file
    input: PathBuf,

    /// Output file for raw PCM samples
    output: PathBuf,
}

fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            let _ = e.print();
            return ExitCode::SUCCESS;
        }
        Err(e) => {
            eprintln!("Missing input media file or output file.");
            let _ = e.print();
            return ExitCode::from(USAGE_EXIT_CODE);
        }
    };

    let settings = match Settings::load() {
        Ok(settings) => settings,
        Err(e) => {
            let e = Error::from(e);
            eprintln!("audex: {}", e);
            return ExitCode::from(e.exit_code());
        }
    };

    if let Err(e) = init_logging(&settings.log_filter) {
        eprintln!("audex: {:#}", e);
        return ExitCode::from(Error::Config(audex_common::Error::Config(e.to_string())).exit_code());
    }

    let config = ExtractConfig::from_settings(args.input, args.output, &settings);
    match audex_extract::extract(&config) {
        Ok(report) => {
            info!("audio decode done");
            println!("{}", report);
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{}", e);
            ExitCode::from(e.exit_code())
        }
    }
}

/// Install the stderr log subscriber. `RUST_LOG` takes precedence over `default_filter`.
fn init_logging(default_filter: &str) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(default_filter)
            .with_context(|| format!("Invalid log filter '{}'", default_filter))?,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init()
        .context("Failed to install log subscriber")?;

    Ok(())
}
