//! mnx-converter command line
//!
//! **Usage:**
//! ```bash
//! mnx-converter score.musicxml > score.json
//! mnx-converter --format xml score.mxl > score.mnx
//! ```
//!
//! Diagnostics go to stderr, filtered by `RUST_LOG` (default `warn`).

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use mnx_converter::{convert, ConversionSettings, OutputFormat};
use tracing_subscriber::EnvFilter;

/// Convert MusicXML to MNX
#[derive(Parser, Debug)]
#[command(name = "mnx-converter", version)]
#[command(about = "Convert a MusicXML (.musicxml/.xml/.mxl) file to MNX")]
struct Args {
    /// Input MusicXML file, compressed or uncompressed
    input: PathBuf,

    /// Output format: json (MNX) or xml (MNX-Common)
    #[arg(long, short, default_value = "json", env = "MNX_FORMAT")]
    format: OutputFormat,
}

fn main() -> ExitCode {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    match run(&args) {
        Ok(output) => {
            println!("{}", output);
            ExitCode::SUCCESS
        }
        Err(message) => {
            println!("Error: {}", message);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<String, String> {
    let filedata = std::fs::read(&args.input)
        .map_err(|e| format!("Could not read {}: {}", args.input.display(), e))?;
    log::debug!("Read {} bytes from {}", filedata.len(), args.input.display());

    let settings = ConversionSettings { format: args.format };
    convert(&filedata, Some(settings)).map_err(|e| e.to_string())
}
