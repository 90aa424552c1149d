use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use bionic_scan::{BionicHandDetector, DetectorConfig, ImageInput};

#[derive(Parser)]
#[command(name = "bionic-scan")]
#[command(about = "Detect bionic and prosthetic hands in images")]
struct Cli {
    /// Path to input image file, or `-` to read base64 / a data URL from stdin
    #[arg(value_name = "IMAGE")]
    image_path: PathBuf,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Save debug outputs to directory (must be empty)
    #[arg(long, value_name = "DIR")]
    debug_out: Option<PathBuf>,

    /// Print the result on a single line
    #[arg(long)]
    compact: bool,

    /// Reject images that contain more than one hand
    #[arg(long)]
    reject_multiple_hands: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Cli::parse();

    let default_level = if args.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    let (input, filename) = read_input(&args.image_path)?;

    let config = DetectorConfig::new().with_reject_multiple_hands(args.reject_multiple_hands);
    let mut detector = BionicHandDetector::new().with_config(config);
    if let Some(debug_dir) = args.debug_out {
        detector = detector.with_debug(debug_dir)?;
    }

    let result = detector.analyze(input, filename.as_deref());

    let json = if args.compact {
        serde_json::to_string(&result)?
    } else {
        serde_json::to_string_pretty(&result)?
    };
    println!("{}", json);

    Ok(())
}

fn read_input(path: &Path) -> anyhow::Result<(ImageInput, Option<String>)> {
    if path.as_os_str() == "-" {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("Failed to read image data from stdin")?;
        return Ok((ImageInput::Encoded(text), None));
    }

    let bytes = std::fs::read(path)
        .with_context(|| format!("Failed to read image file {}", path.display()))?;
    let filename = path.file_name().map(|n| n.to_string_lossy().into_owned());
    Ok((ImageInput::Bytes(bytes), filename))
}
