//! # invisio Binary Entry Point
//!
//! Thin command-line front end over the vault's hide and extract tasks.
//!
//! ## Usage
//!
//! ```bash
//! invisio hide --image cat.png --password hunter2 notes.txt keys.pem
//! invisio extract --image cat_hidden.png --output-dir ./recovered --password hunter2
//! invisio capacity cat.png
//! ```
//!
//! Defaults for output naming and log level come from an optional TOML file
//! passed with `--config`.

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use env_logger::Builder;
use log::{debug, info, LevelFilter};
use std::io::Write;
use std::path::PathBuf;

use invisio_vault::common::config::VaultConfig;
use invisio_vault::processing::{steganography, CarrierImage};
use invisio_vault::{spawn_extract, spawn_hide, ExtractRequest, HideRequest, TaskEvent, TaskHandle, TaskOutcome};

/// Command-line arguments for the invisio binary
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to a configuration file (TOML format)
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Log debug output, including progress
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Hide one or more files inside a carrier image
    Hide {
        /// Carrier image (PNG, BMP, JPEG, ...)
        #[arg(short, long)]
        image: PathBuf,

        /// Output image; defaults to `<stem>_hidden.<ext>` next to the carrier
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Encrypt the hidden data with this password
        #[arg(short, long)]
        password: Option<String>,

        /// Files to hide
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Recover hidden files from an image
    Extract {
        /// Image containing hidden data
        #[arg(short, long)]
        image: PathBuf,

        /// Directory to write recovered files into
        #[arg(short = 'd', long, default_value = ".")]
        output_dir: PathBuf,

        /// Password, if the data was hidden with one
        #[arg(short, long)]
        password: Option<String>,
    },

    /// Show how many bytes an image can hide
    Capacity {
        image: PathBuf,
    },
}

/// Initialize the logging system with timestamp, level, and message formatting.
///
/// Format: `[HH:MM:SS] [LEVEL] message`
fn init_logger(level: LevelFilter) {
    Builder::new()
        .format(|buf, record| {
            writeln!(
                buf,
                "[{}] [{}] {}",
                chrono::Local::now().format("%H:%M:%S"),
                record.level(),
                record.args()
            )
        })
        .filter_level(level)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => VaultConfig::from_file(path)?,
        None => VaultConfig::default(),
    };

    let level = if args.verbose {
        LevelFilter::Debug
    } else {
        config.logging.level.parse().unwrap_or(LevelFilter::Info)
    };
    init_logger(level);

    match args.command {
        Command::Hide {
            image,
            output,
            password,
            files,
        } => {
            let output = output.unwrap_or_else(|| config.default_output_path(&image));
            let request = HideRequest::new(image, output, files).with_password(password);
            match drive(spawn_hide(request)).await? {
                TaskOutcome::Hidden { output_path } => {
                    println!("Files successfully hidden in image: {}", output_path.display());
                }
                other => report_failure(other)?,
            }
        }
        Command::Extract {
            image,
            output_dir,
            password,
        } => {
            let request = ExtractRequest::new(image, output_dir).with_password(password);
            match drive(spawn_extract(request)).await? {
                TaskOutcome::Extracted { files } => {
                    println!("Files successfully extracted:");
                    for file in files {
                        println!("  {}", file.display());
                    }
                }
                other => report_failure(other)?,
            }
        }
        Command::Capacity { image } => {
            let carrier = CarrierImage::open(&image)?;
            println!(
                "{}x{} image can hide {} bytes",
                carrier.width(),
                carrier.height(),
                steganography::payload_capacity(&carrier)
            );
        }
    }

    Ok(())
}

/// Log events as they arrive, then return the task's outcome.
async fn drive(mut task: TaskHandle) -> Result<TaskOutcome> {
    while let Some(event) = task.next_event().await {
        match event {
            TaskEvent::Phase(phase) if phase.is_terminal() => info!("Task {}", phase),
            TaskEvent::Phase(phase) => debug!("Phase: {}", phase),
            TaskEvent::Progress(percent) => debug!("Progress: {}%", percent),
            // Status lines are already logged by the task itself
            TaskEvent::Status(_) => {}
            TaskEvent::Finished(outcome) => debug!("Finished (success: {})", outcome.is_success()),
        }
    }
    Ok(task.wait().await?)
}

fn report_failure(outcome: TaskOutcome) -> Result<()> {
    match outcome {
        TaskOutcome::Failed { message } => bail!("Operation failed: {}", message),
        other => bail!("Unexpected outcome: {:?}", other),
    }
}
