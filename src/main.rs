// SPDX-License-Identifier: GPL-3.0-only

use clap::{Parser, Subcommand, ValueEnum};
use snapcam::backends::camera::{CameraBackend, CameraBackendType, get_backend_for_type};
use snapcam::{CaptureScreen, Config};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::warn;

mod cli;

#[derive(Parser)]
#[command(name = "snapcam")]
#[command(about = "Single-screen camera capture with preview, zoom and front/back switching")]
#[command(version = env!("SNAPCAM_VERSION"))]
#[command(subcommand_required = false)]
struct Cli {
    /// Camera backend (overrides the config file)
    #[arg(long, global = true, value_enum)]
    backend: Option<BackendArg>,

    /// Configuration file (default: ~/.config/snapcam/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Write logs to this file
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Clone, Copy, ValueEnum)]
enum BackendArg {
    /// Video4Linux2 hardware cameras
    V4l2,
    /// Generated test-pattern front and back cameras
    Synthetic,
}

impl From<BackendArg> for CameraBackendType {
    fn from(arg: BackendArg) -> Self {
        match arg {
            BackendArg::V4l2 => CameraBackendType::V4l2,
            BackendArg::Synthetic => CameraBackendType::Synthetic,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Run the capture screen in the terminal (default)
    Terminal,

    /// List available cameras
    List,

    /// Take a photo
    Photo {
        /// Use the front camera instead of the back one
        #[arg(short, long)]
        front: bool,

        /// Output file path (default: ~/Pictures/snapcam/IMG_TIMESTAMP.jpg)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let tui = matches!(cli.command, None | Some(Commands::Terminal));
    init_logging(cli.log_file.as_deref(), tui)?;

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(backend) = cli.backend {
        config.backend = backend.into();
    }

    let backend = get_backend_for_type(config.backend, &config.camera_positions);
    if !backend.is_available() {
        warn!(backend = %config.backend, "Camera backend reports no devices");
    }

    match cli.command {
        Some(Commands::List) => cli::list_cameras(backend),
        Some(Commands::Photo { front, output }) => cli::take_photo(backend, config, front, output),
        Some(Commands::Terminal) | None => run_terminal(backend, config),
    }
}

fn run_terminal(
    backend: Arc<dyn CameraBackend>,
    config: Config,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut screen = CaptureScreen::new(backend, config);
    screen.load();
    snapcam::terminal::run(screen)
}

/// Initialize logging
///
/// Set RUST_LOG environment variable to control log level.
/// Examples: RUST_LOG=debug, RUST_LOG=snapcam=debug, RUST_LOG=info
///
/// The terminal UI owns the screen, so without a log file its logs are
/// discarded.
fn init_logging(log_file: Option<&Path>, tui: bool) -> Result<(), Box<dyn std::error::Error>> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true);

    match log_file {
        Some(path) => {
            let file = std::fs::File::create(path)?;
            builder.with_ansi(false).with_writer(Mutex::new(file)).init();
        }
        None if tui => builder.with_writer(std::io::sink).init(),
        None => builder.init(),
    }

    Ok(())
}
