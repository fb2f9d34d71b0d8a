//! CLI argument definitions for the framebot binary.
//!
//! Uses `clap` with derive macros. Priority resolution: CLI args > env vars
//! > config file > defaults.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Framebot - frame-by-frame input automation for desktop games.
#[derive(Parser, Debug)]
#[command(name = "framebot", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config", global = true)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level", global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Command {
    /// Capture the screen and run the configured rotation while toggled on.
    Run,

    /// Dry-run the rotation on a virtual clock and print what it would send.
    Simulate {
        /// Number of frames to simulate.
        #[arg(long, default_value_t = 600)]
        frames: u64,

        /// Virtual frame rate. Defaults to `capture.fps` from the config.
        #[arg(long)]
        fps: Option<f64>,

        /// Print the result as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Deduplicate a JSON list of detections and print the kept ones.
    Dedupe {
        /// File holding a JSON array of detections.
        file: PathBuf,

        /// Overlap threshold. Defaults to `detection.overlap_threshold`.
        #[arg(short = 't', long)]
        threshold: Option<f64>,
    },

    /// Inspect or edit the calibrated screen regions.
    Region {
        #[command(subcommand)]
        action: RegionAction,
    },
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum RegionAction {
    /// Print a stored region.
    Show { name: String },
    /// Store a region.
    Set {
        name: String,
        x: i32,
        y: i32,
        w: i32,
        h: i32,
    },
    /// Delete a stored region.
    Clear { name: String },
}

impl CliArgs {
    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > FRAMEBOT_CONFIG env var > platform default
    /// (~/.framebot/config.toml).
    pub fn resolve_config_path(&self) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Ok(p) = std::env::var("FRAMEBOT_CONFIG") {
            return PathBuf::from(p);
        }
        default_config_path()
    }

    /// Resolve the log filter used when `RUST_LOG` is not set.
    ///
    /// Priority: --log-level flag > config file value > "info".
    pub fn resolve_log_level(&self, config_level: Option<&str>) -> String {
        self.log_level
            .clone()
            .or_else(|| config_level.map(str::to_string))
            .unwrap_or_else(|| "info".to_string())
    }
}

/// The user's home directory, if the platform reports one.
pub fn home_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    let home = std::env::var("USERPROFILE");
    #[cfg(not(target_os = "windows"))]
    let home = std::env::var("HOME");
    home.ok().map(PathBuf::from)
}

/// Expand a leading `~/` against the home directory.
pub fn expand_home(path: &str) -> PathBuf {
    match path.strip_prefix("~/").or_else(|| path.strip_prefix("~\\")) {
        Some(rest) => home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(rest),
        None => PathBuf::from(path),
    }
}

/// Default config file path for the current platform.
fn default_config_path() -> PathBuf {
    match home_dir() {
        Some(home) => home.join(".framebot").join("config.toml"),
        None => PathBuf::from("config.toml"),
    }
}
