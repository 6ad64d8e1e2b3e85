//! CLI argument definitions using Clap

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};

use crate::domain::recording::{BufferLayout, Duration};

/// mp3-recorder - record the default microphone straight to MP3
#[derive(Parser, Debug)]
#[command(name = "mp3-recorder")]
#[command(version)]
#[command(about = "Record audio from the default input device to an MP3 file")]
#[command(long_about = None)]
pub struct Cli {
    /// Recording duration (e.g., 10s, 1m, 2m30s)
    #[arg(short = 'd', long, value_name = "TIME")]
    pub duration: Option<String>,

    /// Output MP3 file
    #[arg(short = 'o', long, value_name = "FILE", env = "MP3_RECORDER_OUTPUT")]
    pub output: Option<String>,

    /// MP3 bitrate in kbps (e.g., 128, 192, 320)
    #[arg(short = 'b', long, value_name = "KBPS")]
    pub bitrate: Option<u16>,

    /// LAME quality, 0 (best) to 9 (fastest)
    #[arg(short = 'q', long, value_name = "LEVEL")]
    pub quality: Option<u8>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    pub verbose: u8,

    /// Config subcommand
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config action subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Create config file with defaults
    Init,
    /// Set a config value
    Set {
        /// Config key
        key: String,
        /// Config value
        value: String,
    },
    /// Get a config value
    Get {
        /// Config key
        key: String,
    },
    /// List all config values
    List,
    /// Show config file path
    Path,
}

/// Fully resolved recording options
#[derive(Debug, Clone)]
pub struct RecordOptions {
    pub duration: Duration,
    pub output: PathBuf,
    pub bitrate: u16,
    pub quality: u8,
    pub layout: BufferLayout,
}

/// Valid config keys
pub const VALID_CONFIG_KEYS: &[&str] = &[
    "duration",
    "output",
    "bitrate",
    "quality",
    "buffer_count",
    "buffer_size",
];

/// Check if a config key is valid
pub fn is_valid_config_key(key: &str) -> bool {
    VALID_CONFIG_KEYS.contains(&key)
}
