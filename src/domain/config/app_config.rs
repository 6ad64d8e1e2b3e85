//! Application configuration value object

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::domain::error::ConfigError;
use crate::domain::recording::format::{DEFAULT_BUFFER_COUNT, DEFAULT_BUFFER_SIZE};
use crate::domain::recording::{BufferLayout, Duration, PcmFormat};

/// Default output file
pub const DEFAULT_OUTPUT: &str = "recording.mp3";

/// Default MP3 bitrate in kbps
pub const DEFAULT_BITRATE_KBPS: u16 = 128;

/// Default LAME quality (0 best, 9 worst)
pub const DEFAULT_QUALITY: u8 = 5;

/// Application configuration.
/// All fields are optional to support partial configs and merging.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    pub duration: Option<String>,
    pub output: Option<String>,
    pub bitrate: Option<u16>,
    pub quality: Option<u8>,
    pub buffer_count: Option<usize>,
    pub buffer_size: Option<usize>,
}

impl AppConfig {
    /// Create config with default values
    pub fn defaults() -> Self {
        Self {
            duration: Some(Duration::default_duration().to_string()),
            output: Some(DEFAULT_OUTPUT.to_string()),
            bitrate: Some(DEFAULT_BITRATE_KBPS),
            quality: Some(DEFAULT_QUALITY),
            buffer_count: Some(DEFAULT_BUFFER_COUNT),
            buffer_size: Some(DEFAULT_BUFFER_SIZE),
        }
    }

    /// Create an empty config (all None)
    pub fn empty() -> Self {
        Self::default()
    }

    /// Merge this config with another, where other takes precedence.
    /// Only non-None values from other will override this.
    pub fn merge(self, other: Self) -> Self {
        Self {
            duration: other.duration.or(self.duration),
            output: other.output.or(self.output),
            bitrate: other.bitrate.or(self.bitrate),
            quality: other.quality.or(self.quality),
            buffer_count: other.buffer_count.or(self.buffer_count),
            buffer_size: other.buffer_size.or(self.buffer_size),
        }
    }

    /// Get duration as parsed Duration, or default if not set/invalid
    pub fn duration_or_default(&self) -> Duration {
        self.duration
            .as_ref()
            .and_then(|s| s.parse().ok())
            .unwrap_or_else(Duration::default_duration)
    }

    pub fn output_or_default(&self) -> PathBuf {
        PathBuf::from(self.output.as_deref().unwrap_or(DEFAULT_OUTPUT))
    }

    pub fn bitrate_or_default(&self) -> u16 {
        self.bitrate.unwrap_or(DEFAULT_BITRATE_KBPS)
    }

    pub fn quality_or_default(&self) -> u8 {
        self.quality.unwrap_or(DEFAULT_QUALITY)
    }

    /// Buffer pool layout, falling back per field.
    ///
    /// Rejects an empty pool and buffer sizes that would split a capture frame.
    pub fn buffer_layout_or_default(&self) -> Result<BufferLayout, ConfigError> {
        let layout = BufferLayout::new(
            self.buffer_count.unwrap_or(DEFAULT_BUFFER_COUNT),
            self.buffer_size.unwrap_or(DEFAULT_BUFFER_SIZE),
        );

        if layout.buffer_count == 0 {
            return Err(ConfigError::ValidationError {
                key: "buffer_count".to_string(),
                message: "At least one buffer is required".to_string(),
            });
        }
        let format = PcmFormat::default();
        if !layout.fits_frames(&format) {
            return Err(ConfigError::ValidationError {
                key: "buffer_size".to_string(),
                message: format!(
                    "{} bytes is not a multiple of the {}-byte frame size",
                    layout.buffer_size,
                    format.bytes_per_frame()
                ),
            });
        }
        Ok(layout)
    }
}
