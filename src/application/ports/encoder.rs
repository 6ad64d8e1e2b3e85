//! MP3 encoder port interface

use thiserror::Error;

use crate::domain::recording::PcmFormat;

/// Bitrates (kbps) valid for MPEG Layer III
pub const SUPPORTED_BITRATES_KBPS: &[u16] = &[
    8, 16, 24, 32, 40, 48, 64, 80, 96, 112, 128, 160, 192, 224, 256, 320,
];

/// Highest (worst) quality level; 0 is best
pub const MAX_QUALITY: u8 = 9;

/// Encoder errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncoderError {
    #[error("Invalid encoder parameters: {0}")]
    InvalidParams(String),

    #[error("Encoding failed: {0}")]
    EncodeFailed(String),

    #[error("Flushing the encoder failed: {0}")]
    FlushFailed(String),

    #[error("Encoder was already flushed")]
    AlreadyFlushed,
}

/// Encoder configuration, fixed before the first encode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncoderSettings {
    pub sample_rate: u32,
    pub channels: u16,
    pub bitrate_kbps: u16,
    pub quality: u8,
}

impl EncoderSettings {
    pub fn new(format: PcmFormat, bitrate_kbps: u16, quality: u8) -> Self {
        Self {
            sample_rate: format.sample_rate,
            channels: format.channels,
            bitrate_kbps,
            quality,
        }
    }

    pub fn format(&self) -> PcmFormat {
        PcmFormat::new(self.sample_rate, self.channels)
    }

    /// Check the combination before handing it to an encoder
    pub fn validate(&self) -> Result<(), EncoderError> {
        if !(1..=2).contains(&self.channels) {
            return Err(EncoderError::InvalidParams(format!(
                "{} channels (expected 1 or 2)",
                self.channels
            )));
        }
        if self.sample_rate == 0 {
            return Err(EncoderError::InvalidParams("sample rate 0 Hz".to_string()));
        }
        if !SUPPORTED_BITRATES_KBPS.contains(&self.bitrate_kbps) {
            return Err(EncoderError::InvalidParams(format!(
                "{} kbps is not an MP3 bitrate",
                self.bitrate_kbps
            )));
        }
        if self.quality > MAX_QUALITY {
            return Err(EncoderError::InvalidParams(format!(
                "quality {} (expected 0-{})",
                self.quality, MAX_QUALITY
            )));
        }
        Ok(())
    }
}

/// Port for stateful PCM -> MP3 transcoding.
///
/// Call order: `configure`, any number of `encode`, exactly one `flush`, `close`.
pub trait Mp3Encoder: Send {
    /// Build an encoder; rejects unsupported parameter combinations
    fn configure(settings: &EncoderSettings) -> Result<Self, EncoderError>
    where
        Self: Sized;

    /// Encode interleaved samples.
    ///
    /// Output length is not proportional to input: the encoder buffers internally
    /// and may return no bytes at all.
    fn encode(&mut self, interleaved: &[i16]) -> Result<Vec<u8>, EncoderError>;

    /// Emit every remaining buffered frame. A second call fails with `AlreadyFlushed`.
    fn flush(&mut self) -> Result<Vec<u8>, EncoderError>;

    /// Release encoder resources
    fn close(self)
    where
        Self: Sized;
}
