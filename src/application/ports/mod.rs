//! Port interfaces (traits) for external systems
//!
//! These traits define the boundaries between the application
//! and infrastructure layers.

pub mod capture;
pub mod config;
pub mod encoder;
pub mod sink;

// Re-export common types
pub use capture::{BufferCallback, CaptureDevice, CaptureError, CaptureSource};
pub use config::ConfigStore;
pub use encoder::{EncoderError, EncoderSettings, Mp3Encoder, SUPPORTED_BITRATES_KBPS};
pub use sink::{OutputSink, SinkError};
