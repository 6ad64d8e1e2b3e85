//! Application layer - Use cases and port interfaces
//!
//! Contains the recording pipeline and the trait definitions
//! for capture, encoding, output and configuration.

pub mod ports;
pub mod record;
pub mod transcode;

// Re-export use cases
pub use record::{
    ProgressCallback, RecordCallbacks, RecordError, RecordInput, RecordOutput, RecordingPipeline,
};
pub use transcode::{TranscodeReport, TranscodeStats, Transcoder};
