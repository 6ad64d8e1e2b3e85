//! Infrastructure layer - Adapter implementations
//!
//! Contains concrete implementations of the port interfaces,
//! integrating with cpal, LAME and the filesystem.

pub mod config;
pub mod output;
pub mod recording;

// Re-export adapters
pub use config::XdgConfigStore;
pub use output::FileSink;
pub use recording::{CaptureQueue, CpalCaptureDevice, LameEncoder, SampleWriter};
