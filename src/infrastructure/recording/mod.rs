//! Recording infrastructure module
//!
//! Live capture through cpal feeding a fixed buffer pool, and MP3 encoding
//! through LAME.

mod cpal_capture;
mod lame_encoder;
pub mod queue;

pub use cpal_capture::{CpalCaptureDevice, CpalCaptureSource};
pub use lame_encoder::LameEncoder;
pub use queue::{CaptureQueue, SampleWriter};
