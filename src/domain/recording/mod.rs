//! Recording domain: PCM format, capture buffers and the session lifecycle

pub mod buffer;
pub mod buffer_pool;
pub mod duration;
pub mod format;
pub mod session;

pub use buffer::PcmBuffer;
pub use buffer_pool::{
    BufferFiller, BufferPool, BufferPoolError, BufferRecycler, FilledBuffer, PoolStats,
};
pub use duration::Duration;
pub use format::{BufferLayout, PcmFormat};
pub use session::{InvalidStateTransition, RecordingSession, SessionState};
