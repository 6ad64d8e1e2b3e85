//! Audio capture port interfaces

use thiserror::Error;

use crate::domain::recording::{
    BufferLayout, BufferPoolError, FilledBuffer, PcmFormat, PoolStats,
};

/// Capture errors
#[derive(Debug, Clone, Error)]
pub enum CaptureError {
    #[error("No usable audio input device: {0}")]
    DeviceUnavailable(String),

    #[error("Failed to start capture: {0}")]
    StartFailed(String),

    #[error("Failed to stop capture: {0}")]
    StopFailed(String),

    #[error("Capture must be stopped before it is disposed")]
    NotStopped,

    #[error("Invalid buffer pool: {0}")]
    BufferPool(#[from] BufferPoolError),
}

/// Handler invoked once per filled buffer, in fill order.
///
/// Dropping the [`FilledBuffer`] (or calling `requeue`) returns it to the pool.
pub type BufferCallback = Box<dyn FnMut(FilledBuffer) + Send + 'static>;

/// Port for opening a capture source on an input device
pub trait CaptureDevice {
    type Source: CaptureSource;

    /// Allocate `layout.buffer_count` buffers of `layout.buffer_size` bytes, enqueue
    /// them all, and prime the device without starting it.
    fn open(
        &self,
        format: PcmFormat,
        layout: BufferLayout,
        on_buffer: BufferCallback,
    ) -> Result<Self::Source, CaptureError>;
}

/// Port for a primed capture source
pub trait CaptureSource {
    /// Begin delivering filled buffers to the callback
    fn start(&mut self) -> Result<(), CaptureError>;

    /// Halt delivery.
    ///
    /// Returns only after every buffer filled so far, including the partially
    /// filled tail, has been processed by the callback.
    fn stop(&mut self) -> Result<PoolStats, CaptureError>;

    /// Release device and buffer resources. Fails with `NotStopped` before `stop`.
    fn dispose(self) -> Result<(), CaptureError>
    where
        Self: Sized;

    /// Current buffer bookkeeping
    fn stats(&self) -> PoolStats;
}
