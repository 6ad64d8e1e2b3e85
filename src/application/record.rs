//! Record-to-MP3 use case
//!
//! Drives one recording session through its lifecycle:
//! configure the encoder, open and start capture, wait for the configured
//! duration, stop and dispose capture, flush the encoder, close.

use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::{Duration as StdDuration, Instant};

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::domain::recording::{
    BufferLayout, Duration, InvalidStateTransition, PoolStats, RecordingSession,
};

use super::ports::{
    BufferCallback, CaptureDevice, CaptureError, CaptureSource, EncoderError, EncoderSettings,
    Mp3Encoder, OutputSink,
};
use super::transcode::{TranscodeStats, Transcoder};

/// Interval between progress ticks while capturing
const PROGRESS_TICK: StdDuration = StdDuration::from_millis(100);

/// Errors from the record use case
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("Failed to initialize MP3 encoder: {0}")]
    EncoderInitFailed(#[source] EncoderError),

    #[error("Failed to initialize audio capture: {0}")]
    CaptureInitFailed(#[source] CaptureError),

    #[error(transparent)]
    InvalidTransition(#[from] InvalidStateTransition),

    #[error("Transcoder is still referenced by the capture callback")]
    TranscoderStillShared,
}

/// Progress callback type for reporting recording progress.
/// Parameters: (elapsed_ms, total_ms)
pub type ProgressCallback = Arc<dyn Fn(u64, u64) + Send + Sync>;

/// Input parameters for the record use case
#[derive(Debug, Clone, Copy)]
pub struct RecordInput {
    /// How long to capture
    pub duration: Duration,
    /// Encoder configuration (also fixes the capture format)
    pub settings: EncoderSettings,
    /// Capture buffer pool shape
    pub layout: BufferLayout,
}

/// Callbacks for progress and status updates
#[derive(Default)]
pub struct RecordCallbacks {
    /// Called while capturing with (elapsed_ms, total_ms)
    pub on_progress: Option<ProgressCallback>,
    /// Called once capture has started
    pub on_capture_start: Option<Box<dyn Fn() + Send + Sync>>,
    /// Called once capture has stopped and every buffer is processed
    pub on_capture_end: Option<Box<dyn Fn(&PoolStats) + Send + Sync>>,
}

/// Output from the record use case
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordOutput {
    /// Output file
    pub path: PathBuf,
    /// Bytes in the output file
    pub bytes_written: u64,
    /// Capture buffer bookkeeping at stop
    pub capture: PoolStats,
    /// Transcoding counters
    pub transcode: TranscodeStats,
    /// Set when the final flush failed; the file lacks its last frames
    pub flush_failed: bool,
    /// Capture did not stop cleanly; buffers after the failure are missing
    pub stop_failed: bool,
}

impl RecordOutput {
    pub fn human_readable_size(&self) -> String {
        let bytes = self.bytes_written;
        if bytes < 1024 {
            format!("{} B", bytes)
        } else if bytes < 1024 * 1024 {
            format!("{:.1} KB", bytes as f64 / 1024.0)
        } else {
            format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
        }
    }
}

type SharedTranscoder<E, S> = Arc<Mutex<Transcoder<E, S>>>;

/// Fixed-duration capture -> MP3 file pipeline
pub struct RecordingPipeline<D: CaptureDevice> {
    device: D,
}

impl<D: CaptureDevice> RecordingPipeline<D> {
    pub fn new(device: D) -> Self {
        Self { device }
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    /// Run one recording session to completion.
    ///
    /// Blocks the calling thread for the whole capture duration.
    pub fn execute<E, S>(
        &self,
        sink: S,
        input: RecordInput,
        callbacks: RecordCallbacks,
    ) -> Result<RecordOutput, RecordError>
    where
        E: Mp3Encoder + 'static,
        S: OutputSink + 'static,
    {
        let mut session = RecordingSession::new();
        let path = sink.path().to_path_buf();

        // IDLE -> CONFIGURING
        session.configure()?;
        let encoder = E::configure(&input.settings).map_err(RecordError::EncoderInitFailed)?;
        let format = input.settings.format();
        let transcoder: SharedTranscoder<E, S> =
            Arc::new(Mutex::new(Transcoder::new(encoder, sink, format)));

        // CONFIGURING -> CAPTURING
        let handler = Arc::clone(&transcoder);
        let on_buffer: BufferCallback = Box::new(move |buffer| {
            handler
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .handle(buffer);
        });

        let mut source = match self.device.open(format, input.layout, on_buffer) {
            Ok(source) => source,
            Err(e) => {
                abandon(transcoder);
                return Err(RecordError::CaptureInitFailed(e));
            }
        };
        if let Err(e) = source.start() {
            if let Err(stop_err) = source.stop().and_then(|_| source.dispose()) {
                debug!(error = %stop_err, "Cleanup after failed start also failed");
            }
            abandon(transcoder);
            return Err(RecordError::CaptureInitFailed(e));
        }
        session.start_capture()?;
        info!(duration = %input.duration, path = %path.display(), "Recording started");

        if let Some(ref cb) = callbacks.on_capture_start {
            cb();
        }

        wait_for(input.duration, callbacks.on_progress.as_ref());

        // CAPTURING -> STOPPING
        session.stop_capture()?;
        let (capture, stop_failed) = match source.stop() {
            Ok(stats) => (stats, false),
            Err(e) => {
                warn!(error = %e, "Capture did not stop cleanly, finishing the file anyway");
                (source.stats(), true)
            }
        };
        if let Err(e) = source.dispose() {
            warn!(error = %e, "Capture resources were not released cleanly");
        }
        info!(
            buffers = capture.filled,
            overrun_samples = capture.overrun_samples,
            "Capture stopped"
        );

        if let Some(ref cb) = callbacks.on_capture_end {
            cb(&capture);
        }

        // STOPPING -> FLUSHING
        let mut transcoder = reclaim(transcoder)?;
        session.flush()?;
        let flush_failed = match transcoder.flush() {
            Ok(bytes) => {
                debug!(bytes, "Encoder flushed");
                false
            }
            Err(e) => {
                warn!(error = %e, "Final flush failed, closing without trailing frames");
                true
            }
        };

        // FLUSHING -> CLOSED
        let report = transcoder.close();
        session.close()?;
        info!(bytes = report.bytes_written, path = %path.display(), "Recording closed");

        Ok(RecordOutput {
            path,
            bytes_written: report.bytes_written,
            capture,
            transcode: report.stats,
            flush_failed,
            stop_failed,
        })
    }
}

/// Sleep for `duration`, reporting progress every tick
fn wait_for(duration: Duration, on_progress: Option<&ProgressCallback>) {
    let total = duration.as_std();
    let total_ms = duration.as_millis();
    let start = Instant::now();

    loop {
        let elapsed = start.elapsed();
        if elapsed >= total {
            break;
        }
        if let Some(progress) = on_progress {
            progress(elapsed.as_millis() as u64, total_ms);
        }
        thread::sleep(PROGRESS_TICK.min(total - elapsed));
    }

    if let Some(progress) = on_progress {
        progress(total_ms, total_ms);
    }
}

/// Take back sole ownership once the capture callback is gone
fn reclaim<E: Mp3Encoder, S: OutputSink>(
    shared: SharedTranscoder<E, S>,
) -> Result<Transcoder<E, S>, RecordError> {
    Arc::try_unwrap(shared)
        .map(|mutex| mutex.into_inner().unwrap_or_else(PoisonError::into_inner))
        .map_err(|_| RecordError::TranscoderStillShared)
}

/// Release the encoder after a failed start
fn abandon<E: Mp3Encoder, S: OutputSink>(shared: SharedTranscoder<E, S>) {
    if let Ok(transcoder) = reclaim(shared) {
        transcoder.close();
    }
}
