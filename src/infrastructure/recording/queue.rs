//! Capture delivery queue
//!
//! Glue between a device thread that produces samples and the buffer callback:
//! - the device side pushes samples through a [`SampleWriter`]
//! - full buffers travel over an ordered channel to one delivery thread
//! - the delivery thread leases each buffer to the callback, which returns it to the pool

use std::sync::mpsc::{self, Sender};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};

use tracing::{debug, warn};

use crate::application::ports::{BufferCallback, CaptureError};
use crate::domain::recording::{
    BufferFiller, BufferLayout, BufferPool, BufferRecycler, PcmBuffer, PcmFormat, PoolStats,
};

struct FillState {
    filler: BufferFiller,
    delivery_tx: Option<Sender<PcmBuffer>>,
}

fn lock(state: &Mutex<FillState>) -> MutexGuard<'_, FillState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Device-side handle; cheap to clone into audio callbacks
#[derive(Clone)]
pub struct SampleWriter {
    state: Arc<Mutex<FillState>>,
}

impl SampleWriter {
    /// Copy interleaved samples into the pool.
    ///
    /// Never blocks on the consumer: with every buffer in flight the samples are
    /// dropped and counted as overrun. After the queue drains this is a no-op.
    pub fn push(&self, samples: &[i16]) {
        let mut guard = lock(&self.state);
        let state = &mut *guard;
        let Some(tx) = state.delivery_tx.as_ref() else {
            return;
        };
        state.filler.push(samples, |full| {
            // The delivery thread only exits after this sender is dropped
            let _ = tx.send(full);
        });
    }
}

/// Buffer pool plus its delivery thread
pub struct CaptureQueue {
    state: Arc<Mutex<FillState>>,
    recycler: BufferRecycler,
    worker: Option<JoinHandle<()>>,
}

impl CaptureQueue {
    /// Allocate and enqueue the pool, then start the delivery thread
    pub fn spawn(
        format: PcmFormat,
        layout: BufferLayout,
        mut on_buffer: BufferCallback,
    ) -> Result<Self, CaptureError> {
        let pool = BufferPool::allocate(format, layout)?;
        let layout = pool.layout();
        let (filler, recycler) = pool.split();
        let (delivery_tx, delivery_rx) = mpsc::channel::<PcmBuffer>();

        let leases = recycler.clone();
        let worker = thread::Builder::new()
            .name("capture-delivery".to_string())
            .spawn(move || {
                for buffer in delivery_rx {
                    debug!(sequence = buffer.sequence(), bytes = buffer.byte_len(), "Delivering buffer");
                    on_buffer(leases.lease(buffer));
                }
            })
            .map_err(|e| CaptureError::StartFailed(format!("delivery thread: {}", e)))?;

        debug!(
            buffers = layout.buffer_count,
            buffer_size = layout.buffer_size,
            "Capture buffers allocated and enqueued"
        );

        Ok(Self {
            state: Arc::new(Mutex::new(FillState {
                filler,
                delivery_tx: Some(delivery_tx),
            })),
            recycler,
            worker: Some(worker),
        })
    }

    pub fn writer(&self) -> SampleWriter {
        SampleWriter {
            state: Arc::clone(&self.state),
        }
    }

    /// Stop accepting samples, deliver the partial tail buffer and wait until the
    /// callback has processed everything.
    ///
    /// Idempotent; later calls return the final stats.
    pub fn drain(&mut self) -> Result<PoolStats, CaptureError> {
        {
            let mut state = lock(&self.state);
            let tail = state.filler.close();
            if let (Some(tail), Some(tx)) = (tail, state.delivery_tx.as_ref()) {
                debug!(bytes = tail.byte_len(), "Delivering partial tail buffer");
                let _ = tx.send(tail);
            }
            state.delivery_tx = None;
        }

        if let Some(worker) = self.worker.take() {
            worker
                .join()
                .map_err(|_| CaptureError::StopFailed("buffer callback panicked".to_string()))?;
        }

        let stats = self.stats();
        if stats.overrun_samples > 0 {
            warn!(samples = stats.overrun_samples, "Capture overran the buffer pool");
        }
        Ok(stats)
    }

    pub fn is_drained(&self) -> bool {
        self.worker.is_none()
    }

    pub fn stats(&self) -> PoolStats {
        self.recycler.stats()
    }
}

impl Drop for CaptureQueue {
    fn drop(&mut self) {
        if !self.is_drained() {
            let _ = self.drain();
        }
    }
}
