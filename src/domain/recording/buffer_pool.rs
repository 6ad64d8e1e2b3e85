//! Circular pool of reusable capture buffers
//!
//! Buffers cycle empty -> filled -> drained -> empty without reallocation:
//! - [`BufferFiller`] takes empty buffers off the free queue and fills them
//! - a filled buffer is handed to the consumer as a [`FilledBuffer`] lease
//! - dropping (or [`FilledBuffer::requeue`]-ing) the lease puts it back on the free queue

use std::ops::Deref;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;

use thiserror::Error;

use super::buffer::PcmBuffer;
use super::format::{BufferLayout, PcmFormat};

/// Buffer pool errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BufferPoolError {
    #[error("Buffer pool needs at least one buffer")]
    EmptyPool,

    #[error("Buffer size must hold at least one frame, got {0} bytes")]
    BufferTooSmall(usize),
}

#[derive(Debug, Default)]
struct PoolCounters {
    filled: AtomicU64,
    requeued: AtomicU64,
    overrun_samples: AtomicU64,
}

impl PoolCounters {
    fn snapshot(&self) -> PoolStats {
        PoolStats {
            filled: self.filled.load(Ordering::SeqCst),
            requeued: self.requeued.load(Ordering::SeqCst),
            overrun_samples: self.overrun_samples.load(Ordering::SeqCst),
        }
    }
}

/// Buffer bookkeeping snapshot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Buffers handed to the consumer
    pub filled: u64,
    /// Buffers returned to the free queue
    pub requeued: u64,
    /// Samples discarded because every buffer was in flight
    pub overrun_samples: u64,
}

impl PoolStats {
    /// Buffers handed out but not yet returned
    pub fn in_flight(&self) -> u64 {
        self.filled.saturating_sub(self.requeued)
    }
}

/// Fixed set of equal-size PCM buffers, all enqueued on the free queue at allocation
pub struct BufferPool {
    free_tx: Sender<PcmBuffer>,
    free_rx: Receiver<PcmBuffer>,
    layout: BufferLayout,
    frame_bytes: usize,
    counters: Arc<PoolCounters>,
}

impl BufferPool {
    /// Allocate `buffer_count` buffers and enqueue them all.
    ///
    /// `buffer_size` is rounded down to whole frames of `format`, so a frame is never
    /// split across two buffers.
    pub fn allocate(format: PcmFormat, layout: BufferLayout) -> Result<Self, BufferPoolError> {
        if layout.buffer_count == 0 {
            return Err(BufferPoolError::EmptyPool);
        }
        let frame_bytes = format.bytes_per_frame();
        let buffer_size = format.whole_frame_bytes(layout.buffer_size);
        if frame_bytes == 0 || buffer_size == 0 {
            return Err(BufferPoolError::BufferTooSmall(layout.buffer_size));
        }
        let layout = BufferLayout::new(layout.buffer_count, buffer_size);

        let (free_tx, free_rx) = mpsc::channel();
        for _ in 0..layout.buffer_count {
            // The receiver is alive in this scope, send cannot fail
            let _ = free_tx.send(PcmBuffer::with_capacity(layout.buffer_size));
        }

        Ok(Self {
            free_tx,
            free_rx,
            layout,
            frame_bytes,
            counters: Arc::new(PoolCounters::default()),
        })
    }

    /// Effective layout, after rounding to whole frames
    pub fn layout(&self) -> BufferLayout {
        self.layout
    }

    pub fn stats(&self) -> PoolStats {
        self.counters.snapshot()
    }

    /// Split into the fill side (device) and the return side (consumer)
    pub fn split(self) -> (BufferFiller, BufferRecycler) {
        let filler = BufferFiller {
            free_rx: self.free_rx,
            free_tx: self.free_tx.clone(),
            current: None,
            frame_bytes: self.frame_bytes,
            next_sequence: 0,
            closed: false,
            counters: Arc::clone(&self.counters),
        };
        let recycler = BufferRecycler {
            free_tx: self.free_tx,
            counters: self.counters,
        };
        (filler, recycler)
    }
}

/// Fill side of the pool, driven by the capture device
pub struct BufferFiller {
    free_rx: Receiver<PcmBuffer>,
    free_tx: Sender<PcmBuffer>,
    current: Option<PcmBuffer>,
    frame_bytes: usize,
    next_sequence: u64,
    closed: bool,
    counters: Arc<PoolCounters>,
}

impl BufferFiller {
    /// Copy samples into pool buffers.
    ///
    /// Every buffer that fills up is passed to `deliver`, in fill order. Samples that
    /// arrive while no free buffer is available are dropped and counted as overrun.
    pub fn push(&mut self, mut samples: &[i16], mut deliver: impl FnMut(PcmBuffer)) {
        if self.closed {
            return;
        }

        while !samples.is_empty() {
            if self.current.is_none() {
                match self.free_rx.try_recv() {
                    Ok(mut buffer) => {
                        buffer.set_sequence(self.next_sequence);
                        self.next_sequence += 1;
                        self.current = Some(buffer);
                    }
                    Err(_) => {
                        self.counters
                            .overrun_samples
                            .fetch_add(samples.len() as u64, Ordering::SeqCst);
                        return;
                    }
                }
            }

            let Some(buffer) = self.current.as_mut() else {
                return;
            };
            let written = buffer.write_samples(samples);
            samples = &samples[written..];

            if buffer.remaining() < self.frame_bytes {
                if let Some(full) = self.current.take() {
                    self.counters.filled.fetch_add(1, Ordering::SeqCst);
                    deliver(full);
                }
            }
        }
    }

    /// Stop filling and hand back the partially filled tail buffer, if it holds data.
    ///
    /// An empty tail buffer goes straight back to the free queue. Later pushes are ignored.
    pub fn close(&mut self) -> Option<PcmBuffer> {
        self.closed = true;
        let tail = self.current.take()?;
        if tail.is_empty() {
            let _ = self.free_tx.send(tail);
            return None;
        }
        self.counters.filled.fetch_add(1, Ordering::SeqCst);
        Some(tail)
    }

    pub fn stats(&self) -> PoolStats {
        self.counters.snapshot()
    }
}

/// Return side of the pool, held by whoever drains filled buffers
#[derive(Clone)]
pub struct BufferRecycler {
    free_tx: Sender<PcmBuffer>,
    counters: Arc<PoolCounters>,
}

impl BufferRecycler {
    /// Wrap a filled buffer in a lease that re-enqueues it when released
    pub fn lease(&self, buffer: PcmBuffer) -> FilledBuffer {
        FilledBuffer {
            buffer: Some(buffer),
            recycler: self.clone(),
        }
    }

    pub fn stats(&self) -> PoolStats {
        self.counters.snapshot()
    }

    fn recycle(&self, mut buffer: PcmBuffer) {
        buffer.clear();
        self.counters.requeued.fetch_add(1, Ordering::SeqCst);
        // A closed free queue means the pool is being disposed; the buffer is freed
        let _ = self.free_tx.send(buffer);
    }
}

/// Read-only lease on a filled buffer.
///
/// The buffer returns to the free queue exactly once: on [`requeue`](Self::requeue)
/// or, failing that, on drop.
pub struct FilledBuffer {
    buffer: Option<PcmBuffer>,
    recycler: BufferRecycler,
}

impl FilledBuffer {
    /// Give the buffer back to the capture source for re-fill
    pub fn requeue(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let Some(buffer) = self.buffer.take() {
            self.recycler.recycle(buffer);
        }
    }
}

impl Deref for FilledBuffer {
    type Target = PcmBuffer;

    fn deref(&self) -> &PcmBuffer {
        // Only `release` empties the slot, and it runs from `requeue(self)` or `drop`
        self.buffer
            .as_ref()
            .expect("filled buffer accessed after release")
    }
}

impl Drop for FilledBuffer {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stereo(count: usize, size: usize) -> Result<BufferPool, BufferPoolError> {
        BufferPool::allocate(PcmFormat::new(44_100, 2), BufferLayout::new(count, size))
    }

    #[test]
    fn allocate_rejects_empty_pool() {
        assert_eq!(
            stereo(0, 4096).err(),
            Some(BufferPoolError::EmptyPool)
        );
    }

    #[test]
    fn allocate_rejects_tiny_buffers() {
        assert_eq!(
            stereo(3, 3).err(),
            Some(BufferPoolError::BufferTooSmall(3))
        );
    }

    #[test]
    fn fills_buffers_in_order() {
        let pool = stereo(3, 8).unwrap();
        let (mut filler, _recycler) = pool.split();

        let mut delivered = Vec::new();
        filler.push(&[1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12], |b| delivered.push(b));

        assert_eq!(delivered.len(), 3);
        let sequences: Vec<u64> = delivered.iter().map(|b| b.sequence()).collect();
        assert_eq!(sequences, vec![0, 1, 2]);
        assert_eq!(delivered[1].bytes(), &[5, 0, 6, 0, 7, 0, 8, 0]);
    }

    #[test]
    fn exhausted_pool_counts_overrun() {
        let pool = stereo(2, 4).unwrap();
        let (mut filler, _recycler) = pool.split();

        let mut delivered = Vec::new();
        filler.push(&[1, 2, 3, 4, 5, 6, 7], |b| delivered.push(b));

        assert_eq!(delivered.len(), 2);
        assert_eq!(filler.stats().overrun_samples, 3);
    }

    #[test]
    fn requeued_buffer_is_reused_without_reallocation() {
        let pool = stereo(1, 4).unwrap();
        let (mut filler, recycler) = pool.split();

        let mut delivered = Vec::new();
        filler.push(&[1, 2], |b| delivered.push(b));
        let lease = recycler.lease(delivered.remove(0));
        assert_eq!(lease.sequence(), 0);
        lease.requeue();

        filler.push(&[3, 4], |b| delivered.push(b));
        assert_eq!(delivered.len(), 1);
        assert_eq!(delivered[0].sequence(), 1);
        assert_eq!(delivered[0].bytes(), &[3, 0, 4, 0]);
        assert_eq!(recycler.stats().overrun_samples, 0);
    }

    #[test]
    fn dropping_a_lease_requeues_once() {
        let pool = stereo(1, 4).unwrap();
        let (mut filler, recycler) = pool.split();

        let mut delivered = Vec::new();
        filler.push(&[1, 2], |b| delivered.push(b));
        drop(recycler.lease(delivered.remove(0)));

        let stats = recycler.stats();
        assert_eq!(stats.filled, 1);
        assert_eq!(stats.requeued, 1);
        assert_eq!(stats.in_flight(), 0);
    }

    #[test]
    fn close_returns_partial_tail() {
        let pool = stereo(3, 8).unwrap();
        let (mut filler, _recycler) = pool.split();

        filler.push(&[1, 2, 3], |_| panic!("no buffer should be full yet"));
        let tail = filler.close().expect("tail buffer");
        assert_eq!(tail.byte_len(), 6);
        assert_eq!(filler.stats().filled, 1);
    }

    #[test]
    fn close_without_data_returns_nothing() {
        let pool = stereo(3, 8).unwrap();
        let (mut filler, _recycler) = pool.split();
        assert!(filler.close().is_none());
        assert_eq!(filler.stats().filled, 0);
    }

    #[test]
    fn closed_filler_ignores_samples() {
        let pool = stereo(3, 4).unwrap();
        let (mut filler, _recycler) = pool.split();
        filler.close();

        filler.push(&[1, 2, 3, 4], |_| panic!("closed filler delivered a buffer"));
        assert_eq!(filler.stats().filled, 0);
        assert_eq!(filler.stats().overrun_samples, 0);
    }

    #[test]
    fn buffer_size_is_rounded_to_whole_frames() {
        let pool = stereo(3, 4098).unwrap();
        assert_eq!(pool.layout(), BufferLayout::new(3, 4096));

        let mono = BufferPool::allocate(PcmFormat::new(44_100, 1), BufferLayout::new(3, 4097))
            .unwrap();
        assert_eq!(mono.layout().buffer_size, 4096);
    }

    #[test]
    fn frames_are_never_split_across_buffers() {
        let pool = stereo(3, 4098).unwrap();
        let (mut filler, _recycler) = pool.split();

        // Left channel positive, right channel negative
        let frames: Vec<i16> = (0..1500).flat_map(|_| [1, -1]).collect();
        let mut delivered = Vec::new();
        filler.push(&frames, |b| delivered.push(b));

        let format = PcmFormat::new(44_100, 2);
        assert_eq!(delivered.len(), 1);
        assert_eq!(delivered[0].remainder_bytes(&format), 0);

        let tail = filler.close().expect("tail buffer");
        let samples = tail.samples(&format);
        assert_eq!(tail.remainder_bytes(&format), 0);
        assert_eq!(&samples[..2], &[1, -1]);
    }
}
