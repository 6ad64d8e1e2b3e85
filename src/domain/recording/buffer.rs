//! Fixed-capacity PCM buffer

use super::format::{PcmFormat, BYTES_PER_SAMPLE};

/// A block of interleaved 16-bit little-endian PCM.
///
/// Capacity is fixed at allocation; `byte_len` reports how many bytes are valid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PcmBuffer {
    data: Vec<u8>,
    filled: usize,
    sequence: u64,
}

impl PcmBuffer {
    /// Allocate a zeroed buffer of `capacity` bytes
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: vec![0; capacity],
            filled: 0,
            sequence: 0,
        }
    }

    /// Number of valid bytes
    pub fn byte_len(&self) -> usize {
        self.filled
    }

    /// Free space in bytes
    pub fn remaining(&self) -> usize {
        self.data.len() - self.filled
    }

    pub fn is_empty(&self) -> bool {
        self.filled == 0
    }

    /// Position of this fill in the capture stream (0-based)
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub(crate) fn set_sequence(&mut self, sequence: u64) {
        self.sequence = sequence;
    }

    /// Valid bytes
    pub fn bytes(&self) -> &[u8] {
        &self.data[..self.filled]
    }

    /// Append as many samples as fit, returning how many were written
    pub fn write_samples(&mut self, samples: &[i16]) -> usize {
        let count = (self.remaining() / BYTES_PER_SAMPLE).min(samples.len());
        for sample in &samples[..count] {
            let end = self.filled + BYTES_PER_SAMPLE;
            self.data[self.filled..end].copy_from_slice(&sample.to_le_bytes());
            self.filled = end;
        }
        count
    }

    /// Decode the whole interleaved frames held by this buffer.
    ///
    /// Trailing bytes that do not complete a frame are not returned.
    pub fn samples(&self, format: &PcmFormat) -> Vec<i16> {
        let whole = format.whole_frame_bytes(self.filled);
        self.data[..whole]
            .chunks_exact(BYTES_PER_SAMPLE)
            .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
            .collect()
    }

    /// Bytes past the last whole frame
    pub fn remainder_bytes(&self, format: &PcmFormat) -> usize {
        self.filled - format.whole_frame_bytes(self.filled)
    }

    /// Mark the buffer empty for reuse (capacity is kept)
    pub fn clear(&mut self) {
        self.filled = 0;
    }
}
