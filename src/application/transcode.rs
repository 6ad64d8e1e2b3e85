//! Per-buffer PCM -> MP3 transcoding
//!
//! The [`Transcoder`] owns the encoder and the output sink for the lifetime of a
//! capture. It runs on the capture source's delivery thread, one buffer at a time.

use tracing::{debug, warn};

use crate::domain::recording::{FilledBuffer, PcmBuffer, PcmFormat};

use super::ports::{EncoderError, Mp3Encoder, OutputSink};

/// Transcoding counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TranscodeStats {
    /// Buffers received from the capture source
    pub buffers: u64,
    /// Encode calls that produced no bytes (encoder latency)
    pub empty_encodes: u64,
    /// Buffers whose encode call failed; their audio is lost
    pub encode_failures: u64,
    /// Appends rejected by the sink
    pub sink_failures: u64,
    /// Encoded bytes lost to sink failures
    pub dropped_bytes: u64,
    /// Trailing bytes discarded because they did not form a whole frame
    pub dropped_remainder_bytes: u64,
    /// Bytes appended from `encode`
    pub encoded_bytes: u64,
    /// Bytes appended from the final `flush`
    pub flushed_bytes: u64,
}

impl TranscodeStats {
    /// Buffers that contributed nothing to the output
    pub fn dropped_buffers(&self) -> u64 {
        self.encode_failures
    }
}

/// Result of shutting the transcoder down
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscodeReport {
    pub stats: TranscodeStats,
    /// Total bytes the sink accepted
    pub bytes_written: u64,
}

/// Encoder plus sink, driven by filled capture buffers
pub struct Transcoder<E: Mp3Encoder, S: OutputSink> {
    encoder: E,
    sink: S,
    format: PcmFormat,
    flushed: bool,
    stats: TranscodeStats,
}

impl<E: Mp3Encoder, S: OutputSink> Transcoder<E, S> {
    pub fn new(encoder: E, sink: S, format: PcmFormat) -> Self {
        Self {
            encoder,
            sink,
            format,
            flushed: false,
            stats: TranscodeStats::default(),
        }
    }

    /// Encode one filled buffer and append the result.
    ///
    /// Failures are logged and counted, never returned. The buffer is handed back to
    /// the capture source whatever the outcome.
    pub fn handle(&mut self, buffer: FilledBuffer) {
        self.process(&buffer);
        buffer.requeue();
    }

    fn process(&mut self, buffer: &PcmBuffer) {
        self.stats.buffers += 1;

        let remainder = buffer.remainder_bytes(&self.format);
        if remainder > 0 {
            debug!(
                sequence = buffer.sequence(),
                remainder, "Dropping bytes past the last whole frame"
            );
            self.stats.dropped_remainder_bytes += remainder as u64;
        }

        let samples = buffer.samples(&self.format);
        if samples.is_empty() {
            return;
        }

        match self.encoder.encode(&samples) {
            Ok(bytes) if bytes.is_empty() => {
                self.stats.empty_encodes += 1;
            }
            Ok(bytes) => {
                if self.append(&bytes) {
                    self.stats.encoded_bytes += bytes.len() as u64;
                }
            }
            Err(e) => {
                warn!(sequence = buffer.sequence(), error = %e, "Encode failed, dropping buffer");
                self.stats.encode_failures += 1;
            }
        }
    }

    fn append(&mut self, bytes: &[u8]) -> bool {
        match self.sink.append(bytes) {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, bytes = bytes.len(), "Output write failed, dropping bytes");
                self.stats.sink_failures += 1;
                self.stats.dropped_bytes += bytes.len() as u64;
                false
            }
        }
    }

    /// Drain the encoder and append its last frames.
    ///
    /// Must only run once no buffer can arrive anymore. Returns the number of
    /// bytes the flush produced.
    pub fn flush(&mut self) -> Result<usize, EncoderError> {
        if self.flushed {
            return Err(EncoderError::AlreadyFlushed);
        }
        let bytes = self.encoder.flush()?;
        self.flushed = true;

        if !bytes.is_empty() && self.append(&bytes) {
            self.stats.flushed_bytes += bytes.len() as u64;
        }
        Ok(bytes.len())
    }

    /// Release the encoder and report what was written
    pub fn close(self) -> TranscodeReport {
        let bytes_written = self.sink.bytes_written();
        self.encoder.close();
        TranscodeReport {
            stats: self.stats,
            bytes_written,
        }
    }

    pub fn stats(&self) -> TranscodeStats {
        self.stats
    }
}
