//! PCM format and buffer layout value objects
//!
//! The whole pipeline works on interleaved signed 16-bit little-endian PCM.

/// Capture sample rate (CD quality)
pub const DEFAULT_SAMPLE_RATE: u32 = 44_100;

/// Capture channel count (stereo)
pub const DEFAULT_CHANNELS: u16 = 2;

/// Bytes per sample (16-bit audio)
pub const BYTES_PER_SAMPLE: usize = 2;

/// Number of buffers cycled between the device and the transcoder
pub const DEFAULT_BUFFER_COUNT: usize = 3;

/// Size of each capture buffer in bytes
pub const DEFAULT_BUFFER_SIZE: usize = 4096;

/// Interleaved 16-bit PCM format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PcmFormat {
    pub sample_rate: u32,
    pub channels: u16,
}

impl PcmFormat {
    pub const fn new(sample_rate: u32, channels: u16) -> Self {
        Self {
            sample_rate,
            channels,
        }
    }

    /// Bytes occupied by one interleaved frame (one sample per channel)
    pub const fn bytes_per_frame(&self) -> usize {
        self.channels as usize * BYTES_PER_SAMPLE
    }

    /// Largest prefix of `byte_len` made of whole frames
    pub const fn whole_frame_bytes(&self, byte_len: usize) -> usize {
        let frame = self.bytes_per_frame();
        if frame == 0 {
            return 0;
        }
        byte_len - byte_len % frame
    }
}

impl Default for PcmFormat {
    fn default() -> Self {
        Self::new(DEFAULT_SAMPLE_RATE, DEFAULT_CHANNELS)
    }
}

/// Size and count of the capture buffer pool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferLayout {
    pub buffer_count: usize,
    pub buffer_size: usize,
}

impl BufferLayout {
    pub const fn new(buffer_count: usize, buffer_size: usize) -> Self {
        Self {
            buffer_count,
            buffer_size,
        }
    }

    /// Whether each buffer holds a whole, non-zero number of `format` frames
    pub const fn fits_frames(&self, format: &PcmFormat) -> bool {
        let frame = format.bytes_per_frame();
        frame > 0 && self.buffer_size >= frame && self.buffer_size % frame == 0
    }
}

impl Default for BufferLayout {
    fn default() -> Self {
        Self::new(DEFAULT_BUFFER_COUNT, DEFAULT_BUFFER_SIZE)
    }
}
