//! MP3 encoder backed by LAME
//!
//! One encoder instance per recording. Configuration is fixed at build time,
//! and the stream is terminated by exactly one flush.

use mp3lame_encoder::{Bitrate, BuildError, Builder, Encoder, FlushNoGap, InterleavedPcm, MonoPcm, Quality};
use tracing::debug;

use crate::application::ports::{EncoderError, EncoderSettings, Mp3Encoder};

/// Upper bound on what a LAME flush can emit (one frame plus the bit reservoir)
const FLUSH_BUFFER_SIZE: usize = 7200;

fn bitrate_for(kbps: u16) -> Option<Bitrate> {
    let bitrate = match kbps {
        8 => Bitrate::Kbps8,
        16 => Bitrate::Kbps16,
        24 => Bitrate::Kbps24,
        32 => Bitrate::Kbps32,
        40 => Bitrate::Kbps40,
        48 => Bitrate::Kbps48,
        64 => Bitrate::Kbps64,
        80 => Bitrate::Kbps80,
        96 => Bitrate::Kbps96,
        112 => Bitrate::Kbps112,
        128 => Bitrate::Kbps128,
        160 => Bitrate::Kbps160,
        192 => Bitrate::Kbps192,
        224 => Bitrate::Kbps224,
        256 => Bitrate::Kbps256,
        320 => Bitrate::Kbps320,
        _ => return None,
    };
    Some(bitrate)
}

fn quality_for(level: u8) -> Option<Quality> {
    let quality = match level {
        0 => Quality::Best,
        1 => Quality::SecondBest,
        2 => Quality::NearBest,
        3 => Quality::VeryNice,
        4 => Quality::Nice,
        5 => Quality::Good,
        6 => Quality::Decent,
        7 => Quality::Ok,
        8 => Quality::SecondWorst,
        9 => Quality::Worst,
        _ => return None,
    };
    Some(quality)
}

/// LAME-based [`Mp3Encoder`]
pub struct LameEncoder {
    encoder: Encoder,
    channels: u16,
    flushed: bool,
}

impl Mp3Encoder for LameEncoder {
    fn configure(settings: &EncoderSettings) -> Result<Self, EncoderError> {
        settings.validate()?;

        let invalid = |e: BuildError| EncoderError::InvalidParams(format!("{:?}", e));
        let bitrate = bitrate_for(settings.bitrate_kbps).ok_or_else(|| {
            EncoderError::InvalidParams(format!("{} kbps", settings.bitrate_kbps))
        })?;
        let quality = quality_for(settings.quality)
            .ok_or_else(|| EncoderError::InvalidParams(format!("quality {}", settings.quality)))?;

        let mut builder = Builder::new().ok_or_else(|| {
            EncoderError::InvalidParams("LAME could not allocate an encoder".to_string())
        })?;
        builder.set_num_channels(settings.channels as u8).map_err(invalid)?;
        builder.set_sample_rate(settings.sample_rate).map_err(invalid)?;
        builder.set_brate(bitrate).map_err(invalid)?;
        builder.set_quality(quality).map_err(invalid)?;
        let encoder = builder.build().map_err(invalid)?;

        debug!(
            sample_rate = settings.sample_rate,
            channels = settings.channels,
            bitrate_kbps = settings.bitrate_kbps,
            quality = settings.quality,
            "LAME encoder configured"
        );

        Ok(Self {
            encoder,
            channels: settings.channels,
            flushed: false,
        })
    }

    fn encode(&mut self, interleaved: &[i16]) -> Result<Vec<u8>, EncoderError> {
        if self.flushed {
            return Err(EncoderError::AlreadyFlushed);
        }
        if interleaved.is_empty() {
            return Ok(Vec::new());
        }

        let frames = interleaved.len() / self.channels as usize;
        let mut out = Vec::with_capacity(mp3lame_encoder::max_required_buffer_size(frames));

        let result = if self.channels == 1 {
            self.encoder.encode_to_vec(MonoPcm(interleaved), &mut out)
        } else {
            self.encoder.encode_to_vec(InterleavedPcm(interleaved), &mut out)
        };
        result.map_err(|e| EncoderError::EncodeFailed(format!("{:?}", e)))?;

        Ok(out)
    }

    fn flush(&mut self) -> Result<Vec<u8>, EncoderError> {
        if self.flushed {
            return Err(EncoderError::AlreadyFlushed);
        }

        let mut out = Vec::with_capacity(FLUSH_BUFFER_SIZE);
        self.encoder
            .flush_to_vec::<FlushNoGap>(&mut out)
            .map_err(|e| EncoderError::FlushFailed(format!("{:?}", e)))?;
        self.flushed = true;

        debug!(bytes = out.len(), "LAME encoder flushed");
        Ok(out)
    }

    fn close(self) {
        debug!(flushed = self.flushed, "LAME encoder closed");
    }
}
