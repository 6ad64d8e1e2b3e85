//! Live capture from the default input device using cpal
//!
//! The cpal stream is not `Send`, so the source must be opened, driven and
//! disposed on one thread (the CLI runs the whole recording in `spawn_blocking`).

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{BufferSize, SampleFormat, SampleRate, Stream, StreamConfig};
use tracing::{debug, info, warn};

use super::queue::{CaptureQueue, SampleWriter};
use crate::application::ports::{BufferCallback, CaptureDevice, CaptureError, CaptureSource};
use crate::domain::recording::{BufferLayout, PcmFormat, PoolStats};

fn f32_to_i16(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * 32767.0) as i16
}

/// Default host, default input device
#[derive(Debug, Default, Clone, Copy)]
pub struct CpalCaptureDevice;

impl CpalCaptureDevice {
    pub fn new() -> Self {
        Self
    }

    fn input_device() -> Result<cpal::Device, CaptureError> {
        cpal::default_host()
            .default_input_device()
            .ok_or_else(|| CaptureError::DeviceUnavailable("no default input device".to_string()))
    }

    fn build_stream(
        device: &cpal::Device,
        config: &StreamConfig,
        sample_format: SampleFormat,
        writer: SampleWriter,
    ) -> Result<Stream, CaptureError> {
        let on_error = |err: cpal::StreamError| warn!(error = %err, "Audio stream error");

        let stream = match sample_format {
            SampleFormat::I16 => device.build_input_stream(
                config,
                move |data: &[i16], _: &cpal::InputCallbackInfo| writer.push(data),
                on_error,
                None,
            ),
            SampleFormat::F32 => {
                let mut converted = Vec::new();
                device.build_input_stream(
                    config,
                    move |data: &[f32], _: &cpal::InputCallbackInfo| {
                        converted.clear();
                        converted.extend(data.iter().copied().map(f32_to_i16));
                        writer.push(&converted);
                    },
                    on_error,
                    None,
                )
            }
            other => {
                return Err(CaptureError::DeviceUnavailable(format!(
                    "unsupported sample format {:?}",
                    other
                )))
            }
        };

        stream.map_err(|e| CaptureError::DeviceUnavailable(e.to_string()))
    }
}

impl CaptureDevice for CpalCaptureDevice {
    type Source = CpalCaptureSource;

    fn open(
        &self,
        format: PcmFormat,
        layout: BufferLayout,
        on_buffer: BufferCallback,
    ) -> Result<CpalCaptureSource, CaptureError> {
        let device = Self::input_device()?;
        let name = device.name().unwrap_or_else(|_| "unknown".to_string());
        let sample_format = device
            .default_input_config()
            .map_err(|e| CaptureError::DeviceUnavailable(e.to_string()))?
            .sample_format();

        let config = StreamConfig {
            channels: format.channels,
            sample_rate: SampleRate(format.sample_rate),
            buffer_size: BufferSize::Default,
        };

        let queue = CaptureQueue::spawn(format, layout, on_buffer)?;
        let stream = Self::build_stream(&device, &config, sample_format, queue.writer())?;
        // Some hosts start streams on creation; keep it primed but silent until start()
        if let Err(e) = stream.pause() {
            debug!(error = %e, "Stream could not be paused after creation");
        }

        info!(
            device = %name,
            sample_rate = format.sample_rate,
            channels = format.channels,
            sample_format = ?sample_format,
            "Capture device opened"
        );

        Ok(CpalCaptureSource {
            stream: Some(stream),
            queue,
            stopped: false,
        })
    }
}

/// Primed cpal input stream feeding a [`CaptureQueue`]
pub struct CpalCaptureSource {
    stream: Option<Stream>,
    queue: CaptureQueue,
    stopped: bool,
}

impl CaptureSource for CpalCaptureSource {
    fn start(&mut self) -> Result<(), CaptureError> {
        let stream = self
            .stream
            .as_ref()
            .ok_or_else(|| CaptureError::StartFailed("capture already stopped".to_string()))?;
        stream
            .play()
            .map_err(|e| CaptureError::StartFailed(e.to_string()))?;
        debug!("Capture started");
        Ok(())
    }

    fn stop(&mut self) -> Result<PoolStats, CaptureError> {
        if let Some(stream) = self.stream.take() {
            if let Err(e) = stream.pause() {
                debug!(error = %e, "Stream could not be paused before release");
            }
            // Dropping the stream ends device callbacks
            drop(stream);
        }
        // The stream is gone even when the drain fails
        let drained = self.queue.drain();
        self.stopped = true;
        let stats = drained?;
        debug!(filled = stats.filled, overrun = stats.overrun_samples, "Capture stopped");
        Ok(stats)
    }

    fn dispose(self) -> Result<(), CaptureError> {
        if !self.stopped {
            return Err(CaptureError::NotStopped);
        }
        debug!("Capture resources released");
        Ok(())
    }

    fn stats(&self) -> PoolStats {
        self.queue.stats()
    }
}
