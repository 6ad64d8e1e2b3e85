//! Main app runner for recording mode

use std::process::ExitCode;
use std::sync::Arc;

use tracing::warn;

use crate::application::ports::{ConfigStore, EncoderSettings};
use crate::application::{RecordCallbacks, RecordError, RecordInput, RecordingPipeline};
use crate::domain::config::AppConfig;
use crate::domain::recording::{PcmFormat, PoolStats};
use crate::infrastructure::{CpalCaptureDevice, FileSink, LameEncoder, XdgConfigStore};

use super::args::RecordOptions;
use super::presenter::Presenter;

/// Exit codes
pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_ERROR: u8 = 1;
pub const EXIT_USAGE_ERROR: u8 = 2;

/// Record for the configured duration and write the MP3 file
pub async fn run_record(options: RecordOptions) -> ExitCode {
    let mut presenter = Presenter::new();

    let input = RecordInput {
        duration: options.duration,
        settings: EncoderSettings::new(PcmFormat::default(), options.bitrate, options.quality),
        layout: options.layout,
    };
    let sink = FileSink::new(&options.output);

    presenter.start_spinner("Opening audio device...");
    let callbacks = match presenter.spinner_handle() {
        Some(bar) => {
            let started = bar.clone();
            let stopped = bar.clone();
            RecordCallbacks {
                on_progress: Some(Arc::new(move |elapsed, total| {
                    bar.set_message(format!(
                        "Recording... {}",
                        Presenter::format_progress(elapsed, total)
                    ));
                })),
                on_capture_start: Some(Box::new(move || started.set_message("Recording..."))),
                on_capture_end: Some(Box::new(move |_: &PoolStats| {
                    stopped.set_message("Finishing...")
                })),
            }
        }
        None => RecordCallbacks::default(),
    };

    // cpal streams are not Send; the whole session stays on one blocking thread
    let result = tokio::task::spawn_blocking(move || {
        RecordingPipeline::new(CpalCaptureDevice::new()).execute::<LameEncoder, _>(
            sink,
            input,
            callbacks,
        )
    })
    .await;

    match result {
        Ok(Ok(output)) => {
            presenter.spinner_success(&format!("Recorded {}", options.duration));
            presenter.recording_summary(&output);
            ExitCode::from(EXIT_SUCCESS)
        }
        Ok(Err(e)) => {
            presenter.stop_spinner();
            presenter.error(&e.to_string());
            if let RecordError::CaptureInitFailed(_) = e {
                presenter.info("Check that a microphone is connected and not in use");
            }
            ExitCode::from(EXIT_ERROR)
        }
        Err(e) => {
            presenter.stop_spinner();
            presenter.error(&format!("Recording task failed: {}", e));
            ExitCode::from(EXIT_ERROR)
        }
    }
}

/// Load and merge configuration from file and CLI
pub async fn load_merged_config(cli_config: AppConfig) -> AppConfig {
    let store = XdgConfigStore::new();
    let file_config = store.load().await.unwrap_or_else(|e| {
        warn!(path = %store.path().display(), error = %e, "Ignoring unreadable config file");
        AppConfig::empty()
    });

    // Merge: defaults < file < cli
    AppConfig::defaults().merge(file_config).merge(cli_config)
}
