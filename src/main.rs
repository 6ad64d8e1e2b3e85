//! mp3-recorder CLI entry point

use std::process::ExitCode;

use clap::Parser;

use mp3_recorder::cli::{
    app::{load_merged_config, run_record, EXIT_ERROR, EXIT_USAGE_ERROR},
    args::{Cli, Commands},
    config_cmd::handle_config_command,
    logging::init_logging,
    presenter::Presenter,
    RecordOptions,
};
use mp3_recorder::domain::config::AppConfig;
use mp3_recorder::domain::recording::Duration;
use mp3_recorder::infrastructure::XdgConfigStore;

#[tokio::main(flavor = "multi_thread", worker_threads = 2)]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let presenter = Presenter::new();

    if let Some(Commands::Config { action }) = cli.command {
        let store = XdgConfigStore::new();
        if let Err(e) = handle_config_command(action, &store, &presenter).await {
            presenter.error(&e.to_string());
            return ExitCode::from(EXIT_ERROR);
        }
        return ExitCode::SUCCESS;
    }

    let cli_config = AppConfig {
        duration: cli.duration.clone(),
        output: cli.output.clone(),
        bitrate: cli.bitrate,
        quality: cli.quality,
        buffer_count: None,
        buffer_size: None,
    };
    let config = load_merged_config(cli_config).await;

    let duration = match config.duration.as_ref() {
        Some(s) => match s.parse::<Duration>() {
            Ok(d) => d,
            Err(e) => {
                presenter.error(&format!("Invalid duration: {}", e));
                return ExitCode::from(EXIT_USAGE_ERROR);
            }
        },
        None => Duration::default_duration(),
    };

    let layout = match config.buffer_layout_or_default() {
        Ok(layout) => layout,
        Err(e) => {
            presenter.error(&e.to_string());
            return ExitCode::from(EXIT_USAGE_ERROR);
        }
    };

    let options = RecordOptions {
        duration,
        output: config.output_or_default(),
        bitrate: config.bitrate_or_default(),
        quality: config.quality_or_default(),
        layout,
    };

    run_record(options).await
}
