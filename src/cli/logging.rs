//! Diagnostic logging setup

use tracing::Level;

/// Log level for a `-v` count: warn, then info, then debug
pub fn level_for(verbosity: u8) -> Level {
    match verbosity {
        0 => Level::WARN,
        1 => Level::INFO,
        _ => Level::DEBUG,
    }
}

/// Install the global fmt subscriber writing to stderr.
///
/// Stdout stays reserved for command output.
pub fn init_logging(verbosity: u8) {
    let _ = tracing_subscriber::fmt()
        .with_max_level(level_for(verbosity))
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
