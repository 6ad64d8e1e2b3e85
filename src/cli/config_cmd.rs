//! Config command handler

use std::fmt::Display;
use std::str::FromStr;

use crate::application::ports::encoder::{MAX_QUALITY, SUPPORTED_BITRATES_KBPS};
use crate::application::ports::ConfigStore;
use crate::domain::config::AppConfig;
use crate::domain::error::ConfigError;
use crate::domain::recording::{BufferLayout, Duration, PcmFormat};

use super::args::{is_valid_config_key, ConfigAction, VALID_CONFIG_KEYS};
use super::presenter::Presenter;

const NOT_SET: &str = "(not set)";

/// Handle config subcommand
pub async fn handle_config_command<S: ConfigStore>(
    action: ConfigAction,
    store: &S,
    presenter: &Presenter,
) -> Result<(), ConfigError> {
    match action {
        ConfigAction::Init => handle_init(store, presenter).await,
        ConfigAction::Set { key, value } => handle_set(store, presenter, &key, &value).await,
        ConfigAction::Get { key } => handle_get(store, presenter, &key).await,
        ConfigAction::List => handle_list(store, presenter).await,
        ConfigAction::Path => handle_path(store, presenter),
    }
}

async fn handle_init<S: ConfigStore>(store: &S, presenter: &Presenter) -> Result<(), ConfigError> {
    store.init().await?;
    presenter.success(&format!(
        "Config file created at: {}",
        store.path().display()
    ));
    Ok(())
}

async fn handle_set<S: ConfigStore>(
    store: &S,
    presenter: &Presenter,
    key: &str,
    value: &str,
) -> Result<(), ConfigError> {
    check_key(key)?;

    let mut config = store.load().await?;
    apply_value(&mut config, key, value)?;
    store.save(&config).await?;

    presenter.success(&format!("{} = {}", key, value));
    Ok(())
}

async fn handle_get<S: ConfigStore>(
    store: &S,
    presenter: &Presenter,
    key: &str,
) -> Result<(), ConfigError> {
    check_key(key)?;

    let config = store.load().await?;
    let value = config_value(&config, key);
    presenter.output(value.as_deref().unwrap_or(NOT_SET));
    Ok(())
}

async fn handle_list<S: ConfigStore>(store: &S, presenter: &Presenter) -> Result<(), ConfigError> {
    let config = store.load().await?;

    for key in VALID_CONFIG_KEYS {
        let value = config_value(&config, key);
        presenter.key_value(key, value.as_deref().unwrap_or(NOT_SET));
    }
    Ok(())
}

fn handle_path<S: ConfigStore>(store: &S, presenter: &Presenter) -> Result<(), ConfigError> {
    presenter.output(&store.path().to_string_lossy());
    Ok(())
}

fn check_key(key: &str) -> Result<(), ConfigError> {
    if is_valid_config_key(key) {
        return Ok(());
    }
    Err(ConfigError::ValidationError {
        key: key.to_string(),
        message: format!("Unknown key. Valid keys: {}", VALID_CONFIG_KEYS.join(", ")),
    })
}

fn invalid(key: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::ValidationError {
        key: key.to_string(),
        message: message.into(),
    }
}

/// Parse a numeric config value
fn parse_number<T>(key: &str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    value
        .trim()
        .parse()
        .map_err(|e: T::Err| invalid(key, format!("'{}' is not a valid number: {}", value, e)))
}

/// Validate `value` for `key` and store it in `config`
fn apply_value(config: &mut AppConfig, key: &str, value: &str) -> Result<(), ConfigError> {
    match key {
        "duration" => {
            let duration = value
                .parse::<Duration>()
                .map_err(|e| invalid(key, e.to_string()))?;
            config.duration = Some(duration.to_string());
        }
        "output" => {
            if value.trim().is_empty() {
                return Err(invalid(key, "Output path must not be empty"));
            }
            config.output = Some(value.to_string());
        }
        "bitrate" => {
            let bitrate: u16 = parse_number(key, value)?;
            if !SUPPORTED_BITRATES_KBPS.contains(&bitrate) {
                let valid: Vec<String> =
                    SUPPORTED_BITRATES_KBPS.iter().map(|b| b.to_string()).collect();
                return Err(invalid(
                    key,
                    format!("Invalid bitrate {}. Valid: {}", bitrate, valid.join(", ")),
                ));
            }
            config.bitrate = Some(bitrate);
        }
        "quality" => {
            let quality: u8 = parse_number(key, value)?;
            if quality > MAX_QUALITY {
                return Err(invalid(
                    key,
                    format!("Quality must be between 0 and {}", MAX_QUALITY),
                ));
            }
            config.quality = Some(quality);
        }
        "buffer_count" => {
            let count: usize = parse_number(key, value)?;
            if count == 0 {
                return Err(invalid(key, "At least one buffer is required"));
            }
            config.buffer_count = Some(count);
        }
        "buffer_size" => {
            let size: usize = parse_number(key, value)?;
            let format = PcmFormat::default();
            if !BufferLayout::new(1, size).fits_frames(&format) {
                return Err(invalid(
                    key,
                    format!(
                        "Buffer size must be a non-zero multiple of {} bytes (one frame)",
                        format.bytes_per_frame()
                    ),
                ));
            }
            config.buffer_size = Some(size);
        }
        _ => return Err(invalid(key, "Unknown key")),
    }
    Ok(())
}

/// Stored value for `key`, rendered for display
fn config_value(config: &AppConfig, key: &str) -> Option<String> {
    match key {
        "duration" => config.duration.clone(),
        "output" => config.output.clone(),
        "bitrate" => config.bitrate.map(|b| b.to_string()),
        "quality" => config.quality.map(|q| q.to_string()),
        "buffer_count" => config.buffer_count.map(|c| c.to_string()),
        "buffer_size" => config.buffer_size.map(|s| s.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn apply(key: &str, value: &str) -> Result<AppConfig, ConfigError> {
        let mut config = AppConfig::empty();
        apply_value(&mut config, key, value)?;
        Ok(config)
    }

    #[test]
    fn duration_is_normalized() {
        let config = apply("duration", "90s").unwrap();
        assert_eq!(config.duration, Some("1m30s".to_string()));
    }

    #[test]
    fn duration_invalid() {
        assert!(apply("duration", "invalid").is_err());
        assert!(apply("duration", "0s").is_err());
    }

    #[test]
    fn bitrate_must_be_standard() {
        assert_eq!(apply("bitrate", "192").unwrap().bitrate, Some(192));
        let err = apply("bitrate", "129").unwrap_err();
        assert!(err.to_string().contains("Valid"));
        assert!(apply("bitrate", "loud").is_err());
    }

    #[test]
    fn quality_range() {
        assert_eq!(apply("quality", "0").unwrap().quality, Some(0));
        assert_eq!(apply("quality", "9").unwrap().quality, Some(9));
        assert!(apply("quality", "10").is_err());
        assert!(apply("quality", "-1").is_err());
    }

    #[test]
    fn buffer_layout_values() {
        assert_eq!(apply("buffer_count", "4").unwrap().buffer_count, Some(4));
        assert!(apply("buffer_count", "0").is_err());
        assert_eq!(apply("buffer_size", "8192").unwrap().buffer_size, Some(8192));
        assert!(apply("buffer_size", "1").is_err());
        assert!(apply("buffer_size", "0").is_err());
        let err = apply("buffer_size", "4098").unwrap_err();
        assert!(err.to_string().contains("multiple of 4"));
    }

    #[test]
    fn output_must_not_be_blank() {
        assert_eq!(
            apply("output", "take.mp3").unwrap().output,
            Some("take.mp3".to_string())
        );
        assert!(apply("output", "  ").is_err());
    }

    #[test]
    fn unknown_key_lists_valid_keys() {
        let err = check_key("api_key").unwrap_err();
        assert!(err.to_string().contains("buffer_count"));
    }

    #[test]
    fn config_value_renders_set_fields() {
        let config = AppConfig::defaults();
        assert_eq!(config_value(&config, "bitrate"), Some("128".to_string()));
        assert_eq!(config_value(&config, "duration"), Some("10s".to_string()));
        assert_eq!(config_value(&AppConfig::empty(), "quality"), None);
    }
}
