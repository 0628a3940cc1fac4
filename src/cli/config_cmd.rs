//! Config command handler

use crate::application::ports::ConfigStore;
use crate::domain::clip::AudioEncoding;
use crate::domain::config::{AppConfig, TimingConfig};
use crate::domain::error::ConfigError;
use crate::domain::recording::Duration;

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

fn check_key(key: &str) -> Result<(), ConfigError> {
    if is_valid_config_key(key) {
        return Ok(());
    }
    Err(ConfigError::ValidationError {
        key: key.to_string(),
        message: format!("Unknown key. Valid keys: {}", VALID_CONFIG_KEYS.join(", ")),
    })
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

/// Validate `value` for `key` and write it into `config`
fn apply_value(config: &mut AppConfig, key: &str, value: &str) -> Result<(), ConfigError> {
    let invalid = |message: String| ConfigError::ValidationError {
        key: key.to_string(),
        message,
    };

    match key {
        "author" => {
            if value.trim().is_empty() {
                return Err(invalid("Author must not be empty".to_string()));
            }
            config.author = Some(value.trim().to_string());
        }
        "room_dir" => config.room_dir = Some(value.to_string()),
        "download_dir" => config.download_dir = Some(value.to_string()),
        "recording_formats" => {
            let formats = parse_formats(value).map_err(invalid)?;
            config.recording_formats = Some(formats.iter().map(|f| f.to_string()).collect());
        }
        "max_duration" => {
            value
                .parse::<Duration>()
                .map_err(|e| invalid(e.to_string()))?;
            config.max_duration = Some(value.to_string());
        }
        "embed_clips" => {
            config.embed_clips = Some(
                parse_bool(value).map_err(|_| invalid("Value must be 'true' or 'false'".into()))?,
            )
        }
        "notify" => {
            config.notify = Some(
                parse_bool(value).map_err(|_| invalid("Value must be 'true' or 'false'".into()))?,
            )
        }
        timing if timing.starts_with("timings.") => {
            let ms: u64 = value
                .parse()
                .ok()
                .filter(|&ms| ms > 0)
                .ok_or_else(|| invalid("Value must be a positive number of milliseconds".into()))?;
            let timings = config.timings.get_or_insert_with(TimingConfig::default);
            match timing {
                "timings.lock_delay_ms" => timings.lock_delay_ms = Some(ms),
                "timings.tick_interval_ms" => timings.tick_interval_ms = Some(ms),
                "timings.visualizer_interval_ms" => timings.visualizer_interval_ms = Some(ms),
                "timings.progress_interval_ms" => timings.progress_interval_ms = Some(ms),
                _ => return Err(invalid("Unknown timing".to_string())),
            }
        }
        _ => return Err(invalid("Unknown key".to_string())),
    }
    Ok(())
}

/// Read the stored value for `key` as display text
fn read_value(config: &AppConfig, key: &str) -> Option<String> {
    let timings = config.timings.as_ref();
    match key {
        "author" => config.author.clone(),
        "room_dir" => config.room_dir.clone(),
        "download_dir" => config.download_dir.clone(),
        "recording_formats" => config.recording_formats.as_ref().map(|f| f.join(",")),
        "max_duration" => config.max_duration.clone(),
        "embed_clips" => config.embed_clips.map(|b| b.to_string()),
        "notify" => config.notify.map(|b| b.to_string()),
        "timings.lock_delay_ms" => timings.and_then(|t| t.lock_delay_ms).map(|v| v.to_string()),
        "timings.tick_interval_ms" => timings.and_then(|t| t.tick_interval_ms).map(|v| v.to_string()),
        "timings.visualizer_interval_ms" => timings
            .and_then(|t| t.visualizer_interval_ms)
            .map(|v| v.to_string()),
        "timings.progress_interval_ms" => timings
            .and_then(|t| t.progress_interval_ms)
            .map(|v| v.to_string()),
        _ => None,
    }
}

async fn handle_get<S: ConfigStore>(
    store: &S,
    presenter: &Presenter,
    key: &str,
) -> Result<(), ConfigError> {
    check_key(key)?;

    let config = store.load().await?;
    match read_value(&config, key) {
        Some(v) => presenter.output(&v),
        None => presenter.output(NOT_SET),
    }

    Ok(())
}

async fn handle_list<S: ConfigStore>(store: &S, presenter: &Presenter) -> Result<(), ConfigError> {
    let config = store.load().await?;

    for key in VALID_CONFIG_KEYS {
        let value = read_value(&config, key);
        presenter.key_value(key, value.as_deref().unwrap_or(NOT_SET));
    }

    Ok(())
}

fn handle_path<S: ConfigStore>(store: &S, presenter: &Presenter) -> Result<(), ConfigError> {
    presenter.output(&store.path().to_string_lossy());
    Ok(())
}

/// Parse a comma-separated MIME list; every entry must be known
fn parse_formats(value: &str) -> Result<Vec<AudioEncoding>, String> {
    let formats = value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<AudioEncoding>().map_err(|e| e.to_string()))
        .collect::<Result<Vec<_>, _>>()?;

    if formats.is_empty() {
        return Err("At least one MIME type is required".to_string());
    }
    Ok(formats)
}

/// Parse a boolean value
fn parse_bool(value: &str) -> Result<bool, ()> {
    match value.to_lowercase().as_str() {
        "true" | "yes" | "1" => Ok(true),
        "false" | "no" | "0" => Ok(false),
        _ => Err(()),
    }
}
