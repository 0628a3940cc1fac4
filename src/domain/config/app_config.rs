//! Application configuration value object

use serde::{Deserialize, Serialize};

use crate::domain::clip::AudioEncoding;
use crate::domain::recording::Duration;

/// Default delay before the lock affordance appears
pub const DEFAULT_LOCK_DELAY_MS: u64 = 1000;
/// Default recording counter tick
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 1000;
/// Default visualizer refresh
pub const DEFAULT_VISUALIZER_INTERVAL_MS: u64 = 100;
/// Default playback progress poll
pub const DEFAULT_PROGRESS_INTERVAL_MS: u64 = 100;

/// Timer settings for the recorder and the player.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TimingConfig {
    pub lock_delay_ms: Option<u64>,
    pub tick_interval_ms: Option<u64>,
    pub visualizer_interval_ms: Option<u64>,
    pub progress_interval_ms: Option<u64>,
}

/// Application configuration.
/// All fields are optional to support partial configs and merging.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    pub author: Option<String>,
    pub room_dir: Option<String>,
    pub download_dir: Option<String>,
    pub recording_formats: Option<Vec<String>>,
    pub max_duration: Option<String>,
    pub embed_clips: Option<bool>,
    pub notify: Option<bool>,
    pub timings: Option<TimingConfig>,
}

impl AppConfig {
    /// Create config with default values
    pub fn defaults() -> Self {
        Self {
            author: Some("User".to_string()),
            room_dir: None,
            download_dir: None,
            recording_formats: None,
            max_duration: Some("5m".to_string()),
            embed_clips: Some(false),
            notify: Some(false),
            timings: Some(TimingConfig {
                lock_delay_ms: Some(DEFAULT_LOCK_DELAY_MS),
                tick_interval_ms: Some(DEFAULT_TICK_INTERVAL_MS),
                visualizer_interval_ms: Some(DEFAULT_VISUALIZER_INTERVAL_MS),
                progress_interval_ms: Some(DEFAULT_PROGRESS_INTERVAL_MS),
            }),
        }
    }

    /// Create an empty config (all None)
    pub fn empty() -> Self {
        Self::default()
    }

    /// Merge this config with another, where other takes precedence.
    /// Only non-None values from other will override this.
    pub fn merge(self, other: Self) -> Self {
        Self {
            author: other.author.or(self.author),
            room_dir: other.room_dir.or(self.room_dir),
            download_dir: other.download_dir.or(self.download_dir),
            recording_formats: other.recording_formats.or(self.recording_formats),
            max_duration: other.max_duration.or(self.max_duration),
            embed_clips: other.embed_clips.or(self.embed_clips),
            notify: other.notify.or(self.notify),
            timings: Self::merge_timings(self.timings, other.timings),
        }
    }

    fn merge_timings(
        base: Option<TimingConfig>,
        other: Option<TimingConfig>,
    ) -> Option<TimingConfig> {
        match (base, other) {
            (None, None) => None,
            (Some(b), None) => Some(b),
            (None, Some(o)) => Some(o),
            (Some(b), Some(o)) => Some(TimingConfig {
                lock_delay_ms: o.lock_delay_ms.or(b.lock_delay_ms),
                tick_interval_ms: o.tick_interval_ms.or(b.tick_interval_ms),
                visualizer_interval_ms: o.visualizer_interval_ms.or(b.visualizer_interval_ms),
                progress_interval_ms: o.progress_interval_ms.or(b.progress_interval_ms),
            }),
        }
    }

    pub fn author_or_default(&self) -> &str {
        self.author
            .as_deref()
            .filter(|a| !a.trim().is_empty())
            .unwrap_or("User")
    }

    /// Get max_duration as parsed Duration, or default if not set/invalid
    pub fn max_duration_or_default(&self) -> Duration {
        self.max_duration
            .as_ref()
            .and_then(|s| s.parse().ok())
            .unwrap_or_else(Duration::default_max_duration)
    }

    /// Configured recording candidates in priority order.
    /// Unknown entries are skipped; `None` when nothing usable is configured.
    pub fn recording_formats(&self) -> Option<Vec<AudioEncoding>> {
        let parsed: Vec<AudioEncoding> = self
            .recording_formats
            .as_ref()?
            .iter()
            .filter_map(|s| s.parse().ok())
            .collect();
        (!parsed.is_empty()).then_some(parsed)
    }

    pub fn embed_clips_or_default(&self) -> bool {
        self.embed_clips.unwrap_or(false)
    }

    pub fn notify_or_default(&self) -> bool {
        self.notify.unwrap_or(false)
    }

    fn timing(&self, pick: impl Fn(&TimingConfig) -> Option<u64>, default: u64) -> Duration {
        let ms = self
            .timings
            .as_ref()
            .and_then(pick)
            .filter(|&ms| ms > 0)
            .unwrap_or(default);
        Duration::from_millis(ms)
    }

    pub fn lock_delay_or_default(&self) -> Duration {
        self.timing(|t| t.lock_delay_ms, DEFAULT_LOCK_DELAY_MS)
    }

    pub fn tick_interval_or_default(&self) -> Duration {
        self.timing(|t| t.tick_interval_ms, DEFAULT_TICK_INTERVAL_MS)
    }

    pub fn visualizer_interval_or_default(&self) -> Duration {
        self.timing(|t| t.visualizer_interval_ms, DEFAULT_VISUALIZER_INTERVAL_MS)
    }

    pub fn progress_interval_or_default(&self) -> Duration {
        self.timing(|t| t.progress_interval_ms, DEFAULT_PROGRESS_INTERVAL_MS)
    }
}
