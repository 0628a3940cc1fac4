//! Per-message playback state

use std::fmt;

/// Playback states for one voice message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PlaybackState {
    #[default]
    Unloaded,
    Ready,
    Playing,
    Error,
}

impl PlaybackState {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Unloaded => "unloaded",
            Self::Ready => "ready",
            Self::Playing => "playing",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Playback entry for a single clip reference.
///
/// State machine:
///   UNLOADED -> READY (loaded)
///   READY | ERROR -> PLAYING (started)
///   PLAYING -> READY (stopped: pause or natural end)
///   any -> ERROR (failed)
#[derive(Debug, Clone, Default)]
pub struct PlaybackEntry {
    state: PlaybackState,
    progress: f32,
    last_error: Option<String>,
}

impl PlaybackEntry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state == PlaybackState::Playing
    }

    /// Normalised position, 0..=100
    pub fn progress(&self) -> f32 {
        self.progress
    }

    /// Message shown to the user while in `Error`
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Audio handle constructed (metadata only)
    pub fn loaded(&mut self) {
        if self.state == PlaybackState::Unloaded {
            self.state = PlaybackState::Ready;
        }
    }

    /// Playback began; always from position 0
    pub fn started(&mut self) {
        self.state = PlaybackState::Playing;
        self.progress = 0.0;
        self.last_error = None;
    }

    /// Paused, superseded by another entry, or reached the end
    pub fn stopped(&mut self) {
        if self.state == PlaybackState::Playing {
            self.state = PlaybackState::Ready;
        }
        self.progress = 0.0;
    }

    pub fn failed(&mut self, message: impl Into<String>) {
        self.state = PlaybackState::Error;
        self.progress = 0.0;
        self.last_error = Some(message.into());
    }

    /// Record polled progress; ignored unless playing
    pub fn set_progress(&mut self, percent: f32) {
        if self.state == PlaybackState::Playing {
            self.progress = percent.clamp(0.0, 100.0);
        }
    }
}

/// `current / total` as a 0..=100 percentage. Unknown or zero totals yield 0.
pub fn progress_percent(current: std::time::Duration, total: Option<std::time::Duration>) -> f32 {
    match total {
        Some(total) if !total.is_zero() => {
            let pct = current.as_secs_f64() / total.as_secs_f64() * 100.0;
            pct.clamp(0.0, 100.0) as f32
        }
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn lifecycle() {
        let mut entry = PlaybackEntry::new();
        assert_eq!(entry.state(), PlaybackState::Unloaded);
        entry.loaded();
        assert_eq!(entry.state(), PlaybackState::Ready);
        entry.started();
        entry.set_progress(40.0);
        assert_eq!(entry.progress(), 40.0);
        entry.stopped();
        assert_eq!(entry.state(), PlaybackState::Ready);
        assert_eq!(entry.progress(), 0.0);
    }

    #[test]
    fn progress_ignored_when_not_playing() {
        let mut entry = PlaybackEntry::new();
        entry.loaded();
        entry.set_progress(50.0);
        assert_eq!(entry.progress(), 0.0);
    }

    #[test]
    fn progress_is_clamped() {
        let mut entry = PlaybackEntry::new();
        entry.started();
        entry.set_progress(140.0);
        assert_eq!(entry.progress(), 100.0);
    }

    #[test]
    fn error_then_retry() {
        let mut entry = PlaybackEntry::new();
        entry.loaded();
        entry.failed("boom");
        assert_eq!(entry.state(), PlaybackState::Error);
        assert_eq!(entry.last_error(), Some("boom"));
        entry.started();
        assert!(entry.is_playing());
        assert!(entry.last_error().is_none());
    }

    #[test]
    fn percent_math() {
        let total = Some(Duration::from_secs(10));
        assert_eq!(progress_percent(Duration::from_secs(5), total), 50.0);
        assert_eq!(progress_percent(Duration::from_secs(12), total), 100.0);
        assert_eq!(progress_percent(Duration::from_secs(1), None), 0.0);
        assert_eq!(progress_percent(Duration::from_secs(1), Some(Duration::ZERO)), 0.0);
    }
}
