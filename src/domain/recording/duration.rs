//! Duration value object

use std::fmt;
use std::str::FromStr;
use std::time::Duration as StdDuration;

use crate::domain::error::DurationParseError;

/// Default auto-stop limit for a single voice message (5 minutes)
pub const DEFAULT_MAX_DURATION_SECS: u64 = 300;

/// Value object representing a time duration.
/// Immutable and validated on creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Duration {
    milliseconds: u64,
}

impl Duration {
    pub const ZERO: Duration = Duration::from_millis(0);

    /// Create a Duration from milliseconds
    pub const fn from_millis(ms: u64) -> Self {
        Self { milliseconds: ms }
    }

    /// Create a Duration from seconds
    pub const fn from_secs(secs: u64) -> Self {
        Self {
            milliseconds: secs * 1000,
        }
    }

    /// Default auto-stop limit for recordings
    pub const fn default_max_duration() -> Self {
        Self::from_secs(DEFAULT_MAX_DURATION_SECS)
    }

    /// Whole seconds, rounded down (what the live counter shows)
    pub const fn as_secs(&self) -> u64 {
        self.milliseconds / 1000
    }

    /// Whole seconds, rounded up; a started second counts
    pub const fn as_secs_ceil(&self) -> u64 {
        self.milliseconds.div_ceil(1000)
    }

    pub const fn as_millis(&self) -> u64 {
        self.milliseconds
    }

    pub const fn as_std(&self) -> StdDuration {
        StdDuration::from_millis(self.milliseconds)
    }

    /// Render as `M:SS`, the way message durations are shown in the room
    pub fn clock(&self) -> String {
        format_clock(self.as_secs())
    }
}

/// Format whole seconds as `M:SS`
pub fn format_clock(seconds: u64) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

impl From<StdDuration> for Duration {
    fn from(d: StdDuration) -> Self {
        Self::from_millis(d.as_millis().min(u64::MAX as u128) as u64)
    }
}

impl FromStr for Duration {
    type Err = DurationParseError;

    /// Parse a duration string into a Duration value object.
    /// Supported formats: "30s", "1m", "2m30s", "90s"
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let input = s.trim().to_lowercase();
        let invalid = || DurationParseError {
            input: s.to_string(),
        };

        let mut minutes: u64 = 0;
        let mut seconds: u64 = 0;
        let mut current_num = String::new();
        let mut found_any = false;

        for ch in input.chars() {
            if ch.is_ascii_digit() {
                current_num.push(ch);
            } else if ch == 'm' && !current_num.is_empty() {
                minutes = current_num.parse().map_err(|_| invalid())?;
                current_num.clear();
                found_any = true;
            } else if ch == 's' && !current_num.is_empty() {
                seconds = current_num.parse().map_err(|_| invalid())?;
                current_num.clear();
                found_any = true;
            } else {
                return Err(invalid());
            }
        }

        if !current_num.is_empty() || !found_any {
            return Err(invalid());
        }

        let total_ms = minutes
            .checked_mul(60)
            .and_then(|m| m.checked_add(seconds))
            .and_then(|s| s.checked_mul(1000))
            .ok_or_else(invalid)?;

        if total_ms == 0 {
            return Err(invalid());
        }

        Ok(Self {
            milliseconds: total_ms,
        })
    }
}

impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let total_secs = self.as_secs();
        let minutes = total_secs / 60;
        let seconds = total_secs % 60;

        if minutes == 0 {
            write!(f, "{}s", seconds)
        } else if seconds == 0 {
            write!(f, "{}m", minutes)
        } else {
            write!(f, "{}m{}s", minutes, seconds)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_minutes_and_seconds() {
        let d: Duration = "2m30s".parse().unwrap();
        assert_eq!(d.as_secs(), 150);
    }

    #[test]
    fn parse_case_insensitive_with_whitespace() {
        let d: Duration = "  1M30S ".parse().unwrap();
        assert_eq!(d.as_secs(), 90);
    }

    #[test]
    fn parse_invalid() {
        assert!("".parse::<Duration>().is_err());
        assert!("0s".parse::<Duration>().is_err());
        assert!("30".parse::<Duration>().is_err());
        assert!("30x".parse::<Duration>().is_err());
        assert!("99999999999999999999m".parse::<Duration>().is_err());
    }

    #[test]
    fn display_round_trips_common_forms() {
        assert_eq!(Duration::from_secs(30).to_string(), "30s");
        assert_eq!(Duration::from_secs(120).to_string(), "2m");
        assert_eq!(Duration::from_secs(150).to_string(), "2m30s");
    }

    #[test]
    fn clock_pads_seconds() {
        assert_eq!(Duration::from_secs(5).clock(), "0:05");
        assert_eq!(Duration::from_secs(150).clock(), "2:30");
        assert_eq!(Duration::from_millis(61_999).clock(), "1:01");
        assert_eq!(format_clock(600), "10:00");
    }

    #[test]
    fn ceil_counts_started_second() {
        assert_eq!(Duration::from_millis(0).as_secs_ceil(), 0);
        assert_eq!(Duration::from_millis(1).as_secs_ceil(), 1);
        assert_eq!(Duration::from_millis(2000).as_secs_ceil(), 2);
        assert_eq!(Duration::from_millis(2001).as_secs_ceil(), 3);
    }

    #[test]
    fn default_max_is_five_minutes() {
        assert_eq!(Duration::default_max_duration().as_secs(), 300);
    }
}
