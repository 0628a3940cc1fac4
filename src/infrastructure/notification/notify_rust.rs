//! Desktop alerts through notify-rust
//!
//! Room alerts map onto the desktop's own severity scale: errors such as a
//! refused microphone stay up until dismissed, playback warnings use the
//! server default, and info notices fade quickly.

use async_trait::async_trait;
use notify_rust::{Notification, Timeout};

use crate::application::ports::{AlertLevel, NotificationError, Notifier};

const APP_NAME: &str = "Voxroom";

/// How long an info notice stays on screen
const INFO_TIMEOUT_MS: u32 = 4_000;

/// Display lifetime for an alert level
fn timeout_for(level: AlertLevel) -> Timeout {
    match level {
        AlertLevel::Info => Timeout::Milliseconds(INFO_TIMEOUT_MS),
        AlertLevel::Warning => Timeout::Default,
        AlertLevel::Error => Timeout::Never,
    }
}

#[cfg(not(target_os = "macos"))]
fn urgency_for(level: AlertLevel) -> notify_rust::Urgency {
    use notify_rust::Urgency;
    match level {
        AlertLevel::Info => Urgency::Low,
        AlertLevel::Warning => Urgency::Normal,
        AlertLevel::Error => Urgency::Critical,
    }
}

/// Build the desktop notification for one room alert
fn build(title: &str, message: &str, level: AlertLevel) -> Notification {
    let mut notification = Notification::new();
    notification
        .appname(APP_NAME)
        .summary(title)
        .body(message)
        .icon(level.icon_name())
        .timeout(timeout_for(level));
    #[cfg(not(target_os = "macos"))]
    notification.urgency(urgency_for(level));
    notification
}

/// Desktop notifier
#[derive(Debug, Default)]
pub struct NotifyRustNotifier;

impl NotifyRustNotifier {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Notifier for NotifyRustNotifier {
    async fn notify(
        &self,
        title: &str,
        message: &str,
        level: AlertLevel,
    ) -> Result<(), NotificationError> {
        let notification = build(title, message, level);

        // showing can block on the session bus
        tokio::task::spawn_blocking(move || {
            notification
                .show()
                .map(|_| ())
                .map_err(|e| NotificationError::SendFailed(e.to_string()))
        })
        .await
        .map_err(|e| NotificationError::SendFailed(format!("Task join error: {}", e)))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_stay_until_dismissed() {
        assert_eq!(timeout_for(AlertLevel::Error), Timeout::Never);
        assert_eq!(
            timeout_for(AlertLevel::Info),
            Timeout::Milliseconds(INFO_TIMEOUT_MS)
        );
        assert_eq!(timeout_for(AlertLevel::Warning), Timeout::Default);
    }

    #[cfg(not(target_os = "macos"))]
    #[test]
    fn urgency_follows_level() {
        use notify_rust::Urgency;
        assert_eq!(urgency_for(AlertLevel::Info), Urgency::Low);
        assert_eq!(urgency_for(AlertLevel::Warning), Urgency::Normal);
        assert_eq!(urgency_for(AlertLevel::Error), Urgency::Critical);
    }

    #[test]
    fn notification_carries_room_alert() {
        let n = build("Playback", "Could not play audio", AlertLevel::Warning);
        assert_eq!(n.appname, APP_NAME);
        assert_eq!(n.summary, "Playback");
        assert_eq!(n.body, "Could not play audio");
        assert_eq!(n.icon, "dialog-warning");
    }
}
