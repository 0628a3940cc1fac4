//! Terminal alert adapter

use async_trait::async_trait;
use colored::Colorize;

use crate::application::ports::{AlertLevel, NotificationError, Notifier};

/// Prints alerts to stderr. Used when desktop notifications are off.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleNotifier;

impl ConsoleNotifier {
    pub fn new() -> Self {
        Self
    }

    fn render(title: &str, message: &str, level: AlertLevel) -> String {
        let title = match level {
            AlertLevel::Info => title.cyan(),
            AlertLevel::Warning => title.yellow(),
            AlertLevel::Error => title.red(),
        };
        format!("{}: {}", title.bold(), message)
    }
}

#[async_trait]
impl Notifier for ConsoleNotifier {
    async fn notify(
        &self,
        title: &str,
        message: &str,
        level: AlertLevel,
    ) -> Result<(), NotificationError> {
        eprintln!("{}", Self::render(title, message, level));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_contains_title_and_message() {
        colored::control::set_override(false);
        let line = ConsoleNotifier::render("Playback", "Could not play audio.", AlertLevel::Error);
        assert_eq!(line, "Playback: Could not play audio.");
    }

    #[tokio::test]
    async fn notify_never_fails() {
        let notifier = ConsoleNotifier::new();
        assert!(notifier.notify("t", "m", AlertLevel::Info).await.is_ok());
    }
}
