//! User-visible alert port

use async_trait::async_trait;
use thiserror::Error;

/// Notification errors
#[derive(Debug, Clone, Error)]
pub enum NotificationError {
    #[error("Failed to show notification: {0}")]
    SendFailed(String),
}

/// Alert severity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertLevel {
    Info,
    Warning,
    Error,
}

impl AlertLevel {
    /// Get the freedesktop icon name
    pub const fn icon_name(&self) -> &'static str {
        match self {
            Self::Info => "dialog-information",
            Self::Warning => "dialog-warning",
            Self::Error => "dialog-error",
        }
    }
}

/// Port for dismissible alerts: permission problems, unplayable clips,
/// unsupported environments. Failing to show one is never fatal.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(
        &self,
        title: &str,
        message: &str,
        level: AlertLevel,
    ) -> Result<(), NotificationError>;
}

/// Blanket implementation for boxed notifier types
#[async_trait]
impl Notifier for Box<dyn Notifier> {
    async fn notify(
        &self,
        title: &str,
        message: &str,
        level: AlertLevel,
    ) -> Result<(), NotificationError> {
        self.as_ref().notify(title, message, level).await
    }
}
