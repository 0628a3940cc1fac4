//! Ctrl+C handling for interactive commands

use tokio::sync::watch;

/// Shutdown signal shared by the record and play loops.
///
/// Once tripped it stays tripped; every `wait()` after that returns at once.
pub struct ShutdownSignal {
    tx: watch::Sender<bool>,
    rx: watch::Receiver<bool>,
}

impl ShutdownSignal {
    /// Create a new shutdown signal handler
    pub fn new() -> Self {
        let (tx, rx) = watch::channel(false);
        Self { tx, rx }
    }

    /// Check if shutdown was requested
    pub fn is_shutdown(&self) -> bool {
        *self.rx.borrow()
    }

    /// Request shutdown from code
    pub fn trigger(&self) {
        self.tx.send_replace(true);
    }

    /// Listen for Ctrl+C in the background
    pub fn setup(&self) {
        let tx = self.tx.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tx.send_replace(true);
            }
        });
    }

    /// Resolve once shutdown has been requested
    pub async fn wait(&self) {
        let mut rx = self.rx.clone();
        // the sender lives in self, so the channel cannot close under us
        let _ = rx.wait_for(|stop| *stop).await;
    }
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn shutdown_signal_default_is_false() {
        let signal = ShutdownSignal::new();
        assert!(!signal.is_shutdown());
    }

    #[tokio::test]
    async fn wait_returns_after_trigger() {
        let signal = ShutdownSignal::new();
        signal.trigger();
        assert!(signal.is_shutdown());
        tokio::time::timeout(Duration::from_secs(1), signal.wait())
            .await
            .expect("wait should resolve once triggered");
    }

    #[tokio::test(start_paused = true)]
    async fn wait_pends_until_triggered() {
        let signal = ShutdownSignal::new();
        let pending = tokio::time::timeout(Duration::from_millis(50), signal.wait()).await;
        assert!(pending.is_err());
    }
}
