//! Notification infrastructure module
//!
//! Desktop alerts via notify-rust, or plain terminal alerts.

mod console;
mod notify_rust;

pub use console::ConsoleNotifier;
pub use notify_rust::NotifyRustNotifier;

use crate::application::ports::Notifier;

/// Desktop notifier when enabled, terminal output otherwise
pub fn create_notifier(desktop: bool) -> Box<dyn Notifier> {
    if desktop {
        Box::new(NotifyRustNotifier::new())
    } else {
        Box::new(ConsoleNotifier::new())
    }
}
