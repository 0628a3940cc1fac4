//! Infrastructure layer - Adapter implementations
//!
//! Contains concrete implementations of the port interfaces: cpal capture,
//! rodio playback, the file-backed room log, downloads, alerts and the
//! config file.

pub mod config;
pub mod download;
pub mod notification;
pub mod playback;
pub mod recording;
pub mod room;

// Re-export adapters
pub use config::XdgConfigStore;
pub use download::FsDownloader;
pub use notification::{create_notifier, ConsoleNotifier, NotifyRustNotifier};
pub use playback::{DecoderCapabilities, RodioBackend};
pub use recording::{CpalCaptureDevice, NativeCapabilities};
pub use room::JsonlRoomLog;
