//! Port interfaces (traits) for external systems
//!
//! These traits define the boundaries between the application
//! and infrastructure layers.

pub mod capability;
pub mod capture;
pub mod config;
pub mod downloader;
pub mod notifier;
pub mod player;
pub mod room;

// Re-export common types
pub use capability::{CapabilityOracle, ProbeError};
pub use capture::{CaptureDevice, CaptureError, CaptureStream, ChunkSender};
pub use config::ConfigStore;
pub use downloader::ClipDownloader;
pub use notifier::{AlertLevel, NotificationError, Notifier};
pub use player::{AudioBackend, AudioHandle, ClipSource, PlaybackError};
pub use room::{MessageFeed, MessageSink, RoomError};
