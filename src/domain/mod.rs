//! Domain layer - Core business logic
//!
//! Contains value objects, state machines, and domain errors.
//! This layer has no dependencies on external systems.

pub mod clip;
pub mod config;
pub mod error;
pub mod message;
pub mod playback;
pub mod recording;
pub mod visualizer;

// Re-export common types
pub use clip::{AudioEncoding, ClipRef, VoiceClip};
pub use config::AppConfig;
pub use error::*;
pub use message::{Message, MessageId, OutgoingMessage};
pub use playback::{PlaybackEntry, PlaybackState};
pub use recording::{ChunkBuffer, Duration, RecorderSession, RecorderState};
