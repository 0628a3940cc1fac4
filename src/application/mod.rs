//! Application layer - Use cases and port interfaces
//!
//! Contains the recorder and playback controllers, format negotiation and
//! the room glue, plus the trait definitions for external systems.

pub mod negotiator;
pub mod playback;
pub mod ports;
pub mod recorder;
pub mod room;

// Re-export use cases
pub use negotiator::{negotiate, supported, PLAYBACK_FALLBACKS, RECORDING_CANDIDATES};
pub use playback::{PlaybackController, ProgressUpdate, UNPLAYABLE_MESSAGE};
pub use recorder::{
    GestureOutcome, RecorderController, RecorderError, RecorderTimings, ReleasePolicy,
};
pub use room::VoiceRoom;
