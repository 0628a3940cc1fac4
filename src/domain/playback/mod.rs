//! Playback state for received voice messages

mod entry;

pub use entry::{progress_percent, PlaybackEntry, PlaybackState};
