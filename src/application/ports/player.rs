//! Audio playback port interfaces

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::domain::clip::AudioEncoding;

/// Playback errors
#[derive(Debug, Clone, Error)]
pub enum PlaybackError {
    #[error("No audio output device available: {0}")]
    DeviceUnavailable(String),

    #[error("Failed to read clip: {0}")]
    Source(String),

    #[error("Failed to decode clip: {0}")]
    Decode(String),

    #[error("Playback failed: {0}")]
    Output(String),

    #[error("No voice message with id {0}")]
    UnknownMessage(String),

    #[error("Could not play audio after {attempts} attempts. Try downloading it instead.")]
    Unplayable { attempts: usize },
}

/// The bytes behind a clip reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClipSource {
    File(PathBuf),
    Inline { mime: String, data: Arc<Vec<u8>> },
}

impl ClipSource {
    /// Load the full byte content
    pub fn read(&self) -> std::io::Result<Vec<u8>> {
        match self {
            Self::File(path) => std::fs::read(path),
            Self::Inline { data, .. } => Ok(data.as_ref().clone()),
        }
    }

    /// Encoding the source claims to be, from its MIME or extension
    pub fn declared_encoding(&self) -> Option<AudioEncoding> {
        match self {
            Self::File(path) => path
                .extension()
                .and_then(|e| e.to_str())
                .and_then(AudioEncoding::from_extension),
            Self::Inline { mime, .. } => mime.parse().ok(),
        }
    }
}

/// Port for constructing audio handles.
pub trait AudioBackend: Send + Sync {
    /// Create a handle for `source`. Only metadata is touched here; decoding
    /// happens on `play`. `hint` forces a specific decoder.
    fn load(
        &self,
        source: &ClipSource,
        hint: Option<AudioEncoding>,
    ) -> Result<Box<dyn AudioHandle>, PlaybackError>;
}

/// One playable clip.
pub trait AudioHandle: Send {
    fn play(&mut self) -> Result<(), PlaybackError>;

    fn pause(&mut self);

    /// Seek back to the start
    fn rewind(&mut self) -> Result<(), PlaybackError>;

    fn position(&self) -> Duration;

    /// Total length, when the container reports it
    fn duration(&self) -> Option<Duration>;

    /// Reached the natural end of the clip
    fn is_finished(&self) -> bool;

    /// Asynchronous decode/output failure observed since the last call
    fn take_error(&mut self) -> Option<PlaybackError> {
        None
    }
}
