//! Domain error types

use thiserror::Error;

/// Error when parsing a duration string
#[derive(Debug, Clone, Error)]
#[error("Invalid duration format: \"{input}\". Expected format: <number>s, <number>m, or <number>m<number>s (e.g., 30s, 1m, 2m30s)")]
pub struct DurationParseError {
    pub input: String,
}

/// Error when an unknown audio encoding is named
#[derive(Debug, Clone, Error)]
#[error("Unknown audio encoding: \"{input}\". Known encodings: audio/webm;codecs=opus, audio/webm, audio/mp3, audio/mp4, audio/ogg;codecs=opus, audio/ogg, audio/flac, audio/wav")]
pub struct InvalidEncodingError {
    pub input: String,
}

/// Error when a message carries neither text nor a voice clip
#[derive(Debug, Clone, Error)]
#[error("Message is empty: type some text or record a voice message")]
pub struct EmptyMessageError;

/// Error when a clip reference cannot be understood
#[derive(Debug, Clone, Error)]
pub enum ClipRefError {
    #[error("Empty clip reference")]
    Empty,

    #[error("Malformed data URL: {0}")]
    MalformedDataUrl(String),
}

/// Error when configuration fails
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(String),

    #[error("Failed to parse config file: {0}")]
    ParseError(String),

    #[error("Failed to write config file: {0}")]
    WriteError(String),

    #[error("Invalid config value for '{key}': {message}")]
    ValidationError { key: String, message: String },

    #[error("Config file already exists at: {0}")]
    AlreadyExists(String),
}
