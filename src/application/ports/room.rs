//! Message submission and delivery ports

use async_trait::async_trait;
use thiserror::Error;

use super::player::ClipSource;
use crate::domain::clip::ClipRef;
use crate::domain::error::{ClipRefError, EmptyMessageError};
use crate::domain::message::{Message, MessageId, OutgoingMessage};

/// Room errors
#[derive(Debug, Error)]
pub enum RoomError {
    #[error(transparent)]
    Empty(#[from] EmptyMessageError),

    #[error("Failed to store message: {0}")]
    Write(String),

    #[error("Failed to read messages: {0}")]
    Read(String),

    #[error("Invalid clip reference: {0}")]
    ClipRef(#[from] ClipRefError),

    #[error("No message with id {0}")]
    UnknownMessage(MessageId),

    #[error("Message {0} has no voice clip")]
    NoClip(MessageId),

    #[error("Download failed: {0}")]
    Download(String),
}

/// Port for handing finished messages to the room
#[async_trait]
pub trait MessageSink: Send + Sync {
    /// Persist and broadcast a message. The room assigns id and timestamp.
    async fn submit(&self, message: OutgoingMessage, author: &str) -> Result<Message, RoomError>;
}

/// Port for reading the room's messages
#[async_trait]
pub trait MessageFeed: Send + Sync {
    /// All messages in delivery order (ascending timestamp). Never re-sorted
    /// by the caller.
    async fn messages(&self) -> Result<Vec<Message>, RoomError>;

    /// Resolve a clip reference to its bytes
    fn clip_source(&self, clip: &ClipRef) -> Result<ClipSource, RoomError>;
}
