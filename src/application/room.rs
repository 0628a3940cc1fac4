//! Room glue: sending composed messages and fetching received clips

use std::path::PathBuf;

use tracing::{debug, info};

use super::ports::{ClipDownloader, ClipSource, MessageFeed, MessageSink, RoomError};
use crate::domain::clip::{suggested_file_name, AudioEncoding, ClipRef, VoiceClip};
use crate::domain::message::{Message, MessageId, OutgoingMessage};

/// Extension used when a clip's encoding cannot be determined
const FALLBACK_DOWNLOAD_ENCODING: AudioEncoding = AudioEncoding::Webm;

/// Send and receive voice messages through one room.
pub struct VoiceRoom<S, L>
where
    S: MessageSink + MessageFeed,
    L: ClipDownloader,
{
    store: S,
    downloader: L,
    author: String,
}

impl<S, L> VoiceRoom<S, L>
where
    S: MessageSink + MessageFeed,
    L: ClipDownloader,
{
    pub fn new(store: S, downloader: L, author: impl Into<String>) -> Self {
        Self {
            store,
            downloader,
            author: author.into(),
        }
    }

    pub fn author(&self) -> &str {
        &self.author
    }

    /// Submit text, a clip, or both. Empty text without a clip is rejected
    /// before anything reaches the room.
    pub async fn send(&self, text: &str, clip: Option<VoiceClip>) -> Result<Message, RoomError> {
        let outgoing = OutgoingMessage::new(text, clip)?;
        let message = self.store.submit(outgoing, &self.author).await?;
        info!(id = %message.id, has_clip = message.has_clip(), "message sent");
        Ok(message)
    }

    pub async fn send_text(&self, text: &str) -> Result<Message, RoomError> {
        self.send(text, None).await
    }

    pub async fn send_clip(&self, clip: VoiceClip, caption: &str) -> Result<Message, RoomError> {
        self.send(caption, Some(clip)).await
    }

    /// Messages in delivery order
    pub async fn messages(&self) -> Result<Vec<Message>, RoomError> {
        self.store.messages().await
    }

    pub async fn find(&self, id: &MessageId) -> Result<Message, RoomError> {
        self.messages()
            .await?
            .into_iter()
            .find(|m| &m.id == id)
            .ok_or_else(|| RoomError::UnknownMessage(id.clone()))
    }

    /// Bytes behind a message's clip
    pub async fn clip_source(&self, id: &MessageId) -> Result<ClipSource, RoomError> {
        let message = self.find(id).await?;
        let clip = message.clip.ok_or_else(|| RoomError::NoClip(id.clone()))?;
        self.store.clip_source(&clip)
    }

    /// Resolver for the playback controller
    pub fn resolver(&self) -> impl Fn(&ClipRef) -> Option<ClipSource> + '_ {
        move |clip| match self.store.clip_source(clip) {
            Ok(source) => Some(source),
            Err(e) => {
                debug!(error = %e, "clip could not be resolved");
                None
            }
        }
    }

    /// Save a message's clip as `voice-message-<timestamp>.<ext>`.
    ///
    /// Works whatever the clip's playback state, including after playback
    /// failed.
    pub async fn download(&self, id: &MessageId) -> Result<PathBuf, RoomError> {
        let message = self.find(id).await?;
        let clip = message
            .clip
            .as_ref()
            .ok_or_else(|| RoomError::NoClip(id.clone()))?;
        let source = self.store.clip_source(clip)?;

        let encoding = source
            .declared_encoding()
            .or_else(|| clip.declared_encoding())
            .unwrap_or(FALLBACK_DOWNLOAD_ENCODING);
        let name = suggested_file_name(message.timestamp_ms, encoding);

        let path = self.downloader.save(&source, &name).await?;
        info!(%id, path = %path.display(), "clip downloaded");
        Ok(path)
    }
}
