//! Room messages

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::clip::{ClipRef, VoiceClip};
use crate::domain::error::EmptyMessageError;
use crate::domain::recording::format_clock;

/// Identifier assigned by the room when a message is persisted
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(String);

impl MessageId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for MessageId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// A persisted message as delivered by the room, in delivery order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    #[serde(default)]
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clip: Option<ClipRef>,
    #[serde(default)]
    pub duration_secs: u64,
    pub author: String,
    /// Assigned by the room on append, milliseconds since the epoch
    pub timestamp_ms: u64,
}

impl Message {
    pub fn has_clip(&self) -> bool {
        self.clip.is_some()
    }

    /// `M:SS` label for the clip length
    pub fn duration_label(&self) -> String {
        format_clock(self.duration_secs)
    }
}

/// What the composer hands to the room: text, a voice clip, or both
#[derive(Debug, Clone, PartialEq)]
pub struct OutgoingMessage {
    text: String,
    clip: Option<VoiceClip>,
}

impl OutgoingMessage {
    /// Build a message; a blank text without a clip is rejected
    pub fn new(text: impl Into<String>, clip: Option<VoiceClip>) -> Result<Self, EmptyMessageError> {
        let text = text.into();
        if text.trim().is_empty() && clip.is_none() {
            return Err(EmptyMessageError);
        }
        Ok(Self { text, clip })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn clip(&self) -> Option<&VoiceClip> {
        self.clip.as_ref()
    }

    /// Clip length in whole seconds, 0 for text-only messages
    pub fn duration_secs(&self) -> u64 {
        self.clip.as_ref().map_or(0, VoiceClip::duration_secs)
    }

    pub fn into_parts(self) -> (String, Option<VoiceClip>) {
        (self.text, self.clip)
    }
}
