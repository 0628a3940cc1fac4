//! Append-only room log on the local filesystem
//!
//! Layout under the room directory:
//! - `messages.jsonl`: one JSON message per line, in delivery order
//! - `clips/<id>.<ext>`: clip bytes, unless clips are embedded as data URLs

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::application::ports::{ClipSource, MessageFeed, MessageSink, RoomError};
use crate::domain::clip::{decode_data_url, ClipRef, VoiceClip};
use crate::domain::message::{Message, MessageId, OutgoingMessage};

/// Message log file name
pub const LOG_FILE: &str = "messages.jsonl";

/// Clip directory name
pub const CLIPS_DIR: &str = "clips";

/// Room backed by a JSON-lines file.
///
/// Plays the server's part: assigns ids and timestamps on append.
pub struct JsonlRoomLog {
    dir: PathBuf,
    embed_clips: bool,
    sequence: AtomicU64,
    // serialises appends so timestamps stay ascending in file order
    append_lock: Mutex<u64>,
}

impl JsonlRoomLog {
    pub fn new(dir: impl Into<PathBuf>, embed_clips: bool) -> Self {
        Self {
            dir: dir.into(),
            embed_clips,
            sequence: AtomicU64::new(0),
            append_lock: Mutex::new(0),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn log_path(&self) -> PathBuf {
        self.dir.join(LOG_FILE)
    }

    fn now_ms() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }

    fn next_id(&self, timestamp_ms: u64) -> MessageId {
        let n = self.sequence.fetch_add(1, Ordering::SeqCst);
        MessageId::new(format!("{:x}-{:x}-{:x}", timestamp_ms, std::process::id(), n))
    }

    /// Timestamp of the last stored message, if any
    async fn last_timestamp(&self) -> Result<u64, RoomError> {
        Ok(self
            .messages()
            .await?
            .last()
            .map(|m| m.timestamp_ms)
            .unwrap_or(0))
    }

    /// Store clip bytes and return the reference written to the log
    async fn store_clip(&self, id: &MessageId, clip: &VoiceClip) -> Result<ClipRef, RoomError> {
        if self.embed_clips {
            return Ok(ClipRef::DataUrl(clip.to_data_url()));
        }

        let relative = PathBuf::from(CLIPS_DIR).join(format!(
            "{}.{}",
            id.as_str(),
            clip.encoding().extension()
        ));
        let target = self.dir.join(&relative);
        let tmp = target.with_extension("tmp");

        fs::create_dir_all(self.dir.join(CLIPS_DIR))
            .await
            .map_err(|e| RoomError::Write(e.to_string()))?;
        fs::write(&tmp, clip.data())
            .await
            .map_err(|e| RoomError::Write(e.to_string()))?;
        fs::rename(&tmp, &target)
            .await
            .map_err(|e| RoomError::Write(e.to_string()))?;

        debug!(path = %target.display(), bytes = clip.size_bytes(), "clip stored");
        Ok(ClipRef::Path(relative))
    }

    async fn append(&self, message: &Message) -> Result<(), RoomError> {
        let mut line =
            serde_json::to_string(message).map_err(|e| RoomError::Write(e.to_string()))?;
        line.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.log_path())
            .await
            .map_err(|e| RoomError::Write(e.to_string()))?;
        file.write_all(line.as_bytes())
            .await
            .map_err(|e| RoomError::Write(e.to_string()))?;
        file.flush()
            .await
            .map_err(|e| RoomError::Write(e.to_string()))
    }
}

#[async_trait]
impl MessageSink for JsonlRoomLog {
    async fn submit(&self, message: OutgoingMessage, author: &str) -> Result<Message, RoomError> {
        let mut last = self.append_lock.lock().await;

        fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| RoomError::Write(e.to_string()))?;

        let floor = (*last).max(self.last_timestamp().await?);
        let timestamp_ms = Self::now_ms().max(floor);
        let id = self.next_id(timestamp_ms);

        let clip = match message.clip() {
            Some(clip) => Some(self.store_clip(&id, clip).await?),
            None => None,
        };

        let stored = Message {
            id,
            text: message.text().to_string(),
            clip,
            duration_secs: message.duration_secs(),
            author: author.to_string(),
            timestamp_ms,
        };
        self.append(&stored).await?;
        *last = timestamp_ms;

        debug!(id = %stored.id, "message appended");
        Ok(stored)
    }
}

#[async_trait]
impl MessageFeed for JsonlRoomLog {
    async fn messages(&self) -> Result<Vec<Message>, RoomError> {
        let path = self.log_path();
        if !path.exists() {
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(&path)
            .await
            .map_err(|e| RoomError::Read(e.to_string()))?;

        let messages = content
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .filter_map(|(n, line)| match serde_json::from_str::<Message>(line) {
                Ok(message) => Some(message),
                Err(e) => {
                    warn!(line = n + 1, error = %e, "skipping malformed message");
                    None
                }
            })
            .collect();
        Ok(messages)
    }

    fn clip_source(&self, clip: &ClipRef) -> Result<ClipSource, RoomError> {
        match clip {
            ClipRef::Path(path) if path.is_absolute() => Ok(ClipSource::File(path.clone())),
            ClipRef::Path(path) => Ok(ClipSource::File(self.dir.join(path))),
            ClipRef::DataUrl(url) => {
                let inline = decode_data_url(url)?;
                Ok(ClipSource::Inline {
                    mime: inline.mime,
                    data: Arc::new(inline.data),
                })
            }
        }
    }
}
