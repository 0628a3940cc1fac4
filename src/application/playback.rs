//! Voice message playback use case
//!
//! Keeps one playback entry per clip reference, enforces that at most one
//! clip plays at a time and runs a single progress poll while something is
//! playing.

use std::collections::HashMap;
use std::time::Duration as StdDuration;

use tokio::time::{interval, Interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use super::negotiator::PLAYBACK_FALLBACKS;
use super::ports::{AudioBackend, AudioHandle, ClipSource, PlaybackError};
use crate::domain::clip::{AudioEncoding, ClipRef};
use crate::domain::config::AppConfig;
use crate::domain::message::{Message, MessageId};
use crate::domain::playback::{progress_percent, PlaybackEntry};

/// Shown on an entry once every fallback has failed
pub const UNPLAYABLE_MESSAGE: &str = "Could not play audio. Try downloading it instead.";

/// One progress poll result
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressUpdate {
    pub id: MessageId,
    pub percent: f32,
    /// The clip reached its natural end on this poll
    pub finished: bool,
}

struct Slot {
    entry: PlaybackEntry,
    source: ClipSource,
    hint: Option<AudioEncoding>,
    handle: Option<Box<dyn AudioHandle>>,
    /// Fallback encodings already consumed by the current play attempt
    fallbacks_used: usize,
}

impl Slot {
    fn pause_and_rewind(&mut self) {
        if let Some(handle) = self.handle.as_mut() {
            handle.pause();
            if let Err(e) = handle.rewind() {
                debug!(error = %e, "rewind failed");
            }
        }
        self.entry.stopped();
    }
}

/// Playback controller.
///
/// Owns every audio handle it creates; dropping the controller pauses and
/// releases all of them.
pub struct PlaybackController<B: AudioBackend> {
    backend: B,
    slots: HashMap<MessageId, Slot>,
    playing: Option<MessageId>,
    // created on the first `next_tick` so `toggle` works without a runtime
    poll: Option<Interval>,
    polling: bool,
    fallbacks: Vec<AudioEncoding>,
    progress_interval: StdDuration,
}

impl<B: AudioBackend> PlaybackController<B> {
    pub fn new(backend: B, config: &AppConfig) -> Self {
        Self {
            backend,
            slots: HashMap::new(),
            playing: None,
            poll: None,
            polling: false,
            fallbacks: PLAYBACK_FALLBACKS.to_vec(),
            progress_interval: config.progress_interval_or_default().as_std(),
        }
    }

    /// Register entries for clip-bearing messages not seen before. Existing
    /// entries keep their state. `resolve` turns a reference into bytes.
    pub fn observe<F>(&mut self, messages: &[Message], resolve: F)
    where
        F: Fn(&ClipRef) -> Option<ClipSource>,
    {
        for message in messages {
            let Some(clip) = &message.clip else { continue };
            if self.slots.contains_key(&message.id) {
                continue;
            }
            let Some(source) = resolve(clip) else {
                warn!(id = %message.id, "clip reference could not be resolved");
                continue;
            };

            let hint = source.declared_encoding().or_else(|| clip.declared_encoding());
            let mut slot = Slot {
                entry: PlaybackEntry::new(),
                source,
                hint,
                handle: None,
                fallbacks_used: 0,
            };
            match self.backend.load(&slot.source, slot.hint) {
                Ok(handle) => {
                    slot.handle = Some(handle);
                    slot.entry.loaded();
                }
                Err(e) => {
                    // a later toggle retries with fallbacks
                    debug!(id = %message.id, error = %e, "clip metadata unavailable");
                }
            }
            self.slots.insert(message.id.clone(), slot);
        }
    }

    pub fn entry(&self, id: &MessageId) -> Option<&PlaybackEntry> {
        self.slots.get(id).map(|slot| &slot.entry)
    }

    /// The entry currently playing, if any
    pub fn playing(&self) -> Option<&MessageId> {
        self.playing.as_ref()
    }

    /// Total clip length, when known
    pub fn duration(&self, id: &MessageId) -> Option<StdDuration> {
        self.slots
            .get(id)
            .and_then(|slot| slot.handle.as_ref())
            .and_then(|handle| handle.duration())
    }

    /// Play `id` from the start, or pause it if it is already playing.
    ///
    /// Starting one entry pauses and rewinds any other. If the clip cannot be
    /// played as declared, each fallback encoding is tried once.
    pub fn toggle(&mut self, id: &MessageId) -> Result<(), PlaybackError> {
        if !self.slots.contains_key(id) {
            return Err(PlaybackError::UnknownMessage(id.to_string()));
        }

        if self.playing.as_ref() == Some(id) {
            if let Some(slot) = self.slots.get_mut(id) {
                if let Some(handle) = slot.handle.as_mut() {
                    handle.pause();
                }
                slot.entry.stopped();
            }
            self.playing = None;
            self.stop_poll();
            info!(%id, "playback paused");
            return Ok(());
        }

        if let Some(previous) = self.playing.take() {
            if let Some(slot) = self.slots.get_mut(&previous) {
                slot.pause_and_rewind();
                debug!(id = %previous, "superseded");
            }
        }

        if let Some(slot) = self.slots.get_mut(id) {
            slot.fallbacks_used = 0;
        }

        let first_attempt = self.start_current(id);
        if let Err(e) = first_attempt {
            warn!(%id, error = %e, "playback failed, trying fallback encodings");
            self.recover(id)?;
        }

        self.mark_playing(id);
        info!(%id, "playback started");
        Ok(())
    }

    fn mark_playing(&mut self, id: &MessageId) {
        if let Some(slot) = self.slots.get_mut(id) {
            slot.entry.started();
        }
        self.playing = Some(id.clone());
        self.start_poll();
    }

    fn start_current(&mut self, id: &MessageId) -> Result<(), PlaybackError> {
        let slot = self
            .slots
            .get_mut(id)
            .ok_or_else(|| PlaybackError::UnknownMessage(id.to_string()))?;

        if slot.handle.is_none() {
            slot.handle = Some(self.backend.load(&slot.source, slot.hint)?);
            slot.entry.loaded();
        }
        let handle = slot
            .handle
            .as_mut()
            .ok_or_else(|| PlaybackError::Source("handle missing".to_string()))?;
        handle.rewind()?;
        handle.play()
    }

    /// Retry with the fallback encodings not yet used by this play attempt;
    /// the first one that plays replaces the entry's handle.
    fn recover(&mut self, id: &MessageId) -> Result<(), PlaybackError> {
        let Some(slot) = self.slots.get_mut(id) else {
            return Err(PlaybackError::UnknownMessage(id.to_string()));
        };
        slot.handle = None;

        let mut attempts = 0;
        for &candidate in self.fallbacks.iter().skip(slot.fallbacks_used) {
            attempts += 1;
            slot.fallbacks_used += 1;
            let attempt = self
                .backend
                .load(&slot.source, Some(candidate))
                .and_then(|mut handle| handle.play().map(|()| handle));
            match attempt {
                Ok(handle) => {
                    info!(%id, encoding = candidate.as_str(), "recovered with fallback encoding");
                    slot.handle = Some(handle);
                    slot.hint = Some(candidate);
                    slot.entry.loaded();
                    return Ok(());
                }
                Err(e) => debug!(%id, encoding = candidate.as_str(), error = %e, "fallback failed"),
            }
        }

        slot.entry.failed(UNPLAYABLE_MESSAGE);
        warn!(%id, attempts, "clip unplayable");
        Err(PlaybackError::Unplayable { attempts })
    }

    fn start_poll(&mut self) {
        self.poll = None;
        self.polling = true;
    }

    fn stop_poll(&mut self) {
        self.poll = None;
        self.polling = false;
    }

    /// Sample the playing entry once.
    ///
    /// Natural end returns the entry to `Ready` and stops the poll. An error
    /// during playback continues the fallback sequence; the entry only fails
    /// once it is exhausted.
    pub fn poll_progress(&mut self) -> Option<ProgressUpdate> {
        let id = self.playing.clone()?;
        let slot = self.slots.get_mut(&id)?;
        let handle = slot.handle.as_mut()?;

        if let Some(e) = handle.take_error() {
            warn!(%id, error = %e, "playback error, trying fallback encodings");
            handle.pause();
            self.playing = None;
            self.stop_poll();

            if self.recover(&id).is_err() {
                return None;
            }
            self.mark_playing(&id);
            return Some(ProgressUpdate {
                id,
                percent: 0.0,
                finished: false,
            });
        }

        if handle.is_finished() {
            if let Err(e) = handle.rewind() {
                debug!(error = %e, "rewind after end failed");
            }
            slot.entry.stopped();
            self.playing = None;
            self.stop_poll();
            debug!(%id, "playback finished");
            return Some(ProgressUpdate {
                id,
                percent: 100.0,
                finished: true,
            });
        }

        let percent = progress_percent(handle.position(), handle.duration());
        slot.entry.set_progress(percent);
        Some(ProgressUpdate {
            id,
            percent: slot.entry.progress(),
            finished: false,
        })
    }

    /// Wait for the next poll tick and sample. Never resolves while nothing
    /// is playing.
    pub async fn next_tick(&mut self) -> Option<ProgressUpdate> {
        if !self.polling {
            std::future::pending::<()>().await;
        }
        let progress_interval = self.progress_interval;
        let poll = self.poll.get_or_insert_with(|| {
            let mut poll = interval(progress_interval);
            poll.set_missed_tick_behavior(MissedTickBehavior::Skip);
            poll
        });
        poll.tick().await;
        self.poll_progress()
    }

    /// Pause everything and release all handles
    pub fn teardown(&mut self) {
        for slot in self.slots.values_mut() {
            if let Some(handle) = slot.handle.as_mut() {
                handle.pause();
            }
            slot.handle = None;
        }
        self.slots.clear();
        self.playing = None;
        self.stop_poll();
    }
}

impl<B: AudioBackend> Drop for PlaybackController<B> {
    fn drop(&mut self) {
        self.teardown();
    }
}
