//! Voice message recorder use case
//!
//! Drives one capture session at a time through
//! `Idle -> RequestingPermission -> Capturing -> Finalizing | Cancelled -> Idle`
//! and owns every timer that runs while capturing.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration as StdDuration;

use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval, interval_at, sleep, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use super::negotiator::negotiate;
use super::ports::{CapabilityOracle, CaptureDevice, CaptureError, CaptureStream};
use crate::domain::clip::{AudioEncoding, VoiceClip};
use crate::domain::config::AppConfig;
use crate::domain::recording::{
    ChunkBuffer, Duration, InvalidStateTransition, RecorderSession, RecorderState,
};
use crate::domain::visualizer::{bars_from_levels, Bar, BAR_COUNT, BIN_COUNT};

/// Errors from the recorder use case
#[derive(Debug, Error)]
pub enum RecorderError {
    #[error("Voice messages are not supported here: none of the audio formats can be recorded")]
    UnsupportedEnvironment,

    #[error("Could not access the microphone: {0}")]
    Permission(CaptureError),

    #[error("Could not start recording: {0}")]
    Capture(CaptureError),

    #[error("Failed to finalize voice message: {0}")]
    Finalize(String),

    #[error("Lock is not available yet")]
    LockUnavailable,

    #[error(transparent)]
    InvalidState(#[from] InvalidStateTransition),
}

/// Timer settings for a capture session
#[derive(Debug, Clone, Copy)]
pub struct RecorderTimings {
    /// Delay before the lock affordance appears
    pub lock_delay: StdDuration,
    /// Duration counter tick
    pub tick_interval: StdDuration,
    /// Visualizer refresh
    pub visualizer_interval: StdDuration,
}

impl Default for RecorderTimings {
    fn default() -> Self {
        Self::from(&AppConfig::defaults())
    }
}

impl From<&AppConfig> for RecorderTimings {
    fn from(config: &AppConfig) -> Self {
        Self {
            lock_delay: config.lock_delay_or_default().as_std(),
            tick_interval: config.tick_interval_or_default().as_std(),
            visualizer_interval: config.visualizer_interval_or_default().as_std(),
        }
    }
}

/// What to do when a push-to-talk gesture ends on an unlocked session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleasePolicy {
    Send,
    Cancel,
}

/// Result of ending the initiating gesture
#[derive(Debug)]
pub enum GestureOutcome {
    /// Locked: capture continues hands-free
    StillCapturing,
    Sent(VoiceClip),
    Cancelled,
}

/// Everything that exists only while capturing.
///
/// Dropping it aborts the timers and releases the stream, so every exit
/// path (stop, cancel, controller drop) releases exactly once.
struct ActiveCapture {
    stream: Arc<dyn CaptureStream>,
    chunks: mpsc::UnboundedReceiver<Vec<u8>>,
    buffer: ChunkBuffer,
    encoding: AudioEncoding,
    started_at: Instant,
    timers: Vec<JoinHandle<()>>,
    /// Indicators owned by this session only, so a late timer can never
    /// leak into the next one
    elapsed_secs: Arc<AtomicU64>,
    lock_available: Arc<AtomicBool>,
    /// Cleared before the timers are aborted; the visualizer checks it under
    /// the watch lock
    live: Arc<AtomicBool>,
}

impl ActiveCapture {
    /// Move delivered fragments into the buffer, keeping delivery order
    fn drain(&mut self) {
        while let Ok(chunk) = self.chunks.try_recv() {
            self.buffer.push(chunk);
        }
    }
}

impl Drop for ActiveCapture {
    fn drop(&mut self) {
        self.live.store(false, Ordering::SeqCst);
        for timer in self.timers.drain(..) {
            timer.abort();
        }
        self.stream.release();
        debug!("capture stream released");
    }
}

/// Recorder controller.
///
/// Exclusively owns the recording session and its chunk buffer.
pub struct RecorderController<D, O>
where
    D: CaptureDevice,
    O: CapabilityOracle,
{
    device: D,
    oracle: O,
    candidates: Vec<AudioEncoding>,
    timings: RecorderTimings,
    session: RecorderSession,
    supported: Option<AudioEncoding>,
    active: Option<ActiveCapture>,
    bars: watch::Sender<[Bar; BAR_COUNT]>,
}

impl<D, O> RecorderController<D, O>
where
    D: CaptureDevice,
    O: CapabilityOracle,
{
    /// Create a recorder. Format support is probed immediately so callers can
    /// disable recording up front instead of failing per attempt.
    pub fn new(
        device: D,
        oracle: O,
        candidates: Vec<AudioEncoding>,
        timings: RecorderTimings,
    ) -> Self {
        let supported = negotiate(&candidates, &oracle);
        if supported.is_none() {
            warn!("no recording format supported, voice messages disabled");
        }
        let (bars, _) = watch::channel([Bar::default(); BAR_COUNT]);

        Self {
            device,
            oracle,
            candidates,
            timings,
            session: RecorderSession::new(),
            supported,
            active: None,
            bars,
        }
    }

    /// Whether any candidate format can be recorded
    pub fn is_supported(&self) -> bool {
        self.supported.is_some()
    }

    pub fn state(&self) -> RecorderState {
        self.session.state()
    }

    /// Encoding of the running session, or the one a new session would use
    pub fn encoding(&self) -> Option<AudioEncoding> {
        self.active.as_ref().map(|a| a.encoding).or(self.supported)
    }

    /// Seconds shown by the live counter
    pub fn elapsed_secs(&self) -> u64 {
        self.active
            .as_ref()
            .map_or(0, |a| a.elapsed_secs.load(Ordering::SeqCst))
    }

    /// Precise time since capture began
    pub fn elapsed(&self) -> Duration {
        self.active
            .as_ref()
            .map(|a| Duration::from(a.started_at.elapsed()))
            .unwrap_or(Duration::ZERO)
    }

    /// Whether the lock control should be offered
    pub fn lock_available(&self) -> bool {
        self.active
            .as_ref()
            .is_some_and(|a| a.lock_available.load(Ordering::SeqCst))
    }

    /// Live visualizer bars
    pub fn visualizer(&self) -> watch::Receiver<[Bar; BAR_COUNT]> {
        self.bars.subscribe()
    }

    /// Safety limit for hands-free sessions
    pub fn max_duration_reached(&self, limit: Duration) -> bool {
        self.session.is_capturing() && self.elapsed() >= limit
    }

    /// Request the microphone and begin capturing.
    pub async fn start(&mut self) -> Result<(), RecorderError> {
        if self.supported.is_none() {
            return Err(RecorderError::UnsupportedEnvironment);
        }
        self.session.request_permission()?;
        debug!("requesting microphone access");

        let stream: Arc<dyn CaptureStream> = match self.device.request_access().await {
            Ok(stream) => Arc::from(stream),
            Err(e) => {
                self.session.request_failed()?;
                warn!(error = %e, "microphone access refused");
                return Err(RecorderError::Permission(e));
            }
        };

        let Some(encoding) = negotiate(&self.candidates, &self.oracle) else {
            stream.release();
            self.session.request_failed()?;
            return Err(RecorderError::UnsupportedEnvironment);
        };

        let (tx, rx) = mpsc::unbounded_channel();
        if let Err(e) = stream.start(encoding, tx) {
            stream.release();
            self.session.request_failed()?;
            return Err(RecorderError::Capture(e));
        }

        self.session.permission_granted()?;
        self.reset_bars();

        let started_at = Instant::now();
        let elapsed_secs = Arc::new(AtomicU64::new(0));
        let lock_available = Arc::new(AtomicBool::new(false));
        let live = Arc::new(AtomicBool::new(true));
        let timers = vec![
            self.spawn_duration_tick(started_at, Arc::clone(&elapsed_secs)),
            self.spawn_lock_timer(Arc::clone(&lock_available)),
            self.spawn_visualizer(Arc::clone(&stream), Arc::clone(&live)),
        ];

        self.active = Some(ActiveCapture {
            stream,
            chunks: rx,
            buffer: ChunkBuffer::new(),
            encoding,
            started_at,
            timers,
            elapsed_secs,
            lock_available,
            live,
        });

        info!(encoding = encoding.as_str(), "recording started");
        Ok(())
    }

    /// Switch between push-to-talk and hands-free. Returns the new lock flag.
    pub fn toggle_lock(&mut self) -> Result<bool, RecorderError> {
        if self.session.is_capturing() && !self.lock_available() {
            return Err(RecorderError::LockUnavailable);
        }
        let locked = self.session.toggle_lock()?;
        debug!(locked, "lock toggled");
        Ok(locked)
    }

    /// The initiating gesture ended. Locked sessions keep going.
    pub fn release_gesture(&mut self, policy: ReleasePolicy) -> Result<GestureOutcome, RecorderError> {
        match self.session.state() {
            RecorderState::Capturing { locked: true } => Ok(GestureOutcome::StillCapturing),
            RecorderState::Capturing { locked: false } => match policy {
                ReleasePolicy::Send => self.stop().map(GestureOutcome::Sent),
                ReleasePolicy::Cancel => self.cancel().map(|()| GestureOutcome::Cancelled),
            },
            current_state => Err(InvalidStateTransition {
                current_state,
                action: "release gesture".to_string(),
            }
            .into()),
        }
    }

    /// Stop capturing and produce the clip.
    ///
    /// The stream is released whether or not finalization succeeds.
    pub fn stop(&mut self) -> Result<VoiceClip, RecorderError> {
        self.session.begin_finalize()?;

        let result = match self.active.take() {
            Some(mut active) => {
                let result = Self::finalize(&mut active);
                drop(active);
                result
            }
            None => Err(RecorderError::Finalize("no active capture".to_string())),
        };

        self.reset_bars();
        self.session.complete()?;

        match &result {
            Ok(clip) => info!(
                duration_secs = clip.duration_secs(),
                size = %clip.human_readable_size(),
                "recording finalized"
            ),
            Err(e) => warn!(error = %e, "recording could not be finalized"),
        }
        result
    }

    /// Abandon the session. Nothing is produced.
    pub fn cancel(&mut self) -> Result<(), RecorderError> {
        self.session.cancel()?;

        if let Some(mut active) = self.active.take() {
            active.drain();
            active.buffer.clear();
        }

        self.reset_bars();
        self.session.complete()?;
        info!("recording cancelled");
        Ok(())
    }

    fn finalize(active: &mut ActiveCapture) -> Result<VoiceClip, RecorderError> {
        let flushed = active.stream.flush();
        active.drain();
        flushed.map_err(|e| RecorderError::Finalize(e.to_string()))?;

        if active.buffer.is_empty() {
            return Err(RecorderError::Finalize("No audio data captured".to_string()));
        }

        let duration_secs = Duration::from(active.started_at.elapsed())
            .as_secs_ceil()
            .max(1);
        Ok(VoiceClip::new(
            active.buffer.concat(),
            duration_secs,
            active.encoding,
        ))
    }

    // callers drop the active capture first, which clears its live flag
    fn reset_bars(&self) {
        self.bars.send_replace([Bar::default(); BAR_COUNT]);
    }

    fn spawn_duration_tick(&self, started_at: Instant, elapsed: Arc<AtomicU64>) -> JoinHandle<()> {
        let period = self.timings.tick_interval;
        tokio::spawn(async move {
            let mut ticker = interval_at(started_at + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                elapsed.store(started_at.elapsed().as_secs(), Ordering::SeqCst);
            }
        })
    }

    fn spawn_lock_timer(&self, available: Arc<AtomicBool>) -> JoinHandle<()> {
        let delay = self.timings.lock_delay;
        tokio::spawn(async move {
            sleep(delay).await;
            available.store(true, Ordering::SeqCst);
        })
    }

    fn spawn_visualizer(
        &self,
        stream: Arc<dyn CaptureStream>,
        live: Arc<AtomicBool>,
    ) -> JoinHandle<()> {
        let bars = self.bars.clone();
        let period = self.timings.visualizer_interval;
        tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            let mut levels = [0u8; BIN_COUNT];
            loop {
                ticker.tick().await;
                // cosmetic only: a bad frame is skipped, never fatal
                match stream.frequency_data(&mut levels) {
                    Ok(n) => {
                        let frame = bars_from_levels(&levels[..n.min(BIN_COUNT)]);
                        bars.send_if_modified(|current| {
                            if !live.load(Ordering::SeqCst) {
                                return false;
                            }
                            *current = frame;
                            true
                        });
                    }
                    Err(e) => debug!(error = %e, "visualizer frame skipped"),
                }
            }
        })
    }
}

impl<D, O> Drop for RecorderController<D, O>
where
    D: CaptureDevice,
    O: CapabilityOracle,
{
    fn drop(&mut self) {
        if self.active.take().is_some() {
            debug!("recorder dropped while capturing");
        }
    }
}
