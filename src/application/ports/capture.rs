//! Microphone capture port interfaces

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::domain::clip::AudioEncoding;

/// Capture errors
#[derive(Debug, Clone, Error)]
pub enum CaptureError {
    #[error("Microphone permission denied: {0}")]
    PermissionDenied(String),

    #[error("No audio input device available")]
    DeviceUnavailable,

    #[error("Failed to start capture: {0}")]
    StartFailed(String),

    #[error("Failed to flush captured audio: {0}")]
    Flush(String),

    #[error("Level data unavailable: {0}")]
    Visualizer(String),
}

/// Where a capture stream delivers encoded fragments, in order
pub type ChunkSender = mpsc::UnboundedSender<Vec<u8>>;

/// Port for obtaining a live microphone stream
#[async_trait]
pub trait CaptureDevice: Send + Sync {
    /// Ask for microphone access.
    ///
    /// # Returns
    /// A live stream, or the reason access was refused
    async fn request_access(&self) -> Result<Box<dyn CaptureStream>, CaptureError>;
}

/// A live capture stream handed out by [`CaptureDevice`].
pub trait CaptureStream: Send + Sync {
    /// Start encoding into `encoding`, sending fragments to `chunks` in
    /// capture order.
    fn start(&self, encoding: AudioEncoding, chunks: ChunkSender) -> Result<(), CaptureError>;

    /// Stop encoding and deliver whatever is still buffered as the final
    /// fragments before returning.
    fn flush(&self) -> Result<(), CaptureError>;

    /// Fill `out` with byte-scaled frequency magnitudes of the live signal.
    /// Returns the number of bins written.
    fn frequency_data(&self, out: &mut [u8]) -> Result<usize, CaptureError>;

    /// Stop the underlying tracks and give the device back.
    fn release(&self);
}
