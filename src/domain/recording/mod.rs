//! Recording value objects and the recorder state machine

mod chunks;
mod duration;
mod session;

pub use chunks::ChunkBuffer;
pub use duration::{format_clock, Duration, DEFAULT_MAX_DURATION_SECS};
pub use session::{InvalidStateTransition, RecorderSession, RecorderState};
