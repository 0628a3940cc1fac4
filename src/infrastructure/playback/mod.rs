//! Playback infrastructure module
//!
//! Voice message output through rodio.

mod capabilities;
mod rodio_backend;

pub use capabilities::{DecoderCapabilities, DECODABLE_ENCODINGS};
pub use rodio_backend::{RodioBackend, RodioHandle};
