//! Recording infrastructure module
//!
//! Microphone capture through cpal. Captured PCM is encoded to FLAC or WAV
//! when the recorder flushes the stream.

mod capabilities;
mod cpal_capture;
mod flac_encoder;
mod wav_encoder;

pub use capabilities::{NativeCapabilities, NATIVE_ENCODINGS};
pub use cpal_capture::{CpalCaptureDevice, CpalCaptureStream};
pub use flac_encoder::{encode_to_flac, EncodingError, TARGET_SAMPLE_RATE};
pub use wav_encoder::encode_to_wav;
