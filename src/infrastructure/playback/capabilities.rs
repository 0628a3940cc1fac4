//! What the playback backend can decode

use crate::application::ports::{CapabilityOracle, ProbeError};
use crate::domain::clip::AudioEncoding;

/// Containers rodio decodes with its default features
pub const DECODABLE_ENCODINGS: [AudioEncoding; 4] = [
    AudioEncoding::Wav,
    AudioEncoding::Flac,
    AudioEncoding::Ogg,
    AudioEncoding::Mp3,
];

/// Capability oracle for received clips
#[derive(Debug, Default, Clone, Copy)]
pub struct DecoderCapabilities;

impl DecoderCapabilities {
    pub fn new() -> Self {
        Self
    }
}

impl CapabilityOracle for DecoderCapabilities {
    fn is_type_supported(&self, mime: &str) -> Result<bool, ProbeError> {
        Ok(mime
            .parse::<AudioEncoding>()
            .map(|encoding| DECODABLE_ENCODINGS.contains(&encoding))
            .unwrap_or(false))
    }
}
