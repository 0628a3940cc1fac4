//! What native capture can produce

use crate::application::ports::{CapabilityOracle, ProbeError};
use crate::domain::clip::AudioEncoding;

/// Encodings the cpal capture adapter can emit
pub const NATIVE_ENCODINGS: [AudioEncoding; 2] = [AudioEncoding::Flac, AudioEncoding::Wav];

/// Capability oracle for the native capture path.
///
/// Browser containers (webm, mp4, ogg+opus) need a media encoder this build
/// does not ship, so only FLAC and WAV answer yes.
#[derive(Debug, Default, Clone, Copy)]
pub struct NativeCapabilities;

impl NativeCapabilities {
    pub fn new() -> Self {
        Self
    }
}

impl CapabilityOracle for NativeCapabilities {
    fn is_type_supported(&self, mime: &str) -> Result<bool, ProbeError> {
        Ok(mime
            .parse::<AudioEncoding>()
            .map(|encoding| NATIVE_ENCODINGS.contains(&encoding))
            .unwrap_or(false))
    }
}
