//! Audio format negotiation
//!
//! Picks the first encoding the runtime supports from a prioritised list.
//! Side-effect free apart from the oracle queries, so it runs against fakes.

use tracing::{debug, warn};

use super::ports::CapabilityOracle;
use crate::domain::clip::AudioEncoding;

/// Recording preference order. Browser-style containers first, then the
/// formats native capture can produce.
pub const RECORDING_CANDIDATES: [AudioEncoding; 7] = [
    AudioEncoding::WebmOpus,
    AudioEncoding::Webm,
    AudioEncoding::Mp3,
    AudioEncoding::Mp4,
    AudioEncoding::OggOpus,
    AudioEncoding::Flac,
    AudioEncoding::Wav,
];

/// Retry order when a received clip fails to play
pub const PLAYBACK_FALLBACKS: [AudioEncoding; 6] = [
    AudioEncoding::Webm,
    AudioEncoding::Mp3,
    AudioEncoding::Mp4,
    AudioEncoding::Ogg,
    AudioEncoding::Flac,
    AudioEncoding::Wav,
];

/// Probe one candidate; a failing probe means "unsupported"
fn probe(oracle: &dyn CapabilityOracle, candidate: AudioEncoding) -> bool {
    match oracle.is_type_supported(candidate.as_str()) {
        Ok(supported) => supported,
        Err(e) => {
            warn!(mime = candidate.as_str(), error = %e, "capability probe failed");
            false
        }
    }
}

/// First supported candidate, or `None` when recording must be disabled
pub fn negotiate(
    candidates: &[AudioEncoding],
    oracle: &dyn CapabilityOracle,
) -> Option<AudioEncoding> {
    let chosen = candidates.iter().copied().find(|&c| probe(oracle, c));
    debug!(chosen = ?chosen.map(|c| c.as_str()), "negotiated audio encoding");
    chosen
}

/// Every supported candidate, in priority order
pub fn supported(candidates: &[AudioEncoding], oracle: &dyn CapabilityOracle) -> Vec<AudioEncoding> {
    candidates
        .iter()
        .copied()
        .filter(|&c| probe(oracle, c))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::ProbeError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FakeOracle {
        supported: Vec<&'static str>,
        broken: Vec<&'static str>,
        probes: AtomicUsize,
    }

    impl FakeOracle {
        fn new(supported: Vec<&'static str>) -> Self {
            Self {
                supported,
                broken: Vec::new(),
                probes: AtomicUsize::new(0),
            }
        }
    }

    impl CapabilityOracle for FakeOracle {
        fn is_type_supported(&self, mime: &str) -> Result<bool, ProbeError> {
            self.probes.fetch_add(1, Ordering::SeqCst);
            if self.broken.contains(&mime) {
                return Err(ProbeError {
                    mime: mime.to_string(),
                    reason: "probe threw".to_string(),
                });
            }
            Ok(self.supported.contains(&mime))
        }
    }

    #[test]
    fn picks_highest_priority_supported() {
        let oracle = FakeOracle::new(vec!["audio/mp4", "audio/webm"]);
        assert_eq!(negotiate(&RECORDING_CANDIDATES, &oracle), Some(AudioEncoding::Webm));
    }

    #[test]
    fn stops_probing_at_first_hit() {
        let oracle = FakeOracle::new(vec!["audio/webm;codecs=opus"]);
        negotiate(&RECORDING_CANDIDATES, &oracle);
        assert_eq!(oracle.probes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn none_supported_disables_recording() {
        let oracle = FakeOracle::new(vec![]);
        assert_eq!(negotiate(&RECORDING_CANDIDATES, &oracle), None);
        assert_eq!(oracle.probes.load(Ordering::SeqCst), RECORDING_CANDIDATES.len());
    }

    #[test]
    fn probe_error_skips_only_that_candidate() {
        let mut oracle = FakeOracle::new(vec!["audio/webm;codecs=opus", "audio/flac"]);
        oracle.broken = vec!["audio/webm;codecs=opus"];
        assert_eq!(negotiate(&RECORDING_CANDIDATES, &oracle), Some(AudioEncoding::Flac));
    }

    #[test]
    fn supported_keeps_priority_order() {
        let oracle = FakeOracle::new(vec!["audio/wav", "audio/flac", "audio/mp3"]);
        assert_eq!(
            supported(&RECORDING_CANDIDATES, &oracle),
            vec![AudioEncoding::Mp3, AudioEncoding::Flac, AudioEncoding::Wav]
        );
    }

    #[test]
    fn playback_fallbacks_use_plain_containers() {
        assert!(PLAYBACK_FALLBACKS.iter().all(|e| e.as_str() == e.container()));
    }
}
