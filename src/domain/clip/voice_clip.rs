//! Voice clip value object

use base64::Engine;

use super::AudioEncoding;

/// A finalized voice message: the encoded bytes, whole-second duration and
/// the encoding they are tagged with. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceClip {
    data: Vec<u8>,
    duration_secs: u64,
    encoding: AudioEncoding,
}

impl VoiceClip {
    /// Create a clip from encoded bytes
    pub fn new(data: Vec<u8>, duration_secs: u64, encoding: AudioEncoding) -> Self {
        Self {
            data,
            duration_secs,
            encoding,
        }
    }

    /// Encoded bytes
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Consume and return the encoded bytes
    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    pub fn encoding(&self) -> AudioEncoding {
        self.encoding
    }

    /// Duration in whole seconds
    pub fn duration_secs(&self) -> u64 {
        self.duration_secs
    }

    pub fn size_bytes(&self) -> usize {
        self.data.len()
    }

    /// Get human-readable size
    pub fn human_readable_size(&self) -> String {
        let bytes = self.size_bytes();
        if bytes < 1024 {
            format!("{} B", bytes)
        } else if bytes < 1024 * 1024 {
            format!("{:.1} KB", bytes as f64 / 1024.0)
        } else {
            format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
        }
    }

    /// Inline the clip as a `data:` URL
    pub fn to_data_url(&self) -> String {
        format!(
            "data:{};base64,{}",
            self.encoding.as_str(),
            base64::engine::general_purpose::STANDARD.encode(&self.data)
        )
    }

    /// File name offered when the clip is downloaded
    pub fn suggested_file_name(&self, stamp: u64) -> String {
        suggested_file_name(stamp, self.encoding)
    }
}

/// `voice-message-<stamp>.<ext>`
pub fn suggested_file_name(stamp: u64, encoding: AudioEncoding) -> String {
    format!("voice-message-{}.{}", stamp, encoding.extension())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn human_readable_size_bytes() {
        let clip = VoiceClip::new(vec![0u8; 500], 1, AudioEncoding::Flac);
        assert_eq!(clip.human_readable_size(), "500 B");
    }

    #[test]
    fn human_readable_size_kb() {
        let clip = VoiceClip::new(vec![0u8; 2048], 1, AudioEncoding::Flac);
        assert_eq!(clip.human_readable_size(), "2.0 KB");
    }

    #[test]
    fn human_readable_size_mb() {
        let clip = VoiceClip::new(vec![0u8; 2 * 1024 * 1024], 1, AudioEncoding::Flac);
        assert_eq!(clip.human_readable_size(), "2.0 MB");
    }

    #[test]
    fn data_url_carries_full_mime() {
        let clip = VoiceClip::new(vec![1, 2, 3, 4], 2, AudioEncoding::WebmOpus);
        assert_eq!(clip.to_data_url(), "data:audio/webm;codecs=opus;base64,AQIDBA==");
    }

    #[test]
    fn suggested_name_uses_extension() {
        let clip = VoiceClip::new(vec![], 0, AudioEncoding::Wav);
        assert_eq!(clip.suggested_file_name(1700000000000), "voice-message-1700000000000.wav");
    }
}
