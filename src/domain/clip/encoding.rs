//! Audio encoding identifiers

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::error::InvalidEncodingError;

/// Audio container/codec pairs a voice clip may be tagged with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum AudioEncoding {
    WebmOpus,
    Webm,
    Mp3,
    Mp4,
    OggOpus,
    Ogg,
    Flac,
    Wav,
}

impl AudioEncoding {
    /// Every known encoding, in declaration order
    pub const ALL: [AudioEncoding; 8] = [
        Self::WebmOpus,
        Self::Webm,
        Self::Mp3,
        Self::Mp4,
        Self::OggOpus,
        Self::Ogg,
        Self::Flac,
        Self::Wav,
    ];

    /// Full MIME type, including codec parameters
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::WebmOpus => "audio/webm;codecs=opus",
            Self::Webm => "audio/webm",
            Self::Mp3 => "audio/mp3",
            Self::Mp4 => "audio/mp4",
            Self::OggOpus => "audio/ogg;codecs=opus",
            Self::Ogg => "audio/ogg",
            Self::Flac => "audio/flac",
            Self::Wav => "audio/wav",
        }
    }

    /// MIME type without codec parameters
    pub const fn container(&self) -> &'static str {
        match self {
            Self::WebmOpus | Self::Webm => "audio/webm",
            Self::OggOpus | Self::Ogg => "audio/ogg",
            other => other.as_str(),
        }
    }

    /// File extension used for downloads and stored clips
    pub const fn extension(&self) -> &'static str {
        match self {
            Self::WebmOpus | Self::Webm => "webm",
            Self::Mp3 => "mp3",
            Self::Mp4 => "m4a",
            Self::OggOpus | Self::Ogg => "ogg",
            Self::Flac => "flac",
            Self::Wav => "wav",
        }
    }

    /// Guess the encoding from a file extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "webm" => Some(Self::Webm),
            "mp3" => Some(Self::Mp3),
            "m4a" | "mp4" => Some(Self::Mp4),
            "ogg" | "oga" | "opus" => Some(Self::Ogg),
            "flac" => Some(Self::Flac),
            "wav" => Some(Self::Wav),
            _ => None,
        }
    }
}

impl FromStr for AudioEncoding {
    type Err = InvalidEncodingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // "audio/webm; codecs=opus" and "audio/webm;codecs=opus" are the same type
        let normalized: String = s
            .trim()
            .to_ascii_lowercase()
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect();

        match normalized.as_str() {
            "audio/webm;codecs=opus" => Ok(Self::WebmOpus),
            "audio/webm" => Ok(Self::Webm),
            "audio/mp3" | "audio/mpeg" => Ok(Self::Mp3),
            "audio/mp4" | "audio/m4a" => Ok(Self::Mp4),
            "audio/ogg;codecs=opus" => Ok(Self::OggOpus),
            "audio/ogg" => Ok(Self::Ogg),
            "audio/flac" | "audio/x-flac" => Ok(Self::Flac),
            "audio/wav" | "audio/wave" | "audio/x-wav" => Ok(Self::Wav),
            _ => Err(InvalidEncodingError {
                input: s.to_string(),
            }),
        }
    }
}

impl TryFrom<String> for AudioEncoding {
    type Error = InvalidEncodingError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<AudioEncoding> for String {
    fn from(value: AudioEncoding) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for AudioEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_with_codec_parameter() {
        let enc: AudioEncoding = "audio/webm;codecs=opus".parse().unwrap();
        assert_eq!(enc, AudioEncoding::WebmOpus);
        let spaced: AudioEncoding = " Audio/WebM; codecs=opus ".parse().unwrap();
        assert_eq!(spaced, AudioEncoding::WebmOpus);
    }

    #[test]
    fn parse_aliases() {
        assert_eq!("audio/mpeg".parse::<AudioEncoding>().unwrap(), AudioEncoding::Mp3);
        assert_eq!("audio/x-wav".parse::<AudioEncoding>().unwrap(), AudioEncoding::Wav);
    }

    #[test]
    fn parse_unknown_fails() {
        let err = "video/mp4".parse::<AudioEncoding>().unwrap_err();
        assert!(err.to_string().contains("video/mp4"));
    }

    #[test]
    fn every_encoding_parses_its_own_mime() {
        for enc in AudioEncoding::ALL {
            assert_eq!(enc.as_str().parse::<AudioEncoding>().unwrap(), enc);
        }
    }

    #[test]
    fn container_drops_codec() {
        assert_eq!(AudioEncoding::OggOpus.container(), "audio/ogg");
        assert_eq!(AudioEncoding::Flac.container(), "audio/flac");
    }

    #[test]
    fn extension_lookup() {
        assert_eq!(AudioEncoding::WebmOpus.extension(), "webm");
        assert_eq!(AudioEncoding::from_extension("FLAC"), Some(AudioEncoding::Flac));
        assert_eq!(AudioEncoding::from_extension("txt"), None);
    }

    #[test]
    fn serde_uses_mime_string() {
        let json = serde_json::to_string(&AudioEncoding::OggOpus).unwrap();
        assert_eq!(json, "\"audio/ogg;codecs=opus\"");
        let back: AudioEncoding = serde_json::from_str(&json).unwrap();
        assert_eq!(back, AudioEncoding::OggOpus);
    }
}
