//! References from a message to its clip bytes

use std::fmt;
use std::path::{Path, PathBuf};

use base64::Engine;
use serde::{Deserialize, Serialize};

use super::AudioEncoding;
use crate::domain::error::ClipRefError;

/// Where a message's clip bytes live.
///
/// Serialized as a plain string: `data:` URLs stay inline, anything else is a
/// path (relative paths are resolved against the room directory).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ClipRef {
    Path(PathBuf),
    DataUrl(String),
}

/// Bytes decoded from a `data:` URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineClip {
    pub mime: String,
    pub data: Vec<u8>,
}

impl ClipRef {
    /// Parse a stored reference
    pub fn parse(input: &str) -> Result<Self, ClipRefError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(ClipRefError::Empty);
        }
        if input.starts_with("data:") {
            // validate eagerly so a bad row fails at load, not at playback
            decode_data_url(input)?;
            return Ok(Self::DataUrl(input.to_string()));
        }
        Ok(Self::Path(PathBuf::from(input)))
    }

    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Path(p) => Some(p),
            Self::DataUrl(_) => None,
        }
    }

    /// Encoding implied by the reference, if any
    pub fn declared_encoding(&self) -> Option<AudioEncoding> {
        match self {
            Self::Path(p) => p
                .extension()
                .and_then(|e| e.to_str())
                .and_then(AudioEncoding::from_extension),
            Self::DataUrl(url) => decode_data_url(url)
                .ok()
                .and_then(|inline| inline.mime.parse().ok()),
        }
    }
}

/// Decode `data:<mime>;base64,<payload>`
pub fn decode_data_url(url: &str) -> Result<InlineClip, ClipRefError> {
    let rest = url
        .strip_prefix("data:")
        .ok_or_else(|| ClipRefError::MalformedDataUrl("missing data: prefix".into()))?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| ClipRefError::MalformedDataUrl("missing ',' separator".into()))?;
    let mime = header
        .strip_suffix(";base64")
        .ok_or_else(|| ClipRefError::MalformedDataUrl("only base64 payloads are supported".into()))?;
    let data = base64::engine::general_purpose::STANDARD
        .decode(payload)
        .map_err(|e| ClipRefError::MalformedDataUrl(e.to_string()))?;

    Ok(InlineClip {
        mime: mime.to_string(),
        data,
    })
}

impl TryFrom<String> for ClipRef {
    type Error = ClipRefError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ClipRef> for String {
    fn from(value: ClipRef) -> Self {
        value.to_string()
    }
}

impl fmt::Display for ClipRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path(p) => write!(f, "{}", p.display()),
            Self::DataUrl(url) => write!(f, "{}", url),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::clip::VoiceClip;

    #[test]
    fn parse_path() {
        let r = ClipRef::parse("clips/abc.flac").unwrap();
        assert_eq!(r.path(), Some(Path::new("clips/abc.flac")));
        assert_eq!(r.declared_encoding(), Some(AudioEncoding::Flac));
    }

    #[test]
    fn parse_empty_fails() {
        assert!(matches!(ClipRef::parse("  "), Err(ClipRefError::Empty)));
    }

    #[test]
    fn data_url_from_clip_decodes() {
        let clip = VoiceClip::new(vec![9, 8, 7], 1, AudioEncoding::OggOpus);
        let r = ClipRef::parse(&clip.to_data_url()).unwrap();
        assert_eq!(r.declared_encoding(), Some(AudioEncoding::OggOpus));

        let ClipRef::DataUrl(url) = r else {
            panic!("expected data url");
        };
        let inline = decode_data_url(&url).unwrap();
        assert_eq!(inline.mime, "audio/ogg;codecs=opus");
        assert_eq!(inline.data, vec![9, 8, 7]);
    }

    #[test]
    fn malformed_data_url_rejected() {
        assert!(ClipRef::parse("data:audio/wav,raw-bytes").is_err());
        assert!(ClipRef::parse("data:audio/wav;base64").is_err());
        assert!(ClipRef::parse("data:audio/wav;base64,@@@").is_err());
    }
}
