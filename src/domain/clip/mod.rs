//! Voice clips and the encodings they carry

mod clip_ref;
mod encoding;
mod voice_clip;

pub use clip_ref::{decode_data_url, ClipRef, InlineClip};
pub use encoding::AudioEncoding;
pub use voice_clip::{suggested_file_name, VoiceClip};
