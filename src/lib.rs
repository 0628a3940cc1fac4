//! Voxroom - voice messages for a chat room
//!
//! Records microphone audio into a voice clip, sends it into a room next to
//! text messages, and plays received clips back with progress and format
//! fallbacks.
//!
//! # Architecture
//!
//! The crate follows hexagonal (ports & adapters) architecture:
//!
//! - **Domain**: Encodings, clips, messages, the recorder and playback state
//!   machines, visualizer math, errors
//! - **Application**: Recorder, playback and room controllers plus port traits
//! - **Infrastructure**: Adapters (cpal capture, rodio output, JSONL room log,
//!   filesystem downloads, notifications, XDG config)
//! - **CLI**: Command-line interface, argument parsing, and signal handling

pub mod application;
pub mod cli;
pub mod domain;
pub mod infrastructure;
