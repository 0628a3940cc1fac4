//! Room storage adapters

mod jsonl_log;

pub use jsonl_log::{JsonlRoomLog, CLIPS_DIR, LOG_FILE};
