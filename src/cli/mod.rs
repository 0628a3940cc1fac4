//! CLI layer - Command-line interface
//!
//! Contains argument parsing, output formatting, Ctrl+C handling,
//! and the command runners.

pub mod app;
pub mod args;
pub mod config_cmd;
pub mod presenter;
pub mod signals;

// Re-export commonly used types
pub use app::{
    run_download, run_formats, run_list, run_play, run_record, run_send, EXIT_ERROR, EXIT_SUCCESS,
    EXIT_USAGE_ERROR,
};
pub use args::{Cli, Commands, ConfigAction, RecordOptions};
pub use presenter::Presenter;
