//! CLI argument definitions using Clap

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::domain::recording::Duration;

/// Voxroom - voice messages for a local chat room
#[derive(Parser, Debug)]
#[command(name = "voxroom")]
#[command(version)]
#[command(about = "Record, send, play and download voice messages in a chat room")]
#[command(long_about = None)]
pub struct Cli {
    /// Room directory holding the message log and clips
    #[arg(short = 'r', long, value_name = "DIR", global = true)]
    pub room: Option<PathBuf>,

    /// Author name attached to sent messages
    #[arg(short = 'a', long, value_name = "NAME", global = true)]
    pub author: Option<String>,

    /// Show desktop notifications for alerts
    #[arg(short = 'n', long, global = true)]
    pub notify: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Record a voice message and send it to the room
    Record {
        /// Text sent along with the clip
        #[arg(short = 't', long, value_name = "MSG")]
        text: Option<String>,

        /// Save the clip to FILE instead of sending it
        #[arg(short = 'o', long, value_name = "FILE")]
        out: Option<PathBuf>,

        /// Auto-stop safety limit (e.g., 30s, 2m, 1m30s)
        #[arg(short = 'm', long, value_name = "TIME")]
        max_duration: Option<String>,

        /// Recording format priority (comma-separated MIME types)
        #[arg(short = 'f', long, value_name = "MIME", value_delimiter = ',')]
        formats: Vec<String>,

        /// Store the clip inline in the room log as a data URL
        #[arg(long)]
        embed: bool,
    },
    /// Send a text message
    Send {
        /// Message text
        text: String,
    },
    /// List messages in delivery order
    List,
    /// Play voice messages, one after another
    Play {
        /// Message ids
        #[arg(required = true)]
        ids: Vec<String>,
    },
    /// Save a message's clip as voice-message-<timestamp>.<ext>
    Download {
        /// Message id
        id: String,

        /// Target directory
        #[arg(long, value_name = "DIR")]
        to: Option<PathBuf>,
    },
    /// Show recording candidates and what this machine supports
    Formats,
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config action subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Create config file with defaults
    Init,
    /// Set a config value
    Set {
        /// Config key
        key: String,
        /// Config value
        value: String,
    },
    /// Get a config value
    Get {
        /// Config key
        key: String,
    },
    /// List all config values
    List,
    /// Show config file path
    Path,
}

/// Parsed record options
#[derive(Debug, Clone)]
pub struct RecordOptions {
    /// Caption sent with the clip
    pub text: String,
    /// Save here instead of sending
    pub out: Option<PathBuf>,
    /// Hands-free safety limit
    pub max_duration: Duration,
}

/// Valid config keys
pub const VALID_CONFIG_KEYS: &[&str] = &[
    "author",
    "room_dir",
    "download_dir",
    "recording_formats",
    "max_duration",
    "embed_clips",
    "notify",
    "timings.lock_delay_ms",
    "timings.tick_interval_ms",
    "timings.visualizer_interval_ms",
    "timings.progress_interval_ms",
];

/// Check if a config key is valid
pub fn is_valid_config_key(key: &str) -> bool {
    VALID_CONFIG_KEYS.contains(&key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_parses_list() {
        let cli = Cli::parse_from(["voxroom", "list"]);
        assert!(matches!(cli.command, Commands::List));
        assert!(cli.room.is_none());
        assert!(!cli.notify);
    }

    #[test]
    fn global_room_after_subcommand() {
        let cli = Cli::parse_from(["voxroom", "list", "--room", "/tmp/r"]);
        assert_eq!(cli.room, Some(PathBuf::from("/tmp/r")));
    }

    #[test]
    fn cli_parses_record_options() {
        let cli = Cli::parse_from([
            "voxroom",
            "record",
            "-t",
            "hello",
            "--max-duration",
            "30s",
            "--formats",
            "audio/wav,audio/flac",
        ]);
        match cli.command {
            Commands::Record {
                text,
                max_duration,
                formats,
                embed,
                out,
            } => {
                assert_eq!(text.as_deref(), Some("hello"));
                assert_eq!(max_duration.as_deref(), Some("30s"));
                assert_eq!(formats, vec!["audio/wav", "audio/flac"]);
                assert!(!embed);
                assert!(out.is_none());
            }
            other => panic!("Expected Record, got {:?}", other),
        }
    }

    #[test]
    fn play_requires_ids() {
        assert!(Cli::try_parse_from(["voxroom", "play"]).is_err());
        let cli = Cli::parse_from(["voxroom", "play", "a", "b"]);
        assert!(matches!(cli.command, Commands::Play { ids } if ids == ["a", "b"]));
    }

    #[test]
    fn cli_parses_config_set() {
        let cli = Cli::parse_from(["voxroom", "config", "set", "author", "ana"]);
        if let Commands::Config {
            action: ConfigAction::Set { key, value },
        } = cli.command
        {
            assert_eq!(key, "author");
            assert_eq!(value, "ana");
        } else {
            panic!("Expected Config Set command");
        }
    }

    #[test]
    fn valid_config_keys() {
        assert!(is_valid_config_key("author"));
        assert!(is_valid_config_key("timings.lock_delay_ms"));
        assert!(!is_valid_config_key("api_key"));
    }

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }
}
