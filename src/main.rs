//! Voxroom CLI entry point

use std::process::ExitCode;

use clap::Parser;
use tracing::debug;

use voxroom::cli::{
    app::{load_merged_config, EXIT_ERROR, EXIT_USAGE_ERROR},
    args::{Cli, Commands, RecordOptions},
    config_cmd::handle_config_command,
    presenter::Presenter,
    run_download, run_formats, run_list, run_play, run_record, run_send,
};
use voxroom::domain::clip::AudioEncoding;
use voxroom::domain::config::AppConfig;
use voxroom::domain::recording::Duration;
use voxroom::infrastructure::{create_notifier, XdgConfigStore};

/// Log filter variable, e.g. `VOXROOM_LOG=voxroom=debug`
const LOG_ENV: &str = "VOXROOM_LOG";

fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    // stdout carries command output, so logs go to stderr
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main(flavor = "multi_thread", worker_threads = 2)]
async fn main() -> ExitCode {
    init_logging();

    let cli = Cli::parse();
    let presenter = Presenter::new();
    debug!(command = ?cli.command, "starting");

    if let Commands::Config { action } = cli.command {
        let store = XdgConfigStore::new();
        if let Err(e) = handle_config_command(action, &store, &presenter).await {
            presenter.error(&e.to_string());
            return ExitCode::from(EXIT_ERROR);
        }
        return ExitCode::SUCCESS;
    }

    // Build CLI config from args
    let mut cli_config = AppConfig {
        author: cli.author.clone(),
        room_dir: cli.room.as_ref().map(|p| p.to_string_lossy().into_owned()),
        notify: if cli.notify { Some(true) } else { None },
        ..AppConfig::empty()
    };

    if let Commands::Record {
        max_duration,
        formats,
        embed,
        ..
    } = &cli.command
    {
        if let Some(bad) = formats.iter().find(|f| f.parse::<AudioEncoding>().is_err()) {
            presenter.error(&format!("Invalid format: {}", bad));
            return ExitCode::from(EXIT_USAGE_ERROR);
        }
        cli_config.max_duration = max_duration.clone();
        cli_config.recording_formats = (!formats.is_empty()).then(|| formats.clone());
        cli_config.embed_clips = if *embed { Some(true) } else { None };
    }

    // Merge config
    let config = load_merged_config(cli_config).await;
    let notifier = create_notifier(config.notify_or_default());

    match cli.command {
        Commands::Record { text, out, .. } => {
            // Parse max duration; the config accessor would silently fall back
            let max_duration = match config.max_duration.as_ref() {
                Some(s) => match s.parse::<Duration>() {
                    Ok(d) => d,
                    Err(e) => {
                        presenter.error(&format!("Invalid max-duration: {}", e));
                        return ExitCode::from(EXIT_USAGE_ERROR);
                    }
                },
                None => Duration::default_max_duration(),
            };

            let options = RecordOptions {
                text: text.unwrap_or_default(),
                out,
                max_duration,
            };
            run_record(&config, options, &notifier).await
        }
        Commands::Send { text } => run_send(&config, &text).await,
        Commands::List => run_list(&config).await,
        Commands::Play { ids } => run_play(&config, &ids, &notifier).await,
        Commands::Download { id, to } => run_download(&config, &id, to).await,
        Commands::Formats => run_formats(&config).await,
        Commands::Config { .. } => ExitCode::SUCCESS,
    }
}
