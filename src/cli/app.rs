//! Command runners

use std::env;
use std::io::{self, BufRead};
use std::path::PathBuf;
use std::process::ExitCode;
use std::thread;

use tokio::sync::mpsc;
use tokio::time::{interval, MissedTickBehavior};
use tracing::debug;

use crate::application::ports::{
    AlertLevel, CapabilityOracle, ConfigStore, Notifier, PlaybackError, RoomError,
};
use crate::application::{
    supported, PlaybackController, RecorderController, RecorderError, RecorderTimings, VoiceRoom,
    PLAYBACK_FALLBACKS, RECORDING_CANDIDATES, UNPLAYABLE_MESSAGE,
};
use crate::domain::clip::AudioEncoding;
use crate::domain::config::AppConfig;
use crate::domain::message::MessageId;
use crate::domain::recording::RecorderState;
use crate::infrastructure::{
    CpalCaptureDevice, DecoderCapabilities, FsDownloader, JsonlRoomLog, NativeCapabilities,
    RodioBackend, XdgConfigStore,
};

use super::args::RecordOptions;
use super::presenter::Presenter;
use super::signals::ShutdownSignal;

/// Exit codes
pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_ERROR: u8 = 1;
pub const EXIT_USAGE_ERROR: u8 = 2;

/// Environment overrides
pub const ENV_AUTHOR: &str = "VOXROOM_AUTHOR";
pub const ENV_ROOM_DIR: &str = "VOXROOM_ROOM_DIR";

type Room = VoiceRoom<JsonlRoomLog, FsDownloader>;

/// Load and merge configuration from file, env, and CLI
pub async fn load_merged_config(cli_config: AppConfig) -> AppConfig {
    let store = XdgConfigStore::new();
    let file_config = match store.load().await {
        Ok(config) => config,
        Err(e) => {
            debug!(error = %e, "config file ignored");
            AppConfig::empty()
        }
    };

    let env_config = AppConfig {
        author: env::var(ENV_AUTHOR).ok().filter(|s| !s.is_empty()),
        room_dir: env::var(ENV_ROOM_DIR).ok().filter(|s| !s.is_empty()),
        ..Default::default()
    };

    // Merge: defaults < file < env < cli
    AppConfig::defaults()
        .merge(file_config)
        .merge(env_config)
        .merge(cli_config)
}

/// `<data dir>/voxroom/room`, or `./voxroom-room` without a data dir
pub fn default_room_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|dir| dir.join("voxroom").join("room"))
        .unwrap_or_else(|| PathBuf::from("voxroom-room"))
}

pub fn room_dir(config: &AppConfig) -> PathBuf {
    config
        .room_dir
        .as_ref()
        .map(PathBuf::from)
        .unwrap_or_else(default_room_dir)
}

pub fn download_dir(config: &AppConfig) -> PathBuf {
    config
        .download_dir
        .as_ref()
        .map(PathBuf::from)
        .unwrap_or_else(FsDownloader::default_dir)
}

fn open_room(config: &AppConfig, downloads: PathBuf) -> Room {
    let log = JsonlRoomLog::new(room_dir(config), config.embed_clips_or_default());
    VoiceRoom::new(log, FsDownloader::new(downloads), config.author_or_default())
}

async fn alert<N: Notifier>(notifier: &N, title: &str, message: &str, level: AlertLevel) {
    if let Err(e) = notifier.notify(title, message, level).await {
        debug!(error = %e, "alert not shown");
    }
}

fn room_failure(presenter: &Presenter, error: &RoomError) -> ExitCode {
    presenter.error(&error.to_string());
    ExitCode::from(EXIT_ERROR)
}

/// Send a text message
pub async fn run_send(config: &AppConfig, text: &str) -> ExitCode {
    let presenter = Presenter::new();
    let room = open_room(config, download_dir(config));

    match room.send_text(text).await {
        Ok(message) => {
            presenter.output(message.id.as_str());
            ExitCode::from(EXIT_SUCCESS)
        }
        Err(e) => room_failure(&presenter, &e),
    }
}

/// Print every message in delivery order
pub async fn run_list(config: &AppConfig) -> ExitCode {
    let presenter = Presenter::new();
    let room = open_room(config, download_dir(config));

    match room.messages().await {
        Ok(messages) => {
            if messages.is_empty() {
                presenter.info("No messages yet");
            }
            for message in &messages {
                presenter.output(&presenter.format_message(message));
            }
            ExitCode::from(EXIT_SUCCESS)
        }
        Err(e) => room_failure(&presenter, &e),
    }
}

/// Save a message's clip
pub async fn run_download(config: &AppConfig, id: &str, to: Option<PathBuf>) -> ExitCode {
    let presenter = Presenter::new();
    let room = open_room(config, to.unwrap_or_else(|| download_dir(config)));

    match room.download(&MessageId::from(id)).await {
        Ok(path) => {
            presenter.output(&path.to_string_lossy());
            ExitCode::from(EXIT_SUCCESS)
        }
        Err(e) => room_failure(&presenter, &e),
    }
}

/// Show recording candidates and playback fallbacks with what this machine
/// supports
pub async fn run_formats(config: &AppConfig) -> ExitCode {
    let presenter = Presenter::new();
    let candidates = config
        .recording_formats()
        .unwrap_or_else(|| RECORDING_CANDIDATES.to_vec());

    presenter.output("Recording:");
    print_support(&presenter, &candidates, &NativeCapabilities::new(), true);
    presenter.output("Playback:");
    print_support(&presenter, &PLAYBACK_FALLBACKS, &DecoderCapabilities::new(), false);

    ExitCode::from(EXIT_SUCCESS)
}

fn print_support(
    presenter: &Presenter,
    candidates: &[AudioEncoding],
    oracle: &dyn CapabilityOracle,
    mark_first: bool,
) {
    let usable = supported(candidates, oracle);
    let selected = mark_first.then(|| usable.first().copied()).flatten();

    for candidate in candidates {
        let status = if Some(*candidate) == selected {
            "yes (selected)"
        } else if usable.contains(candidate) {
            "yes"
        } else {
            "no"
        };
        presenter.output(&format!("  {:<24} {}", candidate.to_string(), status));
    }
}

/// Play clips one after another with a progress bar
pub async fn run_play<N: Notifier>(config: &AppConfig, ids: &[String], notifier: &N) -> ExitCode {
    let presenter = Presenter::new();
    let room = open_room(config, download_dir(config));

    let messages = match room.messages().await {
        Ok(messages) => messages,
        Err(e) => return room_failure(&presenter, &e),
    };

    // every id must name a voice message before any audio device is opened
    let ids: Vec<MessageId> = ids.iter().map(|id| MessageId::from(id.as_str())).collect();
    for id in &ids {
        match messages.iter().find(|m| &m.id == id) {
            Some(message) if message.has_clip() => {}
            Some(_) => return room_failure(&presenter, &RoomError::NoClip(id.clone())),
            None => return room_failure(&presenter, &RoomError::UnknownMessage(id.clone())),
        }
    }

    let backend = match RodioBackend::new() {
        Ok(backend) => backend,
        Err(e) => {
            presenter.error(&e.to_string());
            alert(notifier, "Playback", &e.to_string(), AlertLevel::Error).await;
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let shutdown = ShutdownSignal::new();
    shutdown.setup();

    let mut player = PlaybackController::new(backend, config);
    player.observe(&messages, room.resolver());

    let mut failed = false;
    for id in &ids {
        if let Err(e) = player.toggle(id) {
            failed = true;
            presenter.error(&format!("{}: {}", id, e));
            if matches!(e, PlaybackError::Unplayable { .. }) {
                alert(notifier, "Playback", UNPLAYABLE_MESSAGE, AlertLevel::Warning).await;
            }
            continue;
        }

        let bar = presenter.playback_bar(id.as_str(), player.duration(id));
        loop {
            tokio::select! {
                update = player.next_tick() => match update {
                    Some(update) if update.finished => {
                        bar.set_position(100);
                        bar.finish();
                        break;
                    }
                    Some(update) => bar.set_position(update.percent.round() as u64),
                    None => {
                        failed = true;
                        bar.abandon_with_message(UNPLAYABLE_MESSAGE);
                        alert(notifier, "Playback", UNPLAYABLE_MESSAGE, AlertLevel::Warning).await;
                        break;
                    }
                },
                _ = shutdown.wait() => {
                    player.teardown();
                    bar.abandon();
                    presenter.info("Playback stopped");
                    return ExitCode::from(EXIT_SUCCESS);
                }
            }
        }
    }

    player.teardown();
    if failed {
        ExitCode::from(EXIT_ERROR)
    } else {
        ExitCode::from(EXIT_SUCCESS)
    }
}

/// What ended an interactive capture
enum Finish {
    Send,
    Cancel,
}

/// Forward lines from a blocking reader on a detached thread, so a read
/// parked on the terminal never holds up runtime shutdown.
///
/// The channel closes at end of input or when the thread cannot start.
fn spawn_line_reader<R>(reader: R) -> mpsc::UnboundedReceiver<io::Result<String>>
where
    R: BufRead + Send + 'static,
{
    let (tx, rx) = mpsc::unbounded_channel();
    let spawned = thread::Builder::new()
        .name("voxroom-stdin".to_string())
        .spawn(move || {
            for line in reader.lines() {
                if tx.send(line).is_err() {
                    break;
                }
            }
        });
    if let Err(e) = spawned {
        debug!(error = %e, "stdin reader thread failed to start");
    }
    rx
}

/// Record from the microphone, then send or save the clip
pub async fn run_record<N: Notifier>(
    config: &AppConfig,
    options: RecordOptions,
    notifier: &N,
) -> ExitCode {
    let mut presenter = Presenter::new();

    let candidates = config
        .recording_formats()
        .unwrap_or_else(|| RECORDING_CANDIDATES.to_vec());
    let mut recorder = RecorderController::new(
        CpalCaptureDevice::new(),
        NativeCapabilities::new(),
        candidates,
        RecorderTimings::from(config),
    );

    if let Err(e) = recorder.start().await {
        presenter.error(&e.to_string());
        let title = match e {
            RecorderError::Permission(_) => "Microphone access needed",
            RecorderError::UnsupportedEnvironment => "Voice messages unavailable",
            _ => "Recording failed",
        };
        alert(notifier, title, &e.to_string(), AlertLevel::Error).await;
        return ExitCode::from(EXIT_ERROR);
    }

    let shutdown = ShutdownSignal::new();
    shutdown.setup();

    let bars = recorder.visualizer();
    let mut redraw = interval(config.visualizer_interval_or_default().as_std());
    redraw.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut lines = spawn_line_reader(io::BufReader::new(io::stdin()));

    presenter.start_spinner("Recording...");

    let finish = loop {
        tokio::select! {
            _ = redraw.tick() => {
                let locked = recorder.state() == RecorderState::Capturing { locked: true };
                presenter.update_recording_status(
                    &bars.borrow(),
                    recorder.elapsed_secs(),
                    locked,
                    recorder.lock_available(),
                );
                if recorder.max_duration_reached(options.max_duration) {
                    presenter.info(&format!("Reached max duration ({})", options.max_duration));
                    break Finish::Send;
                }
            }
            line = lines.recv() => match line {
                Some(Ok(line)) => match line.trim() {
                    "" | "s" => break Finish::Send,
                    "c" => break Finish::Cancel,
                    "l" => match recorder.toggle_lock() {
                        Ok(locked) => debug!(locked, "lock toggled from keyboard"),
                        Err(e) => presenter.warn(&e.to_string()),
                    },
                    other => presenter.warn(&format!("Unknown key '{}'", other)),
                },
                // stdin closed: treat like pressing Enter
                None => break Finish::Send,
                Some(Err(e)) => {
                    debug!(error = %e, "stdin read failed");
                    break Finish::Send;
                }
            },
            _ = shutdown.wait() => break Finish::Cancel,
        }
    };

    match finish {
        Finish::Cancel => {
            presenter.stop_spinner();
            if let Err(e) = recorder.cancel() {
                presenter.error(&e.to_string());
                return ExitCode::from(EXIT_ERROR);
            }
            presenter.info("Recording cancelled");
            ExitCode::from(EXIT_SUCCESS)
        }
        Finish::Send => {
            let clip = match recorder.stop() {
                Ok(clip) => clip,
                Err(e) => {
                    presenter.stop_spinner();
                    presenter.error(&e.to_string());
                    return ExitCode::from(EXIT_ERROR);
                }
            };
            presenter.spinner_success(&format!(
                "Recorded {}s ({}, {})",
                clip.duration_secs(),
                clip.encoding(),
                clip.human_readable_size()
            ));

            match options.out {
                Some(path) => match tokio::fs::write(&path, clip.data()).await {
                    Ok(()) => {
                        presenter.output(&path.to_string_lossy());
                        ExitCode::from(EXIT_SUCCESS)
                    }
                    Err(e) => {
                        presenter.error(&format!("Failed to save {}: {}", path.display(), e));
                        ExitCode::from(EXIT_ERROR)
                    }
                },
                None => {
                    let room = open_room(config, download_dir(config));
                    match room.send_clip(clip, &options.text).await {
                        Ok(message) => {
                            presenter.output(message.id.as_str());
                            ExitCode::from(EXIT_SUCCESS)
                        }
                        Err(e) => room_failure(&presenter, &e),
                    }
                }
            }
        }
    }
}
