//! Rodio-based playback adapter
//!
//! The output stream is not `Send`, so it is opened on a dedicated thread
//! and kept alive there for as long as the backend exists. Handles only hold
//! the `Send` stream handle.

use std::fs::File;
use std::io::{self, BufReader, Cursor, Read, Seek, SeekFrom};
use std::sync::{mpsc as std_mpsc, Arc};
use std::time::{Duration, Instant};

use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink, Source};
use tracing::debug;

use crate::application::ports::{AudioBackend, AudioHandle, ClipSource, PlaybackError};
use crate::domain::clip::AudioEncoding;

/// Clip bytes shared between a handle and its decoders
#[derive(Clone)]
struct SharedBytes(Arc<Vec<u8>>);

impl AsRef<[u8]> for SharedBytes {
    fn as_ref(&self) -> &[u8] {
        self.0.as_slice()
    }
}

/// Streaming reader over a clip. Files are read on demand, never up front.
enum ClipReader {
    File(BufReader<File>),
    Memory(Cursor<SharedBytes>),
}

impl ClipReader {
    fn open(source: &ClipSource) -> Result<Self, PlaybackError> {
        match source {
            ClipSource::File(path) => File::open(path)
                .map(|file| Self::File(BufReader::new(file)))
                .map_err(|e| PlaybackError::Source(format!("{}: {}", path.display(), e))),
            ClipSource::Inline { data, .. } => {
                Ok(Self::Memory(Cursor::new(SharedBytes(Arc::clone(data)))))
            }
        }
    }
}

impl Read for ClipReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Self::File(reader) => reader.read(buf),
            Self::Memory(reader) => reader.read(buf),
        }
    }
}

impl Seek for ClipReader {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        match self {
            Self::File(reader) => reader.seek(pos),
            Self::Memory(reader) => reader.seek(pos),
        }
    }
}

type ClipDecoder = Decoder<ClipReader>;

/// Build a decoder for `reader`. A hint forces that container's decoder;
/// without one rodio sniffs the format.
fn decode(reader: ClipReader, hint: Option<AudioEncoding>) -> Result<ClipDecoder, PlaybackError> {
    let decoder = match hint {
        Some(AudioEncoding::Wav) => Decoder::new_wav(reader),
        Some(AudioEncoding::Flac) => Decoder::new_flac(reader),
        Some(AudioEncoding::Ogg) => Decoder::new_vorbis(reader),
        Some(
            encoding @ (AudioEncoding::WebmOpus
            | AudioEncoding::Webm
            | AudioEncoding::Mp4
            | AudioEncoding::OggOpus),
        ) => {
            return Err(PlaybackError::Decode(format!("no decoder for {encoding}")));
        }
        Some(AudioEncoding::Mp3) | None => Decoder::new(reader),
    };
    decoder.map_err(|e| PlaybackError::Decode(e.to_string()))
}

/// Clip length from the container header; `None` when it cannot be probed
fn probe_duration(source: &ClipSource, hint: Option<AudioEncoding>) -> Option<Duration> {
    let reader = ClipReader::open(source).ok()?;
    decode(reader, hint).ok()?.total_duration()
}

/// Audio backend on the default output device
pub struct RodioBackend {
    output: OutputStreamHandle,
    // dropping this ends the output thread
    _shutdown: std_mpsc::Sender<()>,
}

impl RodioBackend {
    /// Open the default output device
    pub fn new() -> Result<Self, PlaybackError> {
        let (ready_tx, ready_rx) = std_mpsc::channel();
        let (shutdown_tx, shutdown_rx) = std_mpsc::channel::<()>();

        std::thread::Builder::new()
            .name("voxroom-output".into())
            .spawn(move || {
                let (stream, handle) = match OutputStream::try_default() {
                    Ok(opened) => opened,
                    Err(e) => {
                        let _ = ready_tx.send(Err(PlaybackError::DeviceUnavailable(e.to_string())));
                        return;
                    }
                };
                if ready_tx.send(Ok(handle)).is_err() {
                    return;
                }
                let _ = shutdown_rx.recv();
                drop(stream);
                debug!("output stream closed");
            })
            .map_err(|e| PlaybackError::DeviceUnavailable(e.to_string()))?;

        let output = ready_rx
            .recv()
            .map_err(|_| PlaybackError::DeviceUnavailable("output thread exited".into()))??;

        Ok(Self {
            output,
            _shutdown: shutdown_tx,
        })
    }
}

impl AudioBackend for RodioBackend {
    fn load(
        &self,
        source: &ClipSource,
        hint: Option<AudioEncoding>,
    ) -> Result<Box<dyn AudioHandle>, PlaybackError> {
        if let ClipSource::File(path) = source {
            if !path.is_file() {
                return Err(PlaybackError::Source(format!("{} not found", path.display())));
            }
        }

        // header parse only; a clip that cannot be probed still gets a handle
        let duration = probe_duration(source, hint);

        Ok(Box::new(RodioHandle {
            output: self.output.clone(),
            source: source.clone(),
            hint,
            duration,
            sink: None,
            played: Duration::ZERO,
            resumed_at: None,
        }))
    }
}

/// One clip on the rodio output.
///
/// Position is tracked from wall time between play and pause.
pub struct RodioHandle {
    output: OutputStreamHandle,
    source: ClipSource,
    hint: Option<AudioEncoding>,
    duration: Option<Duration>,
    sink: Option<Sink>,
    played: Duration,
    resumed_at: Option<Instant>,
}

impl AudioHandle for RodioHandle {
    fn play(&mut self) -> Result<(), PlaybackError> {
        match &self.sink {
            Some(sink) => sink.play(),
            None => {
                let decoder = decode(ClipReader::open(&self.source)?, self.hint)?;
                let sink = Sink::try_new(&self.output)
                    .map_err(|e| PlaybackError::Output(e.to_string()))?;
                sink.append(decoder);
                self.sink = Some(sink);
                self.played = Duration::ZERO;
            }
        }
        self.resumed_at = Some(Instant::now());
        Ok(())
    }

    fn pause(&mut self) {
        if let Some(sink) = &self.sink {
            sink.pause();
        }
        if let Some(resumed_at) = self.resumed_at.take() {
            self.played += resumed_at.elapsed();
        }
    }

    fn rewind(&mut self) -> Result<(), PlaybackError> {
        if let Some(sink) = self.sink.take() {
            sink.stop();
        }
        self.played = Duration::ZERO;
        self.resumed_at = None;
        Ok(())
    }

    fn position(&self) -> Duration {
        let live = self
            .resumed_at
            .map(|resumed_at| resumed_at.elapsed())
            .unwrap_or(Duration::ZERO);
        let position = self.played + live;
        match self.duration {
            Some(total) => position.min(total),
            None => position,
        }
    }

    fn duration(&self) -> Option<Duration> {
        self.duration
    }

    fn is_finished(&self) -> bool {
        self.sink.as_ref().is_some_and(|sink| sink.empty())
    }
}

impl Drop for RodioHandle {
    fn drop(&mut self) {
        if let Some(sink) = self.sink.take() {
            sink.stop();
        }
    }
}
