//! Microphone capture using cpal
//!
//! Prefers speech-friendly settings:
//! - 16kHz sample rate when the device offers it, otherwise its minimum
//! - Mono (multi-channel input is mixed down)
//! - FLAC or WAV produced on flush
//!
//! `cpal::Stream` is not `Send`, so each stream lives on its own thread and
//! is dropped there when the capture is released.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc as std_mpsc, Arc, Mutex};
use std::thread::JoinHandle;

use async_trait::async_trait;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{BuildStreamError, SampleFormat, SampleRate, StreamConfig};
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use super::flac_encoder::{encode_to_flac, TARGET_SAMPLE_RATE};
use super::wav_encoder::encode_to_wav;
use crate::application::ports::{CaptureDevice, CaptureError, CaptureStream, ChunkSender};
use crate::domain::clip::AudioEncoding;
use crate::domain::visualizer::{byte_frequency_data, FFT_SIZE};

/// State shared between the cpal callback and the stream handle
struct Shared {
    sample_rate: u32,
    recording: AtomicBool,
    /// Mono PCM captured since `start`
    pcm: Mutex<Vec<i16>>,
    /// Most recent `FFT_SIZE` mono samples for the visualizer
    window: Mutex<VecDeque<f32>>,
    target: Mutex<Option<(AudioEncoding, ChunkSender)>>,
}

impl Shared {
    fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            recording: AtomicBool::new(false),
            pcm: Mutex::new(Vec::new()),
            window: Mutex::new(VecDeque::with_capacity(FFT_SIZE)),
            target: Mutex::new(None),
        }
    }

    /// Called from the audio callback with interleaved samples
    fn ingest(&self, interleaved: &[f32], channels: u16) {
        let mono = mix_down(interleaved, channels);

        if let Ok(mut window) = self.window.lock() {
            for &sample in &mono {
                if window.len() == FFT_SIZE {
                    window.pop_front();
                }
                window.push_back(sample);
            }
        }

        if self.recording.load(Ordering::SeqCst) {
            if let Ok(mut pcm) = self.pcm.lock() {
                pcm.extend(mono.iter().map(|&s| to_i16(s)));
            }
        }
    }
}

/// Average interleaved frames into one channel
fn mix_down(samples: &[f32], channels: u16) -> Vec<f32> {
    if channels <= 1 {
        return samples.to_vec();
    }

    samples
        .chunks(channels as usize)
        .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
        .collect()
}

fn to_i16(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * 32767.0) as i16
}

/// Default input device
#[derive(Debug, Default, Clone, Copy)]
pub struct CpalCaptureDevice;

impl CpalCaptureDevice {
    pub fn new() -> Self {
        Self
    }

    fn input_device() -> Result<cpal::Device, CaptureError> {
        let host = cpal::default_host();
        host.default_input_device()
            .ok_or(CaptureError::DeviceUnavailable)
    }

    /// Pick an input configuration, preferring mono and 16kHz
    fn input_config(device: &cpal::Device) -> Result<(StreamConfig, SampleFormat), CaptureError> {
        let supported_configs = device
            .supported_input_configs()
            .map_err(|e| CaptureError::PermissionDenied(e.to_string()))?;

        let mut best_config: Option<cpal::SupportedStreamConfigRange> = None;

        for config in supported_configs {
            if config.sample_format() != SampleFormat::I16
                && config.sample_format() != SampleFormat::F32
            {
                continue;
            }

            let includes_target = config.min_sample_rate().0 <= TARGET_SAMPLE_RATE
                && config.max_sample_rate().0 >= TARGET_SAMPLE_RATE;

            let is_better = match &best_config {
                None => true,
                Some(current) => {
                    let fewer_channels = config.channels() < current.channels();
                    let better_rate =
                        includes_target && current.min_sample_rate().0 > TARGET_SAMPLE_RATE;
                    fewer_channels || better_rate
                }
            };
            if is_better {
                best_config = Some(config);
            }
        }

        let config_range = best_config.ok_or_else(|| {
            CaptureError::StartFailed("No suitable input config found".into())
        })?;

        let sample_rate = if config_range.min_sample_rate().0 <= TARGET_SAMPLE_RATE
            && config_range.max_sample_rate().0 >= TARGET_SAMPLE_RATE
        {
            SampleRate(TARGET_SAMPLE_RATE)
        } else {
            config_range.min_sample_rate()
        };

        let sample_format = config_range.sample_format();
        let config = StreamConfig {
            channels: config_range.channels(),
            sample_rate,
            buffer_size: cpal::BufferSize::Default,
        };

        Ok((config, sample_format))
    }

    /// Open and start the input stream. Runs on the capture thread.
    fn open_stream() -> Result<(cpal::Stream, Arc<Shared>), CaptureError> {
        let device = Self::input_device()?;
        let (config, sample_format) = Self::input_config(&device)?;
        let channels = config.channels;
        let shared = Arc::new(Shared::new(config.sample_rate.0));

        info!(
            device = %device.name().unwrap_or_default(),
            sample_rate = config.sample_rate.0,
            channels,
            "opening input stream"
        );

        let on_error = |err: cpal::StreamError| warn!(error = %err, "audio input stream error");

        let stream = match sample_format {
            SampleFormat::I16 => {
                let shared = Arc::clone(&shared);
                device.build_input_stream(
                    &config,
                    move |data: &[i16], _: &cpal::InputCallbackInfo| {
                        let floats: Vec<f32> =
                            data.iter().map(|&s| f32::from(s) / 32768.0).collect();
                        shared.ingest(&floats, channels);
                    },
                    on_error,
                    None,
                )
            }
            SampleFormat::F32 => {
                let shared = Arc::clone(&shared);
                device.build_input_stream(
                    &config,
                    move |data: &[f32], _: &cpal::InputCallbackInfo| {
                        shared.ingest(data, channels);
                    },
                    on_error,
                    None,
                )
            }
            other => {
                return Err(CaptureError::StartFailed(format!(
                    "Unsupported sample format: {other:?}"
                )))
            }
        }
        .map_err(|e| match e {
            BuildStreamError::DeviceNotAvailable => CaptureError::DeviceUnavailable,
            other => CaptureError::PermissionDenied(other.to_string()),
        })?;

        stream
            .play()
            .map_err(|e| CaptureError::StartFailed(e.to_string()))?;

        Ok((stream, shared))
    }
}

/// Body of the capture thread: open, report, then hold the stream until
/// the shutdown channel closes.
fn run_capture_thread(
    ready: oneshot::Sender<Result<Arc<Shared>, CaptureError>>,
    shutdown: std_mpsc::Receiver<()>,
) {
    let (stream, shared) = match CpalCaptureDevice::open_stream() {
        Ok(opened) => opened,
        Err(e) => {
            let _ = ready.send(Err(e));
            return;
        }
    };

    if ready.send(Ok(shared)).is_err() {
        return;
    }

    // blocks until every sender is gone
    let _ = shutdown.recv();
    drop(stream);
    debug!("input stream closed");
}

#[async_trait]
impl CaptureDevice for CpalCaptureDevice {
    async fn request_access(&self) -> Result<Box<dyn CaptureStream>, CaptureError> {
        let (ready_tx, ready_rx) = oneshot::channel();
        let (shutdown_tx, shutdown_rx) = std_mpsc::channel();

        let thread = std::thread::Builder::new()
            .name("voxroom-capture".into())
            .spawn(move || run_capture_thread(ready_tx, shutdown_rx))
            .map_err(|e| CaptureError::StartFailed(e.to_string()))?;

        let shared = ready_rx
            .await
            .map_err(|_| CaptureError::StartFailed("capture thread exited".into()))??;

        Ok(Box::new(CpalCaptureStream {
            shared,
            shutdown: Mutex::new(Some(shutdown_tx)),
            thread: Mutex::new(Some(thread)),
        }))
    }
}

/// A live microphone stream
pub struct CpalCaptureStream {
    shared: Arc<Shared>,
    shutdown: Mutex<Option<std_mpsc::Sender<()>>>,
    thread: Mutex<Option<JoinHandle<()>>>,
}

impl CpalCaptureStream {
    fn encode(encoding: AudioEncoding, pcm: &[i16], sample_rate: u32) -> Result<Vec<u8>, CaptureError> {
        let encoded = match encoding {
            AudioEncoding::Flac => encode_to_flac(pcm, sample_rate),
            AudioEncoding::Wav => encode_to_wav(pcm, sample_rate),
            other => {
                return Err(CaptureError::Flush(format!("cannot encode {other}")));
            }
        };
        encoded.map_err(|e| CaptureError::Flush(e.to_string()))
    }
}

impl CaptureStream for CpalCaptureStream {
    fn start(&self, encoding: AudioEncoding, chunks: ChunkSender) -> Result<(), CaptureError> {
        if !matches!(encoding, AudioEncoding::Flac | AudioEncoding::Wav) {
            return Err(CaptureError::StartFailed(format!(
                "native capture cannot produce {encoding}"
            )));
        }

        let mut target = self
            .shared
            .target
            .lock()
            .map_err(|_| CaptureError::StartFailed("capture state poisoned".into()))?;
        if let Ok(mut pcm) = self.shared.pcm.lock() {
            pcm.clear();
        }
        *target = Some((encoding, chunks));
        self.shared.recording.store(true, Ordering::SeqCst);
        Ok(())
    }

    /// Encode everything captured so far and send it as the final chunk.
    /// Nothing is sent when no audio arrived.
    fn flush(&self) -> Result<(), CaptureError> {
        self.shared.recording.store(false, Ordering::SeqCst);

        let target = self
            .shared
            .target
            .lock()
            .map_err(|_| CaptureError::Flush("capture state poisoned".into()))?
            .take();
        let Some((encoding, chunks)) = target else {
            return Err(CaptureError::Flush("capture was never started".into()));
        };

        let pcm = self
            .shared
            .pcm
            .lock()
            .map(|mut pcm| std::mem::take(&mut *pcm))
            .map_err(|_| CaptureError::Flush("capture buffer poisoned".into()))?;
        if pcm.is_empty() {
            return Ok(());
        }

        let bytes = Self::encode(encoding, &pcm, self.shared.sample_rate)?;
        debug!(samples = pcm.len(), bytes = bytes.len(), "capture flushed");
        chunks
            .send(bytes)
            .map_err(|_| CaptureError::Flush("chunk receiver dropped".into()))
    }

    fn frequency_data(&self, out: &mut [u8]) -> Result<usize, CaptureError> {
        let samples: Vec<f32> = self
            .shared
            .window
            .lock()
            .map_err(|_| CaptureError::Visualizer("level window poisoned".into()))?
            .iter()
            .copied()
            .collect();
        Ok(byte_frequency_data(&samples, out))
    }

    fn release(&self) {
        self.shared.recording.store(false, Ordering::SeqCst);
        if let Ok(mut shutdown) = self.shutdown.lock() {
            shutdown.take();
        }
        let thread = self.thread.lock().ok().and_then(|mut t| t.take());
        if let Some(thread) = thread {
            if thread.join().is_err() {
                warn!("capture thread panicked");
            }
        }
    }
}

impl Drop for CpalCaptureStream {
    fn drop(&mut self) {
        self.release();
    }
}
