use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, Sample};
use hound::{WavSpec, WavWriter};
use log::{error, info, warn};
use std::fs::{self, File};
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::permission::MicrophoneAccess;
use super::recorder::{
    cleanup_recording_file, ActiveCapture, AudioPayload, CaptureBackend, CaptureLimits,
    RecorderError, MIME_WAV,
};

/// Size of the RIFF/WAVE header hound writes for 16-bit PCM
const WAV_HEADER_BYTES: u64 = 44;
const BYTES_PER_SAMPLE: u64 = 2;

type WavFileWriter = WavWriter<BufWriter<File>>;

/// Records from the default input device into a mono 16-bit WAV file.
pub struct NativeRecorder {
    recordings_dir: PathBuf,
    microphone: Box<dyn MicrophoneAccess>,
}

impl NativeRecorder {
    pub fn new(recordings_dir: impl Into<PathBuf>, microphone: Box<dyn MicrophoneAccess>) -> Self {
        Self {
            recordings_dir: recordings_dir.into(),
            microphone,
        }
    }

    fn create_wav_writer(file_path: &Path, spec: WavSpec) -> Result<WavFileWriter, RecorderError> {
        let file = File::create(file_path)?;
        let buf_writer = BufWriter::new(file);
        Ok(WavWriter::new(buf_writer, spec)?)
    }
}

impl CaptureBackend for NativeRecorder {
    fn name(&self) -> &'static str {
        "native"
    }

    fn begin(&mut self, limits: CaptureLimits) -> Result<Box<dyn ActiveCapture>, RecorderError> {
        if !self.microphone.request() {
            return Err(RecorderError::PermissionDenied);
        }

        fs::create_dir_all(&self.recordings_dir)?;

        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or(RecorderError::NoInputDevice)?;
        let config = device
            .default_input_config()
            .map_err(|e| RecorderError::DeviceError(e.to_string()))?;

        let sample_rate = config.sample_rate().0;
        let channels = config.channels() as usize;

        // Keep the device rate, downmix to mono
        let spec = WavSpec {
            channels: 1,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };

        let file_path = self.recordings_dir.join(generate_filename());
        let writer = Self::create_wav_writer(&file_path, spec)?;
        let sink = Arc::new(SampleSink::new(writer, sample_budget(&limits, sample_rate)));

        let stream_config: cpal::StreamConfig = config.clone().into();
        let stream = match config.sample_format() {
            cpal::SampleFormat::I8 => {
                build_input_stream::<i8>(&device, &stream_config, channels, sink.clone())
            }
            cpal::SampleFormat::I16 => {
                build_input_stream::<i16>(&device, &stream_config, channels, sink.clone())
            }
            cpal::SampleFormat::I32 => {
                build_input_stream::<i32>(&device, &stream_config, channels, sink.clone())
            }
            cpal::SampleFormat::F32 => {
                build_input_stream::<f32>(&device, &stream_config, channels, sink.clone())
            }
            other => Err(RecorderError::DeviceError(format!(
                "unsupported sample format {:?}",
                other
            ))),
        };

        let stream = match stream.and_then(|s| s.play().map(|_| s).map_err(Into::into)) {
            Ok(stream) => stream,
            Err(e) => {
                sink.close();
                cleanup_recording_file(&file_path);
                return Err(e);
            }
        };

        info!(
            "Native capture started: {}Hz, {} channel(s), {:?}",
            sample_rate, channels, file_path
        );

        Ok(Box::new(NativeCapture {
            stream,
            sink,
            file_path,
            sample_rate,
        }))
    }
}

/// A live native capture session. Not `Send`: it owns a `cpal::Stream`.
struct NativeCapture {
    stream: cpal::Stream,
    sink: Arc<SampleSink>,
    file_path: PathBuf,
    sample_rate: u32,
}

impl ActiveCapture for NativeCapture {
    fn finish(self: Box<Self>) -> Result<AudioPayload, RecorderError> {
        let NativeCapture {
            stream,
            sink,
            file_path,
            sample_rate,
        } = *self;

        stream.pause().ok();
        drop(stream);

        finalize_payload(&sink, file_path, sample_rate)
    }

    fn abort(self: Box<Self>) {
        let NativeCapture {
            stream,
            sink,
            file_path,
            ..
        } = *self;

        stream.pause().ok();
        drop(stream);
        if let Err(e) = sink.close() {
            warn!("Error finalizing aborted recording: {}", e);
        }
        cleanup_recording_file(&file_path);
        info!("Native capture aborted");
    }
}

/// Close the WAV file and wrap it as a payload. A file that fails to
/// finalize is removed rather than left half-written.
fn finalize_payload(
    sink: &SampleSink,
    file_path: PathBuf,
    sample_rate: u32,
) -> Result<AudioPayload, RecorderError> {
    let written = match sink.close() {
        Ok(written) => written,
        Err(e) => {
            error!("Error finalizing recording {:?}: {}", file_path, e);
            cleanup_recording_file(&file_path);
            return Err(e);
        }
    };
    let duration = Duration::from_millis(written * 1000 / u64::from(sample_rate.max(1)));
    let truncated = sink.truncated.load(Ordering::Relaxed);

    info!(
        "Native capture stopped: {}ms ({} samples){}",
        duration.as_millis(),
        written,
        if truncated { ", truncated" } else { "" }
    );

    let mut payload = AudioPayload::from_file(file_path, MIME_WAV);
    payload.duration = duration;
    payload.truncated = truncated;
    Ok(payload)
}

/// Shared between the audio callback and the capture handle.
struct SampleSink {
    writer: Mutex<Option<WavFileWriter>>,
    written: AtomicU64,
    budget: Option<u64>,
    truncated: AtomicBool,
}

impl SampleSink {
    fn new(writer: WavFileWriter, budget: Option<u64>) -> Self {
        Self {
            writer: Mutex::new(Some(writer)),
            written: AtomicU64::new(0),
            budget,
            truncated: AtomicBool::new(false),
        }
    }

    fn write(&self, samples: &[f32]) {
        let Ok(mut guard) = self.writer.lock() else {
            return;
        };
        let Some(writer) = guard.as_mut() else {
            return;
        };

        let written = self.written.load(Ordering::Relaxed);
        let allowed = match self.budget {
            Some(budget) => {
                let remaining = budget.saturating_sub(written) as usize;
                if remaining < samples.len() {
                    self.truncated.store(true, Ordering::Relaxed);
                }
                remaining.min(samples.len())
            }
            None => samples.len(),
        };

        for sample_f32 in &samples[..allowed] {
            let clamped = sample_f32.clamp(-1.0, 1.0);
            let sample_i16 = (clamped * 32767.0) as i16;
            if let Err(e) = writer.write_sample(sample_i16) {
                error!("Error writing sample: {}", e);
                return;
            }
        }
        self.written.fetch_add(allowed as u64, Ordering::Relaxed);
    }

    /// Finalize the WAV header. Later writes are dropped. Returns the number
    /// of samples written.
    fn close(&self) -> Result<u64, RecorderError> {
        let writer = match self.writer.lock() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if let Some(writer) = writer {
            writer.finalize()?;
        }
        Ok(self.written.load(Ordering::Relaxed))
    }
}

/// Number of mono samples allowed by the limits at this sample rate.
fn sample_budget(limits: &CaptureLimits, sample_rate: u32) -> Option<u64> {
    let by_duration = limits
        .max_duration
        .map(|d| (d.as_millis() as u64).saturating_mul(u64::from(sample_rate)) / 1000);
    let by_bytes = limits
        .max_bytes
        .map(|b| b.saturating_sub(WAV_HEADER_BYTES) / BYTES_PER_SAMPLE);

    match (by_duration, by_bytes) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, b) => a.or(b),
    }
}

/// Average interleaved frames down to one channel.
fn downmix<T>(input: &[T], channels: usize) -> Vec<f32>
where
    T: Sample,
    f32: FromSample<T>,
{
    let channels = channels.max(1);
    input
        .chunks(channels)
        .map(|frame| {
            let sum: f32 = frame.iter().map(|&s| s.to_sample::<f32>()).sum();
            sum / frame.len() as f32
        })
        .collect()
}

fn build_input_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    channels: usize,
    sink: Arc<SampleSink>,
) -> Result<cpal::Stream, RecorderError>
where
    T: Sample + cpal::SizedSample,
    f32: FromSample<T>,
{
    let err_fn = |err| {
        error!("Stream error: {}", err);
    };

    let stream = device.build_input_stream(
        config,
        move |data: &[T], _: &cpal::InputCallbackInfo| {
            if data.is_empty() {
                return;
            }
            sink.write(&downmix(data, channels));
        },
        err_fn,
        None,
    )?;

    Ok(stream)
}

fn generate_filename() -> String {
    format!("recording_{}.wav", uuid::Uuid::new_v4())
}

/// Clean up recordings left behind by a previous run
/// Only deletes files matching pattern: recording_*.wav
pub fn cleanup_old_recordings(recordings_dir: &Path) {
    let entries = match fs::read_dir(recordings_dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return,
        Err(e) => {
            warn!("Failed to read recordings directory {:?}: {}", recordings_dir, e);
            return;
        }
    };

    let mut cleaned = 0;
    for entry in entries.flatten() {
        let path = entry.path();
        let filename = path.file_name().and_then(|n| n.to_str()).unwrap_or("");

        let is_old_recording = filename.starts_with("recording_") && filename.ends_with(".wav");
        if !is_old_recording {
            continue;
        }

        if fs::remove_file(&path).is_ok() {
            cleaned += 1;
        }
    }

    if cleaned > 0 {
        info!("Cleaned up {} old recording(s)", cleaned);
    }
}
