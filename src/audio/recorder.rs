//! Microphone capture.
//!
//! This module records audio from the configured input device into a WAV
//! file. Devices that cannot deliver the configured rate directly are
//! resampled and downmixed to mono on the fly.

use anyhow::{Context, Result, anyhow};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, Sample, SizedSample, SupportedStreamConfig};
use hound::{WavSpec, WavWriter};
use log::{debug, error, info, warn};
use std::collections::HashSet;
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc::UnboundedSender;

use super::Audio;
use super::resample::Resample;
use crate::config::{AudioConfig, Config, SampleFormat};

type WavWriterHandle = Arc<Mutex<Option<WavWriter<BufWriter<File>>>>>;

/// Records the microphone between `start_recording` and `stop_recording`.
///
/// The stream is created once and paused while idle. Each recording
/// truncates the WAV file at `paths.recording_path`.
pub struct AudioRecorder {
    writer: WavWriterHandle,
    stream: cpal::Stream,
    recording_path: PathBuf,
    spec: WavSpec,
    tx_audio: UnboundedSender<Audio>,
}

fn find_device(host: &cpal::Host, wanted: Option<&str>) -> Result<cpal::Device> {
    let names: HashSet<_> = host.input_devices()?.flat_map(|d| d.name()).collect();
    debug!("Available input devices: {names:?}");

    match wanted {
        Some(device_name) => host
            .input_devices()?
            .find(|d| d.name().map(|name| name == device_name).unwrap_or(false))
            .ok_or_else(|| {
                anyhow!("Requested audio device '{device_name}' not found, available: {names:?}")
            }),
        None => host
            .default_input_device()
            .ok_or_else(|| anyhow!("No default input device found")),
    }
}

/// Picks a device configuration matching `config`, or the device default.
fn stream_config(device: &cpal::Device, config: &AudioConfig) -> SupportedStreamConfig {
    let sample_rate = cpal::SampleRate(config.sample_rate);
    let exact = device.supported_input_configs().ok().and_then(|mut ranges| {
        ranges.find_map(|range| {
            (range.min_sample_rate() <= sample_rate
                && range.max_sample_rate() >= sample_rate
                && range.channels() == config.channels
                && range.sample_format() == cpal::SampleFormat::from(config.sample_format))
            .then(|| range.with_sample_rate(sample_rate))
        })
    });
    if let Some(exact) = exact {
        return exact;
    }
    debug!("Could not find a matching input config");
    match device.default_input_config() {
        Ok(default_config) => default_config,
        Err(err) => {
            warn!("No default input config ({err}), falling back to the configured one");
            SupportedStreamConfig::new(
                config.channels,
                sample_rate,
                cpal::SupportedBufferSize::Unknown,
                config.sample_format.into(),
            )
        }
    }
}

impl AudioRecorder {
    pub fn new(config: &Config, tx_audio: UnboundedSender<Audio>) -> Result<Self> {
        let host = cpal::default_host();
        debug!("Default host: {:?}", host.id());
        let device = find_device(&host, config.audio.device.as_deref())?;
        info!("Using input device: {}", device.name()?);

        let stream_config = stream_config(&device, &config.audio);
        debug!("Using stream config: {stream_config:?}");

        let resample = (stream_config.sample_rate().0 != config.audio.sample_rate
            || stream_config.channels() != config.audio.channels)
            .then(|| Resample {
                samplerate_in: stream_config.sample_rate().0,
                samplerate_out: config.audio.sample_rate,
                in_channels: stream_config.channels(),
            });
        let spec = WavSpec {
            channels: if resample.is_some() {
                1
            } else {
                config.audio.channels
            },
            sample_rate: config.audio.sample_rate,
            bits_per_sample: config.audio.sample_format.bits_per_sample(),
            sample_format: match config.audio.sample_format {
                SampleFormat::F32 => hound::SampleFormat::Float,
                SampleFormat::I16 => hound::SampleFormat::Int,
            },
        };

        std::fs::create_dir_all(&config.paths.cache_dir).context("Creating cache directory")?;

        let writer: WavWriterHandle = Arc::new(Mutex::new(None));
        let target = config.audio.sample_format;
        let stream = match stream_config.sample_format() {
            cpal::SampleFormat::F32 => {
                build_stream::<f32>(&device, &stream_config, writer.clone(), resample, target)
            }
            cpal::SampleFormat::I16 => {
                build_stream::<i16>(&device, &stream_config, writer.clone(), resample, target)
            }
            cpal::SampleFormat::U16 => {
                build_stream::<u16>(&device, &stream_config, writer.clone(), resample, target)
            }
            other => Err(anyhow!("Unsupported input sample format {other:?}")),
        }?;
        stream.pause().context("Cannot pause")?;

        Ok(Self {
            writer,
            stream,
            recording_path: config.paths.recording_path.clone(),
            spec,
            tx_audio,
        })
    }

    /// Starts capturing into a fresh WAV file and asks for the model to be warmed.
    pub fn start_recording(&self) -> Result<()> {
        let writer = WavWriter::create(&self.recording_path, self.spec)?;
        *self
            .writer
            .lock()
            .map_err(|e| anyhow!("Failed to lock writer: {e}"))? = Some(writer);
        self.stream.play()?;
        self.tx_audio.send(Audio::Warm)?;
        Ok(())
    }

    /// Stops capturing, finalizes the file and hands it to the transcriber.
    pub fn stop_recording(&self) -> Result<()> {
        self.stream.pause()?;
        let writer = self
            .writer
            .lock()
            .map_err(|e| anyhow!("Failed to lock writer: {e}"))?
            .take()
            .ok_or_else(|| anyhow!("Writer is missing"))?;
        writer.finalize()?;
        self.tx_audio.send(Audio::Path(self.recording_path.clone()))?;
        Ok(())
    }
}

fn build_stream<T>(
    device: &cpal::Device,
    config: &SupportedStreamConfig,
    writer: WavWriterHandle,
    resample: Option<Resample>,
    target: SampleFormat,
) -> Result<cpal::Stream>
where
    T: SizedSample,
    f32: FromSample<T>,
{
    let stream = device
        .build_input_stream(
            &config.config(),
            move |data: &[T], _: &_| write_input_data(data, &writer, resample, target),
            |err| error!("Audio stream error: {err}"),
            None,
        )
        .context("Failed to create audio stream")?;
    Ok(stream)
}

fn write_input_data<T>(
    input: &[T],
    writer: &WavWriterHandle,
    resample: Option<Resample>,
    target: SampleFormat,
) where
    T: SizedSample,
    f32: FromSample<T>,
{
    let samples: Vec<f32> = input.iter().map(|&s| f32::from_sample(s)).collect();
    let samples = match resample {
        Some(resample) => resample.to_mono(&samples),
        None => samples,
    };
    // Never block the audio thread; a contended chunk is dropped.
    let Ok(mut guard) = writer.try_lock() else {
        return;
    };
    let Some(writer) = guard.as_mut() else {
        return;
    };
    for sample in samples {
        let written = match target {
            SampleFormat::F32 => writer.write_sample(sample),
            SampleFormat::I16 => writer.write_sample((sample * i16::MAX as f32) as i16),
        };
        if let Err(err) = written {
            error!("Cannot write sample: {err}");
            return;
        }
    }
}
