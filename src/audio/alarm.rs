//! Alarm playback for timed reminders.

use std::f32::consts::TAU;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, Sample, SizedSample};
use hound::WavReader;
use log::{debug, error};

use super::resample::{audio_resample, downmix};
use crate::error::Error;
use crate::speech::Alarm;

const BEEP_RATE: u32 = 44100;
const BEEP_HZ: f32 = 880.0;
const BEEP_COUNT: usize = 3;
const BEEP_ON: Duration = Duration::from_millis(200);
const BEEP_OFF: Duration = Duration::from_millis(150);

/// Mono audio ready for playback.
#[derive(Debug, Clone, PartialEq)]
pub struct Clip {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl Clip {
    pub fn duration(&self) -> Duration {
        Duration::from_secs_f64(self.samples.len() as f64 / self.sample_rate as f64)
    }

    /// Resamples to `sample_rate` unless already there.
    pub fn at_rate(self, sample_rate: u32) -> Self {
        if self.sample_rate == sample_rate {
            return self;
        }
        Self {
            samples: audio_resample(&self.samples, self.sample_rate, sample_rate, 1),
            sample_rate,
        }
    }

    /// Three short sine beeps separated by silence.
    pub fn beeps() -> Self {
        let on = (BEEP_RATE as f32 * BEEP_ON.as_secs_f32()) as usize;
        let off = (BEEP_RATE as f32 * BEEP_OFF.as_secs_f32()) as usize;
        let mut samples = Vec::with_capacity(BEEP_COUNT * (on + off));
        for _ in 0..BEEP_COUNT {
            samples.extend(
                (0..on).map(|i| 0.5 * (TAU * BEEP_HZ * i as f32 / BEEP_RATE as f32).sin()),
            );
            samples.extend(std::iter::repeat_n(0.0, off));
        }
        Self {
            samples,
            sample_rate: BEEP_RATE,
        }
    }

    /// Loads a WAV file, downmixed to mono.
    pub fn from_wav(path: &Path) -> Result<Self> {
        let mut reader = WavReader::open(path).context(format!("Opening {}", path.display()))?;
        let spec = reader.spec();
        let interleaved: Vec<f32> = match spec.sample_format {
            hound::SampleFormat::Float => reader.samples::<f32>().collect::<Result<_, _>>()?,
            hound::SampleFormat::Int => {
                let scale = (1i64 << (spec.bits_per_sample - 1)) as f32;
                reader
                    .samples::<i32>()
                    .map(|s| s.map(|s| s as f32 / scale))
                    .collect::<Result<_, _>>()?
            }
        };
        Ok(Self {
            samples: downmix(&interleaved, spec.channels),
            sample_rate: spec.sample_rate,
        })
    }
}

/// Plays the alarm through the default output device.
pub struct DeviceAlarm {
    path: Option<PathBuf>,
}

impl DeviceAlarm {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self { path }
    }

    fn clip(&self) -> Result<Clip> {
        match &self.path {
            Some(path) => Clip::from_wav(path),
            None => Ok(Clip::beeps()),
        }
    }

    fn play_clip(clip: Clip) -> Result<()> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| anyhow!("No default output device found"))?;
        let config = device.default_output_config()?;
        debug!("Playing alarm on {} with {config:?}", device.name()?);

        let clip = clip.at_rate(config.sample_rate().0);
        let duration = clip.duration();

        let stream = match config.sample_format() {
            cpal::SampleFormat::F32 => output_stream::<f32>(&device, &config, clip.samples),
            cpal::SampleFormat::I16 => output_stream::<i16>(&device, &config, clip.samples),
            cpal::SampleFormat::U16 => output_stream::<u16>(&device, &config, clip.samples),
            other => Err(anyhow!("Unsupported output sample format {other:?}")),
        }?;
        stream.play()?;
        std::thread::sleep(duration + Duration::from_millis(100));
        Ok(())
    }
}

impl Alarm for DeviceAlarm {
    fn play(&self) -> Result<(), Error> {
        let clip = self.clip().map_err(|err| Error::FileSystem(format!("{err:#}")))?;
        Self::play_clip(clip).map_err(|err| Error::AudioDevice(format!("{err:#}")))
    }
}

fn output_stream<T>(
    device: &cpal::Device,
    config: &cpal::SupportedStreamConfig,
    samples: Vec<f32>,
) -> Result<cpal::Stream>
where
    T: SizedSample + FromSample<f32>,
{
    let channels = config.channels() as usize;
    let mut position = 0usize;
    let stream = device.build_output_stream(
        &config.config(),
        move |data: &mut [T], _: &_| {
            for frame in data.chunks_mut(channels) {
                let value = samples.get(position).copied().unwrap_or(0.0);
                position += 1;
                for out in frame.iter_mut() {
                    *out = T::from_sample(value);
                }
            }
        },
        |err| error!("Alarm stream error: {err}"),
        None,
    )?;
    Ok(stream)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hound::{WavSpec, WavWriter};
    use tempfile::tempdir;

    #[test]
    fn test_beeps_layout() {
        let clip = Clip::beeps();
        let on = (BEEP_RATE as f32 * BEEP_ON.as_secs_f32()) as usize;
        let off = (BEEP_RATE as f32 * BEEP_OFF.as_secs_f32()) as usize;
        assert_eq!(clip.samples.len(), 3 * (on + off));
        assert_eq!(clip.sample_rate, BEEP_RATE);
        // The gap after the first beep is silent.
        assert!(clip.samples[on..on + off].iter().all(|&s| s == 0.0));
        assert!(clip.samples[..on].iter().any(|&s| s.abs() > 0.4));
        assert!(clip.samples.iter().all(|s| s.abs() <= 0.5));
    }

    #[test]
    fn test_clip_duration() {
        let clip = Clip {
            samples: vec![0.0; 8000],
            sample_rate: 16000,
        };
        assert_eq!(clip.duration(), Duration::from_millis(500));
    }

    #[test]
    fn test_at_rate() {
        let clip = Clip {
            samples: vec![0.0; 4800],
            sample_rate: 48000,
        };
        assert_eq!(clip.clone().at_rate(48000), clip);

        let resampled = clip.at_rate(16000);
        assert_eq!(resampled.sample_rate, 16000);
        let millis = resampled.duration().as_millis();
        assert!((90..=110).contains(&millis), "{millis}");
    }

    #[test]
    fn test_from_wav_int_stereo() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("alarm.wav");
        let spec = WavSpec {
            channels: 2,
            sample_rate: 8000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = WavWriter::create(&path, spec).unwrap();
        for sample in [16384i16, 0, -16384, -16384] {
            writer.write_sample(sample).unwrap();
        }
        writer.finalize().unwrap();

        let clip = Clip::from_wav(&path).unwrap();
        assert_eq!(clip.sample_rate, 8000);
        assert_eq!(clip.samples, vec![0.25, -0.5]);
    }

    #[test]
    fn test_from_wav_missing_file() {
        let alarm = DeviceAlarm::new(Some(PathBuf::from("/nonexistent/alarm.wav")));
        assert!(matches!(alarm.play(), Err(Error::FileSystem(_))));
    }
}
