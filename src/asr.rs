//! Speech recognition with Whisper.
//!
//! The model is fetched from Hugging Face Hub on first use and cached by
//! `hf-hub`. A context is loaded when recording starts and dropped after
//! each transcription so accelerator memory is released between commands.

use anyhow::{Context, Result, anyhow};
use hf_hub::api::tokio::ApiBuilder;
use hound::{SampleFormat, WavReader};
use log::{debug, info};
use std::path::{Path, PathBuf};
use whisper_rs::{
    FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters, WhisperState,
};

use crate::config::ModelConfig;

/// Downloads the configured Whisper model, returning its local path.
pub async fn download_model(config: &ModelConfig) -> Result<PathBuf> {
    let api = ApiBuilder::from_env().build()?;
    let repo = api.model(config.repo.clone());
    let filename = repo.get(&config.filename).await?;
    Ok(filename)
}

/// Reads a mono WAV file into `f32` samples.
pub fn samples_from_file(wav_path: &Path) -> Result<Vec<f32>> {
    let mut reader = WavReader::open(wav_path).context("Opening wav reader")?;
    let samples = if reader.spec().sample_format == SampleFormat::Float {
        reader.samples::<f32>().map(|s| s.unwrap_or(0.0)).collect()
    } else {
        reader
            .samples::<i16>()
            .map(|s| s.unwrap_or(0) as f32 / 32768.0)
            .collect()
    };
    Ok(samples)
}

/// Applies the configured textual replacements to a transcript.
pub fn apply_replacements(text: &str, config: &ModelConfig) -> String {
    let mut text = text.trim().to_string();
    for (from, to) in &config.replacements {
        text = text.replace(from, to);
    }
    text
}

pub struct Asr {
    model_path: PathBuf,
    context: Option<(WhisperContext, WhisperState)>,
}

impl Asr {
    pub fn new(model_path: &Path) -> Self {
        Self {
            model_path: model_path.to_path_buf(),
            context: None,
        }
    }

    pub fn load(&mut self) -> Result<()> {
        debug!("Trying to load model {}", self.model_path.display());
        let context = WhisperContext::new_with_params(
            &self.model_path.to_string_lossy(),
            WhisperContextParameters::default(),
        )
        .context(format!("Loading model at {}", self.model_path.display()))?;
        let state = context.create_state().context("Creating state")?;
        self.context = Some((context, state));
        info!("Context loaded");
        Ok(())
    }

    /// Transcribes 16 kHz mono samples.
    pub fn run(&mut self, samples: &[f32], config: &ModelConfig) -> Result<String> {
        if self.context.is_none() {
            self.load()?;
        }
        // Take context to let it drop later.
        let (_context, mut state) = self.context.take().ok_or(anyhow!("Context was not warm"))?;

        let mut params = FullParams::new(SamplingStrategy::Greedy { best_of: 1 });
        params.set_print_special(false);
        params.set_print_progress(false);
        params.set_print_realtime(false);
        params.set_print_timestamps(false);
        params.set_language(Some("en"));

        let prompt = config.prompt.get_prompt_text();
        if let Some(prompt) = &prompt {
            params.set_initial_prompt(prompt);
        }

        state.full(params, samples).context("Running model")?;

        let num_segments = state.full_n_segments()?;
        let mut text = String::new();
        for i in 0..num_segments {
            let segment = state.full_get_segment_text(i)?;
            text.push_str(&segment);
            text.push(' ');
        }

        Ok(apply_replacements(&text, config))
    }
}
