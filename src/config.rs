//! Configuration management for the Hark assistant.
//!
//! This module provides functionality for loading and managing application
//! configuration: audio capture, the Whisper model, the activation hotkey,
//! speech output, the chat API and the application launcher.

use anyhow::{Context, Result};
use rdev::Key;
use serde::{Deserialize, Serialize};
use std::{
    collections::{HashMap, HashSet},
    path::{Path, PathBuf},
};

/// Audio recording configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(test, derive(PartialEq))]
pub struct AudioConfig {
    /// Number of audio channels (1 for mono, 2 for stereo)
    pub channels: u16,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Sample format written to the recording
    pub sample_format: SampleFormat,
    /// Audio input device name (e.g., "sysdefault:CARD=C920")
    /// If not specified, the default device will be used
    pub device: Option<String>,
}

impl From<SampleFormat> for cpal::SampleFormat {
    fn from(value: SampleFormat) -> Self {
        match value {
            SampleFormat::I16 => cpal::SampleFormat::I16,
            SampleFormat::F32 => cpal::SampleFormat::F32,
        }
    }
}

/// Sample format for audio recording.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[cfg_attr(test, derive(PartialEq))]
#[serde(rename_all = "lowercase")]
pub enum SampleFormat {
    /// `i16` with `0` being the origin
    I16,

    /// `f32` with a valid range of `-1.0..1.0` with `0.0` being the origin
    F32,
}

impl SampleFormat {
    pub fn bits_per_sample(&self) -> u16 {
        match self {
            Self::F32 => 32,
            Self::I16 => 16,
        }
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            channels: 1,
            sample_rate: 16000,
            sample_format: SampleFormat::F32,
            device: None,
        }
    }
}

/// Path configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(test, derive(PartialEq))]
pub struct PathConfig {
    /// Cache directory for storing temporary files
    pub cache_dir: PathBuf,
    /// Path to the recorded audio file
    pub recording_path: PathBuf,
    /// JSON file holding notes and reminders
    pub store_path: PathBuf,
}

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(test, derive(PartialEq))]
#[serde(default)]
pub struct Config {
    /// Audio recording settings
    pub audio: AudioConfig,
    /// Path configuration
    pub paths: PathConfig,
    /// Model configuration
    pub model: ModelConfig,
    /// Hotkey configuration
    pub activation: ActivationConfig,
    /// Text-to-speech and alarm settings
    pub speech: SpeechConfig,
    /// Remote chat completion API
    pub chat: ChatConfig,
    /// Local application launcher backend
    pub launcher: LauncherConfig,
    /// Canned replies
    pub assistant: AssistantConfig,
}

/// Type of prompt to use for the model
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[cfg_attr(test, derive(PartialEq))]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum PromptType {
    /// Use a list of vocabulary words joined by commas
    Vocabulary { vocabulary: Vec<String> },
    /// Use a custom initial prompt
    Raw { prompt: String },
    /// No prompt
    #[default]
    None,
}

/// Whisper model configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(test, derive(PartialEq))]
pub struct ModelConfig {
    /// Model repository on Hugging Face
    pub repo: String,
    /// Model filename
    pub filename: String,
    /// Type of prompt to use for the model
    pub prompt: PromptType,
    /// Map of text to replace with their replacements
    pub replacements: HashMap<String, String>,
}

/// How the hotkey drives listening.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum Trigger {
    /// Listen while the key combination is held
    PushToTalk,
    /// Each press of the key combination starts or stops listening
    Toggle,
}

/// Keyboard activation configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(test, derive(PartialEq))]
#[serde(default)]
pub struct ActivationConfig {
    /// Keys that need to be pressed together
    pub keys: HashSet<Key>,
    pub trigger: Trigger,
    /// Show a desktop notification with every transcript
    pub notify: bool,
}

impl Default for ActivationConfig {
    fn default() -> Self {
        Self {
            keys: HashSet::from([Key::ControlLeft, Key::Space]),
            trigger: Trigger::PushToTalk,
            notify: true,
        }
    }
}

/// Speech output configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(test, derive(PartialEq))]
#[serde(default)]
pub struct SpeechConfig {
    /// When false, replies are only printed
    pub enabled: bool,
    /// Text-to-speech program, the utterance is passed as the last argument
    pub program: String,
    pub args: Vec<String>,
    /// WAV file played when a timed reminder fires; a beep is synthesised when unset
    pub alarm_path: Option<PathBuf>,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        #[cfg(target_os = "macos")]
        let (program, args) = ("say", vec![]);
        #[cfg(not(target_os = "macos"))]
        let (program, args) = ("espeak", vec!["-v".to_string(), "en-us".to_string()]);
        Self {
            enabled: true,
            program: program.to_string(),
            args,
            alarm_path: None,
        }
    }
}

/// Chat completion API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(test, derive(PartialEq))]
#[serde(default)]
pub struct ChatConfig {
    /// OpenAI-compatible chat completions endpoint
    pub endpoint: String,
    pub model: String,
    /// Name of the environment variable holding the bearer token
    pub api_key_env: String,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.openai.com/v1/chat/completions".to_string(),
            model: "gpt-3.5-turbo".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
        }
    }
}

/// One launchable application: any pattern found in the requested name selects `command`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppEntry {
    pub patterns: Vec<String>,
    pub command: String,
}

impl AppEntry {
    pub fn new(patterns: &[&str], command: &str) -> Self {
        Self {
            patterns: patterns.iter().map(|p| p.to_string()).collect(),
            command: command.to_string(),
        }
    }
}

/// Application launcher configuration, shared by the backend and the assistant.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(test, derive(PartialEq))]
#[serde(default)]
pub struct LauncherConfig {
    /// Address the backend listens on
    pub bind: String,
    /// Endpoint the assistant posts launch requests to
    pub url: String,
    /// Checked in order, first match wins
    pub apps: Vec<AppEntry>,
}

impl Default for LauncherConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:5000".to_string(),
            url: "http://localhost:5000/open-app".to_string(),
            apps: vec![
                AppEntry::new(&["vs code", "vscode"], "code"),
                AppEntry::new(&["notepad"], "notepad"),
                AppEntry::new(&["calculator"], "calc"),
            ],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(test, derive(PartialEq))]
#[serde(default)]
pub struct AssistantConfig {
    /// Answer to "who created you"
    pub creator_reply: String,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            creator_reply: "I was created by the Hark developers using Rust.".to_string(),
        }
    }
}

impl PromptType {
    /// Gets the prompt text to use with the model
    pub fn get_prompt_text(&self) -> Option<String> {
        match self {
            PromptType::Vocabulary { vocabulary } if !vocabulary.is_empty() => {
                Some(vocabulary.join(", "))
            }
            PromptType::Raw { prompt } => Some(prompt.clone()),
            _ => None,
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            repo: "ggerganov/whisper.cpp".to_string(),
            filename: "ggml-base.en.bin".to_string(),
            prompt: PromptType::None,
            replacements: HashMap::new(),
        }
    }
}

impl Default for PathConfig {
    fn default() -> Self {
        let mut cache_dir = dirs::cache_dir()
            .context("Cannot find cache directory")
            .unwrap_or_else(|_| PathBuf::from("~/.cache"));
        cache_dir.push("hark");

        let mut data_dir = dirs::data_dir()
            .context("Cannot find data directory")
            .unwrap_or_else(|_| PathBuf::from("~/.local/share"));
        data_dir.push("hark");

        Self {
            recording_path: cache_dir.join("recorded.wav"),
            store_path: data_dir.join("store.json"),
            cache_dir,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            audio: AudioConfig::default(),
            paths: PathConfig::default(),
            model: ModelConfig::default(),
            activation: ActivationConfig::default(),
            speech: SpeechConfig::default(),
            chat: ChatConfig::default(),
            launcher: LauncherConfig::default(),
            assistant: AssistantConfig::default(),
        }
    }
}

impl Config {
    /// Gets the default configuration file path.
    fn default_config_path() -> PathBuf {
        let config_dir = dirs::config_dir()
            .context("Cannot find config directory")
            .unwrap_or_else(|_| PathBuf::from("~/.config"));
        let mut path = config_dir;
        path.push("hark");
        path.push("config.toml");
        path
    }

    /// Loads configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        let config: Self = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Saves configuration to a TOML file.
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let contents = toml::to_string(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Loads configuration from the default location, creating it if it doesn't exist.
    pub fn load_or_write_default(path: Option<&Path>) -> Result<Self> {
        let default_path = Self::default_config_path();
        let path = path.unwrap_or(&default_path);
        if path.exists() {
            return Self::from_file(path)
                .context(format!("Reading config from {}", path.display()));
        }

        let config = Self::default();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        config.save_to_file(path)?;
        Ok(config)
    }
}
