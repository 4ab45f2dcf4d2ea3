//! Voice front-end.
//!
//! This module wires the global hotkey, the microphone recorder, the
//! Whisper transcriber and the [`Assistant`] together. Keyboard events
//! arrive on a blocking listener thread; recordings are transcribed in one
//! task and transcripts are dispatched in another, so a slow chat request
//! never delays the hotkey.

use anyhow::{Context, Result, anyhow};
use log::{error, info, warn};
use notify_rust::Notification;
use rdev::{EventType, Key, listen};
use std::collections::HashSet;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc::{UnboundedSender, unbounded_channel};

use crate::asr::{Asr, download_model, samples_from_file};
use crate::assistant::Assistant;
use crate::audio::{Audio, AudioRecorder};
use crate::config::{Config, Trigger};

/// What the recognizer produced for one recording.
#[derive(Debug, PartialEq)]
enum Heard {
    Transcript(String),
    Failed,
}

/// Recording transition requested by the hotkey.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Start,
    Stop,
}

/// Tracks the pressed keys and decides when listening starts and stops.
#[derive(Debug, PartialEq)]
pub struct Hotkey {
    keys: HashSet<Key>,
    trigger: Trigger,
    pressed_keys: HashSet<Key>,
    recording: bool,
}

impl Hotkey {
    pub fn new(keys: HashSet<Key>, trigger: Trigger) -> Self {
        Self {
            keys,
            trigger,
            pressed_keys: HashSet::new(),
            recording: false,
        }
    }

    pub fn on_event(&mut self, event: &EventType) -> Option<Transition> {
        match *event {
            EventType::KeyPress(key) => {
                // Key repeat keeps sending presses while the combination is held.
                let was_complete = self.pressed_keys == self.keys;
                if self.keys.contains(&key) {
                    self.pressed_keys.insert(key);
                }
                if was_complete || self.pressed_keys != self.keys {
                    return None;
                }
                self.recording = match self.trigger {
                    Trigger::PushToTalk => true,
                    Trigger::Toggle => !self.recording,
                };
                Some(if self.recording {
                    Transition::Start
                } else {
                    Transition::Stop
                })
            }
            EventType::KeyRelease(key) => {
                let was_complete = self.pressed_keys == self.keys;
                self.pressed_keys.remove(&key);
                if self.trigger == Trigger::PushToTalk && self.recording && was_complete {
                    self.recording = false;
                    return Some(Transition::Stop);
                }
                None
            }
            _ => None,
        }
    }
}

fn notify(enabled: bool, summary: &str, content: &str) {
    if !enabled {
        return;
    }
    if let Err(err) = Notification::new()
        .summary(summary)
        .body(content)
        .icon("audio-input-microphone")
        .show()
    {
        error!("Cannot show notification: {err} , content was : {summary} {content}")
    };
}

fn handle_audio(asr: &mut Asr, config: &Config, audio: Audio) -> Result<Option<String>> {
    match audio {
        Audio::Warm => {
            asr.load()?;
            Ok(None)
        }
        Audio::Path(wav_path) => {
            info!("Transcribing audio...");
            let samples = samples_from_file(&wav_path)?;
            let output = asr.run(&samples, &config.model).context("Error running ASR")?;
            let summary = if output.is_empty() {
                "No voice detected".to_string()
            } else if output.chars().count() > 20 {
                format!("{}..", output.chars().take(20).collect::<String>())
            } else {
                output.clone()
            };
            notify(config.activation.notify, &summary, &output);
            Ok(Some(output))
        }
    }
}

/// Turns a transcription result into something to dispatch.
///
/// A recording with no speech counts as a recognition failure.
fn heard(result: Result<Option<String>>) -> Option<Heard> {
    match result {
        Ok(None) => None,
        Ok(Some(text)) if text.is_empty() => Some(Heard::Failed),
        Ok(Some(text)) => Some(Heard::Transcript(text)),
        Err(err) => {
            error!("Error handling audio {err:?}");
            Some(Heard::Failed)
        }
    }
}

/// Runs the assistant on each transcript until the channel closes.
fn spawn_dispatcher(mut assistant: Assistant) -> UnboundedSender<Heard> {
    let (tx_heard, mut rx_heard) = unbounded_channel();
    tokio::spawn(async move {
        while let Some(heard) = rx_heard.recv().await {
            match heard {
                Heard::Transcript(text) => {
                    println!("You said: {text}");
                    assistant.handle(&text).await;
                }
                Heard::Failed => assistant.recognition_failed().await,
            }
        }
    });
    tx_heard
}

pub struct App {
    hotkey: Hotkey,
    recorder: AudioRecorder,
}

impl App {
    /// Creates the voice front-end.
    ///
    /// This downloads the Whisper model if needed, opens the microphone and
    /// starts the transcription and dispatch tasks.
    pub async fn new(config: Config) -> Result<Self> {
        std::fs::create_dir_all(&config.paths.cache_dir)?;

        let model_path = download_model(&config.model)
            .await
            .context("Failed to download model")?;

        let (tx_audio, mut rx_audio) = unbounded_channel();
        let recorder =
            AudioRecorder::new(&config, tx_audio).context("Failed to create audio recorder")?;

        let tx_heard = spawn_dispatcher(Assistant::from_config(&config));
        let hotkey = Hotkey::new(config.activation.keys.clone(), config.activation.trigger);

        tokio::task::spawn(async move {
            let mut asr = Asr::new(&model_path);
            while let Some(audio) = rx_audio.recv().await {
                let Some(message) = heard(handle_audio(&mut asr, &config, audio)) else {
                    continue;
                };
                if tx_heard.send(message).is_err() {
                    break;
                }
            }
        });

        Ok(Self { hotkey, recorder })
    }

    /// Listens for the hotkey until the process is terminated.
    pub async fn run(&mut self) -> Result<()> {
        let (schan, mut rchan) = unbounded_channel();
        let _listener = tokio::task::spawn_blocking(move || {
            if let Err(e) = listen(move |event| {
                if let Err(e) = schan.send(event.event_type) {
                    error!("Could not send event: {e:#?}");
                }
            }) {
                error!("Could not listen for events: {e:#?}");
                return Err(anyhow!("Failed to listen for events: {e:#?}"));
            }
            Ok(())
        });

        info!(
            "Press {:?} to talk ({:?})",
            self.hotkey.keys, self.hotkey.trigger
        );

        while let Some(event) = rchan.recv().await {
            let result = match self.hotkey.on_event(&event) {
                Some(Transition::Start) => {
                    info!("Start listening...");
                    self.recorder.start_recording()
                }
                Some(Transition::Stop) => {
                    info!("Stop listening.");
                    self.recorder.stop_recording()
                }
                None => Ok(()),
            };
            if let Err(err) = result {
                error!("Error handling hotkey: {err}");
            }
        }

        info!("Done exiting");
        Ok(())
    }
}

/// Treats every line read from stdin as a transcript.
pub async fn run_text(config: &Config) -> Result<()> {
    let mut assistant = Assistant::from_config(config);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    info!("Type a command per line, end with Ctrl-D");
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        assistant.handle(line).await;
    }
    warn!("Input closed, pending reminders are dropped");
    Ok(())
}
