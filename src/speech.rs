//! Text-to-speech output.
//!
//! Speech goes through the [`Speaker`] seam. The default implementation
//! hands each utterance to an external program (`say`, `espeak`, ...) and
//! waits for it, one utterance at a time.

use async_trait::async_trait;
use log::debug;
use tokio::process::Command;
use tokio::sync::Mutex;

use crate::config::SpeechConfig;
use crate::error::Error;

#[async_trait]
pub trait Speaker: Send + Sync {
    async fn speak(&self, text: &str) -> Result<(), Error>;
}

/// Sound played when a timed reminder fires. Blocks until playback ends.
pub trait Alarm: Send + Sync {
    fn play(&self) -> Result<(), Error>;
}

/// Speaks by running an external text-to-speech program.
pub struct CommandSpeaker {
    program: String,
    args: Vec<String>,
    // Held for the lifetime of a single utterance so speech never overlaps.
    turn: Mutex<()>,
}

impl CommandSpeaker {
    pub fn new(config: &SpeechConfig) -> Self {
        Self {
            program: config.program.clone(),
            args: config.args.clone(),
            turn: Mutex::new(()),
        }
    }
}

#[async_trait]
impl Speaker for CommandSpeaker {
    async fn speak(&self, text: &str) -> Result<(), Error> {
        if text.trim().is_empty() {
            return Err(Error::Speech("Cannot speak empty text".to_string()));
        }
        let _turn = self.turn.lock().await;
        debug!("Speaking with {}: {text}", self.program);
        let status = Command::new(&self.program)
            .args(&self.args)
            .arg(text)
            .status()
            .await
            .map_err(|err| Error::Speech(format!("Cannot run {}: {err}", self.program)))?;
        if !status.success() {
            return Err(Error::Speech(format!("{} exited with {status}", self.program)));
        }
        Ok(())
    }
}

/// Used when speech output is disabled; replies are only printed.
pub struct SilentSpeaker;

#[async_trait]
impl Speaker for SilentSpeaker {
    async fn speak(&self, _text: &str) -> Result<(), Error> {
        Ok(())
    }
}
