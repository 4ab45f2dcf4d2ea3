//! Command dispatch.
//!
//! The [`Assistant`] owns the session state (transcript, last response, the
//! notes/reminders store) and turns every transcript into exactly one action.

use std::sync::Arc;

use anyhow::Result;
use chrono::Local;
use log::{debug, error, info, warn};
use reqwest::Url;

use crate::audio::alarm::DeviceAlarm;
use crate::browser::{SystemBrowser, UrlOpener};
use crate::chat::{ChatBackend, ChatClient};
use crate::command::{Command, Delay};
use crate::config::Config;
use crate::error::Error;
use crate::launcher::client::{AppLauncher, LauncherClient};
use crate::speech::{Alarm, CommandSpeaker, SilentSpeaker, Speaker};
use crate::store::Store;

const SEARCH_URL: &str = "https://www.google.com/search";
const STORE_FAILED: &str = "Sorry, I couldn't save that.";

/// Everything the assistant talks to outside its own state.
#[derive(Clone)]
pub struct Services {
    pub speaker: Arc<dyn Speaker>,
    pub alarm: Arc<dyn Alarm>,
    pub browser: Arc<dyn UrlOpener>,
    pub chat: Arc<dyn ChatBackend>,
    pub launcher: Arc<dyn AppLauncher>,
}

impl Services {
    /// Builds the real implementations described by `config`.
    pub fn from_config(config: &Config) -> Self {
        let speaker: Arc<dyn Speaker> = if config.speech.enabled {
            Arc::new(CommandSpeaker::new(&config.speech))
        } else {
            Arc::new(SilentSpeaker)
        };
        Self {
            speaker,
            alarm: Arc::new(DeviceAlarm::new(config.speech.alarm_path.clone())),
            browser: Arc::new(SystemBrowser),
            chat: Arc::new(ChatClient::from_env(&config.chat)),
            launcher: Arc::new(LauncherClient::new(&config.launcher.url)),
        }
    }
}

pub struct Assistant {
    services: Services,
    store: Store,
    creator_reply: String,
    transcript: String,
    response: String,
}

impl Assistant {
    pub fn new(services: Services, store: Store, creator_reply: impl Into<String>) -> Self {
        Self {
            services,
            store,
            creator_reply: creator_reply.into(),
            transcript: String::new(),
            response: String::new(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            Services::from_config(config),
            Store::open(&config.paths.store_path),
            config.assistant.creator_reply.clone(),
        )
    }

    /// Everything heard this session, space separated.
    pub fn transcript(&self) -> &str {
        &self.transcript
    }

    /// The last reply shown to the user.
    pub fn response(&self) -> &str {
        &self.response
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Interprets one transcript and carries out the matching action.
    pub async fn handle(&mut self, transcript: &str) -> Command {
        info!("Heard: {transcript}");
        if !self.transcript.is_empty() {
            self.transcript.push(' ');
        }
        self.transcript.push_str(transcript);

        let command = Command::parse(transcript);
        debug!("Interpreted as {command:?}");
        if let Err(err) = self.execute(&command).await {
            error!("Error handling {command:?}: {err:#}");
        }
        command
    }

    /// Reported when capture or transcription fails.
    pub async fn recognition_failed(&self) {
        self.say("Speech recognition error occurred.").await;
    }

    async fn execute(&mut self, command: &Command) -> Result<()> {
        match command {
            Command::Greet => self.reply("Hi there!").await,
            Command::Time => {
                let now = Local::now().format("%-I:%M:%S %p");
                self.reply(&format!("Current time is: {now}")).await;
            }
            Command::OpenSite(site) => {
                self.reply(&format!("Opening {}...", site.label())).await;
                self.services.browser.open(site.url())?;
            }
            Command::Search(query) => {
                self.reply(&format!("Searching for {query} on Google")).await;
                let mut url = Url::parse(SEARCH_URL)?;
                url.query_pairs_mut().append_pair("q", query);
                // Form encoding writes a space as `+` and a literal plus as `%2B`.
                self.services.browser.open(&url.as_str().replace('+', "%20"))?;
            }
            Command::TakeNote(note) => {
                let saved = self.store.add_note(note.clone());
                if self.stored(saved).await {
                    self.say("Note saved.").await;
                }
            }
            Command::Remind { task, delay } => {
                let saved = self.store.add_reminder(task.clone());
                if !self.stored(saved).await {
                    return Ok(());
                }
                match delay {
                    Some(delay) => {
                        self.say(&format!(
                            "Reminder set for {task} in {} {}",
                            delay.amount,
                            delay.unit.as_str()
                        ))
                        .await;
                        self.schedule_reminder(task.clone(), *delay);
                    }
                    None => self.say("Reminder added.").await,
                }
            }
            Command::AskChat(query) if query.is_empty() => {
                self.say("What should I ask ChatGPT?").await;
            }
            Command::AskChat(query) => {
                self.say("Let me ask ChatGPT...").await;
                match self.services.chat.ask(query).await {
                    Ok(reply) => self.reply(&reply).await,
                    Err(err) => {
                        error!("ChatGPT error: {err}");
                        self.say("Sorry, ChatGPT lookup failed.").await;
                    }
                }
            }
            Command::Launch(app) => match self.services.launcher.open_app(app).await {
                Ok(()) => self.say(&format!("Opening {app}")).await,
                Err(err) => {
                    error!("{err}");
                    self.say("Sorry, I couldn't open that application.").await;
                }
            },
            Command::ClearNotes => {
                let saved = self.store.clear_notes();
                if self.stored(saved).await {
                    self.say("All notes cleared.").await;
                }
            }
            Command::ClearReminders => {
                let saved = self.store.clear_reminders();
                if self.stored(saved).await {
                    self.say("All reminders cleared.").await;
                }
            }
            Command::Creator => {
                let reply = self.creator_reply.clone();
                self.reply(&reply).await;
            }
            Command::Unrecognized => self.reply("Command not recognized.").await,
        }
        Ok(())
    }

    /// One-shot timer, not cancellable and gone when the process exits.
    fn schedule_reminder(&self, task: String, delay: Delay) {
        let speaker = self.services.speaker.clone();
        let alarm = self.services.alarm.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay.duration()).await;
            let text = format!("Reminder: {task}");
            println!("Assistant: {text}");
            if let Err(err) = speaker.speak(&text).await {
                warn!("Cannot speak reminder: {err}");
            }
            match tokio::task::spawn_blocking(move || alarm.play()).await {
                Ok(Err(err)) => warn!("Cannot play alarm: {err}"),
                Err(err) => warn!("Alarm task failed: {err}"),
                Ok(Ok(())) => {}
            }
        });
    }

    /// Apologises for a failed store write, returning whether it succeeded.
    async fn stored(&self, result: Result<(), Error>) -> bool {
        match result {
            Ok(()) => true,
            Err(err) => {
                error!("Cannot update {}: {err}", self.store.path().display());
                self.say(STORE_FAILED).await;
                false
            }
        }
    }

    async fn reply(&mut self, text: &str) {
        self.response = text.to_string();
        self.say(text).await;
    }

    async fn say(&self, text: &str) {
        println!("Assistant: {text}");
        if let Err(err) = self.services.speaker.speak(text).await {
            warn!("Cannot speak: {err}");
        }
    }
}
