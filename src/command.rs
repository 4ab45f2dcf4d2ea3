//! Transcript interpretation.
//!
//! A transcript is lowercased and run through a fixed, ordered list of
//! phrase checks. The first check that matches decides the [`Command`].

use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;

static TIMED_REMINDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"remind me to (.+) in ([0-9]+) (seconds|minutes)").expect("valid reminder regex")
});

/// Websites that can be opened by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Site {
    Google,
    YouTube,
    Instagram,
    Facebook,
    WhatsApp,
    InstagramMessages,
}

impl Site {
    pub fn url(&self) -> &'static str {
        match self {
            Site::Google => "https://google.com",
            Site::YouTube => "https://www.youtube.com",
            Site::Instagram => "https://www.instagram.com",
            Site::Facebook => "https://www.facebook.com",
            Site::WhatsApp => "https://web.whatsapp.com",
            Site::InstagramMessages => "https://www.instagram.com/direct/inbox/",
        }
    }

    /// Name used in the spoken confirmation.
    pub fn label(&self) -> &'static str {
        match self {
            Site::Google => "Google",
            Site::YouTube => "YouTube",
            Site::Instagram => "Instagram",
            Site::Facebook => "Facebook",
            Site::WhatsApp => "WhatsApp",
            Site::InstagramMessages => "messages on Instagram",
        }
    }
}

/// Unit spoken after the reminder delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DelayUnit {
    Seconds,
    Minutes,
}

impl DelayUnit {
    fn parse(unit: &str) -> Option<Self> {
        match unit {
            "seconds" => Some(Self::Seconds),
            "minutes" => Some(Self::Minutes),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DelayUnit::Seconds => "seconds",
            DelayUnit::Minutes => "minutes",
        }
    }
}

/// Deferred alarm attached to a reminder, as it was spoken.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delay {
    pub amount: u64,
    pub unit: DelayUnit,
}

impl Delay {
    pub fn duration(&self) -> Duration {
        match self.unit {
            DelayUnit::Seconds => Duration::from_secs(self.amount),
            DelayUnit::Minutes => Duration::from_secs(self.amount.saturating_mul(60)),
        }
    }
}

/// What the assistant should do with a transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Greet,
    Time,
    OpenSite(Site),
    Search(String),
    TakeNote(String),
    Remind { task: String, delay: Option<Delay> },
    AskChat(String),
    Launch(String),
    ClearNotes,
    ClearReminders,
    Creator,
    Unrecognized,
}

/// Removes the first occurrence of `pattern` and trims the remainder.
fn strip_first(text: &str, pattern: &str) -> String {
    text.replacen(pattern, "", 1).trim().to_string()
}

fn parse_timed_reminder(command: &str) -> Option<(String, Delay)> {
    let captures = TIMED_REMINDER.captures(command)?;
    let task = captures.get(1)?.as_str().to_string();
    let amount = captures.get(2)?.as_str().parse().ok()?;
    let unit = DelayUnit::parse(captures.get(3)?.as_str())?;
    Some((task, Delay { amount, unit }))
}

impl Command {
    /// Interprets a raw transcript.
    ///
    /// Checks run in a fixed order and the first hit wins, so a transcript
    /// such as "hello, open google" greets rather than opening a page.
    pub fn parse(transcript: &str) -> Self {
        let command = transcript.to_lowercase();

        if command.contains("hello") {
            Command::Greet
        } else if command.contains("what's the time") || command.contains("what is the time") {
            Command::Time
        } else if command.contains("open google") {
            Command::OpenSite(Site::Google)
        } else if command.contains("open youtube") {
            Command::OpenSite(Site::YouTube)
        } else if command.contains("open instagram") {
            Command::OpenSite(Site::Instagram)
        } else if command.contains("open facebook") {
            Command::OpenSite(Site::Facebook)
        } else if command.contains("open whatsapp") {
            Command::OpenSite(Site::WhatsApp)
        } else if command.contains("open messages on instagram") {
            Command::OpenSite(Site::InstagramMessages)
        } else if command.starts_with("search ") {
            Command::Search(strip_first(&command, "search "))
        } else if command.starts_with("take a note") {
            Command::TakeNote(strip_first(&command, "take a note"))
        } else if command.starts_with("remind me to") {
            match parse_timed_reminder(&command) {
                Some((task, delay)) => Command::Remind {
                    task,
                    delay: Some(delay),
                },
                None => Command::Remind {
                    task: strip_first(&command, "remind me to"),
                    delay: None,
                },
            }
        } else if command.starts_with("ask chatgpt") {
            Command::AskChat(strip_first(&command, "ask chatgpt"))
        } else if command.starts_with("launch") || command.starts_with("open") {
            let app = command.replacen("launch", "", 1).replacen("open", "", 1);
            Command::Launch(app.trim().to_string())
        } else if command.contains("clear notes") {
            Command::ClearNotes
        } else if command.contains("clear reminders") {
            Command::ClearReminders
        } else if command.contains("who created you") {
            Command::Creator
        } else {
            Command::Unrecognized
        }
    }
}
