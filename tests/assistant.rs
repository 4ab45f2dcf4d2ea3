use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use hark::assistant::{Assistant, Services};
use hark::browser::UrlOpener;
use hark::chat::ChatBackend;
use hark::command::{Command, Site};
use hark::error::Error;
use hark::launcher::client::AppLauncher;
use hark::speech::{Alarm, Speaker};
use hark::store::Store;
use tempfile::{TempDir, tempdir};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};

#[derive(Default)]
struct RecordingSpeaker {
    spoken: Mutex<Vec<String>>,
}

#[async_trait]
impl Speaker for RecordingSpeaker {
    async fn speak(&self, text: &str) -> Result<(), Error> {
        self.spoken.lock().unwrap().push(text.to_string());
        Ok(())
    }
}

struct SignalAlarm(UnboundedSender<()>);

impl Alarm for SignalAlarm {
    fn play(&self) -> Result<(), Error> {
        self.0.send(()).map_err(|err| Error::Unknown(err.to_string()))
    }
}

#[derive(Default)]
struct RecordingBrowser {
    opened: Mutex<Vec<String>>,
}

impl UrlOpener for RecordingBrowser {
    fn open(&self, url: &str) -> Result<(), Error> {
        self.opened.lock().unwrap().push(url.to_string());
        Ok(())
    }
}

struct CannedChat(Option<String>);

#[async_trait]
impl ChatBackend for CannedChat {
    async fn ask(&self, query: &str) -> Result<String, Error> {
        match &self.0 {
            Some(reply) => Ok(format!("{reply} ({query})")),
            None => Err(Error::Chat("401 Unauthorized".to_string())),
        }
    }
}

/// Accepts only "calculator".
#[derive(Default)]
struct FakeLauncher {
    requested: Mutex<Vec<String>>,
}

#[async_trait]
impl AppLauncher for FakeLauncher {
    async fn open_app(&self, app: &str) -> Result<(), Error> {
        self.requested.lock().unwrap().push(app.to_string());
        if app == "calculator" {
            Ok(())
        } else {
            Err(Error::UnsupportedApp(app.to_string()))
        }
    }
}

struct Harness {
    assistant: Assistant,
    speaker: Arc<RecordingSpeaker>,
    browser: Arc<RecordingBrowser>,
    launcher: Arc<FakeLauncher>,
    alarms: UnboundedReceiver<()>,
    dir: TempDir,
}

impl Harness {
    fn new(chat_reply: Option<&str>) -> Self {
        Self::with_store(chat_reply, |dir| dir.join("store.json"))
    }

    fn with_store(chat_reply: Option<&str>, store_path: impl FnOnce(&Path) -> PathBuf) -> Self {
        let dir = tempdir().unwrap();
        let speaker = Arc::new(RecordingSpeaker::default());
        let browser = Arc::new(RecordingBrowser::default());
        let launcher = Arc::new(FakeLauncher::default());
        let (tx_alarm, alarms) = unbounded_channel();
        let services = Services {
            speaker: speaker.clone(),
            alarm: Arc::new(SignalAlarm(tx_alarm)),
            browser: browser.clone(),
            chat: Arc::new(CannedChat(chat_reply.map(str::to_string))),
            launcher: launcher.clone(),
        };
        let store = Store::open(&store_path(dir.path()));
        Self {
            assistant: Assistant::new(services, store, "I was built by the Hark developers."),
            speaker,
            browser,
            launcher,
            alarms,
            dir,
        }
    }

    fn spoken(&self) -> Vec<String> {
        self.speaker.spoken.lock().unwrap().clone()
    }

    fn last_spoken(&self) -> String {
        self.spoken().last().cloned().unwrap_or_default()
    }

    fn opened(&self) -> Vec<String> {
        self.browser.opened.lock().unwrap().clone()
    }
}

#[tokio::test]
async fn greets_and_records_response() {
    let mut h = Harness::new(None);
    assert_eq!(h.assistant.handle("Hello").await, Command::Greet);
    assert_eq!(h.assistant.response(), "Hi there!");
    assert_eq!(h.spoken(), vec!["Hi there!"]);
}

#[tokio::test]
async fn transcript_accumulates() {
    let mut h = Harness::new(None);
    h.assistant.handle("hello").await;
    h.assistant.handle("who created you").await;
    assert_eq!(h.assistant.transcript(), "hello who created you");
    assert_eq!(h.assistant.response(), "I was built by the Hark developers.");
}

#[tokio::test]
async fn speaks_the_time() {
    let mut h = Harness::new(None);
    h.assistant.handle("what's the time").await;
    let reply = h.assistant.response().to_string();
    assert!(reply.starts_with("Current time is: "), "{reply}");
    assert!(reply.ends_with("AM") || reply.ends_with("PM"), "{reply}");
}

#[tokio::test]
async fn opens_sites() {
    let mut h = Harness::new(None);
    assert_eq!(
        h.assistant.handle("open youtube").await,
        Command::OpenSite(Site::YouTube)
    );
    h.assistant.handle("open messages on instagram").await;
    assert_eq!(
        h.opened(),
        vec![
            "https://www.youtube.com",
            "https://www.instagram.com/direct/inbox/"
        ]
    );
    assert_eq!(h.last_spoken(), "Opening messages on Instagram...");
}

#[tokio::test]
async fn searches_google_with_encoded_query() {
    let mut h = Harness::new(None);
    h.assistant.handle("search rust & tokio").await;
    assert_eq!(
        h.opened(),
        vec!["https://www.google.com/search?q=rust%20%26%20tokio"]
    );
    assert_eq!(h.assistant.response(), "Searching for rust & tokio on Google");
}

#[tokio::test]
async fn notes_persist_and_clear() {
    let mut h = Harness::new(None);
    h.assistant.handle("take a note buy milk").await;
    h.assistant.handle("take a note call mom").await;
    assert_eq!(h.last_spoken(), "Note saved.");

    let path = h.dir.path().join("store.json");
    assert_eq!(Store::open(&path).notes(), ["buy milk", "call mom"]);

    h.assistant.handle("clear notes").await;
    assert_eq!(h.last_spoken(), "All notes cleared.");
    assert!(Store::open(&path).notes().is_empty());
}

/// A store whose parent directory is a regular file cannot be written.
fn unwritable_store(dir: &Path) -> PathBuf {
    let blocker = dir.join("blocker");
    std::fs::write(&blocker, "not a directory").unwrap();
    blocker.join("store.json")
}

#[tokio::test]
async fn failed_note_write_apologises() {
    let mut h = Harness::with_store(None, unwritable_store);
    h.assistant.handle("take a note buy milk").await;
    assert_eq!(h.spoken(), vec!["Sorry, I couldn't save that."]);
    assert!(h.assistant.store().notes().is_empty());

    h.assistant.handle("clear notes").await;
    assert_eq!(h.last_spoken(), "Sorry, I couldn't save that.");
}

#[tokio::test(start_paused = true)]
async fn failed_reminder_write_is_not_scheduled() {
    let mut h = Harness::with_store(None, unwritable_store);
    h.assistant.handle("remind me to stretch in 1 seconds").await;
    assert_eq!(h.spoken(), vec!["Sorry, I couldn't save that."]);
    assert!(h.assistant.store().reminders().is_empty());

    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(h.spoken().len(), 1);
    assert!(h.alarms.try_recv().is_err());
}

#[tokio::test]
async fn untimed_reminder_is_only_stored() {
    let mut h = Harness::new(None);
    h.assistant.handle("remind me to water the plants").await;
    assert_eq!(h.last_spoken(), "Reminder added.");
    assert_eq!(h.assistant.store().reminders(), ["water the plants"]);

    h.assistant.handle("clear reminders").await;
    assert_eq!(h.last_spoken(), "All reminders cleared.");
    assert!(h.assistant.store().reminders().is_empty());
}

#[tokio::test(start_paused = true)]
async fn timed_reminder_fires_after_delay() {
    let mut h = Harness::new(None);
    let start = tokio::time::Instant::now();
    h.assistant
        .handle("remind me to stretch in 5 seconds")
        .await;
    assert_eq!(h.last_spoken(), "Reminder set for stretch in 5 seconds");
    assert_eq!(h.assistant.store().reminders(), ["stretch"]);

    tokio::time::sleep(Duration::from_secs(4)).await;
    assert!(!h.spoken().contains(&"Reminder: stretch".to_string()));

    h.alarms.recv().await.unwrap();
    assert!(start.elapsed() >= Duration::from_secs(5));
    assert!(h.spoken().contains(&"Reminder: stretch".to_string()));
}

#[tokio::test]
async fn chat_reply_is_spoken() {
    let mut h = Harness::new(Some("Paris"));
    h.assistant.handle("ask chatgpt capital of france").await;
    assert_eq!(
        h.spoken(),
        vec!["Let me ask ChatGPT...", "Paris (capital of france)"]
    );
    assert_eq!(h.assistant.response(), "Paris (capital of france)");
}

#[tokio::test]
async fn chat_failure_apologises() {
    let mut h = Harness::new(None);
    h.assistant.handle("hello").await;
    h.assistant.handle("ask chatgpt anything").await;
    assert_eq!(h.last_spoken(), "Sorry, ChatGPT lookup failed.");
    // The displayed response is left as it was.
    assert_eq!(h.assistant.response(), "Hi there!");
}

#[tokio::test]
async fn empty_chat_question_prompts() {
    let mut h = Harness::new(Some("unused"));
    h.assistant.handle("ask chatgpt").await;
    assert_eq!(h.spoken(), vec!["What should I ask ChatGPT?"]);
}

#[tokio::test]
async fn launches_apps() {
    let mut h = Harness::new(None);
    assert_eq!(
        h.assistant.handle("launch calculator").await,
        Command::Launch("calculator".to_string())
    );
    assert_eq!(h.last_spoken(), "Opening calculator");

    h.assistant.handle("open spotify").await;
    assert_eq!(h.last_spoken(), "Sorry, I couldn't open that application.");
    assert_eq!(
        *h.launcher.requested.lock().unwrap(),
        vec!["calculator", "spotify"]
    );
}

#[tokio::test]
async fn unrecognized_command() {
    let mut h = Harness::new(None);
    assert_eq!(
        h.assistant.handle("sing me a song").await,
        Command::Unrecognized
    );
    assert_eq!(h.assistant.response(), "Command not recognized.");
}

#[tokio::test]
async fn recognition_failure_is_spoken() {
    let h = Harness::new(None);
    h.assistant.recognition_failed().await;
    assert_eq!(h.spoken(), vec!["Speech recognition error occurred."]);
}
