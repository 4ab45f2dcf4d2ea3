//! Error types for the Hark assistant.
//!
//! This module defines the custom error types used throughout the application.
//! It uses the `thiserror` crate to derive error implementations and provides
//! convenient conversions from common error types.

use thiserror::Error;

/// Custom error type for the Hark assistant.
///
/// This enum represents the error conditions the assistant and the launcher
/// backend need to tell apart: unsupported applications must map to a client
/// error, failed launches to a server error, and everything else ends up
/// spoken as an apology.
#[derive(Error, Debug)]
pub enum Error {
    /// Error related to audio device initialization or configuration
    #[error("Audio device error: {0}")]
    AudioDevice(String),

    /// Error raised by the text-to-speech program
    #[error("Speech synthesis error: {0}")]
    Speech(String),

    /// The requested application matches no configured launcher entry
    #[error("App not supported: {0}")]
    UnsupportedApp(String),

    /// The launcher matched an entry but could not start it
    #[error("Failed to open app {app}: {reason}")]
    LaunchFailed { app: String, reason: String },

    /// Error returned by, or while talking to, the chat completion API
    #[error("Chat API error: {0}")]
    Chat(String),

    /// Error reading or writing the notes/reminders store
    #[error("Store error: {0}")]
    Store(String),

    /// Error related to file system operations
    #[error("File system error: {0}")]
    FileSystem(String),

    /// Catch-all for unexpected errors
    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::Unknown(err.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::FileSystem(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Store(err.to_string())
    }
}
