use std::path::PathBuf;

pub mod alarm;
mod recorder;
mod resample;

pub use recorder::AudioRecorder;

/// Messages sent from the recorder to the transcription task.
#[derive(Debug, Clone, PartialEq)]
pub enum Audio {
    /// Recording started, load the model while the user speaks
    Warm,
    /// Recording finished and was written to this WAV file
    Path(PathBuf),
}
