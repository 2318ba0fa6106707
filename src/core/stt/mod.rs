//! Speech-to-text collaborators.

mod base;
mod deepgram;

pub use base::{BaseTranscriber, TranscriberConfig, TranscriptCallback, TranscriptionError};
pub use deepgram::DeepgramTranscriber;
