//! Text-to-speech collaborators.

mod base;
mod openai;

pub use base::{AudioChunk, AudioChunkCallback, BaseSynthesizer, SynthesisError, SynthesizerConfig};
pub use openai::OpenAiSynthesizer;
