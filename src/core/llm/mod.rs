//! Text-generation collaborators.

mod base;
mod groq;

pub use base::{BaseGenerator, ChunkCallback, GenerationError, GeneratorConfig};
pub use groq::GroqGenerator;
