//! Orchestration core and collaborator interfaces.

pub mod llm;
pub mod orchestrator;
pub mod stt;
pub mod transcript;
pub mod tts;
