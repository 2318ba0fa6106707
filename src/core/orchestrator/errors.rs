//! Orchestrator error types.

/// Errors surfaced by the orchestration core.
#[derive(Debug, thiserror::Error)]
pub enum OrchestratorError {
    #[error("No generation service configured")]
    GenerationUnavailable,
    #[error("Generation service failed to initialize: {0}")]
    GenerationInit(String),
    #[error("Session is no longer active")]
    Inactive,
}
