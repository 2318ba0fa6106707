//! Base trait for streaming text-generation providers.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;

/// Configuration for a generation provider.
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    pub api_key: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: "llama-3.3-70b-versatile".to_string(),
            temperature: 0.8,
            max_tokens: 512,
        }
    }
}

/// Error types for generation operations
#[derive(Debug, Clone, thiserror::Error)]
pub enum GenerationError {
    #[error("Not initialized")]
    NotInitialized,
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),
    #[error("Request failed: {0}")]
    RequestFailed(String),
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Callback invoked as the response streams in.
///
/// The first argument is the accumulated response text so far (not the
/// delta), the second is true exactly once, when the response is complete.
pub type ChunkCallback =
    Arc<dyn Fn(String, bool) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync>;

/// Base trait for streaming text-generation providers.
#[async_trait]
pub trait BaseGenerator: Send + Sync {
    /// Start a conversation with the given system prompt. Must succeed
    /// before `stream` is called.
    async fn initialize(&mut self, system_prompt: &str) -> Result<(), GenerationError>;

    /// Send one user message and stream the response through the chunk
    /// callback. Returns after the final chunk has been delivered.
    async fn stream(&mut self, text: &str) -> Result<(), GenerationError>;

    /// Register the chunk callback. Must be called before `stream`.
    fn on_chunk(&mut self, callback: ChunkCallback);

    /// Drop conversation history, keeping the system prompt and the
    /// connection.
    async fn reset(&mut self) -> Result<(), GenerationError>;

    /// Release provider resources.
    async fn close(&mut self) -> Result<(), GenerationError>;
}
