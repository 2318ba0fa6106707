//! Base trait for streaming speech-to-text providers.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::core::transcript::TranscriptFragment;

/// Configuration for a streaming transcriber.
#[derive(Debug, Clone)]
pub struct TranscriberConfig {
    pub api_key: String,
    /// Language code, e.g. "en-US"
    pub language: String,
    pub sample_rate: u32,
    pub channels: u16,
    pub model: String,
    pub encoding: String,
}

impl Default for TranscriberConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            language: "en-US".to_string(),
            sample_rate: 16000,
            channels: 1,
            model: "nova-3".to_string(),
            encoding: "linear16".to_string(),
        }
    }
}

/// Error types for transcription operations
#[derive(Debug, Clone, thiserror::Error)]
pub enum TranscriptionError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),
    #[error("Failed to send audio: {0}")]
    SendFailed(String),
    #[error("Provider error: {0}")]
    ProviderError(String),
    #[error("Configuration error: {0}")]
    ConfigurationError(String),
}

/// Callback invoked for every transcript fragment the provider emits.
pub type TranscriptCallback =
    Arc<dyn Fn(TranscriptFragment) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync>;

/// Base trait for streaming speech-to-text providers.
///
/// Implementations push [`TranscriptFragment`]s through the registered
/// callback as audio arrives; the caller never polls for results.
#[async_trait::async_trait]
pub trait BaseTranscriber: Send + Sync {
    /// Establish the streaming connection.
    async fn connect(&mut self) -> Result<(), TranscriptionError>;

    /// Close the streaming connection and release resources.
    async fn close(&mut self) -> Result<(), TranscriptionError>;

    /// Whether the connection is ready to accept audio.
    fn is_connected(&self) -> bool;

    /// Forward one frame of raw audio to the provider.
    async fn send_audio(&mut self, audio: Vec<u8>) -> Result<(), TranscriptionError>;

    /// Register the fragment callback. Must be called before `connect`.
    fn on_transcript(&mut self, callback: TranscriptCallback);
}
