//! Base trait for streaming text-to-speech providers.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;

/// One chunk of synthesized audio.
#[derive(Debug, Clone)]
pub struct AudioChunk {
    pub data: Vec<u8>,
    pub sample_rate: u32,
    pub channels: u16,
    /// MIME type of the encoded audio, e.g. "audio/mpeg"
    pub mime_type: String,
}

/// Configuration for a streaming synthesizer.
#[derive(Debug, Clone)]
pub struct SynthesizerConfig {
    pub api_key: String,
    pub voice: String,
    pub model: String,
    pub sample_rate: u32,
}

impl Default for SynthesizerConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            voice: "alloy".to_string(),
            model: "tts-1".to_string(),
            sample_rate: 24000,
        }
    }
}

/// Error types for synthesis operations
#[derive(Debug, Clone, thiserror::Error)]
pub enum SynthesisError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),
    #[error("Provider not ready: {0}")]
    ProviderNotReady(String),
    #[error("Audio generation failed: {0}")]
    AudioGenerationFailed(String),
    #[error("Network error: {0}")]
    NetworkError(String),
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

/// Callback invoked for every audio chunk produced by the provider.
pub type AudioChunkCallback =
    Arc<dyn Fn(AudioChunk) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync>;

/// Base trait for streaming text-to-speech providers.
///
/// `stream` delivers audio through the registered callback and only
/// returns once the stream ends. Stop control is interior (`request_stop`
/// takes `&self`) so a controller can signal a stream that another task
/// is currently driving.
#[async_trait]
pub trait BaseSynthesizer: Send + Sync {
    /// Prepare the provider for synthesis requests.
    async fn connect(&mut self) -> Result<(), SynthesisError>;

    /// Release provider resources.
    async fn close(&mut self) -> Result<(), SynthesisError>;

    /// Synthesize `text`, delivering chunks through the audio callback
    /// until the stream completes or a stop is requested.
    async fn stream(&self, text: &str) -> Result<(), SynthesisError>;

    /// Ask the in-flight stream to wind down at the next chunk boundary.
    fn request_stop(&self);

    /// Whether a synthesis stream is currently producing audio.
    fn is_active(&self) -> bool;

    /// Register the audio callback. Must be called before `stream`.
    fn on_audio(&mut self, callback: AudioChunkCallback);
}
