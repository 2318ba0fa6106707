//! OpenAI speech synthesis wrapper with cooperative stop.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use futures::StreamExt;
use parking_lot::RwLock as SyncRwLock;
use serde::Serialize;
use tracing::{debug, warn};

use super::base::{
    AudioChunk, AudioChunkCallback, BaseSynthesizer, SynthesisError, SynthesizerConfig,
};

const OPENAI_SPEECH_URL: &str = "https://api.openai.com/v1/audio/speech";

#[derive(Serialize)]
struct SpeechRequest<'a> {
    model: &'a str,
    voice: &'a str,
    input: &'a str,
    response_format: &'a str,
}

/// Streaming synthesizer backed by the OpenAI speech endpoint.
///
/// The stop flag is checked between chunks, so a requested stop takes
/// effect at the next chunk boundary rather than mid-buffer.
pub struct OpenAiSynthesizer {
    config: SynthesizerConfig,
    client: reqwest::Client,
    callback: SyncRwLock<Option<AudioChunkCallback>>,
    stop: Arc<AtomicBool>,
    active: Arc<AtomicBool>,
    connected: AtomicBool,
}

impl OpenAiSynthesizer {
    pub fn new(config: SynthesizerConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
            callback: SyncRwLock::new(None),
            stop: Arc::new(AtomicBool::new(false)),
            active: Arc::new(AtomicBool::new(false)),
            connected: AtomicBool::new(false),
        }
    }

    async fn stream_inner(&self, text: &str) -> Result<(), SynthesisError> {
        let request = SpeechRequest {
            model: &self.config.model,
            voice: &self.config.voice,
            input: text,
            response_format: "mp3",
        };

        let response = self
            .client
            .post(OPENAI_SPEECH_URL)
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| SynthesisError::NetworkError(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(SynthesisError::AudioGenerationFailed(format!(
                "{status}: {body}"
            )));
        }

        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            if self.stop.load(Ordering::Acquire) {
                debug!("stop requested, ending synthesis stream");
                break;
            }
            let chunk = chunk.map_err(|e| SynthesisError::NetworkError(e.to_string()))?;
            if chunk.is_empty() {
                continue;
            }

            let callback = self.callback.read().clone();
            if let Some(callback) = callback {
                callback(AudioChunk {
                    data: chunk.to_vec(),
                    sample_rate: self.config.sample_rate,
                    channels: 1,
                    mime_type: "audio/mpeg".to_string(),
                })
                .await;
            }
        }

        Ok(())
    }
}

#[async_trait]
impl BaseSynthesizer for OpenAiSynthesizer {
    async fn connect(&mut self) -> Result<(), SynthesisError> {
        if self.config.api_key.is_empty() {
            return Err(SynthesisError::InvalidConfiguration(
                "missing API key".to_string(),
            ));
        }
        self.connected.store(true, Ordering::Release);
        Ok(())
    }

    async fn close(&mut self) -> Result<(), SynthesisError> {
        self.request_stop();
        self.connected.store(false, Ordering::Release);
        *self.callback.write() = None;
        Ok(())
    }

    async fn stream(&self, text: &str) -> Result<(), SynthesisError> {
        if !self.connected.load(Ordering::Acquire) {
            return Err(SynthesisError::ProviderNotReady(
                "synthesizer not connected".to_string(),
            ));
        }

        self.stop.store(false, Ordering::Release);
        self.active.store(true, Ordering::Release);
        let outcome = self.stream_inner(text).await;
        self.active.store(false, Ordering::Release);

        if let Err(error) = &outcome {
            warn!(error = %error, "speech synthesis request failed");
        }
        outcome
    }

    fn request_stop(&self) {
        self.stop.store(true, Ordering::Release);
    }

    fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    fn on_audio(&mut self, callback: AudioChunkCallback) {
        *self.callback.write() = Some(callback);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn connect_requires_api_key() {
        let mut synth = OpenAiSynthesizer::new(SynthesizerConfig::default());
        assert!(matches!(
            synth.connect().await,
            Err(SynthesisError::InvalidConfiguration(_))
        ));
    }

    #[tokio::test]
    async fn stream_requires_connection() {
        let synth = OpenAiSynthesizer::new(SynthesizerConfig {
            api_key: "key".to_string(),
            ..Default::default()
        });
        assert!(matches!(
            synth.stream("hello").await,
            Err(SynthesisError::ProviderNotReady(_))
        ));
    }

    #[test]
    fn stop_flag_round_trip() {
        let synth = OpenAiSynthesizer::new(SynthesizerConfig::default());
        assert!(!synth.is_active());
        synth.request_stop();
        assert!(synth.stop.load(Ordering::Acquire));
    }
}
