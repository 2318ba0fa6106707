//! Groq chat-completions wrapper with streamed responses.

use async_trait::async_trait;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::base::{BaseGenerator, ChunkCallback, GenerationError, GeneratorConfig};

const GROQ_CHAT_URL: &str = "https://api.groq.com/openai/v1/chat/completions";

#[derive(Debug, Clone, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    max_tokens: u32,
    stream: bool,
}

#[derive(Deserialize)]
struct StreamResponse {
    choices: Vec<StreamChoice>,
}

#[derive(Deserialize)]
struct StreamChoice {
    delta: StreamDelta,
}

#[derive(Deserialize)]
struct StreamDelta {
    #[serde(default)]
    content: Option<String>,
}

/// Role-play generator backed by the Groq chat-completions API.
///
/// Holds the running conversation in memory; every `stream` call sends
/// the full history so the persona stays in character across turns.
pub struct GroqGenerator {
    config: GeneratorConfig,
    client: reqwest::Client,
    history: Vec<ChatMessage>,
    callback: Option<ChunkCallback>,
}

impl GroqGenerator {
    pub fn new(config: GeneratorConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
            history: Vec::new(),
            callback: None,
        }
    }

    /// Pull content deltas out of one SSE line, if it carries any.
    fn parse_sse_line(line: &str) -> Option<String> {
        let data = line.strip_prefix("data: ")?.trim();
        if data.is_empty() || data == "[DONE]" {
            return None;
        }
        match serde_json::from_str::<StreamResponse>(data) {
            Ok(response) => response
                .choices
                .into_iter()
                .next()
                .and_then(|choice| choice.delta.content),
            Err(e) => {
                debug!(error = %e, "skipping unparseable stream line");
                None
            }
        }
    }
}

#[async_trait]
impl BaseGenerator for GroqGenerator {
    async fn initialize(&mut self, system_prompt: &str) -> Result<(), GenerationError> {
        if self.config.api_key.is_empty() {
            return Err(GenerationError::AuthenticationFailed(
                "missing API key".to_string(),
            ));
        }
        self.history.clear();
        self.history.push(ChatMessage {
            role: "system",
            content: system_prompt.to_string(),
        });
        Ok(())
    }

    async fn stream(&mut self, text: &str) -> Result<(), GenerationError> {
        if self.history.is_empty() {
            return Err(GenerationError::NotInitialized);
        }
        let callback = self
            .callback
            .clone()
            .ok_or(GenerationError::NotInitialized)?;

        self.history.push(ChatMessage {
            role: "user",
            content: text.to_string(),
        });

        let request = ChatRequest {
            model: &self.config.model,
            messages: &self.history,
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
            stream: true,
        };

        let response = self
            .client
            .post(GROQ_CHAT_URL)
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| GenerationError::RequestFailed(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            // The failed turn stays out of the history.
            self.history.pop();
            return Err(GenerationError::RequestFailed(format!(
                "{status}: {body}"
            )));
        }

        let mut accumulated = String::new();
        let mut pending = String::new();
        let mut stream = response.bytes_stream();

        while let Some(chunk) = stream.next().await {
            let chunk = match chunk {
                Ok(chunk) => chunk,
                Err(e) => {
                    warn!(error = %e, "generation stream broke mid-response");
                    break;
                }
            };
            pending.push_str(&String::from_utf8_lossy(&chunk));

            while let Some(newline) = pending.find('\n') {
                let line = pending[..newline].trim_end_matches('\r').to_string();
                pending.drain(..=newline);

                if let Some(delta) = Self::parse_sse_line(&line) {
                    accumulated.push_str(&delta);
                    callback(accumulated.clone(), false).await;
                }
            }
        }

        if accumulated.is_empty() {
            self.history.pop();
            return Err(GenerationError::InvalidResponse(
                "model produced no content".to_string(),
            ));
        }

        self.history.push(ChatMessage {
            role: "assistant",
            content: accumulated.clone(),
        });
        callback(accumulated, true).await;
        Ok(())
    }

    fn on_chunk(&mut self, callback: ChunkCallback) {
        self.callback = Some(callback);
    }

    async fn reset(&mut self) -> Result<(), GenerationError> {
        // Keep the system prompt, drop the conversation.
        self.history.truncate(1);
        Ok(())
    }

    async fn close(&mut self) -> Result<(), GenerationError> {
        self.history.clear();
        self.callback = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sse_line_parsing() {
        let line = r#"data: {"choices":[{"delta":{"content":"Hi"}}]}"#;
        assert_eq!(GroqGenerator::parse_sse_line(line), Some("Hi".to_string()));

        assert_eq!(GroqGenerator::parse_sse_line("data: [DONE]"), None);
        assert_eq!(GroqGenerator::parse_sse_line(": keep-alive"), None);
        assert_eq!(
            GroqGenerator::parse_sse_line(r#"data: {"choices":[{"delta":{}}]}"#),
            None
        );
    }

    #[tokio::test]
    async fn initialize_requires_api_key() {
        let mut generator = GroqGenerator::new(GeneratorConfig::default());
        let result = generator.initialize("prompt").await;
        assert!(matches!(
            result,
            Err(GenerationError::AuthenticationFailed(_))
        ));
    }

    #[tokio::test]
    async fn stream_requires_initialization() {
        let mut generator = GroqGenerator::new(GeneratorConfig {
            api_key: "key".to_string(),
            ..Default::default()
        });
        let result = generator.stream("hello").await;
        assert!(matches!(result, Err(GenerationError::NotInitialized)));
    }

    #[tokio::test]
    async fn reset_keeps_system_prompt() {
        let mut generator = GroqGenerator::new(GeneratorConfig {
            api_key: "key".to_string(),
            ..Default::default()
        });
        generator.initialize("be skeptical").await.unwrap();
        generator.history.push(ChatMessage {
            role: "user",
            content: "hello".to_string(),
        });

        generator.reset().await.unwrap();
        assert_eq!(generator.history.len(), 1);
        assert_eq!(generator.history[0].role, "system");
        assert_eq!(generator.history[0].content, "be skeptical");
    }
}
