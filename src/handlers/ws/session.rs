//! Session wiring: builds collaborators from configuration and routes
//! client messages into the orchestrator.

use std::ops::ControlFlow;
use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::ServerConfig;
use crate::core::llm::{BaseGenerator, GeneratorConfig, GroqGenerator};
use crate::core::orchestrator::{
    Collaborators, ConversationOrchestrator, OrchestratorError, SessionEvent,
};
use crate::core::stt::{BaseTranscriber, DeepgramTranscriber, TranscriberConfig};
use crate::core::transcript::{Speaker, TranscriptFragment};
use crate::core::tts::{BaseSynthesizer, OpenAiSynthesizer, SynthesizerConfig};
use crate::persona::Persona;

fn build_collaborators(config: &ServerConfig) -> Collaborators {
    let transcriber: Option<Box<dyn BaseTranscriber>> = if config.deepgram_api_key.is_empty() {
        warn!("DEEPGRAM_API_KEY is not set, sessions run without voice input");
        None
    } else {
        Some(Box::new(DeepgramTranscriber::new(TranscriberConfig {
            api_key: config.deepgram_api_key.clone(),
            ..Default::default()
        })))
    };

    let synthesizer: Option<Box<dyn BaseSynthesizer>> = if config.openai_api_key.is_empty() {
        warn!("OPENAI_API_KEY is not set, sessions run without voice output");
        None
    } else {
        Some(Box::new(OpenAiSynthesizer::new(SynthesizerConfig {
            api_key: config.openai_api_key.clone(),
            voice: config.tts_voice.clone(),
            ..Default::default()
        })))
    };

    let generator: Option<Box<dyn BaseGenerator>> =
        Some(Box::new(GroqGenerator::new(GeneratorConfig {
            api_key: config.groq_api_key.clone(),
            model: config.groq_model.clone(),
            ..Default::default()
        })));

    Collaborators {
        transcriber,
        synthesizer,
        generator,
    }
}

/// One live session: an orchestrator plus the event channel back to the
/// client.
pub struct SessionProcessor {
    session_id: String,
    orchestrator: Arc<ConversationOrchestrator>,
    events: mpsc::Sender<SessionEvent>,
}

impl SessionProcessor {
    /// Build the session and bring the collaborators up. On failure the
    /// orchestrator has already pushed an error event; the partially
    /// started session is torn down before returning.
    pub async fn start(
        config: &ServerConfig,
        persona: &'static Persona,
        events: mpsc::Sender<SessionEvent>,
    ) -> Result<Self, OrchestratorError> {
        let session_id = Uuid::new_v4().to_string();
        info!(session_id = %session_id, persona = persona.id, "starting session");

        let orchestrator = ConversationOrchestrator::new(
            config.orchestrator(),
            build_collaborators(config),
            events.clone(),
        );

        if let Err(error) = orchestrator.initialize(persona.system_prompt).await {
            orchestrator.cleanup().await;
            return Err(error);
        }

        let room_name = format!("session-{}", &session_id[..8]);
        let _ = events
            .send(SessionEvent::SessionInitialized {
                session_id: session_id.clone(),
                room_name,
                status: orchestrator.status(),
                persona: persona.clone(),
            })
            .await;

        Ok(Self {
            session_id,
            orchestrator,
            events,
        })
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Raw binary frames are audio.
    pub async fn handle_binary(&self, audio: Vec<u8>) {
        self.orchestrator.forward_audio(audio).await;
    }

    /// Dispatch one JSON message. Returns `Break` when the client asked
    /// to end the session.
    pub async fn handle_text(&self, raw: &str) -> ControlFlow<()> {
        let message = match super::messages::parse(raw) {
            Ok(message) => message,
            Err(error) => {
                warn!(error = %error, "unparseable client message");
                self.send_error("unrecognized message").await;
                return ControlFlow::Continue(());
            }
        };

        match message {
            super::IncomingMessage::Audio { audio } => match BASE64.decode(&audio) {
                Ok(bytes) => self.orchestrator.forward_audio(bytes).await,
                Err(error) => {
                    warn!(error = %error, "invalid base64 audio payload");
                    self.send_error("invalid audio payload").await;
                }
            },
            super::IncomingMessage::Text { text } => {
                // Typed input is a complete utterance; it flows through
                // the same turn dispatch as finalized speech.
                self.orchestrator
                    .handle_transcript(TranscriptFragment {
                        text,
                        is_final: true,
                        confidence: None,
                        speaker: Speaker::Trainee,
                        id: None,
                    })
                    .await;
            }
            super::IncomingMessage::Ping { timestamp } => {
                let _ = self.events.send(SessionEvent::Pong { timestamp }).await;
            }
            super::IncomingMessage::GetTranscripts {} => {
                let _ = self
                    .events
                    .send(SessionEvent::TranscriptHistory {
                        transcripts: self.orchestrator.transcript_history(),
                    })
                    .await;
            }
            super::IncomingMessage::ResetConversation {} => {
                self.orchestrator.reset().await;
                let _ = self
                    .events
                    .send(SessionEvent::ConversationReset {
                        message: "Conversation reset".to_string(),
                    })
                    .await;
            }
            super::IncomingMessage::EndSession {} => {
                info!(session_id = %self.session_id, "client ended session");
                return ControlFlow::Break(());
            }
        }

        ControlFlow::Continue(())
    }

    async fn send_error(&self, message: &str) {
        let _ = self
            .events
            .send(SessionEvent::Error {
                message: message.to_string(),
            })
            .await;
    }

    pub async fn shutdown(&self) {
        self.orchestrator.cleanup().await;
    }
}
