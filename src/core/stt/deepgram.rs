//! Deepgram streaming transcription wrapper.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio_tungstenite::{connect_async, tungstenite::protocol::Message};
use tracing::{debug, error, info, warn};
use url::Url;

use crate::core::transcript::{Speaker, TranscriptFragment};

use super::base::{BaseTranscriber, TranscriberConfig, TranscriptCallback, TranscriptionError};

const DEEPGRAM_LISTEN_URL: &str = "wss://api.deepgram.com/v1/listen";

#[derive(Debug, Deserialize)]
struct DeepgramResponse {
    #[serde(rename = "type")]
    response_type: String,
    channel: Option<DeepgramChannel>,
    is_final: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct DeepgramChannel {
    alternatives: Vec<DeepgramAlternative>,
}

#[derive(Debug, Deserialize)]
struct DeepgramAlternative {
    transcript: String,
    confidence: f32,
}

/// Streaming transcriber backed by the Deepgram listen endpoint.
///
/// All fragments are attributed to the trainee: the only microphone in a
/// training session is theirs.
pub struct DeepgramTranscriber {
    config: TranscriberConfig,
    ws_sender: Option<mpsc::UnboundedSender<Message>>,
    shutdown_tx: Option<broadcast::Sender<()>>,
    connection_task: Option<JoinHandle<()>>,
    connected: Arc<AtomicBool>,
    callback: Option<TranscriptCallback>,
}

impl DeepgramTranscriber {
    pub fn new(config: TranscriberConfig) -> Self {
        Self {
            config,
            ws_sender: None,
            shutdown_tx: None,
            connection_task: None,
            connected: Arc::new(AtomicBool::new(false)),
            callback: None,
        }
    }

    fn build_websocket_url(&self) -> Result<String, TranscriptionError> {
        let mut url = Url::parse(DEEPGRAM_LISTEN_URL)
            .map_err(|e| TranscriptionError::ConfigurationError(format!("invalid URL: {e}")))?;

        {
            let mut query_pairs = url.query_pairs_mut();
            query_pairs.append_pair("model", &self.config.model);
            query_pairs.append_pair("language", &self.config.language);
            query_pairs.append_pair("encoding", &self.config.encoding);
            query_pairs.append_pair("sample_rate", &self.config.sample_rate.to_string());
            query_pairs.append_pair("channels", &self.config.channels.to_string());
            query_pairs.append_pair("punctuate", "true");
            query_pairs.append_pair("interim_results", "true");
            query_pairs.append_pair("smart_format", "true");
        }

        Ok(url.to_string())
    }

    fn handle_message(message: Message, callback: Option<&TranscriptCallback>) -> Option<TranscriptFragment> {
        let Message::Text(text) = message else {
            match message {
                Message::Close(frame) => info!("Deepgram closed the connection: {frame:?}"),
                Message::Binary(data) => warn!("unexpected binary frame from Deepgram ({} bytes)", data.len()),
                _ => {}
            }
            return None;
        };

        let response: DeepgramResponse = match serde_json::from_str(&text) {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "unparseable Deepgram message");
                return None;
            }
        };

        if response.response_type != "Results" {
            debug!("ignoring Deepgram {} message", response.response_type);
            return None;
        }

        let alternative = response.channel?.alternatives.into_iter().next()?;
        callback?;

        Some(TranscriptFragment {
            text: alternative.transcript,
            is_final: response.is_final.unwrap_or(false),
            confidence: Some(alternative.confidence),
            speaker: Speaker::Trainee,
            id: None,
        })
    }
}

#[async_trait::async_trait]
impl BaseTranscriber for DeepgramTranscriber {
    async fn connect(&mut self) -> Result<(), TranscriptionError> {
        if self.config.api_key.is_empty() {
            return Err(TranscriptionError::AuthenticationFailed(
                "missing API key".to_string(),
            ));
        }

        let ws_url = self.build_websocket_url()?;

        let (ws_tx, mut ws_rx) = mpsc::unbounded_channel::<Message>();
        let (shutdown_tx, mut shutdown_rx) = broadcast::channel::<()>(1);
        self.ws_sender = Some(ws_tx);
        self.shutdown_tx = Some(shutdown_tx);

        let request = tokio_tungstenite::tungstenite::http::Request::builder()
            .uri(&ws_url)
            .header("Authorization", format!("token {}", self.config.api_key))
            .header("Sec-WebSocket-Protocol", "token")
            .body(())
            .map_err(|e| TranscriptionError::ConfigurationError(e.to_string()))?;

        let (ws_stream, _) = connect_async(request)
            .await
            .map_err(|e| TranscriptionError::ConnectionFailed(e.to_string()))?;

        info!("connected to Deepgram");
        self.connected.store(true, Ordering::Release);

        let (mut ws_sink, mut ws_stream) = ws_stream.split();
        let connected = Arc::clone(&self.connected);
        let callback = self.callback.clone();

        self.connection_task = Some(tokio::spawn(async move {
            loop {
                tokio::select! {
                    Some(message) = ws_rx.recv() => {
                        if let Err(e) = ws_sink.send(message).await {
                            error!(error = %e, "failed to send to Deepgram");
                            break;
                        }
                    }

                    message = ws_stream.next() => {
                        match message {
                            Some(Ok(message)) => {
                                if let Some(fragment) = Self::handle_message(message, callback.as_ref()) {
                                    if let Some(callback) = &callback {
                                        callback(fragment).await;
                                    }
                                }
                            }
                            Some(Err(e)) => {
                                error!(error = %e, "Deepgram stream error");
                                break;
                            }
                            None => {
                                info!("Deepgram stream ended");
                                break;
                            }
                        }
                    }

                    _ = shutdown_rx.recv() => {
                        debug!("Deepgram connection shutting down");
                        break;
                    }
                }
            }
            connected.store(false, Ordering::Release);
        }));

        Ok(())
    }

    async fn close(&mut self) -> Result<(), TranscriptionError> {
        if let Some(sender) = &self.ws_sender {
            let _ = sender.send(Message::Close(None));
        }
        if let Some(shutdown) = self.shutdown_tx.take() {
            let _ = shutdown.send(());
        }
        if let Some(task) = self.connection_task.take() {
            let _ = task.await;
        }
        self.ws_sender = None;
        self.connected.store(false, Ordering::Release);
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    async fn send_audio(&mut self, audio: Vec<u8>) -> Result<(), TranscriptionError> {
        let sender = self
            .ws_sender
            .as_ref()
            .ok_or_else(|| TranscriptionError::SendFailed("not connected".to_string()))?;
        sender
            .send(Message::Binary(audio.into()))
            .map_err(|e| TranscriptionError::SendFailed(e.to_string()))
    }

    fn on_transcript(&mut self, callback: TranscriptCallback) {
        self.callback = Some(callback);
    }
}
