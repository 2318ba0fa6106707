//! Top-level conversation coordinator.
//!
//! Wires transcript events through the dispatcher into generation, and
//! generation output into playback, while owning the status machine and
//! the teardown discipline.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use parking_lot::RwLock as SyncRwLock;
use tokio::sync::{Mutex, RwLock, mpsc};
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, info, warn};

use crate::core::llm::BaseGenerator;
use crate::core::stt::BaseTranscriber;
use crate::core::transcript::{Speaker, TranscriptFragment, TranscriptStore, resolve_turn_id};
use crate::core::tts::BaseSynthesizer;

use super::config::OrchestratorConfig;
use super::dispatcher::TurnDispatcher;
use super::errors::OrchestratorError;
use super::events::SessionEvent;
use super::playback::SpeechInterruptController;
use super::status::{ConversationStatus, StatusChannel};

const UTTERANCE_CHANNEL_SIZE: usize = 32;

/// The collaborators a session runs on. Generation is required; the
/// others degrade gracefully when absent.
pub struct Collaborators {
    pub transcriber: Option<Box<dyn BaseTranscriber>>,
    pub synthesizer: Option<Box<dyn BaseSynthesizer>>,
    pub generator: Option<Box<dyn BaseGenerator>>,
}

/// One conversation session: status machine, turn dispatch, playback
/// control, and collaborator lifecycle.
pub struct ConversationOrchestrator {
    status: Arc<StatusChannel>,
    events: mpsc::Sender<SessionEvent>,
    dispatcher: Arc<TurnDispatcher>,
    controller: Arc<SpeechInterruptController>,
    transcriber: Arc<RwLock<Option<Box<dyn BaseTranscriber>>>>,
    synthesizer: Arc<RwLock<Option<Box<dyn BaseSynthesizer>>>>,
    generator: Arc<RwLock<Option<Box<dyn BaseGenerator>>>>,
    transcripts: Arc<TranscriptStore>,
    /// Fire-and-forget audio forwarding tasks, tracked so teardown can
    /// cancel every one of them.
    audio_tasks: Mutex<JoinSet<()>>,
    /// Serializes utterance processing; dispatch events must not
    /// interleave their generation calls.
    utterance_lock: Mutex<()>,
    utterance_task: SyncRwLock<Option<JoinHandle<()>>>,
    last_ai_text: SyncRwLock<Option<String>>,
    active: AtomicBool,
}

impl ConversationOrchestrator {
    /// Build the session and start the dispatch loop. The session accepts
    /// work immediately but stays in Idle until [`Self::initialize`].
    pub fn new(
        config: OrchestratorConfig,
        collaborators: Collaborators,
        events: mpsc::Sender<SessionEvent>,
    ) -> Arc<Self> {
        let status = Arc::new(StatusChannel::new(events.clone()));
        let (utterance_tx, mut utterance_rx) = mpsc::channel(UTTERANCE_CHANNEL_SIZE);
        let dispatcher = TurnDispatcher::new(&config, utterance_tx);
        let synthesizer = Arc::new(RwLock::new(collaborators.synthesizer));
        let controller = Arc::new(SpeechInterruptController::new(
            Arc::clone(&synthesizer),
            Arc::clone(&status),
            events.clone(),
            config.interrupt_timeout(),
        ));

        let orchestrator = Arc::new(Self {
            status,
            events,
            dispatcher,
            controller,
            transcriber: Arc::new(RwLock::new(collaborators.transcriber)),
            synthesizer,
            generator: Arc::new(RwLock::new(collaborators.generator)),
            transcripts: Arc::new(TranscriptStore::new()),
            audio_tasks: Mutex::new(JoinSet::new()),
            utterance_lock: Mutex::new(()),
            utterance_task: SyncRwLock::new(None),
            last_ai_text: SyncRwLock::new(None),
            active: AtomicBool::new(true),
        });

        let loop_orchestrator = Arc::clone(&orchestrator);
        let task = tokio::spawn(async move {
            while let Some(text) = utterance_rx.recv().await {
                loop_orchestrator.handle_utterance(text).await;
            }
        });
        *orchestrator.utterance_task.write() = Some(task);

        orchestrator
    }

    /// Bring up the collaborators. Generation must succeed; the session
    /// ends in Error if it cannot. Transcription and synthesis failures
    /// only degrade the session (text in, text out still works).
    pub async fn initialize(
        self: &Arc<Self>,
        system_prompt: &str,
    ) -> Result<(), OrchestratorError> {
        self.status.set(ConversationStatus::Connecting).await;

        {
            let mut guard = self.generator.write().await;
            let Some(generator) = guard.as_mut() else {
                self.fail_init("no generation service configured").await;
                return Err(OrchestratorError::GenerationUnavailable);
            };

            let chunk_self = Arc::clone(self);
            generator.on_chunk(Arc::new(move |text, is_final| {
                let orchestrator = Arc::clone(&chunk_self);
                Box::pin(async move {
                    orchestrator.on_generation_chunk(text, is_final).await;
                })
            }));

            if let Err(error) = generator.initialize(system_prompt).await {
                self.fail_init("failed to start the conversation").await;
                return Err(OrchestratorError::GenerationInit(error.to_string()));
            }
        }

        {
            let mut guard = self.transcriber.write().await;
            match guard.as_mut() {
                Some(transcriber) => {
                    let transcript_self = Arc::clone(self);
                    transcriber.on_transcript(Arc::new(move |fragment| {
                        let orchestrator = Arc::clone(&transcript_self);
                        Box::pin(async move {
                            orchestrator.handle_transcript(fragment).await;
                        })
                    }));
                    if let Err(error) = transcriber.connect().await {
                        warn!(error = %error, "transcriber failed to connect, voice input disabled");
                        *guard = None;
                    }
                }
                None => warn!("no transcriber configured, voice input disabled"),
            }
        }

        {
            let mut guard = self.synthesizer.write().await;
            match guard.as_mut() {
                Some(synthesizer) => {
                    let events = self.events.clone();
                    synthesizer.on_audio(Arc::new(move |chunk| {
                        let events = events.clone();
                        Box::pin(async move {
                            let event = SessionEvent::Audio {
                                audio: BASE64.encode(&chunk.data),
                                mime_type: chunk.mime_type,
                                sample_rate: chunk.sample_rate,
                                channels: chunk.channels,
                            };
                            if events.send(event).await.is_err() {
                                debug!("event channel closed, dropping audio chunk");
                            }
                        })
                    }));
                    if let Err(error) = synthesizer.connect().await {
                        warn!(error = %error, "synthesizer failed to connect, voice output disabled");
                        *guard = None;
                    }
                }
                None => warn!("no synthesizer configured, voice output disabled"),
            }
        }

        self.status.set(ConversationStatus::Listening).await;
        Ok(())
    }

    async fn fail_init(&self, message: &str) {
        self.status.set(ConversationStatus::Error).await;
        let _ = self
            .events
            .send(SessionEvent::Error {
                message: message.to_string(),
            })
            .await;
    }

    pub fn status(&self) -> ConversationStatus {
        self.status.get()
    }

    /// Route one transcript fragment.
    ///
    /// A non-final trainee fragment arriving while the AI is speaking
    /// interrupts playback before anything else, so audio stops the
    /// instant speech is detected rather than after the debounce window.
    pub async fn handle_transcript(&self, fragment: TranscriptFragment) {
        if !self.active.load(Ordering::Acquire) {
            return;
        }

        if fragment.speaker == Speaker::Trainee
            && !fragment.is_final
            && self.controller.is_speaking().await
        {
            self.controller.interrupt("trainee_started_speaking").await;
        }

        if fragment.text.trim().is_empty() {
            return;
        }

        let entry = self.transcripts.record(
            fragment.speaker,
            &fragment.text,
            fragment.is_final,
            fragment.confidence,
        );
        let _ = self.events.send(SessionEvent::Transcript(entry)).await;

        if fragment.speaker == Speaker::Trainee {
            let turn_id = resolve_turn_id(fragment.id.as_ref());
            self.dispatcher.on_fragment(&fragment.text, turn_id);
        }
    }

    /// Process one finalized utterance: Thinking, then let the generation
    /// stream drive the rest. Serialized so racing dispatches cannot
    /// interleave.
    pub async fn handle_utterance(&self, text: String) {
        if !self.active.load(Ordering::Acquire) {
            return;
        }
        let _guard = self.utterance_lock.lock().await;

        self.status.set(ConversationStatus::Thinking).await;

        let outcome = {
            let mut guard = self.generator.write().await;
            match guard.as_mut() {
                Some(generator) => generator.stream(&text).await,
                None => {
                    warn!("utterance dropped, no generation service");
                    Ok(())
                }
            }
        };

        if let Err(error) = outcome {
            warn!(error = %error, "generation failed for utterance");
        }

        // If no playback started (empty or duplicate response, or a
        // failure), fall back to Listening ourselves.
        if self.status.get() == ConversationStatus::Thinking {
            self.status.set(ConversationStatus::Listening).await;
        }
    }

    /// Generation stream callback: `text` is the accumulated response so
    /// far, `is_final` marks completion.
    async fn on_generation_chunk(&self, text: String, is_final: bool) {
        if !self.active.load(Ordering::Acquire) || text.trim().is_empty() {
            return;
        }

        if !is_final {
            let entry = self
                .transcripts
                .record(Speaker::Customer, &text, false, None);
            let _ = self.events.send(SessionEvent::Transcript(entry)).await;
            return;
        }

        let duplicate = {
            let mut last = self.last_ai_text.write();
            if last.as_deref() == Some(text.as_str()) {
                true
            } else {
                *last = Some(text.clone());
                false
            }
        };
        if duplicate {
            debug!("suppressing duplicate model response");
            // Partials for the suppressed response may have opened an
            // entry; drop it so the next reply starts a fresh line.
            self.transcripts.discard(Speaker::Customer);
            return;
        }

        let entry = self.transcripts.record(Speaker::Customer, &text, true, None);
        let _ = self.events.send(SessionEvent::Transcript(entry)).await;

        self.controller.start(text).await;
    }

    /// Forward one inbound audio frame to the transcriber on its own
    /// tracked task.
    pub async fn forward_audio(&self, audio: Vec<u8>) {
        if !self.active.load(Ordering::Acquire) {
            return;
        }

        let transcriber = Arc::clone(&self.transcriber);
        let mut tasks = self.audio_tasks.lock().await;
        // Reap whatever has already finished.
        while tasks.try_join_next().is_some() {}
        tasks.spawn(async move {
            let mut guard = transcriber.write().await;
            if let Some(transcriber) = guard.as_mut() {
                if transcriber.is_connected() {
                    if let Err(error) = transcriber.send_audio(audio).await {
                        debug!(error = %error, "failed to forward audio frame");
                    }
                }
            }
        });
    }

    /// Finalized transcript history for the session.
    pub fn transcript_history(&self) -> Vec<crate::core::transcript::TranscriptEntry> {
        self.transcripts.history()
    }

    /// Mid-session restart: drop pending turns, dedup state, transcript
    /// history, and any in-flight playback (silently). Collaborator
    /// connections stay up.
    pub async fn reset(&self) {
        if !self.active.load(Ordering::Acquire) {
            return;
        }
        info!("resetting conversation state");

        self.dispatcher.reset();
        *self.last_ai_text.write() = None;
        self.controller.stop_silent().await;

        {
            let mut guard = self.generator.write().await;
            if let Some(generator) = guard.as_mut() {
                if let Err(error) = generator.reset().await {
                    warn!(error = %error, "generator reset failed");
                }
            }
        }

        self.transcripts.reset();
        self.status.set(ConversationStatus::Listening).await;
    }

    /// Tear the session down. Idempotent: the first caller wins, later
    /// calls return immediately. Collaborators close in a fixed order,
    /// transcriber first (stop intake), generation last, and a failure in
    /// one step never blocks the rest.
    pub async fn cleanup(&self) {
        if !self.active.swap(false, Ordering::AcqRel) {
            return;
        }
        info!("cleaning up session");

        if let Some(task) = self.utterance_task.write().take() {
            task.abort();
        }
        self.dispatcher.reset();
        self.controller.stop_silent().await;

        {
            let mut tasks = self.audio_tasks.lock().await;
            tasks.shutdown().await;
        }

        {
            let mut guard = self.transcriber.write().await;
            if let Some(transcriber) = guard.as_mut() {
                if let Err(error) = transcriber.close().await {
                    warn!(error = %error, "transcriber close failed");
                }
            }
            *guard = None;
        }

        {
            let mut guard = self.synthesizer.write().await;
            if let Some(synthesizer) = guard.as_mut() {
                if let Err(error) = synthesizer.close().await {
                    warn!(error = %error, "synthesizer close failed");
                }
            }
            *guard = None;
        }

        {
            let mut guard = self.generator.write().await;
            if let Some(generator) = guard.as_mut() {
                if let Err(error) = generator.close().await {
                    warn!(error = %error, "generator close failed");
                }
            }
            *guard = None;
        }

        self.status.set(ConversationStatus::Idle).await;
    }
}
