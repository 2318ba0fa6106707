//! Playback tracking and cooperative speech interruption.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use parking_lot::RwLock as SyncRwLock;
use tokio::sync::{RwLock, mpsc};
use tokio::task::JoinHandle;
use tokio::time::Duration;
use tracing::{debug, warn};

use crate::core::tts::BaseSynthesizer;

use super::events::SessionEvent;
use super::status::{ConversationStatus, StatusChannel};

/// A running synthesis task.
///
/// `finished` is swapped to true by whichever party retires the playback
/// first (the task itself on completion, or an interrupt/replace); the
/// party that wins the swap owns the single Speaking→Listening transition.
struct PlaybackHandle {
    task: JoinHandle<()>,
    finished: Arc<AtomicBool>,
    /// Monotonic per-controller playback counter. An interrupt that
    /// retires a handle checks it against the slot, so a replacement that
    /// started during the grace wait is never mistaken for the stream
    /// being interrupted.
    epoch: u64,
}

/// Single authority over whether synthesized audio is playing and over
/// stopping it.
pub struct SpeechInterruptController {
    synthesizer: Arc<RwLock<Option<Box<dyn BaseSynthesizer>>>>,
    status: Arc<StatusChannel>,
    events: mpsc::Sender<SessionEvent>,
    playback: SyncRwLock<Option<PlaybackHandle>>,
    epoch: AtomicU64,
    interrupt_in_progress: AtomicBool,
    interrupt_timeout: Duration,
}

impl SpeechInterruptController {
    pub fn new(
        synthesizer: Arc<RwLock<Option<Box<dyn BaseSynthesizer>>>>,
        status: Arc<StatusChannel>,
        events: mpsc::Sender<SessionEvent>,
        interrupt_timeout: Duration,
    ) -> Self {
        Self {
            synthesizer,
            status,
            events,
            playback: SyncRwLock::new(None),
            epoch: AtomicU64::new(0),
            interrupt_in_progress: AtomicBool::new(false),
            interrupt_timeout,
        }
    }

    /// True if a playback task is live or the synthesis stream reports
    /// itself active. Either signal alone counts: a task can be mid
    /// teardown while the stream already claims inactive, and vice versa.
    pub async fn is_speaking(&self) -> bool {
        let task_live = {
            let playback = self.playback.read();
            playback
                .as_ref()
                .is_some_and(|handle| !handle.finished.load(Ordering::Acquire) && !handle.task.is_finished())
        };
        if task_live {
            return true;
        }

        match self.synthesizer.read().await.as_ref() {
            Some(synth) => synth.is_active(),
            None => false,
        }
    }

    /// Launch playback of `text`, silently replacing any playback still
    /// running. Status flips to Speaking now and back to Listening exactly
    /// once, whichever way the stream ends.
    pub async fn start(&self, text: String) {
        self.stop_silent().await;

        self.status.set(ConversationStatus::Speaking).await;

        let finished = Arc::new(AtomicBool::new(false));
        let synthesizer = Arc::clone(&self.synthesizer);
        let status = Arc::clone(&self.status);
        let task_finished = Arc::clone(&finished);

        let task = tokio::spawn(async move {
            let outcome = {
                let guard = synthesizer.read().await;
                match guard.as_ref() {
                    Some(synth) => synth.stream(&text).await,
                    None => {
                        warn!("no synthesizer available, reply will be text-only");
                        Ok(())
                    }
                }
            };

            // Stream failures end playback, they do not end the session.
            if let Err(error) = outcome {
                warn!(error = %error, "speech synthesis failed mid-stream");
            }

            if !task_finished.swap(true, Ordering::AcqRel) {
                status.set(ConversationStatus::Listening).await;
            }
        });

        let epoch = self.epoch.fetch_add(1, Ordering::Relaxed) + 1;
        *self.playback.write() = Some(PlaybackHandle {
            task,
            finished,
            epoch,
        });
    }

    /// Cooperatively stop the current playback and notify the client once.
    ///
    /// Returns false without side effects when nothing is playing, when
    /// another interrupt is already in flight, or when a replacement
    /// playback superseded the interrupted one mid-wait. Otherwise:
    /// request a stop,
    /// give the stream a bounded grace period, cancel it outright past
    /// that, emit one `audio_stop` with `reason`, and land in Listening.
    pub async fn interrupt(&self, reason: &str) -> bool {
        if self.interrupt_in_progress.swap(true, Ordering::AcqRel) {
            debug!("interrupt already in progress, ignoring");
            return false;
        }
        let interrupted = self.interrupt_inner(reason).await;
        self.interrupt_in_progress.store(false, Ordering::Release);
        interrupted
    }

    async fn interrupt_inner(&self, reason: &str) -> bool {
        if !self.is_speaking().await {
            return false;
        }

        debug!(reason, "interrupting playback");

        if let Some(synth) = self.synthesizer.read().await.as_ref() {
            synth.request_stop();
        }

        let handle = self.playback.write().take();
        if let Some(mut handle) = handle {
            match tokio::time::timeout(self.interrupt_timeout, &mut handle.task).await {
                Ok(_) => debug!("playback stopped cooperatively"),
                Err(_) => {
                    warn!(
                        timeout_ms = self.interrupt_timeout.as_millis() as u64,
                        "playback did not stop in time, cancelling"
                    );
                    handle.task.abort();
                }
            }

            // A replacement playback may have started while we waited out
            // the grace period. It owns the slot and the status now; retire
            // the old handle without touching either, and tell the client
            // nothing.
            let superseded = self
                .playback
                .read()
                .as_ref()
                .is_some_and(|current| current.epoch > handle.epoch);
            if superseded {
                handle.finished.store(true, Ordering::Release);
                debug!("playback replaced during interrupt, newer stream keeps running");
                return false;
            }

            if !handle.finished.swap(true, Ordering::AcqRel) {
                self.status.set(ConversationStatus::Listening).await;
            }
        } else {
            // Stream reported active without a tracked task.
            self.status.set(ConversationStatus::Listening).await;
        }

        let _ = self
            .events
            .send(SessionEvent::AudioStop {
                reason: reason.to_string(),
            })
            .await;

        true
    }

    /// Stop any running playback without notifying the client. Used for
    /// replace-on-start, reset, and teardown.
    pub async fn stop_silent(&self) {
        let handle = self.playback.write().take();
        let Some(handle) = handle else {
            return;
        };

        if !handle.finished.swap(true, Ordering::AcqRel) {
            if let Some(synth) = self.synthesizer.read().await.as_ref() {
                synth.request_stop();
            }
            handle.task.abort();
        }
    }
}
