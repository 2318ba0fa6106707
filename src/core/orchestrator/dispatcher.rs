//! Debounced turn dispatch.
//!
//! Trainee fragments land in per-turn buffers and a single pause timer.
//! Every fragment re-arms the timer; when the trainee has been quiet for
//! the full pause, the oldest buffered turn dispatches as one utterance.
//! A backlog of further turns drains immediately, without waiting the
//! pause again.

use std::collections::{HashMap, VecDeque};
use std::time::Instant;

use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Duration;
use tracing::{debug, warn};

use super::config::OrchestratorConfig;

struct DispatchState {
    /// Turn ids awaiting dispatch, oldest first. A turn id appears at
    /// most once; re-buffering an id keeps its position.
    order: VecDeque<u64>,
    buffers: HashMap<u64, String>,
    timer: Option<JoinHandle<()>>,
    /// Bumped on every re-arm and reset so a stale timer task that lost
    /// the abort race can recognize itself and bail.
    epoch: u64,
    last_dispatched: Option<(String, Instant)>,
}

/// Collapses bursts of transcript fragments into one finalized utterance
/// per trainee turn.
///
/// Dispatched utterances go out on the channel handed to [`Self::new`];
/// the orchestrator consumes them strictly in order.
pub struct TurnDispatcher {
    pause: Duration,
    dedup_window: Duration,
    state: Mutex<DispatchState>,
    utterances: mpsc::Sender<String>,
}

impl TurnDispatcher {
    pub fn new(config: &OrchestratorConfig, utterances: mpsc::Sender<String>) -> Arc<Self> {
        Arc::new(Self {
            pause: config.pause(),
            dedup_window: config.dedup_window(),
            state: Mutex::new(DispatchState {
                order: VecDeque::new(),
                buffers: HashMap::new(),
                timer: None,
                epoch: 0,
                last_dispatched: None,
            }),
            utterances,
        })
    }

    /// Buffer a trainee fragment and restart the pause timer.
    ///
    /// The text replaces whatever was buffered for the turn; fragments for
    /// the same turn arrive as ever-growing hypotheses, not deltas. Final
    /// fragments are treated no differently, since the trainee may still
    /// add a trailing clause after what the provider marked final.
    pub fn on_fragment(self: &Arc<Self>, text: &str, turn_id: u64) {
        let mut state = self.state.lock();
        if !state.buffers.contains_key(&turn_id) {
            state.order.push_back(turn_id);
        }
        state.buffers.insert(turn_id, text.to_string());
        self.arm_timer(&mut state, self.pause);
    }

    /// Cancel the pending timer and drop all buffered turns and dedup
    /// state. Safe to call at any time, including mid-debounce.
    pub fn reset(&self) {
        let mut state = self.state.lock();
        state.epoch += 1;
        if let Some(timer) = state.timer.take() {
            timer.abort();
        }
        state.order.clear();
        state.buffers.clear();
        state.last_dispatched = None;
    }

    /// Number of turns still awaiting dispatch.
    pub fn pending(&self) -> usize {
        self.state.lock().order.len()
    }

    fn arm_timer(self: &Arc<Self>, state: &mut DispatchState, delay: Duration) {
        state.epoch += 1;
        let epoch = state.epoch;
        if let Some(timer) = state.timer.take() {
            timer.abort();
        }
        let dispatcher = Arc::clone(self);
        state.timer = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            dispatcher.fire(epoch).await;
        }));
    }

    async fn fire(self: Arc<Self>, epoch: u64) {
        let dispatched = {
            let mut state = self.state.lock();
            if state.epoch != epoch {
                return;
            }
            state.timer = None;

            let Some(turn_id) = state.order.pop_front() else {
                return;
            };
            let text = state.buffers.remove(&turn_id).unwrap_or_default();

            let dispatched = if text.trim().is_empty() {
                None
            } else if self.is_duplicate(&state, &text) {
                debug!(turn_id, "suppressing duplicate dispatch");
                None
            } else {
                state.last_dispatched = Some((text.clone(), Instant::now()));
                Some(text)
            };

            // Backlog drains without re-imposing the pause.
            if !state.order.is_empty() {
                self.arm_timer(&mut state, Duration::ZERO);
            }

            dispatched
        };

        if let Some(text) = dispatched {
            debug!(text = %text, "dispatching finalized utterance");
            if self.utterances.send(text).await.is_err() {
                warn!("utterance channel closed, dropping dispatch");
            }
        }
    }

    fn is_duplicate(&self, state: &DispatchState, text: &str) -> bool {
        matches!(
            &state.last_dispatched,
            Some((last, at)) if last == text && at.elapsed() < self.dedup_window
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dispatcher_with(
        user_pause_ms: u64,
    ) -> (Arc<TurnDispatcher>, mpsc::Receiver<String>) {
        let config = OrchestratorConfig {
            user_pause_ms,
            ..Default::default()
        };
        let (tx, rx) = mpsc::channel(16);
        (TurnDispatcher::new(&config, tx), rx)
    }

    async fn expect_none(rx: &mut mpsc::Receiver<String>) {
        let outcome = tokio::time::timeout(Duration::from_secs(5), rx.recv()).await;
        assert!(outcome.is_err(), "unexpected dispatch: {outcome:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn burst_collapses_to_one_dispatch() {
        let (dispatcher, mut rx) = dispatcher_with(700);

        for text in ["h", "he", "hel", "hell", "hello"] {
            dispatcher.on_fragment(text, 0);
        }

        assert_eq!(rx.recv().await.unwrap(), "hello");
        expect_none(&mut rx).await;
    }

    #[tokio::test(start_paused = true)]
    async fn backlog_drains_without_second_pause() {
        let (dispatcher, mut rx) = dispatcher_with(700);

        dispatcher.on_fragment("one", 1);
        dispatcher.on_fragment("two", 2);

        let started = tokio::time::Instant::now();
        assert_eq!(rx.recv().await.unwrap(), "one");
        assert_eq!(rx.recv().await.unwrap(), "two");

        // One pause for the head, zero delay for the backlog entry.
        assert!(started.elapsed() < Duration::from_millis(1400));
    }

    #[tokio::test(start_paused = true)]
    async fn fresh_utterance_waits_full_pause() {
        let (dispatcher, mut rx) = dispatcher_with(700);

        dispatcher.on_fragment("first", 1);
        assert_eq!(rx.recv().await.unwrap(), "first");

        let started = tokio::time::Instant::now();
        dispatcher.on_fragment("second", 2);
        assert_eq!(rx.recv().await.unwrap(), "second");
        assert!(started.elapsed() >= Duration::from_millis(700));
    }

    #[tokio::test(start_paused = true)]
    async fn rebuffering_a_turn_keeps_its_position() {
        let (dispatcher, mut rx) = dispatcher_with(700);

        dispatcher.on_fragment("first draft", 1);
        dispatcher.on_fragment("interjection", 2);
        dispatcher.on_fragment("first draft, extended", 1);

        assert_eq!(rx.recv().await.unwrap(), "first draft, extended");
        assert_eq!(rx.recv().await.unwrap(), "interjection");
    }

    #[tokio::test(start_paused = true)]
    async fn duplicate_text_within_window_is_suppressed() {
        let (dispatcher, mut rx) = dispatcher_with(700);

        dispatcher.on_fragment("hello", 1);
        assert_eq!(rx.recv().await.unwrap(), "hello");

        // Same text again as a new turn, well within the 500ms window in
        // real time.
        dispatcher.on_fragment("hello", 2);
        expect_none(&mut rx).await;

        // Different text goes through.
        dispatcher.on_fragment("hello there", 3);
        assert_eq!(rx.recv().await.unwrap(), "hello there");
    }

    #[tokio::test(start_paused = true)]
    async fn empty_text_never_dispatches() {
        let (dispatcher, mut rx) = dispatcher_with(700);

        dispatcher.on_fragment("   ", 1);
        expect_none(&mut rx).await;
    }

    #[tokio::test(start_paused = true)]
    async fn reset_drops_pending_turns() {
        let (dispatcher, mut rx) = dispatcher_with(700);

        dispatcher.on_fragment("doomed", 1);
        dispatcher.on_fragment("also doomed", 2);
        dispatcher.reset();
        assert_eq!(dispatcher.pending(), 0);
        expect_none(&mut rx).await;

        // A fragment after reset starts a fresh cycle.
        dispatcher.on_fragment("fresh start", 1);
        assert_eq!(rx.recv().await.unwrap(), "fresh start");
    }
}
