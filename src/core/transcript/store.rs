//! Display-transcript bookkeeping per speaker.

use std::collections::HashMap;

use parking_lot::Mutex;
use serde::Serialize;

use super::Speaker;
use super::merge::merge_transcript_text;

/// One line of the display transcript as shown to the client.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TranscriptEntry {
    pub id: u64,
    pub speaker: Speaker,
    pub text: String,
    pub is_final: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
}

struct SpeakerSlot {
    id: u64,
    text: String,
}

struct StoreState {
    next_id: u64,
    slots: HashMap<Speaker, SpeakerSlot>,
    history: Vec<TranscriptEntry>,
}

/// Accumulates fragments into one growing entry per speaker and keeps the
/// finalized history.
///
/// Each speaker has at most one open (non-final) entry at a time; fragments
/// merge into it and keep its display id so the client updates a single
/// line in place. A final fragment seals the entry into the history and
/// frees the slot.
pub struct TranscriptStore {
    state: Mutex<StoreState>,
}

impl TranscriptStore {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(StoreState {
                next_id: 1,
                slots: HashMap::new(),
                history: Vec::new(),
            }),
        }
    }

    /// Fold a fragment into the speaker's open entry and return the entry
    /// to display.
    pub fn record(
        &self,
        speaker: Speaker,
        text: &str,
        is_final: bool,
        confidence: Option<f32>,
    ) -> TranscriptEntry {
        let mut state = self.state.lock();

        let (id, merged) = match state.slots.get_mut(&speaker) {
            Some(slot) => {
                slot.text = merge_transcript_text(&slot.text, text);
                (slot.id, slot.text.clone())
            }
            None => {
                let id = state.next_id;
                state.next_id += 1;
                state.slots.insert(
                    speaker,
                    SpeakerSlot {
                        id,
                        text: text.to_string(),
                    },
                );
                (id, text.to_string())
            }
        };

        let entry = TranscriptEntry {
            id,
            speaker,
            text: merged,
            is_final,
            confidence,
        };

        if is_final {
            state.history.push(entry.clone());
            state.slots.remove(&speaker);
        }

        entry
    }

    /// Drop a speaker's open entry without sealing it into the history.
    /// The next fragment for that speaker opens a fresh entry.
    pub fn discard(&self, speaker: Speaker) {
        self.state.lock().slots.remove(&speaker);
    }

    /// Finalized entries in arrival order.
    pub fn history(&self) -> Vec<TranscriptEntry> {
        self.state.lock().history.clone()
    }

    /// Drop all open entries and history, restarting id allocation.
    pub fn reset(&self) {
        let mut state = self.state.lock();
        state.next_id = 1;
        state.slots.clear();
        state.history.clear();
    }
}

impl Default for TranscriptStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interim_fragments_keep_one_id_per_speaker() {
        let store = TranscriptStore::new();

        let a = store.record(Speaker::Trainee, "I think", false, Some(0.9));
        let b = store.record(Speaker::Trainee, "I think so", false, Some(0.92));
        assert_eq!(a.id, b.id);
        assert_eq!(b.text, "I think so");
        assert!(store.history().is_empty());
    }

    #[test]
    fn final_fragment_seals_entry_into_history() {
        let store = TranscriptStore::new();

        store.record(Speaker::Trainee, "I think", false, None);
        let sealed = store.record(Speaker::Trainee, "I think so", true, Some(0.95));
        assert!(sealed.is_final);
        assert_eq!(sealed.text, "I think so");

        let history = store.history();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0], sealed);

        // Slot is free again: the next fragment opens a new entry.
        let next = store.record(Speaker::Trainee, "also", false, None);
        assert_ne!(next.id, sealed.id);
        assert_eq!(next.text, "also");
    }

    #[test]
    fn speakers_do_not_share_slots() {
        let store = TranscriptStore::new();

        let trainee = store.record(Speaker::Trainee, "hello", false, None);
        let customer = store.record(Speaker::Customer, "hi there", false, None);
        assert_ne!(trainee.id, customer.id);

        // Merging continues independently.
        let trainee2 = store.record(Speaker::Trainee, "hello again", false, None);
        assert_eq!(trainee2.id, trainee.id);
        assert_eq!(trainee2.text, "hello again");
    }

    #[test]
    fn overlapping_resend_merges_instead_of_duplicating() {
        let store = TranscriptStore::new();

        store.record(Speaker::Customer, "let me think about", false, None);
        let merged = store.record(Speaker::Customer, "about that", true, None);
        assert_eq!(merged.text, "let me think about that");
    }

    #[test]
    fn discard_drops_open_entry_without_sealing() {
        let store = TranscriptStore::new();
        store.record(Speaker::Customer, "half a thought", false, None);
        store.discard(Speaker::Customer);
        assert!(store.history().is_empty());

        // The stale text is gone; a new fragment starts clean.
        let fresh = store.record(Speaker::Customer, "new line", false, None);
        assert_eq!(fresh.text, "new line");
        assert_eq!(fresh.id, 2);
    }

    #[test]
    fn reset_clears_everything() {
        let store = TranscriptStore::new();
        store.record(Speaker::Trainee, "one", true, None);
        store.record(Speaker::Customer, "two", false, None);

        store.reset();
        assert!(store.history().is_empty());

        let fresh = store.record(Speaker::Trainee, "three", false, None);
        assert_eq!(fresh.id, 1);
    }
}
