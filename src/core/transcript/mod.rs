//! Transcript assembly: fragment merging, turn identity, and the
//! per-speaker display history.

mod merge;
mod store;
mod turn;

pub use merge::merge_transcript_text;
pub use store::{TranscriptEntry, TranscriptStore};
pub use turn::{Speaker, TranscriptFragment, UpstreamId, resolve_turn_id};
