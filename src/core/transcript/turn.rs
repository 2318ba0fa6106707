//! Fragment and turn-identity types shared by the transcription layer
//! and the orchestrator.

use serde::{Deserialize, Serialize};
use xxhash_rust::xxh3::xxh3_64;

/// Who produced a span of speech.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Speaker {
    Trainee,
    Customer,
}

/// Turn identifier as delivered by an upstream transcription provider.
///
/// Providers disagree on the shape of this field: some send integers, some
/// send opaque strings, some omit it entirely for interim results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UpstreamId {
    Number(u64),
    Text(String),
}

/// One transcription event for a span of speech. Produced by the
/// transcriber (or the text fallback path), consumed immediately.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptFragment {
    pub text: String,
    pub is_final: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
    pub speaker: Speaker,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<UpstreamId>,
}

/// Resolve an upstream id to the key used to group fragments into turns.
///
/// Integer ids (including numeric strings) are used as-is. Non-numeric
/// strings are hashed with xxh3 so the same upstream id always lands on
/// the same turn, even across a reconnect that replays ids. An absent id
/// maps to slot `0`: fragments without ids repeatedly overwrite a single
/// pending buffer rather than opening new turns.
pub fn resolve_turn_id(id: Option<&UpstreamId>) -> u64 {
    match id {
        None => 0,
        Some(UpstreamId::Number(n)) => *n,
        Some(UpstreamId::Text(s)) => match s.parse::<u64>() {
            Ok(n) => n,
            Err(_) => xxh3_64(s.as_bytes()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_ids_pass_through() {
        assert_eq!(resolve_turn_id(Some(&UpstreamId::Number(42))), 42);
        assert_eq!(
            resolve_turn_id(Some(&UpstreamId::Text("42".to_string()))),
            42
        );
    }

    #[test]
    fn absent_id_uses_rolling_slot() {
        assert_eq!(resolve_turn_id(None), 0);
    }

    #[test]
    fn string_ids_hash_stably() {
        let a = resolve_turn_id(Some(&UpstreamId::Text("seg-abc".to_string())));
        let b = resolve_turn_id(Some(&UpstreamId::Text("seg-abc".to_string())));
        let c = resolve_turn_id(Some(&UpstreamId::Text("seg-def".to_string())));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn fragment_deserializes_with_either_id_shape() {
        let numeric: TranscriptFragment = serde_json::from_str(
            r#"{"text":"hi","is_final":false,"speaker":"trainee","id":7}"#,
        )
        .unwrap();
        assert_eq!(numeric.id, Some(UpstreamId::Number(7)));

        let textual: TranscriptFragment = serde_json::from_str(
            r#"{"text":"hi","is_final":true,"speaker":"customer","id":"seg-1"}"#,
        )
        .unwrap();
        assert_eq!(textual.id, Some(UpstreamId::Text("seg-1".to_string())));
    }
}
