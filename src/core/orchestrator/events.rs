//! Typed events emitted to the client.

use serde::Serialize;

use crate::core::transcript::TranscriptEntry;
use crate::persona::Persona;

use super::status::ConversationStatus;

/// Everything the server sends over the session channel, serialized as
/// `{"type": ..., "data": {...}}`.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum SessionEvent {
    Status {
        status: ConversationStatus,
    },
    Transcript(TranscriptEntry),
    Audio {
        /// Base64-encoded audio payload
        audio: String,
        mime_type: String,
        sample_rate: u32,
        channels: u16,
    },
    AudioStop {
        reason: String,
    },
    SessionInitialized {
        session_id: String,
        room_name: String,
        status: ConversationStatus,
        persona: Persona,
    },
    Error {
        message: String,
    },
    ConversationReset {
        message: String,
    },
    TranscriptHistory {
        transcripts: Vec<TranscriptEntry>,
    },
    Pong {
        #[serde(skip_serializing_if = "Option::is_none")]
        timestamp: Option<u64>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::transcript::Speaker;

    #[test]
    fn events_serialize_in_wire_shape() {
        let event = SessionEvent::Status {
            status: ConversationStatus::Listening,
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "status");
        assert_eq!(value["data"]["status"], "listening");

        let event = SessionEvent::AudioStop {
            reason: "trainee_started_speaking".to_string(),
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "audio_stop");
        assert_eq!(value["data"]["reason"], "trainee_started_speaking");
    }

    #[test]
    fn transcript_event_flattens_entry_fields() {
        let event = SessionEvent::Transcript(TranscriptEntry {
            id: 3,
            speaker: Speaker::Trainee,
            text: "hello".to_string(),
            is_final: true,
            confidence: Some(0.9),
        });
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "transcript");
        assert_eq!(value["data"]["speaker"], "trainee");
        assert_eq!(value["data"]["text"], "hello");
        assert_eq!(value["data"]["is_final"], true);
        assert_eq!(value["data"]["id"], 3);
    }

    #[test]
    fn pong_omits_missing_timestamp() {
        let value = serde_json::to_value(SessionEvent::Pong { timestamp: None }).unwrap();
        assert_eq!(value["type"], "pong");
        assert!(
            value["data"]
                .as_object()
                .is_none_or(|data| !data.contains_key("timestamp"))
        );
    }
}
