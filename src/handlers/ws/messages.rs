//! Client message types.

use serde::Deserialize;
use serde_json::json;

/// Everything the client sends over the session channel, as
/// `{"type": ..., "data": {...}}`.
///
/// Payload-free kinds are empty struct variants so they deserialize from
/// an empty `data` object the same way the payload-carrying ones do.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum IncomingMessage {
    Audio {
        /// Base64-encoded audio frame
        audio: String,
    },
    Text {
        text: String,
    },
    Ping {
        #[serde(default)]
        timestamp: Option<u64>,
    },
    GetTranscripts {},
    ResetConversation {},
    EndSession {},
}

/// Parse one client message, tolerating an omitted `data` object for
/// message types that carry no payload.
pub fn parse(raw: &str) -> Result<IncomingMessage, serde_json::Error> {
    let mut value: serde_json::Value = serde_json::from_str(raw)?;
    if let Some(object) = value.as_object_mut() {
        object.entry("data").or_insert_with(|| json!({}));
    }
    serde_json::from_value(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn audio_message_parses() {
        let message = parse(r#"{"type":"audio","data":{"audio":"AAAA"}}"#).unwrap();
        assert!(matches!(message, IncomingMessage::Audio { audio } if audio == "AAAA"));
    }

    #[test]
    fn text_message_parses() {
        let message = parse(r#"{"type":"text","data":{"text":"hello"}}"#).unwrap();
        assert!(matches!(message, IncomingMessage::Text { text } if text == "hello"));
    }

    #[test]
    fn payload_free_messages_accept_missing_data() {
        assert!(matches!(
            parse(r#"{"type":"get_transcripts"}"#).unwrap(),
            IncomingMessage::GetTranscripts {}
        ));
        assert!(matches!(
            parse(r#"{"type":"reset_conversation"}"#).unwrap(),
            IncomingMessage::ResetConversation {}
        ));
        assert!(matches!(
            parse(r#"{"type":"end_session"}"#).unwrap(),
            IncomingMessage::EndSession {}
        ));
        assert!(matches!(
            parse(r#"{"type":"ping"}"#).unwrap(),
            IncomingMessage::Ping { timestamp: None }
        ));
    }

    #[test]
    fn payload_free_messages_accept_empty_data() {
        assert!(matches!(
            parse(r#"{"type":"get_transcripts","data":{}}"#).unwrap(),
            IncomingMessage::GetTranscripts {}
        ));
        assert!(matches!(
            parse(r#"{"type":"reset_conversation","data":{}}"#).unwrap(),
            IncomingMessage::ResetConversation {}
        ));
        assert!(matches!(
            parse(r#"{"type":"end_session","data":{}}"#).unwrap(),
            IncomingMessage::EndSession {}
        ));
    }

    #[test]
    fn ping_carries_optional_timestamp() {
        let message = parse(r#"{"type":"ping","data":{"timestamp":123}}"#).unwrap();
        assert!(matches!(
            message,
            IncomingMessage::Ping {
                timestamp: Some(123)
            }
        ));
    }

    #[test]
    fn unknown_type_is_an_error() {
        assert!(parse(r#"{"type":"launch_missiles","data":{}}"#).is_err());
        assert!(parse("not json at all").is_err());
    }
}
