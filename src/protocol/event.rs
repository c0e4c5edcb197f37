//! Inbound event decoding.
//!
//! The TV pushes JSON text frames on the remote-control channel. Only two
//! events matter to the session: the channel-connect acknowledgment
//! (pairing success, possibly carrying a fresh token) and the unauthorized
//! rejection. Everything else (status chatter, malformed frames, non-JSON
//! noise) decodes to [`InboundEvent::Other`] and is ignored rather than
//! failing the connection.

// ============================================================================
// Imports
// ============================================================================

use serde_json::Value;

// ============================================================================
// Constants
// ============================================================================

/// Pairing success event name.
const EVENT_CONNECT: &str = "ms.channel.connect";

/// Pairing rejection event name.
const EVENT_UNAUTHORIZED: &str = "ms.channel.unauthorized";

// ============================================================================
// InboundEvent
// ============================================================================

/// A decoded inbound frame from the TV.
///
/// Transient: interpreted by the session state machine and not retained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    /// Channel-connect acknowledgment; pairing succeeded.
    Connected {
        /// Fresh pairing token, when the TV issues one.
        token: Option<String>,
    },

    /// The TV rejected the client; on-screen approval is required.
    Unauthorized,

    /// Anything else, including malformed frames. Ignored.
    Other,
}

impl InboundEvent {
    /// Decodes a text frame.
    ///
    /// Tolerant by design: unknown event names and unparseable text both
    /// yield [`InboundEvent::Other`].
    #[must_use]
    pub fn decode(text: &str) -> Self {
        let Ok(value) = serde_json::from_str::<Value>(text) else {
            return Self::Other;
        };

        match value.get("event").and_then(Value::as_str) {
            Some(EVENT_CONNECT) => Self::Connected {
                token: value
                    .pointer("/data/token")
                    .and_then(Value::as_str)
                    .map(str::to_string),
            },
            Some(EVENT_UNAUTHORIZED) => Self::Unauthorized,
            _ => Self::Other,
        }
    }

    /// Returns `true` for the unauthorized rejection.
    #[inline]
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connect_with_token() {
        let text = r#"{"event":"ms.channel.connect","data":{"token":"17447402"}}"#;
        assert_eq!(
            InboundEvent::decode(text),
            InboundEvent::Connected {
                token: Some("17447402".into())
            }
        );
    }

    #[test]
    fn test_connect_without_token() {
        let text = r#"{"event":"ms.channel.connect","data":{"id":"abc"}}"#;
        assert_eq!(
            InboundEvent::decode(text),
            InboundEvent::Connected { token: None }
        );
    }

    #[test]
    fn test_connect_without_data() {
        let text = r#"{"event":"ms.channel.connect"}"#;
        assert_eq!(
            InboundEvent::decode(text),
            InboundEvent::Connected { token: None }
        );
    }

    #[test]
    fn test_unauthorized() {
        let text = r#"{"event":"ms.channel.unauthorized"}"#;
        assert_eq!(InboundEvent::decode(text), InboundEvent::Unauthorized);
        assert!(InboundEvent::decode(text).is_unauthorized());
    }

    #[test]
    fn test_unknown_event_is_other() {
        let text = r#"{"event":"ms.channel.clientConnect","data":{}}"#;
        assert_eq!(InboundEvent::decode(text), InboundEvent::Other);
    }

    #[test]
    fn test_missing_event_field_is_other() {
        assert_eq!(InboundEvent::decode(r#"{"foo":"bar"}"#), InboundEvent::Other);
    }

    #[test]
    fn test_malformed_frame_is_other() {
        assert_eq!(InboundEvent::decode("not json at all"), InboundEvent::Other);
        assert_eq!(InboundEvent::decode(""), InboundEvent::Other);
    }

    #[test]
    fn test_non_string_token_is_none() {
        let text = r#"{"event":"ms.channel.connect","data":{"token":12345}}"#;
        assert_eq!(
            InboundEvent::decode(text),
            InboundEvent::Connected { token: None }
        );
    }
}
