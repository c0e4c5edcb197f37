//! Outbound remote-control commands and their wire envelopes.
//!
//! Every outbound frame is a `ms.remote.control` envelope whose `params`
//! shape depends on the command kind:
//!
//! | Command | `Cmd` | `TypeOfRemote` |
//! |---------|-------|----------------|
//! | Key press | `Click` | `SendRemoteKey` |
//! | Pointer move | `Move` | `ProcessMouseDevice` |

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

// ============================================================================
// Key Codes
// ============================================================================

/// Remote key codes understood by the TV.
///
/// The wire format takes any key-code string; these constants cover the
/// commonly used buttons.
pub mod keys {
    /// Power toggle.
    pub const POWER: &str = "KEY_POWER";
    /// Home screen.
    pub const HOME: &str = "KEY_HOME";
    /// Back / return.
    pub const RETURN: &str = "KEY_RETURN";
    /// Selection / OK.
    pub const ENTER: &str = "KEY_ENTER";
    /// Navigate up.
    pub const UP: &str = "KEY_UP";
    /// Navigate down.
    pub const DOWN: &str = "KEY_DOWN";
    /// Navigate left.
    pub const LEFT: &str = "KEY_LEFT";
    /// Navigate right.
    pub const RIGHT: &str = "KEY_RIGHT";
    /// Volume up.
    pub const VOLUME_UP: &str = "KEY_VOLUP";
    /// Volume down.
    pub const VOLUME_DOWN: &str = "KEY_VOLDOWN";
    /// Mute toggle.
    pub const MUTE: &str = "KEY_MUTE";
    /// Channel up.
    pub const CHANNEL_UP: &str = "KEY_CHUP";
    /// Channel down.
    pub const CHANNEL_DOWN: &str = "KEY_CHDOWN";
}

// ============================================================================
// RemoteCommand
// ============================================================================

/// A single remote-control action.
///
/// Constructed per user action and consumed immediately; commands are
/// fire-and-forget and never queued across a disconnect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteCommand {
    /// Press a remote key identified by its key code.
    Key(String),

    /// Move the TV pointer by a relative delta.
    PointerMove {
        /// Horizontal delta in pixels.
        dx: i32,
        /// Vertical delta in pixels.
        dy: i32,
    },
}

impl RemoteCommand {
    /// Creates a key-press command.
    #[inline]
    #[must_use]
    pub fn key(code: impl Into<String>) -> Self {
        Self::Key(code.into())
    }

    /// Creates a pointer-move command.
    #[inline]
    #[must_use]
    pub const fn pointer_move(dx: i32, dy: i32) -> Self {
        Self::PointerMove { dx, dy }
    }

    /// Creates the heartbeat command: a no-op pointer move to origin.
    #[inline]
    #[must_use]
    pub const fn heartbeat() -> Self {
        Self::PointerMove { dx: 0, dy: 0 }
    }

    /// Serializes the command into its JSON wire frame.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Json`] if serialization fails.
    pub fn encode(&self) -> Result<String> {
        let frame = ControlFrame::from(self);
        Ok(serde_json::to_string(&frame)?)
    }

    /// Parses a JSON wire frame back into a command.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Protocol`] if the text is not a valid
    /// `ms.remote.control` frame.
    pub fn decode(text: &str) -> Result<Self> {
        let frame: ControlFrame = serde_json::from_str(text)
            .map_err(|e| Error::protocol(format!("invalid control frame: {e}")))?;
        Ok(frame.into())
    }
}

// ============================================================================
// Wire Envelope
// ============================================================================

/// The `ms.remote.control` wire envelope.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
struct ControlFrame {
    /// Always `"ms.remote.control"`.
    method: ControlMethod,
    /// Command-kind-specific parameters.
    params: ControlParams,
}

/// Method marker; a unit enum so any other method fails deserialization.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
enum ControlMethod {
    #[serde(rename = "ms.remote.control")]
    RemoteControl,
}

/// Per-kind `params` payloads, discriminated by the `Cmd` field.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "Cmd")]
enum ControlParams {
    /// Key press parameters.
    #[serde(rename = "Click")]
    Click {
        /// The key code, e.g. `KEY_VOLUP`.
        #[serde(rename = "DataOfCmd")]
        data_of_cmd: String,
        /// Fixed `"false"` string per the vendor protocol.
        #[serde(rename = "Option")]
        option: String,
        /// Fixed `"SendRemoteKey"` marker.
        #[serde(rename = "TypeOfRemote")]
        type_of_remote: String,
    },

    /// Pointer move parameters.
    #[serde(rename = "Move")]
    Move {
        /// Relative pointer delta.
        #[serde(rename = "Position")]
        position: Position,
        /// Fixed `"ProcessMouseDevice"` marker.
        #[serde(rename = "TypeOfRemote")]
        type_of_remote: String,
    },
}

/// Pointer delta carried by `Move` frames.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
struct Position {
    x: i32,
    y: i32,
}

impl From<&RemoteCommand> for ControlFrame {
    fn from(command: &RemoteCommand) -> Self {
        let params = match command {
            RemoteCommand::Key(code) => ControlParams::Click {
                data_of_cmd: code.clone(),
                option: "false".to_string(),
                type_of_remote: "SendRemoteKey".to_string(),
            },
            RemoteCommand::PointerMove { dx, dy } => ControlParams::Move {
                position: Position { x: *dx, y: *dy },
                type_of_remote: "ProcessMouseDevice".to_string(),
            },
        };

        Self {
            method: ControlMethod::RemoteControl,
            params,
        }
    }
}

impl From<ControlFrame> for RemoteCommand {
    fn from(frame: ControlFrame) -> Self {
        match frame.params {
            ControlParams::Click { data_of_cmd, .. } => Self::Key(data_of_cmd),
            ControlParams::Move { position, .. } => Self::PointerMove {
                dx: position.x,
                dy: position.y,
            },
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::Value;

    #[test]
    fn test_key_frame_shape() {
        let frame = RemoteCommand::key(keys::HOME).encode().expect("encode");
        let value: Value = serde_json::from_str(&frame).expect("json");

        assert_eq!(value["method"], "ms.remote.control");
        assert_eq!(value["params"]["Cmd"], "Click");
        assert_eq!(value["params"]["DataOfCmd"], "KEY_HOME");
        assert_eq!(value["params"]["Option"], "false");
        assert_eq!(value["params"]["TypeOfRemote"], "SendRemoteKey");
    }

    #[test]
    fn test_pointer_frame_shape() {
        let frame = RemoteCommand::pointer_move(5, -3).encode().expect("encode");
        let value: Value = serde_json::from_str(&frame).expect("json");

        assert_eq!(value["method"], "ms.remote.control");
        assert_eq!(value["params"]["Cmd"], "Move");
        assert_eq!(value["params"]["Position"]["x"], 5);
        assert_eq!(value["params"]["Position"]["y"], -3);
        assert_eq!(value["params"]["TypeOfRemote"], "ProcessMouseDevice");
    }

    #[test]
    fn test_pointer_round_trip() {
        let original = RemoteCommand::pointer_move(5, -3);
        let encoded = original.encode().expect("encode");
        let decoded = RemoteCommand::decode(&encoded).expect("decode");
        assert_eq!(decoded, original);
    }

    #[test]
    fn test_key_round_trip() {
        let original = RemoteCommand::key(keys::VOLUME_UP);
        let encoded = original.encode().expect("encode");
        let decoded = RemoteCommand::decode(&encoded).expect("decode");
        assert_eq!(decoded, original);
    }

    #[test]
    fn test_heartbeat_is_origin_move() {
        assert_eq!(
            RemoteCommand::heartbeat(),
            RemoteCommand::PointerMove { dx: 0, dy: 0 }
        );
    }

    #[test]
    fn test_decode_rejects_other_method() {
        let text = r#"{"method":"ms.channel.emit","params":{"Cmd":"Click"}}"#;
        let err = RemoteCommand::decode(text).unwrap_err();
        assert!(matches!(err, Error::Protocol { .. }));
    }

    #[test]
    fn test_decode_rejects_malformed() {
        let err = RemoteCommand::decode("not json").unwrap_err();
        assert!(matches!(err, Error::Protocol { .. }));
    }
}
