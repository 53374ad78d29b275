use serde::Serialize;
use serde::de::DeserializeOwned;

use super::messages::Frame;
use super::signal::{SignalEvent, SignalRequest};

/// Position sync rate in Hz.
pub const DEFAULT_SYNC_RATE_HZ: u32 = 30;

/// Maximum encoded frame size in bytes.
pub const MAX_MESSAGE_SIZE: usize = 64 * 1024; // 64 KiB

#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("empty message")]
    EmptyMessage,
    #[error("payload too large: {0} bytes (max {MAX_MESSAGE_SIZE})")]
    PayloadTooLarge(usize),
    #[error("serialize error: {0}")]
    SerializeError(String),
    #[error("deserialize error: {0}")]
    DeserializeError(String),
}

/// Encode any wire value as a JSON text frame.
pub fn encode_json<T: Serialize>(value: &T) -> Result<String, ProtocolError> {
    let text =
        serde_json::to_string(value).map_err(|e| ProtocolError::SerializeError(e.to_string()))?;
    if text.len() > MAX_MESSAGE_SIZE {
        return Err(ProtocolError::PayloadTooLarge(text.len()));
    }
    Ok(text)
}

/// Decode a JSON text frame.
pub fn decode_json<T: DeserializeOwned>(text: &str) -> Result<T, ProtocolError> {
    if text.trim().is_empty() {
        return Err(ProtocolError::EmptyMessage);
    }
    if text.len() > MAX_MESSAGE_SIZE {
        return Err(ProtocolError::PayloadTooLarge(text.len()));
    }
    serde_json::from_str(text).map_err(|e| ProtocolError::DeserializeError(e.to_string()))
}

/// Encode a game frame for a peer data link.
pub fn encode_frame(frame: &Frame) -> Result<String, ProtocolError> {
    encode_json(frame)
}

/// Decode a game frame received on a peer data link.
pub fn decode_frame(text: &str) -> Result<Frame, ProtocolError> {
    decode_json(text)
}

pub fn encode_signal_request(msg: &SignalRequest) -> Result<String, ProtocolError> {
    encode_json(msg)
}

pub fn decode_signal_request(text: &str) -> Result<SignalRequest, ProtocolError> {
    decode_json(text)
}

pub fn encode_signal_event(msg: &SignalEvent) -> Result<String, ProtocolError> {
    encode_json(msg)
}

pub fn decode_signal_event(text: &str) -> Result<SignalEvent, ProtocolError> {
    decode_json(text)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::net::messages::{NetMessage, WireVec3};
    use crate::net::signal::SignalError;
    use crate::player::{PeerId, TeamId};

    fn roundtrip(msg: NetMessage) {
        let frame = Frame::new(msg);
        let encoded = encode_frame(&frame).unwrap();
        let decoded = decode_frame(&encoded).unwrap();
        assert_eq!(frame, decoded);
    }

    #[test]
    fn roundtrip_every_message_kind() {
        let mut assignments = BTreeMap::new();
        assignments.insert(PeerId::new("c1"), TeamId::B);
        roundtrip(NetMessage::InitTeam {
            assignments,
            host_team: TeamId::A,
        });
        roundtrip(NetMessage::Move {
            pos: WireVec3 {
                x: 1.0,
                y: 10.0,
                z: -3.5,
            },
            rot_y: 0.25,
        });
        roundtrip(NetMessage::Hit {
            target_id: PeerId::new("c2"),
            damage: 80,
        });
        roundtrip(NetMessage::PlayerDead {
            dead_id: PeerId::new("c2"),
        });
        roundtrip(NetMessage::RoundEnded {
            winner_team: TeamId::B,
        });
        roundtrip(NetMessage::PlayerLeft {
            left_id: PeerId::new("c1"),
        });
        roundtrip(NetMessage::Heartbeat);
    }

    #[test]
    fn wire_field_names_match_browser_peers() {
        let frame = Frame::new(NetMessage::Hit {
            target_id: PeerId::new("abc"),
            damage: 22,
        });
        let value: serde_json::Value = serde_json::from_str(&encode_frame(&frame).unwrap()).unwrap();
        assert_eq!(value["type"], "hit");
        assert_eq!(value["targetId"], "abc");
        assert_eq!(value["damage"], 22);
        assert!(value.get("senderId").is_none());
    }

    #[test]
    fn decode_browser_init_team() {
        let text = r#"{"type":"init-team","assignments":{"peer-a":1,"peer-b":0},"hostTeam":0}"#;
        let frame = decode_frame(text).unwrap();
        match frame.message {
            NetMessage::InitTeam {
                assignments,
                host_team,
            } => {
                assert_eq!(host_team, TeamId::A);
                assert_eq!(assignments[&PeerId::new("peer-a")], TeamId::B);
                assert_eq!(assignments[&PeerId::new("peer-b")], TeamId::A);
            },
            other => panic!("Expected InitTeam, got {other:?}"),
        }
        assert!(frame.sender_id.is_none());
    }

    #[test]
    fn decode_browser_move_with_extra_fields() {
        let text = r#"{"type":"move","pos":{"x":20,"y":10,"z":-420},"rotY":3.14,"extra":true}"#;
        let frame = decode_frame(text).unwrap();
        assert_eq!(frame.message.kind(), "move");
    }

    #[test]
    fn sender_id_survives_relay() {
        let frame = Frame::new(NetMessage::Shoot {
            pos: WireVec3::default(),
            dir: WireVec3 {
                x: 0.0,
                y: 0.0,
                z: -1.0,
            },
        })
        .relayed_from(&PeerId::new("client-1"));
        let text = encode_frame(&frame).unwrap();
        assert!(text.contains("\"senderId\":\"client-1\""));
        let decoded = decode_frame(&text).unwrap();
        let link = PeerId::new("host");
        assert_eq!(decoded.origin(&link), &PeerId::new("client-1"));
    }

    #[test]
    fn relayed_from_keeps_original_sender() {
        let frame = Frame::new(NetMessage::Heartbeat)
            .relayed_from(&PeerId::new("a"))
            .relayed_from(&PeerId::new("b"));
        assert_eq!(frame.sender_id, Some(PeerId::new("a")));
    }

    #[test]
    fn decode_empty_message_fails() {
        assert!(matches!(decode_frame(""), Err(ProtocolError::EmptyMessage)));
        assert!(matches!(decode_frame("  "), Err(ProtocolError::EmptyMessage)));
    }

    #[test]
    fn decode_unknown_type_fails() {
        let result = decode_frame(r#"{"type":"teleport","to":1}"#);
        assert!(matches!(result, Err(ProtocolError::DeserializeError(_))));
    }

    #[test]
    fn decode_missing_field_fails() {
        assert!(decode_frame(r#"{"type":"hit","damage":10}"#).is_err());
    }

    #[test]
    fn oversized_frame_rejected() {
        let huge = format!(
            r#"{{"type":"player-left","leftId":"{}"}}"#,
            "x".repeat(MAX_MESSAGE_SIZE)
        );
        assert!(matches!(
            decode_frame(&huge),
            Err(ProtocolError::PayloadTooLarge(_))
        ));

        let frame = Frame::new(NetMessage::PlayerLeft {
            left_id: PeerId::new("x".repeat(MAX_MESSAGE_SIZE)),
        });
        assert!(matches!(
            encode_frame(&frame),
            Err(ProtocolError::PayloadTooLarge(_))
        ));
    }

    #[test]
    fn signal_register_omits_missing_id() {
        let text = encode_signal_request(&SignalRequest::Register { id: None }).unwrap();
        assert_eq!(text, r#"{"type":"register"}"#);
        let back = decode_signal_request(&text).unwrap();
        assert_eq!(back, SignalRequest::Register { id: None });
    }

    #[test]
    fn signal_error_kind_is_kebab_case() {
        let text = encode_signal_event(&SignalEvent::Error {
            kind: SignalError::UnavailableId,
            peer: None,
        })
        .unwrap();
        assert_eq!(text, r#"{"type":"error","kind":"unavailable-id"}"#);
        assert_eq!(
            decode_signal_event(&text).unwrap(),
            SignalEvent::Error {
                kind: SignalError::UnavailableId,
                peer: None
            }
        );
    }

    #[test]
    fn protocol_error_display() {
        assert_eq!(format!("{}", ProtocolError::EmptyMessage), "empty message");
        assert!(format!("{}", ProtocolError::PayloadTooLarge(99999)).contains("99999"));
        assert!(format!("{}", ProtocolError::SerializeError("boom".into())).contains("boom"));
        assert!(format!("{}", ProtocolError::DeserializeError("oops".into())).contains("oops"));
    }
}
