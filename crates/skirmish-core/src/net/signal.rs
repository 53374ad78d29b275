//! Schema of the link between a peer and the relay service.
//!
//! The relay never looks inside `payload`; it only brokers names and
//! forwards text between peers that have an open link.

use serde::{Deserialize, Serialize};

use crate::player::PeerId;

/// Peer → relay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum SignalRequest {
    /// Claim `id`, or ask for an anonymous id when `None`.
    Register {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<PeerId>,
    },
    /// Open a data link to a registered peer.
    Connect { peer: PeerId },
    /// Forward `payload` over an open link.
    Data { peer: PeerId, payload: String },
    /// Tear down the link to `peer`.
    Close { peer: PeerId },
    Heartbeat,
}

/// Relay → peer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum SignalEvent {
    Registered {
        id: PeerId,
    },
    Error {
        kind: SignalError,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        peer: Option<PeerId>,
    },
    /// Another peer opened a link to us. The link is usable immediately.
    Connection {
        peer: PeerId,
    },
    /// A link we asked for is open.
    Open {
        peer: PeerId,
    },
    Data {
        peer: PeerId,
        payload: String,
    },
    /// The link to `peer` is gone (explicit close or disconnect).
    Closed {
        peer: PeerId,
    },
}

/// Failure kinds reported by the relay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[serde(rename_all = "kebab-case")]
pub enum SignalError {
    #[error("id is already taken")]
    UnavailableId,
    #[error("peer is not registered")]
    PeerUnavailable,
    #[error("id is empty or too long")]
    InvalidId,
    #[error("relay is at capacity")]
    ServerFull,
    #[error("register before using the relay")]
    NotRegistered,
}

/// Longest id the relay accepts.
pub const MAX_PEER_ID_LEN: usize = 64;
