//! The seam between a session and whatever carries its bytes.
//!
//! A transport registers a name on a signaling service, opens data links
//! to other registered peers, and reports everything that happened since
//! the last poll as [`TransportEvent`]s. The session drains those once per
//! tick, so implementations must never call back into it.

#[cfg(any(test, feature = "test-helpers"))]
pub mod loopback;

use skirmish_core::net::messages::Frame;
use skirmish_core::net::protocol::ProtocolError;
use skirmish_core::net::signal::SignalError;
use skirmish_core::player::PeerId;

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("not connected to the signaling service")]
    NotConnected,
    #[error("no open link to {0}")]
    LinkClosed(PeerId),
    #[error("failed to encode frame: {0}")]
    Encode(#[from] ProtocolError),
}

/// Something that happened on the transport since the last poll.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    /// The signaling service accepted our name (or assigned one).
    Registered { id: PeerId },
    /// A signaling request failed. `peer` names the target of a failed
    /// connect.
    SignalFailed {
        kind: SignalError,
        peer: Option<PeerId>,
    },
    /// A remote peer opened a link to us.
    Incoming { peer: PeerId },
    /// A link is ready for data in both directions.
    Open { peer: PeerId },
    Data { peer: PeerId, frame: Frame },
    /// A link is gone.
    Closed { peer: PeerId },
    /// The link to the signaling service dropped. Existing data links are
    /// gone with it.
    Disconnected,
}

/// Peer-to-peer link layer used by a session.
pub trait Transport {
    /// Register under `id`, or anonymously when `None`. The outcome arrives
    /// as `Registered` or `SignalFailed`.
    fn register(&mut self, id: Option<&PeerId>) -> Result<(), TransportError>;

    /// Open a link to a registered peer. The outcome arrives as `Open` or
    /// `SignalFailed`.
    fn connect(&mut self, peer: &PeerId) -> Result<(), TransportError>;

    fn send(&mut self, peer: &PeerId, frame: &Frame) -> Result<(), TransportError>;

    /// Close one link. The remote side sees `Closed`; we do not.
    fn close(&mut self, peer: &PeerId);

    /// Drop every link and give up our registered name.
    fn shutdown(&mut self);

    /// Everything that happened since the last poll, in arrival order.
    fn poll(&mut self) -> Vec<TransportEvent>;
}
