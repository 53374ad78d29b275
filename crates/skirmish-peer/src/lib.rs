//! Native front end for a Skirmish session.
//!
//! [`link::WsTransport`] carries a session's signaling and data traffic
//! over one WebSocket to the relay service. [`script::Script`] feeds it
//! recorded input so a match can run headless.

pub mod backoff;
pub mod link;
pub mod script;

#[derive(Debug, thiserror::Error)]
pub enum PeerError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("invalid input script: {0}")]
    Script(#[from] serde_json::Error),
}
