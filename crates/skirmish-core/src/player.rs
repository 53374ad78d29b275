use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier a peer registered under on the signaling service.
///
/// The host's id is the room name itself; clients get an anonymous id
/// handed out by the relay.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PeerId(pub String);

impl PeerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PeerId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Team index. The host is always on [`TeamId::A`]; bots are always on
/// [`TeamId::B`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TeamId(pub u8);

impl TeamId {
    pub const A: TeamId = TeamId(0);
    pub const B: TeamId = TeamId(1);

    /// The other side of a two-team match.
    pub fn opponent(self) -> TeamId {
        if self == Self::A { Self::B } else { Self::A }
    }
}

impl fmt::Display for TeamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Role a peer ended up with after room bootstrap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Owns the room name and relays every message between clients.
    Host,
    /// Connected only to the host.
    Client,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opponent_flips_between_the_two_teams() {
        assert_eq!(TeamId::A.opponent(), TeamId::B);
        assert_eq!(TeamId::B.opponent(), TeamId::A);
    }

    #[test]
    fn peer_id_serializes_as_plain_string() {
        let json = serde_json::to_string(&PeerId::new("abc")).unwrap();
        assert_eq!(json, "\"abc\"");
    }
}
