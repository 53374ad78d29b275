use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::player::{PeerId, TeamId};

/// A position or direction on the wire, encoded as `{x, y, z}`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct WireVec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl From<glam::Vec3> for WireVec3 {
    fn from(v: glam::Vec3) -> Self {
        Self {
            x: v.x,
            y: v.y,
            z: v.z,
        }
    }
}

impl From<WireVec3> for glam::Vec3 {
    fn from(v: WireVec3) -> Self {
        glam::Vec3::new(v.x, v.y, v.z)
    }
}

/// Game messages exchanged between peers over their data links.
///
/// The `type` field discriminates the variant; field names are camelCase
/// so browser peers on the same room can read them unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum NetMessage {
    /// Full team map pushed by the host after every new assignment.
    InitTeam {
        assignments: BTreeMap<PeerId, TeamId>,
        host_team: TeamId,
    },
    /// Periodic transform broadcast.
    Move { pos: WireVec3, rot_y: f32 },
    /// A shot was fired; receivers spawn a visual bullet.
    Shoot { pos: WireVec3, dir: WireVec3 },
    /// Damage directed at `target_id`; only the target applies it.
    Hit { target_id: PeerId, damage: i32 },
    PlayerDead { dead_id: PeerId },
    RoundEnded { winner_team: TeamId },
    PlayerLeft { left_id: PeerId },
    /// Keep-alive; receivers ignore it.
    Heartbeat,
}

impl NetMessage {
    /// Wire discriminator, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InitTeam { .. } => "init-team",
            Self::Move { .. } => "move",
            Self::Shoot { .. } => "shoot",
            Self::Hit { .. } => "hit",
            Self::PlayerDead { .. } => "player-dead",
            Self::RoundEnded { .. } => "round-ended",
            Self::PlayerLeft { .. } => "player-left",
            Self::Heartbeat => "heartbeat",
        }
    }
}

/// A message plus the id of the peer that originated it.
///
/// `senderId` is stamped by the host when relaying so clients can tell
/// which remote player a `move` or `shoot` belongs to. Frames sent
/// directly leave it empty and the receiving link's peer is used instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    #[serde(
        rename = "senderId",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub sender_id: Option<PeerId>,
    #[serde(flatten)]
    pub message: NetMessage,
}

impl Frame {
    pub fn new(message: NetMessage) -> Self {
        Self {
            sender_id: None,
            message,
        }
    }

    /// Same frame attributed to `sender`, keeping an existing attribution.
    pub fn relayed_from(mut self, sender: &PeerId) -> Self {
        if self.sender_id.is_none() {
            self.sender_id = Some(sender.clone());
        }
        self
    }

    /// Originating peer: the stamped sender, else the link it arrived on.
    pub fn origin<'a>(&'a self, link_peer: &'a PeerId) -> &'a PeerId {
        self.sender_id.as_ref().unwrap_or(link_peer)
    }
}

impl From<NetMessage> for Frame {
    fn from(message: NetMessage) -> Self {
        Self::new(message)
    }
}
