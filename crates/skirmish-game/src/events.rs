use glam::Vec3;
use serde::Serialize;
use skirmish_core::player::{PeerId, Role, TeamId};

use crate::combat::{Decal, Target};
use crate::round::Tally;
use crate::weapon::WeaponKind;

/// Everything a front end might want to show or play, reported by a
/// session tick in the order it happened.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum SessionEvent {
    /// Human-readable connection status line.
    Status(String),
    RoleDecided {
        role: Role,
        id: PeerId,
    },
    /// Players in the room, counting ourselves.
    PlayerCount {
        current: usize,
        required: usize,
    },
    /// The room is full; the first round starts after a short delay.
    MatchFound,
    /// The host turned us away.
    RoomFull,
    PeerJoined(PeerId),
    PeerLeft(PeerId),
    TeamAssigned(TeamId),

    MirrorSpawned(PeerId),
    MirrorDied(PeerId),
    MirrorHidden(PeerId),
    BotKilled(u32),
    BotRemoved(u32),

    ShotFired {
        origin: Vec3,
        dir: Vec3,
        weapon: WeaponKind,
    },
    RemoteShot {
        peer: PeerId,
        origin: Vec3,
        dir: Vec3,
    },
    MeleeSwing,
    /// A local shot struck a wall and left a mark.
    WallImpact(Decal),
    HitConfirmed {
        target: Target,
        damage: i32,
    },
    DamageTaken {
        amount: i32,
        health: i32,
    },
    LocalDied,
    WeaponSwitched(WeaponKind),
    ReloadStarted(WeaponKind),
    ReloadFinished(WeaponKind),

    RoundStarted {
        round: u32,
        tally: Tally,
    },
    RoundEnded {
        won: bool,
        tally: Tally,
    },
    GameOver {
        won: bool,
        tally: Tally,
    },
}
