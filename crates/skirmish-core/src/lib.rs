pub mod net;
pub mod player;
pub mod room;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers {
    use std::collections::BTreeMap;

    use crate::net::messages::{Frame, NetMessage, WireVec3};
    use crate::net::protocol::{decode_frame, encode_frame};
    use crate::player::{PeerId, TeamId};

    /// Shorthand for building a `PeerId` in tests.
    pub fn peer(id: &str) -> PeerId {
        PeerId::new(id)
    }

    /// Build an `init-team` message from `(peer, team)` pairs.
    pub fn init_team(pairs: &[(&str, u8)], host_team: u8) -> NetMessage {
        let assignments: BTreeMap<PeerId, TeamId> = pairs
            .iter()
            .map(|&(id, team)| (peer(id), TeamId(team)))
            .collect();
        NetMessage::InitTeam {
            assignments,
            host_team: TeamId(host_team),
        }
    }

    /// A `move` message at the given position.
    pub fn move_to(x: f32, y: f32, z: f32) -> NetMessage {
        NetMessage::Move {
            pos: WireVec3 { x, y, z },
            rot_y: 0.0,
        }
    }

    /// Encode then decode a frame, the way it would cross a real link.
    pub fn through_wire(frame: &Frame) -> Frame {
        let text = encode_frame(frame).expect("test frame must encode");
        decode_frame(&text).expect("test frame must decode")
    }
}
