use std::collections::BTreeMap;

use skirmish_core::net::messages::NetMessage;
use skirmish_core::player::{PeerId, TeamId};

/// Team for the connection at `index` in the host's connection list:
/// even indices join team 1, odd indices team 0. The host itself is
/// team 0, so the first client lands on the other side.
pub fn team_for_connection_index(index: usize) -> TeamId {
    if index % 2 == 0 { TeamId::B } else { TeamId::A }
}

/// Every peer's team, plus our own.
///
/// The host is authoritative: it assigns each new connection and pushes
/// the full map. Clients only copy what they receive.
#[derive(Debug, Clone)]
pub struct TeamRoster {
    assignments: BTreeMap<PeerId, TeamId>,
    local: TeamId,
}

impl Default for TeamRoster {
    fn default() -> Self {
        Self {
            assignments: BTreeMap::new(),
            local: TeamId::A,
        }
    }
}

impl TeamRoster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn local_team(&self) -> TeamId {
        self.local
    }

    pub fn team_of(&self, peer: &PeerId) -> Option<TeamId> {
        self.assignments.get(peer).copied()
    }

    /// Peers without an assignment count as enemies.
    pub fn is_enemy(&self, peer: &PeerId) -> bool {
        self.team_of(peer) != Some(self.local)
    }

    pub fn assignments(&self) -> &BTreeMap<PeerId, TeamId> {
        &self.assignments
    }

    /// Host side: record the host's own entry.
    pub fn claim_host(&mut self, host: &PeerId) {
        self.local = TeamId::A;
        self.assignments.insert(host.clone(), TeamId::A);
    }

    /// Host side: assign the connection at `index` and return its team.
    pub fn assign(&mut self, peer: &PeerId, index: usize) -> TeamId {
        let team = team_for_connection_index(index);
        self.assignments.insert(peer.clone(), team);
        team
    }

    /// The `init-team` message carrying the full current map.
    pub fn init_message(&self) -> NetMessage {
        NetMessage::InitTeam {
            assignments: self.assignments.clone(),
            host_team: TeamId::A,
        }
    }

    /// Client side: replace the map with the host's copy. `host` gets
    /// `host_team` if the map does not already name it. Our own team
    /// falls back to team 1 when we are missing from the map.
    pub fn apply_init(
        &mut self,
        assignments: &BTreeMap<PeerId, TeamId>,
        host_team: TeamId,
        host: &PeerId,
        me: &PeerId,
    ) -> TeamId {
        self.assignments = assignments.clone();
        self.assignments.entry(host.clone()).or_insert(host_team);
        self.local = self.assignments.get(me).copied().unwrap_or(TeamId::B);
        self.local
    }

    pub fn remove(&mut self, peer: &PeerId) -> Option<TeamId> {
        self.assignments.remove(peer)
    }

    pub fn clear(&mut self) {
        self.assignments.clear();
        self.local = TeamId::A;
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use skirmish_core::test_helpers::peer;

    use super::*;

    #[test]
    fn host_assigns_by_connection_parity() {
        let mut roster = TeamRoster::new();
        roster.claim_host(&peer("room"));
        assert_eq!(roster.assign(&peer("c1"), 0), TeamId::B);
        assert_eq!(roster.assign(&peer("c2"), 1), TeamId::A);
        assert_eq!(roster.assign(&peer("c3"), 2), TeamId::B);
        assert_eq!(roster.local_team(), TeamId::A);
        assert!(roster.is_enemy(&peer("c1")));
        assert!(!roster.is_enemy(&peer("c2")));
    }

    #[test]
    fn init_message_carries_full_map() {
        let mut roster = TeamRoster::new();
        roster.claim_host(&peer("room"));
        roster.assign(&peer("c1"), 0);
        match roster.init_message() {
            NetMessage::InitTeam {
                assignments,
                host_team,
            } => {
                assert_eq!(host_team, TeamId::A);
                assert_eq!(assignments.len(), 2);
                assert_eq!(assignments[&peer("c1")], TeamId::B);
            },
            other => panic!("Expected InitTeam, got {other:?}"),
        }
    }

    #[test]
    fn client_copies_map_and_finds_itself() {
        let mut host = TeamRoster::new();
        host.claim_host(&peer("room"));
        host.assign(&peer("c1"), 0);
        host.assign(&peer("c2"), 1);

        let NetMessage::InitTeam {
            assignments,
            host_team,
        } = host.init_message()
        else {
            panic!("Expected InitTeam");
        };

        let mut client = TeamRoster::new();
        let team = client.apply_init(&assignments, host_team, &peer("room"), &peer("c2"));
        assert_eq!(team, TeamId::A);
        assert_eq!(client.assignments(), host.assignments());
        assert!(!client.is_enemy(&peer("room")));
        assert!(client.is_enemy(&peer("c1")));
    }

    #[test]
    fn client_missing_from_map_falls_back_to_team_one() {
        let mut client = TeamRoster::new();
        let team = client.apply_init(&BTreeMap::new(), TeamId::A, &peer("room"), &peer("me"));
        assert_eq!(team, TeamId::B);
        assert_eq!(client.team_of(&peer("room")), Some(TeamId::A));
    }

    #[test]
    fn unknown_peer_is_enemy() {
        let roster = TeamRoster::new();
        assert!(roster.is_enemy(&peer("stranger")));
    }

    proptest! {
        #[test]
        fn assignment_follows_index_parity(index in 0usize..1000) {
            let team = team_for_connection_index(index);
            if index % 2 == 0 {
                prop_assert_eq!(team, TeamId::B);
            } else {
                prop_assert_eq!(team, TeamId::A);
            }
        }

        #[test]
        fn every_connection_gets_exactly_one_team(count in 1usize..12) {
            let mut roster = TeamRoster::new();
            roster.claim_host(&peer("room"));
            for i in 0..count {
                roster.assign(&peer(&format!("c{i}")), i);
            }
            prop_assert_eq!(roster.assignments().len(), count + 1);
            let team_a = roster.assignments().values().filter(|t| **t == TeamId::A).count();
            // Host plus odd indices.
            prop_assert_eq!(team_a, 1 + count / 2);
        }
    }
}
