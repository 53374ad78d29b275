use skirmish_core::net::messages::NetMessage;
use skirmish_core::net::signal::SignalError;
use skirmish_core::player::{PeerId, Role};

use super::{Session, Stage};
use crate::events::SessionEvent;
use crate::scheduler::{self, TimerAction};
use crate::transport::{Transport, TransportEvent};

impl Session {
    pub(super) fn on_transport_event(&mut self, event: TransportEvent, transport: &mut dyn Transport) {
        match event {
            TransportEvent::Registered { id } => self.on_registered(id, transport),
            TransportEvent::SignalFailed { kind, peer } => self.on_signal_failed(kind, peer, transport),
            TransportEvent::Incoming { peer } => self.on_incoming(peer, transport),
            TransportEvent::Open { peer } => self.on_open(peer, transport),
            TransportEvent::Data { peer, frame } => self.on_frame(peer, frame, transport),
            TransportEvent::Closed { peer } => self.on_closed(peer, transport),
            TransportEvent::Disconnected => self.on_disconnected(transport),
        }
    }

    fn room(&self) -> Option<PeerId> {
        self.mode.and_then(|m| m.room_name()).map(PeerId::new)
    }

    fn on_registered(&mut self, id: PeerId, transport: &mut dyn Transport) {
        match self.stage {
            Stage::ClaimingRoom => {
                tracing::info!(id = %id, "Claimed room; hosting");
                self.stage = Stage::InRoom;
                self.role = Some(Role::Host);
                self.teams.claim_host(&id);
                self.local_id = Some(id.clone());
                self.events.push(SessionEvent::RoleDecided {
                    role: Role::Host,
                    id,
                });
                self.status("Waiting for players");
                self.report_player_count();
            },
            Stage::Joining => {
                let Some(room) = self.room() else {
                    return;
                };
                tracing::info!(id = %id, room = %room, "Joining room as client");
                self.stage = Stage::InRoom;
                self.role = Some(Role::Client);
                self.local_id = Some(id.clone());
                self.events.push(SessionEvent::RoleDecided {
                    role: Role::Client,
                    id,
                });
                self.status("Connecting to host");
                self.connect_to_host(&room, transport);
            },
            Stage::InRoom => {
                tracing::info!(id = %id, "Re-registered with signaling service");
                self.local_id = Some(id);
                self.status("Reconnected");
                if self.role == Some(Role::Client)
                    && self.links.is_empty()
                    && let Some(room) = self.room()
                {
                    self.connect_to_host(&room, transport);
                }
            },
            Stage::Lobby | Stage::Offline => {
                tracing::debug!(id = %id, "Ignoring registration outside a networked match");
            },
        }
    }

    fn connect_to_host(&mut self, room: &PeerId, transport: &mut dyn Transport) {
        self.links.add(room);
        if let Err(e) = transport.connect(room) {
            self.links.remove(room);
            self.status(format!("Could not reach host: {e}"));
        }
    }

    fn on_signal_failed(
        &mut self,
        kind: SignalError,
        peer: Option<PeerId>,
        transport: &mut dyn Transport,
    ) {
        if self.stage == Stage::ClaimingRoom && kind == SignalError::UnavailableId {
            tracing::info!("Room already hosted; registering anonymously");
            self.stage = Stage::Joining;
            if let Err(e) = transport.register(None) {
                self.status(format!("Signaling unavailable: {e}"));
            }
            return;
        }
        if let Some(peer) = &peer {
            self.links.remove(peer);
        }
        tracing::warn!(?kind, ?peer, "Signaling request failed");
        self.status(format!("Error: {kind}"));
    }

    fn on_incoming(&mut self, peer: PeerId, transport: &mut dyn Transport) {
        if self.role != Some(Role::Host) {
            tracing::debug!(peer = %peer, "Refusing link; only the host accepts connections");
            transport.close(&peer);
            return;
        }
        let required = self.required_players();
        if self.links.len() + 1 >= required {
            tracing::warn!(peer = %peer, required, "Room full; closing link");
            transport.close(&peer);
            return;
        }
        self.links.add(&peer);
        self.report_player_count();
        self.check_match_found();
    }

    fn on_open(&mut self, peer: PeerId, transport: &mut dyn Transport) {
        let Some(index) = self.links.mark_open(&peer) else {
            tracing::debug!(peer = %peer, "Open for an untracked link");
            return;
        };
        tracing::info!(peer = %peer, "Link open");
        self.network_ready = true;
        self.bots.clear();
        self.events.push(SessionEvent::PeerJoined(peer.clone()));
        self.status("Connected");

        if self.role == Some(Role::Host) {
            let team = self.teams.assign(&peer, index);
            tracing::info!(peer = %peer, team = %team, "Assigned team");
            let init = self.teams.init_message();
            self.send_outbound(init, transport);
            self.check_match_found();
        }
    }

    fn on_closed(&mut self, peer: PeerId, transport: &mut dyn Transport) {
        if !self.links.remove(&peer) {
            return;
        }
        tracing::info!(peer = %peer, "Link closed");
        self.network_ready = !self.links.is_empty();

        if self.role == Some(Role::Client) && !self.teams_received {
            self.status("Room full");
            self.events.push(SessionEvent::RoomFull);
        }
        self.forget_peer(&peer, transport);
        if self.role == Some(Role::Host) {
            let left = NetMessage::PlayerLeft {
                left_id: peer.clone(),
            };
            self.send_outbound(left, transport);
            self.report_player_count();
        }
    }

    /// Drop a departed peer's mirror and team entry. If that empties a
    /// side mid-round, the round resolves.
    pub(super) fn forget_peer(&mut self, peer: &PeerId, transport: &mut dyn Transport) {
        let had_mirror = self.mirrors.remove(peer).is_some();
        let team = self.teams.remove(peer);
        if had_mirror || team.is_some() {
            self.events.push(SessionEvent::PeerLeft(peer.clone()));
        }
        if let Some(team) = team {
            self.check_team_wipe(team, transport);
        }
    }

    fn on_disconnected(&mut self, transport: &mut dyn Transport) {
        tracing::warn!(id = ?self.local_id, "Lost signaling connection");
        self.status("Reconnecting to signaling service");
        let peers: Vec<PeerId> = self.links.peers().cloned().collect();
        self.links.clear();
        self.network_ready = false;
        for peer in &peers {
            self.forget_peer(peer, transport);
        }
        let Some(id) = self.local_id.clone() else {
            return;
        };
        if let Err(e) = transport.register(Some(&id)) {
            self.status(format!("Signaling unavailable: {e}"));
        }
    }

    fn report_player_count(&mut self) {
        self.events.push(SessionEvent::PlayerCount {
            current: self.links.len() + 1,
            required: self.required_players(),
        });
    }

    /// Host side: schedule the first round once the room is full.
    fn check_match_found(&mut self) {
        if self.links.len() + 1 >= self.required_players() {
            self.schedule_match_start();
        }
    }

    pub(super) fn schedule_match_start(&mut self) {
        if self.round.has_started() || self.timers.contains(|a| *a == TimerAction::MatchStart) {
            return;
        }
        tracing::info!("Match found");
        self.events.push(SessionEvent::MatchFound);
        self.status("Match found");
        let at = self.now + scheduler::secs(self.config.match_found_delay_secs);
        self.timers.schedule(at, TimerAction::MatchStart);
    }
}
