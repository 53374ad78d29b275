use std::collections::BTreeMap;

use glam::Vec3;
use skirmish_core::net::messages::{Frame, NetMessage};
use skirmish_core::player::{PeerId, Role, TeamId};

use super::Session;
use crate::combat::Projectile;
use crate::entities::MoveOutcome;
use crate::events::SessionEvent;
use crate::scheduler::{self, TimerAction};
use crate::transport::Transport;
use crate::weapon::WeaponKind;

impl Session {
    /// Handle one frame from a data link, then relay it if we host.
    pub(super) fn on_frame(&mut self, link: PeerId, frame: Frame, transport: &mut dyn Transport) {
        if !self.links.is_open(&link) {
            tracing::debug!(peer = %link, "Dropping frame from unknown link");
            return;
        }
        if matches!(frame.message, NetMessage::Heartbeat) {
            return;
        }
        let origin = frame.origin(&link).clone();
        tracing::trace!(from = %origin, kind = frame.message.kind(), "Received");
        self.handle_message(&origin, &frame.message, transport);

        if self.role == Some(Role::Host) {
            let targets = self.links.relay_targets(&[&link, &origin]);
            let relayed = frame.relayed_from(&link);
            for peer in &targets {
                if let Err(e) = transport.send(peer, &relayed) {
                    tracing::warn!(peer = %peer, "Relay failed: {e}");
                }
            }
        }
    }

    fn handle_message(&mut self, from: &PeerId, message: &NetMessage, transport: &mut dyn Transport) {
        match message {
            NetMessage::InitTeam {
                assignments,
                host_team,
            } => self.on_init_team(from, assignments, *host_team),
            NetMessage::Move { pos, rot_y } => {
                if self.local_id.as_ref() == Some(from) {
                    return;
                }
                if self.mirrors.observe_move(from, (*pos).into(), *rot_y) == MoveOutcome::Created {
                    tracing::debug!(peer = %from, "Spawned mirror");
                    self.events.push(SessionEvent::MirrorSpawned(from.clone()));
                }
            },
            NetMessage::Shoot { pos, dir } => {
                let origin = Vec3::from(*pos);
                let dir = Vec3::from(*dir).normalize_or(Vec3::Z);
                self.remote_bullets.push(Projectile::new(
                    origin,
                    dir,
                    self.config.projectile_speed,
                    WeaponKind::Rifle,
                ));
                self.events.push(SessionEvent::RemoteShot {
                    peer: from.clone(),
                    origin,
                    dir,
                });
            },
            NetMessage::Hit { target_id, damage } => {
                if self.local_id.as_ref() == Some(target_id) {
                    self.receive_damage(*damage, transport);
                }
            },
            NetMessage::PlayerDead { dead_id } => self.on_remote_death(dead_id, transport),
            NetMessage::RoundEnded { winner_team } => {
                let won = *winner_team == self.teams.local_team();
                self.resolve_round(won);
            },
            NetMessage::PlayerLeft { left_id } => {
                if self.local_id.as_ref() != Some(left_id) {
                    self.forget_peer(left_id, transport);
                }
            },
            NetMessage::Heartbeat => {},
        }
    }

    fn on_init_team(
        &mut self,
        from: &PeerId,
        assignments: &BTreeMap<PeerId, TeamId>,
        host_team: TeamId,
    ) {
        if self.role != Some(Role::Client) {
            return;
        }
        let Some(me) = self.local_id.clone() else {
            return;
        };
        let team = self.teams.apply_init(assignments, host_team, from, &me);
        self.teams_received = true;
        tracing::info!(team = %team, players = self.teams.assignments().len(), "Team assigned");
        self.events.push(SessionEvent::TeamAssigned(team));
        self.events.push(SessionEvent::PlayerCount {
            current: self.teams.assignments().len(),
            required: self.required_players(),
        });
        if self.teams.assignments().len() >= self.required_players() {
            self.schedule_match_start();
        }
    }

    /// A peer reported its own death, or a killer reported it for them.
    fn on_remote_death(&mut self, dead_id: &PeerId, transport: &mut dyn Transport) {
        if !self.mirrors.mark_dead(dead_id) {
            return;
        }
        tracing::debug!(peer = %dead_id, "Mirror died");
        self.events.push(SessionEvent::MirrorDied(dead_id.clone()));
        let at = self.now + scheduler::secs(self.config.death_removal_secs);
        self.timers.schedule(at, TimerAction::HideMirror(dead_id.clone()));
        if let Some(team) = self.teams.team_of(dead_id) {
            self.check_team_wipe(team, transport);
        }
    }
}
