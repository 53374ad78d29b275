use skirmish_core::net::messages::NetMessage;
use skirmish_core::player::TeamId;

use super::Session;
use crate::events::SessionEvent;
use crate::round::{Followup, RoundStart};
use crate::scheduler::{self, TimerAction};
use crate::transport::Transport;

impl Session {
    /// Resolve the round if `team` has nobody left standing.
    pub(super) fn check_team_wipe(&mut self, team: TeamId, transport: &mut dyn Transport) {
        if !self.round.is_active() || !self.wipe_view().is_wiped(team) {
            return;
        }
        let won = team != self.teams.local_team();
        tracing::debug!(team = %team, won, "Team wiped");
        self.end_round(won, transport);
    }

    /// Resolve a round decided on this peer and announce the winning team.
    /// A client's announcement reaches the other clients through the host.
    pub(super) fn end_round(&mut self, won: bool, transport: &mut dyn Transport) {
        if !self.resolve_round(won) || !self.network_ready {
            return;
        }
        let local = self.teams.local_team();
        let winner_team = if won { local } else { local.opponent() };
        self.send_outbound(NetMessage::RoundEnded { winner_team }, transport);
    }

    /// Count the round once. Returns false if it was already resolved.
    pub(super) fn resolve_round(&mut self, won: bool) -> bool {
        let Some(followup) = self.round.resolve(won) else {
            return false;
        };
        let tally = self.round.tally();
        tracing::info!(won, own = tally.own, opponent = tally.opponent, "Round ended");
        self.events.push(SessionEvent::RoundEnded { won, tally });

        let (delay, action) = match followup {
            Followup::NextRound => (self.config.intermission_secs, TimerAction::NextRound),
            Followup::GameOver { won } => (self.config.game_over_delay_secs, TimerAction::GameOver { won }),
        };
        self.timers.schedule(self.now + scheduler::secs(delay), action);
        true
    }

    /// Set up a fresh round, or end the match if a side already won.
    pub(super) fn begin_round(&mut self) {
        match self.round.begin() {
            RoundStart::MatchOver { won } => self.finish_match(won),
            RoundStart::Started { round } => {
                let spawn = self.config.spawn_for(self.teams.local_team());
                self.player.respawn(spawn);
                self.projectiles.clear();
                self.bot_bullets.clear();
                self.remote_bullets.clear();
                self.decals.clear();
                self.bots.clear();
                self.mirrors.revive_all();
                if !self.network_ready {
                    let count = self.config.bots.count;
                    self.bots.spawn(count, &self.config.bots, &mut self.rng);
                }
                let tally = self.round.tally();
                tracing::info!(round, own = tally.own, opponent = tally.opponent, "Round started");
                self.events.push(SessionEvent::RoundStarted { round, tally });
            },
        }
    }

    fn finish_match(&mut self, won: bool) {
        self.round.finish(won);
        let tally = self.round.tally();
        tracing::info!(won, own = tally.own, opponent = tally.opponent, "Game over");
        self.status(if won { "Victory" } else { "Defeat" });
        self.events.push(SessionEvent::GameOver { won, tally });
    }

    pub(super) fn on_timer(&mut self, action: TimerAction) {
        match action {
            TimerAction::MatchStart => {
                if !self.round.has_started() {
                    self.begin_round();
                }
            },
            TimerAction::NextRound => {
                if !self.round.is_active() && !self.round.is_game_over() {
                    self.begin_round();
                }
            },
            TimerAction::GameOver { won } => {
                if !self.round.is_game_over() {
                    self.finish_match(won);
                }
            },
            TimerAction::ReloadComplete(kind) => {
                self.player.loadout.finish_reload(kind);
                self.events.push(SessionEvent::ReloadFinished(kind));
            },
            TimerAction::MeleeSwingReset => self.player.swinging = false,
            TimerAction::HideMirror(peer) => {
                if self.mirrors.hide(&peer) {
                    self.events.push(SessionEvent::MirrorHidden(peer));
                }
            },
            TimerAction::RemoveBotBody(id) => {
                if self.bots.remove_body(id) {
                    self.events.push(SessionEvent::BotRemoved(id));
                }
            },
        }
    }
}
