//! One peer's view of a match.
//!
//! A [`Session`] owns everything a peer simulates: the local player, the
//! mirrors of remote players, bots, projectiles, the team map, and the
//! round tally. It is driven from outside by [`Session::tick`], which
//! drains the transport, fires due timers, applies one frame of input,
//! and returns what happened as [`SessionEvent`]s.
//!
//! Room bootstrap follows a claim-or-join rule: try to register the
//! room's name; whoever gets it hosts, everyone else registers
//! anonymously and opens a link to the host. The host relays every
//! client message to the other clients.

mod bootstrap;
mod dispatch;
mod firing;
mod rounds;

use std::time::Duration;

use rand::SeedableRng;
use rand::rngs::StdRng;
use skirmish_core::net::messages::{Frame, NetMessage};
use skirmish_core::player::{PeerId, Role, TeamId};
use skirmish_core::room::MatchMode;

use crate::arena::Arena;
use crate::bots::BotRoster;
use crate::combat::{DecalRing, Projectile, WipeView};
use crate::config::GameConfig;
use crate::entities::EntityRegistry;
use crate::events::SessionEvent;
use crate::input::InputFrame;
use crate::player::LocalPlayer;
use crate::round::{RoundPhase, RoundState, Tally};
use crate::scheduler::{self, Scheduler};
use crate::sync::{LinkTable, SyncClock};
use crate::teams::TeamRoster;
use crate::transport::Transport;

/// How far room bootstrap got.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Not in a match.
    Lobby,
    /// Offline match against bots.
    Offline,
    /// Trying to register the room name.
    ClaimingRoom,
    /// Room name taken; registering under an anonymous id.
    Joining,
    /// Registered; hosting or linked to the host.
    InRoom,
}

pub struct Session {
    config: GameConfig,
    arena: Arena,
    rng: StdRng,
    now: Duration,

    stage: Stage,
    mode: Option<MatchMode>,
    role: Option<Role>,
    local_id: Option<PeerId>,
    links: LinkTable,
    network_ready: bool,
    /// A client has received at least one `init-team` from its host.
    teams_received: bool,
    teams: TeamRoster,
    sync_clock: SyncClock,

    player: LocalPlayer,
    mirrors: EntityRegistry,
    bots: BotRoster,
    projectiles: Vec<Projectile>,
    bot_bullets: Vec<Projectile>,
    remote_bullets: Vec<Projectile>,
    decals: DecalRing,

    round: RoundState,
    timers: Scheduler,
    events: Vec<SessionEvent>,
}

impl Session {
    pub fn new(config: GameConfig, arena: Arena) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self {
            player: LocalPlayer::new(config.spawn_for(TeamId::A)),
            mirrors: EntityRegistry::new(config.mirror_default_position),
            decals: DecalRing::new(config.max_decals),
            round: RoundState::new(config.win_threshold),
            sync_clock: SyncClock::new(config.sync_rate_hz),
            rng,
            arena,
            now: Duration::ZERO,
            stage: Stage::Lobby,
            mode: None,
            role: None,
            local_id: None,
            links: LinkTable::new(),
            network_ready: false,
            teams_received: false,
            teams: TeamRoster::new(),
            bots: BotRoster::new(),
            projectiles: Vec::new(),
            bot_bullets: Vec::new(),
            remote_bullets: Vec::new(),
            timers: Scheduler::new(),
            events: Vec::new(),
            config,
        }
    }

    /// Enter `mode`. Offline play starts a round at once; networked modes
    /// begin by trying to claim the room name.
    pub fn start(&mut self, mode: MatchMode, transport: &mut dyn Transport) -> Vec<SessionEvent> {
        self.mode = Some(mode);
        match mode.room_name() {
            None => {
                self.stage = Stage::Offline;
                tracing::info!("Starting offline match against bots");
                self.begin_round();
            },
            Some(room) => {
                self.stage = Stage::ClaimingRoom;
                self.status(format!("Looking for a {mode} match"));
                tracing::info!(room = %room, "Claiming room");
                if let Err(e) = transport.register(Some(&PeerId::new(room))) {
                    self.status(format!("Signaling unavailable: {e}"));
                }
            },
        }
        std::mem::take(&mut self.events)
    }

    /// Advance the session by `dt` seconds.
    pub fn tick(
        &mut self,
        dt: f32,
        input: &InputFrame,
        transport: &mut dyn Transport,
    ) -> Vec<SessionEvent> {
        self.now += scheduler::secs(dt);

        for event in transport.poll() {
            self.on_transport_event(event, transport);
        }
        for action in self.timers.pop_due(self.now) {
            self.on_timer(action);
        }
        if self.round.is_game_over() {
            return std::mem::take(&mut self.events);
        }

        if self.network_ready && self.sync_clock.due(self.now) {
            let message = NetMessage::Move {
                pos: self.player.position.into(),
                rot_y: self.player.yaw,
            };
            self.send_outbound(message, transport);
        }

        self.apply_input(input, dt, transport);
        self.step_projectiles(dt, transport);
        self.step_remote_bullets(dt);
        if self.round.is_active() {
            self.step_bots(dt);
            self.step_bot_bullets(dt, transport);
        }
        self.bots.advance_death_animations(dt);
        self.mirrors.advance_death_animations(dt);
        self.player.inspect_remaining = (self.player.inspect_remaining - dt).max(0.0);

        std::mem::take(&mut self.events)
    }

    /// Tear the session down: close every link, release our name, cancel
    /// pending timers, and reset to a fresh lobby state.
    pub fn leave(&mut self, transport: &mut dyn Transport) {
        tracing::info!(id = ?self.local_id, "Leaving match");
        transport.shutdown();
        self.timers.clear();
        self.links.clear();
        self.teams.clear();
        self.mirrors.clear();
        self.bots.clear();
        self.projectiles.clear();
        self.bot_bullets.clear();
        self.remote_bullets.clear();
        self.decals.clear();
        self.round.reset();
        self.sync_clock.reset();
        self.player.respawn(self.config.spawn_for(TeamId::A));
        self.stage = Stage::Lobby;
        self.mode = None;
        self.role = None;
        self.local_id = None;
        self.network_ready = false;
        self.teams_received = false;
        self.events.clear();
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn arena(&self) -> &Arena {
        &self.arena
    }

    /// Session clock, advanced only by ticks.
    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn mode(&self) -> Option<MatchMode> {
        self.mode
    }

    pub fn role(&self) -> Option<Role> {
        self.role
    }

    pub fn local_id(&self) -> Option<&PeerId> {
        self.local_id.as_ref()
    }

    pub fn links(&self) -> &LinkTable {
        &self.links
    }

    /// At least one data link is open.
    pub fn is_network_ready(&self) -> bool {
        self.network_ready
    }

    pub fn teams(&self) -> &TeamRoster {
        &self.teams
    }

    pub fn local_team(&self) -> TeamId {
        self.teams.local_team()
    }

    pub fn player(&self) -> &LocalPlayer {
        &self.player
    }

    pub fn mirrors(&self) -> &EntityRegistry {
        &self.mirrors
    }

    pub fn bots(&self) -> &BotRoster {
        &self.bots
    }

    pub fn projectiles(&self) -> &[Projectile] {
        &self.projectiles
    }

    pub fn bot_bullets(&self) -> &[Projectile] {
        &self.bot_bullets
    }

    pub fn remote_bullets(&self) -> &[Projectile] {
        &self.remote_bullets
    }

    pub fn decals(&self) -> &DecalRing {
        &self.decals
    }

    pub fn round_phase(&self) -> RoundPhase {
        self.round.phase()
    }

    pub fn round_number(&self) -> u32 {
        self.round.round()
    }

    pub fn tally(&self) -> Tally {
        self.round.tally()
    }

    pub fn is_game_over(&self) -> bool {
        self.round.is_game_over()
    }

    /// Timers still waiting to fire.
    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    fn status(&mut self, text: impl Into<String>) {
        self.events.push(SessionEvent::Status(text.into()));
    }

    fn required_players(&self) -> usize {
        self.mode.map_or(1, MatchMode::required_players)
    }

    fn wipe_view(&self) -> WipeView<'_> {
        WipeView {
            local_team: self.teams.local_team(),
            local_alive: self.player.is_alive(),
            teams: &self.teams,
            mirrors: &self.mirrors,
            bots: self.bots.active(),
        }
    }

    /// Send a locally originated message: a host broadcasts to every open
    /// link, a client sends to its host.
    fn send_outbound(&mut self, message: NetMessage, transport: &mut dyn Transport) {
        let targets = match self.role {
            Some(Role::Host) => self.links.broadcast_targets(),
            Some(Role::Client) => self.links.first_open().cloned().into_iter().collect(),
            None => return,
        };
        let frame = Frame::new(message);
        for peer in &targets {
            if let Err(e) = transport.send(peer, &frame) {
                tracing::warn!(peer = %peer, kind = frame.message.kind(), "Send failed: {e}");
            }
        }
    }
}
