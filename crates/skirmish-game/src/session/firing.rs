use rand::Rng;
use skirmish_core::net::messages::NetMessage;
use skirmish_core::player::TeamId;

use super::Session;
use crate::bots::BotHit;
use crate::combat::{Contact, Decal, HitScene, Projectile, Strike, Target};
use crate::entities::{DamageOutcome, FULL_HEALTH};
use crate::events::SessionEvent;
use crate::geometry::Ray;
use crate::input::InputFrame;
use crate::scheduler::{self, TimerAction};
use crate::transport::Transport;
use crate::weapon::{FireBlocked, WeaponKind, hit_damage};

impl Session {
    pub(super) fn apply_input(&mut self, input: &InputFrame, dt: f32, transport: &mut dyn Transport) {
        if !self.player.is_alive() {
            return;
        }

        if let Some(kind) = input.switch_to {
            self.player.inspect_remaining = 0.0;
            if self.player.loadout.switch(kind) {
                self.events.push(SessionEvent::WeaponSwitched(kind));
            }
        }
        if input.reload
            && let Some(kind) = self.player.loadout.begin_reload()
        {
            let at = self.now + scheduler::secs(self.config.reload_secs);
            self.timers.schedule(at, TimerAction::ReloadComplete(kind));
            self.events.push(SessionEvent::ReloadStarted(kind));
        }
        if input.inspect && !input.fire_held {
            self.player.inspect_remaining = self.config.inspect_secs;
        }

        let movement = &self.config.movement;
        self.player
            .apply_look(input.look_dx, input.look_dy, movement.look_sensitivity);
        self.player.step(input, dt, &self.arena, movement);

        let idle = scheduler::secs(self.config.recoil_reset_secs);
        self.player.loadout.settle_recoil(self.now, idle);

        let automatic = self.player.loadout.current().is_automatic();
        if input.fire_pressed || (automatic && input.fire_held) {
            self.pull_trigger(transport);
        }
    }

    fn pull_trigger(&mut self, transport: &mut dyn Transport) {
        match self.player.loadout.try_fire(self.now) {
            Err(FireBlocked::Reloading | FireBlocked::Empty) => {},
            Err(FireBlocked::Cooldown) => self.player.inspect_remaining = 0.0,
            Ok(kind) if kind.is_melee() => {
                self.player.inspect_remaining = 0.0;
                self.swing(transport);
            },
            Ok(kind) => {
                self.player.inspect_remaining = 0.0;
                self.fire(kind, transport);
            },
        }
    }

    fn fire(&mut self, weapon: WeaponKind, transport: &mut dyn Transport) {
        let airborne = !self.player.grounded;
        let spread = self.player.loadout.shot_spread(
            self.player.horizontal_speed(),
            self.player.crouching,
            airborne,
        );
        let aim = self.player.look_direction();
        let mut jitter = || (self.rng.random::<f32>() - 0.5) * spread.amount;
        let mut dir = aim;
        dir.x += jitter();
        dir.y += jitter() + spread.upward;
        dir.z += jitter();
        let dir = dir.normalize_or(aim);

        let origin = self.player.position;
        self.projectiles.push(Projectile::new(
            origin,
            dir,
            self.config.projectile_speed,
            weapon,
        ));
        self.events.push(SessionEvent::ShotFired {
            origin,
            dir,
            weapon,
        });
        if self.network_ready {
            let shot = NetMessage::Shoot {
                pos: origin.into(),
                dir: dir.into(),
            };
            self.send_outbound(shot, transport);
        }
    }

    /// Melee is an instant short ray. Walls stop it without leaving a mark.
    fn swing(&mut self, transport: &mut dyn Transport) {
        self.player.swinging = true;
        let at = self.now + scheduler::secs(self.config.melee_swing_secs);
        self.timers.schedule(at, TimerAction::MeleeSwingReset);
        self.events.push(SessionEvent::MeleeSwing);

        let Some(ray) = Ray::new(self.player.position, self.player.look_direction()) else {
            return;
        };
        let scene = HitScene {
            arena: &self.arena,
            bots: self.bots.active(),
            mirrors: &self.mirrors,
            teams: &self.teams,
            hitbox_half_extents: self.config.hitbox_half_extents,
        };
        if let Some(Contact {
            strike: Strike::Entity { target, .. },
            ..
        }) = scene.nearest(&ray, self.config.melee_range)
        {
            self.apply_hit(target, self.config.melee_damage, transport);
        }
    }

    /// Sweep local projectiles and resolve whatever they struck.
    pub(super) fn step_projectiles(&mut self, dt: f32, transport: &mut dyn Transport) {
        let mut contacts = Vec::new();
        let scene = HitScene {
            arena: &self.arena,
            bots: self.bots.active(),
            mirrors: &self.mirrors,
            teams: &self.teams,
            hitbox_half_extents: self.config.hitbox_half_extents,
        };
        let look_ahead = self.config.projectile_look_ahead;
        let max_travel = self.config.max_travel;
        self.projectiles.retain_mut(|p| {
            let Some((ray, length)) = p.sweep(dt, look_ahead) else {
                return false;
            };
            if let Some(contact) = scene.nearest(&ray, length) {
                contacts.push((p.weapon, contact));
                return false;
            }
            p.advance(dt);
            p.travelled() <= max_travel
        });

        for (weapon, contact) in contacts {
            match contact.strike {
                Strike::Wall { normal } => {
                    let decal = Decal {
                        point: contact.point,
                        normal,
                    };
                    self.decals.push(decal);
                    self.events.push(SessionEvent::WallImpact(decal));
                },
                Strike::Entity { target, relative_y } => {
                    let damage = hit_damage(weapon, relative_y, self.config.headshot_offset);
                    self.apply_hit(target, damage, transport);
                },
            }
        }
    }

    pub(super) fn apply_hit(&mut self, target: Target, damage: i32, transport: &mut dyn Transport) {
        match &target {
            Target::Bot(id) => {
                let id = *id;
                match self.bots.apply_damage(id, damage) {
                    None => return,
                    Some(BotHit::Wounded { .. }) => {},
                    Some(BotHit::Killed) => {
                        tracing::debug!(bot = id, "Bot killed");
                        self.events.push(SessionEvent::BotKilled(id));
                        let at = self.now + scheduler::secs(self.config.death_removal_secs);
                        self.timers.schedule(at, TimerAction::RemoveBotBody(id));
                    },
                }
            },
            Target::Mirror(peer) => {
                let hit = NetMessage::Hit {
                    target_id: peer.clone(),
                    damage,
                };
                self.send_outbound(hit, transport);
                if self.mirrors.apply_damage(peer, damage) == DamageOutcome::Killed {
                    tracing::debug!(peer = %peer, "Mirror killed");
                    let dead = NetMessage::PlayerDead {
                        dead_id: peer.clone(),
                    };
                    self.send_outbound(dead, transport);
                    self.events.push(SessionEvent::MirrorDied(peer.clone()));
                    let at = self.now + scheduler::secs(self.config.death_removal_secs);
                    self.timers.schedule(at, TimerAction::HideMirror(peer.clone()));
                }
            },
        }
        self.events.push(SessionEvent::HitConfirmed {
            target: target.clone(),
            damage,
        });
        match target {
            Target::Bot(_) => self.check_team_wipe(TeamId::B, transport),
            Target::Mirror(peer) => {
                if let Some(team) = self.teams.team_of(&peer) {
                    self.check_team_wipe(team, transport);
                }
            },
        }
    }

    /// Remote shots are cosmetic: they stop at walls and never deal damage.
    pub(super) fn step_remote_bullets(&mut self, dt: f32) {
        let look_ahead = self.config.projectile_look_ahead;
        let max_travel = self.config.max_travel;
        let arena = &self.arena;
        self.remote_bullets.retain_mut(|p| {
            let Some((ray, length)) = p.sweep(dt, look_ahead) else {
                return false;
            };
            if arena.raycast(&ray, length).is_some() {
                return false;
            }
            p.advance(dt);
            p.travelled() <= max_travel
        });
    }

    pub(super) fn step_bots(&mut self, dt: f32) {
        let shots = self.bots.think(
            self.now,
            dt,
            self.player.position,
            &self.arena,
            &self.config.bots,
            &mut self.rng,
        );
        self.bot_bullets
            .extend(shots.into_iter().map(|shot| Projectile {
                position: shot.origin,
                velocity: shot.velocity,
                origin: shot.origin,
                weapon: WeaponKind::Rifle,
            }));
    }

    pub(super) fn step_bot_bullets(&mut self, dt: f32, transport: &mut dyn Transport) {
        let look_ahead = self.config.projectile_look_ahead;
        let max_travel = self.config.max_travel;
        let hit_radius = self.config.bots.bullet_hit_radius;
        let target = self.player.position;
        let arena = &self.arena;
        let mut hits = 0;
        self.bot_bullets.retain_mut(|p| {
            let Some((ray, length)) = p.sweep(dt, look_ahead) else {
                return false;
            };
            if arena.raycast(&ray, length).is_some() {
                return false;
            }
            p.advance(dt);
            if p.position.distance(target) < hit_radius {
                hits += 1;
                return false;
            }
            p.travelled() <= max_travel
        });
        for _ in 0..hits {
            self.receive_damage(self.config.bots.bullet_damage, transport);
        }
    }

    /// Damage addressed to the local player.
    /// Apply a hit reported by a peer. Damage arrives off the wire, so
    /// non-positive amounts are dropped and the rest capped at full health.
    pub(super) fn receive_damage(&mut self, amount: i32, transport: &mut dyn Transport) {
        if !self.round.is_active() || amount <= 0 {
            return;
        }
        let amount = amount.min(FULL_HEALTH);
        let fatal = self.player.take_damage(amount);
        self.events.push(SessionEvent::DamageTaken {
            amount,
            health: self.player.health,
        });
        if fatal {
            self.on_local_death(transport);
        }
    }

    fn on_local_death(&mut self, transport: &mut dyn Transport) {
        tracing::info!("Local player died");
        self.events.push(SessionEvent::LocalDied);
        if let Some(me) = self.local_id.clone()
            && self.network_ready
        {
            self.send_outbound(NetMessage::PlayerDead { dead_id: me }, transport);
        }
        self.end_round(false, transport);
    }
}
