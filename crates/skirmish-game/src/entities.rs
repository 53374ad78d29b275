use std::collections::BTreeMap;
use std::f32::consts::FRAC_PI_2;

use glam::Vec3;
use serde::Serialize;

use skirmish_core::player::PeerId;

/// Rate the death topple advances, radians per second.
pub const DEATH_ROTATE_SPEED: f32 = 5.0;
/// A toppling body sinks this fast until it rests at `DEATH_REST_HEIGHT`.
pub const DEATH_SINK_SPEED: f32 = 5.0;
pub const DEATH_REST_HEIGHT: f32 = 1.0;

pub const FULL_HEALTH: i32 = 100;

/// Health left after a hit. Non-positive damage is ignored and the
/// result never drops below zero.
pub fn drain_health(health: i32, damage: i32) -> i32 {
    health.saturating_sub(damage.max(0)).max(0)
}

/// Topple animation shared by dead mirrors and dead bots.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct DeathPose {
    /// Radians toppled so far, capped at a quarter turn.
    pub rotation: f32,
}

impl DeathPose {
    pub fn is_settled(&self) -> bool {
        self.rotation >= FRAC_PI_2
    }

    /// Advance the topple by `dt`, sinking `position` toward the floor.
    pub fn advance(&mut self, dt: f32, position: &mut Vec3) {
        if self.is_settled() {
            return;
        }
        self.rotation = (self.rotation + DEATH_ROTATE_SPEED * dt).min(FRAC_PI_2);
        position.y = (position.y - DEATH_SINK_SPEED * dt).max(DEATH_REST_HEIGHT);
    }
}

/// Local copy of a remote player.
///
/// Health here is advisory: only the owning peer's own count is
/// authoritative.
#[derive(Debug, Clone, Serialize)]
pub struct Mirror {
    pub id: PeerId,
    pub position: Vec3,
    pub yaw: f32,
    pub health: i32,
    pub dead: bool,
    pub death: DeathPose,
    /// False once a dead body has been cleared from the scene.
    pub visible: bool,
}

impl Mirror {
    fn new(id: PeerId, position: Vec3) -> Self {
        Self {
            id,
            position,
            yaw: 0.0,
            health: FULL_HEALTH,
            dead: false,
            death: DeathPose::default(),
            visible: true,
        }
    }

    /// Alive, shown, and able to be hit.
    pub fn is_targetable(&self) -> bool {
        !self.dead && self.visible
    }
}

/// Result of feeding a `move` to the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    /// First sighting; the mirror was created and this position dropped.
    Created,
    Updated,
}

/// Outcome of applying damage to a mirror's advisory health.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DamageOutcome {
    Unknown,
    AlreadyDead,
    Wounded { health: i32 },
    Killed,
}

/// Mirrors of every remote player, keyed by peer id.
#[derive(Debug, Clone, Default)]
pub struct EntityRegistry {
    mirrors: BTreeMap<PeerId, Mirror>,
    spawn_position: Vec3,
}

impl EntityRegistry {
    /// `spawn_position` is where a mirror waits until its second update.
    pub fn new(spawn_position: Vec3) -> Self {
        Self {
            mirrors: BTreeMap::new(),
            spawn_position,
        }
    }

    /// Apply a position update. An unknown sender gets a mirror at the
    /// default position and this update is not applied.
    pub fn observe_move(&mut self, id: &PeerId, position: Vec3, yaw: f32) -> MoveOutcome {
        match self.mirrors.get_mut(id) {
            Some(mirror) => {
                if !mirror.dead {
                    mirror.position = position;
                }
                mirror.yaw = yaw;
                MoveOutcome::Updated
            },
            None => {
                self.mirrors
                    .insert(id.clone(), Mirror::new(id.clone(), self.spawn_position));
                MoveOutcome::Created
            },
        }
    }

    pub fn get(&self, id: &PeerId) -> Option<&Mirror> {
        self.mirrors.get(id)
    }

    pub fn contains(&self, id: &PeerId) -> bool {
        self.mirrors.contains_key(id)
    }

    pub fn remove(&mut self, id: &PeerId) -> Option<Mirror> {
        self.mirrors.remove(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Mirror> {
        self.mirrors.values()
    }

    pub fn len(&self) -> usize {
        self.mirrors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mirrors.is_empty()
    }

    /// Decrement advisory health. Reaching zero marks the mirror dead.
    pub fn apply_damage(&mut self, id: &PeerId, damage: i32) -> DamageOutcome {
        let Some(mirror) = self.mirrors.get_mut(id) else {
            return DamageOutcome::Unknown;
        };
        if mirror.dead {
            return DamageOutcome::AlreadyDead;
        }
        mirror.health = drain_health(mirror.health, damage);
        if mirror.health <= 0 {
            mirror.dead = true;
            DamageOutcome::Killed
        } else {
            DamageOutcome::Wounded {
                health: mirror.health,
            }
        }
    }

    /// Mark a mirror dead. Returns true only on the alive → dead edge;
    /// unknown ids are ignored.
    pub fn mark_dead(&mut self, id: &PeerId) -> bool {
        match self.mirrors.get_mut(id) {
            Some(mirror) if !mirror.dead => {
                mirror.dead = true;
                mirror.health = mirror.health.min(0);
                true
            },
            _ => false,
        }
    }

    /// Clear a dead body from the scene. Live mirrors are left alone.
    pub fn hide(&mut self, id: &PeerId) -> bool {
        match self.mirrors.get_mut(id) {
            Some(mirror) if mirror.dead && mirror.visible => {
                mirror.visible = false;
                true
            },
            _ => false,
        }
    }

    /// Every mirror back to full health for a new round.
    pub fn revive_all(&mut self) {
        for mirror in self.mirrors.values_mut() {
            mirror.health = FULL_HEALTH;
            mirror.dead = false;
            mirror.death = DeathPose::default();
            mirror.visible = true;
        }
    }

    pub fn advance_death_animations(&mut self, dt: f32) {
        for mirror in self.mirrors.values_mut().filter(|m| m.dead) {
            mirror.death.advance(dt, &mut mirror.position);
        }
    }

    pub fn clear(&mut self) {
        self.mirrors.clear();
    }
}
