use std::f32::consts::FRAC_PI_2;

use glam::Vec3;
use serde::Serialize;

use crate::arena::Arena;
use crate::config::{MovementConfig, SpawnPoint};
use crate::entities::{FULL_HEALTH, drain_health};
use crate::geometry::Aabb;
use crate::input::InputFrame;
use crate::weapon::Loadout;

/// Body parts this far below the feet are allowed to clip into a ledge,
/// so walking along a box top does not count as a collision.
const STEP_TOLERANCE: f32 = 1.0;
/// Landing snaps onto a box whose top is within this of the feet.
const LANDING_TOLERANCE: f32 = 1.0;

const PITCH_LIMIT: f32 = FRAC_PI_2 - 0.01;

/// The player this peer controls.
#[derive(Debug, Clone, Serialize)]
pub struct LocalPlayer {
    /// Eye position.
    pub position: Vec3,
    pub yaw: f32,
    pub pitch: f32,
    /// Local-frame velocity: `x` strafe (right positive), `z` forward,
    /// `y` vertical.
    pub velocity: Vec3,
    pub crouching: bool,
    pub grounded: bool,
    pub health: i32,
    #[serde(skip)]
    pub loadout: Loadout,
    /// Seconds left on the weapon inspect animation.
    pub inspect_remaining: f32,
    /// A melee swing is playing.
    pub swinging: bool,
}

impl LocalPlayer {
    pub fn new(spawn: SpawnPoint) -> Self {
        Self {
            position: spawn.position,
            yaw: spawn.yaw,
            pitch: 0.0,
            velocity: Vec3::ZERO,
            crouching: false,
            grounded: false,
            health: FULL_HEALTH,
            loadout: Loadout::default(),
            inspect_remaining: 0.0,
            swinging: false,
        }
    }

    /// Full reset for a new round at `spawn`.
    pub fn respawn(&mut self, spawn: SpawnPoint) {
        *self = Self::new(spawn);
    }

    pub fn is_alive(&self) -> bool {
        self.health > 0
    }

    /// Horizontal facing. Yaw zero looks down +Z.
    pub fn forward(&self) -> Vec3 {
        Vec3::new(self.yaw.sin(), 0.0, self.yaw.cos())
    }

    pub fn right(&self) -> Vec3 {
        let f = self.forward();
        Vec3::new(f.z, 0.0, -f.x)
    }

    /// Where the player is aiming, including pitch.
    pub fn look_direction(&self) -> Vec3 {
        let (sin_p, cos_p) = self.pitch.sin_cos();
        Vec3::new(self.yaw.sin() * cos_p, sin_p, self.yaw.cos() * cos_p)
    }

    pub fn horizontal_speed(&self) -> f32 {
        self.velocity.x.hypot(self.velocity.z)
    }

    pub fn apply_look(&mut self, dx: f32, dy: f32, sensitivity: f32) {
        self.yaw -= dx * sensitivity;
        self.pitch = (self.pitch - dy * sensitivity).clamp(-PITCH_LIMIT, PITCH_LIMIT);
    }

    /// Subtract `amount` from health. Returns true if this hit was fatal.
    pub fn take_damage(&mut self, amount: i32) -> bool {
        if !self.is_alive() {
            return false;
        }
        self.health = drain_health(self.health, amount);
        !self.is_alive()
    }

    fn eye_height(&self, config: &MovementConfig) -> f32 {
        if self.crouching {
            config.crouch_height
        } else {
            config.stand_height
        }
    }

    fn body(&self, eye: Vec3, config: &MovementConfig) -> Aabb {
        let feet = eye.y - self.eye_height(config);
        Aabb::new(
            Vec3::new(eye.x - config.radius, feet + STEP_TOLERANCE, eye.z - config.radius),
            Vec3::new(eye.x + config.radius, eye.y + 0.5, eye.z + config.radius),
        )
    }

    /// Advance walking, jumping, crouching, and gravity by `dt`.
    pub fn step(&mut self, input: &InputFrame, dt: f32, arena: &Arena, config: &MovementConfig) {
        self.crouching = input.crouch;

        self.velocity.x -= self.velocity.x * config.damping * dt;
        self.velocity.z -= self.velocity.z * config.damping * dt;
        self.velocity.y -= config.gravity * dt;

        let intent = Vec3::new(
            f32::from(u8::from(input.right)) - f32::from(u8::from(input.left)),
            0.0,
            f32::from(u8::from(input.forward)) - f32::from(u8::from(input.backward)),
        )
        .normalize_or_zero();
        let accel = if self.crouching {
            config.crouch_accel
        } else {
            config.accel
        };
        self.velocity.x += intent.x * accel * dt;
        self.velocity.z += intent.z * accel * dt;

        if input.jump && self.grounded {
            self.velocity.y += config.jump_velocity;
            self.grounded = false;
        }

        let before = self.position;
        let displacement = (self.forward() * self.velocity.z + self.right() * self.velocity.x) * dt;
        let moved = before + displacement;
        if arena.collides(&self.body(moved, config)).is_none() {
            self.position.x = moved.x;
            self.position.z = moved.z;
        } else {
            self.velocity.x = 0.0;
            self.velocity.z = 0.0;
        }

        self.fall(before.y, dt, arena, config);
    }

    fn fall(&mut self, y_before: f32, dt: f32, arena: &Arena, config: &MovementConfig) {
        let height = self.eye_height(config);
        self.position.y += self.velocity.y * dt;
        self.grounded = false;

        let footprint = Aabb::new(
            Vec3::new(
                self.position.x - config.radius,
                f32::MIN,
                self.position.z - config.radius,
            ),
            Vec3::new(
                self.position.x + config.radius,
                f32::MAX,
                self.position.z + config.radius,
            ),
        );

        for wall in arena.walls.iter().filter(|w| w.overlaps_xz(&footprint)) {
            let feet_before = y_before - height;
            let feet = self.position.y - height;
            if self.velocity.y <= 0.0
                && feet_before >= wall.max.y - LANDING_TOLERANCE
                && feet < wall.max.y
            {
                self.position.y = wall.max.y + height;
                self.velocity.y = 0.0;
                self.grounded = true;
                return;
            }
            if self.velocity.y > 0.0 && y_before <= wall.min.y + LANDING_TOLERANCE && self.position.y > wall.min.y {
                self.position.y = wall.min.y - 0.1;
                self.velocity.y = 0.0;
                return;
            }
        }

        if self.position.y < height {
            self.position.y = height;
            self.velocity.y = 0.0;
            self.grounded = true;
        }
    }
}
