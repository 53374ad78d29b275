use std::time::Duration;

use glam::Vec3;
use rand::Rng;
use serde::Serialize;

use crate::arena::Arena;
use crate::config::BotConfig;
use crate::entities::DeathPose;
use crate::geometry::Aabb;

/// Bot bullets leave from this far above the bot's origin.
const MUZZLE_HEIGHT: f32 = 2.0;

/// Box used when checking a bot's next step against walls.
const BODY_HALF_EXTENTS: Vec3 = Vec3::new(2.0, 7.5, 2.0);

/// A practice bot. Bots always fight for team 1 and only exist offline.
#[derive(Debug, Clone, Serialize)]
pub struct Bot {
    pub id: u32,
    pub position: Vec3,
    pub yaw: f32,
    pub health: i32,
    pub dead: bool,
    pub death: DeathPose,
    #[serde(skip)]
    last_shot: Option<Duration>,
    mag: u32,
    reload_remaining: Option<f32>,
}

impl Bot {
    pub fn is_reloading(&self) -> bool {
        self.reload_remaining.is_some()
    }
}

/// A bullet fired by a bot this tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BotShot {
    pub origin: Vec3,
    pub velocity: Vec3,
}

/// What a bullet did to a bot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BotHit {
    Wounded { health: i32 },
    Killed,
}

/// Active bots plus the bodies of the ones that died this round.
#[derive(Debug, Clone, Default)]
pub struct BotRoster {
    active: Vec<Bot>,
    bodies: Vec<Bot>,
    next_id: u32,
}

impl BotRoster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bots still fighting.
    pub fn active(&self) -> &[Bot] {
        &self.active
    }

    /// Dead bots still lying in the scene.
    pub fn bodies(&self) -> &[Bot] {
        &self.bodies
    }

    pub fn alive_count(&self) -> usize {
        self.active.len()
    }

    /// Remove every bot and body.
    pub fn clear(&mut self) {
        self.active.clear();
        self.bodies.clear();
    }

    /// Drop `count` fresh bots at random spots in the spawn rectangle.
    pub fn spawn(&mut self, count: usize, config: &BotConfig, rng: &mut impl Rng) {
        let [width, depth] = config.spawn_extent;
        for _ in 0..count {
            let x = (rng.random::<f32>() - 0.5) * width;
            let z = (rng.random::<f32>() - 0.5) * depth + config.spawn_z_offset;
            self.active.push(Bot {
                id: self.next_id,
                position: Vec3::new(x, config.origin_height, z),
                yaw: 0.0,
                health: config.health,
                dead: false,
                death: DeathPose::default(),
                last_shot: None,
                mag: config.magazine,
                reload_remaining: None,
            });
            self.next_id += 1;
        }
    }

    /// Apply bullet or melee damage to an active bot. A kill moves it to
    /// the bodies list. Returns `None` if the id is not an active bot.
    pub fn apply_damage(&mut self, id: u32, damage: i32) -> Option<BotHit> {
        let idx = self.active.iter().position(|b| b.id == id)?;
        let bot = &mut self.active[idx];
        bot.health = crate::entities::drain_health(bot.health, damage);
        if bot.health > 0 {
            return Some(BotHit::Wounded { health: bot.health });
        }
        let mut body = self.active.remove(idx);
        body.dead = true;
        self.bodies.push(body);
        Some(BotHit::Killed)
    }

    /// Clear a body from the scene once its death animation has played.
    pub fn remove_body(&mut self, id: u32) -> bool {
        let before = self.bodies.len();
        self.bodies.retain(|b| b.id != id);
        self.bodies.len() != before
    }

    pub fn advance_death_animations(&mut self, dt: f32) {
        for body in &mut self.bodies {
            body.death.advance(dt, &mut body.position);
        }
    }

    /// Run one AI step for every active bot against a player at `target`.
    ///
    /// A bot that can see the player within vision range shoots on its
    /// own jittered cadence until its magazine runs dry, then reloads.
    /// Bots that cannot see the player, or are still far away, walk
    /// toward it unless a wall is in the way.
    pub fn think(
        &mut self,
        now: Duration,
        dt: f32,
        target: Vec3,
        arena: &Arena,
        config: &BotConfig,
        rng: &mut impl Rng,
    ) -> Vec<BotShot> {
        let mut shots = Vec::new();
        let fire_interval = Duration::from_millis(config.fire_interval_ms);

        for bot in &mut self.active {
            let to_target = target - bot.position;
            bot.yaw = to_target.x.atan2(to_target.z);

            if let Some(remaining) = bot.reload_remaining.as_mut() {
                *remaining -= dt;
                if *remaining <= 0.0 {
                    bot.reload_remaining = None;
                    bot.mag = config.magazine;
                }
            }

            let distance = to_target.length();
            let Some(dir) = to_target.try_normalize() else {
                continue;
            };
            let can_see = arena.line_of_sight(bot.position, target);

            if can_see
                && distance < config.vision_range
                && !bot.is_reloading()
                && bot.last_shot.is_none_or(|last| now.saturating_sub(last) > fire_interval)
            {
                shots.push(aim(bot.position, target, config, rng));
                let jitter = rng.random_range(0..=config.fire_jitter_ms);
                bot.last_shot = Some(now + Duration::from_millis(jitter));
                bot.mag = bot.mag.saturating_sub(1);
                if bot.mag == 0 {
                    bot.reload_remaining = Some(config.reload_secs);
                }
            }

            if !can_see || distance > config.engage_range {
                let step = dir * config.move_speed * dt;
                let next = Vec3::new(
                    bot.position.x + step.x,
                    bot.position.y,
                    bot.position.z + step.z,
                );
                if arena
                    .collides(&Aabb::from_center(next, BODY_HALF_EXTENTS))
                    .is_none()
                {
                    bot.position = next;
                }
            }
        }

        shots
    }
}

/// Bullet from `from` toward `target` with random aim error per axis.
fn aim(from: Vec3, target: Vec3, config: &BotConfig, rng: &mut impl Rng) -> BotShot {
    let origin = from + Vec3::Y * MUZZLE_HEIGHT;
    let mut error = || (rng.random::<f32>() - 0.5) * config.aim_spread;
    let aim_point = target + Vec3::new(error(), error(), error());
    let dir = (aim_point - origin).try_normalize().unwrap_or(Vec3::Z);
    BotShot {
        origin,
        velocity: dir * config.bullet_speed,
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    fn roster_with(count: usize) -> (BotRoster, BotConfig, StdRng) {
        let config = BotConfig::default();
        let mut rng = StdRng::seed_from_u64(7);
        let mut roster = BotRoster::new();
        roster.spawn(count, &config, &mut rng);
        (roster, config, rng)
    }

    #[test]
    fn spawn_places_bots_in_rectangle() {
        let (roster, config, _) = roster_with(20);
        assert_eq!(roster.alive_count(), 20);
        for bot in roster.active() {
            assert!(bot.position.x.abs() <= config.spawn_extent[0] / 2.0);
            assert!((bot.position.z - config.spawn_z_offset).abs() <= config.spawn_extent[1] / 2.0);
            assert_eq!(bot.health, 100);
        }
        let mut ids: Vec<_> = roster.active().iter().map(|b| b.id).collect();
        ids.dedup();
        assert_eq!(ids.len(), 20);
    }

    #[test]
    fn kill_moves_bot_to_bodies() {
        let (mut roster, _, _) = roster_with(2);
        let id = roster.active()[0].id;
        assert_eq!(roster.apply_damage(id, 50), Some(BotHit::Wounded { health: 50 }));
        assert_eq!(roster.apply_damage(id, 50), Some(BotHit::Killed));
        assert_eq!(roster.alive_count(), 1);
        assert_eq!(roster.bodies().len(), 1);
        assert!(roster.bodies()[0].dead);
        assert_eq!(roster.apply_damage(id, 50), None);
        assert!(roster.remove_body(id));
        assert!(roster.bodies().is_empty());
    }

    #[test]
    fn overflowing_damage_kills_without_wrapping() {
        let (mut roster, _, _) = roster_with(1);
        let id = roster.active()[0].id;
        assert_eq!(roster.apply_damage(id, -30), Some(BotHit::Wounded { health: 100 }));
        assert_eq!(roster.apply_damage(id, i32::MAX), Some(BotHit::Killed));
        assert_eq!(roster.bodies()[0].health, 0);
    }

    #[test]
    fn visible_bot_shoots_and_holds_distance() {
        let (mut roster, config, mut rng) = roster_with(1);
        let start = roster.active()[0].position;
        let target = start + Vec3::new(0.0, 2.0, 30.0);
        let shots = roster.think(
            Duration::from_secs(10),
            0.1,
            target,
            &Arena::empty("open"),
            &config,
            &mut rng,
        );
        assert_eq!(shots.len(), 1);
        assert!(shots[0].velocity.z > 0.0);
        assert_eq!(roster.active()[0].position, start);
    }

    #[test]
    fn bot_cannot_shoot_through_walls_and_walks_instead() {
        let (mut roster, config, mut rng) = roster_with(1);
        let start = roster.active()[0].position;
        let target = start + Vec3::new(0.0, 0.0, 100.0);
        let wall = Aabb::from_center(start + Vec3::new(0.0, 0.0, 50.0), Vec3::new(20.0, 20.0, 1.0));
        let arena = Arena::with_walls("wall", vec![wall]);
        let shots = roster.think(Duration::from_secs(10), 0.1, target, &arena, &config, &mut rng);
        assert!(shots.is_empty());
        assert!(roster.active()[0].position.z > start.z);
    }

    #[test]
    fn empty_magazine_forces_reload() {
        let config = BotConfig {
            magazine: 1,
            fire_jitter_ms: 0,
            ..BotConfig::default()
        };
        let mut rng = StdRng::seed_from_u64(1);
        let mut roster = BotRoster::new();
        roster.spawn(1, &config, &mut rng);
        let target = roster.active()[0].position + Vec3::new(0.0, 0.0, 20.0);
        let arena = Arena::empty("open");

        let first = roster.think(Duration::from_secs(1), 0.1, target, &arena, &config, &mut rng);
        assert_eq!(first.len(), 1);
        assert!(roster.active()[0].is_reloading());

        let during = roster.think(Duration::from_secs(2), 1.0, target, &arena, &config, &mut rng);
        assert!(during.is_empty());

        let after = roster.think(Duration::from_secs(4), 1.5, target, &arena, &config, &mut rng);
        assert_eq!(after.len(), 1);
    }
}
