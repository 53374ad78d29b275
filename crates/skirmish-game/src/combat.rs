//! Projectile stepping, hit resolution, and team-wipe evaluation.
//!
//! Everything here is pure: callers decide what a [`Contact`] means for
//! the session (decals, damage, messages, round end).

use std::collections::VecDeque;

use glam::Vec3;
use serde::Serialize;

use skirmish_core::player::{PeerId, TeamId};

use crate::arena::Arena;
use crate::bots::Bot;
use crate::entities::EntityRegistry;
use crate::geometry::{Aabb, Ray, ray_aabb};
use crate::teams::TeamRoster;
use crate::weapon::WeaponKind;

/// A bullet in flight.
#[derive(Debug, Clone, Serialize)]
pub struct Projectile {
    pub position: Vec3,
    /// Units per second.
    pub velocity: Vec3,
    /// Where it was fired from; travel is measured from here.
    pub origin: Vec3,
    pub weapon: WeaponKind,
}

impl Projectile {
    pub fn new(origin: Vec3, dir: Vec3, speed: f32, weapon: WeaponKind) -> Self {
        Self {
            position: origin,
            velocity: dir.normalize_or(Vec3::Z) * speed,
            origin,
            weapon,
        }
    }

    /// The segment this bullet sweeps during `dt`, probed `look_ahead`
    /// further. `None` for a bullet that is not moving.
    pub fn sweep(&self, dt: f32, look_ahead: f32) -> Option<(Ray, f32)> {
        let ray = Ray::new(self.position, self.velocity)?;
        Some((ray, self.velocity.length() * dt + look_ahead))
    }

    pub fn advance(&mut self, dt: f32) {
        self.position += self.velocity * dt;
    }

    pub fn travelled(&self) -> f32 {
        self.position.distance(self.origin)
    }
}

/// Something a shot can hit that has health.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Target {
    Bot(u32),
    Mirror(PeerId),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Strike {
    Wall {
        normal: Vec3,
    },
    Entity {
        target: Target,
        /// Height of the hit point above the target's origin.
        relative_y: f32,
    },
}

/// Nearest intersection along a shot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Contact {
    pub distance: f32,
    pub point: Vec3,
    pub strike: Strike,
}

/// What a local shot can collide with this tick.
pub struct HitScene<'a> {
    pub arena: &'a Arena,
    pub bots: &'a [Bot],
    pub mirrors: &'a EntityRegistry,
    pub teams: &'a TeamRoster,
    pub hitbox_half_extents: Vec3,
}

impl HitScene<'_> {
    /// Nearest of bot, wall, and enemy mirror hits within `max_distance`.
    ///
    /// Candidates are checked bots first, then walls, then mirrors; a later
    /// candidate only replaces the current best when strictly closer, so
    /// equal distances go to whichever was checked first. Dead bots,
    /// teammates, and dead or hidden mirrors are never hit.
    pub fn nearest(&self, ray: &Ray, max_distance: f32) -> Option<Contact> {
        let mut best: Option<Contact> = None;
        let half = self.hitbox_half_extents;

        for bot in self.bots.iter().filter(|b| !b.dead) {
            if let Some(hit) = ray_aabb(ray, &Aabb::from_center(bot.position, half), max_distance)
                && best.as_ref().is_none_or(|b| hit.distance < b.distance)
            {
                best = Some(Contact {
                    distance: hit.distance,
                    point: hit.point,
                    strike: Strike::Entity {
                        target: Target::Bot(bot.id),
                        relative_y: hit.point.y - bot.position.y,
                    },
                });
            }
        }

        if let Some(hit) = self.arena.raycast(ray, max_distance)
            && best.as_ref().is_none_or(|b| hit.distance < b.distance)
        {
            best = Some(Contact {
                distance: hit.distance,
                point: hit.point,
                strike: Strike::Wall { normal: hit.normal },
            });
        }

        for mirror in self
            .mirrors
            .iter()
            .filter(|m| m.is_targetable() && self.teams.is_enemy(&m.id))
        {
            if let Some(hit) =
                ray_aabb(ray, &Aabb::from_center(mirror.position, half), max_distance)
                && best.as_ref().is_none_or(|b| hit.distance < b.distance)
            {
                best = Some(Contact {
                    distance: hit.distance,
                    point: hit.point,
                    strike: Strike::Entity {
                        target: Target::Mirror(mirror.id.clone()),
                        relative_y: hit.point.y - mirror.position.y,
                    },
                });
            }
        }

        best
    }
}

/// A bullet mark on a wall.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Decal {
    pub point: Vec3,
    pub normal: Vec3,
}

/// Wall decals, oldest evicted first once `capacity` is reached.
#[derive(Debug, Clone)]
pub struct DecalRing {
    decals: VecDeque<Decal>,
    capacity: usize,
}

impl DecalRing {
    pub fn new(capacity: usize) -> Self {
        Self {
            decals: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Add a decal, returning the one evicted to make room.
    pub fn push(&mut self, decal: Decal) -> Option<Decal> {
        self.decals.push_back(decal);
        if self.decals.len() > self.capacity {
            self.decals.pop_front()
        } else {
            None
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Decal> {
        self.decals.iter()
    }

    pub fn len(&self) -> usize {
        self.decals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decals.is_empty()
    }

    pub fn clear(&mut self) {
        self.decals.clear();
    }
}

/// The local player's view of who is still standing.
pub struct WipeView<'a> {
    pub local_team: TeamId,
    pub local_alive: bool,
    pub teams: &'a TeamRoster,
    pub mirrors: &'a EntityRegistry,
    pub bots: &'a [Bot],
}

impl WipeView<'_> {
    /// A team is wiped when the local player is not a live member of it,
    /// no mirror assigned to it is alive, and, for the bot team, no bot
    /// is alive.
    pub fn is_wiped(&self, team: TeamId) -> bool {
        if self.local_team == team && self.local_alive {
            return false;
        }
        let mirror_alive = self
            .mirrors
            .iter()
            .any(|m| !m.dead && self.teams.team_of(&m.id) == Some(team));
        if mirror_alive {
            return false;
        }
        !(team == TeamId::B && self.bots.iter().any(|b| !b.dead))
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use skirmish_core::test_helpers::peer;

    use super::*;
    use crate::bots::BotRoster;
    use crate::config::BotConfig;

    const HALF: Vec3 = Vec3::new(2.0, 7.5, 2.0);

    fn wall_at_z(z: f32) -> Arena {
        Arena::with_walls(
            "test",
            vec![Aabb::from_center(Vec3::new(0.0, 10.0, z), Vec3::new(50.0, 50.0, 1.0))],
        )
    }

    fn enemy_mirror_at(z: f32) -> (EntityRegistry, TeamRoster) {
        let mut mirrors = EntityRegistry::new(Vec3::new(0.0, 10.0, z));
        mirrors.observe_move(&peer("enemy"), Vec3::ZERO, 0.0);
        let mut teams = TeamRoster::new();
        teams.claim_host(&peer("me"));
        teams.assign(&peer("enemy"), 0);
        (mirrors, teams)
    }

    fn forward_ray() -> Ray {
        Ray::new(Vec3::new(0.0, 10.0, 0.0), Vec3::Z).unwrap()
    }

    #[test]
    fn closer_remote_enemy_beats_wall() {
        let arena = wall_at_z(40.0);
        let (mirrors, teams) = enemy_mirror_at(20.0);
        let scene = HitScene {
            arena: &arena,
            bots: &[],
            mirrors: &mirrors,
            teams: &teams,
            hitbox_half_extents: HALF,
        };
        let contact = scene.nearest(&forward_ray(), 100.0).unwrap();
        assert!(matches!(
            contact.strike,
            Strike::Entity { target: Target::Mirror(ref id), .. } if *id == peer("enemy")
        ));
    }

    #[test]
    fn closer_wall_beats_remote_enemy() {
        let arena = wall_at_z(10.0);
        let (mirrors, teams) = enemy_mirror_at(20.0);
        let scene = HitScene {
            arena: &arena,
            bots: &[],
            mirrors: &mirrors,
            teams: &teams,
            hitbox_half_extents: HALF,
        };
        let contact = scene.nearest(&forward_ray(), 100.0).unwrap();
        assert!(matches!(contact.strike, Strike::Wall { normal } if normal == Vec3::NEG_Z));
    }

    #[test]
    fn teammates_are_not_hit() {
        let arena = Arena::empty("open");
        let (mirrors, mut teams) = enemy_mirror_at(20.0);
        teams.assign(&peer("enemy"), 1);
        let scene = HitScene {
            arena: &arena,
            bots: &[],
            mirrors: &mirrors,
            teams: &teams,
            hitbox_half_extents: HALF,
        };
        assert!(scene.nearest(&forward_ray(), 100.0).is_none());
    }

    #[test]
    fn bots_win_exact_ties_with_walls() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut roster = BotRoster::new();
        roster.spawn(1, &BotConfig::default(), &mut rng);
        let bot = roster.active()[0].clone();
        let front = bot.position.z - HALF.z;
        let arena = Arena::with_walls(
            "tie",
            vec![Aabb::new(
                Vec3::new(bot.position.x - 50.0, 0.0, front),
                Vec3::new(bot.position.x + 50.0, 50.0, front + 1.0),
            )],
        );
        let ray = Ray::new(
            Vec3::new(bot.position.x, bot.position.y, front - 20.0),
            Vec3::Z,
        )
        .unwrap();
        let mirrors = EntityRegistry::default();
        let teams = TeamRoster::new();
        let scene = HitScene {
            arena: &arena,
            bots: roster.active(),
            mirrors: &mirrors,
            teams: &teams,
            hitbox_half_extents: HALF,
        };
        let contact = scene.nearest(&ray, 100.0).unwrap();
        assert!(matches!(
            contact.strike,
            Strike::Entity {
                target: Target::Bot(_),
                ..
            }
        ));
    }

    #[test]
    fn relative_height_measured_from_origin() {
        let arena = Arena::empty("open");
        let (mirrors, teams) = enemy_mirror_at(20.0);
        let scene = HitScene {
            arena: &arena,
            bots: &[],
            mirrors: &mirrors,
            teams: &teams,
            hitbox_half_extents: HALF,
        };
        let ray = Ray::new(Vec3::new(0.0, 15.0, 0.0), Vec3::Z).unwrap();
        match scene.nearest(&ray, 100.0).unwrap().strike {
            Strike::Entity { relative_y, .. } => assert!((relative_y - 5.0).abs() < 1e-4),
            other => panic!("Expected entity hit, got {other:?}"),
        }
    }

    #[test]
    fn projectile_sweep_covers_step_plus_look_ahead() {
        let bullet = Projectile::new(Vec3::ZERO, Vec3::Z, 900.0, WeaponKind::Rifle);
        let (ray, len) = bullet.sweep(1.0 / 60.0, 0.5).unwrap();
        assert_eq!(ray.dir, Vec3::Z);
        assert!((len - 15.5).abs() < 1e-3);
    }

    #[test]
    fn decal_ring_evicts_oldest() {
        let mut ring = DecalRing::new(100);
        for i in 0..100 {
            assert!(
                ring.push(Decal {
                    point: Vec3::splat(i as f32),
                    normal: Vec3::Y,
                })
                .is_none()
            );
        }
        let evicted = ring.push(Decal {
            point: Vec3::splat(100.0),
            normal: Vec3::Y,
        });
        assert_eq!(evicted.unwrap().point, Vec3::ZERO);
        assert_eq!(ring.len(), 100);
        assert_eq!(ring.iter().next().unwrap().point, Vec3::ONE);
    }

    #[test]
    fn bot_team_wipe_tracks_living_bots() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut roster = BotRoster::new();
        roster.spawn(2, &BotConfig::default(), &mut rng);
        let mut bots = roster.active().to_vec();
        bots[0].dead = true;
        bots[1].dead = true;

        let teams = TeamRoster::new();
        let mirrors = EntityRegistry::default();
        let view = WipeView {
            local_team: TeamId::A,
            local_alive: true,
            teams: &teams,
            mirrors: &mirrors,
            bots: &bots,
        };
        assert!(view.is_wiped(TeamId::B));
        assert!(!view.is_wiped(TeamId::A));

        bots[1].dead = false;
        let view = WipeView {
            local_team: TeamId::A,
            local_alive: true,
            teams: &teams,
            mirrors: &mirrors,
            bots: &bots,
        };
        assert!(!view.is_wiped(TeamId::B));
    }

    #[test]
    fn team_wipe_counts_remote_members() {
        let (mut mirrors, teams) = enemy_mirror_at(20.0);
        let view = WipeView {
            local_team: TeamId::A,
            local_alive: true,
            teams: &teams,
            mirrors: &mirrors,
            bots: &[],
        };
        assert!(!view.is_wiped(TeamId::B));

        mirrors.mark_dead(&peer("enemy"));
        let view = WipeView {
            local_team: TeamId::A,
            local_alive: true,
            teams: &teams,
            mirrors: &mirrors,
            bots: &[],
        };
        assert!(view.is_wiped(TeamId::B));
    }

    #[test]
    fn own_team_wiped_only_when_local_player_dead() {
        let teams = TeamRoster::new();
        let mirrors = EntityRegistry::default();
        let alive = WipeView {
            local_team: TeamId::A,
            local_alive: true,
            teams: &teams,
            mirrors: &mirrors,
            bots: &[],
        };
        assert!(!alive.is_wiped(TeamId::A));
        let dead = WipeView {
            local_alive: false,
            ..alive
        };
        assert!(dead.is_wiped(TeamId::A));
    }
}
