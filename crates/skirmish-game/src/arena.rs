use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::geometry::{Aabb, Ray, RayHit, ray_aabb};

/// Static collision geometry: walls, cover, and boundary.
///
/// Everything that stops bullets or players is a box; the floor is the
/// plane `y = 0` and is not stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Arena {
    pub name: String,
    pub walls: Vec<Aabb>,
}

impl Arena {
    /// Open floor with no walls.
    pub fn empty(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            walls: Vec::new(),
        }
    }

    pub fn with_walls(name: impl Into<String>, walls: Vec<Aabb>) -> Self {
        Self {
            name: name.into(),
            walls,
        }
    }

    /// Nearest wall hit along `ray` within `max_distance`.
    pub fn raycast(&self, ray: &Ray, max_distance: f32) -> Option<RayHit> {
        let mut nearest: Option<RayHit> = None;
        for wall in &self.walls {
            if let Some(hit) = ray_aabb(ray, wall, max_distance)
                && nearest.is_none_or(|n| hit.distance < n.distance)
            {
                nearest = Some(hit);
            }
        }
        nearest
    }

    /// True when no wall blocks the segment between two points.
    pub fn line_of_sight(&self, from: Vec3, to: Vec3) -> bool {
        let distance = from.distance(to);
        match Ray::new(from, to - from) {
            Some(ray) => self.raycast(&ray, distance).is_none(),
            None => true,
        }
    }

    /// First wall overlapping `body`, if any.
    pub fn collides(&self, body: &Aabb) -> Option<&Aabb> {
        self.walls.iter().find(|w| w.intersects(body))
    }
}

/// Load an arena from a JSON file, returning `None` if the file is missing or invalid.
pub fn load_arena_from_file(path: &str) -> Option<Arena> {
    match std::fs::read_to_string(path) {
        Ok(content) => match serde_json::from_str::<Arena>(&content) {
            Ok(arena) => Some(arena),
            Err(e) => {
                tracing::warn!("Failed to parse {path}: {e}");
                None
            },
        },
        Err(_) => None,
    }
}

/// Load the match arena, preferring a JSON file.
///
/// Reads `SKIRMISH_ARENA` (default `config/arena.json`) and falls back to
/// [`generate_arena`] if the file is missing or unparseable.
pub fn load_arena() -> Arena {
    let path = std::env::var("SKIRMISH_ARENA").unwrap_or_else(|_| "config/arena.json".to_string());
    load_arena_from_file(&path).unwrap_or_else(generate_arena)
}

/// Box placed on the floor: `(x, z)` is the footprint center, `y` the base.
fn block(x: f32, y: f32, z: f32, w: f32, h: f32, d: f32) -> Aabb {
    Aabb::new(
        Vec3::new(x - w / 2.0, y, z - d / 2.0),
        Vec3::new(x + w / 2.0, y + h, z + d / 2.0),
    )
}

/// Built-in desert blockout: team 1 spawn at +Z, team 0 spawn at -Z,
/// a walled mid lane between them, and a boundary at +-600.
pub fn generate_arena() -> Arena {
    const S: f32 = 4.0;

    let mut walls = vec![
        // Team 1 spawn pocket
        block(0.0, 0.0, 450.0, 100.0, 40.0, 50.0),
        block(-60.0, 0.0, 400.0, 20.0, 40.0, 150.0),
        block(60.0, 0.0, 400.0, 20.0, 40.0, 150.0),
        // Ramp
        block(50.0 * S, 0.0, 20.0 * S, 15.0 * S, 25.0 * S, 40.0 * S),
        block(85.0 * S, 0.0, 20.0 * S, 15.0 * S, 30.0 * S, 40.0 * S),
        block(70.0 * S, 25.0 * S, 20.0 * S, 30.0 * S, 5.0 * S, 40.0 * S),
        // A site cover
        block(20.0 * S, 0.0, -30.0 * S, 12.0 * S, 12.0 * S, 12.0 * S),
        block(24.0 * S, 12.0 * S, -30.0 * S, 6.0 * S, 6.0 * S, 6.0 * S),
        block(40.0 * S, 0.0, -40.0 * S, 10.0 * S, 12.0 * S, 10.0 * S),
        block(30.0 * S, 0.0, 0.0, 15.0 * S, 20.0 * S, 30.0 * S),
        // Palace
        block(80.0 * S, 0.0, -10.0 * S, 25.0 * S, 40.0 * S, 40.0 * S),
        block(70.0 * S, 15.0 * S, -25.0 * S, 30.0 * S, 2.0 * S, 20.0 * S),
        block(60.0 * S, 0.0, -25.0 * S, 2.0 * S, 15.0 * S, 2.0 * S),
        block(60.0 * S, 0.0, -15.0 * S, 2.0 * S, 15.0 * S, 2.0 * S),
        // Connector
        block(-15.0 * S, 0.0, -35.0 * S, 25.0 * S, 35.0 * S, 40.0 * S),
        block(-10.0 * S, 20.0 * S, -15.0 * S, 15.0 * S, 2.0 * S, 10.0 * S),
        // Mid lane walls and catwalk
        block(-30.0 * S, 0.0, 0.0, 5.0 * S, 40.0 * S, 80.0 * S),
        block(30.0 * S, 0.0, 0.0, 5.0 * S, 40.0 * S, 80.0 * S),
        block(-35.0 * S, 15.0 * S, 0.0, 10.0 * S, 2.0 * S, 40.0 * S),
        // B site
        block(-100.0 * S, 0.0, -40.0 * S, 40.0 * S, 10.0 * S, 40.0 * S),
        block(-105.0 * S, 0.0, -25.0 * S, 15.0 * S, 12.0 * S, 15.0 * S),
        block(-80.0 * S, 0.0, -60.0 * S, 10.0 * S, 12.0 * S, 25.0 * S),
        block(-120.0 * S, 0.0, -20.0 * S, 30.0 * S, 50.0 * S, 60.0 * S),
        // Apartments
        block(-80.0 * S, 20.0 * S, 50.0 * S, 25.0 * S, 30.0 * S, 100.0 * S),
        block(-75.0 * S, 35.0 * S, 80.0 * S, 15.0 * S, 5.0 * S, 15.0 * S),
        // Team 0 spawn and ticket booth
        block(0.0, 0.0, -450.0, 100.0, 40.0, 50.0),
        block(20.0 * S, 0.0, -60.0 * S, 15.0 * S, 15.0 * S, 15.0 * S),
        block(15.0 * S, 15.0 * S, -60.0 * S, 25.0 * S, 2.0 * S, 20.0 * S),
        // Boundary
        block(0.0, 0.0, 600.0, 1200.0, 150.0, 20.0),
        block(0.0, 0.0, -600.0, 1200.0, 150.0, 20.0),
        block(600.0, 0.0, 0.0, 20.0, 150.0, 1200.0),
        block(-600.0, 0.0, 0.0, 20.0, 150.0, 1200.0),
    ];

    // Connector stairs
    for i in 0..10 {
        let step = i as f32;
        walls.push(block(
            -5.0 * S,
            step * 2.0,
            -25.0 * S + step * 3.0,
            15.0 * S,
            3.0 * S,
            3.0 * S,
        ));
    }

    Arena::with_walls("desert", walls)
}
