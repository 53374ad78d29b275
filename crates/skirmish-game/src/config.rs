use std::path::Path;

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Failure to read or parse a config file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("{field} must be a finite, non-negative number of seconds (got {value})")]
    Duration { field: &'static str, value: f32 },
}

/// Where a team's players stand at round start.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpawnPoint {
    /// Eye position.
    pub position: Vec3,
    /// Facing, radians about +Y. Zero looks down +Z.
    pub yaw: f32,
}

/// Local player movement tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MovementConfig {
    /// Velocity damping factor per second.
    pub damping: f32,
    /// Acceleration while standing (units/s^2).
    pub accel: f32,
    /// Acceleration while crouched.
    pub crouch_accel: f32,
    pub gravity: f32,
    /// Upward velocity added by a jump.
    pub jump_velocity: f32,
    /// Eye height above the surface when standing.
    pub stand_height: f32,
    /// Eye height above the surface when crouched.
    pub crouch_height: f32,
    /// Horizontal collision radius.
    pub radius: f32,
    /// Radians of rotation per unit of look delta.
    pub look_sensitivity: f32,
}

impl Default for MovementConfig {
    fn default() -> Self {
        Self {
            damping: 10.0,
            accel: 400.0,
            crouch_accel: 150.0,
            gravity: 980.0,
            jump_velocity: 200.0,
            stand_height: 9.7,
            crouch_height: 6.0,
            radius: 2.5,
            look_sensitivity: 0.002,
        }
    }
}

/// Practice bot tuning (solo mode only).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    pub count: usize,
    pub health: i32,
    /// Minimum time between shots (ms).
    pub fire_interval_ms: u64,
    /// Random extra delay added to each shot interval (ms).
    pub fire_jitter_ms: u64,
    /// Beyond this distance a bot cannot see the player.
    pub vision_range: f32,
    pub move_speed: f32,
    /// Bots keep closing in until this near to a visible player.
    pub engage_range: f32,
    pub magazine: u32,
    pub reload_secs: f32,
    pub bullet_speed: f32,
    pub bullet_damage: i32,
    /// A bot bullet this close to the player's eye counts as a hit.
    pub bullet_hit_radius: f32,
    /// Total aim error range per axis.
    pub aim_spread: f32,
    /// Width (x) and depth (z) of the spawn rectangle.
    pub spawn_extent: [f32; 2],
    /// Z offset of the spawn rectangle center.
    pub spawn_z_offset: f32,
    /// Height of the bot's origin above the floor.
    pub origin_height: f32,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            count: 5,
            health: 100,
            fire_interval_ms: 600,
            fire_jitter_ms: 500,
            vision_range: 500.0,
            move_speed: 25.0,
            engage_range: 60.0,
            magazine: 30,
            reload_secs: 2.0,
            bullet_speed: 900.0,
            bullet_damage: 10,
            bullet_hit_radius: 4.0,
            aim_spread: 3.0,
            spawn_extent: [150.0, 100.0],
            spawn_z_offset: -20.0,
            origin_height: 7.5,
        }
    }
}

/// Data-driven tuning for a match session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Position sync broadcasts per second.
    pub sync_rate_hz: f32,
    /// Round wins needed to end the match.
    pub win_threshold: u32,
    /// Delay between a round resolving and the next round starting (s).
    pub intermission_secs: f32,
    /// Delay between the deciding round and game over (s).
    pub game_over_delay_secs: f32,
    /// Delay between enough players joining and the first round (s).
    pub match_found_delay_secs: f32,
    /// Dead bodies stay visible this long (s).
    pub death_removal_secs: f32,
    pub reload_secs: f32,
    /// Length of the melee swing animation (s).
    pub melee_swing_secs: f32,
    pub inspect_secs: f32,
    /// Idle time after which rifle recoil resets (s).
    pub recoil_reset_secs: f32,
    /// Wall decals kept before the oldest is evicted.
    pub max_decals: usize,
    /// Player bullet speed (units/s).
    pub projectile_speed: f32,
    /// Extra distance probed ahead of a bullet each step.
    pub projectile_look_ahead: f32,
    /// Bullets further than this from their origin are dropped.
    pub max_travel: f32,
    /// Hits more than this far above an entity's origin are headshots.
    pub headshot_offset: f32,
    pub melee_range: f32,
    pub melee_damage: i32,
    /// Half extents of the box used for player and bot hit tests.
    pub hitbox_half_extents: Vec3,
    /// Where a mirror is placed before its first position update.
    pub mirror_default_position: Vec3,
    pub team_a_spawn: SpawnPoint,
    pub team_b_spawn: SpawnPoint,
    pub movement: MovementConfig,
    pub bots: BotConfig,
    /// Fixed RNG seed for reproducible runs. Random when absent.
    pub seed: Option<u64>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            sync_rate_hz: skirmish_core::net::protocol::DEFAULT_SYNC_RATE_HZ as f32,
            win_threshold: 10,
            intermission_secs: 3.0,
            game_over_delay_secs: 2.0,
            match_found_delay_secs: 1.5,
            death_removal_secs: 3.0,
            reload_secs: 2.0,
            melee_swing_secs: 0.2,
            inspect_secs: 2.5,
            recoil_reset_secs: 1.5,
            max_decals: 100,
            projectile_speed: 900.0,
            projectile_look_ahead: 0.5,
            max_travel: 1000.0,
            headshot_offset: 3.5,
            melee_range: 10.0,
            melee_damage: 50,
            hitbox_half_extents: Vec3::new(2.0, 7.5, 2.0),
            mirror_default_position: Vec3::new(0.0, 7.5, -50.0),
            team_a_spawn: SpawnPoint {
                position: Vec3::new(20.0, 10.0, -420.0),
                yaw: 0.0,
            },
            team_b_spawn: SpawnPoint {
                position: Vec3::new(0.0, 10.0, 420.0),
                yaw: std::f32::consts::PI,
            },
            movement: MovementConfig::default(),
            bots: BotConfig::default(),
            seed: None,
        }
    }
}

impl GameConfig {
    /// Load config from environment or TOML file, falling back to defaults.
    ///
    /// Checks `SKIRMISH_CONFIG` first, then `config/skirmish.toml`.
    pub fn load() -> Self {
        if let Ok(path) = std::env::var("SKIRMISH_CONFIG") {
            match Self::from_file(&path) {
                Ok(config) => return config,
                Err(e) => tracing::warn!("Ignoring SKIRMISH_CONFIG: {e}"),
            }
        }
        if let Ok(config) = Self::from_file("config/skirmish.toml") {
            return config;
        }
        Self::default()
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject delays that cannot become a timer deadline.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let delays = [
            ("intermission_secs", self.intermission_secs),
            ("game_over_delay_secs", self.game_over_delay_secs),
            ("match_found_delay_secs", self.match_found_delay_secs),
            ("death_removal_secs", self.death_removal_secs),
            ("reload_secs", self.reload_secs),
            ("melee_swing_secs", self.melee_swing_secs),
            ("inspect_secs", self.inspect_secs),
            ("recoil_reset_secs", self.recoil_reset_secs),
            ("bots.reload_secs", self.bots.reload_secs),
        ];
        for (field, value) in delays {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::Duration { field, value });
            }
        }
        Ok(())
    }

    /// Spawn point for a team. Anything but team 0 uses the far spawn.
    pub fn spawn_for(&self, team: skirmish_core::player::TeamId) -> SpawnPoint {
        if team == skirmish_core::player::TeamId::A {
            self.team_a_spawn
        } else {
            self.team_b_spawn
        }
    }
}

#[cfg(test)]
mod tests {
    use skirmish_core::player::TeamId;

    use super::*;

    #[test]
    fn defaults_match_match_rules() {
        let config = GameConfig::default();
        assert_eq!(config.win_threshold, 10);
        assert_eq!(config.max_decals, 100);
        assert_eq!(config.bots.count, 5);
        assert!((config.sync_rate_hz - 30.0).abs() < f32::EPSILON);
        assert!((config.headshot_offset - 3.5).abs() < f32::EPSILON);
    }

    #[test]
    fn partial_toml_keeps_other_defaults() {
        let config = GameConfig::from_toml_str(
            r#"
            win_threshold = 3
            seed = 42

            [bots]
            count = 2
            "#,
        )
        .unwrap();
        assert_eq!(config.win_threshold, 3);
        assert_eq!(config.seed, Some(42));
        assert_eq!(config.bots.count, 2);
        assert_eq!(config.bots.magazine, 30);
        assert_eq!(config.melee_damage, 50);
    }

    #[test]
    fn invalid_toml_is_an_error() {
        let err = GameConfig::from_toml_str("win_threshold = \"many\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn negative_delay_is_rejected() {
        let err = GameConfig::from_toml_str("match_found_delay_secs = -1.0").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Duration {
                field: "match_found_delay_secs",
                ..
            }
        ));
    }

    #[test]
    fn infinite_bot_reload_is_rejected() {
        let err = GameConfig::from_toml_str("[bots]\nreload_secs = inf").unwrap_err();
        assert!(err.to_string().contains("bots.reload_secs"));
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let err = GameConfig::from_file("/nonexistent/skirmish.toml").unwrap_err();
        assert!(err.to_string().contains("/nonexistent/skirmish.toml"));
    }

    #[test]
    fn spawns_face_each_other() {
        let config = GameConfig::default();
        let a = config.spawn_for(TeamId::A);
        let b = config.spawn_for(TeamId::B);
        assert!(a.position.z < 0.0 && b.position.z > 0.0);
        assert!((b.yaw - a.yaw - std::f32::consts::PI).abs() < 1e-6);
    }
}
