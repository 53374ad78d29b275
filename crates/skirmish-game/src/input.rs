use serde::{Deserialize, Serialize};

use crate::weapon::WeaponKind;

/// One tick of player intent, as produced by whatever drives the peer
/// (keyboard and mouse, a script, a test).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputFrame {
    pub forward: bool,
    pub backward: bool,
    pub left: bool,
    pub right: bool,
    pub jump: bool,
    pub crouch: bool,
    /// Trigger went down this tick.
    pub fire_pressed: bool,
    /// Trigger is down.
    pub fire_held: bool,
    pub reload: bool,
    pub inspect: bool,
    pub switch_to: Option<WeaponKind>,
    /// Horizontal look delta; positive turns right.
    pub look_dx: f32,
    /// Vertical look delta; positive looks down.
    pub look_dy: f32,
}

impl InputFrame {
    pub fn idle() -> Self {
        Self::default()
    }

    /// Trigger pulled and held this tick.
    pub fn firing() -> Self {
        Self {
            fire_pressed: true,
            fire_held: true,
            ..Self::default()
        }
    }
}
