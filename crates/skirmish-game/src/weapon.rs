use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Weapons every player carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeaponKind {
    Rifle,
    Pistol,
    Knife,
}

impl WeaponKind {
    pub const ALL: [WeaponKind; 3] = [Self::Rifle, Self::Pistol, Self::Knife];

    /// Minimum time between two shots or swings.
    pub fn fire_interval(self) -> Duration {
        match self {
            Self::Rifle => Duration::from_millis(100),
            Self::Pistol => Duration::from_millis(200),
            Self::Knife => Duration::from_millis(500),
        }
    }

    pub fn is_melee(self) -> bool {
        self == Self::Knife
    }

    /// Keeps firing while the trigger is held.
    pub fn is_automatic(self) -> bool {
        self == Self::Rifle
    }

    /// Magazine capacity; `None` for weapons without ammo.
    pub fn magazine_size(self) -> Option<u32> {
        match self {
            Self::Rifle => Some(30),
            Self::Pistol => Some(12),
            Self::Knife => None,
        }
    }

    fn starting_reserve(self) -> u32 {
        match self {
            Self::Rifle => 120,
            Self::Pistol => 36,
            Self::Knife => 0,
        }
    }
}

/// Damage dealt by a bullet that struck `relative_y` units above the
/// target's origin. Only strictly higher than `headshot_offset` is a
/// headshot.
pub fn hit_damage(weapon: WeaponKind, relative_y: f32, headshot_offset: f32) -> i32 {
    let headshot = relative_y > headshot_offset;
    match (weapon, headshot) {
        (WeaponKind::Rifle, true) => 80,
        (WeaponKind::Rifle, false) => 22,
        (_, true) => 50,
        (_, false) => 15,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ammo {
    pub mag: u32,
    pub reserve: u32,
}

impl Ammo {
    fn full(kind: WeaponKind) -> Self {
        Self {
            mag: kind.magazine_size().unwrap_or(0),
            reserve: kind.starting_reserve(),
        }
    }

    /// Move rounds from reserve into the magazine, up to `size`.
    fn refill(&mut self, size: u32) {
        let load = size.saturating_sub(self.mag).min(self.reserve);
        self.mag += load;
        self.reserve -= load;
    }
}

/// Why a trigger pull did nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FireBlocked {
    Reloading,
    Empty,
    Cooldown,
}

/// Spread and kick applied to one shot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShotSpread {
    /// Full width of the random offset added to each direction axis.
    pub amount: f32,
    /// Extra upward offset added to the direction.
    pub upward: f32,
}

/// The local player's weapons, ammo, and firing state.
#[derive(Debug, Clone)]
pub struct Loadout {
    current: WeaponKind,
    rifle: Ammo,
    pistol: Ammo,
    reloading: bool,
    last_shot: Option<Duration>,
    recoil: u32,
}

impl Default for Loadout {
    fn default() -> Self {
        Self {
            current: WeaponKind::Rifle,
            rifle: Ammo::full(WeaponKind::Rifle),
            pistol: Ammo::full(WeaponKind::Pistol),
            reloading: false,
            last_shot: None,
            recoil: 0,
        }
    }
}

impl Loadout {
    pub fn current(&self) -> WeaponKind {
        self.current
    }

    pub fn is_reloading(&self) -> bool {
        self.reloading
    }

    pub fn ammo(&self, kind: WeaponKind) -> Option<Ammo> {
        match kind {
            WeaponKind::Rifle => Some(self.rifle),
            WeaponKind::Pistol => Some(self.pistol),
            WeaponKind::Knife => None,
        }
    }

    fn ammo_mut(&mut self, kind: WeaponKind) -> Option<&mut Ammo> {
        match kind {
            WeaponKind::Rifle => Some(&mut self.rifle),
            WeaponKind::Pistol => Some(&mut self.pistol),
            WeaponKind::Knife => None,
        }
    }

    /// Back to a fresh round's state: full ammo, rifle drawn.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Draw another weapon. A reload in progress keeps running.
    pub fn switch(&mut self, kind: WeaponKind) -> bool {
        if self.current == kind {
            return false;
        }
        self.current = kind;
        self.recoil = 0;
        true
    }

    /// Pull the trigger at `now`. On success the shot is committed: the
    /// cooldown restarts and a round leaves the magazine.
    pub fn try_fire(&mut self, now: Duration) -> Result<WeaponKind, FireBlocked> {
        if self.reloading {
            return Err(FireBlocked::Reloading);
        }
        let kind = self.current;
        if self.ammo(kind).is_some_and(|a| a.mag == 0) {
            return Err(FireBlocked::Empty);
        }
        if let Some(last) = self.last_shot
            && now.saturating_sub(last) < kind.fire_interval()
        {
            return Err(FireBlocked::Cooldown);
        }
        self.last_shot = Some(now);
        if let Some(ammo) = self.ammo_mut(kind) {
            ammo.mag -= 1;
        }
        Ok(kind)
    }

    /// Spread for the shot just fired. Consecutive rifle shots climb;
    /// any other weapon resets the spray.
    pub fn shot_spread(&mut self, horizontal_speed: f32, crouching: bool, airborne: bool) -> ShotSpread {
        let mut amount = (if crouching { 0.005 } else { 0.01 }) + horizontal_speed * 0.002;
        let mut upward = 0.0;

        if self.current == WeaponKind::Rifle {
            let effective = if airborne { 10 } else { self.recoil };
            if effective > 0 {
                let kick = if crouching {
                    0.015
                } else if effective == 1 {
                    0.08
                } else {
                    0.02
                };
                upward = effective as f32 * kick;
                amount = (if crouching { 0.015 } else { 0.025 }) + effective as f32 * 0.01;
            } else {
                amount = 0.005;
            }
            self.recoil += 1;
        } else {
            self.recoil = 0;
        }

        ShotSpread { amount, upward }
    }

    /// Reset the rifle spray after `idle` without shooting.
    pub fn settle_recoil(&mut self, now: Duration, idle: Duration) {
        if self
            .last_shot
            .is_none_or(|last| now.saturating_sub(last) > idle)
        {
            self.recoil = 0;
        }
    }

    /// Start reloading the drawn weapon. Returns the weapon being reloaded,
    /// or `None` if already reloading, holding the knife, the magazine is
    /// full, or the reserve is empty.
    pub fn begin_reload(&mut self) -> Option<WeaponKind> {
        if self.reloading {
            return None;
        }
        let kind = self.current;
        let size = kind.magazine_size()?;
        let ammo = self.ammo(kind)?;
        if ammo.mag == size || ammo.reserve == 0 {
            return None;
        }
        self.reloading = true;
        Some(kind)
    }

    /// Complete a reload started for `kind`.
    pub fn finish_reload(&mut self, kind: WeaponKind) {
        if let Some(size) = kind.magazine_size()
            && let Some(ammo) = self.ammo_mut(kind)
        {
            ammo.refill(size);
        }
        self.reloading = false;
    }
}
