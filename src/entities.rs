/// All game entity types — pure data, no logic.

use glam::Vec3;
use serde::Deserialize;

/// Identifier shared by enemies and power-ups.  Never reused once spawned.
pub type EntityId = u64;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Character {
    Mario,
    Lara,
}

impl Character {
    pub fn display_name(self) -> &'static str {
        match self {
            Character::Mario => "MARIO",
            Character::Lara => "LARA CROFT",
        }
    }

    pub fn tagline(self) -> &'static str {
        match self {
            Character::Mario => "Tactical Plumber",
            Character::Lara => "Tomb Raider",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EnemyKind {
    Goomba,
    Skeleton,
}

impl EnemyKind {
    /// Health an enemy of this kind spawns with.
    pub fn max_health(self) -> u32 {
        match self {
            EnemyKind::Goomba => 100,
            EnemyKind::Skeleton => 150,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PowerUpKind {
    Mushroom,
    Medkit,
    Ammo,
    Star,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PowerUpEffect {
    /// Heals the operative, capped at full health.
    RestoreHealth,
    RestoreAmmo,
    BonusScore,
}

impl PowerUpKind {
    /// What collecting this kind does.  `Medkit` has no effect wired up and
    /// is only removed from the arena.
    pub fn effect(self) -> Option<PowerUpEffect> {
        match self {
            PowerUpKind::Mushroom => Some(PowerUpEffect::RestoreHealth),
            PowerUpKind::Ammo => Some(PowerUpEffect::RestoreAmmo),
            PowerUpKind::Star => Some(PowerUpEffect::BonusScore),
            PowerUpKind::Medkit => None,
        }
    }
}

// ── Arena entities ────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq)]
pub struct Enemy {
    pub id: EntityId,
    /// Spawn position.  Wobble is applied at render time only.
    pub position: Vec3,
    pub health: u32,
    pub kind: EnemyKind,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PowerUp {
    pub id: EntityId,
    pub position: Vec3,
    pub kind: PowerUpKind,
}

// ── Master game state ─────────────────────────────────────────────────────────

/// The entire game state.  Cloneable so pure update functions can
/// return a new copy without mutating the original.
#[derive(Clone, Debug, PartialEq)]
pub struct GameState {
    /// Always within `0..=MAX_HEALTH`.
    pub health: u32,
    pub ammo: u32,
    pub score: u32,
    pub selected_character: Character,
    pub enemies: Vec<Enemy>,
    pub power_ups: Vec<PowerUp>,
    /// Enemies and power-ups are inactive while this is false.
    pub is_playing: bool,
    /// Next id handed out by the spawners.
    pub next_id: EntityId,
    /// Missions started so far.  Survives `restart`, so every start gets a
    /// new number.
    pub mission: u64,
}

impl GameState {
    pub fn enemy(&self, id: EntityId) -> Option<&Enemy> {
        self.enemies.iter().find(|e| e.id == id)
    }

    pub fn power_up(&self, id: EntityId) -> Option<&PowerUp> {
        self.power_ups.iter().find(|p| p.id == id)
    }

    /// Health ran out and the mission ended.
    pub fn mission_failed(&self) -> bool {
        !self.is_playing && self.health == 0
    }
}
