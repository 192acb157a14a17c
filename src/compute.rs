/// Pure game-logic functions.
///
/// Every public function takes an immutable reference to the current
/// `GameState` (and, where needed, an RNG handle) and returns a brand-new
/// `GameState`.  Side effects are limited to the injected RNG.

use glam::Vec3;
use rand::Rng;
use tracing::{debug, info};

use crate::entities::{
    Character, Enemy, EnemyKind, EntityId, GameState, PowerUp, PowerUpEffect, PowerUpKind,
};

// ── Tuning ───────────────────────────────────────────────────────────────────

pub const MAX_HEALTH: u32 = 100;
pub const START_AMMO: u32 = 100;

/// Damage dealt by a single click on an enemy.
pub const HIT_DAMAGE: u32 = 50;
/// Score awarded per enemy destroyed.
pub const ENEMY_REWARD: u32 = 100;

pub const HEALTH_RESTORE: u32 = 25;
pub const AMMO_RESTORE: u32 = 30;
pub const STAR_BONUS: u32 = 500;

pub const ENEMY_CAP: usize = 10;
pub const POWER_UP_CAP: usize = 8;

/// Attrition only bites once more than this many enemies are alive.
pub const ATTRITION_THRESHOLD: usize = 5;
pub const ATTRITION_DAMAGE: u32 = 2;

/// Spawned ids start above the fixed opening roster (1..=7, 101..=105).
pub const FIRST_SPAWN_ID: EntityId = 1000;

// ── Opening roster ───────────────────────────────────────────────────────────

const OPENING_ENEMIES: [(EntityId, [f32; 3], EnemyKind); 7] = [
    (1, [-5.0, 0.0, -5.0], EnemyKind::Goomba),
    (2, [5.0, 0.0, -5.0], EnemyKind::Goomba),
    (3, [0.0, 0.0, -8.0], EnemyKind::Skeleton),
    (4, [-8.0, 0.0, 0.0], EnemyKind::Goomba),
    (5, [8.0, 0.0, 0.0], EnemyKind::Skeleton),
    (6, [-3.0, 0.0, -10.0], EnemyKind::Skeleton),
    (7, [3.0, 0.0, -10.0], EnemyKind::Goomba),
];

const OPENING_POWER_UPS: [(EntityId, [f32; 3], PowerUpKind); 5] = [
    (101, [-6.0, 0.5, 3.0], PowerUpKind::Mushroom),
    (102, [6.0, 0.5, 3.0], PowerUpKind::Ammo),
    (103, [0.0, 0.5, -3.0], PowerUpKind::Star),
    (104, [-10.0, 0.5, -6.0], PowerUpKind::Mushroom),
    (105, [10.0, 0.5, -6.0], PowerUpKind::Ammo),
];

/// Kinds the power-up spawner draws from (uniformly).
const SPAWNABLE_POWER_UPS: [PowerUpKind; 3] =
    [PowerUpKind::Mushroom, PowerUpKind::Ammo, PowerUpKind::Star];

fn opening_enemies() -> Vec<Enemy> {
    OPENING_ENEMIES
        .iter()
        .map(|&(id, pos, kind)| Enemy {
            id,
            position: Vec3::from_array(pos),
            health: kind.max_health(),
            kind,
        })
        .collect()
}

fn opening_power_ups() -> Vec<PowerUp> {
    OPENING_POWER_UPS
        .iter()
        .map(|&(id, pos, kind)| PowerUp {
            id,
            position: Vec3::from_array(pos),
            kind,
        })
        .collect()
}

// ── Constructors ─────────────────────────────────────────────────────────────

/// Build the state the application boots into: full health, empty arena,
/// waiting on the briefing screen.
pub fn init_state(character: Character) -> GameState {
    GameState {
        health: MAX_HEALTH,
        ammo: START_AMMO,
        score: 0,
        selected_character: character,
        enemies: Vec::new(),
        power_ups: Vec::new(),
        is_playing: false,
        next_id: FIRST_SPAWN_ID,
        mission: 0,
    }
}

// ── Menu transitions ─────────────────────────────────────────────────────────

/// Populate the arena with the opening roster and begin play.
/// Health, ammo and score carry over from the current state.
pub fn start_game(state: &GameState) -> GameState {
    info!(character = ?state.selected_character, mission = state.mission + 1, "mission started");
    GameState {
        enemies: opening_enemies(),
        power_ups: opening_power_ups(),
        is_playing: true,
        mission: state.mission + 1,
        ..state.clone()
    }
}

/// Reset everything except the chosen operative.  The id allocator and the
/// mission counter keep counting: spawned ids stay unique across missions
/// and every start gets a new mission number.
pub fn restart(state: &GameState) -> GameState {
    info!("mission reset");
    GameState {
        next_id: state.next_id,
        mission: state.mission,
        ..init_state(state.selected_character)
    }
}

pub fn select_character(state: &GameState, character: Character) -> GameState {
    GameState {
        selected_character: character,
        ..state.clone()
    }
}

// ── Click-driven transitions ─────────────────────────────────────────────────

/// Apply `amount` damage to enemy `id`.  The enemy is removed and the reward
/// paid the first time its health reaches zero; later hits on the same id
/// find nothing and change nothing.
pub fn damage_enemy(state: &GameState, id: EntityId, amount: u32) -> GameState {
    let Some(target) = state.enemy(id) else {
        return state.clone();
    };

    let remaining = target.health.saturating_sub(amount);
    if remaining == 0 {
        debug!(id, "enemy destroyed");
        let enemies = state
            .enemies
            .iter()
            .filter(|e| e.id != id)
            .cloned()
            .collect();
        GameState {
            enemies,
            score: state.score.saturating_add(ENEMY_REWARD),
            ..state.clone()
        }
    } else {
        debug!(id, remaining, "enemy hit");
        let enemies = state
            .enemies
            .iter()
            .map(|e| {
                if e.id == id {
                    Enemy { health: remaining, ..e.clone() }
                } else {
                    e.clone()
                }
            })
            .collect();
        GameState {
            enemies,
            ..state.clone()
        }
    }
}

/// Pick up power-up `id` and apply the effect of `kind`.  Collecting an id
/// that is already gone is a no-op, so the effect lands at most once.
pub fn collect_power_up(state: &GameState, id: EntityId, kind: PowerUpKind) -> GameState {
    if state.power_up(id).is_none() {
        return state.clone();
    }

    let power_ups = state
        .power_ups
        .iter()
        .filter(|p| p.id != id)
        .cloned()
        .collect();
    let collected = GameState {
        power_ups,
        ..state.clone()
    };

    debug!(id, ?kind, "power-up collected");
    match kind.effect() {
        Some(PowerUpEffect::RestoreHealth) => GameState {
            health: (collected.health + HEALTH_RESTORE).min(MAX_HEALTH),
            ..collected
        },
        Some(PowerUpEffect::RestoreAmmo) => GameState {
            ammo: collected.ammo.saturating_add(AMMO_RESTORE),
            ..collected
        },
        Some(PowerUpEffect::BonusScore) => GameState {
            score: collected.score.saturating_add(STAR_BONUS),
            ..collected
        },
        None => collected,
    }
}

// ── Timer-driven transitions (RNG is injected) ───────────────────────────────

/// Add one random enemy unless `cap` enemies are already alive.
pub fn spawn_enemy_if_under_cap(state: &GameState, cap: usize, rng: &mut impl Rng) -> GameState {
    if state.enemies.len() >= cap {
        return state.clone();
    }

    let position = Vec3::new(rng.gen_range(-10.0..=10.0), 0.0, rng.gen_range(-15.0..=-5.0));
    let kind = if rng.gen_bool(0.5) {
        EnemyKind::Goomba
    } else {
        EnemyKind::Skeleton
    };
    let id = state.next_id;
    debug!(id, ?kind, "enemy spawned");

    let mut enemies = state.enemies.clone();
    enemies.push(Enemy {
        id,
        position,
        health: kind.max_health(),
        kind,
    });
    GameState {
        enemies,
        next_id: id + 1,
        ..state.clone()
    }
}

/// Add one random power-up unless `cap` are already on the field.
pub fn spawn_power_up_if_under_cap(
    state: &GameState,
    cap: usize,
    rng: &mut impl Rng,
) -> GameState {
    if state.power_ups.len() >= cap {
        return state.clone();
    }

    let position = Vec3::new(rng.gen_range(-8.0..=8.0), 0.5, rng.gen_range(-8.0..=8.0));
    let kind = SPAWNABLE_POWER_UPS[rng.gen_range(0..SPAWNABLE_POWER_UPS.len())];
    let id = state.next_id;
    debug!(id, ?kind, "power-up spawned");

    let mut power_ups = state.power_ups.clone();
    power_ups.push(PowerUp { id, position, kind });
    GameState {
        power_ups,
        next_id: id + 1,
        ..state.clone()
    }
}

/// Passive damage while the arena is crowded.  Ends the mission when
/// health runs out.
pub fn tick_attrition(state: &GameState) -> GameState {
    if state.enemies.len() <= ATTRITION_THRESHOLD || state.health == 0 {
        return state.clone();
    }

    let health = state.health.saturating_sub(ATTRITION_DAMAGE);
    if health == 0 {
        info!(score = state.score, "mission failed");
    }
    GameState {
        health,
        is_playing: state.is_playing && health > 0,
        ..state.clone()
    }
}
