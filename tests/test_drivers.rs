use std::thread;
use std::time::{Duration, Instant};

use combat_zone::compute::{init_state, start_game, ENEMY_CAP};
use combat_zone::config::TimerConfig;
use combat_zone::drivers::{fire, DriverKind, Drivers};
use combat_zone::entities::*;
use combat_zone::store::{Command, GameStore};

use rand::rngs::StdRng;
use rand::SeedableRng;

fn fast_timers() -> TimerConfig {
    TimerConfig {
        enemy_spawn_ms: 5,
        power_up_spawn_ms: 5,
        attrition_ms: 5,
    }
}

fn seeded_rng() -> StdRng {
    StdRng::seed_from_u64(7)
}

// ── fire ──────────────────────────────────────────────────────────────────────

#[test]
fn default_periods() {
    let t = TimerConfig::default();
    assert_eq!(DriverKind::EnemySpawner.period(&t), Duration::from_secs(5));
    assert_eq!(DriverKind::PowerUpSpawner.period(&t), Duration::from_secs(8));
    assert_eq!(DriverKind::Attrition.period(&t), Duration::from_secs(1));
}

#[test]
fn fire_does_nothing_when_not_playing() {
    let mut rng = seeded_rng();
    let mut s = init_state(Character::Mario);
    s.enemies = (1..=6)
        .map(|id| Enemy { id, position: glam::Vec3::ZERO, health: 100, kind: EnemyKind::Goomba })
        .collect();
    for kind in DriverKind::ALL {
        assert_eq!(fire(kind, &s, &mut rng), s);
    }
}

#[test]
fn fire_applies_matching_transition() {
    let mut rng = seeded_rng();
    let s = start_game(&init_state(Character::Mario));

    let spawned = fire(DriverKind::EnemySpawner, &s, &mut rng);
    assert_eq!(spawned.enemies.len(), 8);

    let spawned = fire(DriverKind::PowerUpSpawner, &s, &mut rng);
    assert_eq!(spawned.power_ups.len(), 6);

    // 7 enemies alive → attrition bites
    let drained = fire(DriverKind::Attrition, &s, &mut rng);
    assert_eq!(drained.health, 98);
}

// ── Threaded lifecycle ────────────────────────────────────────────────────────

/// Poll `cond` until it holds or `timeout` runs out.
fn wait_until(timeout: Duration, mut cond: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        thread::sleep(Duration::from_millis(2));
    }
    cond()
}

const PATIENCE: Duration = Duration::from_secs(5);

#[test]
fn sync_starts_and_stops() {
    let store = GameStore::new(init_state(Character::Mario));
    let mut drivers = Drivers::new(store.clone(), fast_timers(), Some(1));

    drivers.sync(&store.snapshot());
    assert!(!drivers.is_running());

    store.dispatch(Command::StartGame);
    drivers.sync(&store.snapshot());
    assert!(drivers.is_running());
    assert_eq!(drivers.mission(), Some(1));

    // Repeated syncs never double-start
    drivers.sync(&store.snapshot());
    drivers.start();
    assert!(drivers.is_running());
    assert_eq!(drivers.mission(), Some(1));

    store.apply(|s| GameState { is_playing: false, ..s.clone() });
    drivers.sync(&store.snapshot());
    assert!(!drivers.is_running());
    assert_eq!(drivers.mission(), None);
}

#[test]
fn drivers_mutate_while_playing() {
    let store = GameStore::new(init_state(Character::Mario));
    store.dispatch(Command::StartGame);
    let mut drivers = Drivers::new(store.clone(), fast_timers(), Some(2));
    drivers.start();

    let filled = wait_until(PATIENCE, || {
        store.read(|s| s.enemies.len() == ENEMY_CAP && s.health < 100)
    });
    drivers.stop();
    assert!(filled);
}

#[test]
fn no_mutation_after_stop() {
    let store = GameStore::new(init_state(Character::Mario));
    let started = store.dispatch(Command::StartGame);
    let mut drivers = Drivers::new(store.clone(), fast_timers(), Some(3));
    drivers.start();
    assert!(wait_until(PATIENCE, || store.snapshot() != started));
    drivers.stop();

    let frozen = store.snapshot();
    thread::sleep(Duration::from_millis(100));
    assert_eq!(store.snapshot(), frozen);
}

#[test]
fn mission_failure_halts_mutation() {
    let store = GameStore::new(init_state(Character::Mario));
    store.dispatch(Command::StartGame);
    store.apply(|s| GameState { health: 4, ..s.clone() });

    let mut drivers = Drivers::new(store.clone(), fast_timers(), Some(4));
    drivers.start();
    assert!(wait_until(PATIENCE, || store.read(|s| s.mission_failed())));

    // Attrition ended the mission; nothing else may change even though the
    // threads have not been stopped yet.
    let s = store.snapshot();
    thread::sleep(Duration::from_millis(50));
    assert_eq!(store.snapshot(), s);

    drivers.sync(&s);
    assert!(!drivers.is_running());
}

#[test]
fn drop_stops_drivers() {
    let store = GameStore::new(init_state(Character::Mario));
    let started = store.dispatch(Command::StartGame);
    {
        let mut drivers = Drivers::new(store.clone(), fast_timers(), Some(5));
        drivers.start();
        assert!(wait_until(PATIENCE, || store.snapshot() != started));
    }
    let frozen = store.snapshot();
    thread::sleep(Duration::from_millis(60));
    assert_eq!(store.snapshot(), frozen);
}

#[test]
fn restart_between_missions() {
    let store = GameStore::new(init_state(Character::Lara));
    let mut drivers = Drivers::new(store.clone(), fast_timers(), Some(6));

    store.dispatch(Command::StartGame);
    drivers.sync(&store.snapshot());
    thread::sleep(Duration::from_millis(20));

    store.dispatch(Command::Restart);
    drivers.sync(&store.snapshot());
    assert!(!drivers.is_running());
    let s = store.snapshot();
    assert!(s.enemies.is_empty());
    assert_eq!(s.selected_character, Character::Lara);

    store.dispatch(Command::StartGame);
    drivers.sync(&store.snapshot());
    assert!(drivers.is_running());
    assert_eq!(drivers.mission(), Some(2));
}

#[test]
fn restart_and_start_in_one_frame_gets_fresh_drivers() {
    let store = GameStore::new(init_state(Character::Mario));
    let mut drivers = Drivers::new(store.clone(), fast_timers(), Some(7));

    store.dispatch(Command::StartGame);
    drivers.sync(&store.snapshot());
    assert_eq!(drivers.mission(), Some(1));

    // Both keys drained before the next sync: the flag never reads false
    store.dispatch(Command::Restart);
    store.dispatch(Command::StartGame);
    drivers.sync(&store.snapshot());
    assert!(drivers.is_running());
    assert_eq!(drivers.mission(), Some(2));
}
