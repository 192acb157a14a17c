//! Periodic drivers: enemy spawner, power-up spawner and attrition.
//!
//! Each driver is a thread ticking on its own period and applying one
//! transition to the shared store per tick.  The set only runs while a
//! mission is in progress; `Drivers::sync` starts and stops it as the
//! `is_playing` flag changes, and restarts it when a new mission begins.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{bounded, select, tick, Receiver, Sender};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info, warn};

use crate::compute::{
    spawn_enemy_if_under_cap, spawn_power_up_if_under_cap, tick_attrition, ENEMY_CAP,
    POWER_UP_CAP,
};
use crate::config::TimerConfig;
use crate::entities::GameState;
use crate::store::GameStore;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DriverKind {
    EnemySpawner,
    PowerUpSpawner,
    Attrition,
}

impl DriverKind {
    pub const ALL: [DriverKind; 3] = [
        DriverKind::EnemySpawner,
        DriverKind::PowerUpSpawner,
        DriverKind::Attrition,
    ];

    pub fn period(self, timers: &TimerConfig) -> Duration {
        let ms = match self {
            DriverKind::EnemySpawner => timers.enemy_spawn_ms,
            DriverKind::PowerUpSpawner => timers.power_up_spawn_ms,
            DriverKind::Attrition => timers.attrition_ms,
        };
        Duration::from_millis(ms)
    }

    fn thread_name(self) -> &'static str {
        match self {
            DriverKind::EnemySpawner => "enemy-spawner",
            DriverKind::PowerUpSpawner => "power-up-spawner",
            DriverKind::Attrition => "attrition",
        }
    }
}

/// The transition a driver applies on one tick.  Does nothing unless a
/// mission is in progress.
pub fn fire(kind: DriverKind, state: &GameState, rng: &mut impl Rng) -> GameState {
    if !state.is_playing {
        return state.clone();
    }
    match kind {
        DriverKind::EnemySpawner => spawn_enemy_if_under_cap(state, ENEMY_CAP, rng),
        DriverKind::PowerUpSpawner => spawn_power_up_if_under_cap(state, POWER_UP_CAP, rng),
        DriverKind::Attrition => tick_attrition(state),
    }
}

// ── Running set ──────────────────────────────────────────────────────────────

struct Running {
    mission: u64,
    cancelled: Arc<AtomicBool>,
    /// Dropping this wakes every driver thread.
    stop_tx: Sender<()>,
    handles: Vec<JoinHandle<()>>,
}

pub struct Drivers {
    store: GameStore,
    timers: TimerConfig,
    seed: Option<u64>,
    starts: u64,
    running: Option<Running>,
}

impl Drivers {
    /// `seed` makes the spawners reproducible; `None` draws from entropy.
    pub fn new(store: GameStore, timers: TimerConfig, seed: Option<u64>) -> Self {
        Self {
            store,
            timers,
            seed,
            starts: 0,
            running: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }

    /// Mission the running set was started for.
    pub fn mission(&self) -> Option<u64> {
        self.running.as_ref().map(|r| r.mission)
    }

    /// Bring the driver set in line with `state`.  A mission that ended and
    /// began again since the last sync gets a fresh set.
    pub fn sync(&mut self, state: &GameState) {
        match (state.is_playing, self.mission()) {
            (true, None) => self.start(),
            (true, Some(mission)) if mission != state.mission => {
                debug!(from = mission, to = state.mission, "new mission, restarting drivers");
                self.stop();
                self.start();
            }
            (false, Some(_)) => self.stop(),
            _ => {}
        }
    }

    /// Start all three drivers for the store's current mission.  No-op if
    /// they are already running.
    pub fn start(&mut self) {
        if self.running.is_some() {
            return;
        }

        let mission = self.store.read(|s| s.mission);
        let cancelled = Arc::new(AtomicBool::new(false));
        let (stop_tx, stop_rx) = bounded::<()>(0);
        let mut handles = Vec::with_capacity(DriverKind::ALL.len());

        for (index, kind) in DriverKind::ALL.into_iter().enumerate() {
            let rng = match self.seed {
                Some(seed) => StdRng::seed_from_u64(
                    seed.wrapping_add(self.starts * DriverKind::ALL.len() as u64 + index as u64),
                ),
                None => StdRng::from_entropy(),
            };
            let worker = DriverWorker {
                kind,
                period: kind.period(&self.timers),
                store: self.store.clone(),
                cancelled: Arc::clone(&cancelled),
                stop_rx: stop_rx.clone(),
                rng,
            };
            match thread::Builder::new()
                .name(kind.thread_name().to_string())
                .spawn(move || worker.run())
            {
                Ok(handle) => handles.push(handle),
                Err(e) => warn!(?kind, error = %e, "failed to spawn driver thread"),
            }
        }

        self.starts += 1;
        info!(drivers = handles.len(), mission, "drivers started");
        self.running = Some(Running {
            mission,
            cancelled,
            stop_tx,
            handles,
        });
    }

    /// Stop all drivers.  Once this returns no driver will touch the store
    /// again; a tick already holding the store lock is allowed to finish.
    pub fn stop(&mut self) {
        let Some(running) = self.running.take() else {
            return;
        };

        running.cancelled.store(true, Ordering::SeqCst);
        drop(running.stop_tx);
        for handle in running.handles {
            if handle.join().is_err() {
                warn!("driver thread panicked");
            }
        }
        info!("drivers stopped");
    }
}

impl Drop for Drivers {
    fn drop(&mut self) {
        self.stop();
    }
}

// ── Worker thread ────────────────────────────────────────────────────────────

struct DriverWorker {
    kind: DriverKind,
    period: Duration,
    store: GameStore,
    cancelled: Arc<AtomicBool>,
    stop_rx: Receiver<()>,
    rng: StdRng,
}

impl DriverWorker {
    fn run(mut self) {
        let ticker = tick(self.period);
        loop {
            select! {
                recv(self.stop_rx) -> _ => break,
                recv(ticker) -> _ => {
                    let kind = self.kind;
                    let cancelled = &self.cancelled;
                    let rng = &mut self.rng;
                    let applied = self.store.apply_if(
                        |state| state.is_playing && !cancelled.load(Ordering::SeqCst),
                        |state| fire(kind, state, rng),
                    );
                    if !applied {
                        debug!(?kind, "tick skipped");
                    }
                }
            }
        }
    }
}
