//! The single authoritative copy of the game state.
//!
//! All writers (input handlers and the periodic drivers) go through one
//! mutex, and each transition swaps in a complete new `GameState` while the
//! lock is held, so readers never observe a half-applied change.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::debug;

use crate::compute::{
    collect_power_up, damage_enemy, restart, select_character, start_game, HIT_DAMAGE,
};
use crate::entities::{Character, EntityId, GameState, PowerUpKind};

/// Everything the player can ask the store to do.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Command {
    SelectCharacter(Character),
    StartGame,
    Restart,
    /// The briefing screen's single button: restart after a failed
    /// mission, otherwise start.
    StartOrRestart,
    HitEnemy(EntityId),
    CollectPowerUp(EntityId, PowerUpKind),
}

impl Command {
    /// Pure transition for this command.  Clicks on enemies and power-ups
    /// are ignored unless a mission is in progress.
    pub fn apply(self, state: &GameState) -> GameState {
        match self {
            Command::HitEnemy(_) | Command::CollectPowerUp(..) if !state.is_playing => {
                debug!(command = ?self, "ignored outside a mission");
                state.clone()
            }
            Command::SelectCharacter(character) => select_character(state, character),
            Command::StartGame => start_game(state),
            Command::Restart => restart(state),
            Command::StartOrRestart if state.health == 0 => restart(state),
            Command::StartOrRestart => start_game(state),
            Command::HitEnemy(id) => damage_enemy(state, id, HIT_DAMAGE),
            Command::CollectPowerUp(id, kind) => collect_power_up(state, id, kind),
        }
    }
}

#[derive(Clone, Debug)]
pub struct GameStore {
    inner: Arc<Mutex<GameState>>,
}

impl GameStore {
    pub fn new(state: GameState) -> Self {
        Self {
            inner: Arc::new(Mutex::new(state)),
        }
    }

    // A panic mid-transition never leaves a partial state behind (the new
    // value is only assigned once complete), so a poisoned lock is safe to reuse.
    fn lock(&self) -> MutexGuard<'_, GameState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Copy of the current state for rendering.
    pub fn snapshot(&self) -> GameState {
        self.lock().clone()
    }

    pub fn read<R>(&self, f: impl FnOnce(&GameState) -> R) -> R {
        f(&self.lock())
    }

    /// Replace the state with `f(current)` atomically and return the result.
    pub fn apply(&self, f: impl FnOnce(&GameState) -> GameState) -> GameState {
        let mut guard = self.lock();
        let next = f(&guard);
        *guard = next.clone();
        next
    }

    /// Like [`apply`](Self::apply), but only when `guard` still holds once
    /// the lock is taken.  Returns whether the transition ran.
    pub fn apply_if(
        &self,
        guard: impl FnOnce(&GameState) -> bool,
        f: impl FnOnce(&GameState) -> GameState,
    ) -> bool {
        let mut state = self.lock();
        if !guard(&state) {
            return false;
        }
        let next = f(&state);
        *state = next;
        true
    }

    pub fn dispatch(&self, command: Command) -> GameState {
        debug!(?command, "dispatch");
        self.apply(|state| command.apply(state))
    }
}
