//! Runtime configuration, read from an optional TOML file.
//!
//! ```toml
//! frame_ms = 33
//! character = "lara"
//! seed = 7
//!
//! [timers]
//! enemy_spawn_ms = 5000
//! power_up_spawn_ms = 8000
//! attrition_ms = 1000
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::entities::Character;
use crate::error::GameError;

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct TimerConfig {
    pub enemy_spawn_ms: u64,
    pub power_up_spawn_ms: u64,
    pub attrition_ms: u64,
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            enemy_spawn_ms: 5000,
            power_up_spawn_ms: 8000,
            attrition_ms: 1000,
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct GameConfig {
    /// Target frame time (≈30 FPS by default).
    pub frame_ms: u64,
    pub timers: TimerConfig,
    /// Seed for the spawners.  Random when unset.
    pub seed: Option<u64>,
    /// Operative selected at boot.
    pub character: Character,
    /// Where to write logs.  Logging is off when unset.
    pub log_file: Option<PathBuf>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            frame_ms: 33,
            timers: TimerConfig::default(),
            seed: None,
            character: Character::Mario,
            log_file: None,
        }
    }
}

impl GameConfig {
    pub fn from_toml_str(text: &str, path: &Path) -> Result<Self, GameError> {
        toml::from_str(text).map_err(|source| GameError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, GameError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| GameError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text, path)
    }

    /// Non-fatal problems worth logging.
    pub fn validate(&self) -> Vec<String> {
        let mut w = Vec::new();
        if self.frame_ms == 0 {
            w.push("frame_ms is 0; the loop will spin without sleeping".into());
        }
        if self.frame_ms > 200 {
            w.push(format!("frame_ms {} gives under 5 FPS", self.frame_ms));
        }
        for (name, ms) in [
            ("enemy_spawn_ms", self.timers.enemy_spawn_ms),
            ("power_up_spawn_ms", self.timers.power_up_spawn_ms),
            ("attrition_ms", self.timers.attrition_ms),
        ] {
            if ms == 0 {
                w.push(format!("timers.{name} must be > 0"));
            }
        }
        w
    }

    /// Reject configs the drivers cannot run with.
    pub fn into_valid(self) -> Result<Self, GameError> {
        let t = &self.timers;
        if t.enemy_spawn_ms == 0 || t.power_up_spawn_ms == 0 || t.attrition_ms == 0 {
            return Err(GameError::InvalidConfig(
                "timer periods must be greater than zero".into(),
            ));
        }
        Ok(self)
    }
}
