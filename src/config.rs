use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

use crate::app_dirs::AppDirs;
use crate::scoring::POINTS_PER_CORRECT;
use crate::session::SESSION_SECS;
use crate::variant::GameVariant;

pub const MIN_LEVEL: u8 = 1;
pub const MAX_LEVEL: u8 = 7;

/// Exposure delay per level (1..=7) for the stroop and rock-paper-scissors games.
pub const DEFAULT_EXPOSURE_DELAYS_MS: [u64; 7] = [5000, 3000, 2000, 1500, 1000, 750, 500];

/// How long the mole stays up per level (1..=7).
pub const DEFAULT_MOLE_EXPOSURE_DELAYS_MS: [u64; 7] = [3000, 2500, 2000, 1500, 1000, 800, 600];

pub const DEFAULT_FEEDBACK_DELAY_MS: u64 = 750;

/// Upper bound for any single exposure or feedback delay.
pub const MAX_DELAY_MS: u64 = 60_000;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub variant: GameVariant,
    pub level: u8,
    pub session_secs: u32,
    pub points_per_correct: u32,
    pub feedback_delay_ms: u64,
    pub exposure_delays_ms: Vec<u64>,
    pub mole_exposure_delays_ms: Vec<u64>,
    pub seed: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            variant: GameVariant::WordColor,
            level: MIN_LEVEL,
            session_secs: SESSION_SECS,
            points_per_correct: POINTS_PER_CORRECT,
            feedback_delay_ms: DEFAULT_FEEDBACK_DELAY_MS,
            exposure_delays_ms: DEFAULT_EXPOSURE_DELAYS_MS.to_vec(),
            mole_exposure_delays_ms: DEFAULT_MOLE_EXPOSURE_DELAYS_MS.to_vec(),
            seed: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("level {0} outside 1..=7")]
    LevelOutOfRange(u8),

    #[error("session length {0}s outside 1..=120")]
    SessionLength(u32),

    #[error("{0} delay table is empty")]
    EmptyDelayTable(&'static str),

    #[error("{table} delay table has a zero entry at level {level}")]
    ZeroDelay { table: &'static str, level: usize },

    #[error("{table} delay of {ms}ms at level {level} is longer than 60000ms")]
    DelayTooLong {
        table: &'static str,
        level: usize,
        ms: u64,
    },

    #[error("feedback delay {0}ms outside 1..=60000")]
    FeedbackDelay(u64),

    #[error("points per correct answer must be positive")]
    ZeroPoints,
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(MIN_LEVEL..=MAX_LEVEL).contains(&self.level) {
            return Err(ConfigError::LevelOutOfRange(self.level));
        }
        if self.session_secs == 0 || self.session_secs > SESSION_SECS {
            return Err(ConfigError::SessionLength(self.session_secs));
        }

        for (table, delays) in [
            ("exposure", &self.exposure_delays_ms),
            ("mole exposure", &self.mole_exposure_delays_ms),
        ] {
            if delays.is_empty() {
                return Err(ConfigError::EmptyDelayTable(table));
            }
            if let Some(pos) = delays.iter().position(|&ms| ms == 0) {
                return Err(ConfigError::ZeroDelay {
                    table,
                    level: pos + 1,
                });
            }
            if let Some((pos, &ms)) = delays.iter().find_position(|&&ms| ms > MAX_DELAY_MS) {
                return Err(ConfigError::DelayTooLong {
                    table,
                    level: pos + 1,
                    ms,
                });
            }
        }

        if self.feedback_delay_ms == 0 || self.feedback_delay_ms > MAX_DELAY_MS {
            return Err(ConfigError::FeedbackDelay(self.feedback_delay_ms));
        }
        if self.points_per_correct == 0 {
            return Err(ConfigError::ZeroPoints);
        }

        Ok(())
    }

    /// Exposure delay for `variant` at `level`. Levels past either end of the
    /// table clamp to its first or last entry.
    pub fn exposure_delay(&self, variant: GameVariant, level: u8) -> Duration {
        let table = if variant.is_mole() {
            &self.mole_exposure_delays_ms
        } else {
            &self.exposure_delays_ms
        };

        let slot = (level.max(MIN_LEVEL) - 1) as usize;
        let ms = table
            .get(slot)
            .or_else(|| table.last())
            .copied()
            .unwrap_or(DEFAULT_EXPOSURE_DELAYS_MS[0]);

        Duration::from_millis(ms)
    }
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> std::io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    pub fn new() -> Self {
        let path = AppDirs::config_path().unwrap_or_else(|| PathBuf::from("reflex_config.json"));
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    /// Missing, unreadable or invalid files all yield the defaults.
    fn load(&self) -> Config {
        let Ok(bytes) = fs::read(&self.path) else {
            return Config::default();
        };

        match serde_json::from_slice::<Config>(&bytes) {
            Ok(cfg) => match cfg.validate() {
                Ok(()) => cfg,
                Err(err) => {
                    warn!(path = %self.path.display(), %err, "invalid config, using defaults");
                    Config::default()
                }
            },
            Err(err) => {
                warn!(path = %self.path.display(), %err, "unparseable config, using defaults");
                Config::default()
            }
        }
    }

    fn save(&self, cfg: &Config) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg)?;
        fs::write(&self.path, data)
    }
}
