use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("default_lives must be at least 1")]
    ZeroDefaultLives,
    #[error("default_lives ({default_lives}) exceeds max_lives ({max_lives})")]
    DefaultLivesExceedsMax { default_lives: u32, max_lives: u32 },
    #[error("default_time_limit_secs must be a positive, finite number (got {0})")]
    BadTimeLimit(f64),
}

/// The numeric tunables governing a play session.
///
/// Read-only for the duration of a session; the engine takes a copy at start
/// and never consults the store again.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    pub default_lives: u32,
    pub max_lives: u32,
    pub base_score: u32,
    pub clear_bonus: u32,
    pub time_bonus_multiplier: u32,
    pub default_time_limit_secs: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_lives: 3,
            max_lives: 5,
            base_score: 10,
            clear_bonus: 50,
            time_bonus_multiplier: 2,
            default_time_limit_secs: 60.0,
        }
    }
}

impl Config {
    /// Fail-fast check run at session start; a session is never created from
    /// a config that does not pass.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_lives == 0 {
            return Err(ConfigError::ZeroDefaultLives);
        }
        if self.default_lives > self.max_lives {
            return Err(ConfigError::DefaultLivesExceedsMax {
                default_lives: self.default_lives,
                max_lives: self.max_lives,
            });
        }
        if !self.default_time_limit_secs.is_finite() || self.default_time_limit_secs <= 0.0 {
            return Err(ConfigError::BadTimeLimit(self.default_time_limit_secs));
        }
        Ok(())
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
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        let path = if let Some(pd) = ProjectDirs::from("", "", "snag") {
            pd.config_dir().join("config.json")
        } else {
            PathBuf::from("snag_config.json")
        };
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Config {
        if let Ok(bytes) = fs::read(&self.path) {
            if let Ok(cfg) = serde_json::from_slice::<Config>(&bytes) {
                return cfg;
            }
        }
        Config::default()
    }

    fn save(&self, cfg: &Config) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg).unwrap_or_default();
        fs::write(&self.path, data)
    }
}
