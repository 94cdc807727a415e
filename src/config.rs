use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::catalog::MAX_SHAPE_SIZE;
use crate::error::ConfigError;

// ============================================================================
// Defaults
// ============================================================================

pub const DEFAULT_BOARD_WIDTH: usize = 12;
pub const DEFAULT_BOARD_HEIGHT: usize = 20;

// Timing (in milliseconds)
pub const DEFAULT_INITIAL_DROP_INTERVAL_MS: u64 = 1000;
pub const DEFAULT_LEVEL_SPEED_INCREMENT_MS: u64 = 100;
pub const DEFAULT_MINIMUM_DROP_INTERVAL_MS: u64 = 100;
pub const DEFAULT_LINES_PER_LEVEL: u32 = 10;

// Power-ups
pub const DEFAULT_SLOW_TIME_FACTOR: u64 = 2;
pub const DEFAULT_SLOW_TIME_DURATION_MS: u64 = 10_000;

/// Environment variable consulted when no `--config` path is given.
pub const CONFIG_ENV_VAR: &str = "POWERTRIS_CONFIG";

// ============================================================================
// GameConfig
// ============================================================================

/// Tunables for one session. Every key is optional in TOML.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GameConfig {
    pub board_width: usize,
    pub board_height: usize,
    pub initial_drop_interval_ms: u64,
    pub level_speed_increment_ms: u64,
    pub minimum_drop_interval_ms: u64,
    pub lines_per_level: u32,
    pub power_ups_enabled: bool,
    /// Drop interval multiplier while time-slow is running.
    pub slow_time_factor: u64,
    pub slow_time_duration_ms: u64,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            board_width: DEFAULT_BOARD_WIDTH,
            board_height: DEFAULT_BOARD_HEIGHT,
            initial_drop_interval_ms: DEFAULT_INITIAL_DROP_INTERVAL_MS,
            level_speed_increment_ms: DEFAULT_LEVEL_SPEED_INCREMENT_MS,
            minimum_drop_interval_ms: DEFAULT_MINIMUM_DROP_INTERVAL_MS,
            lines_per_level: DEFAULT_LINES_PER_LEVEL,
            power_ups_enabled: true,
            slow_time_factor: DEFAULT_SLOW_TIME_FACTOR,
            slow_time_duration_ms: DEFAULT_SLOW_TIME_DURATION_MS,
        }
    }
}

impl GameConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: GameConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&text)?;
        tracing::info!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Loads from `explicit`, else from `$POWERTRIS_CONFIG`, else defaults.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        match explicit.map(Path::to_path_buf).or_else(config_path_from_env) {
            Some(path) => Self::load(&path),
            None => Ok(Self::default()),
        }
    }

    /// Rejects configurations that could never produce a playable board.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.board_width < MAX_SHAPE_SIZE {
            return Err(ConfigError::BoardTooNarrow {
                width: self.board_width,
                min: MAX_SHAPE_SIZE,
            });
        }
        if self.board_height < MAX_SHAPE_SIZE {
            return Err(ConfigError::BoardTooShort {
                height: self.board_height,
                min: MAX_SHAPE_SIZE,
            });
        }
        if self.initial_drop_interval_ms == 0 {
            return Err(ConfigError::Zero { field: "initial_drop_interval_ms" });
        }
        if self.minimum_drop_interval_ms == 0 {
            return Err(ConfigError::Zero { field: "minimum_drop_interval_ms" });
        }
        if self.minimum_drop_interval_ms > self.initial_drop_interval_ms {
            return Err(ConfigError::FloorAboveInitial {
                minimum: self.minimum_drop_interval_ms,
                initial: self.initial_drop_interval_ms,
            });
        }
        if self.lines_per_level == 0 {
            return Err(ConfigError::Zero { field: "lines_per_level" });
        }
        if self.slow_time_factor == 0 {
            return Err(ConfigError::Zero { field: "slow_time_factor" });
        }
        Ok(())
    }
}

pub fn config_path_from_env() -> Option<PathBuf> {
    std::env::var_os(CONFIG_ENV_VAR)
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
}
