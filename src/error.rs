use std::path::PathBuf;

use thiserror::Error;

/// Setup-time failures. Gameplay itself never errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("board width {width} is narrower than the widest piece ({min})")]
    BoardTooNarrow { width: usize, min: usize },
    #[error("board height {height} is shorter than the tallest piece ({min})")]
    BoardTooShort { height: usize, min: usize },
    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },
    #[error("minimum drop interval {minimum}ms exceeds initial interval {initial}ms")]
    FloorAboveInitial { minimum: u64, initial: u64 },
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}
