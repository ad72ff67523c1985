//! Session configuration, loaded from TOML.
//!
//! ```toml
//! tick_interval_ms = 50
//!
//! [engine]
//! path = "/usr/local/bin/stockfish"
//! args = []
//! handshake_timeout_ms = 10000
//!
//! [clock]
//! initial_seconds = 600
//! increment_seconds = 0
//! max_tick_step_ms = 1000
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use chess_core::{TimeControl, DEFAULT_MAX_STEP_MS};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uci_engine::{EngineCommand, DEFAULT_HANDSHAKE_TIMEOUT};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub engine: EngineConfig,
    pub clock: ClockConfig,
    /// Period of the background clock driver
    pub tick_interval_ms: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            clock: ClockConfig::default(),
            tick_interval_ms: 50,
        }
    }
}

/// External UCI engine used for computer-controlled sides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Executable to launch. Unset means no engine is available.
    pub path: Option<PathBuf>,
    pub args: Vec<String>,
    pub handshake_timeout_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            path: None,
            args: Vec::new(),
            handshake_timeout_ms: DEFAULT_HANDSHAKE_TIMEOUT.as_millis() as u64,
        }
    }
}

impl EngineConfig {
    /// Launch command, if an engine path is configured.
    pub fn command(&self) -> Option<EngineCommand> {
        let path = self.path.as_ref().filter(|p| !p.as_os_str().is_empty())?;
        Some(
            EngineCommand::new(path.clone())
                .args(self.args.iter().cloned())
                .handshake_timeout(Duration::from_millis(self.handshake_timeout_ms)),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClockConfig {
    pub initial_seconds: u64,
    pub increment_seconds: u64,
    pub max_tick_step_ms: u64,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            initial_seconds: 600,
            increment_seconds: 0,
            max_tick_step_ms: DEFAULT_MAX_STEP_MS,
        }
    }
}

impl SessionConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    pub fn time_control(&self) -> TimeControl {
        TimeControl::new(
            Duration::from_secs(self.clock.initial_seconds),
            Duration::from_secs(self.clock.increment_seconds),
        )
        .with_max_step(self.clock.max_tick_step_ms)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(1))
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod config_tests;
