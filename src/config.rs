use std::path::Path;
use std::time::Duration;

use tracing::warn;

use crate::error::ConfigError;
use crate::game::PlayerKind;
use crate::orchestrator::Difficulty;

/// Longest thinking delay a config or the player may set.
pub const MAX_THINKING_DELAY: Duration = Duration::from_secs(60);

/// Top-level application configuration, loadable from TOML.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub game: GameConfig,
    pub solver: SolverConfig,
}

/// Seats, difficulty and pacing of the turn loop.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Controller of Player One and Player Two.
    pub players: [PlayerKind; 2],
    pub difficulty: Difficulty,
    /// Hold computer moves for at least `thinking_delay_ms`.
    pub delay_enabled: bool,
    pub thinking_delay_ms: u64,
    /// Longest a waiting orchestrator goes without checking for an abort.
    pub poll_interval_ms: u64,
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig {
            players: [PlayerKind::Human, PlayerKind::Computer],
            difficulty: Difficulty::Hard,
            delay_enabled: true,
            thinking_delay_ms: 1500,
            poll_interval_ms: 25,
        }
    }
}

impl GameConfig {
    /// The part of the config that can change while a game is running.
    pub fn settings(&self) -> Settings {
        Settings {
            difficulty: self.difficulty,
            delay_enabled: self.delay_enabled,
            thinking_delay: self.thinking_delay(),
        }
    }

    pub fn thinking_delay(&self) -> Duration {
        Duration::from_millis(self.thinking_delay_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Limits for the background solver.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Deepest search the worker runs for one position.
    pub max_depth: u32,
    /// Nodes the worker may visit for one position before declaring itself ready.
    pub node_budget: u64,
    /// Nodes between checks for a new request during a search.
    pub interrupt_check_nodes: u64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        SolverConfig {
            max_depth: 9,
            node_budget: 4_000_000,
            interrupt_check_nodes: 2048,
        }
    }
}

/// Settings the player can change mid-game.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settings {
    pub difficulty: Difficulty,
    pub delay_enabled: bool,
    pub thinking_delay: Duration,
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config: AppConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the file
    /// does not exist.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            warn!(path = %path.display(), "config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.game.poll_interval_ms == 0 {
            return Err(ConfigError::Validation(
                "game.poll_interval_ms must be > 0".into(),
            ));
        }
        if self.game.thinking_delay() > MAX_THINKING_DELAY {
            return Err(ConfigError::Validation(
                "game.thinking_delay_ms must be <= 60000".into(),
            ));
        }
        if self.solver.max_depth == 0 || self.solver.max_depth > 42 {
            return Err(ConfigError::Validation(
                "solver.max_depth must be in [1, 42]".into(),
            ));
        }
        if self.solver.node_budget == 0 {
            return Err(ConfigError::Validation(
                "solver.node_budget must be > 0".into(),
            ));
        }
        if self.solver.interrupt_check_nodes == 0 {
            return Err(ConfigError::Validation(
                "solver.interrupt_check_nodes must be > 0".into(),
            ));
        }

        Ok(())
    }

    /// Generate a TOML string with all default values (useful for creating
    /// example config files).
    pub fn default_toml() -> String {
        toml::to_string_pretty(&AppConfig::default()).expect("default config serializes")
    }
}
