use std::path::PathBuf;

use crate::game::MoveError;

/// Errors that end the current game session. None of these are retried; the
/// user has to reset.
#[derive(Debug, thiserror::Error)]
pub enum OrchestratorError {
    #[error("illegal move reached the board in column {column}: {source}")]
    IllegalMove {
        column: usize,
        #[source]
        source: MoveError,
    },

    #[error("solver channel failure: {0}")]
    ChannelFailure(#[from] ChannelError),

    #[error("computer turn reached at ply {ply} with no evaluation data")]
    SelectorPrecondition { ply: u32 },

    #[error("solver disagrees with move {column} at ply {ply}")]
    SolverDesync { ply: u32, column: usize },
}

/// Failures of the link to the background solver.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("solver request channel is closed")]
    Closed,

    #[error("orchestrator inbox has no remaining senders")]
    InboxClosed,

    #[error("failed to spawn solver worker: {0}")]
    Spawn(#[source] std::io::Error),
}

/// A solver message that cannot belong to the current position. Never
/// propagated: the message is dropped and this is logged.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind} tagged for ply {received_ply} while the board is at ply {current_ply}")]
pub struct ProtocolViolation {
    pub kind: &'static str,
    pub received_ply: u32,
    pub current_ply: u32,
}

/// Errors from the move selector.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SelectorError {
    #[error("no candidate moves in the evaluation")]
    NoCandidates,
}

/// Errors while starting or replacing a game session.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("failed to spawn {what} thread: {source}")]
    Spawn {
        what: &'static str,
        source: std::io::Error,
    },

    #[error(transparent)]
    Channel(#[from] ChannelError),
}

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("config validation error: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_illegal_move_display() {
        let err = OrchestratorError::IllegalMove {
            column: 4,
            source: MoveError::ColumnFull(4),
        };
        assert_eq!(
            err.to_string(),
            "illegal move reached the board in column 4: column 4 is full"
        );
    }

    #[test]
    fn test_channel_failure_wraps_channel_error() {
        let err: OrchestratorError = ChannelError::Closed.into();
        assert_eq!(
            err.to_string(),
            "solver channel failure: solver request channel is closed"
        );
    }

    #[test]
    fn test_protocol_violation_display() {
        let violation = ProtocolViolation {
            kind: "evaluation update",
            received_ply: 9,
            current_ply: 7,
        };
        assert_eq!(
            violation.to_string(),
            "evaluation update tagged for ply 9 while the board is at ply 7"
        );
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::Validation("game.poll_interval_ms must be > 0".to_string());
        assert_eq!(
            err.to_string(),
            "config validation error: game.poll_interval_ms must be > 0"
        );
    }
}
