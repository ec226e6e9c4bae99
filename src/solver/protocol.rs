//! Wire messages between the orchestrator and the background solver.
//!
//! Every message is tagged with `ply`, the move count of the position it
//! describes, so either side can drop messages about an old position.

use std::collections::BTreeMap;

use crate::game::GameStatus;

/// Evaluation of a candidate move, from the point of view of the player to move.
pub type Score = i32;

/// The move loses against best play.
pub const CERTAIN_LOSS: Score = Score::MIN;

/// Base score of a forced win; the distance to the win is subtracted.
pub const WIN_SCORE: Score = 1_000_000;

/// Scores at or above this are proven wins.
pub const WIN_THRESHOLD: Score = WIN_SCORE - 100;

/// Column index to score. Columns without an entry are not evaluated (or illegal).
pub type ScoreMap = BTreeMap<usize, Score>;

/// Orchestrator to solver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SolverRequest {
    /// Discard all solver state and analyse the empty board.
    NewGame,
    /// `column` was played; `ply` is the move count after the move.
    MakeMove { ply: u32, column: usize },
    /// Re-send the best finished evaluation for `ply`.
    RequestUpdate { ply: u32 },
}

/// Solver to orchestrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SolverMessage {
    /// Answer to `MakeMove`. `status` is the solver's view of the new position.
    MoveReply {
        ply: u32,
        column: usize,
        accepted: bool,
        status: GameStatus,
    },
    /// Scores from a completed search depth.
    EvaluationUpdate {
        ply: u32,
        scores: ScoreMap,
        depth: u32,
    },
    /// Whether the solver has stopped refining this position on its own.
    ReadinessUpdate { ply: u32, ready: bool },
}

impl SolverMessage {
    pub fn ply(&self) -> u32 {
        match self {
            SolverMessage::MoveReply { ply, .. }
            | SolverMessage::EvaluationUpdate { ply, .. }
            | SolverMessage::ReadinessUpdate { ply, .. } => *ply,
        }
    }

    /// Short name for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            SolverMessage::MoveReply { .. } => "move reply",
            SolverMessage::EvaluationUpdate { .. } => "evaluation update",
            SolverMessage::ReadinessUpdate { .. } => "readiness update",
        }
    }
}

/// True when `score` is a proven result rather than a heuristic estimate.
pub fn is_decided(score: Score) -> bool {
    score == CERTAIN_LOSS || score >= WIN_THRESHOLD
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ply_tag_is_exposed_for_every_message() {
        let messages = [
            SolverMessage::MoveReply {
                ply: 3,
                column: 1,
                accepted: true,
                status: GameStatus::InProgress,
            },
            SolverMessage::EvaluationUpdate {
                ply: 3,
                scores: ScoreMap::new(),
                depth: 1,
            },
            SolverMessage::ReadinessUpdate {
                ply: 3,
                ready: true,
            },
        ];
        assert!(messages.iter().all(|m| m.ply() == 3));
    }

    #[test]
    fn test_decided_scores() {
        assert!(is_decided(CERTAIN_LOSS));
        assert!(is_decided(WIN_SCORE - 5));
        assert!(!is_decided(0));
        assert!(!is_decided(-4_000));
    }
}
