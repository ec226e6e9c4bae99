use std::cmp::Ordering;

use crate::solver::ScoreMap;

/// How a tagged message relates to the position on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    /// About the current position.
    Current,
    /// About a position that has already been played past.
    Stale,
    /// About a position that does not exist yet.
    Ahead,
}

/// The solver's latest view of the current position, refined as updates arrive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EvaluationSnapshot {
    ply: u32,
    scores: ScoreMap,
    depth: u32,
    complete: bool,
}

impl EvaluationSnapshot {
    /// Empty snapshot for the position at `ply`.
    pub fn new(ply: u32) -> Self {
        EvaluationSnapshot {
            ply,
            ..Self::default()
        }
    }

    /// Drop everything and start tracking the position at `ply`.
    pub fn advance(&mut self, ply: u32) {
        *self = Self::new(ply);
    }

    pub fn freshness(&self, ply: u32) -> Freshness {
        match ply.cmp(&self.ply) {
            Ordering::Equal => Freshness::Current,
            Ordering::Less => Freshness::Stale,
            Ordering::Greater => Freshness::Ahead,
        }
    }

    /// Fold a current-position update in key by key. Returns false, leaving
    /// the snapshot untouched, if the update is shallower than what we hold.
    pub fn merge(&mut self, scores: ScoreMap, depth: u32) -> bool {
        if depth < self.depth {
            return false;
        }
        self.depth = depth;
        self.scores.extend(scores);
        true
    }

    pub fn set_complete(&mut self, complete: bool) {
        self.complete = complete;
    }

    pub fn ply(&self) -> u32 {
        self.ply
    }

    pub fn scores(&self) -> &ScoreMap {
        &self.scores
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// The solver has stopped refining this position.
    pub fn is_complete(&self) -> bool {
        self.complete
    }

    pub fn has_scores(&self) -> bool {
        !self.scores.is_empty()
    }
}
