//! Difficulty-weighted choice of the computer's move.

use rand::Rng;

use crate::error::SelectorError;
use crate::game::COLS;
use crate::solver::{Score, ScoreMap, CERTAIN_LOSS};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

/// How a difficulty turns a ranked candidate list into a draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Policy {
    /// `pool_sizes[n - 1]`: how many of the best moves to draw from when
    /// `n` candidates are not certain losses.
    pub pool_sizes: [usize; COLS],
    /// Always take the best move, even in a lost position.
    pub deterministic: bool,
}

const EASY: Policy = Policy {
    pool_sizes: [1, 2, 3, 4, 5, 6, 7],
    deterministic: false,
};

const MEDIUM: Policy = Policy {
    pool_sizes: [1, 1, 2, 2, 3, 3, 4],
    deterministic: false,
};

const HARD: Policy = Policy {
    pool_sizes: [1; COLS],
    deterministic: true,
};

impl Difficulty {
    pub fn policy(self) -> &'static Policy {
        match self {
            Difficulty::Easy => &EASY,
            Difficulty::Medium => &MEDIUM,
            Difficulty::Hard => &HARD,
        }
    }

    /// Cycle Easy -> Medium -> Hard -> Easy.
    pub fn next(self) -> Difficulty {
        match self {
            Difficulty::Easy => Difficulty::Medium,
            Difficulty::Medium => Difficulty::Hard,
            Difficulty::Hard => Difficulty::Easy,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
        }
    }
}

impl Policy {
    /// Number of top-ranked candidates to draw from.
    fn pool_size(&self, ranked: &[(usize, Score)]) -> usize {
        if self.deterministic {
            return 1;
        }
        let non_losing = ranked.iter().filter(|(_, score)| *score > CERTAIN_LOSS).count();
        if non_losing == 0 {
            // Every move loses; any of them will do.
            return ranked.len();
        }
        self.pool_sizes[non_losing.min(COLS) - 1].clamp(1, non_losing)
    }
}

/// Candidates sorted best first. Equal scores keep ascending column order.
pub fn rank(scores: &ScoreMap) -> Vec<(usize, Score)> {
    let mut ranked: Vec<(usize, Score)> = scores.iter().map(|(&col, &score)| (col, score)).collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    ranked
}

/// Pick a column from `scores` according to `difficulty`.
pub fn select<R: Rng + ?Sized>(
    scores: &ScoreMap,
    difficulty: Difficulty,
    rng: &mut R,
) -> Result<usize, SelectorError> {
    let ranked = rank(scores);
    if ranked.is_empty() {
        return Err(SelectorError::NoCandidates);
    }

    let pool = difficulty.policy().pool_size(&ranked);
    let pick = if pool > 1 { rng.random_range(0..pool) } else { 0 };
    Ok(ranked[pick].0)
}
