use crate::game::{Board, BoardState, GameStatus, Player, COLS, CONNECT, ROWS};

use super::protocol::{Score, ScoreMap, CERTAIN_LOSS, WIN_SCORE, WIN_THRESHOLD};

/// Column ordering: center-first for better alpha-beta pruning.
const MOVE_ORDER: [usize; COLS] = [3, 2, 4, 1, 5, 0, 6];

const INFINITY: Score = Score::MAX;

/// Why a search stopped before finishing its depth.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Halt {
    /// The interrupt hook asked to stop.
    Interrupted,
    /// The node budget ran out.
    BudgetExhausted,
}

/// Static evaluation of a position from `player`'s point of view.
pub fn heuristic(board: &Board, player: Player) -> Score {
    let own_cell = player.to_cell();
    let opp_cell = player.other().to_cell();
    let mut score = 0;

    for &cell in board.column(COLS / 2) {
        if cell == own_cell {
            score += 3;
        } else if cell == opp_cell {
            score -= 3;
        }
    }

    // Every 4-cell window, as a start cell plus a step.
    let steps: [(isize, isize); 4] = [(1, 0), (0, 1), (1, 1), (1, -1)];
    for col in 0..COLS as isize {
        for row in 0..ROWS as isize {
            for &(dc, dr) in &steps {
                let end_col = col + dc * (CONNECT as isize - 1);
                let end_row = row + dr * (CONNECT as isize - 1);
                if !(0..COLS as isize).contains(&end_col) || !(0..ROWS as isize).contains(&end_row)
                {
                    continue;
                }

                let (mut own, mut opp) = (0, 0);
                for i in 0..CONNECT as isize {
                    match board.get((col + dc * i) as usize, (row + dr * i) as usize) {
                        c if c == own_cell => own += 1,
                        c if c == opp_cell => opp += 1,
                        _ => {}
                    }
                }
                score += score_window(own, opp);
            }
        }
    }

    score
}

fn score_window(own: usize, opp: usize) -> Score {
    match (own, opp) {
        (3, 0) => 50,
        (2, 0) => 10,
        (0, 3) => -80,
        (0, 2) => -10,
        _ => 0,
    }
}

/// Depth-limited negamax with alpha-beta pruning over `BoardState` copies.
pub struct Search<'a> {
    nodes: u64,
    node_limit: u64,
    check_every: u64,
    interrupt: &'a mut dyn FnMut() -> bool,
}

impl<'a> Search<'a> {
    /// `node_limit` caps the nodes this search may visit in total, across
    /// every call to [`Search::score_moves`].
    pub fn new(node_limit: u64, check_every: u64, interrupt: &'a mut dyn FnMut() -> bool) -> Self {
        Search {
            nodes: 0,
            node_limit,
            check_every: check_every.max(1),
            interrupt,
        }
    }

    /// Nodes visited so far
    pub fn nodes(&self) -> u64 {
        self.nodes
    }

    /// Score every legal move of `state` searched to `depth` plies. Proven
    /// losses map to `CERTAIN_LOSS`.
    pub fn score_moves(&mut self, state: &BoardState, depth: u32) -> Result<ScoreMap, Halt> {
        let mut scores = ScoreMap::new();
        for &col in &MOVE_ORDER {
            if !state.is_legal(col) {
                continue;
            }
            let mut next = *state;
            if next.apply_move(col).is_err() {
                continue;
            }
            // Each root move gets a full window so its score is exact.
            let score = -self.negamax(&next, depth.saturating_sub(1), -INFINITY, INFINITY, 1)?;
            scores.insert(col, if score <= -WIN_THRESHOLD { CERTAIN_LOSS } else { score });
        }
        Ok(scores)
    }

    fn negamax(
        &mut self,
        state: &BoardState,
        depth: u32,
        mut alpha: Score,
        beta: Score,
        distance: Score,
    ) -> Result<Score, Halt> {
        self.nodes += 1;
        if self.nodes > self.node_limit {
            return Err(Halt::BudgetExhausted);
        }
        if self.nodes % self.check_every == 0 && (self.interrupt)() {
            return Err(Halt::Interrupted);
        }

        match state.status() {
            // The player who just moved won, so this is a loss for the mover.
            GameStatus::Won(_) => return Ok(-(WIN_SCORE - distance)),
            GameStatus::Drawn => return Ok(0),
            GameStatus::InProgress => {}
        }

        if depth == 0 {
            return Ok(heuristic(state.board(), state.turn()));
        }

        let mut best = -INFINITY;
        for &col in &MOVE_ORDER {
            if !state.is_legal(col) {
                continue;
            }
            let mut next = *state;
            if next.apply_move(col).is_err() {
                continue;
            }
            let score = -self.negamax(&next, depth - 1, -beta, -alpha, distance + 1)?;
            best = best.max(score);
            alpha = alpha.max(score);
            if alpha >= beta {
                break;
            }
        }

        Ok(best)
    }
}
