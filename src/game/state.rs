use super::board::DropError;
use super::{Board, Player, COLS};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameStatus {
    InProgress,
    Won(Player),
    Drawn,
}

impl GameStatus {
    pub fn is_over(self) -> bool {
        self != GameStatus::InProgress
    }
}

/// Where a move landed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub column: usize,
    pub row: usize,
    pub player: Player,
}

/// A move the board refuses. `ColumnFull` and `InvalidColumn` are illegal
/// moves; the board is left untouched in every case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum MoveError {
    #[error("column {0} is full")]
    ColumnFull(usize),
    #[error("column {0} does not exist")]
    InvalidColumn(usize),
    #[error("the game is already over")]
    GameOver,
}

impl From<DropError> for MoveError {
    fn from(err: DropError) -> Self {
        match err {
            DropError::ColumnFull(col) => MoveError::ColumnFull(col),
            DropError::InvalidColumn(col) => MoveError::InvalidColumn(col),
        }
    }
}

/// The logical game: grid, whose turn it is, plies played and the result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoardState {
    board: Board,
    turn: Player,
    move_count: u32,
    status: GameStatus,
}

impl BoardState {
    /// Create initial game state
    pub fn new() -> Self {
        BoardState {
            board: Board::new(),
            turn: Player::One,
            move_count: 0,
            status: GameStatus::InProgress,
        }
    }

    /// Replay a sequence of columns from the empty board.
    pub fn from_moves(columns: &[usize]) -> Result<Self, MoveError> {
        let mut state = Self::new();
        for &col in columns {
            state.apply_move(col)?;
        }
        Ok(state)
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Player to move next
    pub fn turn(&self) -> Player {
        self.turn
    }

    /// Plies played so far
    pub fn move_count(&self) -> u32 {
        self.move_count
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn is_over(&self) -> bool {
        self.status.is_over()
    }

    /// Whether a piece can be dropped in `column` right now
    pub fn is_legal(&self, column: usize) -> bool {
        !self.is_over() && !self.board.is_column_full(column)
    }

    /// Get list of legal columns (not full)
    pub fn legal_columns(&self) -> Vec<usize> {
        (0..COLS).filter(|&col| self.is_legal(col)).collect()
    }

    /// Drop the current player's piece in `column` and advance the turn.
    pub fn apply_move(&mut self, column: usize) -> Result<Placement, MoveError> {
        if self.is_over() {
            return Err(MoveError::GameOver);
        }

        let player = self.turn;
        let row = self.board.drop_piece(column, player.to_cell())?;

        self.move_count += 1;
        self.turn = player.other();
        if self.board.check_win(column, row) {
            self.status = GameStatus::Won(player);
        } else if self.board.is_full() {
            self.status = GameStatus::Drawn;
        }

        Ok(Placement {
            column,
            row,
            player,
        })
    }

    /// Back to the empty board with Player One to move.
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

impl Default for BoardState {
    fn default() -> Self {
        Self::new()
    }
}
