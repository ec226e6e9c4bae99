pub const ROWS: usize = 6;
pub const COLS: usize = 7;

/// Pieces in a line needed to win
pub const CONNECT: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cell {
    Empty,
    PlayerOne,
    PlayerTwo,
}

/// Column-major grid. Row 0 is the bottom of each column, and a column's
/// pieces always form a contiguous run `0..heights[col]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Board {
    columns: [[Cell; ROWS]; COLS],
    heights: [usize; COLS],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DropError {
    #[error("column {0} is full")]
    ColumnFull(usize),
    #[error("column {0} is out of range")]
    InvalidColumn(usize),
}

/// Line directions through a cell as (column step, row step).
const AXES: [(isize, isize); 4] = [(1, 0), (0, 1), (1, 1), (1, -1)];

impl Board {
    /// Create a new empty board
    pub fn new() -> Self {
        Board {
            columns: [[Cell::Empty; ROWS]; COLS],
            heights: [0; COLS],
        }
    }

    /// Get the cell at a position, row 0 being the bottom
    pub fn get(&self, col: usize, row: usize) -> Cell {
        self.columns[col][row]
    }

    /// Occupied cells of a column, bottom to top
    pub fn column(&self, col: usize) -> &[Cell] {
        &self.columns[col][..self.heights[col]]
    }

    /// Number of pieces in a column
    pub fn height(&self, col: usize) -> usize {
        self.heights[col]
    }

    /// Check if a column is full. Out-of-range columns count as full.
    pub fn is_column_full(&self, col: usize) -> bool {
        col >= COLS || self.heights[col] == ROWS
    }

    /// Check if the board is completely full
    pub fn is_full(&self) -> bool {
        (0..COLS).all(|col| self.is_column_full(col))
    }

    /// Total number of pieces on the board
    pub fn occupied(&self) -> usize {
        self.heights.iter().sum()
    }

    /// Drop a piece in a column, returns the row where it landed
    pub fn drop_piece(&mut self, col: usize, cell: Cell) -> Result<usize, DropError> {
        if col >= COLS {
            return Err(DropError::InvalidColumn(col));
        }
        let row = self.heights[col];
        if row == ROWS {
            return Err(DropError::ColumnFull(col));
        }

        self.columns[col][row] = cell;
        self.heights[col] += 1;
        Ok(row)
    }

    /// Check if the piece at (col, row) is part of a line of `CONNECT`
    pub fn check_win(&self, col: usize, row: usize) -> bool {
        let cell = self.get(col, row);
        if cell == Cell::Empty {
            return false;
        }

        AXES.iter().any(|&(dc, dr)| {
            1 + self.run_length(col, row, dc, dr, cell) + self.run_length(col, row, -dc, -dr, cell)
                >= CONNECT
        })
    }

    /// Count matching cells walking away from (col, row), excluding the start
    fn run_length(&self, col: usize, row: usize, dc: isize, dr: isize, cell: Cell) -> usize {
        let mut count = 0;
        let mut c = col as isize + dc;
        let mut r = row as isize + dr;
        while (0..COLS as isize).contains(&c)
            && (0..ROWS as isize).contains(&r)
            && self.columns[c as usize][r as usize] == cell
        {
            count += 1;
            c += dc;
            r += dr;
        }
        count
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}
