//! Connect Four board state: the 7x6 grid, players, and move application
//! with win/draw detection.

mod board;
mod player;
mod state;

pub use board::{Board, Cell, DropError, COLS, CONNECT, ROWS};
pub use player::{Player, PlayerKind};
pub use state::{BoardState, GameStatus, MoveError, Placement};
