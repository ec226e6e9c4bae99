//! # Connect Four Duel
//!
//! Connect Four between any mix of humans and a background solver. The core
//! is a single turn state machine that owns the board, folds streamed
//! evaluations from the solver, and picks computer moves by difficulty.
//!
//! ## Modules
//!
//! - [`game`]: Board, players, move application and win detection
//! - [`solver`]: Solver wire protocol, channel seam and a background worker
//! - [`orchestrator`]: Turn state machine, move selector, sessions and reset
//! - [`ui`]: Terminal front-end
//! - [`config`]: TOML configuration loading and validation
//! - [`error`]: Structured error types

pub mod config;
pub mod error;
pub mod game;
pub mod orchestrator;
pub mod solver;
pub mod ui;
