//! The solver link: wire protocol, the channel seam the orchestrator talks
//! through, and a background worker that streams evaluations.

mod channel;
pub mod protocol;
pub mod search;
mod worker;

pub use channel::{SolverChannel, ThreadedSolver};
pub use protocol::{Score, ScoreMap, SolverMessage, SolverRequest, CERTAIN_LOSS, WIN_SCORE};
pub use worker::run_worker;
