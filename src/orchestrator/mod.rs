//! Move orchestration: the turn state machine and the pieces it leans on.

mod abort;
mod evaluation;
mod machine;
pub mod selector;
mod session;
mod visual;

pub use abort::AbortToken;
pub use evaluation::{EvaluationSnapshot, Freshness};
pub use machine::{Exit, Input, Orchestrator, TurnStage, UiEvent};
pub use selector::{select, Difficulty};
pub use session::GameHost;
pub use visual::{ChannelVisual, VisualAdapter, VisualCommand};
