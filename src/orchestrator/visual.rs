use std::sync::mpsc::Sender;

use crate::game::{GameStatus, Placement, Player};
use crate::solver::ScoreMap;

/// Commands from the orchestrator to whatever draws the game.
///
/// `animate_drop` starts an animation; the adapter reports its end by sending
/// `UiEvent::AnimationFinished` with the same `ply` back to the session.
pub trait VisualAdapter: Send {
    fn enable_input(&mut self);
    fn disable_input(&mut self);
    fn animate_drop(&mut self, placement: Placement, ply: u32);
    fn show_thinking(&mut self, player: Player);
    fn hide_thinking(&mut self);
    fn show_game_over(&mut self, status: GameStatus);
    fn update_evaluation(&mut self, scores: &ScoreMap, depth: u32);
    fn show_fatal_error(&mut self, message: &str);
}

/// One adapter call, tagged with the session that issued it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VisualCommand {
    /// A new session started; everything from older sessions is void.
    NewSession { session: u64 },
    EnableInput { session: u64 },
    DisableInput { session: u64 },
    AnimateDrop {
        session: u64,
        placement: Placement,
        ply: u32,
    },
    ShowThinking { session: u64, player: Player },
    HideThinking { session: u64 },
    ShowGameOver { session: u64, status: GameStatus },
    UpdateEvaluation {
        session: u64,
        scores: ScoreMap,
        depth: u32,
    },
    ShowFatalError { session: u64, message: String },
}

impl VisualCommand {
    pub fn session(&self) -> u64 {
        match self {
            VisualCommand::NewSession { session }
            | VisualCommand::EnableInput { session }
            | VisualCommand::DisableInput { session }
            | VisualCommand::AnimateDrop { session, .. }
            | VisualCommand::ShowThinking { session, .. }
            | VisualCommand::HideThinking { session }
            | VisualCommand::ShowGameOver { session, .. }
            | VisualCommand::UpdateEvaluation { session, .. }
            | VisualCommand::ShowFatalError { session, .. } => *session,
        }
    }
}

/// Adapter that forwards every call as a `VisualCommand` over a channel.
/// A front-end that has gone away is not an error for the game.
pub struct ChannelVisual {
    session: u64,
    tx: Sender<VisualCommand>,
}

impl ChannelVisual {
    pub fn new(session: u64, tx: Sender<VisualCommand>) -> Self {
        ChannelVisual { session, tx }
    }

    fn emit(&self, command: VisualCommand) {
        let _ = self.tx.send(command);
    }
}

impl VisualAdapter for ChannelVisual {
    fn enable_input(&mut self) {
        self.emit(VisualCommand::EnableInput {
            session: self.session,
        });
    }

    fn disable_input(&mut self) {
        self.emit(VisualCommand::DisableInput {
            session: self.session,
        });
    }

    fn animate_drop(&mut self, placement: Placement, ply: u32) {
        self.emit(VisualCommand::AnimateDrop {
            session: self.session,
            placement,
            ply,
        });
    }

    fn show_thinking(&mut self, player: Player) {
        self.emit(VisualCommand::ShowThinking {
            session: self.session,
            player,
        });
    }

    fn hide_thinking(&mut self) {
        self.emit(VisualCommand::HideThinking {
            session: self.session,
        });
    }

    fn show_game_over(&mut self, status: GameStatus) {
        self.emit(VisualCommand::ShowGameOver {
            session: self.session,
            status,
        });
    }

    fn update_evaluation(&mut self, scores: &ScoreMap, depth: u32) {
        self.emit(VisualCommand::UpdateEvaluation {
            session: self.session,
            scores: scores.clone(),
            depth,
        });
    }

    fn show_fatal_error(&mut self, message: &str) {
        self.emit(VisualCommand::ShowFatalError {
            session: self.session,
            message: message.to_string(),
        });
    }
}
