use std::sync::mpsc::{self, Sender};
use std::thread::{self, JoinHandle};

use tracing::{debug, info, warn};

use crate::config::{AppConfig, Settings};
use crate::error::SessionError;
use crate::game::PlayerKind;
use crate::solver::ThreadedSolver;

use super::abort::AbortToken;
use super::machine::{Exit, Input, Orchestrator, UiEvent};
use super::visual::{ChannelVisual, VisualCommand};

/// One running game: a driver thread plus the handles to reach and stop it.
struct Session {
    id: u64,
    inbox: Sender<Input>,
    abort: AbortToken,
    driver: JoinHandle<()>,
}

/// Owns the current game session and replaces it on reset.
///
/// UI events go through the host so that input meant for a discarded session
/// never reaches the new one.
pub struct GameHost {
    config: AppConfig,
    settings: Settings,
    visual_tx: Sender<VisualCommand>,
    session: Option<Session>,
    next_id: u64,
}

impl GameHost {
    /// Start the first session. Visual commands for every session go to `visual_tx`.
    pub fn start(config: AppConfig, visual_tx: Sender<VisualCommand>) -> Result<Self, SessionError> {
        let settings = config.game.settings();
        let mut host = GameHost {
            config,
            settings,
            visual_tx,
            session: None,
            next_id: 1,
        };
        host.reset()?;
        Ok(host)
    }

    pub fn current_session(&self) -> Option<u64> {
        self.session.as_ref().map(|session| session.id)
    }

    pub fn settings(&self) -> Settings {
        self.settings
    }

    pub fn players(&self) -> [PlayerKind; 2] {
        self.config.game.players
    }

    /// Seat new controllers. Takes a fresh game; returns its session id.
    pub fn set_players(&mut self, players: [PlayerKind; 2]) -> Result<u64, SessionError> {
        info!(?players, "seats changed");
        self.config.game.players = players;
        self.reset()
    }

    pub fn column_clicked(&self, column: usize) {
        self.forward(UiEvent::ColumnClicked(column));
    }

    /// Apply to the running game and to every later one.
    pub fn settings_changed(&mut self, settings: Settings) {
        self.settings = settings;
        self.forward(UiEvent::SettingsChanged(settings));
    }

    /// A drop animation landed. Ignored unless it belongs to the current session.
    pub fn animation_finished(&self, session: u64, ply: u32) {
        if self.current_session() != Some(session) {
            debug!(session, ply, "ignoring animation from a discarded session");
            return;
        }
        self.forward(UiEvent::AnimationFinished { ply });
    }

    /// Throw the current game away and start a fresh one. Returns the new
    /// session id.
    pub fn reset(&mut self) -> Result<u64, SessionError> {
        self.stop();

        let id = self.next_id;
        self.next_id += 1;

        let (inbox, rx) = mpsc::channel();
        let solver = ThreadedSolver::spawn(&self.config.solver, inbox.clone())?;
        let abort = AbortToken::new();
        let _ = self.visual_tx.send(VisualCommand::NewSession { session: id });
        let visual = ChannelVisual::new(id, self.visual_tx.clone());
        let mut orchestrator = Orchestrator::new(&self.config.game, rx, visual, solver, abort.clone())
            .with_settings(self.settings);

        let driver = thread::Builder::new()
            .name("orchestrator".to_string())
            .spawn(move || {
                // Fatal errors are logged and shown by the orchestrator itself.
                if let Ok(Exit::Finished(status)) = orchestrator.run() {
                    info!(session = id, ?status, "session finished");
                }
            })
            .map_err(|source| SessionError::Spawn {
                what: "orchestrator",
                source,
            })?;

        info!(session = id, "session started");
        self.session = Some(Session {
            id,
            inbox,
            abort,
            driver,
        });
        Ok(id)
    }

    fn forward(&self, event: UiEvent) {
        let Some(session) = &self.session else {
            return;
        };
        if session.inbox.send(Input::Ui(event)).is_err() {
            debug!(session = session.id, ?event, "session no longer listening");
        }
    }

    /// Abort the running session and wait for its threads.
    fn stop(&mut self) {
        let Some(session) = self.session.take() else {
            return;
        };
        session.abort.abort();
        drop(session.inbox);
        if session.driver.join().is_err() {
            warn!(session = session.id, "orchestrator thread panicked");
        }
        debug!(session = session.id, "session stopped");
    }
}

impl Drop for GameHost {
    fn drop(&mut self) {
        self.stop();
    }
}
