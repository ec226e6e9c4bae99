//! The turn loop: one state machine that owns the board and serializes moves
//! between a human at the keyboard and the background solver.

use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, error, info, warn};

use crate::config::{GameConfig, Settings};
use crate::error::{ChannelError, OrchestratorError, ProtocolViolation};
use crate::game::{BoardState, GameStatus, PlayerKind};
use crate::solver::{SolverChannel, SolverMessage, SolverRequest};

use super::abort::AbortToken;
use super::evaluation::{EvaluationSnapshot, Freshness};
use super::selector;
use super::visual::VisualAdapter;

/// Everything the driver can wake up for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Ui(UiEvent),
    Solver(SolverMessage),
}

impl From<SolverMessage> for Input {
    fn from(message: SolverMessage) -> Self {
        Input::Solver(message)
    }
}

impl From<UiEvent> for Input {
    fn from(event: UiEvent) -> Self {
        Input::Ui(event)
    }
}

/// Events from the visual layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiEvent {
    ColumnClicked(usize),
    SettingsChanged(Settings),
    /// The drop animation for the move that produced `ply` has landed.
    AnimationFinished { ply: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnStage {
    AwaitingTurn,
    AwaitingHumanInput,
    AwaitingSolverReadiness {
        since: Instant,
        /// A `RequestUpdate` has gone out for this turn.
        nudged: bool,
    },
    ApplyingMove {
        column: usize,
    },
    GameOver(GameStatus),
}

/// How a session ended without error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exit {
    Finished(GameStatus),
    Aborted,
}

/// Result of one wait on the inbox.
enum Wake {
    Input(Input),
    Idle,
    Aborted,
}

pub struct Orchestrator<V: VisualAdapter, S: SolverChannel> {
    state: BoardState,
    evaluation: EvaluationSnapshot,
    stage: TurnStage,
    /// Column of the last move applied, checked against the solver's reply.
    last_move: Option<usize>,
    players: [PlayerKind; 2],
    settings: Settings,
    poll_interval: Duration,
    inbox: Receiver<Input>,
    visual: V,
    solver: S,
    abort: AbortToken,
    rng: StdRng,
}

impl<V: VisualAdapter, S: SolverChannel> Orchestrator<V, S> {
    pub fn new(
        config: &GameConfig,
        inbox: Receiver<Input>,
        visual: V,
        solver: S,
        abort: AbortToken,
    ) -> Self {
        Orchestrator {
            state: BoardState::new(),
            evaluation: EvaluationSnapshot::new(0),
            stage: TurnStage::AwaitingTurn,
            last_move: None,
            players: config.players,
            settings: config.settings(),
            poll_interval: config.poll_interval(),
            inbox,
            visual,
            solver,
            abort,
            rng: StdRng::from_os_rng(),
        }
    }

    /// Start from `settings` instead of the configured ones.
    pub fn with_settings(mut self, settings: Settings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = rng;
        self
    }

    pub fn state(&self) -> &BoardState {
        &self.state
    }

    pub fn stage(&self) -> TurnStage {
        self.stage
    }

    pub fn evaluation(&self) -> &EvaluationSnapshot {
        &self.evaluation
    }

    /// Drive the game until it ends, the session is aborted, or something
    /// fatal happens. Fatal errors are shown on the visual layer before they
    /// are returned.
    pub fn run(&mut self) -> Result<Exit, OrchestratorError> {
        let result = self.drive();
        if let Err(err) = &result {
            error!(error = %err, ply = self.state.move_count(), "session halted");
            self.visual.hide_thinking();
            self.visual.disable_input();
            self.visual.show_fatal_error(&err.to_string());
        }
        result
    }

    fn drive(&mut self) -> Result<Exit, OrchestratorError> {
        info!(players = ?self.players, difficulty = self.settings.difficulty.name(), "game started");
        self.solver.send(SolverRequest::NewGame)?;

        loop {
            if self.abort.is_aborted() {
                return Ok(self.aborted());
            }
            let next = match self.stage {
                TurnStage::AwaitingTurn => Some(self.begin_turn()),
                TurnStage::AwaitingHumanInput => self.await_human()?,
                TurnStage::AwaitingSolverReadiness { since, nudged } => {
                    self.await_solver(since, nudged)?
                }
                TurnStage::ApplyingMove { column } => self.apply(column)?,
                TurnStage::GameOver(status) => return Ok(Exit::Finished(status)),
            };
            match next {
                Some(stage) => self.stage = stage,
                None => return Ok(self.aborted()),
            }
        }
    }

    fn aborted(&self) -> Exit {
        info!(ply = self.state.move_count(), "session aborted");
        Exit::Aborted
    }

    fn begin_turn(&mut self) -> TurnStage {
        let status = self.state.status();
        if status.is_over() {
            info!(?status, plies = self.state.move_count(), "game over");
            self.visual.disable_input();
            self.visual.show_game_over(status);
            return TurnStage::GameOver(status);
        }

        let player = self.state.turn();
        match self.players[player.index()] {
            PlayerKind::Human => {
                debug!(ply = self.state.move_count(), player = player.name(), "waiting for human");
                self.visual.enable_input();
                TurnStage::AwaitingHumanInput
            }
            PlayerKind::Computer => {
                debug!(ply = self.state.move_count(), player = player.name(), "waiting for solver");
                self.visual.disable_input();
                self.visual.show_thinking(player);
                TurnStage::AwaitingSolverReadiness {
                    since: Instant::now(),
                    nudged: false,
                }
            }
        }
    }

    fn await_human(&mut self) -> Result<Option<TurnStage>, OrchestratorError> {
        loop {
            let input = match self.pump()? {
                Wake::Aborted => return Ok(None),
                Wake::Idle => continue,
                Wake::Input(input) => input,
            };
            if let Some(UiEvent::ColumnClicked(column)) = self.absorb(input)? {
                if self.state.is_legal(column) {
                    self.visual.disable_input();
                    return Ok(Some(TurnStage::ApplyingMove { column }));
                }
                debug!(column, "ignoring click on unplayable column");
            }
        }
    }

    fn await_solver(
        &mut self,
        since: Instant,
        mut nudged: bool,
    ) -> Result<Option<TurnStage>, OrchestratorError> {
        loop {
            let delay_over =
                !self.settings.delay_enabled || since.elapsed() >= self.settings.thinking_delay;
            let informed = self.evaluation.is_complete() || self.evaluation.has_scores();
            if delay_over && informed {
                let column = self.choose()?;
                self.visual.hide_thinking();
                return Ok(Some(TurnStage::ApplyingMove { column }));
            }
            if self.settings.delay_enabled && delay_over && !nudged {
                let ply = self.state.move_count();
                debug!(ply, "thinking delay over, asking solver for its best evaluation");
                self.solver.send(SolverRequest::RequestUpdate { ply })?;
                nudged = true;
                self.stage = TurnStage::AwaitingSolverReadiness { since, nudged };
            }

            match self.pump()? {
                Wake::Aborted => return Ok(None),
                Wake::Idle => {}
                Wake::Input(input) => {
                    // Nothing from the UI moves a computer turn along.
                    self.absorb(input)?;
                }
            }
        }
    }

    fn choose(&mut self) -> Result<usize, OrchestratorError> {
        let ply = self.state.move_count();
        let column = selector::select(
            self.evaluation.scores(),
            self.settings.difficulty,
            &mut self.rng,
        )
        .map_err(|_| OrchestratorError::SelectorPrecondition { ply })?;
        debug!(
            ply,
            column,
            depth = self.evaluation.depth(),
            difficulty = self.settings.difficulty.name(),
            "computer chose a move"
        );
        Ok(column)
    }

    fn apply(&mut self, column: usize) -> Result<Option<TurnStage>, OrchestratorError> {
        let placement = self
            .state
            .apply_move(column)
            .map_err(|source| OrchestratorError::IllegalMove { column, source })?;
        let ply = self.state.move_count();
        self.last_move = Some(column);
        self.evaluation.advance(ply);
        info!(ply, column, row = placement.row, player = placement.player.name(), "move applied");

        self.solver.send(SolverRequest::MakeMove { ply, column })?;
        self.visual.animate_drop(placement, ply);

        loop {
            let input = match self.pump()? {
                Wake::Aborted => return Ok(None),
                Wake::Idle => continue,
                Wake::Input(input) => input,
            };
            if let Some(UiEvent::AnimationFinished { ply: landed }) = self.absorb(input)? {
                if landed == ply {
                    return Ok(Some(TurnStage::AwaitingTurn));
                }
                debug!(landed, ply, "ignoring animation for another move");
            }
        }
    }

    /// Wait up to one poll interval for input. The abort token is checked on
    /// every wake, before anything is handed back.
    fn pump(&mut self) -> Result<Wake, OrchestratorError> {
        let wake = match self.inbox.recv_timeout(self.poll_interval) {
            Ok(input) => Wake::Input(input),
            Err(RecvTimeoutError::Timeout) => Wake::Idle,
            Err(RecvTimeoutError::Disconnected) => {
                if self.abort.is_aborted() {
                    return Ok(Wake::Aborted);
                }
                return Err(ChannelError::InboxClosed.into());
            }
        };
        if self.abort.is_aborted() {
            return Ok(Wake::Aborted);
        }
        Ok(wake)
    }

    /// Handle whatever any stage handles the same way. UI events that only
    /// mean something to the current stage are handed back.
    fn absorb(&mut self, input: Input) -> Result<Option<UiEvent>, OrchestratorError> {
        match input {
            Input::Solver(message) => {
                self.fold(message)?;
                Ok(None)
            }
            Input::Ui(UiEvent::SettingsChanged(settings)) => {
                info!(
                    difficulty = settings.difficulty.name(),
                    delay_enabled = settings.delay_enabled,
                    delay_ms = settings.thinking_delay.as_millis() as u64,
                    "settings changed"
                );
                self.settings = settings;
                Ok(None)
            }
            Input::Ui(event) => Ok(Some(event)),
        }
    }

    fn fold(&mut self, message: SolverMessage) -> Result<(), OrchestratorError> {
        let current = self.state.move_count();
        match self.evaluation.freshness(message.ply()) {
            Freshness::Current => {}
            Freshness::Stale => {
                debug!(kind = message.kind(), ply = message.ply(), current, "discarding stale solver message");
                return Ok(());
            }
            Freshness::Ahead => {
                let violation = ProtocolViolation {
                    kind: message.kind(),
                    received_ply: message.ply(),
                    current_ply: current,
                };
                warn!(%violation, "discarding solver message");
                return Ok(());
            }
        }

        match message {
            SolverMessage::MoveReply {
                ply,
                column,
                accepted,
                status,
            } => {
                if !accepted || self.last_move != Some(column) || status != self.state.status() {
                    warn!(ply, column, accepted, ?status, local = ?self.state.status(), "solver reply does not match the board");
                    return Err(OrchestratorError::SolverDesync { ply, column });
                }
                debug!(ply, column, "solver confirmed move");
            }
            SolverMessage::EvaluationUpdate { ply, scores, depth } => {
                let held = self.evaluation.depth();
                if self.evaluation.merge(scores, depth) {
                    debug!(ply, depth, "evaluation updated");
                    self.visual
                        .update_evaluation(self.evaluation.scores(), self.evaluation.depth());
                } else {
                    debug!(ply, depth, held, "discarding shallower evaluation");
                }
            }
            SolverMessage::ReadinessUpdate { ply, ready } => {
                debug!(ply, ready, "solver readiness");
                self.evaluation.set_complete(ready);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SolverConfig;
    use crate::game::{Placement, Player};
    use crate::orchestrator::visual::VisualCommand;
    use crate::orchestrator::Difficulty;
    use crate::solver::{ScoreMap, ThreadedSolver};
    use std::sync::mpsc::{self, Sender};
    use std::sync::{Arc, Mutex};
    use std::thread::{self, JoinHandle};

    const TIMEOUT: Duration = Duration::from_secs(10);

    /// Records every call and lands drop animations straight away.
    struct FakeVisual {
        log: Sender<VisualCommand>,
        inbox: Sender<Input>,
    }

    impl FakeVisual {
        fn record(&self, command: VisualCommand) {
            let _ = self.log.send(command);
        }
    }

    impl VisualAdapter for FakeVisual {
        fn enable_input(&mut self) {
            self.record(VisualCommand::EnableInput { session: 0 });
        }

        fn disable_input(&mut self) {
            self.record(VisualCommand::DisableInput { session: 0 });
        }

        fn animate_drop(&mut self, placement: Placement, ply: u32) {
            self.record(VisualCommand::AnimateDrop {
                session: 0,
                placement,
                ply,
            });
            let _ = self.inbox.send(Input::Ui(UiEvent::AnimationFinished { ply }));
        }

        fn show_thinking(&mut self, player: Player) {
            self.record(VisualCommand::ShowThinking { session: 0, player });
        }

        fn hide_thinking(&mut self) {
            self.record(VisualCommand::HideThinking { session: 0 });
        }

        fn show_game_over(&mut self, status: GameStatus) {
            self.record(VisualCommand::ShowGameOver { session: 0, status });
        }

        fn update_evaluation(&mut self, scores: &ScoreMap, depth: u32) {
            self.record(VisualCommand::UpdateEvaluation {
                session: 0,
                scores: scores.clone(),
                depth,
            });
        }

        fn show_fatal_error(&mut self, message: &str) {
            self.record(VisualCommand::ShowFatalError {
                session: 0,
                message: message.to_string(),
            });
        }
    }

    #[derive(Clone, Default)]
    struct FakeSolver {
        sent: Arc<Mutex<Vec<SolverRequest>>>,
        broken: bool,
    }

    impl FakeSolver {
        fn sent(&self) -> Vec<SolverRequest> {
            self.sent.lock().unwrap().clone()
        }
    }

    impl SolverChannel for FakeSolver {
        fn send(&mut self, request: SolverRequest) -> Result<(), ChannelError> {
            if self.broken {
                return Err(ChannelError::Closed);
            }
            self.sent.lock().unwrap().push(request);
            Ok(())
        }
    }

    struct Harness {
        inbox: Sender<Input>,
        visual: Receiver<VisualCommand>,
        solver: FakeSolver,
        abort: AbortToken,
        driver: JoinHandle<(Result<Exit, OrchestratorError>, BoardState)>,
    }

    fn game_config(players: [PlayerKind; 2], delay_ms: Option<u64>) -> GameConfig {
        GameConfig {
            players,
            difficulty: Difficulty::Hard,
            delay_enabled: delay_ms.is_some(),
            thinking_delay_ms: delay_ms.unwrap_or(0),
            poll_interval_ms: 5,
        }
    }

    fn start_with(config: GameConfig, solver: FakeSolver) -> Harness {
        let (inbox, rx) = mpsc::channel();
        let (log, visual) = mpsc::channel();
        let abort = AbortToken::new();
        let fake_visual = FakeVisual {
            log,
            inbox: inbox.clone(),
        };
        let mut orchestrator =
            Orchestrator::new(&config, rx, fake_visual, solver.clone(), abort.clone())
                .with_rng(StdRng::seed_from_u64(11));
        let driver = thread::spawn(move || {
            let result = orchestrator.run();
            (result, *orchestrator.state())
        });
        Harness {
            inbox,
            visual,
            solver,
            abort,
            driver,
        }
    }

    fn start(players: [PlayerKind; 2], delay_ms: Option<u64>) -> Harness {
        start_with(game_config(players, delay_ms), FakeSolver::default())
    }

    impl Harness {
        /// Block until the orchestrator issues a command matching `pred`.
        fn wait_for(&self, pred: impl Fn(&VisualCommand) -> bool) -> VisualCommand {
            loop {
                let command = self
                    .visual
                    .recv_timeout(TIMEOUT)
                    .expect("orchestrator went quiet");
                if pred(&command) {
                    return command;
                }
            }
        }

        fn click(&self, column: usize) {
            self.wait_for(|c| matches!(c, VisualCommand::EnableInput { .. }));
            self.send(Input::Ui(UiEvent::ColumnClicked(column)));
        }

        fn send(&self, input: Input) {
            self.inbox.send(input).unwrap();
        }

        fn evaluation(&self, ply: u32, pairs: &[(usize, i32)], depth: u32) {
            self.send(Input::Solver(SolverMessage::EvaluationUpdate {
                ply,
                scores: pairs.iter().copied().collect(),
                depth,
            }));
        }

        fn finish(self) -> (Result<Exit, OrchestratorError>, BoardState, Vec<SolverRequest>) {
            let (result, state) = self.driver.join().unwrap();
            (result, state, self.solver.sent())
        }

        fn abort_and_finish(self) -> (Result<Exit, OrchestratorError>, BoardState, Vec<SolverRequest>) {
            self.abort.abort();
            self.finish()
        }
    }

    fn dropped_in(command: &VisualCommand) -> Option<(usize, u32)> {
        match command {
            VisualCommand::AnimateDrop { placement, ply, .. } => Some((placement.column, *ply)),
            _ => None,
        }
    }

    #[test]
    fn human_four_in_column_three_wins() {
        let harness = start([PlayerKind::Human, PlayerKind::Human], None);
        for column in [3, 0, 3, 1, 3, 0, 3] {
            harness.click(column);
        }
        harness.wait_for(|c| {
            matches!(
                c,
                VisualCommand::ShowGameOver {
                    status: GameStatus::Won(Player::One),
                    ..
                }
            )
        });

        let (result, state, sent) = harness.finish();
        assert!(matches!(result, Ok(Exit::Finished(GameStatus::Won(Player::One)))));
        assert_eq!(state.move_count(), 7);
        assert_eq!(sent[0], SolverRequest::NewGame);
        assert_eq!(sent[1], SolverRequest::MakeMove { ply: 1, column: 3 });
        assert_eq!(sent.last(), Some(&SolverRequest::MakeMove { ply: 7, column: 3 }));
    }

    #[test]
    fn click_on_full_column_is_ignored() {
        let harness = start([PlayerKind::Human, PlayerKind::Human], None);
        for _ in 0..6 {
            harness.click(0);
        }
        harness.click(0);
        harness.send(Input::Ui(UiEvent::ColumnClicked(1)));
        let landed = harness.wait_for(|c| dropped_in(c).is_some());
        assert_eq!(dropped_in(&landed), Some((1, 7)));

        let (result, state, _) = harness.abort_and_finish();
        assert!(matches!(result, Ok(Exit::Aborted)));
        assert_eq!(state.board().height(0), 6);
        assert_eq!(state.board().height(1), 1);
    }

    #[test]
    fn abort_during_human_wait_changes_nothing() {
        let harness = start([PlayerKind::Human, PlayerKind::Human], None);
        harness.wait_for(|c| matches!(c, VisualCommand::EnableInput { .. }));
        harness.abort.abort();
        harness.send(Input::Ui(UiEvent::ColumnClicked(3)));

        let (result, state, sent) = harness.finish();
        assert!(matches!(result, Ok(Exit::Aborted)));
        assert_eq!(state, BoardState::new());
        assert_eq!(sent, vec![SolverRequest::NewGame]);
    }

    #[test]
    fn abort_during_solver_wait_changes_nothing() {
        let harness = start([PlayerKind::Computer, PlayerKind::Human], None);
        harness.wait_for(|c| matches!(c, VisualCommand::ShowThinking { .. }));
        harness.abort.abort();
        harness.evaluation(0, &[(3, 10)], 1);

        let (result, state, sent) = harness.finish();
        assert!(matches!(result, Ok(Exit::Aborted)));
        assert_eq!(state.move_count(), 0);
        assert_eq!(sent, vec![SolverRequest::NewGame]);
    }

    #[test]
    fn computer_moves_on_first_evaluation_without_delay() {
        let harness = start([PlayerKind::Computer, PlayerKind::Human], None);
        harness.wait_for(|c| matches!(c, VisualCommand::ShowThinking { .. }));
        harness.evaluation(0, &[(2, 5), (3, 40), (4, 40)], 1);

        harness.wait_for(|c| matches!(c, VisualCommand::HideThinking { .. }));
        let landed = harness.wait_for(|c| dropped_in(c).is_some());
        assert_eq!(dropped_in(&landed), Some((3, 1)));
        harness.wait_for(|c| matches!(c, VisualCommand::EnableInput { .. }));

        let (result, state, sent) = harness.abort_and_finish();
        assert!(matches!(result, Ok(Exit::Aborted)));
        assert_eq!(state.move_count(), 1);
        assert_eq!(
            sent,
            vec![
                SolverRequest::NewGame,
                SolverRequest::MakeMove { ply: 1, column: 3 }
            ]
        );
    }

    #[test]
    fn thinking_delay_holds_the_move() {
        let started = Instant::now();
        let harness = start([PlayerKind::Computer, PlayerKind::Human], Some(80));
        harness.evaluation(0, &[(5, 1)], 1);

        let landed = harness.wait_for(|c| dropped_in(c).is_some());
        assert_eq!(dropped_in(&landed), Some((5, 1)));
        assert!(started.elapsed() >= Duration::from_millis(80));

        let (_, _, sent) = harness.abort_and_finish();
        assert!(!sent.contains(&SolverRequest::RequestUpdate { ply: 0 }));
    }

    #[test]
    fn slow_solver_is_asked_for_an_update_once() {
        let harness = start([PlayerKind::Computer, PlayerKind::Human], Some(20));
        let deadline = Instant::now() + TIMEOUT;
        while !harness.solver.sent().contains(&SolverRequest::RequestUpdate { ply: 0 }) {
            assert!(Instant::now() < deadline, "no update requested");
            thread::sleep(Duration::from_millis(5));
        }
        thread::sleep(Duration::from_millis(50));
        harness.evaluation(0, &[(6, 3)], 2);

        let landed = harness.wait_for(|c| dropped_in(c).is_some());
        assert_eq!(dropped_in(&landed), Some((6, 1)));

        let (_, _, sent) = harness.abort_and_finish();
        let nudges = sent
            .iter()
            .filter(|r| matches!(r, SolverRequest::RequestUpdate { .. }))
            .count();
        assert_eq!(nudges, 1);
    }

    #[test]
    fn settings_change_applies_to_the_pending_turn() {
        let harness = start([PlayerKind::Computer, PlayerKind::Human], Some(60_000));
        harness.wait_for(|c| matches!(c, VisualCommand::ShowThinking { .. }));
        harness.evaluation(0, &[(1, 7), (4, 9)], 1);
        harness.send(Input::Ui(UiEvent::SettingsChanged(Settings {
            difficulty: Difficulty::Hard,
            delay_enabled: false,
            thinking_delay: Duration::from_secs(60),
        })));

        let landed = harness.wait_for(|c| dropped_in(c).is_some());
        assert_eq!(dropped_in(&landed), Some((4, 1)));
        harness.abort_and_finish();
    }

    #[test]
    fn shorter_delay_applies_to_the_pending_turn() {
        let harness = start([PlayerKind::Computer, PlayerKind::Human], Some(60_000));
        harness.wait_for(|c| matches!(c, VisualCommand::ShowThinking { .. }));
        harness.evaluation(0, &[(2, 1)], 1);
        harness.send(Input::Ui(UiEvent::SettingsChanged(Settings {
            difficulty: Difficulty::Hard,
            delay_enabled: true,
            thinking_delay: Duration::from_millis(10),
        })));

        let landed = harness.wait_for(|c| dropped_in(c).is_some());
        assert_eq!(dropped_in(&landed), Some((2, 1)));
        harness.abort_and_finish();
    }

    #[test]
    fn stale_and_early_evaluations_are_discarded() {
        let harness = start([PlayerKind::Human, PlayerKind::Computer], Some(50));
        harness.click(3);
        harness.wait_for(|c| matches!(c, VisualCommand::ShowThinking { .. }));

        // Pre-move position, a position that does not exist yet, then the real one.
        harness.evaluation(0, &[(0, 100)], 6);
        harness.evaluation(2, &[(1, 100)], 6);
        harness.evaluation(1, &[(5, 10)], 3);
        // Shallower than what is held: dropped as well.
        harness.evaluation(1, &[(6, 99)], 2);

        let landed = harness.wait_for(|c| dropped_in(c).is_some());
        assert_eq!(dropped_in(&landed), Some((5, 2)));

        let (result, state, _) = harness.abort_and_finish();
        assert!(matches!(result, Ok(Exit::Aborted)));
        assert_eq!(state.move_count(), 2);
    }

    #[test]
    fn stale_move_reply_is_discarded() {
        let harness = start([PlayerKind::Human, PlayerKind::Human], None);
        for column in 0..7 {
            harness.click(column);
        }
        harness.wait_for(|c| matches!(c, VisualCommand::EnableInput { .. }));

        // A reply for ply 5 reaching a board at ply 7 would be a desync if it counted.
        harness.send(Input::Solver(SolverMessage::MoveReply {
            ply: 5,
            column: 2,
            accepted: false,
            status: GameStatus::InProgress,
        }));
        harness.send(Input::Ui(UiEvent::ColumnClicked(2)));
        let landed = harness.wait_for(|c| dropped_in(c).is_some());
        assert_eq!(dropped_in(&landed), Some((2, 8)));

        let (result, state, _) = harness.abort_and_finish();
        assert!(matches!(result, Ok(Exit::Aborted)));
        assert_eq!(state.move_count(), 8);
    }

    #[test]
    fn confirmed_move_reply_is_accepted() {
        let harness = start([PlayerKind::Human, PlayerKind::Human], None);
        harness.click(4);
        harness.wait_for(|c| matches!(c, VisualCommand::EnableInput { .. }));
        harness.send(Input::Solver(SolverMessage::MoveReply {
            ply: 1,
            column: 4,
            accepted: true,
            status: GameStatus::InProgress,
        }));
        harness.send(Input::Ui(UiEvent::ColumnClicked(4)));
        harness.wait_for(|c| dropped_in(c) == Some((4, 2)));

        let (result, _, _) = harness.abort_and_finish();
        assert!(matches!(result, Ok(Exit::Aborted)));
    }

    #[test]
    fn rejected_move_reply_is_fatal() {
        let harness = start([PlayerKind::Human, PlayerKind::Human], None);
        harness.click(3);
        harness.wait_for(|c| matches!(c, VisualCommand::EnableInput { .. }));
        harness.send(Input::Solver(SolverMessage::MoveReply {
            ply: 1,
            column: 3,
            accepted: false,
            status: GameStatus::InProgress,
        }));
        harness.wait_for(|c| matches!(c, VisualCommand::ShowFatalError { .. }));

        let (result, state, _) = harness.finish();
        assert!(matches!(
            result,
            Err(OrchestratorError::SolverDesync { ply: 1, column: 3 })
        ));
        assert_eq!(state.move_count(), 1);
    }

    #[test]
    fn readiness_without_scores_is_a_precondition_failure() {
        let harness = start([PlayerKind::Computer, PlayerKind::Human], None);
        harness.wait_for(|c| matches!(c, VisualCommand::ShowThinking { .. }));
        harness.send(Input::Solver(SolverMessage::ReadinessUpdate { ply: 0, ready: true }));

        let (result, state, _) = harness.finish();
        assert!(matches!(
            result,
            Err(OrchestratorError::SelectorPrecondition { ply: 0 })
        ));
        assert_eq!(state.move_count(), 0);
    }

    #[test]
    fn broken_solver_channel_halts_the_session() {
        let solver = FakeSolver {
            broken: true,
            ..FakeSolver::default()
        };
        let harness = start_with(game_config([PlayerKind::Human, PlayerKind::Human], None), solver);
        let shown = harness.wait_for(|c| matches!(c, VisualCommand::ShowFatalError { .. }));
        assert!(matches!(
            shown,
            VisualCommand::ShowFatalError { ref message, .. } if message.contains("closed")
        ));

        let (result, _, _) = harness.finish();
        assert!(matches!(
            result,
            Err(OrchestratorError::ChannelFailure(ChannelError::Closed))
        ));
    }

    #[test]
    fn two_computers_play_a_full_game_against_the_worker() {
        let (inbox, rx) = mpsc::channel();
        let (log, _visual) = mpsc::channel();
        let solver_config = SolverConfig {
            max_depth: 3,
            node_budget: 200_000,
            interrupt_check_nodes: 256,
        };
        let solver = ThreadedSolver::spawn(&solver_config, inbox.clone()).unwrap();
        let visual = FakeVisual { log, inbox };
        let config = game_config([PlayerKind::Computer, PlayerKind::Computer], None);

        let mut orchestrator = Orchestrator::new(&config, rx, visual, solver, AbortToken::new())
            .with_rng(StdRng::seed_from_u64(5));
        let result = orchestrator.run();

        let status = match result {
            Ok(Exit::Finished(status)) => status,
            other => panic!("game did not finish: {other:?}"),
        };
        assert!(status.is_over());
        assert_eq!(orchestrator.state().status(), status);
        assert!(orchestrator.state().move_count() >= 7);
        assert_eq!(orchestrator.stage(), TurnStage::GameOver(status));
    }
}
