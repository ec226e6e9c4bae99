use std::time::{Duration, Instant};

use tracing::debug;

use crate::config::Settings;
use crate::game::{Board, Cell, GameStatus, Placement, Player, PlayerKind, COLS, ROWS};
use crate::orchestrator::VisualCommand;
use crate::solver::protocol::{Score, ScoreMap, CERTAIN_LOSS, WIN_THRESHOLD};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

/// Time for a falling piece to pass one row.
const DROP_STEP: Duration = Duration::from_millis(45);
/// Time the thinking floater spends over one column.
const SWEEP_STEP: Duration = Duration::from_millis(110);

/// A piece on its way down.
#[derive(Debug, Clone, Copy)]
struct Falling {
    placement: Placement,
    ply: u32,
    started: Instant,
}

impl Falling {
    /// Row the piece is drawn in at `now`; reaches `placement.row` when it lands.
    fn row_at(&self, now: Instant) -> usize {
        let fallen = (now.saturating_duration_since(self.started).as_millis()
            / DROP_STEP.as_millis()) as usize;
        (ROWS - 1).saturating_sub(fallen).max(self.placement.row)
    }
}

/// What the terminal shows. Built only from visual commands, so it never
/// reads the orchestrator's board.
#[derive(Debug, Clone)]
pub struct GameView {
    session: u64,
    board: Board,
    pub selected_column: usize,
    input_enabled: bool,
    falling: Option<Falling>,
    thinking: Option<(Player, Instant)>,
    evaluation: Option<(ScoreMap, u32)>,
    status: Option<GameStatus>,
    fatal: Option<String>,
    pub message: Option<String>,
}

impl GameView {
    pub fn new() -> Self {
        GameView {
            session: 0,
            board: Board::new(),
            selected_column: COLS / 2,
            input_enabled: false,
            falling: None,
            thinking: None,
            evaluation: None,
            status: None,
            fatal: None,
            message: None,
        }
    }

    /// Apply one command. Commands from any session but the latest are
    /// ignored; returns whether this one was used.
    pub fn apply(&mut self, command: VisualCommand, now: Instant) -> bool {
        if let VisualCommand::NewSession { session } = command {
            *self = GameView {
                session,
                selected_column: self.selected_column,
                ..GameView::new()
            };
            return true;
        }
        if command.session() != self.session {
            return false;
        }

        match command {
            VisualCommand::NewSession { .. } => {}
            VisualCommand::EnableInput { .. } => self.input_enabled = true,
            VisualCommand::DisableInput { .. } => self.input_enabled = false,
            VisualCommand::AnimateDrop { placement, ply, .. } => {
                if let Some(previous) = self.falling.take() {
                    self.land(previous.placement);
                }
                self.falling = Some(Falling {
                    placement,
                    ply,
                    started: now,
                });
            }
            VisualCommand::ShowThinking { player, .. } => self.thinking = Some((player, now)),
            VisualCommand::HideThinking { .. } => self.thinking = None,
            VisualCommand::ShowGameOver { status, .. } => self.status = Some(status),
            VisualCommand::UpdateEvaluation { scores, depth, .. } => {
                self.evaluation = Some((scores, depth));
            }
            VisualCommand::ShowFatalError { message, .. } => {
                self.input_enabled = false;
                self.thinking = None;
                self.fatal = Some(message);
            }
        }
        true
    }

    /// Advance the drop animation. Returns `(session, ply)` of a piece that
    /// just landed.
    pub fn tick(&mut self, now: Instant) -> Option<(u64, u32)> {
        let falling = self.falling?;
        if falling.row_at(now) > falling.placement.row {
            return None;
        }
        self.falling = None;
        self.land(falling.placement);
        Some((self.session, falling.ply))
    }

    fn land(&mut self, placement: Placement) {
        if let Err(err) = self.board.drop_piece(placement.column, placement.player.to_cell()) {
            debug!(session = self.session, error = %err, "animated piece does not fit the shown board");
        }
    }

    pub fn move_left(&mut self) {
        self.selected_column = self.selected_column.saturating_sub(1);
    }

    pub fn move_right(&mut self) {
        if self.selected_column + 1 < COLS {
            self.selected_column += 1;
        }
    }

    /// Whether a click would be listened to right now.
    pub fn accepts_input(&self) -> bool {
        self.input_enabled && self.falling.is_none() && self.fatal.is_none()
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn status(&self) -> Option<GameStatus> {
        self.status
    }

    pub fn fatal(&self) -> Option<&str> {
        self.fatal.as_deref()
    }

    /// Player to move, by counting the pieces shown.
    fn turn(&self) -> Player {
        if self.board.occupied() % 2 == 0 {
            Player::One
        } else {
            Player::Two
        }
    }
}

impl Default for GameView {
    fn default() -> Self {
        Self::new()
    }
}

fn player_color(player: Player) -> Color {
    match player {
        Player::One => Color::Red,
        Player::Two => Color::Yellow,
    }
}

fn format_score(score: Score) -> String {
    if score == CERTAIN_LOSS {
        "loss".to_string()
    } else if score >= WIN_THRESHOLD {
        "win".to_string()
    } else {
        score.to_string()
    }
}

pub fn render(
    frame: &mut Frame,
    view: &GameView,
    settings: Settings,
    players: [PlayerKind; 2],
    now: Instant,
) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(12),   // Board
            Constraint::Length(3), // Evaluation
            Constraint::Length(3), // Message
            Constraint::Length(4), // Controls
        ])
        .split(frame.area());

    render_header(frame, view, settings, players, chunks[0]);
    render_board(frame, view, now, chunks[1]);
    render_evaluation(frame, view, chunks[2]);
    render_message(frame, view, chunks[3]);
    render_controls(frame, chunks[4]);
}

fn render_header(
    frame: &mut Frame,
    view: &GameView,
    settings: Settings,
    players: [PlayerKind; 2],
    area: Rect,
) {
    let kind = |player: Player| match players[player.index()] {
        PlayerKind::Human => "Human",
        PlayerKind::Computer => "Computer",
    };
    let (status, color) = match (view.fatal(), view.status()) {
        (Some(_), _) => ("Game halted".to_string(), Color::Magenta),
        (None, Some(GameStatus::Won(player))) => {
            (format!("{} wins!", player.name()), player_color(player))
        }
        (None, Some(_)) => ("It's a draw!".to_string(), Color::White),
        (None, None) => {
            let player = view.turn();
            (
                format!("{} ({}) to move", player.name(), kind(player)),
                player_color(player),
            )
        }
    };
    let delay = if settings.delay_enabled {
        format!("{:.1}s", settings.thinking_delay.as_secs_f32())
    } else {
        "off".to_string()
    };
    let text = format!(
        "{status}  |  Difficulty: {}  |  Thinking delay: {delay}",
        settings.difficulty.name()
    );

    let header = Paragraph::new(text)
        .style(Style::default().fg(color).add_modifier(Modifier::BOLD))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).title("Connect Four"));

    frame.render_widget(header, area);
}

fn render_board(frame: &mut Frame, view: &GameView, now: Instant, area: Rect) {
    let mut lines = Vec::new();

    // Thinking floater sweeps back and forth above the columns
    let mut floater = vec![Span::raw("   ")];
    let floater_col = view.thinking.map(|(player, since)| {
        let steps = (now.saturating_duration_since(since).as_millis() / SWEEP_STEP.as_millis())
            as usize
            % (2 * COLS - 2);
        let col = if steps < COLS { steps } else { 2 * COLS - 2 - steps };
        (col, player)
    });
    for col in 0..COLS {
        match floater_col {
            Some((c, player)) if c == col => floater.push(Span::styled(
                " ● ",
                Style::default().fg(player_color(player)),
            )),
            _ => floater.push(Span::raw("   ")),
        }
    }
    floater.push(Span::raw("  "));
    lines.push(Line::from(floater));

    // Column numbers with selection indicator
    let mut col_line = vec![Span::raw("   ")];
    for col in 0..COLS {
        if col == view.selected_column {
            col_line.push(Span::styled(
                format!(" {} ", col + 1),
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
            ));
        } else {
            col_line.push(Span::raw(format!(" {} ", col + 1)));
        }
    }
    col_line.push(Span::raw("  "));
    lines.push(Line::from(col_line));

    lines.push(Line::from("  ╔═════════════════════╗"));

    let falling = view
        .falling
        .map(|f| (f.placement.column, f.row_at(now), f.placement.player));
    for row in (0..ROWS).rev() {
        let mut row_spans = vec![Span::raw("  ║")];
        for col in 0..COLS {
            let cell = match falling {
                Some((c, r, player)) if c == col && r == row => player.to_cell(),
                _ => view.board().get(col, row),
            };
            let (symbol, color) = match cell {
                Cell::Empty => (" . ", Color::DarkGray),
                Cell::PlayerOne => (" ● ", player_color(Player::One)),
                Cell::PlayerTwo => (" ● ", player_color(Player::Two)),
            };
            row_spans.push(Span::styled(symbol, Style::default().fg(color)));
        }
        row_spans.push(Span::raw("║"));
        lines.push(Line::from(row_spans));
    }

    lines.push(Line::from("  ╚═════════════════════╝"));

    let board_widget = Paragraph::new(lines).alignment(Alignment::Center);
    frame.render_widget(board_widget, area);
}

fn render_evaluation(frame: &mut Frame, view: &GameView, area: Rect) {
    let text = match &view.evaluation {
        Some((scores, depth)) => {
            let cols: Vec<String> = (0..COLS)
                .map(|col| match scores.get(&col) {
                    Some(&score) => format!("{}:{}", col + 1, format_score(score)),
                    None => format!("{}:-", col + 1),
                })
                .collect();
            format!("{}  (depth {depth})", cols.join("  "))
        }
        None => "waiting for the solver".to_string(),
    };
    let widget = Paragraph::new(text)
        .style(Style::default().fg(Color::Gray))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).title("Evaluation"));

    frame.render_widget(widget, area);
}

fn render_message(frame: &mut Frame, view: &GameView, area: Rect) {
    let (text, color) = match view.fatal() {
        Some(error) => (format!("{error}. Press 'r' to reset."), Color::Magenta),
        None => (view.message.clone().unwrap_or_default(), Color::Yellow),
    };
    let msg_widget = Paragraph::new(text)
        .style(Style::default().fg(color))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));

    frame.render_widget(msg_widget, area);
}

fn render_controls(frame: &mut Frame, area: Rect) {
    let line1 = Line::from("←/→: Move  |  Enter: Drop  |  R: Reset  |  Q: Quit");
    let line2 = Line::from("D: Difficulty  |  T: Toggle delay  |  +/-: Delay length  |  S: Seats");

    let controls = Paragraph::new(vec![line1, line2])
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).title("Controls"));

    frame.render_widget(controls, area);
}
