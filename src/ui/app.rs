use crate::config::{AppConfig, Settings, MAX_THINKING_DELAY};
use crate::error::SessionError;
use crate::game::PlayerKind;
use crate::orchestrator::{GameHost, VisualCommand};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use ratatui::{backend::Backend, Terminal};
use std::io;
use std::sync::mpsc::{self, Receiver};
use std::time::{Duration, Instant};
use tracing::error;

use super::game_view::{self, GameView};

/// Frame period while waiting for keys; also paces the animations.
const FRAME: Duration = Duration::from_millis(30);

/// How much `+`/`-` change the thinking delay.
const DELAY_STEP: Duration = Duration::from_millis(500);

/// Seat layouts `s` cycles through, as Player One and Player Two.
const SEATINGS: [[PlayerKind; 2]; 4] = [
    [PlayerKind::Human, PlayerKind::Computer],
    [PlayerKind::Computer, PlayerKind::Human],
    [PlayerKind::Human, PlayerKind::Human],
    [PlayerKind::Computer, PlayerKind::Computer],
];

fn next_seating(players: [PlayerKind; 2]) -> [PlayerKind; 2] {
    let current = SEATINGS.iter().position(|&s| s == players).unwrap_or(0);
    SEATINGS[(current + 1) % SEATINGS.len()]
}

pub struct App {
    host: GameHost,
    commands: Receiver<VisualCommand>,
    view: GameView,
    should_quit: bool,
}

impl App {
    /// Start the first game session.
    pub fn new(config: AppConfig) -> Result<Self, SessionError> {
        let (tx, commands) = mpsc::channel();
        let host = GameHost::start(config, tx)?;
        Ok(App {
            host,
            commands,
            view: GameView::new(),
            should_quit: false,
        })
    }

    /// Main application loop
    pub fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> io::Result<()> {
        loop {
            self.drain_commands();
            self.tick();
            terminal.draw(|f| self.render(f))?;

            if self.should_quit {
                break;
            }

            self.handle_events()?;
        }
        Ok(())
    }

    fn drain_commands(&mut self) {
        let now = Instant::now();
        while let Ok(command) = self.commands.try_recv() {
            self.view.apply(command, now);
        }
    }

    fn tick(&mut self) {
        if let Some((session, ply)) = self.view.tick(Instant::now()) {
            self.host.animation_finished(session, ply);
        }
    }

    /// Handle keyboard events
    fn handle_events(&mut self) -> io::Result<()> {
        if event::poll(FRAME)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    self.handle_key(key);
                }
            }
        }
        Ok(())
    }

    /// Handle key press
    fn handle_key(&mut self, key: KeyEvent) {
        // Clear message on any key press
        self.view.message = None;

        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => {
                self.should_quit = true;
            }
            KeyCode::Left => self.view.move_left(),
            KeyCode::Right => self.view.move_right(),
            KeyCode::Enter | KeyCode::Char(' ') => self.drop_piece(),
            KeyCode::Char('d') => {
                let mut settings = self.host.settings();
                settings.difficulty = settings.difficulty.next();
                self.host.settings_changed(settings);
                self.view.message = Some(format!("Difficulty: {}", settings.difficulty.name()));
            }
            KeyCode::Char('t') => {
                let mut settings = self.host.settings();
                settings.delay_enabled = !settings.delay_enabled;
                self.host.settings_changed(settings);
                let state = if settings.delay_enabled { "on" } else { "off" };
                self.view.message = Some(format!("Thinking delay {state}"));
            }
            KeyCode::Char('+') | KeyCode::Char('=') => {
                let mut settings = self.host.settings();
                settings.thinking_delay = (settings.thinking_delay + DELAY_STEP).min(MAX_THINKING_DELAY);
                self.change_delay(settings);
            }
            KeyCode::Char('-') => {
                let mut settings = self.host.settings();
                settings.thinking_delay = settings.thinking_delay.saturating_sub(DELAY_STEP);
                self.change_delay(settings);
            }
            KeyCode::Char('s') => {
                let players = next_seating(self.host.players());
                let result = self.host.set_players(players);
                self.after_restart(result, "Seats changed, new game started!");
            }
            KeyCode::Char('r') => {
                let result = self.host.reset();
                self.after_restart(result, "New game started!");
            }
            _ => {}
        }
    }

    fn change_delay(&mut self, settings: Settings) {
        self.host.settings_changed(settings);
        self.view.message = Some(format!(
            "Thinking delay {:.1}s",
            settings.thinking_delay.as_secs_f32()
        ));
    }

    fn after_restart(&mut self, result: Result<u64, SessionError>, done: &str) {
        match result {
            Ok(_) => self.view.message = Some(done.to_string()),
            Err(err) => {
                error!(error = %err, "could not start a new session");
                self.view.message = Some(format!("Reset failed: {err}"));
            }
        }
    }

    /// Drop piece in selected column
    fn drop_piece(&mut self) {
        let column = self.view.selected_column;
        if self.view.status().is_some() {
            self.view.message = Some("Game over! Press 'r' to restart.".to_string());
        } else if !self.view.accepts_input() {
            self.view.message = Some("Not your turn.".to_string());
        } else if self.view.board().is_column_full(column) {
            self.view.message = Some("Column is full!".to_string());
        } else {
            self.host.column_clicked(column);
        }
    }

    /// Render the UI
    fn render(&self, frame: &mut ratatui::Frame) {
        game_view::render(
            frame,
            &self.view,
            self.host.settings(),
            self.host.players(),
            Instant::now(),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seatings_cycle_through_every_layout() {
        let mut players = SEATINGS[0];
        let mut seen = vec![players];
        for _ in 1..SEATINGS.len() {
            players = next_seating(players);
            seen.push(players);
        }
        assert_eq!(seen, SEATINGS.to_vec());
        assert_eq!(next_seating(players), SEATINGS[0]);
    }
}
