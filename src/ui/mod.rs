//! Terminal front-end: draws the game from visual commands and turns key
//! presses into UI events for the running session.

mod app;
mod game_view;

pub use app::App;
pub use game_view::GameView;
