//! Ratatui front-end: a list of saved places and a world map for browsing and
//! adding them.

mod app;
mod forms;
mod helpers;
mod screens;
mod terminal;

pub use app::App;
pub use terminal::run_app;
