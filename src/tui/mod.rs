// src/tui/mod.rs — TUI dashboard module.
//
// Terminal dashboard over the live task and statistics sources, built with
// ratatui. Launch via `taskmaster dashboard`.

pub mod app;
pub mod theme;
pub mod widgets;

pub use app::run_dashboard;
