// src/tui/theme.rs — Color scheme and style definitions for the TUI dashboard.

use ratatui::style::{Color, Modifier, Style};

use crate::api::types::{Priority, TaskStatus};

pub struct Theme;

impl Theme {
    // ── Palette ──────────────────────────────────────────────────
    pub const ACCENT: Color = Color::Rgb(99, 102, 241);
    pub const FG: Color = Color::Rgb(235, 235, 240);
    pub const BLUE: Color = Color::Rgb(70, 130, 220);
    pub const GREEN: Color = Color::Rgb(80, 200, 120);
    pub const RED: Color = Color::Rgb(230, 80, 80);
    pub const YELLOW: Color = Color::Rgb(230, 200, 60);
    pub const ORANGE: Color = Color::Rgb(255, 140, 50);
    pub const GRAY: Color = Color::Rgb(120, 120, 140);
    pub const DIM: Color = Color::Rgb(80, 80, 100);

    // ── Semantic styles ──────────────────────────────────────────

    /// Active/selected tab header.
    pub fn tab_active() -> Style {
        Style::default()
            .fg(Theme::ACCENT)
            .add_modifier(Modifier::BOLD)
    }

    pub fn tab_inactive() -> Style {
        Style::default().fg(Theme::GRAY)
    }

    /// Main title / header bar.
    pub fn header() -> Style {
        Style::default()
            .fg(Theme::ACCENT)
            .add_modifier(Modifier::BOLD)
    }

    pub fn border() -> Style {
        Style::default().fg(Theme::DIM)
    }

    pub fn text() -> Style {
        Style::default().fg(Theme::FG)
    }

    /// Dimmed / secondary text.
    pub fn text_dim() -> Style {
        Style::default().fg(Theme::GRAY)
    }

    pub fn success() -> Style {
        Style::default().fg(Theme::GREEN)
    }

    pub fn warning() -> Style {
        Style::default().fg(Theme::YELLOW)
    }

    pub fn error() -> Style {
        Style::default().fg(Theme::RED)
    }

    pub fn info() -> Style {
        Style::default().fg(Theme::BLUE)
    }

    /// Large figures on the overview cards.
    pub fn figure() -> Style {
        Style::default()
            .fg(Theme::FG)
            .add_modifier(Modifier::BOLD)
    }

    pub fn table_header() -> Style {
        Style::default()
            .fg(Theme::ACCENT)
            .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
    }

    /// Highlighted table row.
    pub fn table_selected() -> Style {
        Style::default().bg(Color::Rgb(40, 40, 60)).fg(Theme::FG)
    }

    /// Checkbox mark on a selected row.
    pub fn marked() -> Style {
        Style::default()
            .fg(Theme::ACCENT)
            .add_modifier(Modifier::BOLD)
    }

    /// Key hint in the footer.
    pub fn key_hint() -> Style {
        Style::default().fg(Theme::ACCENT)
    }

    /// Description next to key hint.
    pub fn key_desc() -> Style {
        Style::default().fg(Theme::GRAY)
    }

    /// Priority color, hottest at 5.
    pub fn priority(priority: Priority) -> Style {
        match priority.value() {
            5 => Style::default().fg(Theme::RED).add_modifier(Modifier::BOLD),
            4 => Style::default().fg(Theme::ORANGE),
            3 => Style::default().fg(Theme::YELLOW),
            2 => Style::default().fg(Theme::BLUE),
            _ => Style::default().fg(Theme::GRAY),
        }
    }

    pub fn status(status: TaskStatus) -> Style {
        match status {
            TaskStatus::Finished => Theme::success(),
            TaskStatus::Pending => Theme::warning(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_colors() {
        let p = |v| Theme::priority(Priority::new(v).unwrap());
        assert_eq!(p(5).fg, Some(Theme::RED));
        assert!(p(5).add_modifier.contains(Modifier::BOLD));
        assert_eq!(p(4).fg, Some(Theme::ORANGE));
        assert_eq!(p(3).fg, Some(Theme::YELLOW));
        assert_eq!(p(1).fg, Some(Theme::GRAY));
    }

    #[test]
    fn test_status_colors() {
        assert_eq!(Theme::status(TaskStatus::Finished).fg, Some(Theme::GREEN));
        assert_eq!(Theme::status(TaskStatus::Pending).fg, Some(Theme::YELLOW));
    }

    #[test]
    fn test_tab_active_is_accent_bold() {
        let s = Theme::tab_active();
        assert_eq!(s.fg, Some(Theme::ACCENT));
        assert!(s.add_modifier.contains(Modifier::BOLD));
    }

    #[test]
    fn test_table_header_style() {
        let s = Theme::table_header();
        assert_eq!(s.fg, Some(Theme::ACCENT));
        assert!(s.add_modifier.contains(Modifier::UNDERLINED));
    }
}
