// src/tui/widgets/overview.rs — Statistics panel (Tab 1).

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, Wrap},
    Frame,
};

use crate::api::types::{Priority, TaskStats};
use crate::core::polling::PollState;
use crate::tui::theme::Theme;

pub fn render(f: &mut Frame, area: Rect, state: &PollState<TaskStats>) {
    let Some(stats) = state.value.as_ref() else {
        let text = if state.is_loading {
            Span::styled("  Loading statistics…", Theme::text_dim())
        } else {
            Span::styled(
                format!("  {}", state.error.as_deref().unwrap_or("No data")),
                Theme::error(),
            )
        };
        let p = Paragraph::new(Line::from(text)).block(panel(" Statistics "));
        f.render_widget(p, area);
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(5), // cards
            Constraint::Length(5), // pending time
            Constraint::Min(8),    // by priority
        ])
        .split(area);

    render_cards(f, chunks[0], stats);
    render_pending_time(f, chunks[1], stats, state);
    render_priority_table(f, chunks[2], stats);
}

fn panel(title: &str) -> Block<'_> {
    Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Theme::border())
}

fn render_cards(f: &mut Frame, area: Rect, stats: &TaskStats) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Ratio(1, 4); 4])
        .split(area);

    let cards = [
        (" Total tasks ", stats.overview.total_tasks.to_string(), Theme::figure()),
        (
            " Completed ",
            format!("{}%", stats.completed_percent()),
            Theme::success(),
        ),
        (
            " Pending ",
            format!("{}%", stats.pending_percent()),
            Theme::warning(),
        ),
        (
            " Avg completion ",
            format!("{:.1} hrs", stats.time_metrics.average_completion_time),
            Theme::info(),
        ),
    ];

    for ((title, value, style), col) in cards.into_iter().zip(cols.iter()) {
        let p = Paragraph::new(vec![Line::from(""), Line::from(Span::styled(format!(" {value}"), style))])
            .block(panel(title));
        f.render_widget(p, *col);
    }
}

fn render_pending_time(f: &mut Frame, area: Rect, stats: &TaskStats, state: &PollState<TaskStats>) {
    let t = &stats.time_metrics;
    let mut lines = vec![
        Line::from(vec![
            Span::styled("Pending tasks:   ", Theme::text_dim()),
            Span::styled(stats.overview.pending_tasks.to_string(), Theme::text()),
        ]),
        Line::from(vec![
            Span::styled("Time lapsed:     ", Theme::text_dim()),
            Span::styled(format!("{:.1} hrs", t.total_time_elapsed), Theme::text()),
            Span::styled("    Time to finish:  ", Theme::text_dim()),
            Span::styled(format!("{:.1} hrs", t.total_time_to_finish), Theme::text()),
        ]),
    ];
    if state.is_fallback {
        lines.push(Line::from(Span::styled(
            "Offline: showing placeholder figures",
            Theme::warning(),
        )));
    } else if let Some(ref err) = state.error {
        lines.push(Line::from(Span::styled(
            format!("Last refresh failed: {err}"),
            Theme::error(),
        )));
    }

    let p = Paragraph::new(lines)
        .block(panel(" Pending task summary "))
        .wrap(Wrap { trim: false });
    f.render_widget(p, area);
}

fn render_priority_table(f: &mut Frame, area: Rect, stats: &TaskStats) {
    let header = Row::new(vec![
        Cell::from("Priority").style(Theme::table_header()),
        Cell::from("Pending").style(Theme::table_header()),
        Cell::from("Time lapsed (hrs)").style(Theme::table_header()),
        Cell::from("Time to finish (hrs)").style(Theme::table_header()),
    ]);

    let rows: Vec<Row> = Priority::ALL_DESC
        .iter()
        .map(|&p| {
            let b = stats.pending_for(p);
            Row::new(vec![
                Cell::from(p.to_string()).style(Theme::priority(p)),
                Cell::from(b.count.to_string()).style(Theme::text()),
                Cell::from(format!("{:.1}", b.time_elapsed)).style(Theme::text()),
                Cell::from(format!("{:.1}", b.estimated_time_left)).style(Theme::text()),
            ])
        })
        .collect();

    let widths = [
        Constraint::Length(10),
        Constraint::Length(10),
        Constraint::Length(20),
        Constraint::Min(20),
    ];

    let table = Table::new(rows, widths)
        .header(header)
        .block(panel(" Pending by priority "));
    f.render_widget(table, area);
}
