// src/tui/widgets/tasks.rs — Task table panel (Tab 2).

use chrono::{DateTime, Local, Utc};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame,
};

use crate::core::mutations::Selection;
use crate::core::view_model::{TaskPage, TaskQuery};
use crate::tui::theme::Theme;

/// Everything the task panel draws from.
pub struct TasksView<'a> {
    pub page: &'a TaskPage,
    pub query: &'a TaskQuery,
    pub selection: &'a Selection,
    pub is_loading: bool,
    pub error: Option<&'a str>,
}

pub fn render(f: &mut Frame, area: Rect, view: &TasksView<'_>, table_state: &mut TableState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(5)])
        .split(area);

    render_filters(f, chunks[0], view);
    render_task_table(f, chunks[1], view, table_state);
}

fn render_filters(f: &mut Frame, area: Rect, view: &TasksView<'_>) {
    let q = view.query;
    let priority = q
        .priority
        .map(|p| p.to_string())
        .unwrap_or_else(|| "all".into());
    let status = q.status.map(|s| s.to_string()).unwrap_or_else(|| "all".into());

    let mut spans = vec![
        Span::styled(" Sort: ", Theme::text_dim()),
        Span::styled(q.sort.label(), Theme::text()),
        Span::styled("   Priority: ", Theme::text_dim()),
        Span::styled(priority, Theme::text()),
        Span::styled("   Status: ", Theme::text_dim()),
        Span::styled(status, Theme::text()),
    ];
    if !view.selection.is_empty() {
        spans.push(Span::styled(
            format!("   {} selected", view.selection.len()),
            Theme::marked(),
        ));
    }
    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_task_table(f: &mut Frame, area: Rect, view: &TasksView<'_>, state: &mut TableState) {
    let block = Block::default()
        .title(format!(
            " Tasks · page {} of {} · {} matching ",
            view.page.page, view.page.total_pages, view.page.total_matching
        ))
        .borders(Borders::ALL)
        .border_style(Theme::border());

    if view.page.is_empty() {
        let message = if view.is_loading {
            Span::styled("  Loading tasks…", Theme::text_dim())
        } else if let Some(err) = view.error {
            Span::styled(format!("  {err}"), Theme::error())
        } else {
            Span::styled("  No tasks found.", Theme::text_dim())
        };
        f.render_widget(Paragraph::new(Line::from(message)).block(block), area);
        return;
    }

    let all = if view.selection.all_selected(&view.page.rows) {
        "[x]"
    } else {
        "[ ]"
    };
    let header = Row::new(vec![
        Cell::from(all).style(Theme::table_header()),
        Cell::from("Title").style(Theme::table_header()),
        Cell::from("Priority").style(Theme::table_header()),
        Cell::from("Status").style(Theme::table_header()),
        Cell::from("Start").style(Theme::table_header()),
        Cell::from("End").style(Theme::table_header()),
        Cell::from("Hours").style(Theme::table_header()),
    ]);

    let rows: Vec<Row> = view
        .page
        .rows
        .iter()
        .map(|t| {
            let mark = if view.selection.contains(&t.id) {
                Cell::from("[x]").style(Theme::marked())
            } else {
                Cell::from("[ ]").style(Theme::text_dim())
            };
            Row::new(vec![
                mark,
                Cell::from(t.title.clone()).style(Theme::text()),
                Cell::from(t.priority.to_string()).style(Theme::priority(t.priority)),
                Cell::from(t.status.to_string()).style(Theme::status(t.status)),
                Cell::from(local_time(&t.start_time)).style(Theme::text_dim()),
                Cell::from(local_time(&t.end_time)).style(Theme::text_dim()),
                Cell::from(t.duration_hours().to_string()).style(Theme::text()),
            ])
        })
        .collect();

    let widths = [
        Constraint::Length(3),
        Constraint::Min(20),
        Constraint::Length(8),
        Constraint::Length(8),
        Constraint::Length(16),
        Constraint::Length(16),
        Constraint::Length(5),
    ];

    let table = Table::new(rows, widths)
        .header(header)
        .block(block)
        .row_highlight_style(Theme::table_selected())
        .highlight_symbol(">> ");

    f.render_stateful_widget(table, area, state);
}

fn local_time(dt: &DateTime<Utc>) -> String {
    dt.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string()
}
