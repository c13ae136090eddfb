// src/tui/app.rs — TUI application state, event loop, and rendering.

use std::io;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
        KeyModifiers,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, TableState, Tabs},
    Frame, Terminal,
};

use crate::api::types::{Priority, Task, TaskStats, TaskStatus};
use crate::api::{fetch_all_tasks, TaskApi};
use crate::core::mutations::{Dialog, TaskMutationCoordinator};
use crate::core::notify::{Notification, Notifier, ToastQueue};
use crate::core::polling::{PollingConfig, PollingDataSource, Refetch, RefetchHandle};
use crate::core::view_model::{self, TaskPage, TaskQuery};
use crate::infra::config::Config;

use super::theme::Theme;
use super::widgets;
use super::widgets::form::{FormAction, TaskForm};
use super::widgets::tasks::TasksView;

// ── Tab enum ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Overview,
    Tasks,
}

impl Tab {
    const ALL: [Tab; 2] = [Tab::Overview, Tab::Tasks];

    fn label(&self) -> &'static str {
        match self {
            Tab::Overview => "Overview",
            Tab::Tasks => "Tasks",
        }
    }

    fn index(&self) -> usize {
        Tab::ALL.iter().position(|t| t == self).unwrap_or(0)
    }

    fn from_index(i: usize) -> Tab {
        *Tab::ALL.get(i).unwrap_or(&Tab::Overview)
    }
}

// ── Key bindings ─────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Quit,
    NextTab,
    PrevTab,
    Jump(Tab),
    Down,
    Up,
    ToggleMark,
    ToggleAll,
    DeleteSelected,
    FinishHighlighted,
    AddTask,
    EditHighlighted,
    PrevPage,
    NextPage,
    CycleSort,
    CyclePriority,
    CycleStatus,
    Refresh,
}

pub fn action_for(key: &KeyEvent) -> Option<Action> {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return Some(Action::Quit);
    }
    let action = match key.code {
        KeyCode::Char('q') | KeyCode::Esc => Action::Quit,
        KeyCode::Tab | KeyCode::Right => Action::NextTab,
        KeyCode::BackTab | KeyCode::Left => Action::PrevTab,
        KeyCode::Char('1') => Action::Jump(Tab::Overview),
        KeyCode::Char('2') => Action::Jump(Tab::Tasks),
        KeyCode::Down | KeyCode::Char('j') => Action::Down,
        KeyCode::Up | KeyCode::Char('k') => Action::Up,
        KeyCode::Char(' ') => Action::ToggleMark,
        KeyCode::Char('a') => Action::ToggleAll,
        KeyCode::Char('d') => Action::DeleteSelected,
        KeyCode::Char('f') => Action::FinishHighlighted,
        KeyCode::Char('n') => Action::AddTask,
        KeyCode::Char('e') | KeyCode::Enter => Action::EditHighlighted,
        KeyCode::Char('[') => Action::PrevPage,
        KeyCode::Char(']') => Action::NextPage,
        KeyCode::Char('o') => Action::CycleSort,
        KeyCode::Char('p') => Action::CyclePriority,
        KeyCode::Char('s') => Action::CycleStatus,
        KeyCode::Char('r') => Action::Refresh,
        _ => return None,
    };
    Some(action)
}

/// Keys while the add / edit popup is open. Nothing reaches the table.
pub fn form_action_for(key: &KeyEvent) -> Option<FormAction> {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return Some(FormAction::Cancel);
    }
    let action = match key.code {
        KeyCode::Esc => FormAction::Cancel,
        KeyCode::Enter => FormAction::Submit,
        KeyCode::Tab | KeyCode::Down => FormAction::NextField,
        KeyCode::BackTab | KeyCode::Up => FormAction::PrevField,
        KeyCode::Left => FormAction::Adjust(-1),
        KeyCode::Right => FormAction::Adjust(1),
        KeyCode::Backspace => FormAction::Backspace,
        KeyCode::Char(c) => FormAction::Input(c),
        _ => return None,
    };
    Some(action)
}

/// all → 5 → 4 → … → 1 → all
fn next_priority_filter(current: Option<Priority>) -> Option<Priority> {
    match current {
        None => Priority::ALL_DESC.first().copied(),
        Some(p) => {
            let i = Priority::ALL_DESC.iter().position(|x| *x == p).unwrap_or(0);
            Priority::ALL_DESC.get(i + 1).copied()
        }
    }
}

/// all → pending → finished → all
fn next_status_filter(current: Option<TaskStatus>) -> Option<TaskStatus> {
    match current {
        None => Some(TaskStatus::Pending),
        Some(TaskStatus::Pending) => Some(TaskStatus::Finished),
        Some(TaskStatus::Finished) => None,
    }
}

// ── Refetch fan-out ──────────────────────────────────────────────

/// A mutation refreshes both the task table and the statistics.
struct DashboardRefetch {
    tasks: RefetchHandle,
    stats: RefetchHandle,
}

#[async_trait]
impl Refetch for DashboardRefetch {
    async fn refetch(&self) {
        tokio::join!(self.tasks.refetch(), self.stats.refetch());
    }
}

// ── App state ────────────────────────────────────────────────────

pub struct App {
    active_tab: Tab,
    tasks: PollingDataSource<Vec<Task>>,
    stats: PollingDataSource<TaskStats>,
    query: TaskQuery,
    table_state: TableState,
    coordinator: TaskMutationCoordinator,
    /// Popup buffer; present exactly while the coordinator has a dialog open.
    form: Option<TaskForm>,
    toasts: ToastQueue,
}

impl App {
    /// Activate both data sources. Must be called inside a tokio runtime.
    pub fn start(api: Arc<dyn TaskApi>, config: &Config) -> anyhow::Result<Self> {
        let toasts = ToastQueue::default();
        let notifier: Arc<dyn Notifier> = Arc::new(toasts.clone());

        let tasks_api = api.clone();
        let tasks = PollingDataSource::spawn(
            move || {
                let api = tasks_api.clone();
                async move { fetch_all_tasks(api.as_ref()).await }
            },
            PollingConfig::new(config.polling.tasks_interval()),
            notifier.clone(),
        )?;

        let stats_api = api.clone();
        let stats = PollingDataSource::spawn(
            move || {
                let api = stats_api.clone();
                async move { api.stats().await }
            },
            PollingConfig::new(config.polling.stats_interval()).with_fallback(TaskStats::default()),
            notifier.clone(),
        )?;

        let refetch = DashboardRefetch {
            tasks: tasks.refetch_handle(),
            stats: stats.refetch_handle(),
        };
        let coordinator = TaskMutationCoordinator::new(api, notifier, Arc::new(refetch));

        let query = TaskQuery::new()
            .with_page_size(config.view.page_size)
            .with_sort(config.view.sort_order()?);

        Ok(Self {
            active_tab: Tab::Overview,
            tasks,
            stats,
            query,
            table_state: TableState::default(),
            coordinator,
            form: None,
            toasts,
        })
    }

    pub fn active_tab(&self) -> Tab {
        self.active_tab
    }

    pub fn query(&self) -> &TaskQuery {
        &self.query
    }

    pub fn toasts(&self) -> &ToastQueue {
        &self.toasts
    }

    pub fn coordinator(&self) -> &TaskMutationCoordinator {
        &self.coordinator
    }

    pub fn form(&self) -> Option<&TaskForm> {
        self.form.as_ref()
    }

    /// Wait until both sources have settled once.
    pub async fn ready(&self) {
        tokio::join!(self.tasks.ready(), self.stats.ready());
    }

    /// The visible page. Pulls the page number back when the data shrank
    /// underneath it (e.g. after deleting the last rows of the last page).
    pub fn current_page(&mut self) -> TaskPage {
        let state = self.tasks.state();
        let all = state.value.as_deref().unwrap_or(&[]);
        let mut page = view_model::apply(all, &self.query);
        if self.query.page > page.total_pages {
            self.query.page = page.total_pages;
            page = view_model::apply(all, &self.query);
        }

        match self.table_state.selected() {
            _ if page.rows.is_empty() => self.table_state.select(None),
            None => self.table_state.select(Some(0)),
            Some(i) if i >= page.rows.len() => self.table_state.select(Some(page.rows.len() - 1)),
            Some(_) => {}
        }
        page
    }

    fn highlighted(&mut self) -> Option<Task> {
        let page = self.current_page();
        let i = self.table_state.selected()?;
        page.rows.get(i).cloned()
    }

    fn set_query(&mut self, query: TaskQuery) {
        self.query = query;
        self.table_state.select(Some(0));
    }

    /// Route a key press to the popup when one is open, to the dashboard
    /// otherwise. Returns `true` when the dashboard should close.
    pub async fn handle_key(&mut self, key: &KeyEvent) -> bool {
        if self.form.is_some() {
            if let Some(action) = form_action_for(key) {
                self.apply_form(action).await;
            }
            return false;
        }
        match action_for(key) {
            Some(action) => self.apply(action).await,
            None => false,
        }
    }

    pub async fn apply_form(&mut self, action: FormAction) {
        match action {
            FormAction::Cancel => {
                self.coordinator.close_dialogs();
                self.form = None;
            }
            FormAction::Submit => self.submit_form().await,
            other => {
                if let Some(form) = self.form.as_mut() {
                    form.apply(other);
                }
            }
        }
    }

    /// Hand the popup to the coordinator. The popup stays open on failure
    /// so the input can be corrected.
    async fn submit_form(&mut self) {
        let Some(form) = self.form.clone() else {
            return;
        };
        match self.coordinator.dialog().clone() {
            Dialog::Add => match form.to_create_input() {
                Ok(input) => {
                    let _ = self.coordinator.add_task(input).await;
                }
                Err(e) => self.toasts.notify(Notification::error(e.to_string())),
            },
            Dialog::Edit(task) => match form.to_patch(&task) {
                Ok(patch) => {
                    let _ = self.coordinator.edit_task(&task, patch).await;
                }
                Err(e) => self.toasts.notify(Notification::error(e.to_string())),
            },
            Dialog::Closed => {}
        }
        if *self.coordinator.dialog() == Dialog::Closed {
            self.form = None;
        }
    }

    /// Apply one action. Returns `true` when the dashboard should close.
    pub async fn apply(&mut self, action: Action) -> bool {
        match action {
            Action::Quit => return true,
            Action::NextTab => {
                let idx = self.active_tab.index();
                self.active_tab = Tab::from_index((idx + 1) % Tab::ALL.len());
            }
            Action::PrevTab => {
                let idx = self.active_tab.index();
                self.active_tab = Tab::from_index((idx + Tab::ALL.len() - 1) % Tab::ALL.len());
            }
            Action::Jump(tab) => self.active_tab = tab,
            Action::Refresh => {
                tokio::join!(self.tasks.refetch(), self.stats.refetch());
            }
            _ if self.active_tab != Tab::Tasks => {}
            Action::Down => {
                let rows = self.current_page().rows.len();
                let i = self.table_state.selected().unwrap_or(0);
                self.table_state.select(Some((i + 1).min(rows.saturating_sub(1))));
            }
            Action::Up => {
                let i = self.table_state.selected().unwrap_or(0);
                self.table_state.select(Some(i.saturating_sub(1)));
            }
            Action::ToggleMark => {
                if let Some(task) = self.highlighted() {
                    self.coordinator.selection_mut().toggle(&task.id);
                }
            }
            Action::ToggleAll => {
                let rows = self.current_page().rows;
                let checked = !self.coordinator.selection().all_selected(&rows);
                self.coordinator.selection_mut().set_all_visible(&rows, checked);
            }
            Action::DeleteSelected => {
                self.coordinator.delete_selected().await;
            }
            Action::FinishHighlighted => {
                if let Some(task) = self.highlighted() {
                    if !task.is_finished() {
                        let _ = self.coordinator.finish_task(&task).await;
                    }
                }
            }
            Action::AddTask => {
                self.coordinator.open_add_dialog();
                self.form = Some(TaskForm::for_add(Utc::now()));
            }
            Action::EditHighlighted => {
                if let Some(task) = self.highlighted() {
                    self.form = Some(TaskForm::for_edit(&task));
                    self.coordinator.open_edit_dialog(task);
                }
            }
            Action::PrevPage => {
                let page = self.query.page.saturating_sub(1).max(1);
                self.set_query(self.query.clone().with_page(page));
            }
            Action::NextPage => {
                let total = self.current_page().total_pages;
                if self.query.page < total {
                    self.set_query(self.query.clone().with_page(self.query.page + 1));
                }
            }
            Action::CycleSort => {
                let q = self.query.clone().with_sort(self.query.sort.cycle()).with_page(1);
                self.set_query(q);
            }
            Action::CyclePriority => {
                let mut q = self.query.clone().with_page(1);
                q.priority = next_priority_filter(q.priority);
                self.set_query(q);
            }
            Action::CycleStatus => {
                let mut q = self.query.clone().with_page(1);
                q.status = next_status_filter(q.status);
                self.set_query(q);
            }
        }
        false
    }
}

// ── Public entry point ───────────────────────────────────────────

/// Launch the TUI dashboard. Blocks until the user quits (q / Esc / Ctrl-C).
pub async fn run_dashboard(api: Arc<dyn TaskApi>, config: &Config) -> anyhow::Result<()> {
    let mut app = App::start(api, config)?;

    // Terminal setup
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_event_loop(&mut terminal, &mut app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}

async fn run_event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> anyhow::Result<()> {
    loop {
        // Polling sources update in the background; every pass redraws the
        // latest snapshot.
        let page = app.current_page();
        terminal.draw(|f| render(f, app, &page))?;

        // Poll for events (250ms timeout for responsive refresh)
        let ready = tokio::task::block_in_place(|| event::poll(Duration::from_millis(250)))?;
        if !ready {
            continue;
        }
        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            if app.handle_key(&key).await {
                return Ok(());
            }
        }
    }
}

// ── Rendering ────────────────────────────────────────────────────

fn render(f: &mut Frame, app: &mut App, page: &TaskPage) {
    let size = f.area();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header + tabs
            Constraint::Min(10),   // Main content
            Constraint::Length(1), // Footer / key hints
        ])
        .split(size);

    render_header(f, chunks[0], app);
    render_tab_content(f, chunks[1], app, page);
    render_footer(f, chunks[2], app);

    if let Some(ref form) = app.form {
        widgets::form::render(f, chunks[1], form);
    }
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let titles: Vec<Line> = Tab::ALL
        .iter()
        .enumerate()
        .map(|(i, tab)| {
            let label = format!(" {} {} ", i + 1, tab.label());
            if *tab == app.active_tab {
                Line::from(Span::styled(label, Theme::tab_active()))
            } else {
                Line::from(Span::styled(label, Theme::tab_inactive()))
            }
        })
        .collect();

    let tabs = Tabs::new(titles)
        .block(
            Block::default()
                .title(Span::styled(" TaskMaster ", Theme::header()))
                .borders(Borders::ALL)
                .border_style(Theme::border()),
        )
        .select(app.active_tab.index())
        .highlight_style(Theme::tab_active())
        .divider(Span::styled(" | ", Theme::text_dim()));

    f.render_widget(tabs, area);
}

fn render_tab_content(f: &mut Frame, area: Rect, app: &mut App, page: &TaskPage) {
    match app.active_tab {
        Tab::Overview => widgets::overview::render(f, area, &app.stats.state()),
        Tab::Tasks => {
            let state = app.tasks.state();
            let view = TasksView {
                page,
                query: &app.query,
                selection: app.coordinator.selection(),
                is_loading: state.is_loading,
                error: state.error.as_deref(),
            };
            widgets::tasks::render(f, area, &view, &mut app.table_state);
        }
    }
}

fn render_footer(f: &mut Frame, area: Rect, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(40), Constraint::Percentage(40)])
        .split(area);

    if app.form.is_some() {
        let hints = vec![
            Span::styled(" Tab", Theme::key_hint()),
            Span::styled(" next field  ", Theme::key_desc()),
            Span::styled("←/→", Theme::key_hint()),
            Span::styled(" adjust  ", Theme::key_desc()),
            Span::styled("Enter", Theme::key_hint()),
            Span::styled(" save  ", Theme::key_desc()),
            Span::styled("Esc", Theme::key_hint()),
            Span::styled(" cancel", Theme::key_desc()),
        ];
        f.render_widget(Paragraph::new(Line::from(hints)), chunks[0]);
        render_toast(f, chunks[1], app);
        return;
    }

    let mut hints = vec![
        Span::styled(" q", Theme::key_hint()),
        Span::styled(" quit  ", Theme::key_desc()),
        Span::styled("Tab/1-2", Theme::key_hint()),
        Span::styled(" switch  ", Theme::key_desc()),
        Span::styled("r", Theme::key_hint()),
        Span::styled(" refresh", Theme::key_desc()),
    ];
    if app.active_tab == Tab::Tasks {
        hints.extend([
            Span::styled("  space/a", Theme::key_hint()),
            Span::styled(" mark  ", Theme::key_desc()),
            Span::styled("d", Theme::key_hint()),
            Span::styled(" delete  ", Theme::key_desc()),
            Span::styled("f", Theme::key_hint()),
            Span::styled(" finish  ", Theme::key_desc()),
            Span::styled("n/e", Theme::key_hint()),
            Span::styled(" add/edit  ", Theme::key_desc()),
            Span::styled("[ ]", Theme::key_hint()),
            Span::styled(" page  ", Theme::key_desc()),
            Span::styled("o/p/s", Theme::key_hint()),
            Span::styled(" sort/filter", Theme::key_desc()),
        ]);
    }
    f.render_widget(Paragraph::new(Line::from(hints)), chunks[0]);
    render_toast(f, chunks[1], app);
}

fn render_toast(f: &mut Frame, area: Rect, app: &App) {
    if let Some(toast) = app.toasts.latest() {
        let style = if toast.is_error() {
            Theme::error()
        } else {
            Theme::success()
        };
        let text = Line::from(Span::styled(
            format!("{}: {} ", toast.title, toast.description),
            style,
        ))
        .right_aligned();
        f.render_widget(Paragraph::new(text), area);
    }
}
