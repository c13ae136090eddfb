// src/tui/widgets/form.rs — Add / edit task popup.

use chrono::{DateTime, Duration, Local, Utc};
use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph},
    Frame,
};

use crate::api::types::{CreateTaskInput, Priority, Task, TaskStatus, UpdateTaskInput};
use crate::cli::tasks::parse_timestamp;
use crate::tui::theme::Theme;

const INPUT_FORMAT: &str = "%Y-%m-%dT%H:%M";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Title,
    Priority,
    Status,
    Start,
    End,
}

impl Field {
    fn label(self) -> &'static str {
        match self {
            Field::Title => "Title",
            Field::Priority => "Priority",
            Field::Status => "Finished",
            Field::Start => "Start",
            Field::End => "End",
        }
    }

    fn is_text(self) -> bool {
        matches!(self, Field::Title | Field::Start | Field::End)
    }
}

const ADD_FIELDS: &[Field] = &[Field::Title, Field::Priority, Field::Start, Field::End];
const EDIT_FIELDS: &[Field] = &[
    Field::Title,
    Field::Priority,
    Field::Status,
    Field::Start,
    Field::End,
];

/// Edits applied to the focused field while the popup is open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormAction {
    Cancel,
    Submit,
    NextField,
    PrevField,
    Backspace,
    Input(char),
    /// Step a choice field (priority, status) up or down.
    Adjust(i8),
}

/// Buffer behind the popup. Times are kept as typed and parsed on submit.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskForm {
    pub title: String,
    pub priority: Priority,
    pub status: TaskStatus,
    pub start: String,
    pub end: String,
    is_edit: bool,
    focus: usize,
}

fn input_time(dt: &DateTime<Utc>) -> String {
    dt.with_timezone(&Local).format(INPUT_FORMAT).to_string()
}

impl TaskForm {
    /// Empty add form spanning the next hour.
    pub fn for_add(now: DateTime<Utc>) -> Self {
        Self {
            title: String::new(),
            priority: Priority::ALL_DESC[Priority::ALL_DESC.len() - 1],
            status: TaskStatus::Pending,
            start: input_time(&now),
            end: input_time(&(now + Duration::hours(1))),
            is_edit: false,
            focus: 0,
        }
    }

    pub fn for_edit(task: &Task) -> Self {
        Self {
            title: task.title.clone(),
            priority: task.priority,
            status: task.status,
            start: input_time(&task.start_time),
            end: input_time(&task.end_time),
            is_edit: true,
            focus: 0,
        }
    }

    pub fn is_edit(&self) -> bool {
        self.is_edit
    }

    pub fn fields(&self) -> &'static [Field] {
        if self.is_edit {
            EDIT_FIELDS
        } else {
            ADD_FIELDS
        }
    }

    pub fn focused(&self) -> Field {
        self.fields()[self.focus]
    }

    pub fn apply(&mut self, action: FormAction) {
        let count = self.fields().len();
        match action {
            FormAction::NextField => self.focus = (self.focus + 1) % count,
            FormAction::PrevField => self.focus = (self.focus + count - 1) % count,
            FormAction::Backspace => {
                if let Some(text) = self.text_mut() {
                    text.pop();
                }
            }
            FormAction::Input(c) => match self.focused() {
                Field::Priority => {
                    if let Some(p) = c.to_digit(10).and_then(|d| Priority::new(d as u8).ok()) {
                        self.priority = p;
                    }
                }
                Field::Status if c == ' ' => self.toggle_status(),
                _ => {
                    if let Some(text) = self.text_mut() {
                        text.push(c);
                    }
                }
            },
            FormAction::Adjust(step) => match self.focused() {
                Field::Priority => {
                    let value = (self.priority.value() as i16 + step as i16)
                        .clamp(Priority::MIN as i16, Priority::MAX as i16);
                    if let Ok(p) = Priority::new(value as u8) {
                        self.priority = p;
                    }
                }
                Field::Status => self.toggle_status(),
                _ => {}
            },
            FormAction::Cancel | FormAction::Submit => {}
        }
    }

    fn toggle_status(&mut self) {
        self.status = match self.status {
            TaskStatus::Pending => TaskStatus::Finished,
            TaskStatus::Finished => TaskStatus::Pending,
        };
    }

    fn text_mut(&mut self) -> Option<&mut String> {
        match self.focused() {
            Field::Title => Some(&mut self.title),
            Field::Start => Some(&mut self.start),
            Field::End => Some(&mut self.end),
            Field::Priority | Field::Status => None,
        }
    }

    fn display(&self, field: Field) -> String {
        match field {
            Field::Title => self.title.clone(),
            Field::Priority => self.priority.to_string(),
            Field::Status => {
                if self.status == TaskStatus::Finished {
                    "[x]".into()
                } else {
                    "[ ]".into()
                }
            }
            Field::Start => self.start.clone(),
            Field::End => self.end.clone(),
        }
    }

    pub fn to_create_input(&self) -> anyhow::Result<CreateTaskInput> {
        Ok(CreateTaskInput {
            title: self.title.trim().to_string(),
            priority: self.priority,
            start_time: parse_timestamp(&self.start)?,
            end_time: parse_timestamp(&self.end)?,
        })
    }

    /// Only the fields that differ from `task`. Times left as displayed are
    /// not re-sent.
    pub fn to_patch(&self, task: &Task) -> anyhow::Result<UpdateTaskInput> {
        let mut patch = UpdateTaskInput::default();
        let title = self.title.trim();
        if title != task.title {
            patch.title = Some(title.to_string());
        }
        if self.priority != task.priority {
            patch.priority = Some(self.priority);
        }
        if self.status != task.status {
            patch.status = Some(self.status);
        }
        if self.start.trim() != input_time(&task.start_time) {
            patch.start_time = Some(parse_timestamp(&self.start)?);
        }
        if self.end.trim() != input_time(&task.end_time) {
            patch.end_time = Some(parse_timestamp(&self.end)?);
        }
        Ok(patch)
    }
}

// ── Rendering ────────────────────────────────────────────────────

/// Centered box, `width_percent` of the screen wide, at least 40 columns.
fn popup_area(area: Rect, width_percent: u16, height: u16) -> Rect {
    let width = ((area.width as u32 * width_percent as u32) / 100) as u16;
    let width = width.max(40).min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

pub fn render(f: &mut Frame, area: Rect, form: &TaskForm) {
    let fields = form.fields();
    let popup = popup_area(area, 50, fields.len() as u16 + 5);
    f.render_widget(Clear, popup);

    let title = if form.is_edit() { " Edit Task " } else { " Add New Task " };
    let block = Block::default()
        .title(Span::styled(title, Theme::header()))
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Theme::border());

    let mut lines: Vec<Line> = fields
        .iter()
        .map(|&field| {
            let focused = field == form.focused();
            let label = if focused {
                Theme::tab_active()
            } else {
                Theme::text_dim()
            };
            let value = match field {
                Field::Priority => Theme::priority(form.priority),
                Field::Status => Theme::status(form.status),
                _ => Theme::text(),
            };
            let cursor = if focused && field.is_text() { "_" } else { "" };
            Line::from(vec![
                Span::styled(format!(" {:<9}", field.label()), label),
                Span::styled(format!("{}{cursor}", form.display(field)), value),
            ])
        })
        .collect();

    lines.push(Line::default());
    lines.push(Line::from(Span::styled(
        " Times as YYYY-MM-DDTHH:MM, local",
        Theme::text_dim(),
    )));

    f.render_widget(Paragraph::new(lines).block(block), popup);
}
