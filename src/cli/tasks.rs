// src/cli/tasks.rs — Task listing and one-shot mutations

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};

use crate::api::types::{CreateTaskInput, Priority, Task, TaskStatus, UpdateTaskInput};
use crate::api::{fetch_all_tasks, TaskApi};
use crate::cli::AlreadyReported;
use crate::core::mutations::{TaskMutationCoordinator, TASK_GONE_MESSAGE};
use crate::core::notify::ConsoleNotifier;
use crate::core::polling::Refetch;
use crate::core::view_model::{self, TaskPage, TaskQuery};

const LOCAL_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%d %H:%M:%S",
];

/// Parse a user-entered timestamp: RFC 3339, or a zone-less
/// `YYYY-MM-DDTHH:MM` in the local time zone.
pub fn parse_timestamp(input: &str) -> anyhow::Result<DateTime<Utc>> {
    let input = input.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Ok(dt.with_timezone(&Utc));
    }
    for fmt in LOCAL_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(input, fmt) {
            return Local
                .from_local_datetime(&naive)
                .earliest()
                .map(|dt| dt.with_timezone(&Utc))
                .ok_or_else(|| anyhow::anyhow!("'{input}' does not exist in the local time zone"));
        }
    }
    anyhow::bail!("Invalid time '{input}' (expected YYYY-MM-DDTHH:MM or RFC 3339)")
}

fn format_local(dt: &DateTime<Utc>) -> String {
    dt.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string()
}

/// One-shot commands have no live table to reconcile.
struct NoRefetch;

#[async_trait]
impl Refetch for NoRefetch {
    async fn refetch(&self) {}
}

fn coordinator(api: Arc<dyn TaskApi>) -> TaskMutationCoordinator {
    TaskMutationCoordinator::new(api, Arc::new(ConsoleNotifier), Arc::new(NoRefetch))
}

// ─── Listing ────────────────────────────────────────────────────────────────

/// Handle `taskmaster tasks`.
pub async fn run_list(api: &dyn TaskApi, query: TaskQuery) -> anyhow::Result<()> {
    let tasks = fetch_all_tasks(api).await.map_err(|e| anyhow::anyhow!("{}", e.detail()))?;
    let page = view_model::apply(&tasks, &query);
    print!("{}", render_table(&page, &query));
    Ok(())
}

pub fn render_table(page: &TaskPage, query: &TaskQuery) -> String {
    let mut out = String::new();
    if page.is_empty() {
        out.push_str("No tasks found.\n");
    } else {
        let title_width = page
            .rows
            .iter()
            .map(|t| t.title.chars().count())
            .max()
            .unwrap_or(5)
            .clamp(5, 40);
        out.push_str(&format!(
            "{:<24}  {:<tw$}  {:>3}  {:<8}  {:<16}  {:<16}  {:>5}\n",
            "ID",
            "Title",
            "Pri",
            "Status",
            "Start",
            "End",
            "Hours",
            tw = title_width
        ));
        for task in &page.rows {
            out.push_str(&format!(
                "{:<24}  {:<tw$}  {:>3}  {:<8}  {:<16}  {:<16}  {:>5}\n",
                task.id,
                truncate(&task.title, title_width),
                task.priority,
                task.status,
                format_local(&task.start_time),
                format_local(&task.end_time),
                task.duration_hours(),
                tw = title_width
            ));
        }
    }

    let mut filters = Vec::new();
    if let Some(p) = query.priority {
        filters.push(format!("priority {p}"));
    }
    if let Some(s) = query.status {
        filters.push(format!("status {s}"));
    }
    out.push_str(&format!(
        "\nPage {} of {} · {} matching · sorted by {}",
        page.page,
        page.total_pages,
        page.total_matching,
        query.sort.label()
    ));
    if !filters.is_empty() {
        out.push_str(&format!(" · {}", filters.join(", ")));
    }
    out.push('\n');
    out
}

fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        s.to_string()
    } else {
        let mut t: String = s.chars().take(width.saturating_sub(1)).collect();
        t.push('…');
        t
    }
}

// ─── Mutations ──────────────────────────────────────────────────────────────

/// Handle `taskmaster add`; prompts for whatever was not passed.
pub async fn run_add(
    api: Arc<dyn TaskApi>,
    title: Option<String>,
    priority: Option<Priority>,
    start: Option<String>,
    end: Option<String>,
) -> anyhow::Result<()> {
    let title = match title {
        Some(t) => t,
        None => inquire::Text::new("Title:").prompt()?,
    };
    let priority = match priority {
        Some(p) => p,
        None => inquire::Select::new("Priority:", Priority::ALL_DESC.to_vec()).prompt()?,
    };
    let start = match start {
        Some(s) => s,
        None => inquire::Text::new("Start (YYYY-MM-DDTHH:MM):").prompt()?,
    };
    let end = match end {
        Some(s) => s,
        None => inquire::Text::new("End (YYYY-MM-DDTHH:MM):").prompt()?,
    };

    let input = CreateTaskInput {
        title,
        priority,
        start_time: parse_timestamp(&start)?,
        end_time: parse_timestamp(&end)?,
    };

    let task = coordinator(api)
        .add_task(input)
        .await
        .map_err(|e| AlreadyReported(e.to_string()))?;
    println!("  {} · {}", task.id, task.title);
    Ok(())
}

/// Look up one task by id among everything the user owns.
async fn find_task(api: &dyn TaskApi, id: &str) -> anyhow::Result<Task> {
    let tasks = fetch_all_tasks(api).await.map_err(|e| anyhow::anyhow!("{}", e.detail()))?;
    tasks
        .into_iter()
        .find(|t| t.id == id)
        .ok_or_else(|| anyhow::anyhow!("{TASK_GONE_MESSAGE}: {id}"))
}

/// Handle `taskmaster edit`.
#[allow(clippy::too_many_arguments)]
pub async fn run_edit(
    api: Arc<dyn TaskApi>,
    id: &str,
    title: Option<String>,
    priority: Option<Priority>,
    status: Option<TaskStatus>,
    start: Option<String>,
    end: Option<String>,
) -> anyhow::Result<()> {
    let patch = UpdateTaskInput {
        title,
        priority,
        status,
        start_time: start.as_deref().map(parse_timestamp).transpose()?,
        end_time: end.as_deref().map(parse_timestamp).transpose()?,
    };
    if patch.is_empty() {
        anyhow::bail!("Nothing to change; pass at least one of --title, --priority, --status, --start, --end");
    }

    let task = find_task(api.as_ref(), id).await?;
    coordinator(api)
        .edit_task(&task, patch)
        .await
        .map_err(|e| AlreadyReported(e.to_string()))?;
    Ok(())
}

/// Handle `taskmaster finish`.
pub async fn run_finish(api: Arc<dyn TaskApi>, id: &str) -> anyhow::Result<()> {
    let task = find_task(api.as_ref(), id).await?;
    if task.is_finished() {
        println!("Task {id} is already finished.");
        return Ok(());
    }
    coordinator(api)
        .finish_task(&task)
        .await
        .map_err(|e| AlreadyReported(e.to_string()))?;
    Ok(())
}

/// Handle `taskmaster delete`.
pub async fn run_delete(api: Arc<dyn TaskApi>, ids: &[String]) -> anyhow::Result<()> {
    let report = coordinator(api).delete_tasks(ids).await;
    for (id, reason) in &report.failed {
        eprintln!("  {id}: {reason}");
    }
    if report.is_success() {
        Ok(())
    } else {
        Err(AlreadyReported(format!(
            "Failed to delete {} of {} tasks",
            report.failed.len(),
            report.attempted()
        ))
        .into())
    }
}
