// src/core/mutations.rs — Create / update / delete orchestration
//
// Every mutation ends in exactly one notification, except an edit that
// changes nothing, which is skipped without a request. Successful mutations
// (and every bulk delete, whatever its outcome) trigger a refetch of the
// task source so the table reconciles with the server.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::Utc;
use futures::future::join_all;

use crate::api::types::{CreateTaskInput, Task, TaskStatus, UpdateTaskInput};
use crate::api::TaskApi;
use crate::core::notify::{Notification, Notifier};
use crate::core::polling::Refetch;
use crate::infra::errors::{Result, TaskMasterError, ValidationError};

// ── Selection ────────────────────────────────────────────────────

/// Task ids ticked in the table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    ids: BTreeSet<String>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip one id. Returns whether it is selected afterwards.
    pub fn toggle(&mut self, id: &str) -> bool {
        if self.ids.remove(id) {
            false
        } else {
            self.ids.insert(id.to_string());
            true
        }
    }

    /// "Select all" checkbox: scoped to the rows currently rendered, not
    /// every matching task.
    pub fn set_all_visible(&mut self, visible: &[Task], checked: bool) {
        self.ids.clear();
        if checked {
            self.ids.extend(visible.iter().map(|t| t.id.clone()));
        }
    }

    pub fn all_selected(&self, visible: &[Task]) -> bool {
        !visible.is_empty() && visible.iter().all(|t| self.ids.contains(&t.id))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    pub fn ids(&self) -> Vec<String> {
        self.ids.iter().cloned().collect()
    }
}

// ── Messages ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    Create,
    Update,
    Delete,
}

impl MutationKind {
    fn verb(self) -> &'static str {
        match self {
            MutationKind::Create => "create",
            MutationKind::Update => "update",
            MutationKind::Delete => "delete",
        }
    }
}

pub const TASK_GONE_MESSAGE: &str = "Task no longer exists";

/// User-facing text for a failed mutation.
pub fn failure_message(err: &TaskMasterError, kind: MutationKind) -> String {
    match err {
        TaskMasterError::Validation(v) => return v.to_string(),
        TaskMasterError::NotFound { .. } if kind != MutationKind::Create => {
            return TASK_GONE_MESSAGE.to_string()
        }
        _ => {}
    }

    // Server-side validation failures carry free text; recognise the
    // same three rules the client checks.
    let detail = err.detail().to_lowercase();
    if detail.contains("end time") || detail.contains("endtime") {
        ValidationError::EndNotAfterStart.to_string()
    } else if detail.contains("title") {
        ValidationError::EmptyTitle.to_string()
    } else if detail.contains("priority") {
        ValidationError::PriorityOutOfRange(0).to_string()
    } else {
        format!("Failed to {} task", kind.verb())
    }
}

// ── Bulk delete ──────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BulkDeleteReport {
    pub deleted: Vec<String>,
    /// `(id, error detail)` for each delete that failed.
    pub failed: Vec<(String, String)>,
}

impl BulkDeleteReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn attempted(&self) -> usize {
        self.deleted.len() + self.failed.len()
    }
}

// ── Coordinator ──────────────────────────────────────────────────

/// Which editor, if any, is open.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Dialog {
    #[default]
    Closed,
    Add,
    Edit(Task),
}

pub struct TaskMutationCoordinator {
    api: Arc<dyn TaskApi>,
    notifier: Arc<dyn Notifier>,
    refetch: Arc<dyn Refetch>,
    selection: Selection,
    dialog: Dialog,
}

impl TaskMutationCoordinator {
    pub fn new(api: Arc<dyn TaskApi>, notifier: Arc<dyn Notifier>, refetch: Arc<dyn Refetch>) -> Self {
        Self {
            api,
            notifier,
            refetch,
            selection: Selection::new(),
            dialog: Dialog::Closed,
        }
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn selection_mut(&mut self) -> &mut Selection {
        &mut self.selection
    }

    pub fn dialog(&self) -> &Dialog {
        &self.dialog
    }

    pub fn is_add_dialog_open(&self) -> bool {
        self.dialog == Dialog::Add
    }

    pub fn open_add_dialog(&mut self) {
        self.dialog = Dialog::Add;
    }

    pub fn open_edit_dialog(&mut self, task: Task) {
        self.dialog = Dialog::Edit(task);
    }

    pub fn close_dialogs(&mut self) {
        self.dialog = Dialog::Closed;
    }

    /// The task open in the edit dialog, if any.
    pub fn editing(&self) -> Option<&Task> {
        match self.dialog {
            Dialog::Edit(ref task) => Some(task),
            _ => None,
        }
    }

    fn fail(&self, err: TaskMasterError, kind: MutationKind) -> TaskMasterError {
        let message = failure_message(&err, kind);
        tracing::warn!("Failed to {} task: {err}", kind.verb());
        self.notifier.notify(Notification::error(message));
        err
    }

    /// Validate locally, then create. Invalid input never reaches the API.
    pub async fn add_task(&mut self, input: CreateTaskInput) -> Result<Task> {
        if let Err(v) = input.validate() {
            return Err(self.fail(v.into(), MutationKind::Create));
        }

        match self.api.create_task(&input).await {
            Ok(task) => {
                tracing::info!("Created task {} ({})", task.id, task.title);
                if self.dialog == Dialog::Add {
                    self.dialog = Dialog::Closed;
                }
                self.notifier
                    .notify(Notification::success("Task created successfully"));
                self.refetch.refetch().await;
                Ok(task)
            }
            Err(e) => Err(self.fail(e, MutationKind::Create)),
        }
    }

    /// Send a partial update. Finishing a pending task without an explicit
    /// end time stamps the end time with the current time.
    pub async fn edit_task(&mut self, task: &Task, mut patch: UpdateTaskInput) -> Result<Task> {
        if patch.status == Some(TaskStatus::Finished)
            && task.status != TaskStatus::Finished
            && patch.end_time.is_none()
        {
            patch.end_time = Some(Utc::now());
        }

        if let Err(v) = patch.validate() {
            return Err(self.fail(v.into(), MutationKind::Update));
        }

        if task.merged(&patch) == *task {
            tracing::debug!("Edit of task {} changes nothing; skipping", task.id);
            self.close_edit_dialog();
            return Ok(task.clone());
        }

        match self.api.update_task(&task.id, &patch).await {
            Ok(updated) => {
                tracing::info!("Updated task {}", updated.id);
                self.close_edit_dialog();
                self.notifier
                    .notify(Notification::success("Task updated successfully"));
                self.refetch.refetch().await;
                Ok(updated)
            }
            Err(e) => Err(self.fail(e, MutationKind::Update)),
        }
    }

    /// Mark a task finished now.
    pub async fn finish_task(&mut self, task: &Task) -> Result<Task> {
        let patch = UpdateTaskInput {
            status: Some(TaskStatus::Finished),
            ..Default::default()
        };
        self.edit_task(task, patch).await
    }

    fn close_edit_dialog(&mut self) {
        if matches!(self.dialog, Dialog::Edit(_)) {
            self.dialog = Dialog::Closed;
        }
    }

    /// Delete every id concurrently. Best effort: successes are not rolled
    /// back when a sibling fails. Selection is cleared and the source
    /// refetched regardless of outcome. An empty list does nothing.
    pub async fn delete_tasks(&mut self, ids: &[String]) -> BulkDeleteReport {
        if ids.is_empty() {
            return BulkDeleteReport::default();
        }

        let api = &self.api;
        let results = join_all(ids.iter().map(|id| async move {
            let outcome = api.delete_task(id).await;
            (id.clone(), outcome)
        }))
        .await;

        let mut report = BulkDeleteReport::default();
        for (id, outcome) in results {
            match outcome {
                Ok(()) => report.deleted.push(id),
                Err(e) => {
                    tracing::warn!("Failed to delete task {id}: {e}");
                    report.failed.push((id, e.detail()));
                }
            }
        }

        if report.is_success() {
            tracing::info!("Deleted {} task(s)", report.deleted.len());
            let noun = if report.deleted.len() == 1 { "task" } else { "tasks" };
            self.notifier.notify(Notification::success(format!(
                "Deleted {} {noun}",
                report.deleted.len()
            )));
        } else {
            self.notifier.notify(Notification::error(format!(
                "Failed to delete {} of {} tasks",
                report.failed.len(),
                report.attempted()
            )));
        }

        self.selection.clear();
        self.refetch.refetch().await;
        report
    }

    pub async fn delete_selected(&mut self) -> BulkDeleteReport {
        let ids = self.selection.ids();
        self.delete_tasks(&ids).await
    }
}
