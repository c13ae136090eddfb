// src/api/types.rs — Wire types shared with the task service

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::infra::errors::{TaskMasterError, ValidationError};

// ── Priority / status ────────────────────────────────────────────

/// Task priority, 1 (lowest) to 5 (highest).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Priority(u8);

impl Priority {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    /// Highest first, the order the priority pickers list them in.
    pub const ALL_DESC: [Priority; 5] = [
        Priority(5),
        Priority(4),
        Priority(3),
        Priority(2),
        Priority(1),
    ];

    pub fn new(value: u8) -> Result<Self, ValidationError> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Self(value))
        } else {
            Err(ValidationError::PriorityOutOfRange(value))
        }
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Priority {
    type Error = ValidationError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Priority::new(value)
    }
}

impl From<Priority> for u8 {
    fn from(p: Priority) -> Self {
        p.0
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Priority {
    type Err = TaskMasterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value: u8 = s.trim().parse().map_err(|_| {
            TaskMasterError::from(ValidationError::PriorityOutOfRange(0))
        })?;
        Ok(Priority::new(value)?)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Pending,
    Finished,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Finished => "finished",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = TaskMasterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(TaskStatus::Pending),
            "finished" | "done" => Ok(TaskStatus::Finished),
            other => Err(TaskMasterError::Config(format!(
                "unknown status '{other}' (expected pending or finished)"
            ))),
        }
    }
}

// ── Task ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    #[serde(alias = "_id")]
    pub id: String,
    pub title: String,
    pub priority: Priority,
    pub status: TaskStatus,
    #[serde(with = "timestamp")]
    pub start_time: DateTime<Utc>,
    /// Estimated deadline while pending, actual completion once finished.
    #[serde(with = "timestamp")]
    pub end_time: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

impl Task {
    /// Whole hours between start and end, rounded to nearest.
    pub fn duration_hours(&self) -> i64 {
        let minutes = (self.end_time - self.start_time).num_minutes();
        (minutes as f64 / 60.0).round() as i64
    }

    pub fn is_finished(&self) -> bool {
        self.status == TaskStatus::Finished
    }

    /// Apply a partial update to a copy of this task.
    pub fn merged(&self, patch: &UpdateTaskInput) -> Task {
        let mut task = self.clone();
        if let Some(ref title) = patch.title {
            task.title = title.clone();
        }
        if let Some(priority) = patch.priority {
            task.priority = priority;
        }
        if let Some(status) = patch.status {
            task.status = status;
        }
        if let Some(start) = patch.start_time {
            task.start_time = start;
        }
        if let Some(end) = patch.end_time {
            task.end_time = end;
        }
        task
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskInput {
    pub title: String,
    pub priority: Priority,
    #[serde(with = "timestamp")]
    pub start_time: DateTime<Utc>,
    #[serde(with = "timestamp")]
    pub end_time: DateTime<Utc>,
}

impl CreateTaskInput {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.title.trim().is_empty() {
            return Err(ValidationError::EmptyTitle);
        }
        if self.end_time <= self.start_time {
            return Err(ValidationError::EndNotAfterStart);
        }
        Ok(())
    }
}

/// Partial update. Absent fields are left untouched by the server.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "opt_timestamp")]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "opt_timestamp")]
    pub end_time: Option<DateTime<Utc>>,
}

impl UpdateTaskInput {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.priority.is_none()
            && self.status.is_none()
            && self.start_time.is_none()
            && self.end_time.is_none()
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(ref title) = self.title {
            if title.trim().is_empty() {
                return Err(ValidationError::EmptyTitle);
            }
        }
        if let (Some(start), Some(end)) = (self.start_time, self.end_time) {
            if end <= start {
                return Err(ValidationError::EndNotAfterStart);
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TasksResponse {
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub total: usize,
}

/// Query string for `GET /tasks`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TaskListParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<String>,
}

// ── Stats ────────────────────────────────────────────────────────

/// Aggregate served by `GET /tasks/stats`. Display-only.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskStats {
    #[serde(default)]
    pub overview: StatsOverview,
    #[serde(default)]
    pub time_metrics: TimeMetrics,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StatsOverview {
    pub total_tasks: u64,
    pub completed_tasks: u64,
    pub pending_tasks: u64,
    pub completed_percentage: f64,
    pub pending_percentage: f64,
    pub average_time: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TimeMetrics {
    pub average_completion_time: f64,
    pub total_time_elapsed: f64,
    pub total_time_to_finish: f64,
    pub pending_tasks_by_priority: Vec<PriorityBreakdown>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PriorityBreakdown {
    pub priority: u8,
    pub count: u64,
    pub time_elapsed: f64,
    pub estimated_time_left: f64,
}

impl TaskStats {
    /// Rounded share of completed tasks, 0 when there are none.
    pub fn completed_percent(&self) -> u64 {
        percent(self.overview.completed_tasks, self.overview.total_tasks)
    }

    pub fn pending_percent(&self) -> u64 {
        percent(self.overview.pending_tasks, self.overview.total_tasks)
    }

    /// Pending breakdown for one priority level; zeros when the server
    /// omitted it.
    pub fn pending_for(&self, priority: Priority) -> PriorityBreakdown {
        self.time_metrics
            .pending_tasks_by_priority
            .iter()
            .find(|p| p.priority == priority.value())
            .cloned()
            .unwrap_or(PriorityBreakdown {
                priority: priority.value(),
                ..Default::default()
            })
    }
}

fn percent(part: u64, total: u64) -> u64 {
    if total == 0 {
        0
    } else {
        ((part as f64 / total as f64) * 100.0).round() as u64
    }
}

// ── Auth ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: User,
}

#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

// ── Timestamp encoding ───────────────────────────────────────────

/// Parse an RFC 3339 timestamp, or a zone-less `YYYY-MM-DDTHH:MM[:SS]`
/// value which is taken as UTC.
pub fn parse_wire_timestamp(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|fmt| chrono::NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(|naive| naive.and_utc())
}

fn format_wire_timestamp(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

mod timestamp {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(dt: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&super::format_wire_timestamp(dt))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(d)?;
        super::parse_wire_timestamp(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp '{raw}'")))
    }
}

mod opt_timestamp {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(dt: &Option<DateTime<Utc>>, s: S) -> Result<S::Ok, S::Error> {
        match dt {
            Some(dt) => s.serialize_str(&super::format_wire_timestamp(dt)),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        d: D,
    ) -> Result<Option<DateTime<Utc>>, D::Error> {
        let raw: Option<String> = Option::deserialize(d)?;
        match raw {
            None => Ok(None),
            Some(raw) => super::parse_wire_timestamp(&raw)
                .map(Some)
                .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp '{raw}'"))),
        }
    }
}
