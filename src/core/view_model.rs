// src/core/view_model.rs — Filter → sort → paginate for the task table
//
// Pure functions over a task slice. Nothing here knows how the tasks
// arrived, so it is safe to re-run on every redraw.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};

use crate::api::types::{Priority, Task, TaskListParams, TaskStatus};
use crate::infra::errors::TaskMasterError;

pub const DEFAULT_PAGE_SIZE: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortField {
    StartTime,
    EndTime,
}

impl SortField {
    pub fn key(self, task: &Task) -> DateTime<Utc> {
        match self {
            SortField::StartTime => task.start_time,
            SortField::EndTime => task.end_time,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SortField::StartTime => "startTime",
            SortField::EndTime => "endTime",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SortField::StartTime => "Start Time",
            SortField::EndTime => "End Time",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SortOrder {
    pub field: SortField,
    pub direction: SortDirection,
}

impl SortOrder {
    pub const fn new(field: SortField, direction: SortDirection) -> Self {
        Self { field, direction }
    }

    /// Every selectable ordering, in picker order.
    pub const ALL: [SortOrder; 4] = [
        SortOrder::new(SortField::StartTime, SortDirection::Asc),
        SortOrder::new(SortField::StartTime, SortDirection::Desc),
        SortOrder::new(SortField::EndTime, SortDirection::Asc),
        SortOrder::new(SortField::EndTime, SortDirection::Desc),
    ];

    pub fn compare(&self, a: &Task, b: &Task) -> Ordering {
        let ord = self.field.key(a).cmp(&self.field.key(b));
        match self.direction {
            SortDirection::Asc => ord,
            SortDirection::Desc => ord.reverse(),
        }
    }

    /// The next entry of `ALL`, wrapping around.
    pub fn cycle(self) -> SortOrder {
        let idx = SortOrder::ALL.iter().position(|o| *o == self).unwrap_or(0);
        SortOrder::ALL[(idx + 1) % SortOrder::ALL.len()]
    }

    pub fn label(&self) -> String {
        let dir = match self.direction {
            SortDirection::Asc => "Asc",
            SortDirection::Desc => "Desc",
        };
        format!("{}: {dir}", self.field.label())
    }
}

impl Default for SortOrder {
    fn default() -> Self {
        SortOrder::new(SortField::StartTime, SortDirection::Asc)
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.field.as_str(), self.direction.as_str())
    }
}

impl FromStr for SortOrder {
    type Err = TaskMasterError;

    /// Parses `field[:direction]`, e.g. `endTime:desc`. Direction defaults
    /// to ascending.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (field, direction) = s.trim().split_once(':').unwrap_or((s.trim(), "asc"));
        let field = match field {
            "startTime" | "start" => SortField::StartTime,
            "endTime" | "end" => SortField::EndTime,
            other => {
                return Err(TaskMasterError::Config(format!(
                    "unknown sort field '{other}' (expected startTime or endTime)"
                )))
            }
        };
        let direction = match direction.to_lowercase().as_str() {
            "asc" => SortDirection::Asc,
            "desc" => SortDirection::Desc,
            other => {
                return Err(TaskMasterError::Config(format!(
                    "unknown sort direction '{other}' (expected asc or desc)"
                )))
            }
        };
        Ok(SortOrder { field, direction })
    }
}

/// Client-held view state for the task table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskQuery {
    /// 1-based.
    pub page: usize,
    pub page_size: usize,
    pub sort: SortOrder,
    pub priority: Option<Priority>,
    pub status: Option<TaskStatus>,
}

impl Default for TaskQuery {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
            sort: SortOrder::default(),
            priority: None,
            status: None,
        }
    }
}

impl TaskQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, page: usize) -> Self {
        self.page = page.max(1);
        self
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn with_sort(mut self, sort: SortOrder) -> Self {
        self.sort = sort;
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn matches(&self, task: &Task) -> bool {
        self.priority.is_none_or(|p| task.priority == p)
            && self.status.is_none_or(|s| task.status == s)
    }

    /// The same view expressed as `GET /tasks` query parameters.
    pub fn to_list_params(&self) -> TaskListParams {
        TaskListParams {
            page: Some(self.page),
            limit: Some(self.page_size),
            priority: self.priority.map(Priority::value),
            status: self.status,
            field: Some(self.sort.field.as_str().to_string()),
            order: Some(self.sort.direction.as_str().to_string()),
        }
    }
}

/// One rendered page of the task table.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskPage {
    pub rows: Vec<Task>,
    pub total_matching: usize,
    /// Never less than 1, so an empty table still reads "page 1 of 1".
    pub total_pages: usize,
    pub page: usize,
}

impl TaskPage {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

pub fn total_pages(matching: usize, page_size: usize) -> usize {
    matching.div_ceil(page_size.max(1)).max(1)
}

/// Run the filter → stable sort → slice pipeline. A page past the end
/// yields no rows; clamping is the caller's business.
pub fn apply(tasks: &[Task], query: &TaskQuery) -> TaskPage {
    let mut matching: Vec<&Task> = tasks.iter().filter(|t| query.matches(t)).collect();
    matching.sort_by(|a, b| query.sort.compare(a, b));

    let page_size = query.page_size.max(1);
    let page = query.page.max(1);
    let start = (page - 1).saturating_mul(page_size);

    let rows = matching
        .iter()
        .skip(start)
        .take(page_size)
        .map(|t| (*t).clone())
        .collect();

    TaskPage {
        rows,
        total_matching: matching.len(),
        total_pages: total_pages(matching.len(), page_size),
        page,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2023, 6, 1, 9, 0, 0).unwrap()
    }

    fn task(id: &str, priority: u8, status: TaskStatus, start_h: i64, end_h: i64) -> Task {
        Task {
            id: id.into(),
            title: format!("Task {id}"),
            priority: Priority::new(priority).unwrap(),
            status,
            start_time: t0() + chrono::Duration::hours(start_h),
            end_time: t0() + chrono::Duration::hours(end_h),
            user_id: None,
        }
    }

    fn ids(page: &TaskPage) -> Vec<&str> {
        page.rows.iter().map(|t| t.id.as_str()).collect()
    }

    fn sample() -> Vec<Task> {
        vec![
            task("a", 5, TaskStatus::Pending, 0, 40),
            task("b", 1, TaskStatus::Finished, 2, 10),
            task("c", 3, TaskStatus::Pending, 1, 5),
            task("d", 5, TaskStatus::Finished, 3, 4),
        ]
    }

    #[test]
    fn test_priority_filter_keeps_only_matching() {
        let tasks = vec![
            task("first", 5, TaskStatus::Pending, 0, 40),
            task("second", 1, TaskStatus::Finished, 0, 8),
        ];
        let page = apply(&tasks, &TaskQuery::new().with_priority(Priority::new(5).unwrap()));
        assert_eq!(ids(&page), vec!["first"]);
        assert_eq!(page.total_matching, 1);
    }

    #[test]
    fn test_filters_combine() {
        let query = TaskQuery::new()
            .with_priority(Priority::new(5).unwrap())
            .with_status(TaskStatus::Finished);
        assert_eq!(ids(&apply(&sample(), &query)), vec!["d"]);
    }

    #[test]
    fn test_sort_by_start_asc_and_desc() {
        let asc = apply(&sample(), &TaskQuery::new());
        assert_eq!(ids(&asc), vec!["a", "c", "b", "d"]);

        let desc = apply(
            &sample(),
            &TaskQuery::new().with_sort("startTime:desc".parse().unwrap()),
        );
        assert_eq!(ids(&desc), vec!["d", "b", "c", "a"]);
    }

    #[test]
    fn test_sort_by_end_time() {
        let page = apply(
            &sample(),
            &TaskQuery::new().with_sort("endTime:asc".parse().unwrap()),
        );
        assert_eq!(ids(&page), vec!["d", "c", "b", "a"]);
    }

    #[test]
    fn test_sort_is_stable_for_ties() {
        let tasks = vec![
            task("x", 2, TaskStatus::Pending, 1, 9),
            task("y", 2, TaskStatus::Pending, 1, 9),
            task("z", 2, TaskStatus::Pending, 0, 9),
        ];
        let asc = apply(&tasks, &TaskQuery::new());
        assert_eq!(ids(&asc), vec!["z", "x", "y"]);

        let desc = apply(
            &tasks,
            &TaskQuery::new().with_sort("startTime:desc".parse().unwrap()),
        );
        assert_eq!(ids(&desc), vec!["x", "y", "z"]);
    }

    #[test]
    fn test_pagination_slices_and_counts() {
        let tasks: Vec<Task> = (0..23)
            .map(|i| task(&format!("t{i:02}"), 3, TaskStatus::Pending, i, i + 1))
            .collect();
        let q = TaskQuery::new().with_page_size(10);

        let p1 = apply(&tasks, &q.clone().with_page(1));
        assert_eq!(p1.rows.len(), 10);
        assert_eq!(p1.total_pages, 3);
        assert_eq!(p1.rows[0].id, "t00");

        let p3 = apply(&tasks, &q.clone().with_page(3));
        assert_eq!(ids(&p3), vec!["t20", "t21", "t22"]);
    }

    #[test]
    fn test_page_past_end_is_empty_not_clamped() {
        let page = apply(&sample(), &TaskQuery::new().with_page(7));
        assert!(page.is_empty());
        assert_eq!(page.page, 7);
        assert_eq!(page.total_pages, 1);
        assert_eq!(page.total_matching, 4);
    }

    #[test]
    fn test_empty_input_has_one_page() {
        let page = apply(&[], &TaskQuery::new());
        assert!(page.rows.is_empty());
        assert_eq!(page.total_matching, 0);
        assert_eq!(page.total_pages, 1);
    }

    #[test]
    fn test_total_pages_formula() {
        assert_eq!(total_pages(0, 10), 1);
        assert_eq!(total_pages(10, 10), 1);
        assert_eq!(total_pages(11, 10), 2);
        assert_eq!(total_pages(5, 0), 5);
    }

    #[test]
    fn test_apply_is_idempotent() {
        let tasks = sample();
        let q = TaskQuery::new()
            .with_status(TaskStatus::Pending)
            .with_sort("endTime:desc".parse().unwrap());
        assert_eq!(apply(&tasks, &q), apply(&tasks, &q));
    }

    #[test]
    fn test_invariants_over_many_queries() {
        let tasks: Vec<Task> = (0..37)
            .map(|i| {
                let status = if i % 3 == 0 {
                    TaskStatus::Finished
                } else {
                    TaskStatus::Pending
                };
                task(&format!("t{i}"), (i % 5 + 1) as u8, status, (i * 7) % 11, 20 + i % 4)
            })
            .collect();

        for priority in [None, Some(1u8), Some(3), Some(5)] {
            for status in [None, Some(TaskStatus::Pending), Some(TaskStatus::Finished)] {
                for sort in SortOrder::ALL {
                    for page in 1..=4 {
                        let mut q = TaskQuery::new().with_page(page).with_page_size(4).with_sort(sort);
                        q.priority = priority.map(|p| Priority::new(p).unwrap());
                        q.status = status;
                        let out = apply(&tasks, &q);

                        assert!(out.rows.len() <= 4);
                        assert!(out.rows.iter().all(|t| q.matches(t)));
                        assert!(out
                            .rows
                            .windows(2)
                            .all(|w| sort.compare(&w[0], &w[1]) != Ordering::Greater));
                        let filtered = tasks.iter().filter(|t| q.matches(t)).count();
                        assert_eq!(out.total_matching, filtered);
                        assert_eq!(out.total_pages, std::cmp::max(1, filtered.div_ceil(4)));
                    }
                }
            }
        }
    }

    #[test]
    fn test_sort_order_parse_and_display() {
        let order: SortOrder = "endTime:desc".parse().unwrap();
        assert_eq!(order.to_string(), "endTime:desc");
        assert_eq!("startTime".parse::<SortOrder>().unwrap(), SortOrder::default());
        assert!("title:asc".parse::<SortOrder>().is_err());
        assert!("endTime:sideways".parse::<SortOrder>().is_err());
    }

    #[test]
    fn test_sort_cycle_wraps() {
        let mut order = SortOrder::default();
        for _ in 0..SortOrder::ALL.len() {
            order = order.cycle();
        }
        assert_eq!(order, SortOrder::default());
        assert_eq!(SortOrder::default().cycle().label(), "Start Time: Desc");
    }

    #[test]
    fn test_to_list_params() {
        let q = TaskQuery::new()
            .with_page(2)
            .with_priority(Priority::new(4).unwrap())
            .with_sort("endTime:desc".parse().unwrap());
        let params = q.to_list_params();
        assert_eq!(params.page, Some(2));
        assert_eq!(params.limit, Some(DEFAULT_PAGE_SIZE));
        assert_eq!(params.priority, Some(4));
        assert_eq!(params.status, None);
        assert_eq!(params.field.as_deref(), Some("endTime"));
        assert_eq!(params.order.as_deref(), Some("desc"));
    }
}
