// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
pub mod assist;
pub mod clock;
pub mod due_date;
pub mod sanitizer;

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

pub use clock::{Clock, ManualClock, SystemClock};
pub use due_date::{DueDateStatus, DueStatus, Urgency, classify};
pub use sanitizer::{TaskProposal, sanitize};

/// How pressing a task is.
///
/// Stored as lowercase text in the database and serialized the same way
/// over the API. Request bodies must use one of the three labels; only
/// model output is parsed leniently (see `sanitizer`).
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }

    /// Parses a priority label, ignoring case and surrounding whitespace.
    pub fn parse(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "low" => Some(Priority::Low),
            "medium" => Some(Priority::Medium),
            "high" => Some(Priority::High),
            _ => None,
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown priority '{0}'")]
pub struct ParsePriorityError(pub String);

// Used by `sqlx::FromRow` to decode the TEXT column.
impl TryFrom<String> for Priority {
    type Error = ParsePriorityError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Priority::parse(&value).ok_or(ParsePriorityError(value))
    }
}

/// A single checklist step inside a task.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Subtask {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub completed: bool,
}

impl Subtask {
    /// Creates an open subtask with a fresh identifier.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            title: title.into(),
            completed: false,
        }
    }
}

#[allow(clippy::doc_overindented_list_items)]
/// Represents a task owned by a user.
///
/// Derivation attributes (derive):
/// - `Serialize`, `Deserialize`: Allows conversion to/from JSON (camelCase on the wire).
/// - `sqlx::FromRow`: Allows `sqlx` to create a `Task` instance directly
///    from a database result row. Tags and subtasks live in JSON text columns.
#[derive(Serialize, Deserialize, Debug, Clone, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: i64,

    pub user_id: i64,

    pub title: String,

    pub description: String,

    pub completed: bool,

    #[sqlx(try_from = "String")]
    pub priority: Priority,

    pub category: String,

    // Day granularity only, no time-of-day semantics.
    pub due_date: Option<NaiveDate>,

    // Minutes.
    pub estimated_time: Option<u32>,

    #[sqlx(json)]
    pub tags: Vec<String>,

    #[sqlx(json)]
    pub subtasks: Vec<Subtask>,

    pub notes: String,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Task {
    /// The instant the task falls due: the start of its due day, in UTC.
    pub fn due_instant(&self) -> Option<DateTime<Utc>> {
        self.due_date
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .map(|naive| naive.and_utc())
    }

    /// Classifies the task's due date against `now`, if it has one.
    pub fn due_status(&self, now: &DateTime<Utc>) -> Option<DueDateStatus> {
        self.due_instant().map(|due| classify(&due, now))
    }
}

/// Subtask as accepted from the API: the id and completion flag are
/// optional and get filled in on the server.
#[derive(Deserialize, Debug, Clone)]
pub struct SubtaskInput {
    #[serde(default)]
    pub id: Option<String>,
    pub title: String,
    #[serde(default)]
    pub completed: bool,
}

impl From<SubtaskInput> for Subtask {
    fn from(input: SubtaskInput) -> Self {
        let id = input
            .id
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        Subtask {
            id,
            title: input.title,
            completed: input.completed,
        }
    }
}

/// Structure used to receive task creation data from the API.
/// Only `title` is mandatory; everything else has a server-side default.
#[derive(Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskPayload {
    #[serde(default)]
    pub title: String,
    pub description: Option<String>,
    pub priority: Option<Priority>,
    pub category: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub estimated_time: Option<u32>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub subtasks: Vec<SubtaskInput>,
    pub notes: Option<String>,
}

/// Partial update of a task. Absent fields are left untouched.
///
/// `due_date` and `estimated_time` are double options so a client can
/// clear them by sending `null`.
#[derive(Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskPayload {
    pub title: Option<String>,
    pub description: Option<String>,
    pub completed: Option<bool>,
    pub priority: Option<Priority>,
    pub category: Option<String>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub due_date: Option<Option<NaiveDate>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub estimated_time: Option<Option<u32>>,
    pub tags: Option<Vec<String>>,
    pub subtasks: Option<Vec<SubtaskInput>>,
    pub notes: Option<String>,
}

// Distinguishes a missing field (None) from an explicit null (Some(None)).
fn deserialize_some<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: serde::Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}

impl UpdateTaskPayload {
    /// Applies the update onto an existing task, in place.
    pub fn apply_to(self, task: &mut Task) {
        if let Some(title) = self.title {
            task.title = title;
        }
        if let Some(description) = self.description {
            task.description = description;
        }
        if let Some(completed) = self.completed {
            task.completed = completed;
        }
        if let Some(priority) = self.priority {
            task.priority = priority;
        }
        if let Some(category) = self.category {
            task.category = category;
        }
        if let Some(due_date) = self.due_date {
            task.due_date = due_date;
        }
        if let Some(estimated_time) = self.estimated_time {
            task.estimated_time = estimated_time;
        }
        if let Some(tags) = self.tags {
            task.tags = tags;
        }
        if let Some(subtasks) = self.subtasks {
            task.subtasks = subtasks.into_iter().map(Subtask::from).collect();
        }
        if let Some(notes) = self.notes {
            task.notes = notes;
        }
    }
}

/// A registered account as exposed by the API. The password hash never
/// leaves the database layer.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// Registration form. Missing fields deserialize as empty strings so the
/// handler can answer with a validation message instead of a 422.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct RegisterPayload {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct LoginPayload {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Returned by register and login.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct AuthResponse {
    pub message: String,
    pub token: String,
    pub user: User,
}

/// Aggregate counters shown on the dashboard.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct TaskStats {
    pub total: usize,
    pub completed: usize,
    pub pending: usize,
    /// Rounded percentage, 0 when there are no tasks.
    pub completion_rate: u32,
    pub high_priority_pending: usize,
    pub overdue: usize,
    pub due_soon: usize,
}

impl TaskStats {
    /// Computes the counters over `tasks`, classifying pending due dates
    /// against `now`.
    pub fn from_tasks(tasks: &[Task], now: &DateTime<Utc>) -> Self {
        let total = tasks.len();
        let completed = tasks.iter().filter(|task| task.completed).count();
        let pending: Vec<&Task> = tasks.iter().filter(|task| !task.completed).collect();

        let completion_rate = if total > 0 {
            ((completed as f64 / total as f64) * 100.0).round() as u32
        } else {
            0
        };

        let high_priority_pending = pending
            .iter()
            .filter(|task| task.priority == Priority::High)
            .count();

        let statuses: Vec<DueStatus> = pending
            .iter()
            .filter_map(|task| task.due_status(now))
            .map(|status| status.status)
            .collect();

        Self {
            total,
            completed,
            pending: pending.len(),
            completion_rate,
            high_priority_pending,
            overdue: statuses.iter().filter(|s| **s == DueStatus::Overdue).count(),
            due_soon: statuses.iter().filter(|s| **s == DueStatus::DueSoon).count(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn task(id: i64, completed: bool, priority: Priority, due_date: Option<NaiveDate>) -> Task {
        let created = Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap();
        Task {
            id,
            user_id: 1,
            title: format!("Task {id}"),
            description: String::new(),
            completed,
            priority,
            category: "General".to_string(),
            due_date,
            estimated_time: None,
            tags: vec![],
            subtasks: vec![],
            notes: String::new(),
            created_at: created,
            updated_at: created,
            deleted_at: None,
        }
    }

    #[test]
    fn test_priority_parse_is_lenient_about_case() {
        assert_eq!(Priority::parse(" High "), Some(Priority::High));
        assert_eq!(Priority::parse("LOW"), Some(Priority::Low));
        assert_eq!(Priority::parse("urgent"), None);
        let err = Priority::try_from("urgent".to_string()).unwrap_err();
        assert_eq!(err.to_string(), "unknown priority 'urgent'");
    }

    #[test]
    fn test_request_bodies_reject_unknown_priority() {
        let ok: CreateTaskPayload =
            serde_json::from_str(r#"{"title":"Plan","priority":"high"}"#).unwrap();
        assert_eq!(ok.priority, Some(Priority::High));

        let rejected =
            serde_json::from_str::<CreateTaskPayload>(r#"{"title":"Plan","priority":"urgent"}"#);
        assert!(rejected.is_err());
    }

    #[test]
    fn test_subtask_input_keeps_or_assigns_id() {
        let kept = Subtask::from(SubtaskInput {
            id: Some("abc".to_string()),
            title: "Step".to_string(),
            completed: true,
        });
        assert_eq!(kept.id, "abc");
        assert!(kept.completed);

        let assigned = Subtask::from(SubtaskInput {
            id: None,
            title: "Step".to_string(),
            completed: false,
        });
        assert!(!assigned.id.is_empty());
    }

    #[test]
    fn test_update_payload_distinguishes_null_from_missing() {
        let mut target = task(1, false, Priority::Low, NaiveDate::from_ymd_opt(2024, 6, 5));
        target.estimated_time = Some(45);

        let untouched: UpdateTaskPayload = serde_json::from_str(r#"{"title":"Renamed"}"#).unwrap();
        untouched.apply_to(&mut target);
        assert_eq!(target.title, "Renamed");
        assert_eq!(target.due_date, NaiveDate::from_ymd_opt(2024, 6, 5));
        assert_eq!(target.estimated_time, Some(45));

        let cleared: UpdateTaskPayload =
            serde_json::from_str(r#"{"dueDate":null,"estimatedTime":null,"priority":"high"}"#)
                .unwrap();
        cleared.apply_to(&mut target);
        assert_eq!(target.due_date, None);
        assert_eq!(target.estimated_time, None);
        assert_eq!(target.priority, Priority::High);
    }

    #[test]
    fn test_task_serializes_camel_case() {
        let value = serde_json::to_value(task(7, false, Priority::High, None)).unwrap();
        assert_eq!(value["userId"], 1);
        assert_eq!(value["priority"], "high");
        assert!(value.get("deletedAt").is_none());
    }

    #[test]
    fn test_stats_counts_overdue_and_due_soon() {
        let now = Utc.with_ymd_and_hms(2024, 6, 10, 12, 0, 0).unwrap();
        let tasks = vec![
            task(1, true, Priority::High, None),
            task(2, false, Priority::High, NaiveDate::from_ymd_opt(2024, 6, 9)),
            task(3, false, Priority::Low, NaiveDate::from_ymd_opt(2024, 6, 20)),
            task(4, false, Priority::Medium, None),
        ];

        let stats = TaskStats::from_tasks(&tasks, &now);

        assert_eq!(stats.total, 4);
        assert_eq!(stats.completed, 1);
        assert_eq!(stats.pending, 3);
        assert_eq!(stats.completion_rate, 25);
        assert_eq!(stats.high_priority_pending, 1);
        assert_eq!(stats.overdue, 1);
        assert_eq!(stats.due_soon, 0);
    }

    #[test]
    fn test_stats_on_empty_list() {
        let now = Utc::now();
        assert_eq!(TaskStats::from_tasks(&[], &now), TaskStats::default());
    }
}
