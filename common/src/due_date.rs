// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
//! Urgency buckets for due dates.
//!
//! `classify` is pure: the reference instant is always passed in, so a
//! caller that wants a live badge simply calls it again with a fresh
//! `now` on its own timer.
use chrono::{DateTime, TimeZone};
use serde::{Deserialize, Serialize};

const MS_PER_HOUR: i64 = 3_600_000;
const MS_PER_DAY: i64 = 24 * MS_PER_HOUR;

/// Hours ahead of `now` (inclusive) that still count as "due soon".
pub const DUE_SOON_HOURS: i64 = 2;

/// Days ahead of `now` (inclusive) that still count as "this week".
pub const THIS_WEEK_DAYS: i64 = 7;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum DueStatus {
    Overdue,
    DueSoon,
    DueToday,
    DueTomorrow,
    DueThisWeek,
    Future,
}

impl DueStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            DueStatus::Overdue => "overdue",
            DueStatus::DueSoon => "due-soon",
            DueStatus::DueToday => "due-today",
            DueStatus::DueTomorrow => "due-tomorrow",
            DueStatus::DueThisWeek => "due-this-week",
            DueStatus::Future => "future",
        }
    }

    /// The coarser urgency level each bucket projects onto.
    pub fn urgency(self) -> Urgency {
        match self {
            DueStatus::Overdue | DueStatus::DueSoon => Urgency::High,
            DueStatus::DueToday | DueStatus::DueTomorrow => Urgency::Medium,
            DueStatus::DueThisWeek | DueStatus::Future => Urgency::Low,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    High,
    Medium,
    Low,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct DueDateStatus {
    pub status: DueStatus,
    pub urgency: Urgency,
    pub label: String,
}

impl DueDateStatus {
    fn new(status: DueStatus, label: impl Into<String>) -> Self {
        Self {
            status,
            urgency: status.urgency(),
            label: label.into(),
        }
    }
}

/// Classifies `due` relative to `now`.
///
/// Upcoming day deltas are counted in calendar days in `now`'s time
/// zone, so a deadline at 09:00 tomorrow is "due tomorrow" even when it
/// is less than 24 hours away. Anything strictly in the past is overdue,
/// and its label counts whole elapsed days: 90 minutes late is
/// "Overdue today" even across midnight. A deadline at exactly `now` is
/// due today.
pub fn classify<Tz: TimeZone>(due: &DateTime<Tz>, now: &DateTime<Tz>) -> DueDateStatus {
    let diff_ms = due
        .clone()
        .signed_duration_since(now.clone())
        .num_milliseconds();

    let today = now.date_naive();
    let due_day = due.with_timezone(&now.timezone()).date_naive();
    let diff_days = due_day.signed_duration_since(today).num_days();

    if diff_ms < 0 {
        // Ceiling of a negative day delta, i.e. full days elapsed.
        let overdue_days = -diff_ms / MS_PER_DAY;
        let label = if overdue_days == 0 {
            "Overdue today".to_string()
        } else {
            format!("{overdue_days}d overdue")
        };
        return DueDateStatus::new(DueStatus::Overdue, label);
    }

    // Ceiling of the hour delta; only meaningful for a positive delta.
    let diff_hours = (diff_ms + MS_PER_HOUR - 1) / MS_PER_HOUR;
    if diff_ms > 0 && diff_hours <= DUE_SOON_HOURS {
        return DueDateStatus::new(DueStatus::DueSoon, "Due soon");
    }

    match diff_days {
        0 => DueDateStatus::new(DueStatus::DueToday, "Due today"),
        1 => DueDateStatus::new(DueStatus::DueTomorrow, "Due tomorrow"),
        days if days <= THIS_WEEK_DAYS => {
            DueDateStatus::new(DueStatus::DueThisWeek, format!("{days} days left"))
        }
        _ => DueDateStatus::new(DueStatus::Future, due_day.format("%-m/%-d/%Y").to_string()),
    }
}
