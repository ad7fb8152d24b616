// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
//! Parsers for the smaller AI helpers: recommendations, breakdowns and
//! title/description improvements. Each one tolerates junk around the
//! payload and falls back to a fixed answer instead of failing.
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

use crate::Priority;
use crate::sanitizer::{FALLBACK_CATEGORY, find_balanced};

pub const MAX_RECOMMENDATIONS: usize = 3;
pub const DEFAULT_BREAKDOWN_MINUTES: u32 = 60;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TaskBreakdown {
    pub subtasks: Vec<String>,
    pub estimated_time: u32,
    pub priority: Priority,
    pub category: String,
    pub tags: Vec<String>,
}

impl TaskBreakdown {
    fn fallback(task_title: &str) -> Self {
        Self {
            subtasks: vec![format!("Break down: {task_title}")],
            estimated_time: DEFAULT_BREAKDOWN_MINUTES,
            priority: Priority::Medium,
            category: FALLBACK_CATEGORY.to_string(),
            tags: vec!["breakdown".to_string()],
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TaskImprovement {
    pub improved_title: String,
    pub improved_description: String,
    pub suggestions: Vec<String>,
}

impl TaskImprovement {
    fn fallback(title: &str, description: &str) -> Self {
        Self {
            improved_title: title.to_string(),
            improved_description: description.to_string(),
            suggestions: vec![
                "Consider adding specific deadlines".to_string(),
                "Break into smaller steps".to_string(),
                "Define success criteria".to_string(),
            ],
        }
    }
}

/// First three non-empty lines of the model output.
pub fn parse_recommendations(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .take(MAX_RECOMMENDATIONS)
        .map(str::to_string)
        .collect()
}

pub fn parse_breakdown(text: &str, task_title: &str) -> TaskBreakdown {
    let fallback = TaskBreakdown::fallback(task_title);
    let Some(object) = first_object(text) else {
        return fallback;
    };

    let subtasks = strings(object.get("subtasks"));
    TaskBreakdown {
        subtasks: if subtasks.is_empty() {
            fallback.subtasks
        } else {
            subtasks
        },
        estimated_time: object
            .get("estimatedTime")
            .and_then(Value::as_f64)
            .filter(|minutes| *minutes >= 1.0 && *minutes <= u32::MAX as f64)
            .map(|minutes| minutes.round() as u32)
            .unwrap_or(fallback.estimated_time),
        priority: object
            .get("priority")
            .and_then(Value::as_str)
            .and_then(Priority::parse)
            .unwrap_or(fallback.priority),
        category: text_field(&object, "category").unwrap_or(fallback.category),
        tags: strings(object.get("tags")),
    }
}

pub fn parse_improvement(text: &str, title: &str, description: &str) -> TaskImprovement {
    let fallback = TaskImprovement::fallback(title, description);
    let Some(object) = first_object(text) else {
        return fallback;
    };

    let suggestions = strings(object.get("suggestions"));
    TaskImprovement {
        improved_title: text_field(&object, "improvedTitle").unwrap_or(fallback.improved_title),
        improved_description: text_field(&object, "improvedDescription")
            .unwrap_or(fallback.improved_description),
        suggestions: if suggestions.is_empty() {
            fallback.suggestions
        } else {
            suggestions
        },
    }
}

fn first_object(text: &str) -> Option<Map<String, Value>> {
    let literal = find_balanced(text, '{', '}')?;
    match serde_json::from_str(literal) {
        Ok(object) => Some(object),
        Err(e) => {
            warn!("Failed to parse JSON object from model output: {}", e);
            None
        }
    }
}

fn text_field(object: &Map<String, Value>, key: &str) -> Option<String> {
    object
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn strings(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
