// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
//! Turns free-form model output into validated task proposals.
//!
//! Two extraction strategies are tried in order: a strict one that looks
//! for a JSON array of task objects, and a line-oriented one used when no
//! parseable array is present. Whatever comes out is then given a due
//! date strictly after `today`.
use chrono::{DateTime, Days, NaiveDate};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::{CreateTaskPayload, Priority, SubtaskInput};

pub const FALLBACK_CATEGORY: &str = "General";
pub const GENERATED_CATEGORY: &str = "AI Generated";
pub const GENERATED_DESCRIPTION: &str = "AI-generated task based on your request";
pub const GENERATED_TAG: &str = "ai-generated";
pub const DEFAULT_ESTIMATED_MINUTES: u32 = 30;

/// Due dates further out than this are treated as hallucinated.
pub const MAX_HORIZON_DAYS: i64 = 365;

const SIMPLE_REQUEST_MAX_CHARS: usize = 50;
const MAX_LINE_TASKS: usize = 4;

lazy_static! {
    // "1.", "12. " and the like at the start of a line.
    static ref ORDINAL_MARKER: Regex = Regex::new(r"^\d+\.\s*").unwrap();
}

/// A candidate task produced from model output, not yet persisted.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TaskProposal {
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub category: String,
    pub due_date: Option<NaiveDate>,
    pub estimated_time: Option<u32>,
    pub tags: Vec<String>,
    pub subtasks: Vec<String>,
}

impl TaskProposal {
    /// Converts the proposal into a creation payload. Subtask identities
    /// are assigned when the payload is stored.
    pub fn into_create_payload(self) -> CreateTaskPayload {
        CreateTaskPayload {
            title: self.title,
            description: Some(self.description),
            priority: Some(self.priority),
            category: Some(self.category),
            due_date: self.due_date,
            estimated_time: self.estimated_time,
            tags: self.tags,
            subtasks: self
                .subtasks
                .into_iter()
                .map(|title| SubtaskInput {
                    id: None,
                    title,
                    completed: false,
                })
                .collect(),
            notes: None,
        }
    }
}

/// A proposal whose due date has not been settled yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Draft {
    pub proposal: TaskProposal,
    /// Window used if the due date has to be replaced. Differs from
    /// `proposal.priority` only when the model sent an unknown priority.
    pub schedule: Priority,
}

/// Runs the full pipeline: extraction, due-date repair and the final
/// future-only filter.
pub fn sanitize(raw_text: &str, context_hint: &str, today: NaiveDate) -> Vec<TaskProposal> {
    let drafts = match extract_structured(raw_text) {
        Some(drafts) => drafts,
        None => {
            debug!("No usable JSON array in model output, using line extraction.");
            extract_lines(raw_text, context_hint)
        }
    };

    let proposals = normalize_due_dates(drafts, today);
    let kept = retain_future(proposals, today);
    debug!("Sanitized model output into {} proposals.", kept.len());
    kept
}

/// Parses the first balanced `[...]` in `raw_text` as a list of task
/// objects. Returns `None` when there is no array or it is not a valid
/// JSON list of objects. Objects without a usable title are skipped.
pub fn extract_structured(raw_text: &str) -> Option<Vec<Draft>> {
    let literal = find_balanced(raw_text, '[', ']')?;

    let items: Vec<Map<String, Value>> = match serde_json::from_str(literal) {
        Ok(items) => items,
        Err(e) => {
            warn!("Failed to parse task array from model output: {}", e);
            return None;
        }
    };

    let drafts = items
        .iter()
        .filter_map(|item| {
            let draft = draft_from_object(item);
            if draft.is_none() {
                debug!("Skipping task object without a title.");
            }
            draft
        })
        .collect();

    Some(drafts)
}

/// Line-oriented fallback. Each surviving line becomes a minimal
/// proposal without a due date; priorities follow position.
pub fn extract_lines(raw_text: &str, context_hint: &str) -> Vec<Draft> {
    let limit = if is_simple_request(context_hint) {
        1
    } else {
        MAX_LINE_TASKS
    };

    raw_text
        .lines()
        .filter_map(strip_ordinal)
        .take(limit)
        .enumerate()
        .map(|(index, line)| {
            let priority = priority_for_position(index);
            Draft {
                proposal: TaskProposal {
                    title: line.to_string(),
                    description: GENERATED_DESCRIPTION.to_string(),
                    priority,
                    category: GENERATED_CATEGORY.to_string(),
                    due_date: None,
                    estimated_time: Some(DEFAULT_ESTIMATED_MINUTES),
                    tags: vec![GENERATED_TAG.to_string()],
                    subtasks: vec![],
                },
                schedule: priority,
            }
        })
        .collect()
}

/// A request is "simple" when it is short and names a single thing.
pub fn is_simple_request(context_hint: &str) -> bool {
    context_hint.chars().count() < SIMPLE_REQUEST_MAX_CHARS
        && !context_hint.contains(" and ")
        && !context_hint.contains(',')
}

fn priority_for_position(index: usize) -> Priority {
    match index {
        0 | 1 => Priority::High,
        2 | 3 => Priority::Medium,
        _ => Priority::Low,
    }
}

// Trims the line and removes a leading "N." marker. Lines that are blank,
// or nothing but a marker, are dropped.
fn strip_ordinal(line: &str) -> Option<&str> {
    let line = line.trim();
    let rest = match ORDINAL_MARKER.find(line) {
        Some(marker) => line[marker.end()..].trim(),
        None => line,
    };
    (!rest.is_empty()).then_some(rest)
}

/// Keeps valid due dates and replaces the rest. `index` for each draft is
/// its position in `drafts`.
pub fn normalize_due_dates(drafts: Vec<Draft>, today: NaiveDate) -> Vec<TaskProposal> {
    drafts
        .into_iter()
        .enumerate()
        .map(|(index, Draft { mut proposal, schedule })| {
            if !is_valid_due_date(proposal.due_date, today) {
                let replacement = replacement_due_date(schedule, index, today);
                debug!(
                    "Replacing due date {:?} of '{}' with {}.",
                    proposal.due_date, proposal.title, replacement
                );
                proposal.due_date = Some(replacement);
            }
            proposal
        })
        .collect()
}

/// A due date is usable when it falls 1 to 365 days after `today`.
pub fn is_valid_due_date(due_date: Option<NaiveDate>, today: NaiveDate) -> bool {
    match due_date {
        Some(date) => {
            let diff_days = date.signed_duration_since(today).num_days();
            diff_days > 0 && diff_days <= MAX_HORIZON_DAYS
        }
        None => false,
    }
}

/// Deterministic replacement date for the proposal at `index`:
/// high lands 1-2 days out, medium 3-7, low 7-21.
pub fn replacement_due_date(priority: Priority, index: usize, today: NaiveDate) -> NaiveDate {
    let offset = match priority {
        Priority::High => 1 + index % 2,
        Priority::Medium => 3 + index % 5,
        Priority::Low => 7 + index % 15,
    };
    today
        .checked_add_days(Days::new(offset as u64))
        .unwrap_or(NaiveDate::MAX)
}

/// Drops proposals dated `today` or earlier. Undated proposals stay.
pub fn retain_future(proposals: Vec<TaskProposal>, today: NaiveDate) -> Vec<TaskProposal> {
    proposals
        .into_iter()
        .filter(|proposal| proposal.due_date.is_none_or(|date| date > today))
        .collect()
}

/// Returns the first balanced literal delimited by `open`/`close`,
/// ignoring delimiters that appear inside JSON strings.
pub fn find_balanced(text: &str, open: char, close: char) -> Option<&str> {
    let start = text.find(open)?;
    // The scan starts on `open`, so `depth` is at least 1 before any `close`.
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, c) in text[start..].char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }

        if c == '"' {
            in_string = true;
        } else if c == open {
            depth += 1;
        } else if c == close {
            depth -= 1;
            if depth == 0 {
                let end = start + offset + c.len_utf8();
                return Some(&text[start..end]);
            }
        }
    }

    None
}

fn draft_from_object(item: &Map<String, Value>) -> Option<Draft> {
    let title = non_empty_str(item.get("title"))?.to_string();

    let (priority, schedule) = match item.get("priority") {
        None | Some(Value::Null) => (Priority::Medium, Priority::Medium),
        Some(Value::String(label)) if label.trim().is_empty() => {
            (Priority::Medium, Priority::Medium)
        }
        Some(value) => match value.as_str().and_then(Priority::parse) {
            Some(priority) => (priority, priority),
            None => (Priority::Medium, Priority::Low),
        },
    };

    let proposal = TaskProposal {
        title,
        description: item
            .get("description")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        priority,
        category: non_empty_str(item.get("category"))
            .unwrap_or(FALLBACK_CATEGORY)
            .to_string(),
        due_date: item
            .get("dueDate")
            .and_then(Value::as_str)
            .and_then(parse_due_date),
        estimated_time: item.get("estimatedTime").and_then(parse_minutes),
        tags: string_list(item.get("tags")),
        subtasks: step_list(item.get("subtasks")),
    };

    Some(Draft { proposal, schedule })
}

fn non_empty_str(value: Option<&Value>) -> Option<&str> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Accepts `YYYY-MM-DD`, an RFC 3339 timestamp, or anything starting
/// with a `YYYY-MM-DD` date.
pub fn parse_due_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(raw) {
        return Some(timestamp.date_naive());
    }
    raw.get(..10)
        .and_then(|prefix| NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok())
}

fn parse_minutes(value: &Value) -> Option<u32> {
    let minutes = match value {
        Value::Number(number) => number.as_f64()?,
        Value::String(text) => text.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    let minutes = minutes.round();
    (minutes >= 1.0 && minutes <= u32::MAX as f64).then_some(minutes as u32)
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| non_empty_str(Some(item)))
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

// Subtasks usually arrive as strings, occasionally as `{ "title": .. }`.
fn step_list(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| match item {
                    Value::Object(step) => non_empty_str(step.get("title")),
                    other => non_empty_str(Some(other)),
                })
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn today() -> NaiveDate {
        date(2024, 6, 1)
    }

    #[test]
    fn test_single_high_priority_task_gets_tomorrow() {
        let raw = r#"[{"title":"Buy milk","priority":"high"}]"#;

        let proposals = sanitize(raw, "buy milk", today());

        assert_eq!(proposals.len(), 1);
        assert_eq!(proposals[0].title, "Buy milk");
        assert_eq!(proposals[0].priority, Priority::High);
        assert_eq!(proposals[0].due_date, Some(date(2024, 6, 2)));
        assert_eq!(proposals[0].category, FALLBACK_CATEGORY);
        assert_eq!(proposals[0].description, "");
    }

    #[test]
    fn test_full_task_object_is_preserved() {
        let raw = r#"Sure! Here is your plan:
```json
[
  {
    "title": "Book flights",
    "description": "Compare prices [economy] and book.",
    "priority": "medium",
    "category": "Travel",
    "dueDate": "2024-06-05",
    "estimatedTime": 45,
    "tags": ["travel", "booking"],
    "subtasks": ["Check dates", {"title": "Pay"}]
  }
]
```"#;

        let proposals = sanitize(raw, "plan a trip", today());

        assert_eq!(
            proposals,
            vec![TaskProposal {
                title: "Book flights".to_string(),
                description: "Compare prices [economy] and book.".to_string(),
                priority: Priority::Medium,
                category: "Travel".to_string(),
                due_date: Some(date(2024, 6, 5)),
                estimated_time: Some(45),
                tags: vec!["travel".to_string(), "booking".to_string()],
                subtasks: vec!["Check dates".to_string(), "Pay".to_string()],
            }]
        );
    }

    #[rstest]
    #[case(Some("2024-06-01"))] // today
    #[case(Some("2024-05-20"))] // past
    #[case(Some("2025-06-02"))] // more than a year out
    #[case(Some("next tuesday"))]
    #[case(None)]
    fn test_unusable_dates_are_replaced(#[case] due: Option<&str>) {
        let mut task = serde_json::json!({ "title": "Review budget", "priority": "medium" });
        if let Some(due) = due {
            task["dueDate"] = serde_json::json!(due);
        }
        let raw = serde_json::json!([task]).to_string();

        let proposals = sanitize(&raw, "review budget", today());

        assert_eq!(proposals.len(), 1);
        assert_eq!(proposals[0].due_date, Some(date(2024, 6, 4)));
    }

    #[test]
    fn test_date_exactly_one_year_out_is_kept() {
        let raw = r#"[{"title":"Renew passport","priority":"low","dueDate":"2025-06-01"}]"#;
        let proposals = sanitize(raw, "renew passport", today());
        assert_eq!(proposals[0].due_date, Some(date(2025, 6, 1)));
    }

    #[test]
    fn test_timestamp_due_dates_are_accepted() {
        let raw = r#"[{"title":"Dentist","dueDate":"2024-06-03T15:00:00Z"}]"#;
        let proposals = sanitize(raw, "dentist", today());
        assert_eq!(proposals[0].due_date, Some(date(2024, 6, 3)));
    }

    #[test]
    fn test_replacement_windows_depend_on_priority_and_position() {
        let raw = r#"[
            {"title":"A","priority":"high"},
            {"title":"B","priority":"high"},
            {"title":"C","priority":"medium"},
            {"title":"D","priority":"low"},
            {"title":"E"},
            {"title":"F","priority":"urgent"}
        ]"#;

        let proposals = sanitize(raw, "a, b and c", today());
        let dates: Vec<_> = proposals.iter().map(|p| p.due_date.unwrap()).collect();

        assert_eq!(
            dates,
            vec![
                date(2024, 6, 2),  // high, index 0: +1
                date(2024, 6, 3),  // high, index 1: +2
                date(2024, 6, 6),  // medium, index 2: +5
                date(2024, 6, 11), // low, index 3: +10
                date(2024, 6, 8),  // missing priority uses the medium window: +3+4
                date(2024, 6, 13), // unknown priority uses the low window: +7+5
            ]
        );
        assert_eq!(proposals[4].priority, Priority::Medium);
        assert_eq!(proposals[5].priority, Priority::Medium);
    }

    #[rstest]
    #[case(r#""""#)]
    #[case(r#""   ""#)]
    #[case("null")]
    fn test_blank_priority_uses_medium_window(#[case] priority: &str) {
        let raw = format!(r#"[{{"title":"Water plants","priority":{priority}}}]"#);

        let proposals = sanitize(&raw, "water plants", today());

        assert_eq!(proposals[0].priority, Priority::Medium);
        assert_eq!(proposals[0].due_date, Some(date(2024, 6, 4)));
    }

    #[rstest]
    #[case(Priority::High, 0, 1)]
    #[case(Priority::High, 3, 2)]
    #[case(Priority::Medium, 4, 7)]
    #[case(Priority::Medium, 5, 3)]
    #[case(Priority::Low, 14, 21)]
    #[case(Priority::Low, 16, 8)]
    fn test_replacement_offsets(#[case] priority: Priority, #[case] index: usize, #[case] days: u64) {
        assert_eq!(
            replacement_due_date(priority, index, today()),
            today() + Days::new(days)
        );
    }

    #[test]
    fn test_malformed_array_falls_back_to_lines() {
        let raw = "[{\"title\": \"Broken\",}\nWater the plants";

        let proposals = sanitize(raw, "water plants", today());

        // No balanced array at all, so the first line is taken verbatim.
        assert_eq!(proposals.len(), 1);
        assert_eq!(proposals[0].title, "[{\"title\": \"Broken\",}");
    }

    #[test]
    fn test_invalid_json_inside_balanced_array_falls_back() {
        let raw = "Tasks: [not json at all]\nStretch every morning";

        assert!(extract_structured(raw).is_none());
        let proposals = sanitize(raw, "plan a fitness routine and diet, sleep", today());

        assert_eq!(proposals.len(), 2);
        assert_eq!(proposals[0].title, "Tasks: [not json at all]");
        assert_eq!(proposals[1].title, "Stretch every morning");
    }

    #[test]
    fn test_array_of_non_objects_falls_back() {
        assert!(extract_structured(r#"["Call mom", "Pay rent"]"#).is_none());
    }

    #[test]
    fn test_objects_without_title_are_skipped() {
        let raw = r#"[{"title":"  "},{"description":"no title"},{"title":"Keep me"}]"#;
        let proposals = sanitize(raw, "x", today());
        assert_eq!(proposals.len(), 1);
        assert_eq!(proposals[0].title, "Keep me");
    }

    #[test]
    fn test_numbered_line_is_stripped_not_discarded() {
        let proposals = sanitize("1. Call dentist", "call dentist", today());

        assert_eq!(proposals.len(), 1);
        let proposal = &proposals[0];
        assert_eq!(proposal.title, "Call dentist");
        assert_eq!(proposal.priority, Priority::High);
        assert_eq!(proposal.category, GENERATED_CATEGORY);
        assert_eq!(proposal.description, GENERATED_DESCRIPTION);
        assert_eq!(proposal.estimated_time, Some(DEFAULT_ESTIMATED_MINUTES));
        assert_eq!(proposal.tags, vec![GENERATED_TAG.to_string()]);
        assert!(proposal.subtasks.is_empty());
        assert_eq!(proposal.due_date, Some(date(2024, 6, 2)));
    }

    #[test]
    fn test_bare_ordinal_lines_are_dropped() {
        let drafts = extract_lines("1.\n\n  2.  \nPack bags", "pack, travel");
        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].proposal.title, "Pack bags");
    }

    #[test]
    fn test_compound_request_keeps_up_to_four_lines() {
        let raw = "Research destinations\nBook flights\nReserve hotel\nPack bags\nBuy sunscreen";

        let proposals = sanitize(raw, "plan a trip and book flights, hotel", today());

        let priorities: Vec<_> = proposals.iter().map(|p| p.priority).collect();
        assert_eq!(
            priorities,
            vec![Priority::High, Priority::High, Priority::Medium, Priority::Medium]
        );
        let dates: Vec<_> = proposals.iter().map(|p| p.due_date.unwrap()).collect();
        assert_eq!(
            dates,
            vec![date(2024, 6, 2), date(2024, 6, 3), date(2024, 6, 6), date(2024, 6, 7)]
        );
    }

    #[rstest]
    #[case("call dentist", true)]
    #[case("clean house and do laundry", false)]
    #[case("milk, eggs", false)]
    #[case("prepare a detailed quarterly report for the board meeting", false)]
    fn test_simple_request_detection(#[case] context: &str, #[case] simple: bool) {
        assert_eq!(is_simple_request(context), simple);
    }

    #[rstest]
    #[case("")]
    #[case("   \n\t  \n")]
    fn test_blank_output_yields_nothing(#[case] raw: &str) {
        assert!(sanitize(raw, "anything", today()).is_empty());
    }

    #[test]
    fn test_empty_array_yields_nothing() {
        assert!(sanitize("[]", "call dentist", today()).is_empty());
    }

    #[test]
    fn test_every_dated_proposal_is_after_today() {
        let inputs = [
            r#"[{"title":"A","dueDate":"1999-01-01"},{"title":"B","priority":"low","dueDate":"2024-06-01"}]"#,
            "one\ntwo\nthree\nfour",
            r#"[{"title":"C","priority":"high","dueDate":"2024-06-02"}]"#,
        ];
        for raw in inputs {
            for proposal in sanitize(raw, "do things and stuff", today()) {
                assert!(proposal.due_date.is_none_or(|d| d > today()));
            }
        }
    }

    #[test]
    fn test_retain_future_drops_stale_and_keeps_undated() {
        let mut dated = extract_lines("Stale", "stale").remove(0).proposal;
        dated.due_date = Some(today());
        let mut undated = dated.clone();
        undated.title = "Undated".to_string();
        undated.due_date = None;

        let kept = retain_future(vec![dated, undated], today());
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].title, "Undated");
    }

    #[test]
    fn test_sanitize_is_deterministic() {
        let raw = r#"[{"title":"A","priority":"low"},{"title":"B"}] trailing"#;
        let first = sanitize(raw, "a and b", today());
        let second = sanitize(raw, "a and b", today());
        assert_eq!(first, second);
    }

    #[rstest]
    #[case(r#"noise [1, [2, 3], "]"] tail ]"#, Some(r#"[1, [2, 3], "]"]"#))]
    #[case(r#"["a\"]b"]"#, Some(r#"["a\"]b"]"#))]
    #[case("[unclosed", None)]
    #[case("no brackets", None)]
    fn test_find_balanced(#[case] text: &str, #[case] expected: Option<&str>) {
        assert_eq!(find_balanced(text, '[', ']'), expected);
    }

    #[test]
    fn test_estimated_time_parsing() {
        let raw = r#"[
            {"title":"A","estimatedTime":"90"},
            {"title":"B","estimatedTime":0},
            {"title":"C","estimatedTime":-5},
            {"title":"D","estimatedTime":12.6}
        ]"#;
        let times: Vec<_> = sanitize(raw, "x", today())
            .into_iter()
            .map(|p| p.estimated_time)
            .collect();
        assert_eq!(times, vec![Some(90), None, None, Some(13)]);
    }

    #[test]
    fn test_proposal_into_create_payload() {
        let proposal = sanitize(
            r#"[{"title":"Plan","subtasks":["One","Two"],"tags":["t"]}]"#,
            "plan",
            today(),
        )
        .remove(0);

        let payload = proposal.clone().into_create_payload();

        assert_eq!(payload.title, "Plan");
        assert_eq!(payload.due_date, proposal.due_date);
        assert_eq!(payload.subtasks.len(), 2);
        assert!(payload.subtasks.iter().all(|s| s.id.is_none() && !s.completed));
        assert_eq!(payload.tags, vec!["t".to_string()]);
    }

    #[test]
    fn test_proposal_serializes_camel_case() {
        let proposal = sanitize(r#"[{"title":"A","estimatedTime":5}]"#, "a", today()).remove(0);
        let value = serde_json::to_value(&proposal).unwrap();
        assert_eq!(value["dueDate"], "2024-06-04");
        assert_eq!(value["estimatedTime"], 5);
    }

    fn any_day() -> impl Strategy<Value = NaiveDate> {
        (0u64..100_000).prop_map(|days| date(1970, 1, 1) + Days::new(days))
    }

    fn any_priority() -> impl Strategy<Value = Option<&'static str>> {
        prop::option::of(prop::sample::select(vec![
            "high", "medium", "low", "HIGH", "", "urgent",
        ]))
    }

    type RawTask = (String, i64, Option<&'static str>);

    fn any_tasks() -> impl Strategy<Value = Vec<RawTask>> {
        prop::collection::vec(("[A-Za-z ]{0,12}", -800i64..800, any_priority()), 0..8)
    }

    // Renders tasks as a JSON array with due dates relative to `today`.
    fn task_array(tasks: &[RawTask], today: NaiveDate) -> String {
        let items = tasks
            .iter()
            .map(|(title, offset, priority)| {
                let due = today + chrono::Duration::days(*offset);
                let mut item = serde_json::json!({
                    "title": title,
                    "dueDate": due.format("%Y-%m-%d").to_string(),
                });
                if let Some(priority) = priority {
                    item["priority"] = Value::from(*priority);
                }
                item
            })
            .collect();
        Value::Array(items).to_string()
    }

    proptest! {
        #[test]
        fn prop_structured_output_is_always_dated_after_today(
            today in any_day(),
            tasks in any_tasks(),
            chatter in "\\PC{0,20}",
            context in "\\PC{0,60}",
        ) {
            let raw = format!("{chatter}{}", task_array(&tasks, today));
            for proposal in sanitize(&raw, &context, today) {
                prop_assert!(proposal.due_date.is_none_or(|d| d > today));
            }
        }

        #[test]
        fn prop_free_text_is_always_dated_after_today(
            raw in "\\PC*",
            context in "\\PC{0,60}",
            today in any_day(),
        ) {
            for proposal in sanitize(&raw, &context, today) {
                prop_assert!(proposal.due_date.is_none_or(|d| d > today));
            }
        }

        #[test]
        fn prop_sanitize_is_deterministic(
            chatter in "\\PC*",
            tasks in any_tasks(),
            context in "\\PC{0,60}",
            today in any_day(),
        ) {
            let raw = format!("{chatter}{}", task_array(&tasks, today));
            prop_assert_eq!(
                sanitize(&raw, &context, today),
                sanitize(&raw, &context, today)
            );
        }
    }
}
