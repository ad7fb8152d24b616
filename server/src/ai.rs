// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
//! AI-assisted endpoints. Each one builds a prompt, asks the configured
//! text generator, and hands the raw text to a tolerant parser from
//! `common`.
use std::sync::Arc;

use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{Days, NaiveDate};
use common::assist::{self, TaskBreakdown, TaskImprovement};
use common::{TaskProposal, sanitize};
use serde::Deserialize;
use tracing::{debug, error, info};

use crate::auth::AuthUser;
use crate::database;
use crate::gemini::{GenerationError, GenerationSettings, TextGenerator};
use crate::handlers::AppError;
use crate::state::AppState;

impl From<GenerationError> for AppError {
    fn from(err: GenerationError) -> Self {
        error!("Text generation error: {}", err);
        let code = match err {
            GenerationError::NotConfigured => StatusCode::SERVICE_UNAVAILABLE,
            GenerationError::Transport(_)
            | GenerationError::Upstream { .. }
            | GenerationError::Decode(_) => StatusCode::BAD_GATEWAY,
        };
        AppError::new(code, &err.to_string())
    }
}

#[derive(Deserialize, Debug)]
pub struct GenerateTasksRequest {
    #[serde(default)]
    pub context: String,
    /// Store the proposals as tasks right away.
    #[serde(default)]
    pub save: bool,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationsRequest {
    #[serde(default)]
    pub task_title: String,
    #[serde(default)]
    pub existing_tasks: Vec<String>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct BreakdownRequest {
    #[serde(default)]
    pub task_title: String,
    #[serde(default)]
    pub context: String,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ImproveRequest {
    #[serde(default)]
    pub task_title: String,
    #[serde(default)]
    pub description: String,
}

fn generator(state: &AppState) -> Result<&Arc<dyn TextGenerator>, GenerationError> {
    state.generator.as_ref().ok_or(GenerationError::NotConfigured)
}

fn require(value: &str, message: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::new(StatusCode::BAD_REQUEST, message));
    }
    Ok(())
}

/// Handler proposing tasks from a free-text request. With `save`, the
/// proposals are stored and the created tasks are returned instead.
pub async fn generate_tasks(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(request): Json<GenerateTasksRequest>,
) -> Result<Response, AppError> {
    require(&request.context, "Context is required")?;
    let context = request.context.trim();
    let now = state.clock.now();
    let today = now.date_naive();

    let text = generator(&state)?
        .generate(&task_generation_prompt(context, today), &GenerationSettings::TASKS)
        .await?;
    debug!("Model returned {} chars for task generation.", text.len());

    let proposals = sanitize(&text, context, today);
    info!("Generated {} task proposals.", proposals.len());

    if !request.save {
        return Ok(Json(proposals).into_response());
    }

    let payloads = proposals
        .into_iter()
        .map(TaskProposal::into_create_payload)
        .collect();
    let created = database::create_tasks(&state.pool, auth.id, payloads, now).await?;
    info!("Stored {} generated tasks.", created.len());

    Ok((StatusCode::CREATED, Json(created)).into_response())
}

/// Handler returning up to three productivity tips for a task.
pub async fn recommendations(
    _auth: AuthUser,
    State(state): State<AppState>,
    Json(request): Json<RecommendationsRequest>,
) -> Result<Json<Vec<String>>, AppError> {
    require(&request.task_title, "Task title is required")?;

    let prompt = recommendations_prompt(&request.task_title, &request.existing_tasks);
    let text = generator(&state)?
        .generate(&prompt, &GenerationSettings::RECOMMENDATIONS)
        .await?;

    Ok(Json(assist::parse_recommendations(&text)))
}

/// Handler splitting a task into steps with an estimate.
pub async fn breakdown(
    _auth: AuthUser,
    State(state): State<AppState>,
    Json(request): Json<BreakdownRequest>,
) -> Result<Json<TaskBreakdown>, AppError> {
    require(&request.task_title, "Task title is required")?;

    let prompt = breakdown_prompt(&request.task_title, &request.context);
    let text = generator(&state)?
        .generate(&prompt, &GenerationSettings::BREAKDOWN)
        .await?;

    Ok(Json(assist::parse_breakdown(&text, &request.task_title)))
}

/// Handler suggesting a sharper title and description.
pub async fn improve(
    _auth: AuthUser,
    State(state): State<AppState>,
    Json(request): Json<ImproveRequest>,
) -> Result<Json<TaskImprovement>, AppError> {
    require(&request.task_title, "Task title is required")?;

    let prompt = improvement_prompt(&request.task_title, &request.description);
    let text = generator(&state)?
        .generate(&prompt, &GenerationSettings::IMPROVEMENT)
        .await?;

    Ok(Json(assist::parse_improvement(
        &text,
        &request.task_title,
        &request.description,
    )))
}

// --- Prompts ---

pub fn task_generation_prompt(context: &str, today: NaiveDate) -> String {
    let tomorrow = today
        .checked_add_days(Days::new(1))
        .unwrap_or(NaiveDate::MAX);

    format!(
        r#"You are an expert productivity coach. Based on this request: "{context}", create the appropriate number of tasks.

Today's date is {today}. All due dates must be relative to today.

Guidelines:
- A simple, specific request (e.g. "call dentist") becomes 1 task with detailed subtasks.
- A project (e.g. "plan wedding") becomes 2-4 related tasks.
- A request naming several things becomes one task per area.

For each task provide a title (2-8 words), a 1-2 sentence description, a priority (low, medium or high),
a category (Work, Personal, Health, Learning, Finance, Home, ...), a due date in YYYY-MM-DD format,
an estimated time in minutes, 2-3 tags and 3-6 actionable subtasks.

Due dates must be in the future, never today ({today}) or earlier:
- high priority: tomorrow ({tomorrow}) or the day after
- medium priority: 3-7 days from today
- low priority: 1-3 weeks from today

Respond with a JSON array of objects with exactly these fields:
{{"title": "...", "description": "...", "priority": "low|medium|high", "category": "...", "dueDate": "YYYY-MM-DD", "estimatedTime": 30, "tags": ["..."], "subtasks": ["..."]}}"#
    )
}

pub fn recommendations_prompt(task_title: &str, existing_tasks: &[String]) -> String {
    format!(
        r#"You are a productivity expert. Given the task "{task_title}" and these existing tasks: {existing}.

Give 3 specific, immediately actionable recommendations for completing this task, considering how to break it down,
time management, required resources, likely obstacles and how it fits with the existing tasks.

Return only the recommendations, one per line, without numbering or bullet points."#,
        existing = existing_tasks.join(", ")
    )
}

pub fn breakdown_prompt(task_title: &str, context: &str) -> String {
    format!(
        r#"You are a project management expert. Break this task into actionable subtasks: "{task_title}"

Context: {context}

Respond with a JSON object:
{{"subtasks": ["step 1", "step 2", "step 3", "step 4"], "estimatedTime": total_minutes, "priority": "low|medium|high", "category": "...", "tags": ["tag1", "tag2", "tag3"]}}

Keep subtasks specific and in logical order, with a realistic time estimate."#
    )
}

pub fn improvement_prompt(task_title: &str, description: &str) -> String {
    format!(
        r#"You are a task optimization expert. Review and improve this task:

Title: "{task_title}"
Description: "{description}"

Respond with a JSON object:
{{"improvedTitle": "...", "improvedDescription": "...", "suggestions": ["...", "...", "..."]}}

Make the task more specific, measurable and actionable."#
    )
}
