// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use crate::auth::AuthUser;
use crate::database::{self, SubtaskToggle};
use crate::state::AppState;
use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use common::{CreateTaskPayload, DueDateStatus, Task, TaskStats, UpdateTaskPayload};
use tracing::{debug, error, info};

/// Liveness probe.
pub async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "message": "Server is running",
        "timestamp": state.clock.now().to_rfc3339(),
    }))
}

/// Handler for listing the caller's tasks.
pub async fn list_tasks(
    auth: AuthUser,
    State(state): State<AppState>, // State injection (DB pool, clock)
) -> Result<Json<Vec<Task>>, AppError> {
    let tasks = database::list_tasks_for_user(&state.pool, auth.id).await?;
    info!("Successfully retrieved {} tasks.", tasks.len());
    Ok(Json(tasks))
}

/// Handler for creating a new task.
pub async fn create_task(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(mut payload): Json<CreateTaskPayload>, // Extracting the request body as JSON
) -> Result<(StatusCode, Json<Task>), AppError> {
    debug!("Received request to create task: {}", payload.title);

    payload.title = payload.title.trim().to_string();
    if payload.title.is_empty() {
        error!("Validation failed: title is empty.");
        return Err(AppError::new(StatusCode::BAD_REQUEST, "Title is required"));
    }

    let new_task = database::create_task(&state.pool, auth.id, payload, state.clock.now()).await?;

    info!("Task created successfully with ID: {}", new_task.id);

    // Return a 201 Created status with the new task as JSON.
    Ok((StatusCode::CREATED, Json(new_task)))
}

/// Handler for partially updating a task.
pub async fn update_task(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(task_id): Path<i64>,
    Json(payload): Json<UpdateTaskPayload>,
) -> Result<Json<Task>, AppError> {
    debug!("Received update for task with ID: {}", task_id);

    if payload
        .title
        .as_deref()
        .is_some_and(|title| title.trim().is_empty())
    {
        return Err(AppError::new(StatusCode::BAD_REQUEST, "Title cannot be empty"));
    }

    database::update_task(&state.pool, auth.id, task_id, payload, state.clock.now())
        .await?
        .map(Json)
        .ok_or_else(task_not_found)
}

/// Handler for deleting a task by ID.
pub async fn delete_task(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(task_id): Path<i64>, // Extract task ID from the URL path
) -> Result<Json<serde_json::Value>, AppError> {
    debug!("Attempting to delete task with ID: {}", task_id);

    let deleted =
        database::soft_delete_task(&state.pool, auth.id, task_id, state.clock.now()).await?;

    if deleted {
        info!("Task with ID {} deleted successfully.", task_id);
        Ok(Json(serde_json::json!({ "message": "Task deleted successfully" })))
    } else {
        error!("Task with ID {} not found for deletion.", task_id);
        Err(task_not_found())
    }
}

/// Handler for flipping a task's completion flag.
pub async fn toggle_task(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(task_id): Path<i64>,
) -> Result<Json<Task>, AppError> {
    database::toggle_task(&state.pool, auth.id, task_id, state.clock.now())
        .await?
        .map(|task| {
            info!("Task {} marked completed={}.", task.id, task.completed);
            Json(task)
        })
        .ok_or_else(task_not_found)
}

/// Handler for flipping a subtask's completion flag.
pub async fn toggle_subtask(
    auth: AuthUser,
    State(state): State<AppState>,
    Path((task_id, subtask_id)): Path<(i64, String)>,
) -> Result<Json<Task>, AppError> {
    let outcome = database::toggle_subtask(
        &state.pool,
        auth.id,
        task_id,
        &subtask_id,
        state.clock.now(),
    )
    .await?;

    match outcome {
        SubtaskToggle::Toggled(task) => Ok(Json(task)),
        SubtaskToggle::TaskNotFound => Err(task_not_found()),
        SubtaskToggle::SubtaskNotFound => {
            Err(AppError::new(StatusCode::NOT_FOUND, "Subtask not found"))
        }
    }
}

/// Handler for the dashboard counters.
pub async fn task_stats(
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<TaskStats>, AppError> {
    let stats = database::task_stats(&state.pool, auth.id, state.clock.now()).await?;
    Ok(Json(stats))
}

/// Handler classifying a task's due date against the server clock.
pub async fn due_status(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(task_id): Path<i64>,
) -> Result<Json<DueDateStatus>, AppError> {
    let task = database::get_task(&state.pool, auth.id, task_id)
        .await?
        .ok_or_else(task_not_found)?;

    task.due_status(&state.clock.now())
        .map(Json)
        .ok_or_else(|| AppError::new(StatusCode::UNPROCESSABLE_ENTITY, "Task has no due date"))
}

fn task_not_found() -> AppError {
    AppError::new(StatusCode::NOT_FOUND, "Task not found")
}

// --- Custom Error Handling ---
// Internal errors (database, hashing, the text generation service) are
// turned into HTTP responses here.

/// Our custom error type for the application.
#[derive(Debug)]
pub struct AppError {
    pub(crate) code: StatusCode,
    pub(crate) message: String,
}

impl AppError {
    pub fn new(code: StatusCode, message: &str) -> Self {
        Self {
            code,
            message: message.to_string(),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Allows converting an `anyhow::Error` (coming from `database.rs`)
/// into our `AppError`.
impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        // Log the internal error for debugging.
        tracing::error!("Internal server error: {:?}", err);
        Self {
            code: StatusCode::INTERNAL_SERVER_ERROR,
            message: "Server error".to_string(),
        }
    }
}

/// Allows Axum to convert our `AppError` into an HTTP `Response`.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        tracing::error!(
            "Responding with error: status_code={}, message={}",
            self.code.as_u16(),
            self.message
        );
        (
            self.code,
            Json(serde_json::json!({ "message": self.message })),
        )
            .into_response()
    }
}
