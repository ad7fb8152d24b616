// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use crate::state::AppState;
use crate::{ai, auth, handlers};
use axum::{
    Router,
    routing::{get, patch, post, put},
};

/// Creates and configures the application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(handlers::health))
        // Accounts
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/profile", get(auth::profile))
        // Tasks, all scoped to the bearer of the token
        .route(
            "/api/tasks",
            get(handlers::list_tasks).post(handlers::create_task),
        )
        .route("/api/tasks/stats", get(handlers::task_stats))
        .route(
            "/api/tasks/{id}",
            put(handlers::update_task).delete(handlers::delete_task),
        )
        .route("/api/tasks/{id}/toggle", patch(handlers::toggle_task))
        .route("/api/tasks/{id}/due-status", get(handlers::due_status))
        .route(
            "/api/tasks/{task_id}/subtasks/{subtask_id}/toggle",
            patch(handlers::toggle_subtask),
        )
        // Text generation
        .route("/api/ai/generate", post(ai::generate_tasks))
        .route("/api/ai/recommendations", post(ai::recommendations))
        .route("/api/ai/breakdown", post(ai::breakdown))
        .route("/api/ai/improve", post(ai::improve))
        // Adds the shared state (DB pool, auth keys, generator, clock)
        .with_state(state)
}
