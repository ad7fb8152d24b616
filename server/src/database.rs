// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use common::{CreateTaskPayload, Subtask, Task, TaskStats, UpdateTaskPayload, User};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Executor, Sqlite, SqlitePool, migrate::MigrateDatabase};
use tracing::{debug, info};

const CREATE_USERS_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS users (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        email TEXT NOT NULL UNIQUE,
        name TEXT NOT NULL,
        password_hash TEXT NOT NULL,
        created_at TIMESTAMP NOT NULL
    );
"#;

const CREATE_TASKS_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS tasks (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id INTEGER NOT NULL,
        title TEXT NOT NULL,
        description TEXT NOT NULL DEFAULT '',
        completed BOOLEAN NOT NULL DEFAULT 0,
        priority TEXT NOT NULL DEFAULT 'medium',
        category TEXT NOT NULL DEFAULT 'General',
        due_date DATE NULL,
        estimated_time INTEGER NULL,
        tags TEXT NOT NULL DEFAULT '[]',
        subtasks TEXT NOT NULL DEFAULT '[]',
        notes TEXT NOT NULL DEFAULT '',
        created_at TIMESTAMP NOT NULL,
        updated_at TIMESTAMP NOT NULL,
        deleted_at TIMESTAMP WITH TIME ZONE NULL
    );
"#;

const CREATE_TASKS_USER_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_tasks_user_id ON tasks (user_id);";

/// Establishes the database connection pool.
/// If the database (or its directory) does not exist, it creates it.
/// It also ensures the tables have the correct schema.
pub async fn establish_connection_pool(database_url: &str) -> Result<SqlitePool> {
    if let Some(parent) = database_file(database_url).and_then(Path::parent) {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }
    }

    if !Sqlite::database_exists(database_url).await.unwrap_or(false) {
        info!("Creating database {}", database_url);
        Sqlite::create_database(database_url)
            .await
            .context("Failed to create database")?;
    } else {
        info!("Database already exists.");
    }

    let pool = SqlitePool::connect(database_url)
        .await
        .context("Failed to connect to database")?;

    create_schema(&pool).await?;

    Ok(pool)
}

/// A single-connection in-memory database with the schema applied.
/// Every call yields a fresh, isolated database.
pub async fn establish_in_memory_pool() -> Result<SqlitePool> {
    // One connection only: each SQLite in-memory connection is its own database.
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .context("Failed to open in-memory database")?;

    create_schema(&pool).await?;

    Ok(pool)
}

pub async fn create_schema(pool: &SqlitePool) -> Result<()> {
    sqlx::query(CREATE_USERS_TABLE)
        .execute(pool)
        .await
        .context("Failed to create 'users' table")?;

    sqlx::query(CREATE_TASKS_TABLE)
        .execute(pool)
        .await
        .context("Failed to create 'tasks' table")?;

    sqlx::query(CREATE_TASKS_USER_INDEX)
        .execute(pool)
        .await
        .context("Failed to create 'tasks' index")?;

    info!("'users' and 'tasks' tables are ready.");
    Ok(())
}

// File path behind a `sqlite:` URL, if it names a file.
fn database_file(database_url: &str) -> Option<&Path> {
    let rest = database_url
        .strip_prefix("sqlite://")
        .or_else(|| database_url.strip_prefix("sqlite:"))?;
    let path = rest.split('?').next().unwrap_or(rest);
    if path.is_empty() || path.starts_with(":memory:") {
        return None;
    }
    Some(Path::new(path))
}

// --- Users ---

/// A user row including the password hash. Never leaves the server.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct StoredUser {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl StoredUser {
    pub fn into_user(self) -> User {
        User {
            id: self.id,
            email: self.email,
            name: self.name,
            created_at: self.created_at,
        }
    }
}

pub async fn create_user(
    pool: &SqlitePool,
    email: &str,
    name: &str,
    password_hash: &str,
    created_at: DateTime<Utc>,
) -> Result<User> {
    debug!("Insert user: email={}, name={}", email, name);

    let id = sqlx::query(
        "INSERT INTO users (email, name, password_hash, created_at) VALUES (?, ?, ?, ?)",
    )
    .bind(email)
    .bind(name)
    .bind(password_hash)
    .bind(created_at)
    .execute(pool)
    .await
    .context("Failed to insert user into DB")?
    .last_insert_rowid();

    Ok(User {
        id,
        email: email.to_string(),
        name: name.to_string(),
        created_at,
    })
}

pub async fn find_user_by_email(pool: &SqlitePool, email: &str) -> Result<Option<StoredUser>> {
    sqlx::query_as::<_, StoredUser>("SELECT * FROM users WHERE email = ?")
        .bind(email)
        .fetch_optional(pool)
        .await
        .context("Failed to look up user by email")
}

pub async fn find_user_by_id(pool: &SqlitePool, user_id: i64) -> Result<Option<User>> {
    sqlx::query_as::<_, User>("SELECT id, email, name, created_at FROM users WHERE id = ?")
        .bind(user_id)
        .fetch_optional(pool)
        .await
        .context("Failed to look up user by id")
}

// --- Tasks ---

/// Retrieves a user's tasks, newest first, excluding soft-deleted tasks.
pub async fn list_tasks_for_user(pool: &SqlitePool, user_id: i64) -> Result<Vec<Task>> {
    sqlx::query_as::<_, Task>(
        "SELECT * FROM tasks WHERE user_id = ? AND deleted_at IS NULL ORDER BY created_at DESC, id DESC;",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
    .context("Failed to retrieve tasks from DB")
}

pub async fn get_task(pool: &SqlitePool, user_id: i64, task_id: i64) -> Result<Option<Task>> {
    sqlx::query_as::<_, Task>(
        "SELECT * FROM tasks WHERE id = ? AND user_id = ? AND deleted_at IS NULL",
    )
    .bind(task_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await
    .with_context(|| format!("Failed to retrieve task with ID: {task_id}"))
}

/// Inserts a new task into the database, filling in defaults.
///
/// Runs on any executor, so a batch can share one transaction.
pub async fn create_task<'e, E>(
    executor: E,
    user_id: i64,
    payload: CreateTaskPayload,
    now: DateTime<Utc>,
) -> Result<Task>
where
    E: Executor<'e, Database = Sqlite>,
{
    let task = Task {
        id: 0,
        user_id,
        title: payload.title,
        description: payload.description.unwrap_or_default(),
        completed: false,
        priority: payload.priority.unwrap_or_default(),
        category: payload
            .category
            .filter(|category| !category.trim().is_empty())
            .unwrap_or_else(|| "General".to_string()),
        due_date: payload.due_date,
        estimated_time: payload.estimated_time.filter(|minutes| *minutes > 0),
        tags: payload.tags,
        subtasks: payload.subtasks.into_iter().map(Subtask::from).collect(),
        notes: payload.notes.unwrap_or_default(),
        created_at: now,
        updated_at: now,
        deleted_at: None,
    };

    debug!(
        "Insert task: user_id={}, title={}, priority={}, due_date={:?}",
        user_id, task.title, task.priority, task.due_date
    );

    let id = sqlx::query(
        "INSERT INTO tasks (user_id, title, description, completed, priority, category, due_date, estimated_time, tags, subtasks, notes, created_at, updated_at, deleted_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, NULL)",
    )
    .bind(task.user_id)
    .bind(&task.title)
    .bind(&task.description)
    .bind(task.completed)
    .bind(task.priority.as_str())
    .bind(&task.category)
    .bind(task.due_date)
    .bind(task.estimated_time)
    .bind(serde_json::to_string(&task.tags)?)
    .bind(serde_json::to_string(&task.subtasks)?)
    .bind(&task.notes)
    .bind(task.created_at)
    .bind(task.updated_at)
    .execute(executor)
    .await
    .context("Failed to insert task into DB")?
    .last_insert_rowid();

    Ok(Task { id, ..task })
}

/// Inserts every payload in a single transaction. Either all tasks are
/// stored or none are.
pub async fn create_tasks(
    pool: &SqlitePool,
    user_id: i64,
    payloads: Vec<CreateTaskPayload>,
    now: DateTime<Utc>,
) -> Result<Vec<Task>> {
    let mut tx = pool
        .begin()
        .await
        .context("Failed to start task batch transaction")?;

    let mut created = Vec::with_capacity(payloads.len());
    for payload in payloads {
        // Dropping `tx` on error rolls the batch back.
        created.push(create_task(&mut *tx, user_id, payload, now).await?);
    }

    tx.commit()
        .await
        .context("Failed to commit task batch")?;
    info!("Inserted a batch of {} tasks.", created.len());

    Ok(created)
}

/// Writes every mutable column of `task` back to the database.
pub async fn save_task(pool: &SqlitePool, task: &Task) -> Result<()> {
    sqlx::query(
        "UPDATE tasks SET title = ?, description = ?, completed = ?, priority = ?, category = ?, due_date = ?, \
         estimated_time = ?, tags = ?, subtasks = ?, notes = ?, updated_at = ? \
         WHERE id = ? AND user_id = ? AND deleted_at IS NULL",
    )
    .bind(&task.title)
    .bind(&task.description)
    .bind(task.completed)
    .bind(task.priority.as_str())
    .bind(&task.category)
    .bind(task.due_date)
    .bind(task.estimated_time)
    .bind(serde_json::to_string(&task.tags)?)
    .bind(serde_json::to_string(&task.subtasks)?)
    .bind(&task.notes)
    .bind(task.updated_at)
    .bind(task.id)
    .bind(task.user_id)
    .execute(pool)
    .await
    .with_context(|| format!("Failed to update task with ID: {}", task.id))?;

    Ok(())
}

/// Applies a partial update. Returns `None` if the user has no such task.
pub async fn update_task(
    pool: &SqlitePool,
    user_id: i64,
    task_id: i64,
    payload: UpdateTaskPayload,
    now: DateTime<Utc>,
) -> Result<Option<Task>> {
    let Some(mut task) = get_task(pool, user_id, task_id).await? else {
        return Ok(None);
    };

    payload.apply_to(&mut task);
    task.updated_at = now;
    save_task(pool, &task).await?;

    info!("Updated task with ID: {}", task_id);
    Ok(Some(task))
}

/// Soft deletes a task by setting its `deleted_at` timestamp.
/// Returns true if a task was updated, false if the user has no such task.
pub async fn soft_delete_task(
    pool: &SqlitePool,
    user_id: i64,
    task_id: i64,
    now: DateTime<Utc>,
) -> Result<bool> {
    debug!("Attempting to soft delete task with ID: {}", task_id);
    let result = sqlx::query(
        "UPDATE tasks SET deleted_at = ? WHERE id = ? AND user_id = ? AND deleted_at IS NULL",
    )
    .bind(now)
    .bind(task_id)
    .bind(user_id)
    .execute(pool)
    .await
    .with_context(|| format!("Failed to soft delete task with ID: {task_id}"))?;

    let rows_affected = result.rows_affected();
    info!("Soft deleted {} rows for task ID: {}", rows_affected, task_id);

    Ok(rows_affected > 0)
}

/// Flips the completion flag of a task.
pub async fn toggle_task(
    pool: &SqlitePool,
    user_id: i64,
    task_id: i64,
    now: DateTime<Utc>,
) -> Result<Option<Task>> {
    let Some(mut task) = get_task(pool, user_id, task_id).await? else {
        return Ok(None);
    };

    task.completed = !task.completed;
    task.updated_at = now;
    save_task(pool, &task).await?;

    Ok(Some(task))
}

/// Outcome of a subtask toggle.
#[derive(Debug)]
pub enum SubtaskToggle {
    Toggled(Task),
    TaskNotFound,
    SubtaskNotFound,
}

pub async fn toggle_subtask(
    pool: &SqlitePool,
    user_id: i64,
    task_id: i64,
    subtask_id: &str,
    now: DateTime<Utc>,
) -> Result<SubtaskToggle> {
    let Some(mut task) = get_task(pool, user_id, task_id).await? else {
        return Ok(SubtaskToggle::TaskNotFound);
    };

    let Some(subtask) = task.subtasks.iter_mut().find(|s| s.id == subtask_id) else {
        return Ok(SubtaskToggle::SubtaskNotFound);
    };

    subtask.completed = !subtask.completed;
    task.updated_at = now;
    save_task(pool, &task).await?;

    Ok(SubtaskToggle::Toggled(task))
}

/// Dashboard counters over the user's live tasks.
pub async fn task_stats(pool: &SqlitePool, user_id: i64, now: DateTime<Utc>) -> Result<TaskStats> {
    let tasks = list_tasks_for_user(pool, user_id).await?;
    Ok(TaskStats::from_tasks(&tasks, &now))
}
