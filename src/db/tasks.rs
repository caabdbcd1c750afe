use sqlx::{Pool, Sqlite, SqliteConnection};
use tracing::{info, instrument};

use super::checks::{ensure_exists, ensure_exists_if_present, Referenced};
use crate::error::AppError;
use crate::models::{Task, TaskCreate, TaskUpdate};

const TASK_COLUMNS: &str = "task_id, title, description, course_id, is_active";

async fn fetch_active_task(conn: &mut SqliteConnection, id: i64) -> Result<Task, AppError> {
    let task = sqlx::query_as::<_, Task>(&format!(
        "SELECT {} FROM tasks WHERE task_id = ? AND is_active = 1",
        TASK_COLUMNS
    ))
    .bind(id)
    .fetch_optional(conn)
    .await?;
    task.ok_or_else(|| AppError::not_found("Task"))
}

#[instrument(skip(pool))]
pub async fn list_tasks(pool: &Pool<Sqlite>) -> Result<Vec<Task>, AppError> {
    info!("Listing active tasks");
    let tasks = sqlx::query_as::<_, Task>(&format!(
        "SELECT {} FROM tasks WHERE is_active = 1",
        TASK_COLUMNS
    ))
    .fetch_all(pool)
    .await?;
    Ok(tasks)
}

#[instrument(skip(pool))]
pub async fn get_task(pool: &Pool<Sqlite>, id: i64) -> Result<Task, AppError> {
    info!("Fetching task");
    let mut conn = pool.acquire().await?;
    fetch_active_task(&mut conn, id).await
}

#[instrument(skip(pool))]
pub async fn create_task(pool: &Pool<Sqlite>, payload: &TaskCreate) -> Result<Task, AppError> {
    info!("Creating task");
    let mut tx = pool.begin().await?;

    ensure_exists(&mut *tx, Referenced::Course, payload.course_id).await?;

    let task = sqlx::query_as::<_, Task>(&format!(
        "INSERT INTO tasks (title, description, course_id, is_active) VALUES (?, ?, ?, ?) \
         RETURNING {}",
        TASK_COLUMNS
    ))
    .bind(&payload.title)
    .bind(&payload.description)
    .bind(payload.course_id)
    .bind(payload.is_active)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(task)
}

/// Only active tasks can be edited.
#[instrument(skip(pool))]
pub async fn update_task(pool: &Pool<Sqlite>, id: i64, update: TaskUpdate) -> Result<Task, AppError> {
    info!("Updating task");
    let mut tx = pool.begin().await?;

    let mut task = fetch_active_task(&mut tx, id).await?;
    ensure_exists_if_present(&mut *tx, Referenced::Course, update.course_id).await?;
    task.apply(update);

    let task = sqlx::query_as::<_, Task>(&format!(
        "UPDATE tasks SET title = ?, description = ?, course_id = ?, is_active = ? \
         WHERE task_id = ? RETURNING {}",
        TASK_COLUMNS
    ))
    .bind(&task.title)
    .bind(&task.description)
    .bind(task.course_id)
    .bind(task.is_active)
    .bind(id)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(task)
}

#[instrument(skip(pool))]
pub async fn deactivate_task(pool: &Pool<Sqlite>, id: i64) -> Result<Task, AppError> {
    info!("Deactivating task");
    let mut tx = pool.begin().await?;

    let task = sqlx::query_as::<_, Task>(&format!(
        "UPDATE tasks SET is_active = 0 WHERE task_id = ? RETURNING {}",
        TASK_COLUMNS
    ))
    .bind(id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| AppError::not_found("Task"))?;

    tx.commit().await?;
    Ok(task)
}
