use sqlx::{Pool, Sqlite, SqliteConnection};
use tracing::{info, instrument};

use super::checks::{ensure_exists, ensure_exists_if_present, Referenced};
use crate::error::AppError;
use crate::models::{TaskCompletion, TaskCompletionCreate, TaskCompletionUpdate};

const COMPLETION_COLUMNS: &str = "task_completion_id, enrollment_id, task_id, completed_at, is_active";
const COMPLETION_LABEL: &str = "TaskCompletion";
const COMPLETION_TAKEN: &str = "TaskCompletion already exists";

async fn fetch_task_completion(
    conn: &mut SqliteConnection,
    id: i64,
) -> Result<Option<TaskCompletion>, AppError> {
    let completion = sqlx::query_as::<_, TaskCompletion>(&format!(
        "SELECT {} FROM task_completions WHERE task_completion_id = ?",
        COMPLETION_COLUMNS
    ))
    .bind(id)
    .fetch_optional(conn)
    .await?;
    Ok(completion)
}

#[instrument(skip(pool))]
pub async fn list_task_completions(pool: &Pool<Sqlite>) -> Result<Vec<TaskCompletion>, AppError> {
    info!("Listing task completions");
    let completions = sqlx::query_as::<_, TaskCompletion>(&format!(
        "SELECT {} FROM task_completions",
        COMPLETION_COLUMNS
    ))
    .fetch_all(pool)
    .await?;
    Ok(completions)
}

#[instrument(skip(pool))]
pub async fn get_task_completion(pool: &Pool<Sqlite>, id: i64) -> Result<TaskCompletion, AppError> {
    info!("Fetching task completion");
    let mut conn = pool.acquire().await?;
    match fetch_task_completion(&mut conn, id).await? {
        Some(completion) if completion.is_active => Ok(completion),
        _ => Err(AppError::not_found(COMPLETION_LABEL)),
    }
}

#[instrument(skip(pool))]
pub async fn create_task_completion(
    pool: &Pool<Sqlite>,
    payload: &TaskCompletionCreate,
) -> Result<TaskCompletion, AppError> {
    info!("Creating task completion");
    let mut tx = pool.begin().await?;

    ensure_exists(&mut *tx, Referenced::Enrollment, payload.enrollment_id).await?;
    ensure_exists(&mut *tx, Referenced::Task, payload.task_id).await?;

    let completion = sqlx::query_as::<_, TaskCompletion>(&format!(
        "INSERT INTO task_completions (enrollment_id, task_id, completed_at, is_active) \
         VALUES (?, ?, ?, ?) RETURNING {}",
        COMPLETION_COLUMNS
    ))
    .bind(payload.enrollment_id)
    .bind(payload.task_id)
    .bind(payload.completed_at)
    .bind(payload.is_active)
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| super::conflict_as(e, COMPLETION_TAKEN))?;

    tx.commit().await?;
    Ok(completion)
}

#[instrument(skip(pool))]
pub async fn update_task_completion(
    pool: &Pool<Sqlite>,
    id: i64,
    update: TaskCompletionUpdate,
) -> Result<TaskCompletion, AppError> {
    info!("Updating task completion");
    let mut tx = pool.begin().await?;

    let mut completion = fetch_task_completion(&mut tx, id)
        .await?
        .ok_or_else(|| AppError::not_found(COMPLETION_LABEL))?;

    ensure_exists_if_present(&mut *tx, Referenced::Enrollment, update.enrollment_id).await?;
    ensure_exists_if_present(&mut *tx, Referenced::Task, update.task_id).await?;

    completion.apply(update);

    let completion = sqlx::query_as::<_, TaskCompletion>(&format!(
        "UPDATE task_completions SET enrollment_id = ?, task_id = ?, completed_at = ?, \
         is_active = ? WHERE task_completion_id = ? RETURNING {}",
        COMPLETION_COLUMNS
    ))
    .bind(completion.enrollment_id)
    .bind(completion.task_id)
    .bind(completion.completed_at)
    .bind(completion.is_active)
    .bind(id)
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| super::conflict_as(e, COMPLETION_TAKEN))?;

    tx.commit().await?;
    Ok(completion)
}

/// Hard delete: the row is removed.
#[instrument(skip(pool))]
pub async fn delete_task_completion(pool: &Pool<Sqlite>, id: i64) -> Result<(), AppError> {
    info!("Deleting task completion");
    let mut tx = pool.begin().await?;

    let result = sqlx::query("DELETE FROM task_completions WHERE task_completion_id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::not_found(COMPLETION_LABEL));
    }

    tx.commit().await?;
    Ok(())
}
