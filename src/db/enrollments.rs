use sqlx::{Pool, Sqlite, SqliteConnection};
use tracing::{info, instrument};

use super::checks::{ensure_exists, ensure_exists_if_present, Referenced};
use crate::error::AppError;
use crate::models::{
    Enrollment, EnrollmentCreate, EnrollmentProgress, EnrollmentUpdate, TaskCompletion,
};

const ENROLLMENT_COLUMNS: &str = "enrollment_id, student_id, course_id, assigner_id, enrolled_at, \
     deadline, completed_at, is_active";

const ENROLLMENT_LABEL: &str = "Student course enrollment";
const ENROLLMENT_TAKEN: &str = "Student course enrollment already exists";

async fn fetch_enrollment(
    conn: &mut SqliteConnection,
    id: i64,
) -> Result<Option<Enrollment>, AppError> {
    let enrollment = sqlx::query_as::<_, Enrollment>(&format!(
        "SELECT {} FROM enrollments WHERE enrollment_id = ?",
        ENROLLMENT_COLUMNS
    ))
    .bind(id)
    .fetch_optional(conn)
    .await?;
    Ok(enrollment)
}

#[instrument(skip(pool))]
pub async fn list_enrollments(pool: &Pool<Sqlite>) -> Result<Vec<Enrollment>, AppError> {
    info!("Listing enrollments");
    let enrollments = sqlx::query_as::<_, Enrollment>(&format!(
        "SELECT {} FROM enrollments",
        ENROLLMENT_COLUMNS
    ))
    .fetch_all(pool)
    .await?;
    Ok(enrollments)
}

#[instrument(skip(pool))]
pub async fn get_enrollment(pool: &Pool<Sqlite>, id: i64) -> Result<Enrollment, AppError> {
    info!("Fetching enrollment");
    let mut conn = pool.acquire().await?;
    match fetch_enrollment(&mut conn, id).await? {
        Some(enrollment) if enrollment.is_active => Ok(enrollment),
        _ => Err(AppError::not_found(ENROLLMENT_LABEL)),
    }
}

/// A second active enrollment of the same student in the same course is a conflict.
#[instrument(skip(pool))]
pub async fn create_enrollment(
    pool: &Pool<Sqlite>,
    payload: &EnrollmentCreate,
) -> Result<Enrollment, AppError> {
    info!("Creating enrollment");
    let mut tx = pool.begin().await?;

    ensure_exists(&mut *tx, Referenced::Student, payload.student_id).await?;
    ensure_exists(&mut *tx, Referenced::Course, payload.course_id).await?;
    ensure_exists(&mut *tx, Referenced::Assigner, payload.assigner_id).await?;

    let enrollment = sqlx::query_as::<_, Enrollment>(&format!(
        "INSERT INTO enrollments (student_id, course_id, assigner_id, enrolled_at, deadline, \
         completed_at, is_active) VALUES (?, ?, ?, ?, ?, ?, ?) RETURNING {}",
        ENROLLMENT_COLUMNS
    ))
    .bind(payload.student_id)
    .bind(payload.course_id)
    .bind(payload.assigner_id)
    .bind(payload.enrolled_at)
    .bind(payload.deadline)
    .bind(payload.completed_at)
    .bind(payload.is_active)
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| super::conflict_as(e, ENROLLMENT_TAKEN))?;

    tx.commit().await?;
    Ok(enrollment)
}

#[instrument(skip(pool))]
pub async fn update_enrollment(
    pool: &Pool<Sqlite>,
    id: i64,
    update: EnrollmentUpdate,
) -> Result<Enrollment, AppError> {
    info!("Updating enrollment");
    let mut tx = pool.begin().await?;

    let mut enrollment = fetch_enrollment(&mut tx, id)
        .await?
        .ok_or_else(|| AppError::not_found(ENROLLMENT_LABEL))?;

    ensure_exists_if_present(&mut *tx, Referenced::Student, update.student_id).await?;
    ensure_exists_if_present(&mut *tx, Referenced::Course, update.course_id).await?;
    ensure_exists_if_present(&mut *tx, Referenced::Assigner, update.assigner_id).await?;

    enrollment.apply(update);

    let enrollment = sqlx::query_as::<_, Enrollment>(&format!(
        "UPDATE enrollments SET student_id = ?, course_id = ?, assigner_id = ?, deadline = ?, \
         completed_at = ?, is_active = ? WHERE enrollment_id = ? RETURNING {}",
        ENROLLMENT_COLUMNS
    ))
    .bind(enrollment.student_id)
    .bind(enrollment.course_id)
    .bind(enrollment.assigner_id)
    .bind(enrollment.deadline)
    .bind(enrollment.completed_at)
    .bind(enrollment.is_active)
    .bind(id)
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| super::conflict_as(e, ENROLLMENT_TAKEN))?;

    tx.commit().await?;
    Ok(enrollment)
}

#[instrument(skip(pool))]
pub async fn deactivate_enrollment(pool: &Pool<Sqlite>, id: i64) -> Result<Enrollment, AppError> {
    info!("Deactivating enrollment");
    let mut tx = pool.begin().await?;

    let enrollment = sqlx::query_as::<_, Enrollment>(&format!(
        "UPDATE enrollments SET is_active = 0 WHERE enrollment_id = ? RETURNING {}",
        ENROLLMENT_COLUMNS
    ))
    .bind(id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| AppError::not_found(ENROLLMENT_LABEL))?;

    tx.commit().await?;
    Ok(enrollment)
}

/// Counts the active tasks of the enrollment's course and how many of them
/// have an active completion for this enrollment.
#[instrument(skip(pool))]
pub async fn get_enrollment_progress(
    pool: &Pool<Sqlite>,
    user_id: i64,
    enrollment_id: i64,
) -> Result<EnrollmentProgress, AppError> {
    info!("Summarising task completion for enrollment");
    let mut tx = pool.begin().await?;

    let enrollment = sqlx::query_as::<_, Enrollment>(&format!(
        "SELECT {} FROM enrollments WHERE enrollment_id = ? AND student_id = ? AND is_active = 1",
        ENROLLMENT_COLUMNS
    ))
    .bind(enrollment_id)
    .bind(user_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| AppError::not_found(ENROLLMENT_LABEL))?;

    let (total_tasks, completed_tasks): (i64, i64) = sqlx::query_as(
        "SELECT COUNT(t.task_id), COUNT(tc.task_completion_id) \
         FROM tasks t \
         LEFT OUTER JOIN task_completions tc \
           ON tc.task_id = t.task_id AND tc.enrollment_id = ? AND tc.is_active = 1 \
         WHERE t.course_id = ? AND t.is_active = 1",
    )
    .bind(enrollment.enrollment_id)
    .bind(enrollment.course_id)
    .fetch_one(&mut *tx)
    .await?;

    let task_completions = sqlx::query_as::<_, TaskCompletion>(
        "SELECT task_completion_id, enrollment_id, task_id, completed_at, is_active \
         FROM task_completions WHERE enrollment_id = ? AND is_active = 1",
    )
    .bind(enrollment.enrollment_id)
    .fetch_all(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok(EnrollmentProgress {
        enrollment,
        total_tasks,
        completed_tasks,
        task_completions,
    })
}
