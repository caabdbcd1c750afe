use sqlx::{Pool, Sqlite, SqliteConnection};
use tracing::{info, instrument};

use super::checks::{ensure_exists, ensure_exists_if_present, Referenced};
use crate::error::AppError;
use crate::models::{Course, CourseCreate, CourseUpdate};

const COURSE_COLUMNS: &str =
    "course_id, title, description, category_id, teacher_id, deadline_in_days, is_active";

async fn fetch_course(conn: &mut SqliteConnection, id: i64) -> Result<Option<Course>, AppError> {
    let course = sqlx::query_as::<_, Course>(&format!(
        "SELECT {} FROM courses WHERE course_id = ?",
        COURSE_COLUMNS
    ))
    .bind(id)
    .fetch_optional(conn)
    .await?;
    Ok(course)
}

#[instrument(skip(pool))]
pub async fn list_courses(pool: &Pool<Sqlite>) -> Result<Vec<Course>, AppError> {
    info!("Listing courses");
    let courses = sqlx::query_as::<_, Course>(&format!("SELECT {} FROM courses", COURSE_COLUMNS))
        .fetch_all(pool)
        .await?;
    Ok(courses)
}

#[instrument(skip(pool))]
pub async fn get_course(pool: &Pool<Sqlite>, id: i64) -> Result<Course, AppError> {
    info!("Fetching course");
    let mut conn = pool.acquire().await?;
    match fetch_course(&mut conn, id).await? {
        Some(course) if course.is_active => Ok(course),
        _ => Err(AppError::not_found("Course")),
    }
}

#[instrument(skip(pool))]
pub async fn create_course(pool: &Pool<Sqlite>, payload: &CourseCreate) -> Result<Course, AppError> {
    info!("Creating course");
    let mut tx = pool.begin().await?;

    ensure_exists(&mut *tx, Referenced::Category, payload.category_id).await?;
    ensure_exists(&mut *tx, Referenced::Teacher, payload.teacher_id).await?;

    let course = sqlx::query_as::<_, Course>(&format!(
        "INSERT INTO courses (title, description, category_id, teacher_id, deadline_in_days, is_active) \
         VALUES (?, ?, ?, ?, ?, ?) RETURNING {}",
        COURSE_COLUMNS
    ))
    .bind(&payload.title)
    .bind(&payload.description)
    .bind(payload.category_id)
    .bind(payload.teacher_id)
    .bind(payload.deadline_in_days)
    .bind(payload.is_active)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(course)
}

#[instrument(skip(pool))]
pub async fn update_course(
    pool: &Pool<Sqlite>,
    id: i64,
    update: CourseUpdate,
) -> Result<Course, AppError> {
    info!("Updating course");
    let mut tx = pool.begin().await?;

    let mut course = fetch_course(&mut tx, id)
        .await?
        .ok_or_else(|| AppError::not_found("Course"))?;

    ensure_exists_if_present(&mut *tx, Referenced::Category, update.category_id).await?;
    ensure_exists_if_present(&mut *tx, Referenced::Teacher, update.teacher_id).await?;

    course.apply(update);

    let course = sqlx::query_as::<_, Course>(&format!(
        "UPDATE courses SET title = ?, description = ?, category_id = ?, teacher_id = ?, \
         deadline_in_days = ?, is_active = ? WHERE course_id = ? RETURNING {}",
        COURSE_COLUMNS
    ))
    .bind(&course.title)
    .bind(&course.description)
    .bind(course.category_id)
    .bind(course.teacher_id)
    .bind(course.deadline_in_days)
    .bind(course.is_active)
    .bind(id)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(course)
}

#[instrument(skip(pool))]
pub async fn deactivate_course(pool: &Pool<Sqlite>, id: i64) -> Result<Course, AppError> {
    info!("Deactivating course");
    let mut tx = pool.begin().await?;

    let course = sqlx::query_as::<_, Course>(&format!(
        "UPDATE courses SET is_active = 0 WHERE course_id = ? RETURNING {}",
        COURSE_COLUMNS
    ))
    .bind(id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| AppError::not_found("Course"))?;

    tx.commit().await?;
    Ok(course)
}
