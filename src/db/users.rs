use sqlx::{Pool, Sqlite, SqliteConnection};
use tracing::{info, instrument, warn};

use super::checks::{ensure_exists, ensure_exists_if_present, Referenced};
use crate::auth::verify_password;
use crate::error::AppError;
use crate::models::{
    Course, DbUser, Enrollment, TaskCompletion, User, UserCreate, UserTasksAndCourses, UserUpdate,
};

const USER_SELECT: &str = "SELECT u.user_id, u.username, u.first_name, u.last_name, u.email, \
     u.password_hash, u.role_id, u.is_active, r.name AS role_name, r.description AS role_description \
     FROM users u JOIN roles r ON r.role_id = u.role_id";

const USERNAME_TAKEN: &str = "Username already exists";

async fn fetch_user(conn: &mut SqliteConnection, id: i64) -> Result<Option<DbUser>, AppError> {
    let user = sqlx::query_as::<_, DbUser>(&format!("{} WHERE u.user_id = ?", USER_SELECT))
        .bind(id)
        .fetch_optional(conn)
        .await?;
    Ok(user)
}

#[instrument(skip(pool))]
pub async fn list_users(pool: &Pool<Sqlite>) -> Result<Vec<User>, AppError> {
    info!("Listing active users");
    let users = sqlx::query_as::<_, DbUser>(&format!("{} WHERE u.is_active = 1", USER_SELECT))
        .fetch_all(pool)
        .await?;
    Ok(users.into_iter().map(User::from).collect())
}

#[instrument(skip(pool))]
pub async fn get_user(pool: &Pool<Sqlite>, id: i64) -> Result<User, AppError> {
    info!("Fetching user");
    let mut conn = pool.acquire().await?;
    match fetch_user(&mut conn, id).await? {
        Some(user) if user.is_active => Ok(User::from(user)),
        _ => Err(AppError::not_found("User")),
    }
}

/// Looks a user up by login name regardless of whether the account is active.
#[instrument(skip(pool))]
pub async fn find_user_by_username(
    pool: &Pool<Sqlite>,
    username: &str,
) -> Result<Option<DbUser>, AppError> {
    info!("Finding user by username");
    let user = sqlx::query_as::<_, DbUser>(&format!("{} WHERE u.username = ?", USER_SELECT))
        .bind(username)
        .fetch_optional(pool)
        .await?;
    Ok(user)
}

#[instrument(skip(pool, password))]
pub async fn authenticate_user(
    pool: &Pool<Sqlite>,
    username: &str,
    password: &str,
) -> Result<Option<User>, AppError> {
    info!("Authenticating user");
    let Some(user) = find_user_by_username(pool, username).await? else {
        warn!("Unknown username");
        return Ok(None);
    };

    if verify_password(password, &user.password_hash) {
        Ok(Some(User::from(user)))
    } else {
        warn!("Password mismatch");
        Ok(None)
    }
}

/// `password_hash` must already be hashed; hashing is kept outside the transaction.
#[instrument(skip(pool, password_hash))]
pub async fn create_user(
    pool: &Pool<Sqlite>,
    payload: &UserCreate,
    password_hash: &str,
) -> Result<User, AppError> {
    info!("Creating user");
    let mut tx = pool.begin().await?;

    ensure_exists(&mut *tx, Referenced::Role, payload.role_id).await?;

    let (user_id,): (i64,) = sqlx::query_as(
        "INSERT INTO users (username, first_name, last_name, email, password_hash, role_id, is_active) \
         VALUES (?, ?, ?, ?, ?, ?, ?) RETURNING user_id",
    )
    .bind(&payload.username)
    .bind(&payload.first_name)
    .bind(&payload.last_name)
    .bind(&payload.email)
    .bind(password_hash)
    .bind(payload.role_id)
    .bind(payload.is_active)
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| super::conflict_as(e, USERNAME_TAKEN))?;

    let user = fetch_user(&mut tx, user_id)
        .await?
        .ok_or_else(|| AppError::Internal("Created user vanished".to_string()))?;

    tx.commit().await?;
    Ok(User::from(user))
}

/// Applies a partial update. A new password arrives pre-hashed as `password_hash`.
#[instrument(skip(pool, update, password_hash))]
pub async fn update_user(
    pool: &Pool<Sqlite>,
    id: i64,
    update: UserUpdate,
    password_hash: Option<String>,
) -> Result<User, AppError> {
    info!("Updating user");
    let mut tx = pool.begin().await?;

    let mut user = fetch_user(&mut tx, id)
        .await?
        .ok_or_else(|| AppError::not_found("User"))?;

    ensure_exists_if_present(&mut *tx, Referenced::Role, update.role_id).await?;

    user.apply(update);
    if let Some(password_hash) = password_hash {
        user.password_hash = password_hash;
    }

    sqlx::query(
        "UPDATE users SET username = ?, first_name = ?, last_name = ?, email = ?, \
         password_hash = ?, role_id = ?, is_active = ? WHERE user_id = ?",
    )
    .bind(&user.username)
    .bind(&user.first_name)
    .bind(&user.last_name)
    .bind(&user.email)
    .bind(&user.password_hash)
    .bind(user.role_id)
    .bind(user.is_active)
    .bind(id)
    .execute(&mut *tx)
    .await
    .map_err(|e| super::conflict_as(e, USERNAME_TAKEN))?;

    let user = fetch_user(&mut tx, id)
        .await?
        .ok_or_else(|| AppError::not_found("User"))?;

    tx.commit().await?;
    Ok(User::from(user))
}

#[instrument(skip(pool))]
pub async fn deactivate_user(pool: &Pool<Sqlite>, id: i64) -> Result<(), AppError> {
    info!("Deactivating user");
    let mut tx = pool.begin().await?;

    let result = sqlx::query("UPDATE users SET is_active = 0 WHERE user_id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::not_found("User"));
    }

    tx.commit().await?;
    Ok(())
}

/// The user together with the courses they teach, study and assigned, and
/// the task completions recorded against their enrollments.
#[instrument(skip(pool))]
pub async fn get_user_tasks_and_courses(
    pool: &Pool<Sqlite>,
    id: i64,
) -> Result<UserTasksAndCourses, AppError> {
    info!("Fetching tasks and courses for user");
    let mut tx = pool.begin().await?;

    let user = match fetch_user(&mut tx, id).await? {
        Some(user) if user.is_active => User::from(user),
        _ => return Err(AppError::not_found("User")),
    };

    let created_courses = sqlx::query_as::<_, Course>(
        "SELECT course_id, title, description, category_id, teacher_id, deadline_in_days, is_active \
         FROM courses WHERE teacher_id = ? AND is_active = 1",
    )
    .bind(id)
    .fetch_all(&mut *tx)
    .await?;

    let enrollment_columns = "enrollment_id, student_id, course_id, assigner_id, enrolled_at, \
         deadline, completed_at, is_active";

    let enrolled_courses = sqlx::query_as::<_, Enrollment>(&format!(
        "SELECT {} FROM enrollments WHERE student_id = ? AND is_active = 1",
        enrollment_columns
    ))
    .bind(id)
    .fetch_all(&mut *tx)
    .await?;

    let assigned_courses = sqlx::query_as::<_, Enrollment>(&format!(
        "SELECT {} FROM enrollments WHERE assigner_id = ? AND is_active = 1",
        enrollment_columns
    ))
    .bind(id)
    .fetch_all(&mut *tx)
    .await?;

    let task_completions = sqlx::query_as::<_, TaskCompletion>(
        "SELECT tc.task_completion_id, tc.enrollment_id, tc.task_id, tc.completed_at, tc.is_active \
         FROM task_completions tc JOIN enrollments e ON e.enrollment_id = tc.enrollment_id \
         WHERE e.student_id = ? AND tc.is_active = 1",
    )
    .bind(id)
    .fetch_all(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok(UserTasksAndCourses {
        user,
        created_courses,
        enrolled_courses,
        assigned_courses,
        task_completions,
    })
}
