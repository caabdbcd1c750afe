use sqlx::{Executor, Sqlite};

use crate::error::AppError;

/// A row another row points at. Every kind except `Role` must also be active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Referenced {
    Role,
    Teacher,
    Student,
    Assigner,
    Category,
    Course,
    Enrollment,
    Task,
}

impl Referenced {
    pub fn label(self) -> &'static str {
        match self {
            Referenced::Role => "Role",
            Referenced::Teacher => "Teacher",
            Referenced::Student => "Student",
            Referenced::Assigner => "Assigner",
            Referenced::Category => "Category",
            Referenced::Course => "Course",
            Referenced::Enrollment => "Enrollment",
            Referenced::Task => "Task",
        }
    }

    fn lookup_sql(self) -> &'static str {
        match self {
            Referenced::Role => "SELECT role_id FROM roles WHERE role_id = ?",
            Referenced::Teacher | Referenced::Student | Referenced::Assigner => {
                "SELECT user_id FROM users WHERE user_id = ? AND is_active = 1"
            }
            Referenced::Category => {
                "SELECT category_id FROM categories WHERE category_id = ? AND is_active = 1"
            }
            Referenced::Course => {
                "SELECT course_id FROM courses WHERE course_id = ? AND is_active = 1"
            }
            Referenced::Enrollment => {
                "SELECT enrollment_id FROM enrollments WHERE enrollment_id = ? AND is_active = 1"
            }
            Referenced::Task => "SELECT task_id FROM tasks WHERE task_id = ? AND is_active = 1",
        }
    }
}

/// Fails with `NotFound` unless the referenced row exists and, where it has an
/// activity flag, is active.
pub async fn ensure_exists<'e, E>(executor: E, what: Referenced, id: i64) -> Result<(), AppError>
where
    E: Executor<'e, Database = Sqlite>,
{
    let found: Option<(i64,)> = sqlx::query_as(what.lookup_sql())
        .bind(id)
        .fetch_optional(executor)
        .await?;

    match found {
        Some(_) => Ok(()),
        None => Err(AppError::not_found(what.label())),
    }
}

/// Runs `ensure_exists` only for foreign keys present in a partial update.
pub async fn ensure_exists_if_present<'e, E>(
    executor: E,
    what: Referenced,
    id: Option<i64>,
) -> Result<(), AppError>
where
    E: Executor<'e, Database = Sqlite>,
{
    match id {
        Some(id) => ensure_exists(executor, what, id).await,
        None => Ok(()),
    }
}
