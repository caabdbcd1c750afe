use serde::{Deserialize, Serialize};
use validator::Validate;

use super::{apply_value, default_true, Course, Enrollment, Role, TaskCompletion};

/// Public view of an account. The password hash never leaves the database layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub user_id: i64,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub is_active: bool,
    pub role: Role,
}

#[derive(sqlx::FromRow, Clone)]
pub struct DbUser {
    pub user_id: i64,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password_hash: String,
    pub role_id: i64,
    pub is_active: bool,
    pub role_name: String,
    pub role_description: Option<String>,
}

impl From<DbUser> for User {
    fn from(user: DbUser) -> Self {
        Self {
            user_id: user.user_id,
            username: user.username,
            first_name: user.first_name,
            last_name: user.last_name,
            email: user.email,
            is_active: user.is_active,
            role: Role {
                role_id: user.role_id,
                name: user.role_name,
                description: user.role_description,
            },
        }
    }
}

impl std::fmt::Debug for DbUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DbUser")
            .field("user_id", &self.user_id)
            .field("username", &self.username)
            .field("role_id", &self.role_id)
            .field("is_active", &self.is_active)
            .finish_non_exhaustive()
    }
}

#[derive(Deserialize, Validate)]
pub struct UserCreate {
    #[validate(length(min = 3, max = 50))]
    pub username: String,
    #[validate(length(min = 1, max = 50))]
    pub first_name: String,
    #[validate(length(min = 1, max = 50))]
    pub last_name: String,
    #[validate(email, length(min = 5, max = 50))]
    pub email: String,
    #[serde(alias = "password_hash")]
    #[validate(length(min = 6, max = 50))]
    pub password: String,
    pub role_id: i64,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl std::fmt::Debug for UserCreate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserCreate")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("role_id", &self.role_id)
            .finish_non_exhaustive()
    }
}

#[derive(Default, Deserialize, Validate)]
pub struct UserUpdate {
    #[validate(length(min = 3, max = 50))]
    pub username: Option<String>,
    #[validate(length(min = 1, max = 50))]
    pub first_name: Option<String>,
    #[validate(length(min = 1, max = 50))]
    pub last_name: Option<String>,
    #[validate(email, length(min = 5, max = 50))]
    pub email: Option<String>,
    #[serde(alias = "password_hash")]
    #[validate(length(min = 6, max = 50))]
    pub password: Option<String>,
    pub role_id: Option<i64>,
    pub is_active: Option<bool>,
}

impl std::fmt::Debug for UserUpdate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserUpdate")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("role_id", &self.role_id)
            .field("is_active", &self.is_active)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish_non_exhaustive()
    }
}

impl DbUser {
    /// Applies every field except the password, which must be hashed by the caller.
    pub fn apply(&mut self, update: UserUpdate) {
        apply_value(&mut self.username, update.username);
        apply_value(&mut self.first_name, update.first_name);
        apply_value(&mut self.last_name, update.last_name);
        apply_value(&mut self.email, update.email);
        apply_value(&mut self.role_id, update.role_id);
        apply_value(&mut self.is_active, update.is_active);
    }
}

/// Everything a user is involved in, as teacher, student or assigner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserTasksAndCourses {
    #[serde(flatten)]
    pub user: User,
    pub created_courses: Vec<Course>,
    pub enrolled_courses: Vec<Enrollment>,
    pub assigned_courses: Vec<Enrollment>,
    pub task_completions: Vec<TaskCompletion>,
}
