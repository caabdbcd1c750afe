use serde::{Deserialize, Serialize};
use validator::Validate;

use super::{apply_nullable, apply_value, default_true, deserialize_present};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    pub task_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub course_id: i64,
    pub is_active: bool,
}

fn default_title() -> String {
    "Default".to_string()
}

#[derive(Debug, Deserialize, Validate)]
pub struct TaskCreate {
    #[serde(default = "default_title")]
    #[validate(length(min = 1, max = 50))]
    pub title: String,
    #[validate(length(min = 1, max = 100))]
    pub description: Option<String>,
    pub course_id: i64,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct TaskUpdate {
    #[validate(length(min = 1, max = 50))]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "deserialize_present")]
    #[validate(length(min = 1, max = 100))]
    pub description: Option<Option<String>>,
    pub course_id: Option<i64>,
    pub is_active: Option<bool>,
}

impl Task {
    pub fn apply(&mut self, update: TaskUpdate) {
        apply_value(&mut self.title, update.title);
        apply_nullable(&mut self.description, update.description);
        apply_value(&mut self.course_id, update.course_id);
        apply_value(&mut self.is_active, update.is_active);
    }
}
