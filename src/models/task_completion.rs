use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::{apply_nullable, apply_value, default_true, deserialize_present};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct TaskCompletion {
    pub task_completion_id: i64,
    pub enrollment_id: i64,
    pub task_id: i64,
    pub completed_at: Option<DateTime<Utc>>,
    pub is_active: bool,
}

#[derive(Debug, Deserialize, Validate)]
pub struct TaskCompletionCreate {
    pub enrollment_id: i64,
    pub task_id: i64,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct TaskCompletionUpdate {
    pub enrollment_id: Option<i64>,
    pub task_id: Option<i64>,
    #[serde(default, deserialize_with = "deserialize_present")]
    pub completed_at: Option<Option<DateTime<Utc>>>,
    pub is_active: Option<bool>,
}

impl TaskCompletion {
    pub fn apply(&mut self, update: TaskCompletionUpdate) {
        apply_value(&mut self.enrollment_id, update.enrollment_id);
        apply_value(&mut self.task_id, update.task_id);
        apply_nullable(&mut self.completed_at, update.completed_at);
        apply_value(&mut self.is_active, update.is_active);
    }
}
