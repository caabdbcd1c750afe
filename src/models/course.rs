use serde::{Deserialize, Serialize};
use validator::Validate;

use super::{apply_nullable, apply_value, default_true, deserialize_present};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Course {
    pub course_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub category_id: i64,
    pub teacher_id: i64,
    pub deadline_in_days: Option<i64>,
    pub is_active: bool,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CourseCreate {
    #[validate(length(min = 3, max = 50))]
    pub title: String,
    #[validate(length(max = 100))]
    pub description: Option<String>,
    pub category_id: i64,
    pub teacher_id: i64,
    #[serde(default)]
    #[validate(range(min = 0))]
    pub deadline_in_days: Option<i64>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct CourseUpdate {
    #[validate(length(min = 3, max = 50))]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "deserialize_present")]
    #[validate(length(max = 100))]
    pub description: Option<Option<String>>,
    pub category_id: Option<i64>,
    pub teacher_id: Option<i64>,
    #[serde(default, deserialize_with = "deserialize_present")]
    #[validate(range(min = 0))]
    pub deadline_in_days: Option<Option<i64>>,
    pub is_active: Option<bool>,
}

impl Course {
    pub fn apply(&mut self, update: CourseUpdate) {
        apply_value(&mut self.title, update.title);
        apply_nullable(&mut self.description, update.description);
        apply_value(&mut self.category_id, update.category_id);
        apply_value(&mut self.teacher_id, update.teacher_id);
        apply_nullable(&mut self.deadline_in_days, update.deadline_in_days);
        apply_value(&mut self.is_active, update.is_active);
    }
}
