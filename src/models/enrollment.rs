use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::{apply_nullable, apply_value, default_true, deserialize_present, TaskCompletion};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Enrollment {
    pub enrollment_id: i64,
    pub student_id: i64,
    pub course_id: i64,
    pub assigner_id: i64,
    pub enrolled_at: NaiveDate,
    pub deadline: Option<NaiveDate>,
    pub completed_at: Option<DateTime<Utc>>,
    pub is_active: bool,
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

#[derive(Debug, Deserialize, Validate)]
pub struct EnrollmentCreate {
    pub student_id: i64,
    pub course_id: i64,
    pub assigner_id: i64,
    #[serde(default = "today")]
    pub enrolled_at: NaiveDate,
    #[serde(default)]
    pub deadline: Option<NaiveDate>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct EnrollmentUpdate {
    pub student_id: Option<i64>,
    pub course_id: Option<i64>,
    pub assigner_id: Option<i64>,
    #[serde(default, deserialize_with = "deserialize_present")]
    pub deadline: Option<Option<NaiveDate>>,
    #[serde(default, deserialize_with = "deserialize_present")]
    pub completed_at: Option<Option<DateTime<Utc>>>,
    pub is_active: Option<bool>,
}

impl Enrollment {
    pub fn apply(&mut self, update: EnrollmentUpdate) {
        apply_value(&mut self.student_id, update.student_id);
        apply_value(&mut self.course_id, update.course_id);
        apply_value(&mut self.assigner_id, update.assigner_id);
        apply_nullable(&mut self.deadline, update.deadline);
        apply_nullable(&mut self.completed_at, update.completed_at);
        apply_value(&mut self.is_active, update.is_active);
    }
}

/// An enrollment together with how far the student got through the course.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrollmentProgress {
    #[serde(flatten)]
    pub enrollment: Enrollment,
    pub total_tasks: i64,
    pub completed_tasks: i64,
    pub task_completions: Vec<TaskCompletion>,
}
