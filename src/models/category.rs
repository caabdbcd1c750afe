use serde::{Deserialize, Serialize};
use validator::Validate;

use super::{apply_nullable, apply_value, default_true, deserialize_present};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Category {
    pub category_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub is_active: bool,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CategoryCreate {
    #[validate(length(min = 3, max = 50))]
    pub name: String,
    #[validate(length(max = 100))]
    pub description: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct CategoryUpdate {
    #[validate(length(min = 3, max = 50))]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "deserialize_present")]
    #[validate(length(max = 100))]
    pub description: Option<Option<String>>,
    pub is_active: Option<bool>,
}

impl Category {
    pub fn apply(&mut self, update: CategoryUpdate) {
        apply_value(&mut self.name, update.name);
        apply_nullable(&mut self.description, update.description);
        apply_value(&mut self.is_active, update.is_active);
    }
}
