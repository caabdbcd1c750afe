use serde::{Deserialize, Serialize};
use validator::Validate;

use super::{apply_nullable, apply_value, deserialize_present};

pub const DEFAULT_ROLE_NAME: &str = "User";
pub const DEFAULT_ROLE_DESCRIPTION: &str = "Default user role";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Role {
    pub role_id: i64,
    pub name: String,
    pub description: Option<String>,
}

fn default_name() -> String {
    "Default".to_string()
}

#[derive(Debug, Deserialize, Validate)]
pub struct RoleCreate {
    #[serde(default = "default_name")]
    #[validate(length(min = 1, max = 50))]
    pub name: String,
    #[validate(length(min = 1, max = 100))]
    pub description: Option<String>,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct RoleUpdate {
    #[validate(length(min = 1, max = 50))]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "deserialize_present")]
    #[validate(length(min = 1, max = 100))]
    pub description: Option<Option<String>>,
}

impl Role {
    pub fn apply(&mut self, update: RoleUpdate) {
        apply_value(&mut self.name, update.name);
        apply_nullable(&mut self.description, update.description);
    }
}
