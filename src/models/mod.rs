pub mod category;
pub mod course;
pub mod enrollment;
pub mod role;
pub mod task;
pub mod task_completion;
pub mod user;

pub use category::*;
pub use course::*;
pub use enrollment::*;
pub use role::*;
pub use task::*;
pub use task_completion::*;
pub use user::*;

use rocket::request::FromParam;
use serde::{Deserialize, Deserializer};

use crate::error::AppError;

/// Row identifier accepted on the wire: a positive 64-bit integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntityId(i64);

impl EntityId {
    pub fn get(self) -> i64 {
        self.0
    }
}

impl TryFrom<i64> for EntityId {
    type Error = AppError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        if value < 1 {
            return Err(AppError::Unprocessable(format!(
                "Identifier must be between 1 and {}, got {}",
                i64::MAX,
                value
            )));
        }
        Ok(EntityId(value))
    }
}

impl<'a> FromParam<'a> for EntityId {
    type Error = AppError;

    fn from_param(param: &'a str) -> Result<Self, Self::Error> {
        let value = param.parse::<i64>().map_err(|_| {
            AppError::Unprocessable(format!("'{}' is not a valid identifier", param))
        })?;
        EntityId::try_from(value)
    }
}

/// Deserializes a field that distinguishes "absent" from "explicitly null".
///
/// Pair with `#[serde(default)]`: a missing key stays `None`, `null` becomes
/// `Some(None)` and a value becomes `Some(Some(value))`.
pub fn deserialize_present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Applies a presence-aware update to a nullable column.
pub fn apply_nullable<T>(target: &mut Option<T>, update: Option<Option<T>>) {
    if let Some(value) = update {
        *target = value;
    }
}

/// Applies an update to a non-nullable column; `None` leaves it untouched.
pub fn apply_value<T>(target: &mut T, update: Option<T>) {
    if let Some(value) = update {
        *target = value;
    }
}

pub(crate) fn default_true() -> bool {
    true
}
