use rocket::serde::json::Json;
use serde::Serialize;
use std::collections::HashMap;
use validator::{Validate, ValidationErrors};

use crate::error::AppError;

#[derive(Debug, Serialize, Clone)]
pub struct ValidationResponse {
    pub status: &'static str,
    pub errors: HashMap<String, Vec<String>>,
}

impl ValidationResponse {
    pub fn new(errors: HashMap<String, Vec<String>>) -> Self {
        Self {
            status: "error",
            errors,
        }
    }
}

impl From<&ValidationErrors> for ValidationResponse {
    fn from(errors: &ValidationErrors) -> Self {
        let mut error_map = HashMap::new();

        for (field, field_errors) in errors.field_errors() {
            let error_messages: Vec<String> = field_errors
                .iter()
                .map(|error| match &error.message {
                    Some(message) => message.to_string(),
                    None => format!("Invalid value ({})", error.code),
                })
                .collect();

            error_map.insert(field.to_string(), error_messages);
        }

        Self::new(error_map)
    }
}

pub trait JsonValidateExt<T> {
    /// Unwraps the payload after running its `validator` rules.
    fn validate_custom(self) -> Result<T, AppError>;
}

impl<T: Validate> JsonValidateExt<T> for Json<T> {
    fn validate_custom(self) -> Result<T, AppError> {
        let payload = self.into_inner();
        payload.validate()?;
        Ok(payload)
    }
}
