use opentelemetry_semantic_conventions::{attribute::OTEL_STATUS_CODE, trace::ERROR_TYPE};
use rocket::http::Status;
use rocket::response::{self, Responder, Response};
use rocket::serde::json::Json;
use rocket::Request;
use serde::Serialize;
use std::collections::HashMap;
use thiserror::Error;
use tracing::{error, warn, Span};

use crate::validation::ValidationResponse;

pub const INTERNAL_ERROR_DETAIL: &str = "Internal server error";
pub const CREDENTIALS_DETAIL: &str = "Could not validate credentials";

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(sqlx::Error),

    #[error("{0}")]
    Unauthenticated(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Unprocessable(String),

    #[error("Validation failed: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn not_found(what: &str) -> Self {
        AppError::NotFound(format!("{} not found", what))
    }

    pub fn credentials() -> Self {
        AppError::Unauthenticated(CREDENTIALS_DETAIL.to_string())
    }

    pub fn log_and_record(&self, ctx: &str) {
        let current_span = Span::current();
        let is_valid_span = !current_span.is_none();

        let message = self.to_string();
        let error_kind = match self {
            AppError::Database(err) => {
                error!(error = %message, context = %ctx, db_error = %err, "Database error");
                "database_error"
            }
            AppError::Unauthenticated(msg) => {
                warn!(message = %msg, context = %ctx, "Authentication error");
                "authentication_error"
            }
            AppError::NotFound(msg) => {
                warn!(message = %msg, context = %ctx, "Not found error");
                "not_found_error"
            }
            AppError::Conflict(msg) => {
                warn!(message = %msg, context = %ctx, "Conflict error");
                "conflict_error"
            }
            AppError::Unprocessable(msg) => {
                warn!(message = %msg, context = %ctx, "Unprocessable input");
                "unprocessable_error"
            }
            AppError::Validation(errors) => {
                warn!(errors = %errors, context = %ctx, "Validation error");
                "validation_error"
            }
            AppError::Internal(msg) => {
                error!(message = %msg, context = %ctx, "Internal server error");
                "internal_error"
            }
        };

        if is_valid_span {
            current_span.record("error", tracing::field::display(true));
            current_span.record(ERROR_TYPE, tracing::field::display(error_kind));
            current_span.record("error.message", tracing::field::display(&message));

            if self.is_server_error() {
                current_span.record(OTEL_STATUS_CODE, tracing::field::display("ERROR"));
            }
        }
    }

    pub fn status_code(&self) -> Status {
        match self {
            AppError::Database(_) => Status::InternalServerError,
            AppError::Unauthenticated(_) => Status::Unauthorized,
            AppError::NotFound(_) => Status::NotFound,
            AppError::Conflict(_) => Status::Conflict,
            AppError::Unprocessable(_) => Status::UnprocessableEntity,
            AppError::Validation(_) => Status::UnprocessableEntity,
            AppError::Internal(_) => Status::InternalServerError,
        }
    }

    fn is_server_error(&self) -> bool {
        matches!(self, AppError::Database(_) | AppError::Internal(_))
    }

    /// The message a client is allowed to see. Server-side causes stay in the logs.
    pub fn public_detail(&self) -> String {
        if self.is_server_error() {
            INTERNAL_ERROR_DETAIL.to_string()
        } else {
            self.to_string()
        }
    }

    pub fn to_reply(&self) -> ErrorReply {
        let errors = match self {
            AppError::Validation(errors) => Some(ValidationResponse::from(errors).errors),
            _ => None,
        };

        ErrorReply {
            status: self.status_code(),
            detail: match self {
                AppError::Validation(_) => "Validation failed".to_string(),
                _ => self.public_detail(),
            },
            errors,
            challenge: matches!(self, AppError::Unauthenticated(_)),
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(error: sqlx::Error) -> Self {
        if let Some(db_error) = error.as_database_error() {
            if db_error.is_unique_violation() {
                return AppError::Conflict(format!("Resource already exists: {}", db_error));
            }
            if db_error.is_foreign_key_violation() || db_error.is_check_violation() {
                return AppError::Conflict(format!("Constraint violation: {}", db_error));
            }
        }
        AppError::Database(error)
    }
}

impl From<bcrypt::BcryptError> for AppError {
    fn from(error: bcrypt::BcryptError) -> Self {
        AppError::Internal(format!("Cryptography error: {}", error))
    }
}

impl From<jsonwebtoken::errors::Error> for AppError {
    fn from(error: jsonwebtoken::errors::Error) -> Self {
        AppError::Internal(format!("Token signing error: {}", error))
    }
}

impl From<sqlx::migrate::MigrateError> for AppError {
    fn from(error: sqlx::migrate::MigrateError) -> Self {
        AppError::Internal(format!("Migration error: {}", error))
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<HashMap<String, Vec<String>>>,
}

/// JSON error response shared by handlers and catchers.
#[derive(Debug)]
pub struct ErrorReply {
    pub status: Status,
    pub detail: String,
    pub errors: Option<HashMap<String, Vec<String>>>,
    pub challenge: bool,
}

impl ErrorReply {
    pub fn new(status: Status, detail: impl Into<String>) -> Self {
        Self {
            status,
            detail: detail.into(),
            errors: None,
            challenge: status == Status::Unauthorized,
        }
    }
}

impl<'r> Responder<'r, 'static> for ErrorReply {
    fn respond_to(self, req: &'r Request<'_>) -> response::Result<'static> {
        let body = ErrorBody {
            detail: self.detail,
            errors: self.errors,
        };

        let mut builder = Response::build_from(Json(body).respond_to(req)?);
        builder.status(self.status);
        if self.challenge {
            builder.raw_header("WWW-Authenticate", "Bearer");
        }
        builder.ok()
    }
}

impl<'r> Responder<'r, 'static> for AppError {
    fn respond_to(self, req: &'r Request<'_>) -> response::Result<'static> {
        self.log_and_record(&format!("Request to {} {}", req.method(), req.uri()));
        self.to_reply().respond_to(req)
    }
}
