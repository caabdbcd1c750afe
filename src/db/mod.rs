use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use tracing::{info, instrument};

use crate::error::AppError;

pub mod categories;
pub mod checks;
pub mod courses;
pub mod enrollments;
pub mod roles;
pub mod task_completions;
pub mod tasks;
pub mod users;

pub use categories::*;
pub use courses::*;
pub use enrollments::*;
pub use roles::*;
pub use task_completions::*;
pub use tasks::*;
pub use users::*;

/// Opens the single-connection pool. SQLite has one writer, so every request
/// queues on this connection and transactions never interleave.
#[instrument]
pub async fn connect(database_url: &str) -> Result<SqlitePool, AppError> {
    info!("Connecting to database");
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await?;

    Ok(pool)
}

#[instrument(skip(pool))]
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), AppError> {
    info!("Running database migrations");
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

/// Replaces the driver text of a uniqueness conflict with a caller-facing message.
pub(crate) fn conflict_as(error: sqlx::Error, detail: &str) -> AppError {
    match AppError::from(error) {
        AppError::Conflict(_) => AppError::Conflict(detail.to_string()),
        other => other,
    }
}
