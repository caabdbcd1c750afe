use tokio::task;
use tracing::warn;

use crate::error::AppError;

/// Hashes new passwords with the configured bcrypt cost.
#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    cost: u32,
}

impl PasswordHasher {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    /// Runs bcrypt on the blocking pool so request workers stay free.
    pub async fn hash(&self, password: String) -> Result<String, AppError> {
        let cost = self.cost;
        let hashed = task::spawn_blocking(move || bcrypt::hash(password, cost))
            .await
            .map_err(|e| AppError::Internal(format!("Password hashing task failed: {}", e)))??;
        Ok(hashed)
    }
}

/// A stored value that is not a bcrypt hash never matches.
pub fn verify_password(password: &str, password_hash: &str) -> bool {
    match bcrypt::verify(password, password_hash) {
        Ok(matches) => matches,
        Err(err) => {
            warn!(error = %err, "Stored password hash could not be read");
            false
        }
    }
}
