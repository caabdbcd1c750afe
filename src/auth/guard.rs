use rocket::http::Status;
use rocket::request::{FromRequest, Outcome};
use rocket::Request;
use sqlx::{Pool, Sqlite};
use tracing::{error, info, info_span, warn, Instrument};

use super::TokenService;
use crate::db::find_user_by_username;
use crate::error::AppError;
use crate::models::User;

/// Detail of a failed authentication, kept for the 401 catcher.
#[derive(Debug, Default)]
pub struct AuthFailure(pub Option<String>);

pub const NOT_AUTHENTICATED_DETAIL: &str = "Not authenticated";

/// Extracts the token from an `Authorization: Bearer <token>` header value.
pub fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.trim().split_once(' ')?;
    let token = token.trim();

    if scheme.eq_ignore_ascii_case("bearer") && !token.is_empty() {
        Some(token)
    } else {
        None
    }
}

/// Resolves a bearer token to the account named by its subject.
pub async fn resolve_user(
    pool: &Pool<Sqlite>,
    tokens: &TokenService,
    token: &str,
) -> Result<User, AppError> {
    let username = tokens.verify(token)?;

    match find_user_by_username(pool, &username).await? {
        Some(user) => Ok(User::from(user)),
        None => {
            warn!(username = %username, "Token subject no longer exists");
            Err(AppError::credentials())
        }
    }
}

async fn authenticate(request: &Request<'_>) -> Result<User, AppError> {
    let (Some(tokens), Some(pool)) = (
        request.rocket().state::<TokenService>(),
        request.rocket().state::<Pool<Sqlite>>(),
    ) else {
        error!("Token service or database pool missing from managed state");
        return Err(AppError::Internal("Authentication is not configured".to_string()));
    };

    let token = match request.headers().get_one("Authorization") {
        Some(header) => bearer_token(header).ok_or_else(AppError::credentials)?,
        None => {
            return Err(AppError::Unauthenticated(
                NOT_AUTHENTICATED_DETAIL.to_string(),
            ))
        }
    };

    let user = resolve_user(pool, tokens, token).await?;
    info!(username = %user.username, "User authenticated via bearer token");
    Ok(user)
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for User {
    type Error = AppError;

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let span = info_span!("user_auth_guard");

        match authenticate(request).instrument(span).await {
            Ok(user) => Outcome::Success(user),
            Err(err) => {
                err.log_and_record("Bearer authentication");
                let status = err.status_code();
                if status == Status::Unauthorized {
                    request.local_cache(|| AuthFailure(Some(err.public_detail())));
                }
                Outcome::Error((status, err))
            }
        }
    }
}
