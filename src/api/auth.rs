use rocket::form::Form;
use rocket::FromForm;
use rocket::serde::json::Json;
use rocket::State;
use sqlx::{Pool, Sqlite};
use tracing::info;

use crate::auth::{TokenResponse, TokenService};
use crate::db::authenticate_user;
use crate::error::AppError;
use crate::models::User;

#[derive(FromForm)]
pub struct LoginForm {
    username: String,
    password: String,
}

/// OAuth2 password flow: form-encoded credentials in, bearer token out.
#[post("/auth/token", data = "<form>")]
pub async fn api_login(
    form: Form<LoginForm>,
    db: &State<Pool<Sqlite>>,
    tokens: &State<TokenService>,
) -> Result<Json<TokenResponse>, AppError> {
    let form = form.into_inner();

    match authenticate_user(db, &form.username, &form.password).await? {
        Some(user) => {
            let access_token = tokens.issue(&user.username)?;
            info!(username = %user.username, "Issued access token");
            Ok(Json(TokenResponse::bearer(access_token)))
        }
        None => Err(AppError::Unauthenticated(
            "Incorrect username or password".to_string(),
        )),
    }
}

#[get("/auth/users/me")]
pub async fn api_me(user: User) -> Json<User> {
    Json(user)
}

#[get("/health")]
pub fn health() -> &'static str {
    "OK"
}
