use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::State;
use sqlx::{Pool, Sqlite};

use crate::auth::PasswordHasher;
use crate::db;
use crate::error::AppError;
use crate::models::{EntityId, User, UserCreate, UserTasksAndCourses, UserUpdate};
use crate::validation::JsonValidateExt;

#[get("/users")]
pub async fn api_list_users(db: &State<Pool<Sqlite>>) -> Result<Json<Vec<User>>, AppError> {
    Ok(Json(db::list_users(db).await?))
}

#[get("/users/<id>")]
pub async fn api_get_user(db: &State<Pool<Sqlite>>, id: EntityId) -> Result<Json<User>, AppError> {
    Ok(Json(db::get_user(db, id.get()).await?))
}

/// Open registration: no token is needed to create an account.
#[post("/users", data = "<payload>")]
pub async fn api_create_user(
    payload: Json<UserCreate>,
    db: &State<Pool<Sqlite>>,
    hasher: &State<PasswordHasher>,
) -> Result<Json<User>, AppError> {
    let payload = payload.validate_custom()?;
    let password_hash = hasher.hash(payload.password.clone()).await?;

    Ok(Json(db::create_user(db, &payload, &password_hash).await?))
}

#[put("/users/<id>", data = "<payload>")]
pub async fn api_update_user(
    id: EntityId,
    payload: Json<UserUpdate>,
    _user: User,
    db: &State<Pool<Sqlite>>,
    hasher: &State<PasswordHasher>,
) -> Result<Json<User>, AppError> {
    let mut update = payload.validate_custom()?;
    let password_hash = match update.password.take() {
        Some(password) => Some(hasher.hash(password).await?),
        None => None,
    };

    Ok(Json(
        db::update_user(db, id.get(), update, password_hash).await?,
    ))
}

#[delete("/users/<id>")]
pub async fn api_delete_user(
    id: EntityId,
    _user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Status, AppError> {
    db::deactivate_user(db, id.get()).await?;
    Ok(Status::NoContent)
}

#[get("/users/<id>/tasksAndCourses")]
pub async fn api_get_user_tasks_and_courses(
    db: &State<Pool<Sqlite>>,
    id: EntityId,
) -> Result<Json<UserTasksAndCourses>, AppError> {
    Ok(Json(db::get_user_tasks_and_courses(db, id.get()).await?))
}
