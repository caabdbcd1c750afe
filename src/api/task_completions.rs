use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::State;
use sqlx::{Pool, Sqlite};

use crate::db;
use crate::error::AppError;
use crate::models::{EntityId, TaskCompletion, TaskCompletionCreate, TaskCompletionUpdate, User};
use crate::validation::JsonValidateExt;

#[get("/task_completion")]
pub async fn api_list_task_completions(
    _user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<Vec<TaskCompletion>>, AppError> {
    Ok(Json(db::list_task_completions(db).await?))
}

#[get("/task_completion/<id>")]
pub async fn api_get_task_completion(
    id: EntityId,
    _user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<TaskCompletion>, AppError> {
    Ok(Json(db::get_task_completion(db, id.get()).await?))
}

#[post("/task_completion", data = "<payload>")]
pub async fn api_create_task_completion(
    payload: Json<TaskCompletionCreate>,
    _user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<TaskCompletion>, AppError> {
    let payload = payload.validate_custom()?;
    Ok(Json(db::create_task_completion(db, &payload).await?))
}

#[put("/task_completion/<id>", data = "<payload>")]
pub async fn api_update_task_completion(
    id: EntityId,
    payload: Json<TaskCompletionUpdate>,
    _user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<TaskCompletion>, AppError> {
    let update = payload.validate_custom()?;
    Ok(Json(db::update_task_completion(db, id.get(), update).await?))
}

/// Removes the row outright; completions are not soft-deleted.
#[delete("/task_completion/<id>")]
pub async fn api_delete_task_completion(
    id: EntityId,
    _user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Status, AppError> {
    db::delete_task_completion(db, id.get()).await?;
    Ok(Status::NoContent)
}
