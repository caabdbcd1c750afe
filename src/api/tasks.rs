use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::State;
use sqlx::{Pool, Sqlite};

use crate::db;
use crate::error::AppError;
use crate::models::{EntityId, Task, TaskCreate, TaskUpdate, User};
use crate::validation::JsonValidateExt;

#[get("/tasks")]
pub async fn api_list_tasks(
    _user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<Vec<Task>>, AppError> {
    Ok(Json(db::list_tasks(db).await?))
}

#[get("/tasks/<id>")]
pub async fn api_get_task(
    id: EntityId,
    _user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<Task>, AppError> {
    Ok(Json(db::get_task(db, id.get()).await?))
}

#[post("/tasks", data = "<payload>")]
pub async fn api_create_task(
    payload: Json<TaskCreate>,
    _user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<Task>, AppError> {
    let payload = payload.validate_custom()?;
    Ok(Json(db::create_task(db, &payload).await?))
}

#[put("/tasks/<id>", data = "<payload>")]
pub async fn api_update_task(
    id: EntityId,
    payload: Json<TaskUpdate>,
    _user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<Task>, AppError> {
    let update = payload.validate_custom()?;
    Ok(Json(db::update_task(db, id.get(), update).await?))
}

#[delete("/tasks/<id>")]
pub async fn api_delete_task(
    id: EntityId,
    _user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Status, AppError> {
    db::deactivate_task(db, id.get()).await?;
    Ok(Status::NoContent)
}
