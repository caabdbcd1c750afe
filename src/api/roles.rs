use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::State;
use sqlx::{Pool, Sqlite};

use crate::db;
use crate::error::AppError;
use crate::models::{EntityId, Role, RoleCreate, RoleUpdate, User};
use crate::validation::JsonValidateExt;

#[get("/roles")]
pub async fn api_list_roles(db: &State<Pool<Sqlite>>) -> Result<Json<Vec<Role>>, AppError> {
    Ok(Json(db::list_roles(db).await?))
}

#[get("/roles/<id>")]
pub async fn api_get_role(db: &State<Pool<Sqlite>>, id: EntityId) -> Result<Json<Role>, AppError> {
    Ok(Json(db::get_role(db, id.get()).await?))
}

#[post("/roles", data = "<payload>")]
pub async fn api_create_role(
    payload: Json<RoleCreate>,
    _user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<Role>, AppError> {
    let payload = payload.validate_custom()?;
    Ok(Json(db::create_role(db, &payload).await?))
}

#[put("/roles/<id>", data = "<payload>")]
pub async fn api_update_role(
    id: EntityId,
    payload: Json<RoleUpdate>,
    _user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<Role>, AppError> {
    let update = payload.validate_custom()?;
    Ok(Json(db::update_role(db, id.get(), update).await?))
}

#[delete("/roles/<id>")]
pub async fn api_delete_role(
    id: EntityId,
    _user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Status, AppError> {
    db::delete_role(db, id.get()).await?;
    Ok(Status::NoContent)
}
