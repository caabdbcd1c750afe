use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::State;
use sqlx::{Pool, Sqlite};

use crate::db;
use crate::error::AppError;
use crate::models::{EntityId, Category, CategoryCreate, CategoryUpdate, User};
use crate::validation::JsonValidateExt;

#[get("/categories")]
pub async fn api_list_categories(
    _user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<Vec<Category>>, AppError> {
    Ok(Json(db::list_categories(db).await?))
}

#[get("/categories/<id>")]
pub async fn api_get_category(
    id: EntityId,
    _user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<Category>, AppError> {
    Ok(Json(db::get_category(db, id.get()).await?))
}

#[post("/categories", data = "<payload>")]
pub async fn api_create_category(
    payload: Json<CategoryCreate>,
    _user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<Category>, AppError> {
    let payload = payload.validate_custom()?;
    Ok(Json(db::create_category(db, &payload).await?))
}

#[put("/categories/<id>", data = "<payload>")]
pub async fn api_update_category(
    id: EntityId,
    payload: Json<CategoryUpdate>,
    _user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<Category>, AppError> {
    let update = payload.validate_custom()?;
    Ok(Json(db::update_category(db, id.get(), update).await?))
}

#[delete("/categories/<id>")]
pub async fn api_delete_category(
    id: EntityId,
    _user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Status, AppError> {
    db::deactivate_category(db, id.get()).await?;
    Ok(Status::NoContent)
}
