use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::State;
use sqlx::{Pool, Sqlite};

use crate::db;
use crate::error::AppError;
use crate::models::{EntityId, Course, CourseCreate, CourseUpdate, User};
use crate::validation::JsonValidateExt;

#[get("/courses")]
pub async fn api_list_courses(
    _user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<Vec<Course>>, AppError> {
    Ok(Json(db::list_courses(db).await?))
}

#[get("/courses/<id>")]
pub async fn api_get_course(
    id: EntityId,
    _user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<Course>, AppError> {
    Ok(Json(db::get_course(db, id.get()).await?))
}

#[post("/courses", data = "<payload>")]
pub async fn api_create_course(
    payload: Json<CourseCreate>,
    _user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<Course>, AppError> {
    let payload = payload.validate_custom()?;
    Ok(Json(db::create_course(db, &payload).await?))
}

#[put("/courses/<id>", data = "<payload>")]
pub async fn api_update_course(
    id: EntityId,
    payload: Json<CourseUpdate>,
    _user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<Course>, AppError> {
    let update = payload.validate_custom()?;
    Ok(Json(db::update_course(db, id.get(), update).await?))
}

#[delete("/courses/<id>")]
pub async fn api_delete_course(
    id: EntityId,
    _user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Status, AppError> {
    db::deactivate_course(db, id.get()).await?;
    Ok(Status::NoContent)
}
