use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::State;
use sqlx::{Pool, Sqlite};

use crate::db;
use crate::error::AppError;
use crate::models::{
    EntityId, Enrollment, EnrollmentCreate, EnrollmentProgress, EnrollmentUpdate, User,
};
use crate::validation::JsonValidateExt;

#[get("/enrollments")]
pub async fn api_list_enrollments(
    _user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<Vec<Enrollment>>, AppError> {
    Ok(Json(db::list_enrollments(db).await?))
}

#[get("/enrollments/<id>")]
pub async fn api_get_enrollment(
    id: EntityId,
    _user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<Enrollment>, AppError> {
    Ok(Json(db::get_enrollment(db, id.get()).await?))
}

#[post("/enrollments", data = "<payload>")]
pub async fn api_create_enrollment(
    payload: Json<EnrollmentCreate>,
    _user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<Enrollment>, AppError> {
    let payload = payload.validate_custom()?;
    Ok(Json(db::create_enrollment(db, &payload).await?))
}

#[put("/enrollments/<id>", data = "<payload>")]
pub async fn api_update_enrollment(
    id: EntityId,
    payload: Json<EnrollmentUpdate>,
    _user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<Enrollment>, AppError> {
    let update = payload.validate_custom()?;
    Ok(Json(db::update_enrollment(db, id.get(), update).await?))
}

#[delete("/enrollments/<id>")]
pub async fn api_delete_enrollment(
    id: EntityId,
    _user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Status, AppError> {
    db::deactivate_enrollment(db, id.get()).await?;
    Ok(Status::NoContent)
}

/// Progress of one of the user's enrollments through its course's tasks.
#[get("/enrollments/<user_id>/task_completion?<enrollment_id>")]
pub async fn api_get_task_completion_summary(
    user_id: EntityId,
    enrollment_id: i64,
    _user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<EnrollmentProgress>, AppError> {
    let enrollment_id = EntityId::try_from(enrollment_id)?;
    Ok(Json(
        db::get_enrollment_progress(db, user_id.get(), enrollment_id.get()).await?,
    ))
}
