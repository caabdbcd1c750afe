use sqlx::{Pool, Sqlite, SqliteConnection};
use tracing::{info, instrument};

use crate::error::AppError;
use crate::models::{Role, RoleCreate, RoleUpdate, DEFAULT_ROLE_DESCRIPTION, DEFAULT_ROLE_NAME};

const ROLE_COLUMNS: &str = "role_id, name, description";

async fn fetch_role(conn: &mut SqliteConnection, id: i64) -> Result<Option<Role>, AppError> {
    let role = sqlx::query_as::<_, Role>(&format!(
        "SELECT {} FROM roles WHERE role_id = ?",
        ROLE_COLUMNS
    ))
    .bind(id)
    .fetch_optional(conn)
    .await?;
    Ok(role)
}

/// Unlike the other collections, an empty role table is reported as `NotFound`.
#[instrument(skip(pool))]
pub async fn list_roles(pool: &Pool<Sqlite>) -> Result<Vec<Role>, AppError> {
    info!("Listing roles");
    let roles = sqlx::query_as::<_, Role>(&format!("SELECT {} FROM roles", ROLE_COLUMNS))
        .fetch_all(pool)
        .await?;

    if roles.is_empty() {
        return Err(AppError::NotFound("Roles not found".to_string()));
    }
    Ok(roles)
}

#[instrument(skip(pool))]
pub async fn get_role(pool: &Pool<Sqlite>, id: i64) -> Result<Role, AppError> {
    info!("Fetching role");
    let mut conn = pool.acquire().await?;
    fetch_role(&mut conn, id)
        .await?
        .ok_or_else(|| AppError::not_found("Role"))
}

#[instrument(skip(pool))]
pub async fn create_role(pool: &Pool<Sqlite>, payload: &RoleCreate) -> Result<Role, AppError> {
    info!("Creating role");
    let mut tx = pool.begin().await?;

    let role = sqlx::query_as::<_, Role>(&format!(
        "INSERT INTO roles (name, description) VALUES (?, ?) RETURNING {}",
        ROLE_COLUMNS
    ))
    .bind(&payload.name)
    .bind(&payload.description)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(role)
}

#[instrument(skip(pool))]
pub async fn update_role(
    pool: &Pool<Sqlite>,
    id: i64,
    update: RoleUpdate,
) -> Result<Role, AppError> {
    info!("Updating role");
    let mut tx = pool.begin().await?;

    let mut role = fetch_role(&mut tx, id)
        .await?
        .ok_or_else(|| AppError::not_found("Role"))?;
    role.apply(update);

    let role = sqlx::query_as::<_, Role>(&format!(
        "UPDATE roles SET name = ?, description = ? WHERE role_id = ? RETURNING {}",
        ROLE_COLUMNS
    ))
    .bind(&role.name)
    .bind(&role.description)
    .bind(id)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(role)
}

/// Removes the row. A role still referenced by users is rejected as a conflict.
#[instrument(skip(pool))]
pub async fn delete_role(pool: &Pool<Sqlite>, id: i64) -> Result<(), AppError> {
    info!("Deleting role");
    let mut tx = pool.begin().await?;

    let result = sqlx::query("DELETE FROM roles WHERE role_id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(|e| super::conflict_as(e, "Role is still assigned to users"))?;

    if result.rows_affected() == 0 {
        return Err(AppError::not_found("Role"));
    }

    tx.commit().await?;
    Ok(())
}

/// Inserts the default role when the table is empty. Returns whether a row was added.
#[instrument(skip(pool))]
pub async fn seed_default_role(pool: &Pool<Sqlite>) -> Result<bool, AppError> {
    let mut tx = pool.begin().await?;

    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM roles")
        .fetch_one(&mut *tx)
        .await?;
    if count > 0 {
        return Ok(false);
    }

    info!(name = DEFAULT_ROLE_NAME, "Seeding default role");
    sqlx::query("INSERT INTO roles (name, description) VALUES (?, ?)")
        .bind(DEFAULT_ROLE_NAME)
        .bind(DEFAULT_ROLE_DESCRIPTION)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(true)
}
