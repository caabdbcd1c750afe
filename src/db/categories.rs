use sqlx::{Pool, Sqlite, SqliteConnection};
use tracing::{info, instrument};

use crate::error::AppError;
use crate::models::{Category, CategoryCreate, CategoryUpdate};

const CATEGORY_COLUMNS: &str = "category_id, name, description, is_active";

async fn fetch_category(
    conn: &mut SqliteConnection,
    id: i64,
) -> Result<Option<Category>, AppError> {
    let category = sqlx::query_as::<_, Category>(&format!(
        "SELECT {} FROM categories WHERE category_id = ?",
        CATEGORY_COLUMNS
    ))
    .bind(id)
    .fetch_optional(conn)
    .await?;
    Ok(category)
}

/// Every category, inactive ones included.
#[instrument(skip(pool))]
pub async fn list_categories(pool: &Pool<Sqlite>) -> Result<Vec<Category>, AppError> {
    info!("Listing categories");
    let categories =
        sqlx::query_as::<_, Category>(&format!("SELECT {} FROM categories", CATEGORY_COLUMNS))
            .fetch_all(pool)
            .await?;
    Ok(categories)
}

#[instrument(skip(pool))]
pub async fn get_category(pool: &Pool<Sqlite>, id: i64) -> Result<Category, AppError> {
    info!("Fetching category");
    let mut conn = pool.acquire().await?;
    match fetch_category(&mut conn, id).await? {
        Some(category) if category.is_active => Ok(category),
        _ => Err(AppError::not_found("Category")),
    }
}

#[instrument(skip(pool))]
pub async fn create_category(
    pool: &Pool<Sqlite>,
    payload: &CategoryCreate,
) -> Result<Category, AppError> {
    info!("Creating category");
    let mut tx = pool.begin().await?;

    let category = sqlx::query_as::<_, Category>(&format!(
        "INSERT INTO categories (name, description, is_active) VALUES (?, ?, ?) RETURNING {}",
        CATEGORY_COLUMNS
    ))
    .bind(&payload.name)
    .bind(&payload.description)
    .bind(payload.is_active)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(category)
}

#[instrument(skip(pool))]
pub async fn update_category(
    pool: &Pool<Sqlite>,
    id: i64,
    update: CategoryUpdate,
) -> Result<Category, AppError> {
    info!("Updating category");
    let mut tx = pool.begin().await?;

    let mut category = fetch_category(&mut tx, id)
        .await?
        .ok_or_else(|| AppError::not_found("Category"))?;
    category.apply(update);

    let category = sqlx::query_as::<_, Category>(&format!(
        "UPDATE categories SET name = ?, description = ?, is_active = ? WHERE category_id = ? \
         RETURNING {}",
        CATEGORY_COLUMNS
    ))
    .bind(&category.name)
    .bind(&category.description)
    .bind(category.is_active)
    .bind(id)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(category)
}

/// Soft delete: the row stays and is returned with `is_active = false`.
#[instrument(skip(pool))]
pub async fn deactivate_category(pool: &Pool<Sqlite>, id: i64) -> Result<Category, AppError> {
    info!("Deactivating category");
    let mut tx = pool.begin().await?;

    let category = sqlx::query_as::<_, Category>(&format!(
        "UPDATE categories SET is_active = 0 WHERE category_id = ? RETURNING {}",
        CATEGORY_COLUMNS
    ))
    .bind(id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| AppError::not_found("Category"))?;

    tx.commit().await?;
    Ok(category)
}
