//! Database operations for the `categories` table.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use storefront_core::{Category, CategoryChanges, NewCategory};
use uuid::Uuid;

use crate::DbError;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CategoryRow {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub sort: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<CategoryRow> for Category {
    fn from(row: CategoryRow) -> Self {
        Category {
            id: row.id,
            name: row.name,
            slug: row.slug,
            sort: row.sort,
            is_active: row.is_active,
            created_at: row.created_at,
        }
    }
}

/// Returns categories ordered by `(sort, name)`.
///
/// With `active_only`, inactive categories are filtered out.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_categories(pool: &PgPool, active_only: bool) -> Result<Vec<Category>, DbError> {
    let rows = sqlx::query_as::<_, CategoryRow>(
        "SELECT id, name, slug, sort, is_active, created_at \
         FROM categories \
         WHERE ($1 = FALSE OR is_active = TRUE) \
         ORDER BY sort, name",
    )
    .bind(active_only)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(Category::from).collect())
}

/// Returns a single category by id, or `None` if not found.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_category(pool: &PgPool, id: Uuid) -> Result<Option<Category>, DbError> {
    let row = sqlx::query_as::<_, CategoryRow>(
        "SELECT id, name, slug, sort, is_active, created_at \
         FROM categories \
         WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(Category::from))
}

/// Highest sort key in use, or `None` for an empty table.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn max_category_sort(pool: &PgPool) -> Result<Option<i32>, DbError> {
    let max: Option<i32> = sqlx::query_scalar("SELECT MAX(sort) FROM categories")
        .fetch_one(pool)
        .await?;

    Ok(max)
}

/// Inserts a category and returns the stored row.
///
/// # Errors
///
/// Returns [`DbError::UniqueViolation`] when the slug is taken, or
/// [`DbError::Sqlx`] for any other failure.
pub async fn insert_category(pool: &PgPool, category: &NewCategory) -> Result<Category, DbError> {
    let row = sqlx::query_as::<_, CategoryRow>(
        "INSERT INTO categories (name, slug, sort, is_active) \
         VALUES ($1, $2, $3, $4) \
         RETURNING id, name, slug, sort, is_active, created_at",
    )
    .bind(&category.name)
    .bind(&category.slug)
    .bind(category.sort)
    .bind(category.is_active)
    .fetch_one(pool)
    .await?;

    Ok(Category::from(row))
}

/// Applies a sparse update. Returns `None` when the id is unknown.
///
/// # Errors
///
/// Returns [`DbError::UniqueViolation`] when the new slug is taken, or
/// [`DbError::Sqlx`] for any other failure.
pub async fn update_category(
    pool: &PgPool,
    id: Uuid,
    changes: &CategoryChanges,
) -> Result<Option<Category>, DbError> {
    let row = sqlx::query_as::<_, CategoryRow>(
        "UPDATE categories \
         SET name      = COALESCE($2, name), \
             slug      = COALESCE($3, slug), \
             sort      = COALESCE($4, sort), \
             is_active = COALESCE($5, is_active) \
         WHERE id = $1 \
         RETURNING id, name, slug, sort, is_active, created_at",
    )
    .bind(id)
    .bind(&changes.name)
    .bind(&changes.slug)
    .bind(changes.sort)
    .bind(changes.is_active)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(Category::from))
}

/// Hard-deletes a category. Returns `false` when the id was unknown.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn delete_category(pool: &PgPool, id: Uuid) -> Result<bool, DbError> {
    let result = sqlx::query("DELETE FROM categories WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}
