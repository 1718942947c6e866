//! Database operations for the `products` table.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};
use storefront_core::{
    NewProduct, OfferPercent, Product, ProductChanges, StockStatus, Visibility,
};
use uuid::Uuid;

use crate::DbError;

// ---------------------------------------------------------------------------
// Row type
// ---------------------------------------------------------------------------

/// A row from the `products` table, with enum columns still as text.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProductRow {
    pub id: Uuid,
    pub slug: String,
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub currency: String,
    pub image: Option<String>,
    pub gallery: Vec<String>,
    pub category: Option<String>,
    pub is_banner: bool,
    pub is_new: bool,
    /// `NULL` or one of 10, 30, 50 (enforced by a CHECK constraint).
    pub offer_percent: Option<i16>,
    pub stock_status: Option<String>,
    pub in_stock: bool,
    pub visibility: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<ProductRow> for Product {
    type Error = DbError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        let visibility = row
            .visibility
            .parse::<Visibility>()
            .map_err(|_| DbError::InvalidRow {
                column: "visibility",
                value: row.visibility.clone(),
            })?;

        let stock_status = match row.stock_status {
            None => None,
            Some(ref raw) => Some(StockStatus::parse(raw).ok_or_else(|| DbError::InvalidRow {
                column: "stock_status",
                value: raw.clone(),
            })?),
        };

        let offer_percent = row
            .offer_percent
            .map(OfferPercent::try_from)
            .transpose()
            .map_err(|value| DbError::InvalidRow {
                column: "offer_percent",
                value,
            })?;

        Ok(Product {
            id: row.id,
            slug: row.slug,
            name: row.name,
            description: row.description,
            price: row.price,
            currency: row.currency,
            image: row.image,
            gallery: row.gallery,
            category: row.category,
            is_banner: row.is_banner,
            is_new: row.is_new,
            offer_percent,
            stock_status,
            in_stock: row.in_stock,
            visibility,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const PRODUCT_COLUMNS: &str = "id, slug, name, description, price, currency, image, gallery, \
     category, is_banner, is_new, offer_percent, stock_status, in_stock, visibility, \
     created_at, updated_at";

fn into_products(rows: Vec<ProductRow>) -> Result<Vec<Product>, DbError> {
    rows.into_iter().map(Product::try_from).collect()
}

fn offer_column(offer: Option<OfferPercent>) -> Option<i16> {
    offer.map(|o| i16::from(o.percent()))
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Returns products newest first, optionally filtered by visibility.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_products(
    pool: &PgPool,
    visibility: Option<Visibility>,
) -> Result<Vec<Product>, DbError> {
    let rows = sqlx::query_as::<_, ProductRow>(&format!(
        "SELECT {PRODUCT_COLUMNS} \
         FROM products \
         WHERE ($1::TEXT IS NULL OR visibility = $1) \
         ORDER BY created_at DESC, id"
    ))
    .bind(visibility.map(Visibility::as_str))
    .fetch_all(pool)
    .await?;

    into_products(rows)
}

/// Returns a single product by id, or `None` if not found.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_product(pool: &PgPool, id: Uuid) -> Result<Option<Product>, DbError> {
    let row = sqlx::query_as::<_, ProductRow>(&format!(
        "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    row.map(Product::try_from).transpose()
}

/// Returns a single product by slug, or `None` if not found.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_product_by_slug(pool: &PgPool, slug: &str) -> Result<Option<Product>, DbError> {
    let row = sqlx::query_as::<_, ProductRow>(&format!(
        "SELECT {PRODUCT_COLUMNS} FROM products WHERE slug = $1"
    ))
    .bind(slug)
    .fetch_optional(pool)
    .await?;

    row.map(Product::try_from).transpose()
}

/// Inserts a product and returns the stored row.
///
/// A banner product demotes the current banner in the same transaction, so a
/// failed insert leaves the previous banner in place.
///
/// # Errors
///
/// Returns [`DbError::UniqueViolation`] when the slug is taken, or
/// [`DbError::Sqlx`] for any other failure.
pub async fn insert_product(pool: &PgPool, product: &NewProduct) -> Result<Product, DbError> {
    let mut tx = pool.begin().await?;
    if product.is_banner {
        clear_other_banners(&mut tx, None).await?;
    }

    let row = sqlx::query_as::<_, ProductRow>(&format!(
        "INSERT INTO products \
             (slug, name, description, price, currency, image, gallery, category, \
              is_banner, is_new, offer_percent, stock_status, in_stock, visibility) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14) \
         RETURNING {PRODUCT_COLUMNS}"
    ))
    .bind(&product.slug)
    .bind(&product.name)
    .bind(&product.description)
    .bind(product.price)
    .bind(&product.currency)
    .bind(&product.image)
    .bind(&product.gallery)
    .bind(&product.category)
    .bind(product.is_banner)
    .bind(product.is_new)
    .bind(offer_column(product.offer_percent))
    .bind(product.stock_status.map(StockStatus::as_str))
    .bind(product.in_stock)
    .bind(product.visibility.as_str())
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    Product::try_from(row)
}

/// Applies a sparse update and refreshes `updated_at`.
///
/// Returns `None` when no product has the given id. Setting `is_banner`
/// demotes the current banner in the same transaction.
///
/// # Errors
///
/// Returns [`DbError::UniqueViolation`] when the new slug is taken, or
/// [`DbError::Sqlx`] if the query fails.
pub async fn update_product(
    pool: &PgPool,
    id: Uuid,
    changes: &ProductChanges,
) -> Result<Option<Product>, DbError> {
    let mut tx = pool.begin().await?;
    if changes.sets_banner() {
        clear_other_banners(&mut tx, Some(id)).await?;
    }

    // Nullable columns use a "supplied" flag so Some(None) can write NULL.
    let row = sqlx::query_as::<_, ProductRow>(&format!(
        "UPDATE products \
         SET slug          = COALESCE($2, slug), \
             name          = COALESCE($3, name), \
             description   = COALESCE($4, description), \
             price         = COALESCE($5, price), \
             currency      = COALESCE($6, currency), \
             image         = CASE WHEN $7::BOOL THEN $8::TEXT ELSE image END, \
             gallery       = COALESCE($9, gallery), \
             category      = CASE WHEN $10::BOOL THEN $11::TEXT ELSE category END, \
             is_banner     = COALESCE($12, is_banner), \
             is_new        = COALESCE($13, is_new), \
             offer_percent = CASE WHEN $14::BOOL THEN $15::SMALLINT ELSE offer_percent END, \
             stock_status  = CASE WHEN $16::BOOL THEN $17::TEXT ELSE stock_status END, \
             in_stock      = COALESCE($18, in_stock), \
             visibility    = COALESCE($19, visibility), \
             updated_at    = NOW() \
         WHERE id = $1 \
         RETURNING {PRODUCT_COLUMNS}"
    ))
    .bind(id)
    .bind(&changes.slug)
    .bind(&changes.name)
    .bind(&changes.description)
    .bind(changes.price)
    .bind(&changes.currency)
    .bind(changes.image.is_some())
    .bind(changes.image.clone().flatten())
    .bind(&changes.gallery)
    .bind(changes.category.is_some())
    .bind(changes.category.clone().flatten())
    .bind(changes.is_banner)
    .bind(changes.is_new)
    .bind(changes.offer_percent.is_some())
    .bind(offer_column(changes.offer_percent.flatten()))
    .bind(changes.stock_status.is_some())
    .bind(changes.stock_status.flatten().map(StockStatus::as_str))
    .bind(changes.in_stock)
    .bind(changes.visibility.map(Visibility::as_str))
    .fetch_optional(&mut *tx)
    .await?;

    // Unknown id: dropping the transaction rolls the banner demotion back.
    let Some(row) = row else {
        return Ok(None);
    };
    tx.commit().await?;
    Product::try_from(row).map(Some)
}

/// Demotes the current banner, skipping `keep` when given.
async fn clear_other_banners(
    tx: &mut Transaction<'_, Postgres>,
    keep: Option<Uuid>,
) -> Result<u64, DbError> {
    let result = sqlx::query(
        "UPDATE products \
         SET is_banner = FALSE, updated_at = NOW() \
         WHERE is_banner = TRUE AND ($1::UUID IS NULL OR id <> $1)",
    )
    .bind(keep)
    .execute(&mut **tx)
    .await?;

    Ok(result.rows_affected())
}

/// Moves every product tagged `from` to `to` in one statement.
///
/// Returns the number of rows changed.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn retag_category(pool: &PgPool, from: &str, to: &str) -> Result<u64, DbError> {
    let result = sqlx::query(
        "UPDATE products \
         SET category = $2, updated_at = NOW() \
         WHERE category = $1",
    )
    .bind(from)
    .bind(to)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

/// Counts products whose category equals `name`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn count_in_category(pool: &PgPool, name: &str) -> Result<u64, DbError> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE category = $1")
        .bind(name)
        .fetch_one(pool)
        .await?;

    Ok(u64::try_from(count).unwrap_or(0))
}

/// Hard-deletes a product. Returns `false` when the id was unknown.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn delete_product(pool: &PgPool, id: Uuid) -> Result<bool, DbError> {
    let result = sqlx::query("DELETE FROM products WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}
