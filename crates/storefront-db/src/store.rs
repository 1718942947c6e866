use async_trait::async_trait;
use sqlx::PgPool;
use storefront_core::{
    Category, CategoryChanges, NewCategory, NewProduct, Product, ProductChanges, Visibility,
};
use uuid::Uuid;

use crate::{categories, products, DbError};

/// Persistence seam for the catalog.
///
/// [`PgStore`] is the production implementation; [`crate::MemoryStore`]
/// backs unit tests and local runs without a database.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn list_products(&self, visibility: Option<Visibility>) -> Result<Vec<Product>, DbError>;

    async fn get_product(&self, id: Uuid) -> Result<Option<Product>, DbError>;

    async fn get_product_by_slug(&self, slug: &str) -> Result<Option<Product>, DbError>;

    /// Inserts a product. A banner product atomically demotes the current
    /// banner; when the insert fails the previous banner is kept.
    async fn insert_product(&self, product: &NewProduct) -> Result<Product, DbError>;

    /// Sparse update; bumps `updated_at`. `None` when the id is unknown.
    /// Setting the banner flag demotes the current banner atomically with
    /// the write.
    async fn update_product(
        &self,
        id: Uuid,
        changes: &ProductChanges,
    ) -> Result<Option<Product>, DbError>;

    async fn delete_product(&self, id: Uuid) -> Result<bool, DbError>;

    /// Re-points every product whose category is `from` to `to`.
    async fn retag_category(&self, from: &str, to: &str) -> Result<u64, DbError>;

    async fn count_in_category(&self, name: &str) -> Result<u64, DbError>;

    async fn list_categories(&self, active_only: bool) -> Result<Vec<Category>, DbError>;

    async fn get_category(&self, id: Uuid) -> Result<Option<Category>, DbError>;

    async fn max_category_sort(&self) -> Result<Option<i32>, DbError>;

    async fn insert_category(&self, category: &NewCategory) -> Result<Category, DbError>;

    async fn update_category(
        &self,
        id: Uuid,
        changes: &CategoryChanges,
    ) -> Result<Option<Category>, DbError>;

    async fn delete_category(&self, id: Uuid) -> Result<bool, DbError>;

    /// Liveness check used by the health endpoint.
    async fn ping(&self) -> Result<(), DbError>;
}

/// [`CatalogStore`] over a Postgres pool.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CatalogStore for PgStore {
    async fn list_products(&self, visibility: Option<Visibility>) -> Result<Vec<Product>, DbError> {
        products::list_products(&self.pool, visibility).await
    }

    async fn get_product(&self, id: Uuid) -> Result<Option<Product>, DbError> {
        products::get_product(&self.pool, id).await
    }

    async fn get_product_by_slug(&self, slug: &str) -> Result<Option<Product>, DbError> {
        products::get_product_by_slug(&self.pool, slug).await
    }

    async fn insert_product(&self, product: &NewProduct) -> Result<Product, DbError> {
        products::insert_product(&self.pool, product).await
    }

    async fn update_product(
        &self,
        id: Uuid,
        changes: &ProductChanges,
    ) -> Result<Option<Product>, DbError> {
        products::update_product(&self.pool, id, changes).await
    }

    async fn delete_product(&self, id: Uuid) -> Result<bool, DbError> {
        products::delete_product(&self.pool, id).await
    }

    async fn retag_category(&self, from: &str, to: &str) -> Result<u64, DbError> {
        products::retag_category(&self.pool, from, to).await
    }

    async fn count_in_category(&self, name: &str) -> Result<u64, DbError> {
        products::count_in_category(&self.pool, name).await
    }

    async fn list_categories(&self, active_only: bool) -> Result<Vec<Category>, DbError> {
        categories::list_categories(&self.pool, active_only).await
    }

    async fn get_category(&self, id: Uuid) -> Result<Option<Category>, DbError> {
        categories::get_category(&self.pool, id).await
    }

    async fn max_category_sort(&self) -> Result<Option<i32>, DbError> {
        categories::max_category_sort(&self.pool).await
    }

    async fn insert_category(&self, category: &NewCategory) -> Result<Category, DbError> {
        categories::insert_category(&self.pool, category).await
    }

    async fn update_category(
        &self,
        id: Uuid,
        changes: &CategoryChanges,
    ) -> Result<Option<Category>, DbError> {
        categories::update_category(&self.pool, id, changes).await
    }

    async fn delete_category(&self, id: Uuid) -> Result<bool, DbError> {
        categories::delete_category(&self.pool, id).await
    }

    async fn ping(&self) -> Result<(), DbError> {
        crate::ping(&self.pool).await.map_err(DbError::from)
    }
}
