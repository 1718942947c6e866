//! In-process [`CatalogStore`] used by tests and database-less local runs.
//!
//! Mirrors the Postgres constraints that the catalog relies on (unique slugs,
//! a single banner) and lets callers inject failures per operation.

use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use storefront_core::{
    Category, CategoryChanges, NewCategory, NewProduct, Product, ProductChanges, Visibility,
};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::{CatalogStore, DbError};

const PRODUCT_SLUG_KEY: &str = "products_slug_key";
const CATEGORY_SLUG_KEY: &str = "categories_slug_key";

/// Store operations that can be made to fail with [`MemoryStore::fail_on`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    ListProducts,
    GetProduct,
    InsertProduct,
    UpdateProduct,
    DeleteProduct,
    RetagCategory,
    CountInCategory,
    ListCategories,
    GetCategory,
    InsertCategory,
    UpdateCategory,
    DeleteCategory,
    Ping,
}

#[derive(Debug, Default)]
struct Tables {
    products: Vec<Product>,
    categories: Vec<Category>,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    failing: Mutex<HashSet<StoreOp>>,
    latency: Mutex<Option<Duration>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent call of `op` return [`DbError::Unavailable`].
    pub async fn fail_on(&self, op: StoreOp) {
        self.failing.lock().await.insert(op);
    }

    pub async fn clear_failures(&self) {
        self.failing.lock().await.clear();
    }

    /// Delays every call by `latency` before it touches the tables.
    pub async fn set_latency(&self, latency: Option<Duration>) {
        *self.latency.lock().await = latency;
    }

    /// Snapshot of every stored product, regardless of visibility.
    pub async fn products(&self) -> Vec<Product> {
        self.tables.lock().await.products.clone()
    }

    /// Snapshot of every stored category.
    pub async fn categories(&self) -> Vec<Category> {
        self.tables.lock().await.categories.clone()
    }

    async fn enter(&self, op: StoreOp) -> Result<(), DbError> {
        let latency = *self.latency.lock().await;
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        if self.failing.lock().await.contains(&op) {
            return Err(DbError::Unavailable(format!("{op:?} failed (injected)")));
        }
        Ok(())
    }
}

fn unique_violation(constraint: &str) -> DbError {
    DbError::UniqueViolation {
        constraint: constraint.to_owned(),
    }
}

impl Tables {
    fn product_slug_taken(&self, slug: &str, except: Option<Uuid>) -> bool {
        self.products
            .iter()
            .any(|p| p.slug == slug && Some(p.id) != except)
    }

    fn clear_other_banners(&mut self, keep: Option<Uuid>) {
        let now = Utc::now();
        for product in self
            .products
            .iter_mut()
            .filter(|p| p.is_banner && Some(p.id) != keep)
        {
            product.is_banner = false;
            product.updated_at = now;
        }
    }

    fn category_slug_taken(&self, slug: &str, except: Option<Uuid>) -> bool {
        self.categories
            .iter()
            .any(|c| c.slug == slug && Some(c.id) != except)
    }
}

#[async_trait]
impl CatalogStore for MemoryStore {
    async fn list_products(&self, visibility: Option<Visibility>) -> Result<Vec<Product>, DbError> {
        self.enter(StoreOp::ListProducts).await?;
        let tables = self.tables.lock().await;
        // Newest insert first; the stable sort keeps that order on equal timestamps.
        let mut products: Vec<Product> = tables
            .products
            .iter()
            .rev()
            .filter(|p| visibility.is_none_or(|v| p.visibility == v))
            .cloned()
            .collect();
        products.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(products)
    }

    async fn get_product(&self, id: Uuid) -> Result<Option<Product>, DbError> {
        self.enter(StoreOp::GetProduct).await?;
        let tables = self.tables.lock().await;
        Ok(tables.products.iter().find(|p| p.id == id).cloned())
    }

    async fn get_product_by_slug(&self, slug: &str) -> Result<Option<Product>, DbError> {
        self.enter(StoreOp::GetProduct).await?;
        let tables = self.tables.lock().await;
        Ok(tables.products.iter().find(|p| p.slug == slug).cloned())
    }

    async fn insert_product(&self, product: &NewProduct) -> Result<Product, DbError> {
        self.enter(StoreOp::InsertProduct).await?;
        let mut tables = self.tables.lock().await;
        if tables.product_slug_taken(&product.slug, None) {
            return Err(unique_violation(PRODUCT_SLUG_KEY));
        }
        if product.is_banner {
            tables.clear_other_banners(None);
        }

        let now = Utc::now();
        let stored = Product {
            id: Uuid::new_v4(),
            slug: product.slug.clone(),
            name: product.name.clone(),
            description: product.description.clone(),
            price: product.price,
            currency: product.currency.clone(),
            image: product.image.clone(),
            gallery: product.gallery.clone(),
            category: product.category.clone(),
            is_banner: product.is_banner,
            is_new: product.is_new,
            offer_percent: product.offer_percent,
            stock_status: product.stock_status,
            in_stock: product.in_stock,
            visibility: product.visibility,
            created_at: now,
            updated_at: now,
        };
        tables.products.push(stored.clone());
        Ok(stored)
    }

    async fn update_product(
        &self,
        id: Uuid,
        changes: &ProductChanges,
    ) -> Result<Option<Product>, DbError> {
        self.enter(StoreOp::UpdateProduct).await?;
        let mut tables = self.tables.lock().await;
        let Some(index) = tables.products.iter().position(|p| p.id == id) else {
            return Ok(None);
        };
        if let Some(ref slug) = changes.slug {
            if tables.product_slug_taken(slug, Some(id)) {
                return Err(unique_violation(PRODUCT_SLUG_KEY));
            }
        }
        // Every check has passed; demote and write under the same lock.
        if changes.sets_banner() {
            tables.clear_other_banners(Some(id));
        }

        let product = &mut tables.products[index];
        product.apply(changes);
        product.updated_at = Utc::now();
        Ok(Some(product.clone()))
    }

    async fn delete_product(&self, id: Uuid) -> Result<bool, DbError> {
        self.enter(StoreOp::DeleteProduct).await?;
        let mut tables = self.tables.lock().await;
        let before = tables.products.len();
        tables.products.retain(|p| p.id != id);
        Ok(tables.products.len() != before)
    }

    async fn retag_category(&self, from: &str, to: &str) -> Result<u64, DbError> {
        self.enter(StoreOp::RetagCategory).await?;
        let mut tables = self.tables.lock().await;
        let now = Utc::now();
        let mut moved = 0;
        for product in tables
            .products
            .iter_mut()
            .filter(|p| p.category.as_deref() == Some(from))
        {
            product.category = Some(to.to_owned());
            product.updated_at = now;
            moved += 1;
        }
        Ok(moved)
    }

    async fn count_in_category(&self, name: &str) -> Result<u64, DbError> {
        self.enter(StoreOp::CountInCategory).await?;
        let tables = self.tables.lock().await;
        let count = tables
            .products
            .iter()
            .filter(|p| p.category.as_deref() == Some(name))
            .count();
        Ok(count as u64)
    }

    async fn list_categories(&self, active_only: bool) -> Result<Vec<Category>, DbError> {
        self.enter(StoreOp::ListCategories).await?;
        let tables = self.tables.lock().await;
        let mut categories: Vec<Category> = tables
            .categories
            .iter()
            .filter(|c| !active_only || c.is_active)
            .cloned()
            .collect();
        categories.sort_by(|a, b| a.sort.cmp(&b.sort).then_with(|| a.name.cmp(&b.name)));
        Ok(categories)
    }

    async fn get_category(&self, id: Uuid) -> Result<Option<Category>, DbError> {
        self.enter(StoreOp::GetCategory).await?;
        let tables = self.tables.lock().await;
        Ok(tables.categories.iter().find(|c| c.id == id).cloned())
    }

    async fn max_category_sort(&self) -> Result<Option<i32>, DbError> {
        self.enter(StoreOp::ListCategories).await?;
        let tables = self.tables.lock().await;
        Ok(tables.categories.iter().map(|c| c.sort).max())
    }

    async fn insert_category(&self, category: &NewCategory) -> Result<Category, DbError> {
        self.enter(StoreOp::InsertCategory).await?;
        let mut tables = self.tables.lock().await;
        if tables.category_slug_taken(&category.slug, None) {
            return Err(unique_violation(CATEGORY_SLUG_KEY));
        }
        let stored = Category {
            id: Uuid::new_v4(),
            name: category.name.clone(),
            slug: category.slug.clone(),
            sort: category.sort,
            is_active: category.is_active,
            created_at: Utc::now(),
        };
        tables.categories.push(stored.clone());
        Ok(stored)
    }

    async fn update_category(
        &self,
        id: Uuid,
        changes: &CategoryChanges,
    ) -> Result<Option<Category>, DbError> {
        self.enter(StoreOp::UpdateCategory).await?;
        let mut tables = self.tables.lock().await;
        if let Some(ref slug) = changes.slug {
            if tables.category_slug_taken(slug, Some(id)) {
                return Err(unique_violation(CATEGORY_SLUG_KEY));
            }
        }
        let Some(category) = tables.categories.iter_mut().find(|c| c.id == id) else {
            return Ok(None);
        };
        category.apply(changes);
        Ok(Some(category.clone()))
    }

    async fn delete_category(&self, id: Uuid) -> Result<bool, DbError> {
        self.enter(StoreOp::DeleteCategory).await?;
        let mut tables = self.tables.lock().await;
        let before = tables.categories.len();
        tables.categories.retain(|c| c.id != id);
        Ok(tables.categories.len() != before)
    }

    async fn ping(&self) -> Result<(), DbError> {
        self.enter(StoreOp::Ping).await
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use storefront_core::DEFAULT_CURRENCY;

    use super::*;

    fn new_product(slug: &str, category: Option<&str>) -> NewProduct {
        NewProduct {
            slug: slug.to_string(),
            name: slug.to_string(),
            description: String::new(),
            price: Decimal::from(1500),
            currency: DEFAULT_CURRENCY.to_string(),
            image: None,
            gallery: vec![],
            category: category.map(ToOwned::to_owned),
            is_banner: false,
            is_new: false,
            offer_percent: None,
            stock_status: None,
            in_stock: true,
            visibility: Visibility::Draft,
        }
    }

    #[tokio::test]
    async fn duplicate_product_slug_is_a_slug_conflict() {
        let store = MemoryStore::new();
        store.insert_product(&new_product("bag", None)).await.unwrap();
        let err = store
            .insert_product(&new_product("bag", None))
            .await
            .unwrap_err();
        assert!(err.is_slug_conflict());
    }

    fn banner(slug: &str) -> NewProduct {
        NewProduct {
            is_banner: true,
            ..new_product(slug, None)
        }
    }

    async fn banner_ids(store: &MemoryStore) -> Vec<Uuid> {
        store
            .products()
            .await
            .into_iter()
            .filter(|p| p.is_banner)
            .map(|p| p.id)
            .collect()
    }

    #[tokio::test]
    async fn new_banner_demotes_previous_banner() {
        let store = MemoryStore::new();
        let first = store.insert_product(&banner("a")).await.unwrap();
        let second = store.insert_product(&banner("b")).await.unwrap();

        assert_eq!(banner_ids(&store).await, [second.id]);
        let demoted = store.get_product(first.id).await.unwrap().unwrap();
        assert!(demoted.updated_at >= first.updated_at);
    }

    #[tokio::test]
    async fn banner_insert_with_taken_slug_keeps_current_banner() {
        let store = MemoryStore::new();
        let current = store.insert_product(&banner("a")).await.unwrap();

        let err = store.insert_product(&banner("a")).await.unwrap_err();
        assert!(err.is_slug_conflict());
        assert_eq!(banner_ids(&store).await, [current.id]);
    }

    #[tokio::test]
    async fn banner_update_with_taken_slug_keeps_current_banner() {
        let store = MemoryStore::new();
        let current = store.insert_product(&banner("a")).await.unwrap();
        let other = store.insert_product(&new_product("b", None)).await.unwrap();

        let changes = ProductChanges {
            slug: Some("a".to_string()),
            is_banner: Some(true),
            ..ProductChanges::default()
        };
        let err = store.update_product(other.id, &changes).await.unwrap_err();
        assert!(err.is_slug_conflict());
        assert_eq!(banner_ids(&store).await, [current.id]);
    }

    #[tokio::test]
    async fn banner_update_on_unknown_id_keeps_current_banner() {
        let store = MemoryStore::new();
        let current = store.insert_product(&banner("a")).await.unwrap();

        let changes = ProductChanges {
            is_banner: Some(true),
            ..ProductChanges::default()
        };
        assert!(store
            .update_product(Uuid::new_v4(), &changes)
            .await
            .unwrap()
            .is_none());
        assert_eq!(banner_ids(&store).await, [current.id]);
    }

    #[tokio::test]
    async fn retag_moves_only_matching_products() {
        let store = MemoryStore::new();
        store.insert_product(&new_product("a", Some("Shoes"))).await.unwrap();
        store.insert_product(&new_product("b", Some("Shoes"))).await.unwrap();
        store.insert_product(&new_product("c", Some("Bags"))).await.unwrap();

        assert_eq!(store.retag_category("Shoes", "Footwear").await.unwrap(), 2);
        assert_eq!(store.count_in_category("Footwear").await.unwrap(), 2);
        assert_eq!(store.count_in_category("Shoes").await.unwrap(), 0);
        assert_eq!(store.count_in_category("Bags").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn injected_failure_surfaces_as_unavailable() {
        let store = MemoryStore::new();
        store.fail_on(StoreOp::RetagCategory).await;
        assert!(matches!(
            store.retag_category("a", "b").await,
            Err(DbError::Unavailable(_))
        ));
        store.clear_failures().await;
        assert_eq!(store.retag_category("a", "b").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn categories_list_in_sort_then_name_order() {
        let store = MemoryStore::new();
        for (name, sort) in [("Zeta", 10), ("Alpha", 10), ("First", 5)] {
            store
                .insert_category(&NewCategory::new(name, Some(sort), None).unwrap())
                .await
                .unwrap();
        }
        let names: Vec<String> = store
            .list_categories(false)
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, ["First", "Alpha", "Zeta"]);
        assert_eq!(store.max_category_sort().await.unwrap(), Some(10));
    }

    #[tokio::test]
    async fn inactive_categories_hidden_when_active_only() {
        let store = MemoryStore::new();
        let cat = store
            .insert_category(&NewCategory::new("Hats", None, None).unwrap())
            .await
            .unwrap();
        let deactivate = CategoryChanges {
            is_active: Some(false),
            ..CategoryChanges::default()
        };
        store.update_category(cat.id, &deactivate).await.unwrap();

        assert!(store.list_categories(true).await.unwrap().is_empty());
        assert_eq!(store.list_categories(false).await.unwrap().len(), 1);
    }
}
