//! Product store operations.

use storefront_core::{
    generated_slug, NewProduct, NewProductInput, Product, ProductChanges, ProductPatchInput,
    Visibility,
};
use uuid::Uuid;

use crate::invalidation::Invalidation;
use crate::{AdminSession, Catalog, CatalogError};

/// Attempts at a generated slug before giving up.
const SLUG_ATTEMPTS: usize = 3;

fn not_found(id: Uuid) -> CatalogError {
    CatalogError::NotFound(format!("product {id}"))
}

fn slug_conflict(slug: &str) -> CatalogError {
    CatalogError::Conflict {
        message: format!("product slug '{slug}' is already in use"),
        count: None,
    }
}

impl Catalog {
    /// Products newest first, optionally restricted to one visibility.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::RemoteCall`] on storage failure.
    pub async fn list_products(
        &self,
        visibility: Option<Visibility>,
    ) -> Result<Vec<Product>, CatalogError> {
        self.remote("list_products", self.store().list_products(visibility))
            .await
    }

    /// # Errors
    ///
    /// Returns [`CatalogError::NotFound`] for an unknown id.
    pub async fn get_product(&self, id: Uuid) -> Result<Product, CatalogError> {
        self.remote("get_product", self.store().get_product(id))
            .await?
            .ok_or_else(|| not_found(id))
    }

    /// # Errors
    ///
    /// Returns [`CatalogError::NotFound`] for an unknown slug.
    pub async fn get_product_by_slug(&self, slug: &str) -> Result<Product, CatalogError> {
        self.remote("get_product_by_slug", self.store().get_product_by_slug(slug))
            .await?
            .ok_or_else(|| CatalogError::NotFound(format!("product '{slug}'")))
    }

    /// Creates a product. A generated slug is retried on collision; a
    /// supplied one that collides is a conflict.
    ///
    /// # Errors
    ///
    /// - [`CatalogError::Validation`] for a blank name or negative price.
    /// - [`CatalogError::Conflict`] when the slug cannot be claimed.
    pub async fn create_product(
        &self,
        _session: &AdminSession,
        input: NewProductInput,
    ) -> Result<Product, CatalogError> {
        let explicit_slug = input
            .slug
            .as_deref()
            .is_some_and(|s| !s.trim().is_empty());
        let mut new = input.into_new_product(generated_slug)?;
        let product = self.insert_with_slug_retry(&mut new, explicit_slug).await?;

        tracing::info!(product_id = %product.id, slug = %product.slug, "product created");
        self.invalidate(Invalidation::Products);
        Ok(product)
    }

    async fn insert_with_slug_retry(
        &self,
        new: &mut NewProduct,
        explicit_slug: bool,
    ) -> Result<Product, CatalogError> {
        let mut attempt = 1;
        loop {
            let inserted = self
                .call("insert_product", self.store().insert_product(new))
                .await;
            match inserted {
                Ok(product) => return Ok(product),
                Err(e) if e.is_slug_conflict() => {
                    if explicit_slug || attempt >= SLUG_ATTEMPTS {
                        return Err(slug_conflict(&new.slug));
                    }
                    tracing::debug!(slug = %new.slug, attempt, "generated slug collided; retrying");
                    new.slug = generated_slug(&new.name);
                    attempt += 1;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Applies a normalized partial update.
    ///
    /// Making a product the banner demotes the current one in the same store
    /// write, so a failed update leaves it untouched.
    ///
    /// # Errors
    ///
    /// - [`CatalogError::Validation`] when nothing recognised was supplied.
    /// - [`CatalogError::NotFound`] for an unknown id.
    /// - [`CatalogError::Conflict`] when a new slug is taken.
    pub async fn update_product(
        &self,
        _session: &AdminSession,
        id: Uuid,
        input: ProductPatchInput,
    ) -> Result<Product, CatalogError> {
        let changes = input.normalize()?;
        self.apply_product_changes(id, &changes).await
    }

    /// Sets a product's visibility to `published`.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::NotFound`] for an unknown id.
    pub async fn publish_website(
        &self,
        _session: &AdminSession,
        id: Uuid,
    ) -> Result<Product, CatalogError> {
        let product = self
            .apply_product_changes(id, &ProductChanges::visibility(Visibility::Published))
            .await?;
        tracing::info!(product_id = %id, "product published to website");
        Ok(product)
    }

    async fn apply_product_changes(
        &self,
        id: Uuid,
        changes: &ProductChanges,
    ) -> Result<Product, CatalogError> {
        let product = match self
            .call("update_product", self.store().update_product(id, changes))
            .await
        {
            Ok(Some(product)) => product,
            Ok(None) => return Err(not_found(id)),
            Err(e) if e.is_slug_conflict() => {
                return Err(slug_conflict(changes.slug.as_deref().unwrap_or_default()))
            }
            Err(e) => return Err(e.into()),
        };

        self.invalidate(Invalidation::Products);
        Ok(product)
    }

    /// # Errors
    ///
    /// Returns [`CatalogError::NotFound`] for an unknown id.
    pub async fn delete_product(
        &self,
        _session: &AdminSession,
        id: Uuid,
    ) -> Result<(), CatalogError> {
        if !self
            .remote("delete_product", self.store().delete_product(id))
            .await?
        {
            return Err(not_found(id));
        }
        tracing::info!(product_id = %id, "product deleted");
        self.invalidate(Invalidation::Products);
        Ok(())
    }
}
