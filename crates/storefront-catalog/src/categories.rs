//! Category store operations and the rename cascade.

use storefront_core::{Category, CategoryPatchInput, NewCategory};
use storefront_db::DbError;
use uuid::Uuid;

use crate::invalidation::Invalidation;
use crate::{AdminSession, Catalog, CatalogError};

fn slug_conflict(slug: &str) -> CatalogError {
    CatalogError::Conflict {
        message: format!("category slug '{slug}' is already in use"),
        count: None,
    }
}

impl Catalog {
    /// Categories ordered by `(sort, name)`; inactive ones dropped when
    /// `active_only`.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::RemoteCall`] on storage failure.
    pub async fn list_categories(&self, active_only: bool) -> Result<Vec<Category>, CatalogError> {
        self.remote("list_categories", self.store().list_categories(active_only))
            .await
    }

    /// # Errors
    ///
    /// Returns [`CatalogError::NotFound`] for an unknown id.
    pub async fn get_category(&self, id: Uuid) -> Result<Category, CatalogError> {
        self.remote("get_category", self.store().get_category(id))
            .await?
            .ok_or_else(|| CatalogError::NotFound(format!("category {id}")))
    }

    /// Creates an active category. Without an explicit `sort` it goes after
    /// the current last one.
    ///
    /// # Errors
    ///
    /// - [`CatalogError::Validation`] for a blank name.
    /// - [`CatalogError::Conflict`] when the slug is taken.
    pub async fn create_category(
        &self,
        _session: &AdminSession,
        name: &str,
        sort: Option<i32>,
    ) -> Result<Category, CatalogError> {
        let max_sort = match sort {
            Some(_) => None,
            None => {
                self.remote("max_category_sort", self.store().max_category_sort())
                    .await?
            }
        };
        let new = NewCategory::new(name, sort, max_sort)?;

        let category = match self
            .call("insert_category", self.store().insert_category(&new))
            .await
        {
            Ok(category) => category,
            Err(e) if e.is_slug_conflict() => return Err(slug_conflict(&new.slug)),
            Err(e) => return Err(e.into()),
        };

        tracing::info!(category_id = %category.id, name = %category.name, "category created");
        self.invalidate(Invalidation::Categories);
        Ok(category)
    }

    /// Applies a partial update. A rename re-tags every product that pointed
    /// at the old name.
    ///
    /// # Errors
    ///
    /// - [`CatalogError::NotFound`] for an unknown id.
    /// - [`CatalogError::Conflict`] when the new slug is taken.
    /// - [`CatalogError::CascadeFailed`] when the category was renamed but
    ///   its products could not be re-tagged. The rename stays in place.
    pub async fn update_category(
        &self,
        _session: &AdminSession,
        id: Uuid,
        input: CategoryPatchInput,
    ) -> Result<Category, CatalogError> {
        let current = self.get_category(id).await?;
        let changes = input.normalize();
        if changes.is_empty() {
            return Ok(current);
        }
        let renamed_to = changes.renames(&current.name).map(ToOwned::to_owned);

        let updated = match self
            .call("update_category", self.store().update_category(id, &changes))
            .await
        {
            Ok(Some(category)) => category,
            Ok(None) => return Err(CatalogError::NotFound(format!("category {id}"))),
            Err(e) if e.is_slug_conflict() => {
                return Err(slug_conflict(changes.slug.as_deref().unwrap_or_default()))
            }
            Err(e) => return Err(e.into()),
        };
        self.invalidate(Invalidation::Categories);

        if let Some(new_name) = renamed_to {
            self.cascade_rename(&current.name, &new_name).await?;
        }

        Ok(updated)
    }

    async fn cascade_rename(&self, old: &str, new: &str) -> Result<(), CatalogError> {
        match self
            .call("retag_category", self.store().retag_category(old, new))
            .await
        {
            Ok(moved) => {
                tracing::info!(old, new, products = moved, "category rename cascaded");
                self.invalidate(Invalidation::Products);
                Ok(())
            }
            Err(e) => {
                tracing::error!(old, new, error = %e, "category renamed but product cascade failed");
                Err(CatalogError::CascadeFailed {
                    old: old.to_owned(),
                    new: new.to_owned(),
                    reason: cascade_reason(&e),
                })
            }
        }
    }

    /// Hard-deletes a category that no product references.
    ///
    /// # Errors
    ///
    /// - [`CatalogError::NotFound`] for an unknown id.
    /// - [`CatalogError::Conflict`] with the number of referencing products.
    pub async fn delete_category(
        &self,
        _session: &AdminSession,
        id: Uuid,
    ) -> Result<(), CatalogError> {
        let category = self.get_category(id).await?;

        let in_use = self
            .remote(
                "count_in_category",
                self.store().count_in_category(&category.name),
            )
            .await?;
        if in_use > 0 {
            return Err(CatalogError::Conflict {
                message: format!(
                    "Category is in use by {in_use} product(s). Reassign or delete those products first."
                ),
                count: Some(in_use),
            });
        }

        if !self
            .remote("delete_category", self.store().delete_category(id))
            .await?
        {
            return Err(CatalogError::NotFound(format!("category {id}")));
        }

        tracing::info!(category_id = %id, name = %category.name, "category deleted");
        self.invalidate(Invalidation::Categories);
        Ok(())
    }
}

fn cascade_reason(error: &DbError) -> String {
    match error {
        DbError::Unavailable(reason) => reason.clone(),
        other => other.to_string(),
    }
}
