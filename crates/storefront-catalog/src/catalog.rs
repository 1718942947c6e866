use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use storefront_db::{CatalogStore, DbError};

use crate::invalidation::{Invalidation, Invalidator};
use crate::CatalogError;

/// Entry point for catalog reads and writes.
///
/// Cheap to clone; clones share the store and the invalidation channel.
#[derive(Clone)]
pub struct Catalog {
    store: Arc<dyn CatalogStore>,
    store_timeout: Duration,
    invalidator: Invalidator,
}

impl Catalog {
    #[must_use]
    pub fn new(store: Arc<dyn CatalogStore>, store_timeout: Duration) -> Self {
        Self {
            store,
            store_timeout,
            invalidator: Invalidator::default(),
        }
    }

    #[must_use]
    pub fn invalidator(&self) -> &Invalidator {
        &self.invalidator
    }

    pub(crate) fn store(&self) -> &dyn CatalogStore {
        self.store.as_ref()
    }

    pub(crate) fn invalidate(&self, tag: Invalidation) {
        self.invalidator.emit(tag);
    }

    /// Runs one storage call under the configured timeout.
    ///
    /// A timeout is reported as [`DbError::Unavailable`]. Failures are
    /// logged here; unique violations only at debug level.
    pub(crate) async fn call<T, F>(&self, op: &'static str, fut: F) -> Result<T, DbError>
    where
        F: Future<Output = Result<T, DbError>>,
    {
        let result = match tokio::time::timeout(self.store_timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(DbError::Unavailable(format!(
                "{op} timed out after {}s",
                self.store_timeout.as_secs_f64()
            ))),
        };
        match result {
            Err(DbError::UniqueViolation { ref constraint }) => {
                tracing::debug!(op, constraint = %constraint, "unique constraint rejected write");
            }
            Err(ref e) => tracing::error!(op, error = %e, "storage call failed"),
            Ok(_) => {}
        }
        result
    }

    /// Like [`Catalog::call`], converting failures to [`CatalogError::RemoteCall`].
    pub(crate) async fn remote<T, F>(&self, op: &'static str, fut: F) -> Result<T, CatalogError>
    where
        F: Future<Output = Result<T, DbError>>,
    {
        self.call(op, fut).await.map_err(CatalogError::from)
    }

    /// Confirms the store answers within the timeout.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::RemoteCall`] when the store is unreachable.
    pub async fn ping(&self) -> Result<(), CatalogError> {
        self.remote("ping", self.store.ping()).await
    }
}
