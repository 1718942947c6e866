use storefront_core::CoreError;
use thiserror::Error;

/// Every failure a catalog operation can report.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("{0}")]
    Validation(String),

    #[error("{0} not found")]
    NotFound(String),

    /// The write would break a uniqueness or reference rule. `count` is the
    /// number of referencing rows when there are any.
    #[error("{message}")]
    Conflict { message: String, count: Option<u64> },

    #[error("authentication required")]
    Unauthorized,

    #[error("not configured: {0}")]
    Configuration(String),

    /// Storage failed or timed out.
    #[error("storage call failed: {0}")]
    RemoteCall(String),

    /// The category row was renamed but its products still carry `old`.
    #[error("Category renamed, but updating products failed: {reason}")]
    CascadeFailed {
        old: String,
        new: String,
        reason: String,
    },
}

impl From<CoreError> for CatalogError {
    fn from(error: CoreError) -> Self {
        CatalogError::Validation(error.to_string())
    }
}

impl From<storefront_db::DbError> for CatalogError {
    fn from(error: storefront_db::DbError) -> Self {
        CatalogError::RemoteCall(error.to_string())
    }
}
