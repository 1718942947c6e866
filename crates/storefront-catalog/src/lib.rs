//! Catalog services: product and category stores, the category rename
//! cascade, publication fan-out, and the admin session gate.

pub mod categories;
pub mod enquiry;
pub mod error;
pub mod invalidation;
pub mod products;
pub mod publish;
pub mod session;
pub mod upload;

mod catalog;

pub use catalog::Catalog;
pub use enquiry::{EnquiryItem, EnquiryLink};
pub use error::CatalogError;
pub use invalidation::{Invalidation, Invalidator};
pub use publish::{Channel, ChannelStatus, PublicationOrchestrator, PublishReport};
pub use session::{AdminSession, SessionGate, SESSION_COOKIE};
pub use upload::{UploadSignature, UploadSigner};

#[cfg(test)]
mod test_support;
