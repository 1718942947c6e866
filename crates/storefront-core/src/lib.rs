pub mod app_config;
pub mod categories;
pub mod config;
pub mod products;
pub mod slug;

mod error;
mod patch;

pub use app_config::{AppConfig, Environment, SocialConfig, UploadConfig};
pub use categories::{Category, CategoryChanges, CategoryPatchInput, NewCategory};
pub use config::{load_app_config, load_app_config_from_env};
pub use error::{ConfigError, CoreError};
pub use patch::{coerce_offer_percent, coerce_stock_status, NewProductInput, ProductPatchInput};
pub use products::{
    NewProduct, OfferPercent, Product, ProductChanges, StockStatus, Visibility, DEFAULT_CURRENCY,
};
pub use slug::{generated_slug, slugify};
