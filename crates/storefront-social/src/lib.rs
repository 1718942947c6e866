//! Cross-posting of catalog products to the Facebook page and Instagram
//! account through the Graph API.

pub mod broadcast;
pub mod caption;
pub mod client;
pub mod error;
pub mod types;

pub use broadcast::{Broadcaster, SocialPublisher};
pub use caption::{compose_caption, group_thousands, CaptionSource, CAPTION_SEPARATOR};
pub use client::GraphClient;
pub use error::SocialError;
pub use types::{InstagramStep, Platform, PlatformOutcome, SocialPost};
