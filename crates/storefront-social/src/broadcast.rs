use async_trait::async_trait;
use storefront_core::SocialConfig;

use crate::client::GraphClient;
use crate::error::SocialError;
use crate::types::{InstagramStep, Platform, PlatformOutcome, SocialPost};

/// Posts a photo to one platform and reports what happened.
///
/// Implementations never return an error: every failure becomes a
/// [`PlatformOutcome`].
#[async_trait]
pub trait SocialPublisher: Send + Sync {
    async fn publish(&self, platform: Platform, post: &SocialPost) -> PlatformOutcome;
}

/// Graph API publisher gated by the kill switch and configured credentials.
#[derive(Debug, Clone)]
pub struct Broadcaster {
    config: SocialConfig,
    client: GraphClient,
}

impl Broadcaster {
    /// # Errors
    ///
    /// Returns [`SocialError`] if the HTTP client cannot be built from the
    /// configured base URL.
    pub fn from_config(config: SocialConfig) -> Result<Self, SocialError> {
        let client = GraphClient::with_base_url(
            &config.graph_base_url,
            &config.graph_version,
            config.request_timeout_secs,
        )?;
        Ok(Self { config, client })
    }

    async fn publish_facebook(&self, post: &SocialPost) -> PlatformOutcome {
        let (Some(page_id), Some(token)) = (
            self.config.facebook_page_id.as_deref(),
            self.config.facebook_page_token.as_deref(),
        ) else {
            return PlatformOutcome::Misconfigured {
                reason: "missing Facebook page id or access token".to_string(),
            };
        };

        match self
            .client
            .post_page_photo(page_id, token, &post.image_url, &post.caption)
            .await
        {
            Ok(response) => PlatformOutcome::Published { response },
            Err(e) => {
                tracing::warn!(platform = "facebook", error = %e, "social post failed");
                failed(&e, None)
            }
        }
    }

    async fn publish_instagram(&self, post: &SocialPost) -> PlatformOutcome {
        let token = self
            .config
            .instagram_token
            .as_deref()
            .or(self.config.facebook_page_token.as_deref());
        let (Some(ig_user_id), Some(token)) = (self.config.instagram_user_id.as_deref(), token)
        else {
            return PlatformOutcome::Misconfigured {
                reason: "missing Instagram user id or access token".to_string(),
            };
        };

        let creation_id = match self
            .client
            .create_media_container(ig_user_id, token, &post.image_url, &post.caption)
            .await
        {
            Ok(id) => id,
            Err(e) => {
                tracing::warn!(platform = "instagram", step = "create", error = %e, "social post failed");
                return failed(&e, Some(InstagramStep::Create));
            }
        };

        match self
            .client
            .publish_media_container(ig_user_id, token, &creation_id)
            .await
        {
            Ok(response) => PlatformOutcome::Published { response },
            Err(e) => {
                tracing::warn!(
                    platform = "instagram",
                    step = "publish",
                    creation_id = %creation_id,
                    error = %e,
                    "social post failed"
                );
                failed(&e, Some(InstagramStep::Publish))
            }
        }
    }
}

fn failed(error: &SocialError, step: Option<InstagramStep>) -> PlatformOutcome {
    PlatformOutcome::Failed {
        reason: error.to_string(),
        step,
        response: error.body().cloned(),
    }
}

#[async_trait]
impl SocialPublisher for Broadcaster {
    async fn publish(&self, platform: Platform, post: &SocialPost) -> PlatformOutcome {
        if !self.config.enabled {
            tracing::debug!(%platform, "social publishing disabled");
            return PlatformOutcome::Disabled;
        }

        let outcome = match platform {
            Platform::Facebook => self.publish_facebook(post).await,
            Platform::Instagram => self.publish_instagram(post).await,
        };
        if outcome.is_published() {
            tracing::info!(%platform, "social post published");
        }
        outcome
    }
}
