//! Publication fan-out: website visibility first, then social platforms
//! concurrently. Each channel reports its own status.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use storefront_core::Product;
use storefront_social::{
    compose_caption, CaptionSource, InstagramStep, Platform, PlatformOutcome, SocialPost,
    SocialPublisher,
};
use uuid::Uuid;

use crate::{AdminSession, Catalog, CatalogError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Website,
    Facebook,
    Instagram,
}

impl Channel {
    fn platform(self) -> Option<Platform> {
        match self {
            Channel::Website => None,
            Channel::Facebook => Some(Platform::Facebook),
            Channel::Instagram => Some(Platform::Instagram),
        }
    }
}

impl From<Platform> for Channel {
    fn from(platform: Platform) -> Self {
        match platform {
            Platform::Facebook => Channel::Facebook,
            Platform::Instagram => Channel::Instagram,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ChannelStatus {
    Published {
        #[serde(skip_serializing_if = "Option::is_none")]
        response: Option<serde_json::Value>,
    },
    Failed {
        reason: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        step: Option<InstagramStep>,
        #[serde(skip_serializing_if = "Option::is_none")]
        response: Option<serde_json::Value>,
    },
    Skipped {
        reason: String,
    },
    Disabled,
    Misconfigured {
        reason: String,
    },
}

impl From<PlatformOutcome> for ChannelStatus {
    fn from(outcome: PlatformOutcome) -> Self {
        match outcome {
            PlatformOutcome::Published { response } => ChannelStatus::Published {
                response: Some(response),
            },
            PlatformOutcome::Failed {
                reason,
                step,
                response,
            } => ChannelStatus::Failed {
                reason,
                step,
                response,
            },
            PlatformOutcome::Disabled => ChannelStatus::Disabled,
            PlatformOutcome::Misconfigured { reason } => ChannelStatus::Misconfigured { reason },
        }
    }
}

/// Outcome of one publish request.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PublishReport {
    /// Product snapshot after the website step, when one was loaded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product: Option<Product>,
    pub channels: BTreeMap<Channel, ChannelStatus>,
}

#[derive(Clone)]
pub struct PublicationOrchestrator {
    catalog: Catalog,
    social: Arc<dyn SocialPublisher>,
    public_base_url: String,
}

impl PublicationOrchestrator {
    #[must_use]
    pub fn new(catalog: Catalog, social: Arc<dyn SocialPublisher>, public_base_url: &str) -> Self {
        Self {
            catalog,
            social,
            public_base_url: public_base_url.trim_end_matches('/').to_owned(),
        }
    }

    /// Publishes product `id` to every requested channel.
    ///
    /// The website step runs first; its failure is recorded and the social
    /// channels are still attempted with the last stored snapshot.
    ///
    /// # Errors
    ///
    /// - [`CatalogError::NotFound`] when the product does not exist.
    /// - [`CatalogError::RemoteCall`] when the product cannot be loaded.
    pub async fn publish(
        &self,
        session: &AdminSession,
        id: Uuid,
        channels: &BTreeSet<Channel>,
    ) -> Result<PublishReport, CatalogError> {
        let mut report = PublishReport::default();
        if channels.is_empty() {
            return Ok(report);
        }

        let mut snapshot = None;
        if channels.contains(&Channel::Website) {
            match self.catalog.publish_website(session, id).await {
                Ok(product) => {
                    snapshot = Some(product);
                    report
                        .channels
                        .insert(Channel::Website, ChannelStatus::Published { response: None });
                }
                Err(CatalogError::NotFound(what)) => return Err(CatalogError::NotFound(what)),
                Err(e) => {
                    tracing::warn!(product_id = %id, error = %e, "website publish failed");
                    report.channels.insert(
                        Channel::Website,
                        ChannelStatus::Failed {
                            reason: e.to_string(),
                            step: None,
                            response: None,
                        },
                    );
                }
            }
        }

        let platforms: Vec<Platform> = channels.iter().filter_map(|c| c.platform()).collect();
        if platforms.is_empty() {
            report.product = snapshot;
            return Ok(report);
        }

        let product = match snapshot {
            Some(product) => product,
            None => self.catalog.get_product(id).await?,
        };

        let image = product.image.as_deref().filter(|url| !url.trim().is_empty());
        match image {
            None => {
                for platform in platforms {
                    report.channels.insert(
                        platform.into(),
                        ChannelStatus::Skipped {
                            reason: "product has no image".to_string(),
                        },
                    );
                }
            }
            Some(image_url) => {
                let post = SocialPost {
                    image_url: image_url.to_owned(),
                    caption: compose_caption(&CaptionSource::from(&product), &self.public_base_url),
                };
                let outcomes = self.fan_out(&platforms, &post).await;
                for (platform, outcome) in outcomes {
                    report.channels.insert(platform.into(), outcome.into());
                }
            }
        }

        for (channel, status) in &report.channels {
            tracing::info!(product_id = %id, ?channel, ?status, "publish channel finished");
        }
        report.product = Some(product);
        Ok(report)
    }

    /// Posts an ad-hoc product, not necessarily in the catalog, to the
    /// given platforms.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Validation`] when the product has no image.
    pub async fn broadcast(
        &self,
        _session: &AdminSession,
        source: &CaptionSource,
        platforms: &BTreeSet<Platform>,
    ) -> Result<BTreeMap<Platform, PlatformOutcome>, CatalogError> {
        let Some(image_url) = source.image.as_deref().filter(|url| !url.trim().is_empty()) else {
            return Err(CatalogError::Validation("missing product/image".to_string()));
        };
        let post = SocialPost {
            image_url: image_url.to_owned(),
            caption: compose_caption(source, &self.public_base_url),
        };
        let platforms: Vec<Platform> = platforms.iter().copied().collect();
        Ok(self.fan_out(&platforms, &post).await.into_iter().collect())
    }

    async fn fan_out(
        &self,
        platforms: &[Platform],
        post: &SocialPost,
    ) -> Vec<(Platform, PlatformOutcome)> {
        stream::iter(platforms.iter().copied())
            .map(|platform| async move { (platform, self.social.publish(platform, post).await) })
            .buffer_unordered(platforms.len().max(1))
            .collect()
            .await
    }
}

#[cfg(test)]
#[path = "publish_test.rs"]
mod tests;
