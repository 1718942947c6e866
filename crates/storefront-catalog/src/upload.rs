//! Signed direct uploads to the image host.

use chrono::Utc;
use serde::Serialize;
use sha1::{Digest, Sha1};
use storefront_core::UploadConfig;

use crate::{AdminSession, CatalogError};

/// Parameters a browser needs for one signed upload. Never carries the
/// API secret.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadSignature {
    pub cloud_name: String,
    pub api_key: String,
    pub timestamp: i64,
    pub signature: String,
    pub upload_preset: String,
}

#[derive(Debug, Clone)]
pub struct UploadSigner {
    config: UploadConfig,
}

impl UploadSigner {
    #[must_use]
    pub fn new(config: UploadConfig) -> Self {
        Self { config }
    }

    /// Signs an upload for the current second.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Configuration`] when cloud credentials are
    /// missing.
    pub fn sign(&self, session: &AdminSession) -> Result<UploadSignature, CatalogError> {
        self.sign_at(session, Utc::now().timestamp())
    }

    /// # Errors
    ///
    /// Returns [`CatalogError::Configuration`] when cloud credentials are
    /// missing.
    pub fn sign_at(
        &self,
        _session: &AdminSession,
        timestamp: i64,
    ) -> Result<UploadSignature, CatalogError> {
        let (Some(cloud_name), Some(api_key), Some(api_secret)) = (
            self.config.cloud_name.as_deref(),
            self.config.api_key.as_deref(),
            self.config.api_secret.as_deref(),
        ) else {
            return Err(CatalogError::Configuration(
                "image upload credentials are not set".to_string(),
            ));
        };

        let preset = &self.config.upload_preset;
        // The image host verifies SHA-1 signatures for this account.
        let to_sign = format!("timestamp={timestamp}&upload_preset={preset}{api_secret}");

        Ok(UploadSignature {
            cloud_name: cloud_name.to_owned(),
            api_key: api_key.to_owned(),
            timestamp,
            signature: format!("{:x}", Sha1::digest(to_sign.as_bytes())),
            upload_preset: preset.clone(),
        })
    }
}
