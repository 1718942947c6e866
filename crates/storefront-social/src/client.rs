//! HTTP client for the Graph API photo-publishing endpoints.
//!
//! Every call is a form-encoded POST. Non-2xx answers surface as
//! [`SocialError::Rejected`] carrying the platform's JSON body.

use std::time::Duration;

use reqwest::{Client, Url};
use serde_json::Value;

use crate::error::SocialError;

/// Client for the Graph API.
///
/// The base URL comes from configuration, so tests point it at a mock server.
#[derive(Debug, Clone)]
pub struct GraphClient {
    client: Client,
    base_url: Url,
}

impl GraphClient {
    /// Creates a client rooted at `{base_url}/{version}/`.
    ///
    /// # Errors
    ///
    /// Returns [`SocialError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed, or [`SocialError::InvalidBaseUrl`] if
    /// `base_url` does not parse.
    pub fn with_base_url(
        base_url: &str,
        version: &str,
        timeout_secs: u64,
    ) -> Result<Self, SocialError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("storefront/0.1 (catalog-publisher)")
            .build()?;

        // Exactly one trailing slash so `join` appends below the version.
        let normalised = format!(
            "{}/{}/",
            base_url.trim_end_matches('/'),
            version.trim_matches('/')
        );
        let base_url =
            Url::parse(&normalised).map_err(|e| SocialError::InvalidBaseUrl(format!("{base_url}: {e}")))?;

        Ok(Self { client, base_url })
    }

    /// Posts a photo to a Facebook page in a single call.
    ///
    /// # Errors
    ///
    /// - [`SocialError::Rejected`] on a non-2xx answer.
    /// - [`SocialError::Http`] on network failure or timeout.
    pub async fn post_page_photo(
        &self,
        page_id: &str,
        token: &str,
        image_url: &str,
        caption: &str,
    ) -> Result<Value, SocialError> {
        let url = self.endpoint(&[page_id, "photos"])?;
        self.post_form(
            url,
            &[("url", image_url), ("caption", caption), ("access_token", token)],
        )
        .await
    }

    /// Creates an Instagram media container and returns its id.
    ///
    /// # Errors
    ///
    /// - [`SocialError::Rejected`] on a non-2xx answer.
    /// - [`SocialError::MissingContainerId`] when the answer has no `id`.
    /// - [`SocialError::Http`] on network failure or timeout.
    pub async fn create_media_container(
        &self,
        ig_user_id: &str,
        token: &str,
        image_url: &str,
        caption: &str,
    ) -> Result<String, SocialError> {
        let url = self.endpoint(&[ig_user_id, "media"])?;
        let body = self
            .post_form(
                url,
                &[
                    ("image_url", image_url),
                    ("caption", caption),
                    ("access_token", token),
                ],
            )
            .await?;

        match body.get("id") {
            Some(Value::String(id)) if !id.is_empty() => Ok(id.clone()),
            Some(Value::Number(id)) => Ok(id.to_string()),
            _ => Err(SocialError::MissingContainerId { body }),
        }
    }

    /// Publishes a previously created Instagram media container.
    ///
    /// # Errors
    ///
    /// - [`SocialError::Rejected`] on a non-2xx answer.
    /// - [`SocialError::Http`] on network failure or timeout.
    pub async fn publish_media_container(
        &self,
        ig_user_id: &str,
        token: &str,
        creation_id: &str,
    ) -> Result<Value, SocialError> {
        let url = self.endpoint(&[ig_user_id, "media_publish"])?;
        self.post_form(url, &[("creation_id", creation_id), ("access_token", token)])
            .await
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, SocialError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| SocialError::InvalidBaseUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn post_form(&self, url: Url, form: &[(&str, &str)]) -> Result<Value, SocialError> {
        let response = self.client.post(url).form(form).send().await?;
        let status = response.status();
        let text = response.text().await?;
        // Graph answers are JSON; keep anything else verbatim for the report.
        let body = serde_json::from_str(&text).unwrap_or(Value::String(text));

        if status.is_success() {
            return Ok(body);
        }

        Err(SocialError::Rejected {
            status: status.as_u16(),
            message: graph_error_message(&body),
            body,
        })
    }
}

/// Pulls `error.message` out of a Graph error payload.
fn graph_error_message(body: &Value) -> String {
    body.get("error")
        .and_then(|e| e.get("message"))
        .and_then(Value::as_str)
        .map_or_else(|| "unknown error".to_string(), ToOwned::to_owned)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_client(base_url: &str) -> GraphClient {
        GraphClient::with_base_url(base_url, "v19.0", 30)
            .expect("client construction should not fail")
    }

    #[test]
    fn endpoint_joins_version_and_segments() {
        let client = test_client("https://graph.facebook.com");
        let url = client.endpoint(&["12345", "photos"]).unwrap();
        assert_eq!(url.as_str(), "https://graph.facebook.com/v19.0/12345/photos");
    }

    #[test]
    fn endpoint_tolerates_trailing_slashes() {
        let client = test_client("https://graph.facebook.com/");
        let url = client.endpoint(&["777", "media_publish"]).unwrap();
        assert_eq!(
            url.as_str(),
            "https://graph.facebook.com/v19.0/777/media_publish"
        );
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        assert!(matches!(
            GraphClient::with_base_url("not a url", "v19.0", 30),
            Err(SocialError::InvalidBaseUrl(_))
        ));
    }

    #[test]
    fn graph_error_message_falls_back() {
        let body = serde_json::json!({ "error": { "message": "Invalid token" } });
        assert_eq!(graph_error_message(&body), "Invalid token");
        assert_eq!(graph_error_message(&Value::Null), "unknown error");
    }
}
