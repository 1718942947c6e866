use thiserror::Error;

/// Errors returned by the Graph API client.
#[derive(Debug, Error)]
pub enum SocialError {
    /// Network, TLS or timeout failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The Graph API answered with a non-2xx status.
    #[error("Graph API rejected the request ({status}): {message}")]
    Rejected {
        status: u16,
        message: String,
        body: serde_json::Value,
    },

    /// The container-create call succeeded but carried no `id`.
    #[error("Graph API response has no container id")]
    MissingContainerId { body: serde_json::Value },

    #[error("invalid Graph API base URL '{0}'")]
    InvalidBaseUrl(String),
}

impl SocialError {
    /// Raw JSON body returned by the platform, when there was one.
    #[must_use]
    pub fn body(&self) -> Option<&serde_json::Value> {
        match self {
            SocialError::Rejected { body, .. } | SocialError::MissingContainerId { body } => {
                Some(body)
            }
            SocialError::Http(_) | SocialError::InvalidBaseUrl(_) => None,
        }
    }
}
