use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Facebook,
    Instagram,
}

impl Platform {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Platform::Facebook => "facebook",
            Platform::Instagram => "instagram",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A photo post: the hosted image plus its caption.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SocialPost {
    pub image_url: String,
    pub caption: String,
}

/// The two calls of the Instagram content-publishing protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstagramStep {
    Create,
    Publish,
}

impl fmt::Display for InstagramStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InstagramStep::Create => f.write_str("create"),
            InstagramStep::Publish => f.write_str("publish"),
        }
    }
}

/// Result of posting to one platform. Never an error: failures are data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PlatformOutcome {
    Published {
        response: serde_json::Value,
    },
    Failed {
        reason: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        step: Option<InstagramStep>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        response: Option<serde_json::Value>,
    },
    /// The global kill switch is off; no call was made.
    Disabled,
    /// Credentials are missing; no call was made.
    Misconfigured {
        reason: String,
    },
}

impl PlatformOutcome {
    #[must_use]
    pub fn is_published(&self) -> bool {
        matches!(self, PlatformOutcome::Published { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_serializes_with_status_tag() {
        let failed = PlatformOutcome::Failed {
            reason: "boom".to_string(),
            step: Some(InstagramStep::Create),
            response: None,
        };
        let json = serde_json::to_value(&failed).unwrap();
        assert_eq!(json["status"], "failed");
        assert_eq!(json["step"], "create");
        assert!(json.get("response").is_none());

        let json = serde_json::to_value(PlatformOutcome::Disabled).unwrap();
        assert_eq!(json, serde_json::json!({ "status": "disabled" }));
    }

    #[test]
    fn platform_names_are_lowercase() {
        let parsed: Vec<Platform> = serde_json::from_str(r#"["facebook","instagram"]"#).unwrap();
        assert_eq!(parsed, [Platform::Facebook, Platform::Instagram]);
        assert_eq!(Platform::Instagram.to_string(), "instagram");
    }
}
