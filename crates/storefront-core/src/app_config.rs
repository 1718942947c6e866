use std::net::SocketAddr;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// Graph API credentials and switches for social cross-posting.
#[derive(Clone)]
pub struct SocialConfig {
    /// Global kill switch; when false no social call is ever attempted.
    pub enabled: bool,
    pub graph_base_url: String,
    pub graph_version: String,
    pub request_timeout_secs: u64,
    pub facebook_page_id: Option<String>,
    pub facebook_page_token: Option<String>,
    pub instagram_user_id: Option<String>,
    /// Falls back to `facebook_page_token` when unset.
    pub instagram_token: Option<String>,
}

impl std::fmt::Debug for SocialConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SocialConfig")
            .field("enabled", &self.enabled)
            .field("graph_base_url", &self.graph_base_url)
            .field("graph_version", &self.graph_version)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("facebook_page_id", &self.facebook_page_id)
            .field(
                "facebook_page_token",
                &self.facebook_page_token.as_ref().map(|_| "[redacted]"),
            )
            .field("instagram_user_id", &self.instagram_user_id)
            .field(
                "instagram_token",
                &self.instagram_token.as_ref().map(|_| "[redacted]"),
            )
            .finish()
    }
}

/// Credentials for signed direct uploads to the image host.
#[derive(Clone)]
pub struct UploadConfig {
    pub cloud_name: Option<String>,
    pub api_key: Option<String>,
    pub api_secret: Option<String>,
    pub upload_preset: String,
}

impl std::fmt::Debug for UploadConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadConfig")
            .field("cloud_name", &self.cloud_name)
            .field("api_key", &self.api_key)
            .field("api_secret", &self.api_secret.as_ref().map(|_| "[redacted]"))
            .field("upload_preset", &self.upload_preset)
            .finish()
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    /// Public site origin used in captions and enquiry links.
    pub public_base_url: String,
    pub admin_password: String,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    /// Upper bound on any single storage call.
    pub store_timeout_secs: u64,
    pub whatsapp_phone: Option<String>,
    pub social: SocialConfig,
    pub upload: UploadConfig,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("public_base_url", &self.public_base_url)
            .field("database_url", &"[redacted]")
            .field("admin_password", &"[redacted]")
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field("store_timeout_secs", &self.store_timeout_secs)
            .field("whatsapp_phone", &self.whatsapp_phone)
            .field("social", &self.social)
            .field("upload", &self.upload)
            .finish()
    }
}
