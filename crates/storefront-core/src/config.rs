use crate::app_config::{AppConfig, Environment, SocialConfig, UploadConfig};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Parsing is decoupled from the real environment so tests can drive it with
/// a plain `HashMap`.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar(var.to_string()))
    };

    let optional = |var: &str| -> Option<String> {
        lookup(var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let or_default =
        |var: &str, default: &str| -> String { optional(var).unwrap_or_else(|| default.to_string()) };

    let parse_addr = |var: &str, default: &str| -> Result<SocketAddr, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let database_url = require("DATABASE_URL")?;
    let admin_password = require("STOREFRONT_ADMIN_PASSWORD")?;

    let env = parse_environment(&or_default("STOREFRONT_ENV", "development"))?;

    let bind_addr = parse_addr("STOREFRONT_BIND_ADDR", "0.0.0.0:3000")?;
    let log_level = or_default("STOREFRONT_LOG_LEVEL", "info");
    let public_base_url = or_default("STOREFRONT_PUBLIC_BASE_URL", "http://localhost:3000")
        .trim_end_matches('/')
        .to_string();

    let db_max_connections = parse_u32("STOREFRONT_DB_MAX_CONNECTIONS", "10")?;
    let db_min_connections = parse_u32("STOREFRONT_DB_MIN_CONNECTIONS", "1")?;
    let db_acquire_timeout_secs = parse_u64("STOREFRONT_DB_ACQUIRE_TIMEOUT_SECS", "10")?;
    let store_timeout_secs = parse_u64("STOREFRONT_STORE_TIMEOUT_SECS", "10")?;

    let social = SocialConfig {
        enabled: optional("SOCIAL_PUBLISH_ENABLED").is_some_and(|v| v == "true"),
        graph_base_url: or_default("FB_GRAPH_BASE_URL", "https://graph.facebook.com"),
        graph_version: or_default("FB_GRAPH_VERSION", "v19.0"),
        request_timeout_secs: parse_u64("STOREFRONT_SOCIAL_TIMEOUT_SECS", "30")?,
        facebook_page_id: optional("FB_PAGE_ID"),
        facebook_page_token: optional("FB_PAGE_ACCESS_TOKEN"),
        instagram_user_id: optional("IG_USER_ID"),
        instagram_token: optional("IG_ACCESS_TOKEN"),
    };

    let upload = UploadConfig {
        cloud_name: optional("CLOUDINARY_CLOUD_NAME"),
        api_key: optional("CLOUDINARY_API_KEY"),
        api_secret: optional("CLOUDINARY_API_SECRET"),
        upload_preset: or_default("CLOUDINARY_UPLOAD_PRESET", "storefront_unsigned"),
    };

    Ok(AppConfig {
        database_url,
        env,
        bind_addr,
        log_level,
        public_base_url,
        admin_password,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
        store_timeout_secs,
        whatsapp_phone: optional("WHATSAPP_PHONE"),
        social,
        upload,
    })
}

/// Parse a string into an `Environment` variant.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "STOREFRONT_ENV".to_string(),
            reason: format!("unknown environment '{other}'"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
