use thiserror::Error;

/// Errors raised while turning operator input into domain values.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    /// Input is malformed or a required field is missing.
    #[error("{0}")]
    Validation(String),

    #[error("invalid visibility '{0}'; expected draft, published, or archived")]
    InvalidVisibility(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
