//! Admin session gate.
//!
//! The session token is the hex SHA-256 of the admin password, stored in an
//! http-only cookie. Every mutating catalog operation takes an
//! [`AdminSession`], and only [`SessionGate`] can mint one.

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use crate::CatalogError;

pub const SESSION_COOKIE: &str = "admin_token";

const SESSION_MAX_AGE_SECS: u64 = 60 * 60 * 24 * 30;

/// Proof that the caller presented a valid admin credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdminSession {
    _minted: (),
}

#[derive(Clone)]
pub struct SessionGate {
    password: String,
    token: String,
    secure_cookie: bool,
}

impl std::fmt::Debug for SessionGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionGate")
            .field("password", &"[redacted]")
            .field("token", &"[redacted]")
            .field("secure_cookie", &self.secure_cookie)
            .finish()
    }
}

fn token_for(password: &str) -> String {
    format!("{:x}", Sha256::digest(password.as_bytes()))
}

fn constant_time_eq(a: &str, b: &str) -> bool {
    bool::from(a.as_bytes().ct_eq(b.as_bytes()))
}

impl SessionGate {
    /// `secure_cookie` adds the `Secure` attribute (set in production).
    #[must_use]
    pub fn new(admin_password: &str, secure_cookie: bool) -> Self {
        Self {
            password: admin_password.to_owned(),
            token: token_for(admin_password),
            secure_cookie,
        }
    }

    /// Exchanges the admin password for a session and its cookie token.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Unauthorized`] when the password is wrong.
    pub fn login(&self, password: &str) -> Result<(AdminSession, String), CatalogError> {
        if !constant_time_eq(password, &self.password) {
            tracing::warn!("admin login rejected");
            return Err(CatalogError::Unauthorized);
        }
        tracing::info!("admin logged in");
        Ok((AdminSession { _minted: () }, self.token.clone()))
    }

    #[must_use]
    pub fn is_authenticated(&self, token: Option<&str>) -> bool {
        token.is_some_and(|t| constant_time_eq(t, &self.token))
    }

    /// Mints a session for a request carrying a valid cookie token.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Unauthorized`] for a missing or wrong token.
    pub fn authenticate(&self, token: Option<&str>) -> Result<AdminSession, CatalogError> {
        if self.is_authenticated(token) {
            Ok(AdminSession { _minted: () })
        } else {
            Err(CatalogError::Unauthorized)
        }
    }

    /// `Set-Cookie` value establishing the session.
    #[must_use]
    pub fn login_cookie(&self, token: &str) -> String {
        self.cookie(token, SESSION_MAX_AGE_SECS)
    }

    /// `Set-Cookie` value that expires the session cookie.
    #[must_use]
    pub fn logout_cookie(&self) -> String {
        self.cookie("", 0)
    }

    fn cookie(&self, value: &str, max_age: u64) -> String {
        let secure = if self.secure_cookie { "; Secure" } else { "" };
        format!("{SESSION_COOKIE}={value}; Path=/; Max-Age={max_age}; HttpOnly; SameSite=Lax{secure}")
    }
}

/// Finds the session token in a raw `Cookie` header.
#[must_use]
pub fn token_from_cookie_header(header: &str) -> Option<&str> {
    header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value)
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_is_hex_sha256_of_password() {
        // sha256("hunter2")
        assert_eq!(
            token_for("hunter2"),
            "f52fbd32b2b3b86ff88ef6c490628285f482af15ddcb29541f94bcf526a3f6c7"
        );
    }

    #[test]
    fn login_with_wrong_password_is_unauthorized() {
        let gate = SessionGate::new("hunter2", false);
        assert!(matches!(gate.login("hunter3"), Err(CatalogError::Unauthorized)));
    }

    #[test]
    fn login_token_authenticates() {
        let gate = SessionGate::new("hunter2", false);
        let (_, token) = gate.login("hunter2").unwrap();
        assert!(gate.is_authenticated(Some(&token)));
        assert!(gate.authenticate(Some(&token)).is_ok());
        assert!(!gate.is_authenticated(Some("hunter2")));
        assert!(!gate.is_authenticated(None));
    }

    #[test]
    fn cookie_attributes_follow_environment() {
        let dev = SessionGate::new("pw", false);
        let cookie = dev.login_cookie("abc");
        assert!(cookie.starts_with("admin_token=abc; Path=/; Max-Age=2592000; HttpOnly; SameSite=Lax"));
        assert!(!cookie.contains("Secure"));

        let prod = SessionGate::new("pw", true);
        assert!(prod.login_cookie("abc").ends_with("; Secure"));
        assert!(prod.logout_cookie().contains("Max-Age=0"));
    }

    #[test]
    fn cookie_header_parsing() {
        assert_eq!(
            token_from_cookie_header("theme=dark; admin_token=abc123; other=1"),
            Some("abc123")
        );
        assert_eq!(token_from_cookie_header("admin_token="), None);
        assert_eq!(token_from_cookie_header("xadmin_token=abc"), None);
        assert_eq!(token_from_cookie_header(""), None);
    }

    #[test]
    fn debug_redacts_secrets() {
        let debug = format!("{:?}", SessionGate::new("hunter2", false));
        assert!(!debug.contains("hunter2"));
    }
}
