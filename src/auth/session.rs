//! Admin session verification.
//!
//! The site marks a signed-in admin with an `admin_session` cookie whose value is
//! the literal `authenticated`. [`LiteralCookieVerifier`] reproduces that check.
//! It is a capability check only: anyone who can set the cookie is an admin.
//! [`SignedCookieVerifier`] accepts the same marker only when it carries a valid
//! signature from the server key.

use axum::http::{HeaderMap, header::COOKIE};
use secrecy::{ExposeSecret, SecretString};
use std::fmt;
use tower_cookies::{
    Key,
    cookie::{Cookie, CookieJar},
};

pub const ADMIN_SESSION_COOKIE: &str = "admin_session";
pub const AUTHENTICATED_MARKER: &str = "authenticated";

/// Minimum signing key length accepted by the cookie signer.
pub const MIN_SIGNING_KEY_BYTES: usize = 64;

/// `true` only for the exact marker value; a missing cookie is unauthenticated.
#[must_use]
pub fn is_authenticated(cookie_value: Option<&str>) -> bool {
    cookie_value == Some(AUTHENTICATED_MARKER)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionMode {
    Literal,
    Signed,
}

impl SessionMode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Literal => "literal",
            Self::Signed => "signed",
        }
    }
}

impl std::str::FromStr for SessionMode {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "literal" => Ok(Self::Literal),
            "signed" => Ok(Self::Signed),
            other => Err(format!("invalid session mode: {other}")),
        }
    }
}

pub trait SessionVerifier: Send + Sync {
    /// Decide whether a raw cookie value (if any) grants admin access.
    fn verify(&self, cookie_value: Option<&str>) -> bool;

    fn mode(&self) -> SessionMode;
}

#[derive(Clone, Debug, Default)]
pub struct LiteralCookieVerifier;

impl SessionVerifier for LiteralCookieVerifier {
    fn verify(&self, cookie_value: Option<&str>) -> bool {
        is_authenticated(cookie_value)
    }

    fn mode(&self) -> SessionMode {
        SessionMode::Literal
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SigningKeyError {
    #[error("session signing key must be at least {MIN_SIGNING_KEY_BYTES} bytes, got {0}")]
    TooShort(usize),
}

/// Verifies an HMAC-signed `authenticated` marker.
#[derive(Clone)]
pub struct SignedCookieVerifier {
    key: Key,
}

impl fmt::Debug for SignedCookieVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignedCookieVerifier")
            .field("key", &"[REDACTED]")
            .finish()
    }
}

impl SignedCookieVerifier {
    /// Build from a secret of at least [`MIN_SIGNING_KEY_BYTES`] bytes.
    ///
    /// # Errors
    /// Returns an error if the secret is too short to derive a signing key.
    pub fn new(secret: &SecretString) -> Result<Self, SigningKeyError> {
        let bytes = secret.expose_secret().as_bytes();
        let key = Key::try_from(bytes).map_err(|_| SigningKeyError::TooShort(bytes.len()))?;
        Ok(Self { key })
    }

    /// Sign a cookie value; the result is what the login flow stores in the cookie.
    #[must_use]
    pub fn sign(&self, value: &str) -> String {
        let mut jar = CookieJar::new();
        jar.signed_mut(&self.key)
            .add(Cookie::new(ADMIN_SESSION_COOKIE, value.to_string()));
        jar.get(ADMIN_SESSION_COOKIE)
            .map(|cookie| cookie.value().to_string())
            .unwrap_or_default()
    }
}

impl SessionVerifier for SignedCookieVerifier {
    fn verify(&self, cookie_value: Option<&str>) -> bool {
        let Some(raw) = cookie_value else {
            return false;
        };
        let mut jar = CookieJar::new();
        jar.add_original(Cookie::new(ADMIN_SESSION_COOKIE, raw.to_string()));
        jar.signed(&self.key)
            .get(ADMIN_SESSION_COOKIE)
            .is_some_and(|cookie| is_authenticated(Some(cookie.value())))
    }

    fn mode(&self) -> SessionMode {
        SessionMode::Signed
    }
}

/// Read a single cookie value from the request `Cookie` header(s).
#[must_use]
pub fn extract_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    for header in headers.get_all(COOKIE) {
        let Ok(value) = header.to_str() else {
            continue;
        };
        for pair in value.split(';') {
            let mut parts = pair.trim().splitn(2, '=');
            let key = parts.next().map(str::trim);
            let val = parts.next().map(str::trim);
            if let (Some(key), Some(val)) = (key, val)
                && key == name
            {
                return Some(val.to_string());
            }
        }
    }
    None
}
