//! # Caller Identity
//!
//! Resolves the authenticated caller of a request and derives the alphabetic key
//! used for the `users` kind and for record `owners`.

pub mod codec;
pub mod errors;
pub mod jwt;

use axum::http::HeaderMap;

use crate::observability::{log_event_with_fields, Event};

pub use errors::{IdentityError, IdentityResult};
pub use jwt::{JwtIdentity, JwtSettings};

/// Header carrying the caller's numeric id when a trusted proxy authenticates
pub const USER_ID_HEADER: &str = "x-restkind-user-id";

/// Header carrying the caller's email when a trusted proxy authenticates
pub const USER_EMAIL_HEADER: &str = "x-restkind-user-email";

/// The authenticated principal of a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    id: String,
    email: Option<String>,
    encoded: String,
}

impl Identity {
    /// Create an identity from a numeric id string
    pub fn new(id: impl Into<String>, email: Option<String>) -> IdentityResult<Self> {
        let id = id.into();
        if id.is_empty() {
            return Err(IdentityError::Empty);
        }
        let encoded = codec::encode(&id)?;
        Ok(Self { id, email, encoded })
    }

    /// Numeric id as issued by the authentication provider
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    /// Alphabetic key: the `users` record id and the sole entry of `owners`
    pub fn encoded(&self) -> &str {
        &self.encoded
    }
}

/// Source of the current caller's identity
pub trait IdentityResolver: Send + Sync {
    /// Resolve the caller from request headers, `None` when anonymous
    fn current(&self, headers: &HeaderMap) -> Option<Identity>;
}

/// Trusts identity headers set by an authenticating reverse proxy
#[derive(Debug, Clone, Default)]
pub struct HeaderIdentity;

impl HeaderIdentity {
    pub fn new() -> Self {
        Self
    }
}

impl IdentityResolver for HeaderIdentity {
    fn current(&self, headers: &HeaderMap) -> Option<Identity> {
        let id = headers.get(USER_ID_HEADER)?.to_str().ok()?.trim();
        let email = headers
            .get(USER_EMAIL_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        match Identity::new(id, email) {
            Ok(identity) => Some(identity),
            Err(e) => {
                log_event_with_fields(
                    Event::IdentityRejected,
                    &[("source", "header"), ("reason", &e.to_string())],
                );
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_identity_encodes_on_creation() {
        let identity = Identity::new("12345", Some("a@example.com".to_string())).unwrap();
        assert_eq!(identity.id(), "12345");
        assert_eq!(identity.encoded(), "dhf");
        assert_eq!(identity.email(), Some("a@example.com"));
    }

    #[test]
    fn test_identity_rejects_empty_and_non_numeric() {
        assert_eq!(Identity::new("", None), Err(IdentityError::Empty));
        assert!(matches!(
            Identity::new("abc", None),
            Err(IdentityError::NonDigit { position: 0, .. })
        ));
    }

    #[test]
    fn test_header_identity() {
        let resolver = HeaderIdentity::new();
        let mut headers = HeaderMap::new();
        assert!(resolver.current(&headers).is_none());

        headers.insert(USER_ID_HEADER, HeaderValue::from_static("42"));
        headers.insert(USER_EMAIL_HEADER, HeaderValue::from_static("x@example.com"));
        let identity = resolver.current(&headers).unwrap();
        assert_eq!(identity.id(), "42");
        assert_eq!(identity.email(), Some("x@example.com"));
    }

    #[test]
    fn test_header_identity_rejects_garbage() {
        let resolver = HeaderIdentity::new();
        let mut headers = HeaderMap::new();
        headers.insert(USER_ID_HEADER, HeaderValue::from_static("not-a-number"));
        assert!(resolver.current(&headers).is_none());
    }
}
