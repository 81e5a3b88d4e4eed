//! # Bearer Token Identity
//!
//! HS256 JSON Web Tokens whose `sub` claim is the caller's numeric id.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use axum::http::{header::AUTHORIZATION, HeaderMap};

use crate::observability::{log_event_with_fields, Event};

use super::errors::{IdentityError, IdentityResult};
use super::{Identity, IdentityResolver};

/// JWT claims understood by the resolver
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtClaims {
    /// Subject (numeric user id)
    pub sub: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// Issued at (Unix epoch seconds)
    pub iat: i64,

    /// Expiration (Unix epoch seconds)
    pub exp: i64,

    pub aud: String,

    pub iss: String,
}

/// Signing and validation parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtSettings {
    pub secret: String,

    #[serde(default = "default_issuer")]
    pub issuer: String,

    #[serde(default = "default_audience")]
    pub audience: String,
}

fn default_issuer() -> String {
    "restkind".to_string()
}

fn default_audience() -> String {
    "restkind".to_string()
}

/// Resolves callers from `Authorization: Bearer <token>`
#[derive(Clone)]
pub struct JwtIdentity {
    settings: JwtSettings,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl JwtIdentity {
    pub fn new(settings: JwtSettings) -> Self {
        let encoding_key = EncodingKey::from_secret(settings.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(settings.secret.as_bytes());

        Self {
            settings,
            encoding_key,
            decoding_key,
        }
    }

    /// Issue a token for an identity, valid for `ttl`
    pub fn issue(&self, identity: &Identity, ttl: Duration) -> IdentityResult<String> {
        let now = Utc::now();
        let claims = JwtClaims {
            sub: identity.id().to_string(),
            email: identity.email().map(|s| s.to_string()),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
            aud: self.settings.audience.clone(),
            iss: self.settings.issuer.clone(),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|_| IdentityError::TokenGenerationFailed)
    }

    /// Validate a token and turn its claims into an identity
    pub fn validate(&self, token: &str) -> IdentityResult<Identity> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[&self.settings.audience]);
        validation.set_issuer(&[&self.settings.issuer]);

        let token_data =
            decode::<JwtClaims>(token, &self.decoding_key, &validation).map_err(|e| {
                match e.kind() {
                    jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                        IdentityError::TokenExpired
                    }
                    jsonwebtoken::errors::ErrorKind::InvalidSignature => {
                        IdentityError::InvalidSignature
                    }
                    _ => IdentityError::MalformedToken,
                }
            })?;

        let claims = token_data.claims;
        Identity::new(claims.sub, claims.email)
    }
}

impl IdentityResolver for JwtIdentity {
    fn current(&self, headers: &HeaderMap) -> Option<Identity> {
        let auth = headers.get(AUTHORIZATION)?.to_str().ok()?;
        let token = auth.strip_prefix("Bearer ")?;

        match self.validate(token.trim()) {
            Ok(identity) => Some(identity),
            Err(e) => {
                log_event_with_fields(
                    Event::IdentityRejected,
                    &[("source", "jwt"), ("reason", &e.to_string())],
                );
                None
            }
        }
    }
}
