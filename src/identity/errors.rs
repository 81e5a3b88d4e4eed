//! # Identity Errors

use thiserror::Error;

/// Result type for identity operations
pub type IdentityResult<T> = Result<T, IdentityError>;

/// Errors from the key codec and the identity resolvers
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityError {
    // ==================
    // Key Codec Errors
    // ==================
    /// Identity strings are decimal digits only
    #[error("Identity must be decimal digits, found '{found}' at position {position}")]
    NonDigit { position: usize, found: char },

    /// Encoded keys only use ASCII letters
    #[error("Encoded key contains '{0}', which is not an ASCII letter")]
    NotInAlphabet(char),

    /// Identity string is empty
    #[error("Identity must not be empty")]
    Empty,

    // ==================
    // Token Errors
    // ==================
    /// Token could not be signed
    #[error("Failed to generate token")]
    TokenGenerationFailed,

    /// Token is malformed or carries unexpected claims
    #[error("Malformed token")]
    MalformedToken,

    /// Token has expired
    #[error("Token expired")]
    TokenExpired,

    /// Token signature is invalid
    #[error("Invalid token signature")]
    InvalidSignature,
}
