//! Library error type.

use thiserror::Error;

/// Result alias used across the service, token and provider code.
pub type Result<T> = std::result::Result<T, AuthError>;

/// Errors raised while building the service or handling an auth flow.
///
/// Per-request failures are turned into HTTP responses at the handler
/// boundary; only `MissingSecretReader` is fatal and only at startup.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("missing secret source")]
    MissingSecretReader,

    #[error("provider {0} not found")]
    ProviderNotFound(String),

    #[error("token error: {0}")]
    Token(String),

    #[error("secret error: {0}")]
    Secret(String),

    #[error("exchange error: {0}")]
    Exchange(String),

    #[error("avatar error: {0}")]
    Avatar(String),
}

impl From<jsonwebtoken::errors::Error> for AuthError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        AuthError::Token(err.to_string())
    }
}

impl From<reqwest::Error> for AuthError {
    fn from(err: reqwest::Error) -> Self {
        AuthError::Exchange(err.to_string())
    }
}
