use thiserror::Error;

use super::extract::BadRequest;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Raised while building a strategy. Never produced at request time.
#[derive(Debug, Error)]
pub enum StrategyError {
    #[error(
        "HTTPJwtBearerStrategy requires a string or buffer containing either the secret for HMAC algorithms, or the PEM encoded public key for RSA and ECDSA"
    )]
    MissingKey,
    #[error("HTTPJwtBearerStrategy requires a verify callback")]
    MissingResolver,
    #[error("invalid key material: {0}")]
    InvalidKey(String),
    #[error("at least one signing algorithm must be allowed")]
    EmptyAlgorithms,
}

/// Request-time failures that are not authentication challenges.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("bad request: {0}")]
    BadRequest(#[from] BadRequest),
    #[error("identity resolution failed: {0}")]
    Resolver(#[source] BoxError),
}
