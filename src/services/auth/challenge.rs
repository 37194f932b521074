/*
 * Responsibility
 * - WWW-Authenticate 向けの Bearer challenge 文字列を組み立てる
 * - invalid_token の理由文言を固定する (クライアントが文字列一致で判定するため変更しない)
 */
use std::fmt;

use thiserror::Error;

pub const DEFAULT_REALM: &str = "Users";

/// Why a presented token was refused.
///
/// The `Display` text is what ends up in `error_description`. Clients match on
/// these literals, so they must not drift with the JWT library's own messages.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidTokenReason {
    #[error("Invalid token (jwt malformed)")]
    Malformed,
    #[error("Invalid token (invalid token)")]
    Undecodable,
    #[error("Invalid token (jwt signature is required)")]
    SignatureRequired,
    #[error("Invalid token (invalid algorithm)")]
    InvalidAlgorithm,
    #[error("Invalid token (invalid signature)")]
    InvalidSignature,
    #[error("The access token expired")]
    Expired,
    #[error("Invalid token (jwt not active)")]
    NotActive,
    #[error("Invalid token (jwt audience invalid. expected: {expected})")]
    AudienceMismatch { expected: String },
    #[error("Invalid token (jwt issuer invalid. expected: {expected})")]
    IssuerMismatch { expected: String },
}

/// A Bearer challenge (RFC 6750 section 3).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Challenge {
    realm: String,
    reason: Option<InvalidTokenReason>,
}

impl Challenge {
    /// Credentials are required but none were supplied.
    pub fn new(realm: impl Into<String>) -> Self {
        Self {
            realm: realm.into(),
            reason: None,
        }
    }

    pub fn invalid_token(realm: impl Into<String>, reason: InvalidTokenReason) -> Self {
        Self {
            realm: realm.into(),
            reason: Some(reason),
        }
    }

    pub fn realm(&self) -> &str {
        &self.realm
    }

    pub fn reason(&self) -> Option<&InvalidTokenReason> {
        self.reason.as_ref()
    }

    pub fn error_code(&self) -> Option<&'static str> {
        self.reason.as_ref().map(|_| "invalid_token")
    }
}

impl fmt::Display for Challenge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Bearer realm=\"{}\"", self.realm)?;
        if let Some(reason) = &self.reason {
            write!(
                f,
                ", error=\"invalid_token\", error_description=\"{}\"",
                reason
            )?;
        }
        Ok(())
    }
}
