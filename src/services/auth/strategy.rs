/*
 * Responsibility
 * - 抽出 → 検証 → identity 解決 を 1 リクエスト分まとめて実行する
 * - 失敗はすべて AuthOutcome に変換する (ここから panic / Err は出さない)
 */
use std::sync::Arc;

use jsonwebtoken::Algorithm;
use serde_json::Value;

use super::challenge::{Challenge, DEFAULT_REALM};
use super::error::{AuthError, StrategyError};
use super::extract::extract_token;
use super::request::BearerRequest;
use super::resolver::{IdentityResolver, Resolution};
use super::verifier::TokenVerifier;

/// Final decision for one request. Exactly one is produced per request.
#[derive(Debug)]
pub enum AuthOutcome<I> {
    Success { identity: I, info: Value },
    /// The resolver declined the identity. No challenge text.
    Reject,
    Challenge(Challenge),
    Error(AuthError),
}

/// Optional verifier expectations.
#[derive(Debug, Clone)]
pub struct StrategyOptions {
    pub audience: Option<String>,
    pub issuer: Option<String>,
    /// `None` allows every algorithm matching the key material.
    pub algorithms: Option<Vec<Algorithm>>,
    pub realm: String,
    pub leeway_seconds: u64,
}

impl Default for StrategyOptions {
    fn default() -> Self {
        Self {
            audience: None,
            issuer: None,
            algorithms: None,
            realm: DEFAULT_REALM.to_string(),
            leeway_seconds: 0,
        }
    }
}

/// JWT bearer authentication strategy.
///
/// Immutable once built; share it behind an `Arc` across requests.
pub struct JwtBearerStrategy<I> {
    verifier: TokenVerifier,
    realm: String,
    resolver: Arc<dyn IdentityResolver<I>>,
}

impl<I> Clone for JwtBearerStrategy<I> {
    fn clone(&self) -> Self {
        Self {
            verifier: self.verifier.clone(),
            realm: self.realm.clone(),
            resolver: Arc::clone(&self.resolver),
        }
    }
}

impl<I> std::fmt::Debug for JwtBearerStrategy<I> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtBearerStrategy")
            .field("verifier", &self.verifier)
            .field("realm", &self.realm)
            .finish_non_exhaustive()
    }
}

impl<I> JwtBearerStrategy<I> {
    pub const NAME: &'static str = "jwt-bearer";

    pub fn builder() -> JwtBearerStrategyBuilder<I> {
        JwtBearerStrategyBuilder::default()
    }

    pub fn new<R>(
        secret_or_key: impl AsRef<[u8]>,
        options: StrategyOptions,
        resolver: R,
    ) -> Result<Self, StrategyError>
    where
        R: IdentityResolver<I> + 'static,
    {
        Self::builder()
            .secret_or_key(secret_or_key)
            .options(options)
            .resolver(resolver)
            .build()
    }

    pub fn name(&self) -> &'static str {
        Self::NAME
    }

    pub fn realm(&self) -> &str {
        &self.realm
    }

    /// Algorithms accepted for this strategy's key material.
    pub fn algorithms(&self) -> &[Algorithm] {
        self.verifier.algorithms()
    }

    /// Authenticate one request: header, body and query are searched for a
    /// single bearer token, which is then verified and resolved.
    pub async fn authenticate<R>(&self, req: &R) -> AuthOutcome<I>
    where
        R: BearerRequest + Sync + ?Sized,
    {
        let token = match extract_token(req) {
            Ok(Some(token)) => token,
            Ok(None) => {
                tracing::debug!(realm = %self.realm, "no bearer credentials supplied");
                return AuthOutcome::Challenge(Challenge::new(self.realm.as_str()));
            }
            Err(err) => {
                tracing::warn!(error = %err, "unusable bearer credentials");
                return AuthOutcome::Error(AuthError::BadRequest(err));
            }
        };

        self.authenticate_token(token).await
    }

    /// Verify an already extracted token and resolve its identity.
    pub async fn authenticate_token(&self, token: &str) -> AuthOutcome<I> {
        let claims = match self.verifier.verify(token) {
            Ok(claims) => claims,
            Err(reason) => {
                tracing::warn!(error = %reason, "access token verification failed");
                return AuthOutcome::Challenge(Challenge::invalid_token(
                    self.realm.as_str(),
                    reason,
                ));
            }
        };

        match self.resolver.resolve(&claims).await {
            Resolution::Found { identity, info } => {
                tracing::debug!(
                    sub = ?claims.subject(),
                    exp = ?claims.expires_at(),
                    nbf = ?claims.not_before(),
                    "bearer token authenticated"
                );
                AuthOutcome::Success {
                    identity,
                    info: info.unwrap_or_else(|| claims.to_value()),
                }
            }
            Resolution::NotFound => {
                tracing::debug!(sub = ?claims.subject(), "identity rejected by resolver");
                AuthOutcome::Reject
            }
            Resolution::Failed(err) => {
                tracing::warn!(error = %err, "identity resolver failed");
                AuthOutcome::Error(AuthError::Resolver(err))
            }
        }
    }
}

/// Builder for [`JwtBearerStrategy`]. Key material and resolver are required.
pub struct JwtBearerStrategyBuilder<I> {
    secret_or_key: Option<Vec<u8>>,
    options: StrategyOptions,
    resolver: Option<Arc<dyn IdentityResolver<I>>>,
}

impl<I> Default for JwtBearerStrategyBuilder<I> {
    fn default() -> Self {
        Self {
            secret_or_key: None,
            options: StrategyOptions::default(),
            resolver: None,
        }
    }
}

impl<I> JwtBearerStrategyBuilder<I> {
    /// HMAC secret, or a PEM encoded RSA / EC / Ed25519 public key.
    pub fn secret_or_key(mut self, material: impl AsRef<[u8]>) -> Self {
        self.secret_or_key = Some(material.as_ref().to_vec());
        self
    }

    pub fn options(mut self, options: StrategyOptions) -> Self {
        self.options = options;
        self
    }

    pub fn audience(mut self, audience: impl Into<String>) -> Self {
        self.options.audience = Some(audience.into());
        self
    }

    pub fn issuer(mut self, issuer: impl Into<String>) -> Self {
        self.options.issuer = Some(issuer.into());
        self
    }

    pub fn algorithms(mut self, algorithms: impl IntoIterator<Item = Algorithm>) -> Self {
        self.options.algorithms = Some(algorithms.into_iter().collect());
        self
    }

    pub fn realm(mut self, realm: impl Into<String>) -> Self {
        self.options.realm = realm.into();
        self
    }

    pub fn leeway(mut self, seconds: u64) -> Self {
        self.options.leeway_seconds = seconds;
        self
    }

    pub fn resolver<R>(mut self, resolver: R) -> Self
    where
        R: IdentityResolver<I> + 'static,
    {
        self.resolver = Some(Arc::new(resolver));
        self
    }

    pub fn build(self) -> Result<JwtBearerStrategy<I>, StrategyError> {
        let material = self.secret_or_key.ok_or(StrategyError::MissingKey)?;
        let resolver = self.resolver.ok_or(StrategyError::MissingResolver)?;

        let options = self.options;
        let verifier = TokenVerifier::new(
            &material,
            options.algorithms,
            options.audience,
            options.issuer,
            options.leeway_seconds,
        )?;

        Ok(JwtBearerStrategy {
            verifier,
            realm: options.realm,
            resolver,
        })
    }
}
