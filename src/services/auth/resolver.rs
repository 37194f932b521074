use std::future::Future;

use async_trait::async_trait;
use serde_json::Value;

use super::claims::Claims;
use super::error::BoxError;

/// Result of mapping verified claims to an application identity.
#[derive(Debug)]
pub enum Resolution<I> {
    /// `info` defaults to the decoded claims when `None`.
    Found { identity: I, info: Option<Value> },
    /// The caller declines the identity without saying why.
    NotFound,
    Failed(BoxError),
}

impl<I> Resolution<I> {
    pub fn found(identity: I) -> Self {
        Self::Found {
            identity,
            info: None,
        }
    }

    pub fn found_with_info(identity: I, info: Value) -> Self {
        Self::Found {
            identity,
            info: Some(info),
        }
    }

    pub fn failed(err: impl Into<BoxError>) -> Self {
        Self::Failed(err.into())
    }
}

/// Turns verified claims into an identity (database lookup, tenant check, ...).
///
/// Called at most once per request, only after the token verified.
#[async_trait]
pub trait IdentityResolver<I>: Send + Sync {
    async fn resolve(&self, claims: &Claims) -> Resolution<I>;
}

/// Adapter for plain async closures. See [`resolver_fn`].
pub struct FnResolver<F>(F);

/// Wrap `|claims| async move { ... }` as an [`IdentityResolver`].
pub fn resolver_fn<F>(f: F) -> FnResolver<F> {
    FnResolver(f)
}

#[async_trait]
impl<I, F, Fut> IdentityResolver<I> for FnResolver<F>
where
    I: Send + 'static,
    F: Fn(Claims) -> Fut + Send + Sync,
    Fut: Future<Output = Resolution<I>> + Send + 'static,
{
    async fn resolve(&self, claims: &Claims) -> Resolution<I> {
        (self.0)(claims.clone()).await
    }
}
