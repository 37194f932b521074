/// Factory: build the shared `JwtBearerStrategy` from application `Config`.
use std::sync::Arc;

use async_trait::async_trait;

use crate::api::v1::extractors::AuthCtx;
use crate::config::Config;
use crate::services::auth::{
    Claims, IdentityResolver, JwtBearerStrategy, Resolution, StrategyError, StrategyOptions,
};

/// Demo resolver: any verified token carrying a `sub` claim is an identity.
#[derive(Debug, Clone, Copy, Default)]
pub struct SubjectResolver;

#[async_trait]
impl IdentityResolver<AuthCtx> for SubjectResolver {
    async fn resolve(&self, claims: &Claims) -> Resolution<AuthCtx> {
        match claims.subject() {
            Some(subject) if !subject.trim().is_empty() => {
                Resolution::found(AuthCtx::new(subject, claims.clone()))
            }
            _ => Resolution::NotFound,
        }
    }
}

pub fn build_strategy(config: &Config) -> Result<Arc<JwtBearerStrategy<AuthCtx>>, StrategyError> {
    let options = StrategyOptions {
        audience: config.jwt_audience.clone(),
        issuer: config.jwt_issuer.clone(),
        algorithms: config.jwt_algorithms.clone(),
        realm: config.jwt_realm.clone(),
        leeway_seconds: config.jwt_leeway_seconds,
    };

    let strategy = JwtBearerStrategy::new(&config.jwt_key_material, options, SubjectResolver)?;

    Ok(Arc::new(strategy))
}
