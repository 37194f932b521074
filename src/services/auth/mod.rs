pub mod challenge;
pub mod claims;
pub mod error;
pub mod extract;
pub mod factory;
pub mod request;
pub mod resolver;
pub mod strategy;
pub mod verifier;

#[cfg(test)]
mod test_support;

pub use challenge::{Challenge, DEFAULT_REALM, InvalidTokenReason};
pub use claims::Claims;
pub use error::{AuthError, BoxError, StrategyError};
pub use extract::{ACCESS_TOKEN_FIELD, BadRequest, extract_token};
pub use factory::{SubjectResolver, build_strategy};
pub use request::{BearerRequest, BodyFormat, ParsedRequest};
pub use resolver::{FnResolver, IdentityResolver, Resolution, resolver_fn};
pub use strategy::{AuthOutcome, JwtBearerStrategy, JwtBearerStrategyBuilder, StrategyOptions};
pub use verifier::TokenVerifier;
