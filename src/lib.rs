//! JWT bearer authentication for axum services.
//!
//! A [`JwtBearerStrategy`] finds a single bearer token in the `Authorization`
//! header, the parsed body or the query string, verifies it with
//! `jsonwebtoken`, and hands the claims to an [`IdentityResolver`]. Failures
//! become RFC 6750 challenges such as
//! `Bearer realm="Users", error="invalid_token", error_description="The access token expired"`.

pub mod api;
pub mod app;
pub mod config;
pub mod error;
pub mod middleware;
pub mod services;
pub mod state;

pub use services::auth::{
    AuthError, AuthOutcome, BearerRequest, Challenge, Claims, IdentityResolver,
    InvalidTokenReason, JwtBearerStrategy, ParsedRequest, Resolution, StrategyError,
    StrategyOptions, resolver_fn,
};
