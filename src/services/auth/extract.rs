/*
 * Responsibility
 * - header / body / query から Bearer トークンを 1 つだけ取り出す
 * - 複数の場所に同時に存在する場合や Authorization が壊れている場合は bad request
 */
use thiserror::Error;

use super::request::BearerRequest;

/// Field name consulted in both the parsed body and the query string.
pub const ACCESS_TOKEN_FIELD: &str = "access_token";

const BEARER_SCHEME: &str = "Bearer";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BadRequest {
    #[error("malformed authorization header (expected `Bearer <token>`)")]
    MalformedAuthorization,
    #[error("bearer token supplied in more than one location")]
    MultipleCredentials,
}

/// Locate the single bearer credential of a request.
///
/// Returns `Ok(None)` when no source carries a token.
pub fn extract_token<R>(req: &R) -> Result<Option<&str>, BadRequest>
where
    R: BearerRequest + ?Sized,
{
    let header = req.authorization().map(parse_authorization).transpose()?;
    let body = req.body_field(ACCESS_TOKEN_FIELD).filter(|t| !t.is_empty());
    let query = req.query_field(ACCESS_TOKEN_FIELD).filter(|t| !t.is_empty());

    let mut found = [header, body, query].into_iter().flatten();
    match (found.next(), found.next()) {
        (None, _) => Ok(None),
        (Some(token), None) => Ok(Some(token)),
        (Some(_), Some(_)) => Err(BadRequest::MultipleCredentials),
    }
}

fn parse_authorization(value: &str) -> Result<&str, BadRequest> {
    let mut parts = value.split(' ');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(BEARER_SCHEME), Some(token), None) if !token.is_empty() => Ok(token),
        _ => Err(BadRequest::MalformedAuthorization),
    }
}
