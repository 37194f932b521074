//! bearer token (JWT) 検証 → AuthCtx / AuthInfo を extensions に入れる
//!
//! - header / query / body (form, json) を ParsedRequest に詰めて strategy に渡す
//! - body は access_token を探すためだけに上限付きでバッファし、そのまま handler に戻す
//! - AuthOutcome → HTTP: Challenge は 401 + WWW-Authenticate, Reject は 401,
//!   BadRequest は 400, resolver の失敗は 500

use axum::{
    Router,
    body::Body,
    extract::State,
    http::{HeaderMap, Request, header},
    middleware::{self, Next},
    response::Response,
};

use crate::api::v1::extractors::AuthInfo;
use crate::error::AppError;
use crate::services::auth::{AuthOutcome, BadRequest, BodyFormat, ParsedRequest};
use crate::state::AppState;

/// 認証を掛けたいルートに bearer 認証 middleware を適用する。
///
/// 例：
/// ```ignore
/// let protected = Router::new().route("/me", get(me));
/// let protected = middleware::auth::access::apply(protected, state.clone());
/// ```
pub fn apply(router: Router<AppState>, state: AppState) -> Router<AppState> {
    // axum 0.8 の from_fn は State extractor を受け取れないため、`from_fn_with_state` で明示的に state を渡す
    router.layer(middleware::from_fn_with_state(state, access_middleware))
}

async fn access_middleware(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let (parts, body) = req.into_parts();

    let mut parsed = ParsedRequest::new();

    if let Some(value) = parts.headers.get(header::AUTHORIZATION) {
        let value = value.to_str().map_err(|_| {
            AppError::bad_request(
                "INVALID_REQUEST",
                BadRequest::MalformedAuthorization.to_string(),
            )
        })?;
        parsed = parsed.with_authorization(value);
    }

    if let Some(query) = parts.uri.query() {
        parsed = parsed.with_query_string(query);
    }

    let body = match body_format(&parts.headers) {
        Some(format) => {
            let bytes = axum::body::to_bytes(body, state.body_limit)
                .await
                .map_err(|err| {
                    tracing::warn!(error = %err, "failed to buffer request body");
                    AppError::bad_request("INVALID_BODY", "request body could not be read")
                })?;
            parsed = parsed.with_body(format, &bytes);
            Body::from(bytes)
        }
        None => body,
    };

    let outcome = state.strategy.authenticate(&parsed).await;

    let mut req = Request::from_parts(parts, body);
    match outcome {
        AuthOutcome::Success { identity, info } => {
            // middleware → extractor への受け渡し
            req.extensions_mut().insert(identity);
            req.extensions_mut().insert(AuthInfo(info));
            Ok(next.run(req).await)
        }
        AuthOutcome::Reject => Err(AppError::rejected()),
        AuthOutcome::Challenge(challenge) => {
            tracing::debug!(
                realm = challenge.realm(),
                error = ?challenge.error_code(),
                reason = ?challenge.reason(),
                "bearer challenge issued"
            );
            Err(AppError::challenge(&challenge))
        }
        AuthOutcome::Error(err) => Err(err.into()),
    }
}

fn body_format(headers: &HeaderMap) -> Option<BodyFormat> {
    let content_type = headers.get(header::CONTENT_TYPE)?.to_str().ok()?;
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    match mime.as_str() {
        "application/x-www-form-urlencoded" => Some(BodyFormat::Form),
        "application/json" => Some(BodyFormat::Json),
        m if m.ends_with("+json") => Some(BodyFormat::Json),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(content_type: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_str(content_type).unwrap(),
        );
        headers
    }

    #[test]
    fn detects_buffered_body_formats() {
        assert_eq!(
            body_format(&headers("application/x-www-form-urlencoded; charset=utf-8")),
            Some(BodyFormat::Form)
        );
        assert_eq!(
            body_format(&headers("Application/JSON")),
            Some(BodyFormat::Json)
        );
        assert_eq!(
            body_format(&headers("application/merge-patch+json")),
            Some(BodyFormat::Json)
        );
        assert_eq!(body_format(&headers("text/plain")), None);
        assert_eq!(body_format(&HeaderMap::new()), None);
    }
}
