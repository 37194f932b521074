/*
 * Responsibility
 * - GET|POST /me: 認証済み主体 (subject, 検証済み claims, resolver の info) を返す
 * - bearer 認証 middleware の配下に置く
 */
use axum::Json;
use serde::Serialize;
use serde_json::Value;

use crate::api::v1::extractors::{AuthCtxExtractor, AuthInfo};

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub subject: String,
    pub claims: Value,
    pub info: Value,
}

pub async fn me(
    AuthCtxExtractor(ctx): AuthCtxExtractor,
    AuthInfo(info): AuthInfo,
) -> Json<MeResponse> {
    Json(MeResponse {
        subject: ctx.subject,
        claims: ctx.claims.to_value(),
        info,
    })
}
