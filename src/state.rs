/*
 * Responsibility
 * - Router に紐づける共有コンテキスト (AppState)
 *   - strategy: 検証設定 + identity resolver (不変, Arc で共有)
 * - Clone 前提で持つ (内部は Arc/Clone cheap)
 */
use std::sync::Arc;

use crate::api::v1::extractors::AuthCtx;
use crate::services::auth::JwtBearerStrategy;

#[derive(Clone, Debug)]
pub struct AppState {
    pub strategy: Arc<JwtBearerStrategy<AuthCtx>>,
    // upper bound for buffering form/json bodies while looking for access_token
    pub body_limit: usize,
}

impl AppState {
    pub fn new(strategy: Arc<JwtBearerStrategy<AuthCtx>>, body_limit: usize) -> Self {
        Self {
            strategy,
            body_limit,
        }
    }
}
