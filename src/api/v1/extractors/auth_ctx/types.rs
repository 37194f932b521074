/*
 * Responsibility
 * - Handler から見える「認証済みコンテキスト」の型
 * - middleware が strategy で検証して request extensions に格納し、handler はこの型だけを受け取る
 *
 * - AuthInfo は resolver が返した補足情報 (既定では検証済み claims)
 *
 * Notes
 * - JWT の検証ロジックは services::auth 側の責務
 */
use serde_json::Value;

use crate::services::auth::Claims;

/// 認証済みのリクエストに付与されるコンテキスト
///
/// - `subject` はトークンの `sub` (数値の場合は 10 進文字列)
/// - `claims` は検証済みの payload 全体 (custom claim 参照用)
#[derive(Debug, Clone)]
pub struct AuthCtx {
    pub subject: String,
    pub claims: Claims,
}

impl AuthCtx {
    pub fn new(subject: impl Into<String>, claims: Claims) -> Self {
        Self {
            subject: subject.into(),
            claims,
        }
    }
}

/// resolver が identity と一緒に返した補足情報
///
/// `Resolution::found_with_info` を使わない resolver では claims の JSON がそのまま入る
#[derive(Debug, Clone, PartialEq)]
pub struct AuthInfo(pub Value);
