/*!
 * Authentication context extractor
 *
 * Responsibility:
 * - bearer 認証済みリクエストのコンテキスト（AuthCtx, AuthInfo）を handler に提供する
 * - axum 依存は core に閉じ込め、型定義は types に分離する
 */

mod core;
mod types;

pub use self::core::AuthCtxExtractor;
pub use self::types::{AuthCtx, AuthInfo};
