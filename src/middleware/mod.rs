/*
 * Responsibility
 * - middleware の公開インターフェース
 * - auth: bearer 認証 (JwtBearerStrategy), http: 横断的な HTTP レイヤ
 */
pub mod auth;
pub mod http;
