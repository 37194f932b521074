/*
 * Responsibility
 * - Config 読み込み → strategy 生成 → Router 組み立て
 * - Middleware の適用 (request id / body limit / timeout / trace, bearer 認証)
 * - axum::serve() で起動
 */
use anyhow::Result;
use axum::Router;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::middleware::http::{self, HttpLimits};
use crate::services::auth::build_strategy;
use crate::{api, state::AppState};

fn init_tracing() {
    // Prefer RUST_LOG if set; otherwise use a sensible default.
    // Ex:
    // RUST_LOG=info,jwt_bearer=debug,tower_http=debug cargo run
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,tower_http=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

pub async fn run() -> Result<()> {
    init_tracing();
    let config = Config::from_env()?;

    let strategy = build_strategy(&config)?;
    tracing::info!(
        strategy = strategy.name(),
        realm = strategy.realm(),
        algorithms = ?strategy.algorithms(),
        addr = %config.addr,
        "starting resource server"
    );

    let limits = HttpLimits::from(&config);
    let state = AppState::new(strategy, limits.body_limit_bytes);
    let app = build_router(state, limits);

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

pub fn build_router(state: AppState, limits: HttpLimits) -> Router {
    let router = Router::new()
        .nest("/api/v1", api::v1::routes(state.clone()))
        .with_state(state);

    http::apply(router, limits)
}
