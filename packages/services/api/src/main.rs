//! Tripmate API
//!
//! 인증(회원가입, 로그인, 토큰 갱신, 로그아웃)과 계획 멤버십/권한 엔드포인트를 제공합니다.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    middleware::from_fn,
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod db;
mod error;
mod handlers;
mod middleware;
mod state;

use config::Config;
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 환경변수 로드
    dotenvy::dotenv().ok();

    // 로깅 초기화
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            "tm_api=debug,tm_core=debug,tower_http=debug".into()
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 설정 로드
    let config = Config::from_env()?;
    tracing::info!("Starting API with config: {:?}", config);

    // 앱 상태 초기화
    let state = Arc::new(AppState::new(&config).await?);

    // 만료된 Refresh 세션 정리
    let store = state.store.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(3600));
        loop {
            interval.tick().await;
            match store.purge_expired_sessions().await {
                Ok(purged) if purged > 0 => tracing::info!(purged, "purged expired sessions"),
                Ok(_) => {}
                Err(e) => tracing::warn!(error = %e, "session purge failed"),
            }
        }
    });

    // 라우터 구성
    let app = create_router(state);

    // 서버 시작
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("API listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// 라우터 생성
fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Auth
        .route("/api/auth/signup", post(handlers::auth::sign_up))
        .route("/api/auth/signin", post(handlers::auth::sign_in))
        .route("/api/auth/refresh", post(handlers::auth::refresh))
        .route("/api/auth/signout", post(handlers::auth::sign_out))
        // Plans
        .route("/api/plans", post(handlers::plan::create_plan))
        .route(
            "/api/plans/{id}",
            get(handlers::plan::get_plan).delete(handlers::plan::delete_plan),
        )
        .route("/api/plans/{id}/join", post(handlers::plan::join))
        .route("/api/plans/{id}/withdraw", post(handlers::plan::withdraw))
        .route(
            "/api/plans/{id}/members/{user_id}/kick",
            post(handlers::plan::kick),
        )
        .route("/api/plans/{id}/access", get(handlers::plan::check_access))
        // Health check
        .route("/health", get(handlers::health::health_check))
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .layer(from_fn(middleware::request_id))
        // State
        .with_state(state)
}
