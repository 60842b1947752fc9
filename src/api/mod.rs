pub mod auth;
pub mod profiles;
pub mod proposals;
pub mod types;
pub mod wallets;

use std::sync::Arc;

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use sqlx::PgPool;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::auth::TokenManager;
use crate::config::{ApiConfig, AuthConfig};
use crate::error::ApiError;
use crate::pipeline::AnalysisPipeline;
use types::HealthResponse;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub pipeline: Arc<AnalysisPipeline>,
    pub tokens: TokenManager,
    pub auth: AuthConfig,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/v1/health", get(health))
        .route("/analyze/{wallet_address}", post(wallets::analyze))
        .route("/wallets", get(wallets::list_wallets))
        .route(
            "/wallets/{wallet_address}",
            get(wallets::get_wallet).delete(wallets::delete_wallet),
        )
        .route("/api/auth/request-message", post(auth::request_message))
        .route("/api/auth/verify", post(auth::verify))
        .route("/api/auth/me", get(auth::me))
        .route("/profiles", get(profiles::list))
        .route("/profiles/me", get(profiles::get_me).put(profiles::update_me))
        .route("/profiles/{address}", get(profiles::get_public))
        .route("/proposals", post(proposals::create).get(proposals::list))
        .route("/proposals/me", get(proposals::mine))
        .route("/proposals/by-wallet/{address}", get(proposals::by_wallet))
        .route(
            "/proposals/{id}",
            get(proposals::get)
                .put(proposals::update)
                .delete(proposals::delete),
        )
        .route("/proposals/{id}/documents", post(proposals::add_document))
        .route(
            "/proposals/{id}/documents/{document_id}",
            axum::routing::delete(proposals::remove_document),
        )
        .route("/tags", get(proposals::list_tags))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

pub async fn serve(state: AppState, config: &ApiConfig) -> eyre::Result<()> {
    let app = router(state);
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "API server listening");
    axum::serve(listener, app).await?;
    Ok(())
}

async fn health(State(state): State<AppState>) -> Result<Json<HealthResponse>, ApiError> {
    let (analyzed_wallets,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM wallet_analyses")
        .fetch_one(&state.pool)
        .await?;
    let (active_proposals,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM business_proposals WHERE status = 'active'")
            .fetch_one(&state.pool)
            .await?;

    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        analyzed_wallets,
        active_proposals,
    }))
}
