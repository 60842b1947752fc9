use axum::extract::{Path, Query, State};
use axum::Json;

use super::types::{DeleteResponse, WalletListParams, WalletListResponse};
use super::AppState;
use crate::auth::Auth;
use crate::db::analyses::{self, AnalysisFilter};
use crate::error::ApiError;
use crate::model::{normalize_address, WalletAnalysis};
use crate::scoring::types::RiskLevel;

const DEFAULT_PAGE: i64 = 100;
const MAX_PAGE: i64 = 1000;

/// POST /analyze/{wallet_address}
///
/// Runs the full pipeline and returns the freshly stored record. A
/// re-run replaces the wallet's previous analysis.
pub async fn analyze(
    State(state): State<AppState>,
    Auth(actor): Auth,
    Path(wallet_address): Path<String>,
) -> Result<Json<WalletAnalysis>, ApiError> {
    let address = normalize_address(&wallet_address)?;
    tracing::info!(wallet = %address, requested_by = %actor.address, "analysis requested");

    let record = state.pipeline.analyze(&state.pool, &address).await?;
    Ok(Json(record))
}

/// GET /wallets/{wallet_address}
pub async fn get_wallet(
    State(state): State<AppState>,
    Path(wallet_address): Path<String>,
) -> Result<Json<WalletAnalysis>, ApiError> {
    let address = normalize_address(&wallet_address)?;
    let record = analyses::get(&state.pool, &address)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("analysis for wallet {}", address)))?;

    Ok(Json(record))
}

/// GET /wallets
pub async fn list_wallets(
    State(state): State<AppState>,
    Query(params): Query<WalletListParams>,
) -> Result<Json<WalletListResponse>, ApiError> {
    let risk_level = params
        .risk_level
        .as_deref()
        .map(|raw| {
            RiskLevel::parse(raw).ok_or_else(|| {
                ApiError::Validation(format!(
                    "invalid risk_level '{}', expected Low, Medium or High",
                    raw
                ))
            })
        })
        .transpose()?;

    if let (Some(min), Some(max)) = (params.min_score, params.max_score) {
        if min > max {
            return Err(ApiError::Validation(
                "min_score must not exceed max_score".into(),
            ));
        }
    }

    let filter = AnalysisFilter {
        risk_level,
        network: params.network,
        min_score: params.min_score,
        max_score: params.max_score,
        limit: params.limit.unwrap_or(DEFAULT_PAGE).clamp(1, MAX_PAGE),
        offset: params.offset.unwrap_or(0).max(0),
    };

    let (total, wallets) = analyses::list(&state.pool, &filter).await?;
    Ok(Json(WalletListResponse { total, wallets }))
}

/// DELETE /wallets/{wallet_address}
///
/// Idempotent: deleting an address that has no record succeeds with
/// `deleted: false`.
pub async fn delete_wallet(
    State(state): State<AppState>,
    Auth(actor): Auth,
    Path(wallet_address): Path<String>,
) -> Result<Json<DeleteResponse>, ApiError> {
    let address = normalize_address(&wallet_address)?;
    let deleted = analyses::delete(&state.pool, &address).await?;

    if deleted {
        tracing::info!(wallet = %address, requested_by = %actor.address, "analysis deleted");
    }
    Ok(Json(DeleteResponse { deleted }))
}
