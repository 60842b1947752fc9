use axum::extract::State;
use axum::Json;

use super::types::{ChallengeRequest, ChallengeResponse, MeResponse, VerifyRequest, VerifyResponse};
use super::AppState;
use crate::auth::{challenge, Auth};
use crate::error::ApiError;
use crate::model::normalize_address;

/// POST /api/auth/request-message
pub async fn request_message(
    State(state): State<AppState>,
    Json(body): Json<ChallengeRequest>,
) -> Result<Json<ChallengeResponse>, ApiError> {
    let address = normalize_address(&body.address)?;
    let stored = challenge::request_message(&state.pool, &state.auth, &address).await?;

    Ok(Json(ChallengeResponse {
        message: stored.message,
        wallet_address: address,
        expires_at: stored.expires_at,
    }))
}

/// POST /api/auth/verify
///
/// A valid signature over the live challenge consumes it and yields a
/// bearer token for the wallet.
pub async fn verify(
    State(state): State<AppState>,
    Json(body): Json<VerifyRequest>,
) -> Result<Json<VerifyResponse>, ApiError> {
    let address = normalize_address(&body.address)?;
    challenge::verify(&state.pool, &address, &body.signature).await?;

    let (token, expires_at) = state.tokens.issue(&address)?;
    Ok(Json(VerifyResponse { token, expires_at }))
}

/// GET /api/auth/me
pub async fn me(Auth(wallet): Auth) -> Json<MeResponse> {
    Json(MeResponse {
        wallet_address: wallet.address,
    })
}
