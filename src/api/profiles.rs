use axum::extract::{Path, Query, State};
use axum::Json;

use super::types::{ProfileListParams, PublicProfile};
use super::AppState;
use crate::auth::Auth;
use crate::db::profiles::{self, ProfileUpdate, WalletProfile};
use crate::error::ApiError;
use crate::model::normalize_address;

/// GET /profiles/me
///
/// First authenticated access creates an empty profile for the wallet.
pub async fn get_me(
    State(state): State<AppState>,
    Auth(wallet): Auth,
) -> Result<Json<WalletProfile>, ApiError> {
    let profile = profiles::ensure(&state.pool, &wallet.address).await?;
    Ok(Json(profile))
}

/// PUT /profiles/me
pub async fn update_me(
    State(state): State<AppState>,
    Auth(wallet): Auth,
    Json(body): Json<ProfileUpdate>,
) -> Result<Json<WalletProfile>, ApiError> {
    let profile = profiles::update(&state.pool, &wallet.address, &body).await?;
    tracing::info!(wallet = %wallet.address, completed = profile.profile_completed, "profile updated");
    Ok(Json(profile))
}

/// GET /profiles
///
/// Full profiles, so the listing stays behind authentication.
pub async fn list(
    State(state): State<AppState>,
    Auth(_wallet): Auth,
    Query(params): Query<ProfileListParams>,
) -> Result<Json<Vec<WalletProfile>>, ApiError> {
    let limit = params.limit.unwrap_or(100).clamp(1, 1000);
    let offset = params.offset.unwrap_or(0).max(0);
    let profiles = profiles::list(&state.pool, limit, offset).await?;
    Ok(Json(profiles))
}

/// GET /profiles/{address}
pub async fn get_public(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> Result<Json<PublicProfile>, ApiError> {
    let address = normalize_address(&address)?;
    let profile = profiles::get(&state.pool, &address)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("profile for wallet {}", address)))?;

    Ok(Json(profile.into()))
}
