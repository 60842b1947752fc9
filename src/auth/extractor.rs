use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

use super::AuthenticatedWallet;
use crate::api::AppState;
use crate::error::ApiError;

/// Extractor that requires a valid bearer token. Handlers take
/// `Auth(wallet): Auth` and get the verified wallet address.
pub struct Auth(pub AuthenticatedWallet);

impl FromRequestParts<AppState> for Auth {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .ok_or_else(|| ApiError::Unauthorized("missing authorization header".into()))?
            .to_str()
            .map_err(|_| ApiError::Unauthorized("malformed authorization header".into()))?;

        let token = header
            .strip_prefix("Bearer ")
            .ok_or_else(|| ApiError::Unauthorized("expected bearer token".into()))?;

        let claims = state.tokens.verify(token)?;

        Ok(Auth(AuthenticatedWallet {
            address: claims.wallet_address,
        }))
    }
}
