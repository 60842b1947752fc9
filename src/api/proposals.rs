use axum::extract::{Path, Query, State};
use axum::Json;

use super::types::{DeleteResponse, ProposalListParams, ProposalListResponse};
use super::AppState;
use crate::auth::Auth;
use crate::db::{analyses, profiles, proposals};
use crate::db::proposals::{
    new_document_id, BusinessProposal, DocumentInput, ProposalDocument, ProposalFilter,
    ProposalInput,
};
use crate::error::ApiError;
use crate::model::normalize_address;

const DEFAULT_PAGE: i64 = 100;
const MAX_PAGE: i64 = 1000;

/// POST /proposals
///
/// Publishing requires a completed profile. The proposer is re-analyzed
/// first so the listing always links a current risk record.
pub async fn create(
    State(state): State<AppState>,
    Auth(wallet): Auth,
    Json(body): Json<ProposalInput>,
) -> Result<Json<BusinessProposal>, ApiError> {
    body.validate()?;

    let profile = profiles::get(&state.pool, &wallet.address).await?;
    if !profile.is_some_and(|p| p.profile_completed) {
        return Err(ApiError::Forbidden(
            "complete your profile before publishing a proposal".into(),
        ));
    }

    state.pipeline.analyze(&state.pool, &wallet.address).await?;
    let analysis_id = analyses::get_id(&state.pool, &wallet.address).await?;

    let proposal = proposals::create(&state.pool, &wallet.address, &body, analysis_id).await?;
    tracing::info!(wallet = %wallet.address, proposal = %proposal.id, "proposal published");
    Ok(Json(proposal))
}

/// GET /proposals
pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<ProposalListParams>,
) -> Result<Json<ProposalListResponse>, ApiError> {
    let filter = ProposalFilter {
        status: params.status,
        limit: params.limit.unwrap_or(DEFAULT_PAGE).clamp(1, MAX_PAGE),
        offset: params.offset.unwrap_or(0).max(0),
    };

    let (total, proposals) = proposals::list(&state.pool, &filter).await?;
    Ok(Json(ProposalListResponse { total, proposals }))
}

/// GET /proposals/me
pub async fn mine(
    State(state): State<AppState>,
    Auth(wallet): Auth,
) -> Result<Json<BusinessProposal>, ApiError> {
    let proposal = proposals::get_by_wallet(&state.pool, &wallet.address)
        .await?
        .ok_or_else(|| ApiError::NotFound("proposal for your wallet".into()))?;

    Ok(Json(proposal))
}

/// GET /proposals/by-wallet/{address}
pub async fn by_wallet(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> Result<Json<BusinessProposal>, ApiError> {
    let address = normalize_address(&address)?;
    let proposal = proposals::get_by_wallet(&state.pool, &address)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("proposal from wallet {}", address)))?;

    Ok(Json(proposal))
}

/// GET /proposals/{id}
pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<BusinessProposal>, ApiError> {
    let proposal = proposals::get(&state.pool, &id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("proposal {}", id)))?;

    Ok(Json(proposal))
}

/// PUT /proposals/{id} (owner only)
pub async fn update(
    State(state): State<AppState>,
    Auth(wallet): Auth,
    Path(id): Path<String>,
    Json(body): Json<ProposalInput>,
) -> Result<Json<BusinessProposal>, ApiError> {
    body.validate()?;

    match proposals::update(&state.pool, &id, &wallet.address, &body).await? {
        Some(proposal) => Ok(Json(proposal)),
        // Distinguish a missing proposal from someone else's.
        None => match proposals::get(&state.pool, &id).await? {
            Some(_) => Err(ApiError::Forbidden(
                "only the proposer can edit this proposal".into(),
            )),
            None => Err(ApiError::NotFound(format!("proposal {}", id))),
        },
    }
}

/// GET /tags
pub async fn list_tags(State(state): State<AppState>) -> Result<Json<Vec<String>>, ApiError> {
    let tags = proposals::list_tags(&state.pool).await?;
    Ok(Json(tags))
}

/// POST /proposals/{id}/documents (owner only)
pub async fn add_document(
    State(state): State<AppState>,
    Auth(wallet): Auth,
    Path(id): Path<String>,
    Json(body): Json<DocumentInput>,
) -> Result<Json<ProposalDocument>, ApiError> {
    body.validate()?;

    let document = ProposalDocument {
        id: new_document_id(),
        name: body.name,
        url: body.url,
        document_type: body.document_type,
        uploaded_at: chrono::Utc::now(),
    };

    let attached =
        proposals::add_document(&state.pool, &id, &wallet.address, &document).await?;
    if !attached {
        if proposals::get(&state.pool, &id).await?.is_some() {
            return Err(ApiError::Forbidden(
                "only the proposer can attach documents".into(),
            ));
        }
        return Err(ApiError::NotFound(format!("proposal {}", id)));
    }

    tracing::info!(wallet = %wallet.address, proposal = %id, document = %document.id, "document attached");
    Ok(Json(document))
}

/// DELETE /proposals/{id}/documents/{document_id} (owner only)
pub async fn remove_document(
    State(state): State<AppState>,
    Auth(wallet): Auth,
    Path((id, document_id)): Path<(String, String)>,
) -> Result<Json<DeleteResponse>, ApiError> {
    let deleted =
        proposals::remove_document(&state.pool, &id, &wallet.address, &document_id).await?;
    if !deleted {
        return match proposals::get(&state.pool, &id).await? {
            None => Err(ApiError::NotFound(format!("proposal {}", id))),
            Some(p) if p.proposer_wallet != wallet.address => Err(ApiError::Forbidden(
                "only the proposer can remove documents".into(),
            )),
            Some(_) => Err(ApiError::NotFound(format!("document {}", document_id))),
        };
    }

    Ok(Json(DeleteResponse { deleted }))
}

/// DELETE /proposals/{id} (owner only)
pub async fn delete(
    State(state): State<AppState>,
    Auth(wallet): Auth,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>, ApiError> {
    let deleted = proposals::delete(&state.pool, &id, &wallet.address).await?;
    if !deleted {
        if proposals::get(&state.pool, &id).await?.is_some() {
            return Err(ApiError::Forbidden(
                "only the proposer can delete this proposal".into(),
            ));
        }
        return Err(ApiError::NotFound(format!("proposal {}", id)));
    }

    tracing::info!(wallet = %wallet.address, proposal = %id, "proposal deleted");
    Ok(Json(DeleteResponse { deleted }))
}
