use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::db::profiles::WalletProfile;
use crate::model::WalletAnalysis;

// ============================================================
// Query params
// ============================================================

#[derive(Debug, Deserialize)]
pub struct WalletListParams {
    pub risk_level: Option<String>,
    pub network: Option<String>,
    pub min_score: Option<f64>,
    pub max_score: Option<f64>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct ProfileListParams {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct ProposalListParams {
    pub status: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

// ============================================================
// Wallet responses
// ============================================================

#[derive(Debug, Serialize)]
pub struct WalletListResponse {
    pub total: i64,
    pub wallets: Vec<WalletAnalysis>,
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub deleted: bool,
}

// ============================================================
// Auth
// ============================================================

#[derive(Debug, Deserialize)]
pub struct ChallengeRequest {
    pub address: String,
}

#[derive(Debug, Serialize)]
pub struct ChallengeResponse {
    pub message: String,
    pub wallet_address: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    pub address: String,
    pub signature: String,
}

#[derive(Debug, Serialize)]
pub struct VerifyResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub wallet_address: String,
}

// ============================================================
// Profiles
// ============================================================

/// Profile view for anyone other than the owner. Contact details stay
/// private; the rest mirrors the stored profile.
#[derive(Debug, Serialize)]
pub struct PublicProfile {
    pub wallet_address: String,
    pub display_name: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub website: Option<String>,
    pub social_media: Option<JsonValue>,
    pub company_name: Option<String>,
    pub company_position: Option<String>,
    pub company_website: Option<String>,
    pub company_description: Option<String>,
    pub profile_completed: bool,
    pub kyc_verified: bool,
}

impl From<WalletProfile> for PublicProfile {
    fn from(profile: WalletProfile) -> Self {
        Self {
            wallet_address: profile.wallet_address,
            display_name: profile.display_name,
            bio: profile.bio,
            avatar_url: profile.avatar_url,
            website: profile.website,
            social_media: profile.social_media,
            company_name: profile.company_name,
            company_position: profile.company_position,
            company_website: profile.company_website,
            company_description: profile.company_description,
            profile_completed: profile.profile_completed,
            kyc_verified: profile.kyc_verified,
        }
    }
}

// ============================================================
// Proposals
// ============================================================

#[derive(Debug, Serialize)]
pub struct ProposalListResponse {
    pub total: i64,
    pub proposals: Vec<crate::db::proposals::BusinessProposal>,
}

// ============================================================
// Health
// ============================================================

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub analyzed_wallets: i64,
    pub active_proposals: i64,
}
