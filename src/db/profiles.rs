use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx::PgPool;

use crate::error::ApiError;

const COLUMNS: &str = "wallet_address, display_name, email, bio, avatar_url, phone, website, \
     social_media, company_name, company_position, company_website, company_description, \
     profile_completed, email_verified, kyc_verified, created_at, updated_at";

/// Per-wallet profile, keyed by the normalized address. Created lazily
/// on first authenticated access.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct WalletProfile {
    pub wallet_address: String,
    pub display_name: Option<String>,
    pub email: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub social_media: Option<JsonValue>,
    pub company_name: Option<String>,
    pub company_position: Option<String>,
    pub company_website: Option<String>,
    pub company_description: Option<String>,
    pub profile_completed: bool,
    pub email_verified: bool,
    pub kyc_verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields a wallet owner may set on their own profile. Every field is
/// optional; absent fields clear the stored value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileUpdate {
    pub display_name: Option<String>,
    pub email: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub social_media: Option<JsonValue>,
    pub company_name: Option<String>,
    pub company_position: Option<String>,
    pub company_website: Option<String>,
    pub company_description: Option<String>,
}

impl ProfileUpdate {
    /// A profile counts as completed once the fields proposals require
    /// are all present.
    fn is_complete(&self) -> bool {
        let filled = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.trim().is_empty());
        filled(&self.display_name) && filled(&self.email) && filled(&self.company_name)
    }
}

pub async fn get(
    pool: &PgPool,
    wallet_address: &str,
) -> Result<Option<WalletProfile>, ApiError> {
    let query = format!(
        "SELECT {} FROM wallet_profiles WHERE wallet_address = $1",
        COLUMNS
    );
    let profile = sqlx::query_as::<_, WalletProfile>(&query)
        .bind(wallet_address)
        .fetch_optional(pool)
        .await?;

    Ok(profile)
}

/// Fetch the wallet's profile, creating an empty one if none exists.
pub async fn ensure(pool: &PgPool, wallet_address: &str) -> Result<WalletProfile, ApiError> {
    let query = format!(
        "INSERT INTO wallet_profiles (wallet_address) VALUES ($1) \
         ON CONFLICT (wallet_address) DO UPDATE SET wallet_address = EXCLUDED.wallet_address \
         RETURNING {}",
        COLUMNS
    );
    let profile = sqlx::query_as::<_, WalletProfile>(&query)
        .bind(wallet_address)
        .fetch_one(pool)
        .await?;

    Ok(profile)
}

/// Page through every stored profile, newest first.
pub async fn list(
    pool: &PgPool,
    limit: i64,
    offset: i64,
) -> Result<Vec<WalletProfile>, ApiError> {
    let query = format!(
        "SELECT {} FROM wallet_profiles ORDER BY created_at DESC LIMIT $1 OFFSET $2",
        COLUMNS
    );
    let profiles = sqlx::query_as::<_, WalletProfile>(&query)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;

    Ok(profiles)
}

/// Replace the editable fields of the wallet's profile and recompute
/// the completion flag. Upserts, so a first PUT also creates the row.
pub async fn update(
    pool: &PgPool,
    wallet_address: &str,
    update: &ProfileUpdate,
) -> Result<WalletProfile, ApiError> {
    let completed = update.is_complete();
    let query = format!(
        "INSERT INTO wallet_profiles \
           (wallet_address, display_name, email, bio, avatar_url, phone, website, \
            social_media, company_name, company_position, company_website, \
            company_description, profile_completed) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13) \
         ON CONFLICT (wallet_address) DO UPDATE SET \
            display_name = EXCLUDED.display_name, \
            email = EXCLUDED.email, \
            bio = EXCLUDED.bio, \
            avatar_url = EXCLUDED.avatar_url, \
            phone = EXCLUDED.phone, \
            website = EXCLUDED.website, \
            social_media = EXCLUDED.social_media, \
            company_name = EXCLUDED.company_name, \
            company_position = EXCLUDED.company_position, \
            company_website = EXCLUDED.company_website, \
            company_description = EXCLUDED.company_description, \
            profile_completed = EXCLUDED.profile_completed, \
            updated_at = NOW() \
         RETURNING {}",
        COLUMNS
    );

    let profile = sqlx::query_as::<_, WalletProfile>(&query)
        .bind(wallet_address)
        .bind(&update.display_name)
        .bind(&update.email)
        .bind(&update.bio)
        .bind(&update.avatar_url)
        .bind(&update.phone)
        .bind(&update.website)
        .bind(&update.social_media)
        .bind(&update.company_name)
        .bind(&update.company_position)
        .bind(&update.company_website)
        .bind(&update.company_description)
        .bind(completed)
        .fetch_one(pool)
        .await?;

    Ok(profile)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completion_needs_identity_fields() {
        let mut update = ProfileUpdate {
            display_name: Some("Acme Treasury".into()),
            email: Some("ops@acme.example".into()),
            ..Default::default()
        };
        assert!(!update.is_complete());

        update.company_name = Some("Acme Labs".into());
        assert!(update.is_complete());

        update.email = Some("   ".into());
        assert!(!update.is_complete());
    }
}
