use chrono::{DateTime, Duration, Utc};
use sqlx::PgPool;

use crate::error::ApiError;

/// A signing challenge as stored. One live challenge per wallet;
/// re-requesting replaces the old one.
#[derive(Debug, sqlx::FromRow)]
pub struct StoredChallenge {
    pub wallet_address: String,
    pub nonce: String,
    pub message: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub consumed_at: Option<DateTime<Utc>>,
}

/// Store a fresh challenge, replacing any prior one for the wallet
/// and clearing its consumed marker.
pub async fn issue(
    pool: &PgPool,
    wallet_address: &str,
    nonce: &str,
    message: &str,
    ttl_secs: i64,
) -> Result<StoredChallenge, ApiError> {
    let now = Utc::now();
    let expires_at = now + Duration::seconds(ttl_secs);

    let challenge = sqlx::query_as::<_, StoredChallenge>(
        "INSERT INTO auth_challenges (wallet_address, nonce, message, issued_at, expires_at) \
         VALUES ($1, $2, $3, $4, $5) \
         ON CONFLICT (wallet_address) DO UPDATE SET \
            nonce = EXCLUDED.nonce, \
            message = EXCLUDED.message, \
            issued_at = EXCLUDED.issued_at, \
            expires_at = EXCLUDED.expires_at, \
            consumed_at = NULL \
         RETURNING wallet_address, nonce, message, issued_at, expires_at, consumed_at",
    )
    .bind(wallet_address)
    .bind(nonce)
    .bind(message)
    .bind(now)
    .bind(expires_at)
    .fetch_one(pool)
    .await?;

    Ok(challenge)
}

pub async fn get(
    pool: &PgPool,
    wallet_address: &str,
) -> Result<Option<StoredChallenge>, ApiError> {
    let challenge = sqlx::query_as::<_, StoredChallenge>(
        "SELECT wallet_address, nonce, message, issued_at, expires_at, consumed_at \
         FROM auth_challenges WHERE wallet_address = $1",
    )
    .bind(wallet_address)
    .fetch_optional(pool)
    .await?;

    Ok(challenge)
}

/// Mark the wallet's challenge consumed. The conditional UPDATE makes
/// this atomic: only one concurrent verify can win, and an expired or
/// already-consumed challenge matches no row.
pub async fn consume(pool: &PgPool, wallet_address: &str) -> Result<bool, ApiError> {
    let result = sqlx::query(
        "UPDATE auth_challenges SET consumed_at = NOW() \
         WHERE wallet_address = $1 AND consumed_at IS NULL AND expires_at > NOW()",
    )
    .bind(wallet_address)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Drop challenges past their expiry. Run periodically; consumed rows
/// also age out here.
pub async fn purge_expired(pool: &PgPool) -> Result<u64, ApiError> {
    let result = sqlx::query("DELETE FROM auth_challenges WHERE expires_at <= NOW()")
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}

#[cfg(test)]
mod tests {
    use super::*;

    const WALLET: &str = "0xebe5f532f357d053aad4ca5e95d2ac1cb308091e";

    #[sqlx::test]
    async fn test_consume_is_single_use(pool: PgPool) -> Result<(), ApiError> {
        issue(&pool, WALLET, "nonce-1", "sign me", 300).await?;

        assert!(consume(&pool, WALLET).await?);
        assert!(!consume(&pool, WALLET).await?);

        let stored = get(&pool, WALLET).await?;
        assert!(stored.is_some_and(|c| c.consumed_at.is_some()));
        Ok(())
    }

    #[sqlx::test]
    async fn test_reissue_clears_consumed_marker(pool: PgPool) -> Result<(), ApiError> {
        issue(&pool, WALLET, "nonce-1", "sign me", 300).await?;
        assert!(consume(&pool, WALLET).await?);

        let fresh = issue(&pool, WALLET, "nonce-2", "sign me again", 300).await?;
        assert_eq!(fresh.nonce, "nonce-2");
        assert!(fresh.consumed_at.is_none());
        assert!(consume(&pool, WALLET).await?);
        Ok(())
    }

    #[sqlx::test]
    async fn test_expired_challenge_cannot_be_consumed(pool: PgPool) -> Result<(), ApiError> {
        issue(&pool, WALLET, "nonce-1", "sign me", -1).await?;

        assert!(!consume(&pool, WALLET).await?);
        assert_eq!(purge_expired(&pool).await?, 1);
        assert!(get(&pool, WALLET).await?.is_none());
        Ok(())
    }
}
