use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::db::challenges::{self, StoredChallenge};
use crate::error::ApiError;

const MESSAGE_PREFIX: &str = "Sign this message to authenticate with the Wallet Risk API";

/// The exact text the wallet must sign. Embedding address and nonce
/// binds the signature to one wallet and one login attempt.
pub fn challenge_message(wallet_address: &str, nonce: &str) -> String {
    format!("{}: {}:{}", MESSAGE_PREFIX, wallet_address, nonce)
}

/// Issue a fresh challenge for the wallet, replacing any prior one.
pub async fn request_message(
    pool: &PgPool,
    config: &AuthConfig,
    wallet_address: &str,
) -> Result<StoredChallenge, ApiError> {
    let nonce = Uuid::new_v4().to_string();
    let message = challenge_message(wallet_address, &nonce);

    let challenge = challenges::issue(
        pool,
        wallet_address,
        &nonce,
        &message,
        config.challenge_ttl_secs,
    )
    .await?;

    tracing::debug!(wallet = %wallet_address, expires_at = %challenge.expires_at, "challenge issued");
    Ok(challenge)
}

/// Verify a signature against the wallet's stored challenge.
///
/// The signature is checked before the challenge is consumed, so a
/// mistyped signature does not burn the challenge. The consume step is
/// a conditional UPDATE; losing that race reads as an expired
/// challenge, never a double login.
pub async fn verify(
    pool: &PgPool,
    wallet_address: &str,
    signature: &str,
) -> Result<(), ApiError> {
    let challenge = challenges::get(pool, wallet_address)
        .await?
        .ok_or(ApiError::ExpiredChallenge)?;

    if challenge.consumed_at.is_some() || challenge.expires_at <= Utc::now() {
        return Err(ApiError::ExpiredChallenge);
    }

    let recovered = super::signature::recover_signer(&challenge.message, signature)?;
    let recovered = format!("0x{}", hex::encode(recovered.as_slice()));
    if recovered != wallet_address {
        tracing::warn!(wallet = %wallet_address, recovered = %recovered, "signature address mismatch");
        return Err(ApiError::InvalidSignature);
    }

    if !challenges::consume(pool, wallet_address).await? {
        return Err(ApiError::ExpiredChallenge);
    }

    tracing::info!(wallet = %wallet_address, "challenge verified");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_embeds_address_and_nonce() {
        let message = challenge_message("0xabc", "nonce-1");
        assert_eq!(
            message,
            "Sign this message to authenticate with the Wallet Risk API: 0xabc:nonce-1"
        );
    }

    #[test]
    fn test_messages_differ_per_nonce() {
        let a = challenge_message("0xabc", &Uuid::new_v4().to_string());
        let b = challenge_message("0xabc", &Uuid::new_v4().to_string());
        assert_ne!(a, b);
    }
}
