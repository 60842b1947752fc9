use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::config::AuthConfig;
use crate::error::ApiError;

/// Clock skew tolerance for expiry checks.
const CLOCK_SKEW_LEEWAY: u64 = 60;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    pub sub: String,
    pub wallet_address: String,
    pub iat: i64,
    pub exp: i64,
}

/// Issues and verifies the HS256 bearer tokens handed out after a
/// successful challenge signature.
#[derive(Clone)]
pub struct TokenManager {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl_minutes: i64,
}

impl TokenManager {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            decoding: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            ttl_minutes: config.token_ttl_minutes,
        }
    }

    /// Mint a token for a wallet that just proved key ownership.
    /// Returns the token and its expiry instant.
    pub fn issue(&self, wallet_address: &str) -> Result<(String, DateTime<Utc>), ApiError> {
        let now = Utc::now();
        let expires_at = now + Duration::minutes(self.ttl_minutes);
        let claims = TokenClaims {
            sub: wallet_address.to_string(),
            wallet_address: wallet_address.to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|err| ApiError::Internal(format!("token signing failed: {}", err)))?;

        Ok((token, expires_at))
    }

    pub fn verify(&self, token: &str) -> Result<TokenClaims, ApiError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = CLOCK_SKEW_LEEWAY;

        let data = decode::<TokenClaims>(token, &self.decoding, &validation).map_err(|err| {
            match err.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                    ApiError::Unauthorized("token expired".into())
                }
                _ => ApiError::Unauthorized("invalid token".into()),
            }
        })?;

        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(ttl_minutes: i64) -> AuthConfig {
        AuthConfig {
            jwt_secret: "unit-test-secret-0123456789abcdef".into(),
            token_ttl_minutes: ttl_minutes,
            challenge_ttl_secs: 300,
        }
    }

    #[test]
    fn test_issue_and_verify_round_trip() {
        let manager = TokenManager::new(&config(60));
        let wallet = "0xebe5f532f357d053aad4ca5e95d2ac1cb308091e";

        let (token, expires_at) = manager.issue(wallet).unwrap();
        assert!(expires_at > Utc::now());

        let claims = manager.verify(&token).unwrap();
        assert_eq!(claims.wallet_address, wallet);
        assert_eq!(claims.sub, wallet);
    }

    #[test]
    fn test_verify_rejects_wrong_secret() {
        let wallet = "0xebe5f532f357d053aad4ca5e95d2ac1cb308091e";
        let (token, _) = TokenManager::new(&config(60)).issue(wallet).unwrap();

        let mut other = config(60);
        other.jwt_secret = "a-different-secret-0123456789abcd".into();
        let err = TokenManager::new(&other).verify(&token).unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized(_)));
    }

    #[test]
    fn test_verify_rejects_garbage() {
        let manager = TokenManager::new(&config(60));
        assert!(manager.verify("not.a.token").is_err());
        assert!(manager.verify("").is_err());
    }
}
