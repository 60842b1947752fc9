use std::str::FromStr;

use alloy::primitives::Address;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::chain::types::{ProcessedTransaction, TokenHolding};
use crate::error::ApiError;
use crate::scoring::types::{BehavioralPatterns, RiskLevel, ScoreEntry, WalletMetadata};

/// One stored analysis per wallet address. Field names and nesting are
/// the wire format other tooling depends on; do not rename.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletAnalysis {
    pub wallet_address: String,
    pub network: String,
    pub analysis_timestamp: DateTime<Utc>,
    pub scoring_breakdown: Vec<ScoreEntry>,
    pub wallet_metadata: WalletMetadata,
    pub behavioral_patterns: BehavioralPatterns,
    #[serde(default)]
    pub transactions: Option<Vec<ProcessedTransaction>>,
    #[serde(default)]
    pub token_holdings: Option<Vec<TokenHolding>>,
    pub comments: Option<Vec<String>>,
    pub final_score: f64,
    pub risk_level: RiskLevel,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Parse and normalize a client-supplied wallet address.
/// Records are keyed by the lowercase form so lookups are
/// case-insensitive regardless of checksum casing.
pub fn normalize_address(input: &str) -> Result<String, ApiError> {
    let address = Address::from_str(input.trim())
        .map_err(|_| ApiError::Validation(format!("invalid wallet address '{}'", input)))?;
    Ok(format!("0x{}", hex::encode(address.as_slice())))
}

/// Checksummed (EIP-55) display form of an already validated address.
pub fn checksum_address(normalized: &str) -> String {
    Address::from_str(normalized)
        .map(|a| a.to_checksum(None))
        .unwrap_or_else(|_| normalized.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHECKSUMMED: &str = "0xeBe5f532F357D053aAd4Ca5E95d2ac1cb308091E";

    #[test]
    fn test_normalize_accepts_any_case() {
        let lower = normalize_address(&CHECKSUMMED.to_lowercase()).unwrap();
        let mixed = normalize_address(CHECKSUMMED).unwrap();
        assert_eq!(lower, mixed);
        assert_eq!(lower, CHECKSUMMED.to_lowercase());
    }

    #[test]
    fn test_normalize_rejects_garbage() {
        assert!(normalize_address("not-an-address").is_err());
        assert!(normalize_address("0x1234").is_err());
        assert!(normalize_address("").is_err());
    }

    #[test]
    fn test_checksum_round_trip() {
        let normalized = normalize_address(CHECKSUMMED).unwrap();
        assert_eq!(checksum_address(&normalized), CHECKSUMMED);
    }

    #[test]
    fn test_wire_format_field_names() {
        let json = serde_json::json!({
            "wallet_address": "0xebe5f532f357d053aad4ca5e95d2ac1cb308091e",
            "network": "lisk-sepolia",
            "analysis_timestamp": "2024-01-01T00:00:00Z",
            "scoring_breakdown": [
                {"criteria": "Wallet Age", "score_delta": 10.0, "reason": "old enough"}
            ],
            "wallet_metadata": {
                "first_seen": null,
                "last_seen": null,
                "age_days": 0,
                "total_transactions": 0,
                "inbound_count": 0,
                "outbound_count": 0,
                "unique_tokens_used": 0,
                "unique_contracts_interacted": 0,
                "uses_only_transfers": false,
                "all_contracts_verified": false,
                "funded_by_established_wallet": false,
                "linked_to_flagged_entity": false
            },
            "behavioral_patterns": {
                "outbound_only": false,
                "transaction_anomalies": [],
                "contract_usage": {
                    "single_contract_usage": false,
                    "unverified_contract_usage": false
                }
            },
            "comments": null,
            "final_score": 10.0,
            "risk_level": "Low"
        });

        let record: WalletAnalysis = serde_json::from_value(json).unwrap();
        assert_eq!(record.final_score, 10.0);
        assert_eq!(record.risk_level, RiskLevel::Low);
        assert_eq!(record.scoring_breakdown.len(), 1);

        // Round-trips with the exact top-level field names
        let back = serde_json::to_value(&record).unwrap();
        for key in [
            "wallet_address",
            "network",
            "analysis_timestamp",
            "scoring_breakdown",
            "wallet_metadata",
            "behavioral_patterns",
            "comments",
            "final_score",
            "risk_level",
        ] {
            assert!(back.get(key).is_some(), "missing wire field {}", key);
        }
    }
}
