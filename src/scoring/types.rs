use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::ScoringConfig;

/// Risk bucket derived from the final score. Higher score = safer wallet,
/// so the top band maps to Low risk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    /// Band the clamped score using the configured thresholds.
    pub fn from_score(score: f64, config: &ScoringConfig) -> Self {
        if score >= config.low_risk_min {
            Self::Low
        } else if score >= config.medium_risk_min {
            Self::Medium
        } else {
            Self::High
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            _ => None,
        }
    }
}

/// One evaluated rubric rule. The breakdown always contains every rule
/// in evaluation order, including zero-delta entries.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScoreEntry {
    pub criteria: String,
    pub score_delta: f64,
    pub reason: String,
}

/// Observed wallet facts stored alongside the score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletMetadata {
    pub first_seen: Option<DateTime<Utc>>,
    pub last_seen: Option<DateTime<Utc>>,
    pub age_days: i64,
    pub total_transactions: u32,
    pub inbound_count: u32,
    pub outbound_count: u32,
    pub unique_tokens_used: u32,
    pub unique_contracts_interacted: u32,
    pub uses_only_transfers: bool,
    pub all_contracts_verified: bool,
    pub funded_by_established_wallet: bool,
    pub linked_to_flagged_entity: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractUsage {
    pub single_contract_usage: bool,
    pub unverified_contract_usage: bool,
}

/// Derived behavioral flags, persisted as a nested document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BehavioralPatterns {
    pub outbound_only: bool,
    pub transaction_anomalies: Vec<String>,
    pub contract_usage: ContractUsage,
}

/// Full output of one engine run over an activity summary.
#[derive(Debug, Clone)]
pub struct ScoringOutcome {
    pub final_score: f64,
    pub risk_level: RiskLevel,
    pub breakdown: Vec<ScoreEntry>,
    pub metadata: WalletMetadata,
    pub patterns: BehavioralPatterns,
    pub comments: Vec<String>,
}
