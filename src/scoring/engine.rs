use crate::chain::activity::ActivitySummary;
use crate::config::ScoringConfig;

use super::criteria;
use super::types::{
    BehavioralPatterns, ContractUsage, RiskLevel, ScoreEntry, ScoringOutcome, WalletMetadata,
};

pub const CRITERIA_COUNT: usize = 12;

pub const MIN_SCORE: f64 = 0.0;
pub const MAX_SCORE: f64 = 100.0;

/// The wallet scoring engine. A deterministic mapping from an activity
/// summary to a scored, explained risk assessment; no I/O, no state
/// beyond configuration.
pub struct ScoringEngine {
    config: ScoringConfig,
}

impl ScoringEngine {
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    /// Run every rubric rule, in order, against the summary.
    ///
    /// The breakdown always carries one entry per rule; missing input
    /// data degrades individual entries to zero, never fails the run.
    pub fn evaluate(&self, summary: &ActivitySummary) -> ScoringOutcome {
        let breakdown = self.run_criteria(summary);

        let raw: f64 = breakdown.iter().map(|e| e.score_delta).sum();
        let final_score = raw.clamp(MIN_SCORE, MAX_SCORE);
        let risk_level = RiskLevel::from_score(final_score, &self.config);

        ScoringOutcome {
            final_score,
            risk_level,
            metadata: self.build_metadata(summary),
            patterns: self.build_patterns(summary),
            comments: self.build_comments(summary),
            breakdown,
        }
    }

    fn run_criteria(&self, summary: &ActivitySummary) -> Vec<ScoreEntry> {
        let c = &self.config;
        vec![
            criteria::check_both_directions(summary, c),
            criteria::check_amount_consistency(summary, c),
            criteria::check_multiple_counterparties(summary, c),
            criteria::check_spend_delay(summary, c),
            criteria::check_verified_contracts(summary, c),
            criteria::check_known_contracts(summary, c),
            criteria::check_standard_methods(summary, c),
            criteria::check_established_funder(summary, c),
            criteria::check_wallet_age(summary, c),
            criteria::check_multiple_tokens(summary, c),
            criteria::check_contract_functions(summary, c),
            criteria::check_clean_reputation(summary, c),
        ]
    }

    fn build_metadata(&self, summary: &ActivitySummary) -> WalletMetadata {
        let contracts: Vec<_> = summary
            .counterparties
            .iter()
            .filter(|c| c.is_contract)
            .collect();

        WalletMetadata {
            first_seen: summary.first_seen,
            last_seen: summary.last_seen,
            age_days: summary.age_days,
            total_transactions: summary.total_transactions,
            inbound_count: summary.inbound_count,
            outbound_count: summary.outbound_count,
            unique_tokens_used: summary.unique_tokens_used,
            unique_contracts_interacted: contracts.len() as u32,
            uses_only_transfers: !summary.methods_used.is_empty()
                && summary.methods_used.iter().all(|m| m == "transfer"),
            all_contracts_verified: !contracts.is_empty()
                && contracts.iter().all(|c| c.is_verified),
            funded_by_established_wallet: summary
                .funding_source
                .as_ref()
                .is_some_and(|f| f.established),
            linked_to_flagged_entity: summary.flagged_linkage == Some(true),
        }
    }

    fn build_patterns(&self, summary: &ActivitySummary) -> BehavioralPatterns {
        let outbound_only = summary.outbound_count > 0 && summary.inbound_count == 0;
        let contracts: Vec<_> = summary
            .counterparties
            .iter()
            .filter(|c| c.is_contract)
            .collect();

        let mut anomalies = Vec::new();
        if outbound_only {
            anomalies.push("outbound_only".to_string());
        }
        if let (Some(funded), Some(spent)) = (summary.first_inbound_at, summary.first_outbound_at) {
            if (spent - funded).num_seconds() < self.config.min_spend_delay_secs {
                anomalies.push("immediate_spend_after_funding".to_string());
            }
        }
        if !criteria::custom_methods(summary).is_empty() {
            anomalies.push("custom_method_usage".to_string());
        }

        BehavioralPatterns {
            outbound_only,
            transaction_anomalies: anomalies,
            contract_usage: ContractUsage {
                single_contract_usage: contracts.len() == 1
                    && summary.counterparties.len() == 1,
                unverified_contract_usage: contracts.iter().any(|c| !c.is_verified),
            },
        }
    }

    fn build_comments(&self, summary: &ActivitySummary) -> Vec<String> {
        if !summary.has_activity() {
            vec![
                "No transaction or token holding data available for this wallet address"
                    .to_string(),
            ]
        } else {
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::activity::test_fixtures::*;
    use crate::chain::activity::{build_activity_summary, ActivitySummary};

    fn engine() -> ScoringEngine {
        ScoringEngine::new(ScoringConfig::default())
    }

    /// The sample fixture: 1 inbound, 52 outbound to a single verified
    /// but unnamed contract, 3 tokens, standard methods beyond bare
    /// transfer, immediate spend, wallet age 0 days.
    fn sample_summary() -> ActivitySummary {
        let mut txs = vec![tx(FUNDER, WALLET, None, ts(0), false)];
        for i in 0..52 {
            let method = if i % 2 == 0 { "transfer" } else { "swap" };
            // First spend 30 seconds after funding, well below threshold
            txs.push(tx(WALLET, CONTRACT, Some(method), ts(30 + i * 60), true));
        }
        let holdings = vec![holding("USDC"), holding("DAI"), holding("WETH")];
        build_activity_summary(WALLET, &txs, &holdings, None, ts(30 + 52 * 60))
    }

    #[test]
    fn test_sample_fixture_scores_fifty_medium() {
        let outcome = engine().evaluate(&sample_summary());

        assert_eq!(outcome.final_score, 50.0);
        assert_eq!(outcome.risk_level, RiskLevel::Medium);
        assert_eq!(outcome.breakdown.len(), CRITERIA_COUNT);

        // Exactly criteria 1, 2, 5, 7, 10, 11 award points (1-based)
        let awarded: Vec<usize> = outcome
            .breakdown
            .iter()
            .enumerate()
            .filter(|(_, e)| e.score_delta > 0.0)
            .map(|(i, _)| i + 1)
            .collect();
        assert_eq!(awarded, vec![1, 2, 5, 7, 10, 11]);
    }

    #[test]
    fn test_final_score_is_sum_of_deltas() {
        let outcome = engine().evaluate(&sample_summary());
        let sum: f64 = outcome.breakdown.iter().map(|e| e.score_delta).sum();
        assert_eq!(outcome.final_score, sum.clamp(MIN_SCORE, MAX_SCORE));
    }

    #[test]
    fn test_zero_activity_wallet() {
        let summary = ActivitySummary::empty(WALLET);
        let outcome = engine().evaluate(&summary);

        assert_eq!(outcome.final_score, 0.0);
        assert_eq!(outcome.risk_level, RiskLevel::High);
        assert_eq!(outcome.breakdown.len(), CRITERIA_COUNT);
        assert!(outcome.breakdown.iter().all(|e| e.score_delta == 0.0));
        // Every entry explains itself even with no data
        assert!(outcome.breakdown.iter().all(|e| !e.reason.is_empty()));
        assert_eq!(outcome.comments.len(), 1);
    }

    #[test]
    fn test_evaluation_is_deterministic() {
        let summary = sample_summary();
        let first = engine().evaluate(&summary);
        let second = engine().evaluate(&summary);
        assert_eq!(first.final_score, second.final_score);
        assert_eq!(first.breakdown, second.breakdown);
    }

    #[test]
    fn test_reasons_reference_observed_values() {
        let outcome = engine().evaluate(&sample_summary());
        // Rule 1 names the actual counts, not a canned string
        assert!(outcome.breakdown[0].reason.contains("1 inbound"));
        assert!(outcome.breakdown[0].reason.contains("52 outbound"));
        // Rule 10 names the token count
        assert!(outcome.breakdown[9].reason.contains('3'));
    }

    #[test]
    fn test_well_behaved_wallet_scores_low_risk() {
        let mut txs = vec![tx(FUNDER, WALLET, None, ts(0), false)];
        // Deliberate delay before first spend, two counterparties
        txs.push(tx(WALLET, CONTRACT, Some("swap"), ts(3600), true));
        txs.push(tx(
            WALLET,
            "0x3333333333333333333333333333333333333333",
            Some("stake"),
            ts(7200),
            false,
        ));
        let holdings = vec![holding("USDC"), holding("DAI")];
        let ten_days = 10 * 24 * 3600;
        let mut summary = build_activity_summary(WALLET, &txs, &holdings, Some(false), ts(ten_days));
        summary.counterparties[1].is_contract = false; // plain EOA recipient

        let outcome = engine().evaluate(&summary);
        // Awards 15+10+10+5+10+5+10+5+5+10 = 85 (all but known-contract
        // and established-funder)
        assert_eq!(outcome.final_score, 85.0);
        assert_eq!(outcome.risk_level, RiskLevel::Low);
    }

    #[test]
    fn test_flagged_wallet_loses_clean_bonus() {
        let mut summary = sample_summary();
        summary.flagged_linkage = Some(true);
        let outcome = engine().evaluate(&summary);

        let linkage = outcome.breakdown.last().unwrap();
        assert_eq!(linkage.score_delta, 0.0);
        assert!(linkage.reason.contains("flagged"));
        assert!(outcome.metadata.linked_to_flagged_entity);
    }

    #[test]
    fn test_outbound_only_pattern() {
        let txs = vec![tx(WALLET, CONTRACT, Some("transfer"), ts(0), true)];
        let summary = build_activity_summary(WALLET, &txs, &[], None, ts(0));
        let outcome = engine().evaluate(&summary);

        assert!(outcome.patterns.outbound_only);
        assert!(outcome
            .patterns
            .transaction_anomalies
            .contains(&"outbound_only".to_string()));
        assert_eq!(outcome.breakdown[0].score_delta, 0.0);
        assert!(outcome.metadata.uses_only_transfers);
    }

    #[test]
    fn test_custom_methods_flagged_as_anomaly() {
        let txs = vec![
            tx(FUNDER, WALLET, None, ts(0), false),
            tx(WALLET, CONTRACT, Some("obfuscated_0x1f"), ts(60), true),
        ];
        let summary = build_activity_summary(WALLET, &txs, &[], None, ts(0));
        let outcome = engine().evaluate(&summary);

        assert!(outcome
            .patterns
            .transaction_anomalies
            .contains(&"custom_method_usage".to_string()));
        // Rules 2 and 7 both withhold their bonus
        assert_eq!(outcome.breakdown[1].score_delta, 0.0);
        assert_eq!(outcome.breakdown[6].score_delta, 0.0);
        assert!(outcome.breakdown[1].reason.contains("obfuscated_0x1f"));
    }

    #[test]
    fn test_unverified_contract_blocks_rule_five() {
        let txs = vec![
            tx(FUNDER, WALLET, None, ts(0), false),
            tx(WALLET, CONTRACT, Some("transfer"), ts(60), false),
        ];
        let summary = build_activity_summary(WALLET, &txs, &[], None, ts(0));
        let outcome = engine().evaluate(&summary);

        assert_eq!(outcome.breakdown[4].score_delta, 0.0);
        assert!(outcome.patterns.contract_usage.unverified_contract_usage);
        assert!(!outcome.metadata.all_contracts_verified);
    }
}
