use crate::chain::activity::ActivitySummary;
use crate::config::ScoringConfig;

use super::types::ScoreEntry;

/// Method names considered standard, safe wallet behavior.
/// Decoded names are lowercased before comparison.
pub const STANDARD_METHODS: &[&str] = &[
    "transfer",
    "transferfrom",
    "approve",
    "stake",
    "unstake",
    "swap",
    "deposit",
    "withdraw",
    "mint",
    "claim",
];

pub fn is_standard_method(method: &str) -> bool {
    STANDARD_METHODS.contains(&method)
}

fn entry(criteria: &str, score_delta: f64, reason: String) -> ScoreEntry {
    ScoreEntry {
        criteria: criteria.to_string(),
        score_delta,
        reason,
    }
}

/// Methods outside the standard set. Empty when the wallet only makes
/// plain native transfers (no decoded method at all).
pub fn custom_methods(summary: &ActivitySummary) -> Vec<&str> {
    summary
        .methods_used
        .iter()
        .map(String::as_str)
        .filter(|m| !is_standard_method(m))
        .collect()
}

/// Rule 1: wallets with both inbound and outbound traffic look organic;
/// outbound-only (or inbound-only) wallets do not earn the bonus.
pub fn check_both_directions(summary: &ActivitySummary, config: &ScoringConfig) -> ScoreEntry {
    const NAME: &str = "Inbound And Outbound Activity";

    if summary.total_transactions == 0 {
        return entry(
            NAME,
            0.0,
            "No transaction data available to assess direction mix".to_string(),
        );
    }
    if summary.inbound_count > 0 && summary.outbound_count > 0 {
        entry(
            NAME,
            config.weight_both_directions,
            format!(
                "Wallet has {} inbound and {} outbound transactions",
                summary.inbound_count, summary.outbound_count
            ),
        )
    } else if summary.outbound_count > 0 {
        entry(
            NAME,
            0.0,
            format!(
                "Outbound-only activity: {} outbound, 0 inbound transactions",
                summary.outbound_count
            ),
        )
    } else {
        entry(
            NAME,
            0.0,
            format!(
                "Inbound-only activity: {} inbound, 0 outbound transactions",
                summary.inbound_count
            ),
        )
    }
}

/// Rule 2: transaction amounts are considered consistent when every
/// decoded method is a recognized standard one; custom or obfuscated
/// methods can hide erratic value flows.
pub fn check_amount_consistency(summary: &ActivitySummary, config: &ScoringConfig) -> ScoreEntry {
    const NAME: &str = "Transaction Amount Consistency";

    if summary.total_transactions == 0 {
        return entry(
            NAME,
            0.0,
            "No transaction data available to assess amount patterns".to_string(),
        );
    }

    let custom = custom_methods(summary);
    if custom.is_empty() {
        entry(
            NAME,
            config.weight_amount_consistency,
            format!(
                "Amounts across {} transactions follow recognized patterns ({})",
                summary.total_transactions,
                if summary.methods_used.is_empty() {
                    "plain transfers only".to_string()
                } else {
                    summary.methods_used.join(", ")
                }
            ),
        )
    } else {
        entry(
            NAME,
            0.0,
            format!(
                "Unrecognized methods obscure value flows: {}",
                custom.join(", ")
            ),
        )
    }
}

/// Rule 3: interaction with multiple distinct contracts/addresses.
pub fn check_multiple_counterparties(
    summary: &ActivitySummary,
    config: &ScoringConfig,
) -> ScoreEntry {
    const NAME: &str = "Counterparty Diversity";

    let count = summary.counterparties.len() as u32;
    if count >= config.min_counterparties {
        entry(
            NAME,
            config.weight_multiple_counterparties,
            format!("Wallet interacted with {} distinct counterparties", count),
        )
    } else if count == 1 {
        entry(
            NAME,
            0.0,
            format!(
                "All outbound activity targets a single counterparty ({})",
                summary.counterparties[0].address
            ),
        )
    } else {
        entry(
            NAME,
            0.0,
            "No outbound counterparties observed".to_string(),
        )
    }
}

/// Rule 4: a deliberate delay between funding and first spend.
/// Undeterminable when either side of the pair is missing.
pub fn check_spend_delay(summary: &ActivitySummary, config: &ScoringConfig) -> ScoreEntry {
    const NAME: &str = "Delay Before Spending";

    let (funded_at, spent_at) = match (summary.first_inbound_at, summary.first_outbound_at) {
        (Some(f), Some(s)) => (f, s),
        _ => {
            return entry(
                NAME,
                0.0,
                "Funding or first-spend transaction not found; delay undeterminable".to_string(),
            )
        }
    };

    let delay_secs = (spent_at - funded_at).num_seconds();
    if delay_secs >= config.min_spend_delay_secs {
        entry(
            NAME,
            config.weight_spend_delay,
            format!(
                "First spend occurred {} seconds after funding (threshold {})",
                delay_secs, config.min_spend_delay_secs
            ),
        )
    } else {
        entry(
            NAME,
            0.0,
            format!(
                "First spend occurred {} seconds after funding, below the {}-second threshold",
                delay_secs.max(0),
                config.min_spend_delay_secs
            ),
        )
    }
}

/// Rule 5: all interacted contracts are verified on the explorer.
pub fn check_verified_contracts(summary: &ActivitySummary, config: &ScoringConfig) -> ScoreEntry {
    const NAME: &str = "Contract Verification";

    let contracts: Vec<_> = summary
        .counterparties
        .iter()
        .filter(|c| c.is_contract)
        .collect();

    if contracts.is_empty() {
        return entry(
            NAME,
            0.0,
            "No contract interactions observed".to_string(),
        );
    }

    let unverified: Vec<&str> = contracts
        .iter()
        .filter(|c| !c.is_verified)
        .map(|c| c.address.as_str())
        .collect();

    if unverified.is_empty() {
        entry(
            NAME,
            config.weight_verified_contracts,
            format!(
                "All {} interacted contracts are verified",
                contracts.len()
            ),
        )
    } else {
        entry(
            NAME,
            0.0,
            format!("Unverified contracts involved: {}", unverified.join(", ")),
        )
    }
}

/// Rule 6: at least one interacted contract is publicly known (carries a
/// registered name on the explorer).
pub fn check_known_contracts(summary: &ActivitySummary, config: &ScoringConfig) -> ScoreEntry {
    const NAME: &str = "Known Contract Usage";

    let known: Vec<&str> = summary
        .counterparties
        .iter()
        .filter(|c| c.is_contract)
        .filter_map(|c| c.name.as_deref())
        .collect();

    if !known.is_empty() {
        entry(
            NAME,
            config.weight_known_contracts,
            format!("Publicly known contracts used: {}", known.join(", ")),
        )
    } else {
        entry(
            NAME,
            0.0,
            "No interaction with publicly known or widely used contracts".to_string(),
        )
    }
}

/// Rule 7: only standard method names, including at least one beyond a
/// bare transfer.
pub fn check_standard_methods(summary: &ActivitySummary, config: &ScoringConfig) -> ScoreEntry {
    const NAME: &str = "Standard Method Usage";

    if summary.methods_used.is_empty() {
        return entry(
            NAME,
            0.0,
            "No decoded method calls observed".to_string(),
        );
    }

    let custom = custom_methods(summary);
    let beyond_transfer: Vec<&str> = summary
        .methods_used
        .iter()
        .map(String::as_str)
        .filter(|m| *m != "transfer")
        .collect();

    if custom.is_empty() && !beyond_transfer.is_empty() {
        entry(
            NAME,
            config.weight_standard_methods,
            format!(
                "Only standard methods used, beyond bare transfer: {}",
                summary.methods_used.join(", ")
            ),
        )
    } else if !custom.is_empty() {
        entry(
            NAME,
            0.0,
            format!("Custom or obfuscated methods used: {}", custom.join(", ")),
        )
    } else {
        entry(
            NAME,
            0.0,
            "Only bare transfer calls observed".to_string(),
        )
    }
}

/// Rule 8: funded by an established wallet. The upstream contract for
/// funder history is undefined, so this resolves to zero until the
/// provider populates `funding_source.established`.
pub fn check_established_funder(summary: &ActivitySummary, config: &ScoringConfig) -> ScoreEntry {
    const NAME: &str = "Funded By Established Wallet";

    match &summary.funding_source {
        Some(source) if source.established => entry(
            NAME,
            config.weight_established_funder,
            format!("Funded by established wallet {}", source.address),
        ),
        Some(source) => entry(
            NAME,
            0.0,
            format!(
                "Funder {} history unavailable; cannot confirm established wallet",
                source.address
            ),
        ),
        None => entry(
            NAME,
            0.0,
            "No funding transaction found".to_string(),
        ),
    }
}

/// Rule 9: wallet age above the configured threshold.
pub fn check_wallet_age(summary: &ActivitySummary, config: &ScoringConfig) -> ScoreEntry {
    const NAME: &str = "Wallet Age";

    if summary.first_seen.is_none() {
        return entry(
            NAME,
            0.0,
            "No transaction history; wallet age unknown".to_string(),
        );
    }

    if summary.age_days >= config.min_wallet_age_days {
        entry(
            NAME,
            config.weight_wallet_age,
            format!(
                "Wallet is {} days old (threshold {} days)",
                summary.age_days, config.min_wallet_age_days
            ),
        )
    } else {
        entry(
            NAME,
            0.0,
            format!(
                "Wallet is only {} days old, below the {}-day threshold",
                summary.age_days, config.min_wallet_age_days
            ),
        )
    }
}

/// Rule 10: multiple distinct tokens used.
pub fn check_multiple_tokens(summary: &ActivitySummary, config: &ScoringConfig) -> ScoreEntry {
    const NAME: &str = "Token Diversity";

    if summary.unique_tokens_used >= config.min_tokens {
        entry(
            NAME,
            config.weight_multiple_tokens,
            format!("Wallet holds {} distinct tokens", summary.unique_tokens_used),
        )
    } else if summary.unique_tokens_used == 1 {
        entry(NAME, 0.0, "Only a single token involved".to_string())
    } else {
        entry(NAME, 0.0, "No token holdings found".to_string())
    }
}

/// Rule 11: smart-contract functions used beyond plain transfers.
pub fn check_contract_functions(summary: &ActivitySummary, config: &ScoringConfig) -> ScoreEntry {
    const NAME: &str = "Contract Function Usage";

    let beyond: Vec<&str> = summary
        .methods_used
        .iter()
        .map(String::as_str)
        .filter(|m| *m != "transfer")
        .collect();

    if !beyond.is_empty() {
        entry(
            NAME,
            config.weight_contract_functions,
            format!("Contract functions used beyond transfers: {}", beyond.join(", ")),
        )
    } else {
        entry(
            NAME,
            0.0,
            "Only plain transfers observed, no contract function usage".to_string(),
        )
    }
}

/// Rule 12: no known scam/mixer/flagged linkage. Awarded only when a
/// watchlist was loaded and came back clean; unknown is not clean.
pub fn check_clean_reputation(summary: &ActivitySummary, config: &ScoringConfig) -> ScoreEntry {
    const NAME: &str = "Flagged Entity Linkage";

    match summary.flagged_linkage {
        Some(false) => entry(
            NAME,
            config.weight_clean_reputation,
            format!(
                "No linkage to flagged entities across {} counterparties",
                summary.counterparties.len()
            ),
        ),
        Some(true) => entry(
            NAME,
            0.0,
            "Wallet or a counterparty is linked to a flagged entity".to_string(),
        ),
        None => entry(
            NAME,
            0.0,
            "No watchlist data available; linkage unknown".to_string(),
        ),
    }
}
