use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use super::types::{ProcessedTransaction, TokenHolding};

/// A distinct address this wallet has sent value to or called.
#[derive(Debug, Clone)]
pub struct CounterpartyInfo {
    pub address: String,
    pub is_contract: bool,
    pub is_verified: bool,
    pub name: Option<String>,
}

/// Where the wallet's first inbound funds came from. The upstream data
/// contract for funder history is still undefined, so `established`
/// currently never gets populated by the explorer provider.
#[derive(Debug, Clone)]
pub struct FundingSource {
    pub address: String,
    pub established: bool,
}

/// Everything the scoring engine needs about a wallet, derived once from
/// explorer data. Pure data: the engine itself performs no I/O.
#[derive(Debug, Clone)]
pub struct ActivitySummary {
    pub wallet_address: String,
    pub total_transactions: u32,
    pub inbound_count: u32,
    pub outbound_count: u32,
    pub first_seen: Option<DateTime<Utc>>,
    pub last_seen: Option<DateTime<Utc>>,
    pub age_days: i64,
    pub first_inbound_at: Option<DateTime<Utc>>,
    pub first_outbound_at: Option<DateTime<Utc>>,
    /// Distinct outbound targets, ordered by address for determinism.
    pub counterparties: Vec<CounterpartyInfo>,
    pub unique_tokens_used: u32,
    /// Distinct decoded method names, sorted.
    pub methods_used: Vec<String>,
    pub funding_source: Option<FundingSource>,
    /// None = no watchlist data; Some(true) = linked to a flagged entity.
    pub flagged_linkage: Option<bool>,
}

impl ActivitySummary {
    pub fn empty(wallet_address: &str) -> Self {
        Self {
            wallet_address: wallet_address.to_string(),
            total_transactions: 0,
            inbound_count: 0,
            outbound_count: 0,
            first_seen: None,
            last_seen: None,
            age_days: 0,
            first_inbound_at: None,
            first_outbound_at: None,
            counterparties: Vec::new(),
            unique_tokens_used: 0,
            methods_used: Vec::new(),
            funding_source: None,
            flagged_linkage: None,
        }
    }

    pub fn has_activity(&self) -> bool {
        self.total_transactions > 0 || self.unique_tokens_used > 0
    }
}

/// Derive the scoring input from raw explorer data.
///
/// Direction is relative to `wallet_address` (case-insensitive).
/// `flagged_linkage` comes from the watchlist store; `now` is injected
/// so wallet age stays deterministic under test.
pub fn build_activity_summary(
    wallet_address: &str,
    transactions: &[ProcessedTransaction],
    holdings: &[TokenHolding],
    flagged_linkage: Option<bool>,
    now: DateTime<Utc>,
) -> ActivitySummary {
    let wallet = wallet_address.to_ascii_lowercase();

    let mut inbound_count = 0u32;
    let mut outbound_count = 0u32;
    let mut first_seen: Option<DateTime<Utc>> = None;
    let mut last_seen: Option<DateTime<Utc>> = None;
    let mut first_inbound_at: Option<DateTime<Utc>> = None;
    let mut first_outbound_at: Option<DateTime<Utc>> = None;
    let mut counterparties: BTreeMap<String, CounterpartyInfo> = BTreeMap::new();
    let mut methods: BTreeMap<String, ()> = BTreeMap::new();
    let mut funding_source: Option<FundingSource> = None;

    for tx in transactions {
        let from = tx.from_address.to_ascii_lowercase();
        let to = tx.to_address.to_ascii_lowercase();
        let is_outbound = from == wallet;
        let is_inbound = to == wallet;

        if !is_outbound && !is_inbound {
            continue;
        }

        first_seen = Some(first_seen.map_or(tx.timestamp, |t| t.min(tx.timestamp)));
        last_seen = Some(last_seen.map_or(tx.timestamp, |t| t.max(tx.timestamp)));

        if is_inbound {
            inbound_count += 1;
            let earlier = first_inbound_at.is_none_or(|t| tx.timestamp < t);
            if earlier {
                first_inbound_at = Some(tx.timestamp);
                // The funding wallet is known; whether it is "established"
                // is not, pending an upstream data source for funder history.
                funding_source = Some(FundingSource {
                    address: from.clone(),
                    established: false,
                });
            }
        }

        if is_outbound {
            outbound_count += 1;
            if first_outbound_at.is_none_or(|t| tx.timestamp < t) {
                first_outbound_at = Some(tx.timestamp);
            }
            if !to.is_empty() {
                counterparties.entry(to.clone()).or_insert(CounterpartyInfo {
                    address: to,
                    is_contract: tx.to_is_contract,
                    is_verified: tx.to_is_verified,
                    name: tx.to_name.clone(),
                });
            }
            if let Some(method) = &tx.method {
                methods.entry(method.to_ascii_lowercase()).or_insert(());
            }
        }
    }

    let age_days = first_seen
        .map(|seen| (now - seen).num_days().max(0))
        .unwrap_or(0);

    let mut tokens: Vec<&str> = holdings
        .iter()
        .filter_map(|h| h.symbol.as_deref().or(h.name.as_deref()))
        .collect();
    tokens.sort_unstable();
    tokens.dedup();

    ActivitySummary {
        wallet_address: wallet,
        total_transactions: inbound_count + outbound_count,
        inbound_count,
        outbound_count,
        first_seen,
        last_seen,
        age_days,
        first_inbound_at,
        first_outbound_at,
        counterparties: counterparties.into_values().collect(),
        unique_tokens_used: tokens.len() as u32,
        methods_used: methods.into_keys().collect(),
        funding_source,
        flagged_linkage,
    }
}

#[cfg(test)]
pub mod test_fixtures {
    use super::*;
    use chrono::TimeZone;

    pub const WALLET: &str = "0xebe5f532f357d053aad4ca5e95d2ac1cb308091e";
    pub const FUNDER: &str = "0x1111111111111111111111111111111111111111";
    pub const CONTRACT: &str = "0x2222222222222222222222222222222222222222";

    pub fn ts(offset_secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + offset_secs, 0).unwrap()
    }

    pub fn tx(
        from: &str,
        to: &str,
        method: Option<&str>,
        at: DateTime<Utc>,
        verified_contract: bool,
    ) -> ProcessedTransaction {
        ProcessedTransaction {
            tx_hash: format!("0x{:064x}", at.timestamp()),
            timestamp: at,
            block_number: 1,
            status: "ok".into(),
            from_address: from.into(),
            to_address: to.into(),
            from_is_contract: false,
            to_is_contract: to == CONTRACT,
            to_is_verified: verified_contract && to == CONTRACT,
            to_name: None,
            method: method.map(String::from),
            value_wei: "1000000000000000000".into(),
        }
    }

    pub fn holding(symbol: &str) -> TokenHolding {
        TokenHolding {
            name: Some(symbol.to_string()),
            symbol: Some(symbol.to_string()),
            token_type: Some("ERC-20".into()),
            balance: "1000000".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_fixtures::*;
    use super::*;

    #[test]
    fn test_empty_summary() {
        let summary = build_activity_summary(WALLET, &[], &[], None, ts(0));
        assert!(!summary.has_activity());
        assert_eq!(summary.total_transactions, 0);
        assert_eq!(summary.age_days, 0);
        assert!(summary.first_seen.is_none());
        assert!(summary.funding_source.is_none());
    }

    #[test]
    fn test_direction_split_and_counterparties() {
        let txs = vec![
            tx(FUNDER, WALLET, None, ts(0), false),
            tx(WALLET, CONTRACT, Some("transfer"), ts(60), true),
            tx(WALLET, CONTRACT, Some("swap"), ts(120), true),
        ];
        let summary = build_activity_summary(WALLET, &txs, &[holding("USDC")], None, ts(3600));

        assert_eq!(summary.inbound_count, 1);
        assert_eq!(summary.outbound_count, 2);
        assert_eq!(summary.total_transactions, 3);
        // Single distinct outbound target, even with two calls
        assert_eq!(summary.counterparties.len(), 1);
        assert!(summary.counterparties[0].is_contract);
        assert!(summary.counterparties[0].is_verified);
        assert_eq!(summary.methods_used, vec!["swap", "transfer"]);
        assert_eq!(summary.unique_tokens_used, 1);
        assert_eq!(summary.first_inbound_at, Some(ts(0)));
        assert_eq!(summary.first_outbound_at, Some(ts(60)));
        assert_eq!(summary.funding_source.as_ref().unwrap().address, FUNDER);
    }

    #[test]
    fn test_age_from_first_seen() {
        let txs = vec![tx(FUNDER, WALLET, None, ts(0), false)];
        let ten_days = 10 * 24 * 3600;
        let summary = build_activity_summary(WALLET, &txs, &[], None, ts(ten_days));
        assert_eq!(summary.age_days, 10);
    }

    #[test]
    fn test_case_insensitive_wallet_match() {
        let txs = vec![tx(FUNDER, &WALLET.to_uppercase().replace("0X", "0x"), None, ts(0), false)];
        let summary = build_activity_summary(WALLET, &txs, &[], None, ts(0));
        assert_eq!(summary.inbound_count, 1);
    }

    #[test]
    fn test_unrelated_transactions_ignored() {
        let txs = vec![tx(FUNDER, CONTRACT, Some("transfer"), ts(0), true)];
        let summary = build_activity_summary(WALLET, &txs, &[], None, ts(0));
        assert_eq!(summary.total_transactions, 0);
    }

    #[test]
    fn test_token_dedup() {
        let holdings = vec![holding("USDC"), holding("USDC"), holding("DAI")];
        let summary = build_activity_summary(WALLET, &[], &holdings, None, ts(0));
        assert_eq!(summary.unique_tokens_used, 2);
    }
}
