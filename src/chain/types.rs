use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================
// Explorer wire format (Blockscout v2)
// ============================================================

#[derive(Debug, Clone, Deserialize)]
pub struct AddressInfo {
    pub hash: String,
    #[serde(default)]
    pub is_contract: bool,
    #[serde(default)]
    pub is_verified: Option<bool>,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DecodedInput {
    pub method_call: String,
    #[serde(default)]
    pub method_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiTransaction {
    pub hash: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub block_number: i64,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub transaction_types: Vec<String>,
    pub from: AddressInfo,
    #[serde(default)]
    pub to: Option<AddressInfo>,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub decoded_input: Option<DecodedInput>,
    #[serde(default)]
    pub value: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TransactionsPage {
    #[serde(default)]
    pub items: Vec<ApiTransaction>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TokenInfo {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default, rename = "type")]
    pub token_type: Option<String>,
    #[serde(default)]
    pub decimals: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TokenBalance {
    pub token: TokenInfo,
    #[serde(default)]
    pub value: Option<String>,
}

// ============================================================
// Normalized shapes persisted with the analysis
// ============================================================

/// The slice of an explorer transaction the scoring pipeline keeps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessedTransaction {
    pub tx_hash: String,
    pub timestamp: DateTime<Utc>,
    pub block_number: i64,
    pub status: String,
    pub from_address: String,
    pub to_address: String,
    pub from_is_contract: bool,
    pub to_is_contract: bool,
    pub to_is_verified: bool,
    pub to_name: Option<String>,
    pub method: Option<String>,
    /// Native value in wei, as a decimal string (values overflow u64).
    pub value_wei: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenHolding {
    pub name: Option<String>,
    pub symbol: Option<String>,
    pub token_type: Option<String>,
    pub balance: String,
}

impl From<TokenBalance> for TokenHolding {
    fn from(b: TokenBalance) -> Self {
        Self {
            name: b.token.name,
            symbol: b.token.symbol,
            token_type: b.token.token_type,
            balance: b.value.unwrap_or_else(|| "0".to_string()),
        }
    }
}

/// Flatten an explorer transaction. Contract creations have no `to`;
/// those are treated as contract interactions with an empty address.
pub fn process_transaction(tx: ApiTransaction) -> ProcessedTransaction {
    let method = tx
        .method
        .or_else(|| tx.decoded_input.map(|d| d.method_call))
        .map(|m| {
            // "transfer(address,uint256)" and "transfer" both normalize to "transfer"
            m.split('(').next().unwrap_or_default().trim().to_string()
        })
        .filter(|m| !m.is_empty());

    let (to_address, to_is_contract, to_is_verified, to_name) = match tx.to {
        Some(to) => (
            to.hash,
            to.is_contract,
            to.is_verified.unwrap_or(false),
            to.name,
        ),
        None => (String::new(), true, false, None),
    };

    ProcessedTransaction {
        tx_hash: tx.hash,
        timestamp: tx.timestamp,
        block_number: tx.block_number,
        status: tx.status.unwrap_or_else(|| "unknown".to_string()),
        from_address: tx.from.hash,
        to_address,
        from_is_contract: tx.from.is_contract,
        to_is_contract,
        to_is_verified,
        to_name,
        method,
        value_wei: tx.value.unwrap_or_else(|| "0".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api_tx(method: Option<&str>) -> ApiTransaction {
        ApiTransaction {
            hash: "0xabc".into(),
            timestamp: Utc::now(),
            block_number: 100,
            status: Some("ok".into()),
            transaction_types: vec!["coin_transfer".into()],
            from: AddressInfo {
                hash: "0x1111111111111111111111111111111111111111".into(),
                is_contract: false,
                is_verified: None,
                name: None,
            },
            to: Some(AddressInfo {
                hash: "0x2222222222222222222222222222222222222222".into(),
                is_contract: true,
                is_verified: Some(true),
                name: Some("SomeRouter".into()),
            }),
            method: method.map(String::from),
            decoded_input: None,
            value: Some("1000000000000000000".into()),
        }
    }

    #[test]
    fn test_process_transaction_normalizes_method() {
        let tx = process_transaction(api_tx(Some("transfer(address,uint256)")));
        assert_eq!(tx.method.as_deref(), Some("transfer"));
        assert!(tx.to_is_contract);
        assert!(tx.to_is_verified);
        assert_eq!(tx.to_name.as_deref(), Some("SomeRouter"));
    }

    #[test]
    fn test_process_transaction_without_method() {
        let tx = process_transaction(api_tx(None));
        assert_eq!(tx.method, None);
        assert_eq!(tx.value_wei, "1000000000000000000");
    }

    #[test]
    fn test_contract_creation_has_no_to() {
        let mut raw = api_tx(None);
        raw.to = None;
        let tx = process_transaction(raw);
        assert!(tx.to_address.is_empty());
        assert!(tx.to_is_contract);
        assert!(!tx.to_is_verified);
    }
}
