use std::time::Duration;

use thiserror::Error;

use crate::config::NetworkConfig;

use super::types::{
    process_transaction, ProcessedTransaction, TokenBalance, TokenHolding, TransactionsPage,
};

#[derive(Debug, Error)]
pub enum ChainError {
    #[error("explorer request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("explorer returned status {0} for {1}")]
    Status(u16, String),
}

/// Read-only client for a Blockscout v2 explorer API.
///
/// Failures here are non-fatal to the analysis pipeline: callers degrade
/// to empty activity data and the scoring engine records the gaps.
#[derive(Clone)]
pub struct ChainClient {
    http: reqwest::Client,
    base_url: String,
}

impl ChainClient {
    pub fn new(config: &NetworkConfig) -> eyre::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| eyre::eyre!("Failed to build explorer HTTP client: {}", e))?;

        Ok(Self {
            http,
            base_url: config.explorer_url.trim_end_matches('/').to_string(),
        })
    }

    /// Fetch the most recent transactions touching `address`.
    pub async fn fetch_transactions(
        &self,
        address: &str,
    ) -> Result<Vec<ProcessedTransaction>, ChainError> {
        let url = format!("{}/addresses/{}/transactions", self.base_url, address);
        let response = self.http.get(&url).send().await?;

        // An address the explorer has never seen returns 404, which is
        // simply "no activity", not an upstream failure.
        if response.status().as_u16() == 404 {
            return Ok(Vec::new());
        }
        if !response.status().is_success() {
            return Err(ChainError::Status(response.status().as_u16(), url));
        }

        let page: TransactionsPage = response.json().await?;
        let transactions: Vec<ProcessedTransaction> =
            page.items.into_iter().map(process_transaction).collect();

        tracing::debug!(
            address,
            count = transactions.len(),
            "Fetched transactions from explorer"
        );
        Ok(transactions)
    }

    /// Fetch current token balances for `address`.
    pub async fn fetch_token_holdings(
        &self,
        address: &str,
    ) -> Result<Vec<TokenHolding>, ChainError> {
        let url = format!("{}/addresses/{}/token-balances", self.base_url, address);
        let response = self.http.get(&url).send().await?;

        if response.status().as_u16() == 404 {
            return Ok(Vec::new());
        }
        if !response.status().is_success() {
            return Err(ChainError::Status(response.status().as_u16(), url));
        }

        let balances: Vec<TokenBalance> = response.json().await?;
        let holdings: Vec<TokenHolding> = balances.into_iter().map(TokenHolding::from).collect();

        tracing::debug!(
            address,
            count = holdings.len(),
            "Fetched token holdings from explorer"
        );
        Ok(holdings)
    }
}
