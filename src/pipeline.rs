use chrono::Utc;
use sqlx::PgPool;

use crate::chain::activity::build_activity_summary;
use crate::chain::client::ChainClient;
use crate::chain::types::{ProcessedTransaction, TokenHolding};
use crate::config::Config;
use crate::db::analyses;
use crate::entity::watchlist::WatchlistStore;
use crate::error::ApiError;
use crate::model::WalletAnalysis;
use crate::scoring::engine::ScoringEngine;

/// End-to-end analysis of one wallet: fetch explorer data, derive the
/// activity summary, score it, persist the result.
pub struct AnalysisPipeline {
    client: ChainClient,
    engine: ScoringEngine,
    watchlist: WatchlistStore,
    network: String,
}

impl AnalysisPipeline {
    pub fn new(config: &Config, watchlist: WatchlistStore) -> eyre::Result<Self> {
        Ok(Self {
            client: ChainClient::new(&config.network)?,
            engine: ScoringEngine::new(config.scoring.clone()),
            watchlist,
            network: config.network.name.clone(),
        })
    }

    /// Analyze `wallet_address` (already normalized) and store the
    /// outcome, replacing any previous record for the address.
    ///
    /// Explorer failures degrade to empty data so a flaky upstream
    /// still yields a stored zero-activity analysis.
    pub async fn analyze(
        &self,
        pool: &PgPool,
        wallet_address: &str,
    ) -> Result<WalletAnalysis, ApiError> {
        let transactions = self.fetch_transactions(wallet_address).await;
        let holdings = self.fetch_holdings(wallet_address).await;

        let linkage = self.watchlist.linkage(
            std::iter::once(wallet_address).chain(
                transactions
                    .iter()
                    .flat_map(|tx| [tx.from_address.as_str(), tx.to_address.as_str()]),
            ),
        );

        let summary = build_activity_summary(
            wallet_address,
            &transactions,
            &holdings,
            linkage,
            Utc::now(),
        );
        let outcome = self.engine.evaluate(&summary);

        tracing::info!(
            wallet = %wallet_address,
            final_score = outcome.final_score,
            risk_level = outcome.risk_level.as_str(),
            transactions = transactions.len(),
            "wallet analysis complete"
        );

        let record = WalletAnalysis {
            wallet_address: wallet_address.to_string(),
            network: self.network.clone(),
            analysis_timestamp: Utc::now(),
            scoring_breakdown: outcome.breakdown,
            wallet_metadata: outcome.metadata,
            behavioral_patterns: outcome.patterns,
            transactions: Some(transactions),
            token_holdings: Some(holdings),
            comments: if outcome.comments.is_empty() {
                None
            } else {
                Some(outcome.comments)
            },
            final_score: outcome.final_score,
            risk_level: outcome.risk_level,
            created_at: None,
            updated_at: None,
        };

        analyses::upsert(pool, &record).await
    }

    async fn fetch_transactions(&self, wallet_address: &str) -> Vec<ProcessedTransaction> {
        match self.client.fetch_transactions(wallet_address).await {
            Ok(transactions) => transactions,
            Err(err) => {
                tracing::error!(wallet = %wallet_address, error = %err, "transaction fetch failed, scoring with no activity");
                Vec::new()
            }
        }
    }

    async fn fetch_holdings(&self, wallet_address: &str) -> Vec<TokenHolding> {
        match self.client.fetch_token_holdings(wallet_address).await {
            Ok(holdings) => holdings,
            Err(err) => {
                tracing::error!(wallet = %wallet_address, error = %err, "token balance fetch failed, scoring with no holdings");
                Vec::new()
            }
        }
    }
}
