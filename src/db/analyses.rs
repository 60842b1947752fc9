use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;
use sqlx::PgPool;

use crate::error::ApiError;
use crate::model::WalletAnalysis;
use crate::scoring::types::RiskLevel;

const COLUMNS: &str = "id, wallet_address, network, analysis_timestamp, final_score, risk_level, \
     wallet_metadata, scoring_breakdown, behavioral_patterns, transactions, token_holdings, \
     comments, created_at, updated_at";

#[derive(Debug, sqlx::FromRow)]
struct AnalysisRow {
    #[allow(dead_code)]
    id: i64,
    wallet_address: String,
    network: String,
    analysis_timestamp: DateTime<Utc>,
    final_score: f64,
    risk_level: String,
    wallet_metadata: JsonValue,
    scoring_breakdown: JsonValue,
    behavioral_patterns: JsonValue,
    transactions: Option<JsonValue>,
    token_holdings: Option<JsonValue>,
    comments: Option<JsonValue>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<AnalysisRow> for WalletAnalysis {
    type Error = ApiError;

    fn try_from(row: AnalysisRow) -> Result<Self, ApiError> {
        let risk_level = RiskLevel::parse(&row.risk_level).ok_or_else(|| {
            ApiError::Internal(format!("stored risk_level '{}' is invalid", row.risk_level))
        })?;

        Ok(WalletAnalysis {
            wallet_address: row.wallet_address,
            network: row.network,
            analysis_timestamp: row.analysis_timestamp,
            scoring_breakdown: serde_json::from_value(row.scoring_breakdown)?,
            wallet_metadata: serde_json::from_value(row.wallet_metadata)?,
            behavioral_patterns: serde_json::from_value(row.behavioral_patterns)?,
            transactions: row.transactions.map(serde_json::from_value).transpose()?,
            token_holdings: row.token_holdings.map(serde_json::from_value).transpose()?,
            comments: row.comments.map(serde_json::from_value).transpose()?,
            final_score: row.final_score,
            risk_level,
            created_at: Some(row.created_at),
            updated_at: Some(row.updated_at),
        })
    }
}

/// Filters for the list endpoint. `limit` is capped by the handler.
#[derive(Debug, Default)]
pub struct AnalysisFilter {
    pub risk_level: Option<RiskLevel>,
    pub network: Option<String>,
    pub min_score: Option<f64>,
    pub max_score: Option<f64>,
    pub limit: i64,
    pub offset: i64,
}

fn push_filters<'a>(
    builder: &mut sqlx::QueryBuilder<'a, sqlx::Postgres>,
    filter: &'a AnalysisFilter,
) {
    if let Some(level) = filter.risk_level {
        builder.push(" AND risk_level = ").push_bind(level.as_str());
    }
    if let Some(network) = &filter.network {
        builder.push(" AND network = ").push_bind(network);
    }
    if let Some(min) = filter.min_score {
        builder.push(" AND final_score >= ").push_bind(min);
    }
    if let Some(max) = filter.max_score {
        builder.push(" AND final_score <= ").push_bind(max);
    }
}

/// Insert or fully replace the stored analysis for an address.
/// Single statement, so the overwrite is atomic; `created_at` is kept
/// on update and `updated_at` bumped. Returns the stored record.
pub async fn upsert(
    pool: &PgPool,
    record: &WalletAnalysis,
) -> Result<WalletAnalysis, ApiError> {
    let query = format!(
        "INSERT INTO wallet_analyses \
           (wallet_address, network, analysis_timestamp, final_score, risk_level, \
            wallet_metadata, scoring_breakdown, behavioral_patterns, transactions, \
            token_holdings, comments) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) \
         ON CONFLICT (wallet_address) DO UPDATE SET \
            network = EXCLUDED.network, \
            analysis_timestamp = EXCLUDED.analysis_timestamp, \
            final_score = EXCLUDED.final_score, \
            risk_level = EXCLUDED.risk_level, \
            wallet_metadata = EXCLUDED.wallet_metadata, \
            scoring_breakdown = EXCLUDED.scoring_breakdown, \
            behavioral_patterns = EXCLUDED.behavioral_patterns, \
            transactions = EXCLUDED.transactions, \
            token_holdings = EXCLUDED.token_holdings, \
            comments = EXCLUDED.comments, \
            updated_at = NOW() \
         RETURNING {}",
        COLUMNS
    );

    let row: AnalysisRow = sqlx::query_as(&query)
        .bind(&record.wallet_address)
        .bind(&record.network)
        .bind(record.analysis_timestamp)
        .bind(record.final_score)
        .bind(record.risk_level.as_str())
        .bind(serde_json::to_value(&record.wallet_metadata)?)
        .bind(serde_json::to_value(&record.scoring_breakdown)?)
        .bind(serde_json::to_value(&record.behavioral_patterns)?)
        .bind(
            record
                .transactions
                .as_ref()
                .map(serde_json::to_value)
                .transpose()?,
        )
        .bind(
            record
                .token_holdings
                .as_ref()
                .map(serde_json::to_value)
                .transpose()?,
        )
        .bind(record.comments.as_ref().map(serde_json::to_value).transpose()?)
        .fetch_one(pool)
        .await?;

    row.try_into()
}

/// Fetch the stored record for a normalized address.
pub async fn get(pool: &PgPool, address: &str) -> Result<Option<WalletAnalysis>, ApiError> {
    let query = format!(
        "SELECT {} FROM wallet_analyses WHERE wallet_address = $1",
        COLUMNS
    );
    let row: Option<AnalysisRow> = sqlx::query_as(&query)
        .bind(address)
        .fetch_optional(pool)
        .await?;

    row.map(TryInto::try_into).transpose()
}

/// Internal row id of a stored analysis, used to link proposals.
pub async fn get_id(pool: &PgPool, address: &str) -> Result<Option<i64>, ApiError> {
    let row: Option<(i64,)> =
        sqlx::query_as("SELECT id FROM wallet_analyses WHERE wallet_address = $1")
            .bind(address)
            .fetch_optional(pool)
            .await?;
    Ok(row.map(|(id,)| id))
}

/// Filtered, paginated listing. Returns the total matching count
/// alongside the requested page.
pub async fn list(
    pool: &PgPool,
    filter: &AnalysisFilter,
) -> Result<(i64, Vec<WalletAnalysis>), ApiError> {
    let mut count_builder: sqlx::QueryBuilder<sqlx::Postgres> =
        sqlx::QueryBuilder::new("SELECT COUNT(*) FROM wallet_analyses WHERE 1=1");
    push_filters(&mut count_builder, filter);
    let (total,): (i64,) = count_builder.build_query_as().fetch_one(pool).await?;

    let mut builder: sqlx::QueryBuilder<sqlx::Postgres> = sqlx::QueryBuilder::new(format!(
        "SELECT {} FROM wallet_analyses WHERE 1=1",
        COLUMNS
    ));
    push_filters(&mut builder, filter);
    builder
        .push(" ORDER BY updated_at DESC LIMIT ")
        .push_bind(filter.limit)
        .push(" OFFSET ")
        .push_bind(filter.offset);

    let rows: Vec<AnalysisRow> = builder.build_query_as().fetch_all(pool).await?;
    let records = rows
        .into_iter()
        .map(TryInto::try_into)
        .collect::<Result<Vec<_>, _>>()?;

    Ok((total, records))
}

/// Remove the record for an address. Idempotent: deleting an address
/// with no record is not an error; the flag says whether a row went away.
pub async fn delete(pool: &PgPool, address: &str) -> Result<bool, ApiError> {
    let result = sqlx::query("DELETE FROM wallet_analyses WHERE wallet_address = $1")
        .bind(address)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::types::{
        BehavioralPatterns, ContractUsage, ScoreEntry, WalletMetadata,
    };

    const WALLET: &str = "0xebe5f532f357d053aad4ca5e95d2ac1cb308091e";

    fn sample_record(final_score: f64) -> WalletAnalysis {
        WalletAnalysis {
            wallet_address: WALLET.to_string(),
            network: "lisk-sepolia".to_string(),
            analysis_timestamp: Utc::now(),
            scoring_breakdown: vec![ScoreEntry {
                criteria: "Inbound And Outbound Activity".to_string(),
                score_delta: final_score.min(15.0),
                reason: "wallet has both inbound and outbound transfers".to_string(),
            }],
            wallet_metadata: WalletMetadata {
                first_seen: None,
                last_seen: None,
                age_days: 0,
                total_transactions: 0,
                inbound_count: 0,
                outbound_count: 0,
                unique_tokens_used: 0,
                unique_contracts_interacted: 0,
                uses_only_transfers: false,
                all_contracts_verified: false,
                funded_by_established_wallet: false,
                linked_to_flagged_entity: false,
            },
            behavioral_patterns: BehavioralPatterns {
                outbound_only: false,
                transaction_anomalies: vec![],
                contract_usage: ContractUsage {
                    single_contract_usage: false,
                    unverified_contract_usage: false,
                },
            },
            transactions: None,
            token_holdings: None,
            comments: None,
            final_score,
            risk_level: RiskLevel::Medium,
            created_at: None,
            updated_at: None,
        }
    }

    #[sqlx::test]
    async fn test_upsert_overwrites_without_duplicating(
        pool: PgPool,
    ) -> Result<(), ApiError> {
        let first = upsert(&pool, &sample_record(50.0)).await?;
        let second = upsert(&pool, &sample_record(65.0)).await?;

        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM wallet_analyses")
            .fetch_one(&pool)
            .await?;
        assert_eq!(count, 1);
        assert_eq!(second.final_score, 65.0);
        assert_eq!(second.created_at, first.created_at);
        Ok(())
    }

    #[sqlx::test]
    async fn test_delete_is_idempotent(pool: PgPool) -> Result<(), ApiError> {
        upsert(&pool, &sample_record(50.0)).await?;

        assert!(delete(&pool, WALLET).await?);
        assert!(!delete(&pool, WALLET).await?);
        assert!(get(&pool, WALLET).await?.is_none());
        Ok(())
    }
}
