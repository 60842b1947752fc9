use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::ApiError;

const COLUMNS: &str = "id, proposer_wallet, company_name, logo, accepted_token, \
     short_description, full_description, business_plan, expected_return, duration, \
     minimum_investment, maximum_investment, target_funding, current_funding, total_pooled, \
     investor_count, status, website, social_media, documents, tags, wallet_analysis_id, \
     proposed_at, deadline, created_at, updated_at";

/// A funding proposal published by an analyzed wallet. Monetary fields
/// are kept as strings so the API never re-renders client amounts.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct BusinessProposal {
    pub id: String,
    pub proposer_wallet: String,
    pub company_name: String,
    pub logo: Option<String>,
    pub accepted_token: Option<String>,
    pub short_description: String,
    pub full_description: Option<String>,
    pub business_plan: Option<String>,
    pub expected_return: Option<String>,
    pub duration: Option<String>,
    pub minimum_investment: Option<String>,
    pub maximum_investment: Option<String>,
    pub target_funding: Option<String>,
    pub current_funding: Option<String>,
    pub total_pooled: Option<String>,
    pub investor_count: i32,
    pub status: String,
    pub website: Option<String>,
    pub social_media: Option<JsonValue>,
    pub documents: Option<JsonValue>,
    pub tags: Option<Vec<String>>,
    pub wallet_analysis_id: Option<i64>,
    pub proposed_at: DateTime<Utc>,
    pub deadline: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Client-supplied proposal content, shared by create and update.
#[derive(Debug, Clone, Deserialize)]
pub struct ProposalInput {
    pub company_name: String,
    pub logo: Option<String>,
    pub accepted_token: Option<String>,
    pub short_description: String,
    pub full_description: Option<String>,
    pub business_plan: Option<String>,
    pub expected_return: Option<String>,
    pub duration: Option<String>,
    pub minimum_investment: Option<String>,
    pub maximum_investment: Option<String>,
    pub target_funding: Option<String>,
    pub website: Option<String>,
    pub social_media: Option<JsonValue>,
    pub documents: Option<JsonValue>,
    pub tags: Option<Vec<String>>,
    pub deadline: Option<DateTime<Utc>>,
}

impl ProposalInput {
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.company_name.trim().is_empty() {
            return Err(ApiError::Validation("company_name is required".into()));
        }
        if self.short_description.trim().is_empty() {
            return Err(ApiError::Validation("short_description is required".into()));
        }
        Ok(())
    }
}

/// One attachment on a proposal, stored inside the `documents` JSONB
/// array. Mutated only through `add_document` / `remove_document`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProposalDocument {
    pub id: String,
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub document_type: Option<String>,
    pub uploaded_at: DateTime<Utc>,
}

/// Client-supplied attachment content.
#[derive(Debug, Clone, Deserialize)]
pub struct DocumentInput {
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub document_type: Option<String>,
}

impl DocumentInput {
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.name.trim().is_empty() {
            return Err(ApiError::Validation("document name is required".into()));
        }
        if self.url.trim().is_empty() {
            return Err(ApiError::Validation("document url is required".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct ProposalFilter {
    pub status: Option<String>,
    pub limit: i64,
    pub offset: i64,
}

/// Short opaque id, stable across the proposal's lifetime.
fn new_proposal_id() -> String {
    let raw = Uuid::new_v4().simple().to_string();
    format!("prop-{}", &raw[..6])
}

pub fn new_document_id() -> String {
    let raw = Uuid::new_v4().simple().to_string();
    format!("doc-{}", &raw[..6])
}

/// Insert a new proposal for the wallet. The one-per-wallet rule is
/// the table's UNIQUE constraint; a violation surfaces as a conflict.
pub async fn create(
    pool: &PgPool,
    proposer_wallet: &str,
    input: &ProposalInput,
    wallet_analysis_id: Option<i64>,
) -> Result<BusinessProposal, ApiError> {
    let query = format!(
        "INSERT INTO business_proposals \
           (id, proposer_wallet, company_name, logo, accepted_token, short_description, \
            full_description, business_plan, expected_return, duration, minimum_investment, \
            maximum_investment, target_funding, website, social_media, documents, tags, \
            wallet_analysis_id, deadline) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, \
                 $17, $18, $19) \
         RETURNING {}",
        COLUMNS
    );

    let result = sqlx::query_as::<_, BusinessProposal>(&query)
        .bind(new_proposal_id())
        .bind(proposer_wallet)
        .bind(&input.company_name)
        .bind(&input.logo)
        .bind(&input.accepted_token)
        .bind(&input.short_description)
        .bind(&input.full_description)
        .bind(&input.business_plan)
        .bind(&input.expected_return)
        .bind(&input.duration)
        .bind(&input.minimum_investment)
        .bind(&input.maximum_investment)
        .bind(&input.target_funding)
        .bind(&input.website)
        .bind(&input.social_media)
        .bind(&input.documents)
        .bind(&input.tags)
        .bind(wallet_analysis_id)
        .bind(input.deadline)
        .fetch_one(pool)
        .await;

    match result {
        Ok(proposal) => Ok(proposal),
        Err(sqlx::Error::Database(db)) if db.is_unique_violation() => Err(ApiError::Conflict(
            "wallet already has an active proposal".into(),
        )),
        Err(err) => Err(err.into()),
    }
}

pub async fn get(pool: &PgPool, id: &str) -> Result<Option<BusinessProposal>, ApiError> {
    let query = format!("SELECT {} FROM business_proposals WHERE id = $1", COLUMNS);
    let proposal = sqlx::query_as::<_, BusinessProposal>(&query)
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(proposal)
}

pub async fn get_by_wallet(
    pool: &PgPool,
    proposer_wallet: &str,
) -> Result<Option<BusinessProposal>, ApiError> {
    let query = format!(
        "SELECT {} FROM business_proposals WHERE proposer_wallet = $1",
        COLUMNS
    );
    let proposal = sqlx::query_as::<_, BusinessProposal>(&query)
        .bind(proposer_wallet)
        .fetch_optional(pool)
        .await?;

    Ok(proposal)
}

pub async fn list(
    pool: &PgPool,
    filter: &ProposalFilter,
) -> Result<(i64, Vec<BusinessProposal>), ApiError> {
    let mut count_builder: sqlx::QueryBuilder<sqlx::Postgres> =
        sqlx::QueryBuilder::new("SELECT COUNT(*) FROM business_proposals WHERE 1=1");
    if let Some(status) = &filter.status {
        count_builder.push(" AND status = ").push_bind(status);
    }
    let (total,): (i64,) = count_builder.build_query_as().fetch_one(pool).await?;

    let mut builder: sqlx::QueryBuilder<sqlx::Postgres> = sqlx::QueryBuilder::new(format!(
        "SELECT {} FROM business_proposals WHERE 1=1",
        COLUMNS
    ));
    if let Some(status) = &filter.status {
        builder.push(" AND status = ").push_bind(status);
    }
    builder
        .push(" ORDER BY proposed_at DESC LIMIT ")
        .push_bind(filter.limit)
        .push(" OFFSET ")
        .push_bind(filter.offset);

    let proposals: Vec<BusinessProposal> = builder.build_query_as().fetch_all(pool).await?;

    Ok((total, proposals))
}

/// Replace the editable content of a proposal. The WHERE clause pins
/// ownership, so a non-owner update matches no row.
pub async fn update(
    pool: &PgPool,
    id: &str,
    proposer_wallet: &str,
    input: &ProposalInput,
) -> Result<Option<BusinessProposal>, ApiError> {
    let query = format!(
        "UPDATE business_proposals SET \
            company_name = $3, logo = $4, accepted_token = $5, short_description = $6, \
            full_description = $7, business_plan = $8, expected_return = $9, duration = $10, \
            minimum_investment = $11, maximum_investment = $12, target_funding = $13, \
            website = $14, social_media = $15, documents = $16, tags = $17, deadline = $18, \
            updated_at = NOW() \
         WHERE id = $1 AND proposer_wallet = $2 \
         RETURNING {}",
        COLUMNS
    );

    let proposal = sqlx::query_as::<_, BusinessProposal>(&query)
        .bind(id)
        .bind(proposer_wallet)
        .bind(&input.company_name)
        .bind(&input.logo)
        .bind(&input.accepted_token)
        .bind(&input.short_description)
        .bind(&input.full_description)
        .bind(&input.business_plan)
        .bind(&input.expected_return)
        .bind(&input.duration)
        .bind(&input.minimum_investment)
        .bind(&input.maximum_investment)
        .bind(&input.target_funding)
        .bind(&input.website)
        .bind(&input.social_media)
        .bind(&input.documents)
        .bind(&input.tags)
        .bind(input.deadline)
        .fetch_optional(pool)
        .await?;

    Ok(proposal)
}

/// Append a document to the proposal's JSONB array. Ownership is
/// pinned by the WHERE clause; a non-owner append matches no row.
pub async fn add_document(
    pool: &PgPool,
    id: &str,
    proposer_wallet: &str,
    document: &ProposalDocument,
) -> Result<bool, ApiError> {
    let result = sqlx::query(
        "UPDATE business_proposals SET \
            documents = COALESCE(documents, '[]'::jsonb) || jsonb_build_array($3::jsonb), \
            updated_at = NOW() \
         WHERE id = $1 AND proposer_wallet = $2",
    )
    .bind(id)
    .bind(proposer_wallet)
    .bind(serde_json::to_value(document)?)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Remove a document by id. The containment check in the WHERE clause
/// makes removal of an absent document report false, same as a
/// non-owner or missing proposal.
pub async fn remove_document(
    pool: &PgPool,
    id: &str,
    proposer_wallet: &str,
    document_id: &str,
) -> Result<bool, ApiError> {
    let result = sqlx::query(
        "UPDATE business_proposals SET \
            documents = ( \
                SELECT COALESCE(jsonb_agg(doc), '[]'::jsonb) \
                FROM jsonb_array_elements(COALESCE(documents, '[]'::jsonb)) doc \
                WHERE doc->>'id' <> $3 \
            ), \
            updated_at = NOW() \
         WHERE id = $1 AND proposer_wallet = $2 \
           AND COALESCE(documents, '[]'::jsonb) \
               @> jsonb_build_array(jsonb_build_object('id', $3::text))",
    )
    .bind(id)
    .bind(proposer_wallet)
    .bind(document_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Every distinct tag in use across proposals, sorted.
pub async fn list_tags(pool: &PgPool) -> Result<Vec<String>, ApiError> {
    let rows: Vec<(String,)> = sqlx::query_as(
        "SELECT DISTINCT tag FROM business_proposals \
         CROSS JOIN LATERAL unnest(tags) AS tag ORDER BY tag",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(|(tag,)| tag).collect())
}

pub async fn delete(
    pool: &PgPool,
    id: &str,
    proposer_wallet: &str,
) -> Result<bool, ApiError> {
    let result =
        sqlx::query("DELETE FROM business_proposals WHERE id = $1 AND proposer_wallet = $2")
            .bind(id)
            .bind(proposer_wallet)
            .execute(pool)
            .await?;

    Ok(result.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_input() -> ProposalInput {
        ProposalInput {
            company_name: "Acme Labs".into(),
            logo: None,
            accepted_token: None,
            short_description: "On-chain widgets".into(),
            full_description: None,
            business_plan: None,
            expected_return: None,
            duration: None,
            minimum_investment: None,
            maximum_investment: None,
            target_funding: None,
            website: None,
            social_media: None,
            documents: None,
            tags: Some(vec!["defi".into(), "infrastructure".into()]),
            deadline: None,
        }
    }

    fn sample_document() -> ProposalDocument {
        ProposalDocument {
            id: new_document_id(),
            name: "Pitch deck".into(),
            url: "https://example.com/deck.pdf".into(),
            document_type: Some("pdf".into()),
            uploaded_at: Utc::now(),
        }
    }

    #[test]
    fn test_proposal_ids_are_short_and_unique() {
        let a = new_proposal_id();
        let b = new_proposal_id();
        assert!(a.starts_with("prop-"));
        assert_eq!(a.len(), "prop-".len() + 6);
        assert_ne!(a, b);
    }

    #[test]
    fn test_document_ids_are_short_and_unique() {
        let a = new_document_id();
        let b = new_document_id();
        assert!(a.starts_with("doc-"));
        assert_eq!(a.len(), "doc-".len() + 6);
        assert_ne!(a, b);
    }

    #[test]
    fn test_document_input_validation() {
        let input = DocumentInput {
            name: "Report".into(),
            url: "  ".into(),
            document_type: None,
        };
        assert!(input.validate().is_err());
    }

    #[sqlx::test]
    async fn test_document_attach_and_detach(pool: PgPool) -> Result<(), ApiError> {
        let wallet = "0xebe5f532f357d053aad4ca5e95d2ac1cb308091e";
        let proposal = create(&pool, wallet, &sample_input(), None).await?;
        let doc = sample_document();

        assert!(add_document(&pool, &proposal.id, wallet, &doc).await?);

        let stored = get(&pool, &proposal.id)
            .await?
            .and_then(|p| p.documents)
            .unwrap_or_default();
        let items = stored.as_array().cloned().unwrap_or_default();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["id"], serde_json::json!(doc.id));

        assert!(remove_document(&pool, &proposal.id, wallet, &doc.id).await?);
        assert!(!remove_document(&pool, &proposal.id, wallet, &doc.id).await?);
        Ok(())
    }

    #[sqlx::test]
    async fn test_document_mutation_requires_owner(pool: PgPool) -> Result<(), ApiError> {
        let wallet = "0xebe5f532f357d053aad4ca5e95d2ac1cb308091e";
        let other = "0x1111111111111111111111111111111111111111";
        let proposal = create(&pool, wallet, &sample_input(), None).await?;

        assert!(!add_document(&pool, &proposal.id, other, &sample_document()).await?);
        Ok(())
    }

    #[sqlx::test]
    async fn test_tags_are_distinct_and_sorted(pool: PgPool) -> Result<(), ApiError> {
        let wallet = "0xebe5f532f357d053aad4ca5e95d2ac1cb308091e";
        create(&pool, wallet, &sample_input(), None).await?;

        let tags = list_tags(&pool).await?;
        assert_eq!(tags, vec!["defi".to_string(), "infrastructure".to_string()]);
        Ok(())
    }

    #[test]
    fn test_input_validation() {
        let input = ProposalInput {
            company_name: "Acme Labs".into(),
            logo: None,
            accepted_token: None,
            short_description: "  ".into(),
            full_description: None,
            business_plan: None,
            expected_return: None,
            duration: None,
            minimum_investment: None,
            maximum_investment: None,
            target_funding: None,
            website: None,
            social_media: None,
            documents: None,
            tags: None,
            deadline: None,
        };
        assert!(input.validate().is_err());
    }
}
