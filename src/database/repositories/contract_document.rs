use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::{
    models::{
        ContractStatus, DocumentClassification, EventEnvelope, ExpiringDocument,
        ExpiryTransition,
    },
    repositories::outbox,
    store::DocumentStore,
    transaction::DatabaseTransaction,
    utils::sql,
};
use crate::error::AppError;

#[derive(Clone)]
pub struct ContractDocumentRepository {
    pool: PgPool,
}

impl ContractDocumentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DocumentStore for ContractDocumentRepository {
    async fn find_due(&self, horizon: NaiveDate) -> Result<Vec<ExpiringDocument>, AppError> {
        let documents = sqlx::query_as::<_, ExpiringDocument>(&sql(r#"
            SELECT
                d.id,
                d.contract_id,
                c.status AS contract_status,
                d.contract_type,
                d.classification,
                d.end_date,
                d.principal_email,
                d.principal_id,
                d.document_name,
                d.updated_at
            FROM
                contract_documents d
            JOIN
                contracts c ON c.id = d.contract_id
            WHERE
                d.end_date <= ?
                AND NOT d.is_deleted
                AND NOT c.is_deleted
                AND c.status <> ?
            ORDER BY
                d.end_date,
                d.id
        "#))
        .bind(horizon)
        .bind(ContractStatus::Terminated)
        .fetch_all(&self.pool)
        .await?;

        Ok(documents)
    }

    async fn mark_near_expired(&self, document_id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query(&sql(r#"
            UPDATE contract_documents
            SET
                classification = ?,
                updated_at = ?
            WHERE
                id = ?
                AND classification <> ?
        "#))
        .bind(DocumentClassification::NearExpired)
        .bind(Utc::now())
        .bind(document_id)
        .bind(DocumentClassification::NearExpired)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn expire(
        &self,
        document_id: Uuid,
        contract_id: Uuid,
        cascade: &[EventEnvelope],
    ) -> Result<ExpiryTransition, AppError> {
        let cascade = cascade.to_vec();

        DatabaseTransaction::run(&self.pool, move |tx| {
            Box::pin(async move {
                let now = Utc::now();

                sqlx::query(&sql(r#"
                    UPDATE contract_documents
                    SET
                        classification = ?,
                        updated_at = ?
                    WHERE
                        id = ?
                "#))
                .bind(DocumentClassification::Expired)
                .bind(now)
                .bind(document_id)
                .execute(&mut **tx)
                .await?;

                // Row lock so two sweeps cannot both see the contract as unexpired.
                let status = sqlx::query_scalar::<_, ContractStatus>(&sql(r#"
                    SELECT
                        status
                    FROM
                        contracts
                    WHERE
                        id = ?
                    FOR UPDATE
                "#))
                .bind(contract_id)
                .fetch_optional(&mut **tx)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("Contract {} not found", contract_id)))?;

                let transition = status.expire();
                if transition.fires_cascade() {
                    sqlx::query(&sql(r#"
                        UPDATE contracts
                        SET
                            status = ?,
                            updated_at = ?
                        WHERE
                            id = ?
                    "#))
                    .bind(ContractStatus::Expired)
                    .bind(now)
                    .bind(contract_id)
                    .execute(&mut **tx)
                    .await?;

                    for envelope in &cascade {
                        outbox::enqueue(&mut **tx, envelope).await?;
                    }
                }

                Ok::<_, AppError>(transition)
            })
        })
        .await
    }
}
