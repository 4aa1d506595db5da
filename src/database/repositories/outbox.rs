use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::database::{
    models::{EventEnvelope, OutboxMessage},
    store::OutboxStore,
    utils::sql,
};
use crate::error::AppError;

/// Insert an event into the outbox on the caller's connection, so it commits
/// together with the state change that produced it.
pub async fn enqueue(conn: &mut PgConnection, envelope: &EventEnvelope) -> Result<(), AppError> {
    let payload = serde_json::to_value(envelope)?;

    sqlx::query(&sql(r#"
        INSERT INTO
            event_outbox (id, event_type, payload, created_at)
        VALUES
            (?, ?, ?, ?)
    "#))
    .bind(envelope.id)
    .bind(envelope.event.event_type())
    .bind(payload)
    .bind(envelope.occurred_at)
    .execute(conn)
    .await?;

    Ok(())
}

#[derive(Clone)]
pub struct OutboxRepository {
    pool: PgPool,
}

impl OutboxRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OutboxStore for OutboxRepository {
    async fn claim_pending(
        &self,
        limit: i64,
        lease: Duration,
    ) -> Result<Vec<OutboxMessage>, AppError> {
        let mut messages = sqlx::query_as::<_, OutboxMessage>(&sql(r#"
            UPDATE event_outbox
            SET
                claimed_until = NOW() + make_interval(secs => ?)
            WHERE
                id IN (
                    SELECT
                        id
                    FROM
                        event_outbox
                    WHERE
                        dispatched_at IS NULL
                        AND (claimed_until IS NULL OR claimed_until < NOW())
                    ORDER BY
                        created_at ASC
                    LIMIT ?
                    FOR UPDATE SKIP LOCKED
                )
            RETURNING
                id,
                event_type,
                payload,
                attempts,
                last_error,
                created_at,
                dispatched_at
        "#))
        .bind(lease.as_secs_f64())
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        // RETURNING does not keep the subquery's order.
        messages.sort_by_key(|m| m.created_at);
        Ok(messages)
    }

    async fn mark_dispatched(&self, id: Uuid, at: DateTime<Utc>) -> Result<(), AppError> {
        sqlx::query(&sql(r#"
            UPDATE event_outbox
            SET
                dispatched_at = ?,
                attempts = attempts + 1,
                last_error = NULL
            WHERE
                id = ?
        "#))
        .bind(at)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn record_failure(&self, id: Uuid, error: &str) -> Result<(), AppError> {
        sqlx::query(&sql(r#"
            UPDATE event_outbox
            SET
                attempts = attempts + 1,
                last_error = ?,
                claimed_until = NULL
            WHERE
                id = ?
        "#))
        .bind(error)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn requeue_dispatched(
        &self,
        event_type: &str,
        since: DateTime<Utc>,
    ) -> Result<u64, AppError> {
        let result = sqlx::query(&sql(r#"
            UPDATE event_outbox
            SET
                dispatched_at = NULL,
                claimed_until = NULL
            WHERE
                event_type = ?
                AND dispatched_at >= ?
        "#))
        .bind(event_type)
        .bind(since)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}
