use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::{models::PrincipalRole, store::PrincipalDirectory, utils::sql};
use crate::error::AppError;

#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PrincipalDirectory for UserRepository {
    async fn find_principal_id(
        &self,
        email: &str,
        role: PrincipalRole,
    ) -> Result<Option<Uuid>, AppError> {
        let id = sqlx::query_scalar::<_, Uuid>(&sql(r#"
            SELECT
                id
            FROM
                users
            WHERE
                LOWER(email) = LOWER(?)
                AND role = ?
                AND NOT is_deleted
            ORDER BY
                created_at DESC
            LIMIT 1
        "#))
        .bind(email)
        .bind(role)
        .fetch_optional(&self.pool)
        .await?;

        Ok(id)
    }
}
