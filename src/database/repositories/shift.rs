use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::{models::Shift, store::ShiftStore, utils::sql};
use crate::error::AppError;

const SHIFT_COLUMNS: &str = r#"
    id,
    location_id,
    contract_id,
    template_id,
    shift_date,
    start_time,
    end_time,
    duration_hours,
    break_minutes,
    required_guards,
    assigned_guards,
    description,
    version,
    is_deleted,
    created_at,
    updated_at
"#;

#[derive(Clone)]
pub struct ShiftRepository {
    pool: PgPool,
}

impl ShiftRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ShiftStore for ShiftRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Shift>, AppError> {
        let shift = sqlx::query_as::<_, Shift>(&sql(&format!(
            "SELECT {} FROM shifts WHERE id = ? AND NOT is_deleted",
            SHIFT_COLUMNS
        )))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(shift)
    }

    async fn find_by_location_and_dates(
        &self,
        location_id: Uuid,
        from_date: NaiveDate,
        to_date: NaiveDate,
        exclude_shift_id: Option<Uuid>,
    ) -> Result<Vec<Shift>, AppError> {
        let shifts = sqlx::query_as::<_, Shift>(&sql(&format!(
            r#"
            SELECT {}
            FROM
                shifts
            WHERE
                location_id = ?
                AND shift_date BETWEEN ? AND ?
                AND NOT is_deleted
                AND (?::UUID IS NULL OR id <> ?)
            ORDER BY
                start_time
            "#,
            SHIFT_COLUMNS
        )))
        .bind(location_id)
        .bind(from_date)
        .bind(to_date)
        .bind(exclude_shift_id)
        .bind(exclude_shift_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(shifts)
    }

    async fn insert(&self, shift: &Shift) -> Result<Shift, AppError> {
        let created = sqlx::query_as::<_, Shift>(&sql(&format!(
            r#"
            INSERT INTO
                shifts (
                    id, location_id, contract_id, template_id, shift_date,
                    start_time, end_time, duration_hours, break_minutes,
                    required_guards, assigned_guards, description, version,
                    is_deleted, created_at, updated_at
                )
            VALUES
                (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, FALSE, ?, ?)
            RETURNING {}
            "#,
            SHIFT_COLUMNS
        )))
        .bind(shift.id)
        .bind(shift.location_id)
        .bind(shift.contract_id)
        .bind(shift.template_id)
        .bind(shift.shift_date)
        .bind(shift.start_time)
        .bind(shift.end_time)
        .bind(shift.duration_hours)
        .bind(shift.break_minutes)
        .bind(shift.required_guards)
        .bind(shift.assigned_guards)
        .bind(&shift.description)
        .bind(shift.version)
        .bind(shift.created_at)
        .bind(shift.updated_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    async fn update_versioned(
        &self,
        shift: &Shift,
        expected_version: i32,
    ) -> Result<Option<Shift>, AppError> {
        let updated = sqlx::query_as::<_, Shift>(&sql(&format!(
            r#"
            UPDATE shifts
            SET
                location_id = ?,
                contract_id = ?,
                template_id = ?,
                shift_date = ?,
                start_time = ?,
                end_time = ?,
                duration_hours = ?,
                break_minutes = ?,
                required_guards = ?,
                description = ?,
                version = version + 1,
                updated_at = ?
            WHERE
                id = ?
                AND version = ?
                AND NOT is_deleted
            RETURNING {}
            "#,
            SHIFT_COLUMNS
        )))
        .bind(shift.location_id)
        .bind(shift.contract_id)
        .bind(shift.template_id)
        .bind(shift.shift_date)
        .bind(shift.start_time)
        .bind(shift.end_time)
        .bind(shift.duration_hours)
        .bind(shift.break_minutes)
        .bind(shift.required_guards)
        .bind(&shift.description)
        .bind(Utc::now())
        .bind(shift.id)
        .bind(expected_version)
        .fetch_optional(&self.pool)
        .await?;

        Ok(updated)
    }
}
