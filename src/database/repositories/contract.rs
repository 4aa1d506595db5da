use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::{
    models::{
        ActivationCommit, Contract, ContractAggregate, ContractLocationSnapshot,
        ContractShiftScheduleRow, ContractStatus, CustomerSummary, EventEnvelope,
    },
    repositories::outbox,
    store::ContractStore,
    transaction::DatabaseTransaction,
    utils::sql,
};
use crate::error::AppError;

const CONTRACT_COLUMNS: &str = r#"
    id,
    contract_number,
    title,
    customer_id,
    manager_id,
    status,
    start_date,
    end_date,
    auto_generate_shifts,
    generate_shifts_advance_days,
    work_on_public_holidays,
    work_on_customer_closed_days,
    approved_at,
    approved_by,
    activated_at,
    activated_by,
    activation_notes,
    is_deleted,
    created_at,
    updated_at,
    created_by,
    updated_by
"#;

#[derive(Clone)]
pub struct ContractRepository {
    pool: PgPool,
}

impl ContractRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, contract_id: Uuid) -> Result<Option<Contract>, AppError> {
        let contract = sqlx::query_as::<_, Contract>(&sql(&format!(
            "SELECT {} FROM contracts WHERE id = ? AND NOT is_deleted",
            CONTRACT_COLUMNS
        )))
        .bind(contract_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(contract)
    }

    async fn find_customer(&self, customer_id: Uuid) -> Result<Option<CustomerSummary>, AppError> {
        let customer = sqlx::query_as::<_, CustomerSummary>(&sql(r#"
            SELECT
                id,
                name
            FROM
                customers
            WHERE
                id = ?
        "#))
        .bind(customer_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(customer)
    }

    async fn find_locations(
        &self,
        contract_id: Uuid,
    ) -> Result<Vec<ContractLocationSnapshot>, AppError> {
        let locations = sqlx::query_as::<_, ContractLocationSnapshot>(&sql(r#"
            SELECT
                l.id AS location_id,
                l.name,
                l.address,
                l.code,
                cl.guards_required,
                cl.coverage_type,
                cl.service_start,
                cl.service_end,
                l.latitude AS lat,
                l.longitude AS lon,
                l.geofence_radius_m
            FROM
                contract_locations cl
            JOIN
                locations l ON l.id = cl.location_id
            WHERE
                cl.contract_id = ?
                AND NOT cl.is_deleted
                AND NOT l.is_deleted
            ORDER BY
                l.name
        "#))
        .bind(contract_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(locations)
    }

    async fn find_active_schedules(
        &self,
        contract_id: Uuid,
    ) -> Result<Vec<ContractShiftScheduleRow>, AppError> {
        let schedules = sqlx::query_as::<_, ContractShiftScheduleRow>(&sql(r#"
            SELECT
                id,
                contract_id,
                location_id,
                name,
                schedule_type,
                start_time,
                end_time,
                crosses_midnight,
                duration_hours,
                break_minutes,
                guards_per_shift,
                recurrence_type,
                monday,
                tuesday,
                wednesday,
                thursday,
                friday,
                saturday,
                sunday,
                applies_on_public_holidays,
                applies_on_weekends,
                skip_when_closed,
                requires_armed_guard,
                requires_supervisor,
                min_experience_months,
                effective_from,
                effective_to
            FROM
                contract_shift_schedules
            WHERE
                contract_id = ?
                AND is_active
                AND NOT is_deleted
            ORDER BY
                start_time,
                name
        "#))
        .bind(contract_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(schedules)
    }
}

#[async_trait]
impl ContractStore for ContractRepository {
    async fn load_for_activation(
        &self,
        contract_id: Uuid,
    ) -> Result<Option<ContractAggregate>, AppError> {
        let Some(contract) = self.find_by_id(contract_id).await? else {
            return Ok(None);
        };

        let customer = self
            .find_customer(contract.customer_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "Customer {} of contract {} not found",
                    contract.customer_id, contract.contract_number
                ))
            })?;
        let locations = self.find_locations(contract_id).await?;
        let schedules = self
            .find_active_schedules(contract_id)
            .await?
            .into_iter()
            .map(Into::into)
            .collect();

        Ok(Some(ContractAggregate {
            contract,
            customer,
            locations,
            schedules,
        }))
    }

    async fn commit_activation(
        &self,
        commit: &ActivationCommit,
        event: &EventEnvelope,
    ) -> Result<Contract, AppError> {
        let commit = commit.clone();
        let event = event.clone();

        DatabaseTransaction::run(&self.pool, move |tx| {
            Box::pin(async move {
                let updated = sqlx::query_as::<_, Contract>(&sql(&format!(
                    r#"
                    UPDATE contracts
                    SET
                        status = ?,
                        activated_at = ?,
                        activated_by = ?,
                        manager_id = COALESCE(?, manager_id),
                        activation_notes = COALESCE(?, activation_notes),
                        approved_at = CASE WHEN ? THEN ? ELSE approved_at END,
                        approved_by = CASE WHEN ? THEN ? ELSE approved_by END,
                        updated_at = ?,
                        updated_by = ?
                    WHERE
                        id = ?
                        AND status = ?
                        AND NOT is_deleted
                    RETURNING {}
                    "#,
                    CONTRACT_COLUMNS
                )))
                .bind(ContractStatus::ScheduleShifts)
                .bind(commit.activated_at)
                .bind(commit.activated_by)
                .bind(commit.manager_id)
                .bind(&commit.notes)
                .bind(commit.approve)
                .bind(commit.activated_at)
                .bind(commit.approve)
                .bind(commit.activated_by)
                .bind(commit.activated_at)
                .bind(commit.activated_by)
                .bind(commit.contract_id)
                .bind(commit.expected_status)
                .fetch_optional(&mut **tx)
                .await?
                .ok_or_else(|| {
                    AppError::Conflict(format!(
                        "Contract {} is no longer in status {}; activation aborted",
                        commit.contract_id, commit.expected_status
                    ))
                })?;

                outbox::enqueue(&mut **tx, &event).await?;

                Ok::<_, AppError>(updated)
            })
        })
        .await
    }
}
