use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::{
    models::{ShiftTemplate, ShiftTemplateDraft, UpsertOutcome},
    store::TemplateStore,
    transaction::DatabaseTransaction,
    utils::sql,
};
use crate::error::AppError;

const TEMPLATE_COLUMNS: &str = r#"
    id,
    template_code,
    contract_id,
    schedule_id,
    name,
    start_time,
    end_time,
    duration_hours,
    break_minutes,
    is_night_shift,
    is_overnight,
    crosses_midnight,
    monday,
    tuesday,
    wednesday,
    thursday,
    friday,
    saturday,
    sunday,
    min_guards,
    max_guards,
    optimal_guards,
    location_id,
    location_name,
    location_address,
    location_lat,
    location_lon,
    effective_from,
    effective_to,
    is_active,
    is_deleted,
    created_at,
    updated_at,
    created_by,
    updated_by
"#;

#[derive(Clone)]
pub struct ShiftTemplateRepository {
    pool: PgPool,
}

impl ShiftTemplateRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TemplateStore for ShiftTemplateRepository {
    async fn upsert_by_code(
        &self,
        draft: &ShiftTemplateDraft,
        actor: Option<Uuid>,
    ) -> Result<UpsertOutcome, AppError> {
        let draft = draft.clone();

        DatabaseTransaction::run(&self.pool, move |tx| {
            Box::pin(async move {
                let now = Utc::now();
                let location = draft.location.as_ref();

                let existing_id = sqlx::query_scalar::<_, Uuid>(&sql(r#"
                    SELECT
                        id
                    FROM
                        shift_templates
                    WHERE
                        template_code = ?
                        AND NOT is_deleted
                    FOR UPDATE
                "#))
                .bind(draft.template_code.as_str())
                .fetch_optional(&mut **tx)
                .await?;

                let Some(template_id) = existing_id else {
                    let created = sqlx::query_as::<_, ShiftTemplate>(&sql(&format!(
                        r#"
                        INSERT INTO
                            shift_templates (
                                id, template_code, contract_id, schedule_id, name,
                                start_time, end_time, duration_hours, break_minutes,
                                is_night_shift, is_overnight, crosses_midnight,
                                monday, tuesday, wednesday, thursday, friday, saturday, sunday,
                                min_guards, max_guards, optimal_guards,
                                location_id, location_name, location_address, location_lat, location_lon,
                                effective_from, effective_to, is_active, is_deleted,
                                created_at, updated_at, created_by, updated_by
                            )
                        VALUES
                            (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?,
                             ?, ?, ?, ?, ?, ?, ?, TRUE, FALSE, ?, ?, ?, ?)
                        RETURNING {}
                        "#,
                        TEMPLATE_COLUMNS
                    )))
                    .bind(Uuid::new_v4())
                    .bind(draft.template_code.as_str())
                    .bind(draft.contract_id)
                    .bind(draft.schedule_id)
                    .bind(&draft.name)
                    .bind(draft.start_time)
                    .bind(draft.end_time)
                    .bind(draft.duration_hours)
                    .bind(draft.break_minutes)
                    .bind(draft.is_night_shift)
                    .bind(draft.is_overnight)
                    .bind(draft.crosses_midnight)
                    .bind(draft.day_flags.monday)
                    .bind(draft.day_flags.tuesday)
                    .bind(draft.day_flags.wednesday)
                    .bind(draft.day_flags.thursday)
                    .bind(draft.day_flags.friday)
                    .bind(draft.day_flags.saturday)
                    .bind(draft.day_flags.sunday)
                    .bind(draft.min_guards)
                    .bind(draft.max_guards)
                    .bind(draft.optimal_guards)
                    .bind(location.map(|l| l.location_id))
                    .bind(location.map(|l| l.name.clone()))
                    .bind(location.and_then(|l| l.address.clone()))
                    .bind(location.and_then(|l| l.lat))
                    .bind(location.and_then(|l| l.lon))
                    .bind(draft.effective_from)
                    .bind(draft.effective_to)
                    .bind(now)
                    .bind(now)
                    .bind(actor)
                    .bind(actor)
                    .fetch_one(&mut **tx)
                    .await?;

                    return Ok(UpsertOutcome::Created(created));
                };

                let updated = sqlx::query_as::<_, ShiftTemplate>(&sql(&format!(
                    r#"
                    UPDATE shift_templates
                    SET
                        contract_id = ?,
                        schedule_id = ?,
                        name = ?,
                        start_time = ?,
                        end_time = ?,
                        duration_hours = ?,
                        break_minutes = ?,
                        is_night_shift = ?,
                        is_overnight = ?,
                        crosses_midnight = ?,
                        monday = ?,
                        tuesday = ?,
                        wednesday = ?,
                        thursday = ?,
                        friday = ?,
                        saturday = ?,
                        sunday = ?,
                        min_guards = ?,
                        max_guards = ?,
                        optimal_guards = ?,
                        location_id = ?,
                        location_name = ?,
                        location_address = ?,
                        location_lat = ?,
                        location_lon = ?,
                        effective_from = ?,
                        effective_to = ?,
                        is_active = TRUE,
                        updated_at = ?,
                        updated_by = ?
                    WHERE
                        id = ?
                    RETURNING {}
                    "#,
                    TEMPLATE_COLUMNS
                )))
                .bind(draft.contract_id)
                .bind(draft.schedule_id)
                .bind(&draft.name)
                .bind(draft.start_time)
                .bind(draft.end_time)
                .bind(draft.duration_hours)
                .bind(draft.break_minutes)
                .bind(draft.is_night_shift)
                .bind(draft.is_overnight)
                .bind(draft.crosses_midnight)
                .bind(draft.day_flags.monday)
                .bind(draft.day_flags.tuesday)
                .bind(draft.day_flags.wednesday)
                .bind(draft.day_flags.thursday)
                .bind(draft.day_flags.friday)
                .bind(draft.day_flags.saturday)
                .bind(draft.day_flags.sunday)
                .bind(draft.min_guards)
                .bind(draft.max_guards)
                .bind(draft.optimal_guards)
                .bind(location.map(|l| l.location_id))
                .bind(location.map(|l| l.name.clone()))
                .bind(location.and_then(|l| l.address.clone()))
                .bind(location.and_then(|l| l.lat))
                .bind(location.and_then(|l| l.lon))
                .bind(draft.effective_from)
                .bind(draft.effective_to)
                .bind(now)
                .bind(actor)
                .bind(template_id)
                .fetch_one(&mut **tx)
                .await?;

                Ok::<_, AppError>(UpsertOutcome::Updated(updated))
            })
        })
        .await
    }

    async fn find_by_contract(&self, contract_id: Uuid) -> Result<Vec<ShiftTemplate>, AppError> {
        let templates = sqlx::query_as::<_, ShiftTemplate>(&sql(&format!(
            "SELECT {} FROM shift_templates WHERE contract_id = ? AND NOT is_deleted ORDER BY start_time, template_code",
            TEMPLATE_COLUMNS
        )))
        .bind(contract_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(templates)
    }
}
