//! Turns a contract's schedule definitions into shift templates.
//!
//! Each schedule is reconciled on its own: one bad definition or one failed
//! write never stops the rest of the batch, and whatever was written stays written.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::database::{
    models::{
        ContractActivatedEvent, ContractLocationSnapshot, ScheduleDefinition, ShiftTemplateDraft,
        TemplateCode, TemplateLocation, UpsertOutcome,
    },
    store::TemplateStore,
};
use crate::error::AppError;
use crate::services::time_validator::{self, TimeValidationInput, TimeValidationResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportTemplatesRequest {
    pub contract_id: Uuid,
    pub contract_number: String,
    pub locations: Vec<ContractLocationSnapshot>,
    pub schedules: Vec<ScheduleDefinition>,
    pub imported_by: Option<Uuid>,
}

impl From<&ContractActivatedEvent> for ImportTemplatesRequest {
    fn from(event: &ContractActivatedEvent) -> Self {
        Self {
            contract_id: event.contract_id,
            contract_number: event.contract_number.clone(),
            locations: event.locations.clone(),
            schedules: event.shift_schedules.clone(),
            imported_by: event.activated_by,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImportOutcome {
    Created,
    Updated,
    Skipped,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportItemDetail {
    pub schedule_id: Uuid,
    pub schedule_name: String,
    pub outcome: ImportOutcome,
    pub template_code: Option<String>,
    pub template_id: Option<Uuid>,
    pub validation: Option<TimeValidationResult>,
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportResult {
    pub success: bool,
    pub created_count: usize,
    pub updated_count: usize,
    pub skipped_count: usize,
    pub created_ids: Vec<Uuid>,
    pub errors: Vec<String>,
    pub per_item_details: Vec<ImportItemDetail>,
}

impl ImportResult {
    fn record(&mut self, detail: ImportItemDetail) {
        match detail.outcome {
            ImportOutcome::Created => {
                self.created_count += 1;
                if let Some(id) = detail.template_id {
                    self.created_ids.push(id);
                }
            }
            ImportOutcome::Updated => self.updated_count += 1,
            ImportOutcome::Skipped => {
                self.skipped_count += 1;
                self.errors.push(format!(
                    "Schedule '{}' ({}): {}",
                    detail.schedule_name,
                    detail.schedule_id,
                    detail.errors.join("; ")
                ));
            }
        }
        self.per_item_details.push(detail);
    }

    fn finish(mut self) -> Self {
        // Partial progress still counts as success; the error list says what failed.
        self.success = self.errors.is_empty() || self.created_count > 0;
        self
    }
}

#[derive(Clone)]
pub struct TemplateReconciler {
    templates: Arc<dyn TemplateStore>,
    item_timeout: Duration,
}

impl TemplateReconciler {
    pub fn new(templates: Arc<dyn TemplateStore>, item_timeout: Duration) -> Self {
        Self {
            templates,
            item_timeout,
        }
    }

    pub async fn import(&self, request: &ImportTemplatesRequest) -> ImportResult {
        log::info!(
            "Importing {} schedule(s) for contract {} ({})",
            request.schedules.len(),
            request.contract_number,
            request.contract_id
        );

        let mut result = ImportResult::default();

        for schedule in &request.schedules {
            let detail = match self.reconcile_one(request, schedule).await {
                Ok(detail) => detail,
                Err(e) => {
                    log::warn!(
                        "Failed to reconcile schedule '{}' of contract {}: {}",
                        schedule.name,
                        request.contract_number,
                        e
                    );
                    ImportItemDetail {
                        schedule_id: schedule.schedule_id,
                        schedule_name: schedule.name.clone(),
                        outcome: ImportOutcome::Skipped,
                        template_code: None,
                        template_id: None,
                        validation: None,
                        errors: vec![e.to_string()],
                    }
                }
            };
            result.record(detail);
        }

        let result = result.finish();
        log::info!(
            "Template import for contract {} finished: {} created, {} updated, {} skipped",
            request.contract_number,
            result.created_count,
            result.updated_count,
            result.skipped_count
        );
        result
    }

    /// Validation failures come back as a `Skipped` detail; `Err` is reserved
    /// for infrastructure trouble while writing.
    async fn reconcile_one(
        &self,
        request: &ImportTemplatesRequest,
        schedule: &ScheduleDefinition,
    ) -> Result<ImportItemDetail, AppError> {
        let mut validation = time_validator::validate(&TimeValidationInput::from(schedule));
        let code = TemplateCode::derive(&schedule.name, schedule.start_time, schedule.end_time);

        if !validation.is_valid {
            log::warn!(
                "Skipping schedule '{}' of contract {}: {}",
                schedule.name,
                request.contract_number,
                validation.errors.join("; ")
            );
            return Ok(ImportItemDetail {
                schedule_id: schedule.schedule_id,
                schedule_name: schedule.name.clone(),
                outcome: ImportOutcome::Skipped,
                template_code: Some(code.to_string()),
                template_id: None,
                errors: validation.errors.clone(),
                validation: Some(validation),
            });
        }

        let location = match resolve_location(schedule, &request.locations) {
            Ok(location) => location,
            Err(warning) => {
                validation.warnings.push(warning);
                None
            }
        };

        for warning in &validation.warnings {
            log::warn!(
                "Schedule '{}' of contract {}: {}",
                schedule.name,
                request.contract_number,
                warning
            );
        }

        let draft = build_draft(request.contract_id, schedule, &validation, code, location)?;

        let outcome = tokio::time::timeout(
            self.item_timeout,
            self.templates.upsert_by_code(&draft, request.imported_by),
        )
        .await
        .map_err(|_| {
            AppError::Timeout(format!(
                "Saving template {} took longer than {:?}",
                draft.template_code, self.item_timeout
            ))
        })??;

        let template = outcome.template();
        let (kind, verb) = match outcome {
            UpsertOutcome::Created(_) => (ImportOutcome::Created, "Created"),
            UpsertOutcome::Updated(_) => (ImportOutcome::Updated, "Updated"),
        };
        log::debug!("{} template {} ({})", verb, template.template_code, template.id);

        Ok(ImportItemDetail {
            schedule_id: schedule.schedule_id,
            schedule_name: schedule.name.clone(),
            outcome: kind,
            template_code: Some(template.template_code.clone()),
            template_id: Some(template.id),
            validation: Some(validation),
            errors: Vec::new(),
        })
    }
}

/// A schedule tied to a location gets that location; a contract-wide schedule
/// falls back to the first contract location.
fn resolve_location(
    schedule: &ScheduleDefinition,
    locations: &[ContractLocationSnapshot],
) -> Result<Option<TemplateLocation>, String> {
    let found = match schedule.location_id {
        Some(location_id) => match locations.iter().find(|l| l.location_id == location_id) {
            Some(location) => Some(location),
            None => {
                return Err(format!(
                    "Location {} is not part of the contract; template has no location snapshot",
                    location_id
                ));
            }
        },
        None => locations.first(),
    };

    Ok(found.map(|location| TemplateLocation {
        location_id: location.location_id,
        name: location.name.clone(),
        address: location.address.clone(),
        lat: location.lat,
        lon: location.lon,
    }))
}

fn build_draft(
    contract_id: Uuid,
    schedule: &ScheduleDefinition,
    validation: &TimeValidationResult,
    template_code: TemplateCode,
    location: Option<TemplateLocation>,
) -> Result<ShiftTemplateDraft, AppError> {
    let (Some(start_time), Some(end_time)) = (
        schedule.start_time.to_naive_time(),
        schedule.end_time.to_naive_time(),
    ) else {
        return Err(AppError::Validation(vec![format!(
            "Schedule '{}' has times outside the day",
            schedule.name
        )]));
    };

    Ok(ShiftTemplateDraft {
        template_code,
        contract_id,
        schedule_id: Some(schedule.schedule_id),
        name: schedule.name.clone(),
        start_time,
        end_time,
        duration_hours: validation.actual_duration_hours,
        break_minutes: schedule.break_minutes,
        is_night_shift: validation.is_night_shift,
        is_overnight: validation.crosses_midnight,
        crosses_midnight: validation.crosses_midnight,
        day_flags: schedule.day_flags,
        min_guards: schedule.guards_per_shift,
        max_guards: schedule.guards_per_shift,
        optimal_guards: schedule.guards_per_shift,
        location,
        effective_from: schedule.effective_from,
        effective_to: schedule.effective_to,
    })
}
