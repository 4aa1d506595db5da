use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::database::{
    models::{Shift, ShiftInput},
    store::ShiftStore,
};
use crate::error::AppError;
use crate::services::overlap_detector::OverlapDetector;

/// Creates and edits dated shifts, refusing double-booked locations.
#[derive(Clone)]
pub struct ShiftScheduler {
    shifts: Arc<dyn ShiftStore>,
    overlaps: OverlapDetector,
}

impl ShiftScheduler {
    pub fn new(shifts: Arc<dyn ShiftStore>) -> Self {
        Self {
            overlaps: OverlapDetector::new(shifts.clone()),
            shifts,
        }
    }

    pub fn overlap_detector(&self) -> &OverlapDetector {
        &self.overlaps
    }

    pub async fn create_shift(&self, input: ShiftInput) -> Result<Shift, AppError> {
        validate_input(&input)?;

        self.overlaps
            .ensure_no_overlaps(
                input.location_id,
                input.shift_date,
                input.start_time,
                input.end_time,
                None,
            )
            .await?;

        let now = Utc::now();
        let (start_time, end_time) = input.interval();
        let shift = Shift {
            id: Uuid::new_v4(),
            location_id: input.location_id,
            contract_id: input.contract_id,
            template_id: input.template_id,
            shift_date: input.shift_date,
            start_time,
            end_time,
            duration_hours: hours_between(start_time, end_time),
            break_minutes: input.break_minutes,
            required_guards: input.required_guards,
            assigned_guards: 0,
            description: input.description,
            version: 1,
            is_deleted: false,
            created_at: now,
            updated_at: now,
        };

        let created = self.shifts.insert(&shift).await?;
        log::info!(
            "Created shift {} at location {} on {}",
            created.id,
            created.location_id,
            created.shift_date
        );
        Ok(created)
    }

    /// Applies `input` only if the stored shift is still at `expected_version`.
    pub async fn update_shift(
        &self,
        shift_id: Uuid,
        input: ShiftInput,
        expected_version: i32,
    ) -> Result<Shift, AppError> {
        validate_input(&input)?;

        let existing = self
            .shifts
            .find_by_id(shift_id)
            .await?
            .filter(|shift| !shift.is_deleted)
            .ok_or_else(|| AppError::NotFound(format!("Shift {} not found", shift_id)))?;

        if existing.version != expected_version {
            return Err(stale_version(shift_id, expected_version, existing.version));
        }

        let (start_time, end_time) = input.interval();
        let moved = existing.location_id != input.location_id
            || existing.shift_date != input.shift_date
            || existing.start_time != start_time
            || existing.end_time != end_time;

        if moved {
            self.overlaps
                .ensure_no_overlaps(
                    input.location_id,
                    input.shift_date,
                    input.start_time,
                    input.end_time,
                    Some(shift_id),
                )
                .await?;
        }

        let updated = Shift {
            location_id: input.location_id,
            contract_id: input.contract_id,
            template_id: input.template_id,
            shift_date: input.shift_date,
            start_time,
            end_time,
            duration_hours: hours_between(start_time, end_time),
            break_minutes: input.break_minutes,
            required_guards: input.required_guards,
            description: input.description,
            updated_at: Utc::now(),
            ..existing
        };

        match self.shifts.update_versioned(&updated, expected_version).await? {
            Some(shift) => {
                log::info!("Updated shift {} to version {}", shift.id, shift.version);
                Ok(shift)
            }
            None => {
                let current = self
                    .shifts
                    .find_by_id(shift_id)
                    .await?
                    .map(|shift| shift.version)
                    .unwrap_or(expected_version);
                Err(stale_version(shift_id, expected_version, current))
            }
        }
    }
}

fn validate_input(input: &ShiftInput) -> Result<(), AppError> {
    let mut errors = Vec::new();
    let (start_time, end_time) = input.interval();

    if input.start_time == input.end_time {
        errors.push("Shift start and end time must differ".to_string());
    }
    if input.required_guards <= 0 {
        errors.push("Required guards must be greater than zero".to_string());
    }
    if input.break_minutes < 0 {
        errors.push("Break minutes cannot be negative".to_string());
    } else if i64::from(input.break_minutes) * 60 >= (end_time - start_time).num_seconds() {
        errors.push("Break must be shorter than the shift".to_string());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(AppError::Validation(errors))
    }
}

fn hours_between(start: chrono::NaiveDateTime, end: chrono::NaiveDateTime) -> f64 {
    (end - start).num_seconds() as f64 / 3600.0
}

fn stale_version(shift_id: Uuid, expected: i32, current: i32) -> AppError {
    AppError::Conflict(format!(
        "Shift {} was modified concurrently (expected version {}, current {})",
        shift_id, expected, current
    ))
}
