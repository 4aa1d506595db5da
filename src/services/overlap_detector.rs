use std::sync::Arc;

use chrono::{Days, NaiveDate, NaiveDateTime, NaiveTime};
use uuid::Uuid;

use crate::database::{
    models::{ConflictingShift, absolute_interval},
    store::ShiftStore,
};
use crate::error::AppError;

/// Half-open `[start, end)` intersection.
pub fn intervals_overlap(
    a_start: NaiveDateTime,
    a_end: NaiveDateTime,
    b_start: NaiveDateTime,
    b_end: NaiveDateTime,
) -> bool {
    a_start < b_end && b_start < a_end
}

#[derive(Clone)]
pub struct OverlapDetector {
    shifts: Arc<dyn ShiftStore>,
}

impl OverlapDetector {
    pub fn new(shifts: Arc<dyn ShiftStore>) -> Self {
        Self { shifts }
    }

    /// Shifts at `location_id` that intersect the proposed window on `date`.
    /// An end time at or before the start time runs into the next day.
    pub async fn find_overlaps(
        &self,
        location_id: Uuid,
        date: NaiveDate,
        start_time: NaiveTime,
        end_time: NaiveTime,
        exclude_shift_id: Option<Uuid>,
    ) -> Result<Vec<ConflictingShift>, AppError> {
        let (window_start, window_end) = absolute_interval(date, start_time, end_time);

        // Yesterday's overnight shifts can spill into this window.
        let from_date = date.checked_sub_days(Days::new(1)).unwrap_or(date);
        let to_date = window_end.date();

        let candidates = self
            .shifts
            .find_by_location_and_dates(location_id, from_date, to_date, exclude_shift_id)
            .await?;

        let conflicts: Vec<ConflictingShift> = candidates
            .iter()
            .filter(|shift| Some(shift.id) != exclude_shift_id && !shift.is_deleted)
            .filter(|shift| {
                intervals_overlap(window_start, window_end, shift.start_time, shift.end_time)
            })
            .map(ConflictingShift::from)
            .collect();

        if !conflicts.is_empty() {
            log::debug!(
                "Found {} overlapping shift(s) at location {} for {} {}-{}",
                conflicts.len(),
                location_id,
                date,
                start_time,
                end_time
            );
        }

        Ok(conflicts)
    }

    /// Same as [`find_overlaps`](Self::find_overlaps) but any overlap is a `Conflict`.
    pub async fn ensure_no_overlaps(
        &self,
        location_id: Uuid,
        date: NaiveDate,
        start_time: NaiveTime,
        end_time: NaiveTime,
        exclude_shift_id: Option<Uuid>,
    ) -> Result<(), AppError> {
        let conflicts = self
            .find_overlaps(location_id, date, start_time, end_time, exclude_shift_id)
            .await?;

        if conflicts.is_empty() {
            return Ok(());
        }

        Err(AppError::Conflict(conflict_message(&conflicts)))
    }
}

pub fn conflict_message(conflicts: &[ConflictingShift]) -> String {
    let ids = conflicts
        .iter()
        .map(|c| c.shift_id.to_string())
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "Shift overlaps with {} existing shift(s): {}",
        conflicts.len(),
        ids
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 5, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    #[test]
    fn touching_intervals_do_not_overlap() {
        assert!(!intervals_overlap(at(1, 8), at(1, 16), at(1, 16), at(1, 22)));
        assert!(!intervals_overlap(at(1, 16), at(1, 22), at(1, 8), at(1, 16)));
    }

    #[test]
    fn overlap_is_symmetric() {
        let (a, b) = ((at(1, 8), at(1, 17)), (at(1, 16), at(2, 1)));
        assert!(intervals_overlap(a.0, a.1, b.0, b.1));
        assert!(intervals_overlap(b.0, b.1, a.0, a.1));
    }

    #[test]
    fn containment_counts_as_overlap() {
        assert!(intervals_overlap(at(1, 0), at(2, 0), at(1, 10), at(1, 11)));
    }

    #[test]
    fn conflict_message_lists_ids() {
        let id = Uuid::nil();
        let message = conflict_message(&[ConflictingShift {
            shift_id: id,
            shift_date: NaiveDate::from_ymd_opt(2025, 5, 1).unwrap(),
            start_time: at(1, 8),
            end_time: at(1, 16),
            description: None,
        }]);
        assert_eq!(
            message,
            format!("Shift overlaps with 1 existing shift(s): {}", id)
        );
    }
}
