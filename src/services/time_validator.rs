//! Validation and classification of shift time windows.
//!
//! Pure functions only: nothing here touches storage or the clock.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::database::models::{DayFlags, SECONDS_PER_DAY, ScheduleDefinition, TimeOfDay};

pub const DURATION_TOLERANCE_HOURS: f64 = 0.1;
pub const MIN_SHIFT_HOURS: f64 = 1.0;
pub const MAX_SHIFT_HOURS: f64 = 24.0;
pub const LONG_SHIFT_WARNING_HOURS: f64 = 12.0;
pub const BREAK_EXPECTED_AFTER_HOURS: f64 = 6.0;
pub const MAX_GUARDS_BEFORE_WARNING: i32 = 50;

const NIGHT_STARTS_AT: TimeOfDay = TimeOfDay::hm(22, 0);
const NIGHT_ENDS_AT: TimeOfDay = TimeOfDay::hm(6, 0);

// Absorbs float noise so that 8.1 vs 8.0 still counts as within tolerance.
const EPSILON: f64 = 1e-9;

/// Everything needed to judge one proposed shift pattern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeValidationInput {
    pub start_time: TimeOfDay,
    pub end_time: TimeOfDay,
    /// The caller's own idea of whether the window crosses midnight, if it has one.
    pub declared_crosses_midnight: Option<bool>,
    pub declared_duration_hours: f64,
    pub break_minutes: i32,
    pub day_flags: DayFlags,
    pub guards_per_shift: i32,
    pub effective_from: NaiveDate,
    pub effective_to: Option<NaiveDate>,
}

impl From<&ScheduleDefinition> for TimeValidationInput {
    fn from(schedule: &ScheduleDefinition) -> Self {
        Self {
            start_time: schedule.start_time,
            end_time: schedule.end_time,
            declared_crosses_midnight: Some(schedule.crosses_midnight),
            declared_duration_hours: schedule.duration_hours,
            break_minutes: schedule.break_minutes,
            day_flags: schedule.day_flags,
            guards_per_shift: schedule.guards_per_shift,
            effective_from: schedule.effective_from,
            effective_to: schedule.effective_to,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeValidationResult {
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub crosses_midnight: bool,
    pub actual_duration_hours: f64,
    pub is_night_shift: bool,
}

impl TimeValidationResult {
    fn error(&mut self, message: String) {
        self.errors.push(message);
    }

    fn warning(&mut self, message: String) {
        self.warnings.push(message);
    }
}

/// `end <= start` means the window runs into the next day.
pub fn crosses_midnight(start: TimeOfDay, end: TimeOfDay) -> bool {
    end <= start
}

/// Length of the window in hours, wrapping past midnight when needed.
pub fn actual_duration_hours(start: TimeOfDay, end: TimeOfDay) -> f64 {
    let seconds = if crosses_midnight(start, end) {
        (SECONDS_PER_DAY - start.seconds()) + end.seconds()
    } else {
        end.seconds() - start.seconds()
    };
    seconds as f64 / 3600.0
}

/// A crossing shift is a night shift if it starts at 22:00 or later or ends by
/// 06:00. A same-day shift only counts when it lies entirely within 00:00–06:00.
pub fn is_night_shift(start: TimeOfDay, end: TimeOfDay) -> bool {
    if crosses_midnight(start, end) {
        start >= NIGHT_STARTS_AT || end <= NIGHT_ENDS_AT
    } else {
        start >= TimeOfDay::MIDNIGHT && end <= NIGHT_ENDS_AT
    }
}

pub fn validate(input: &TimeValidationInput) -> TimeValidationResult {
    let mut result = TimeValidationResult::default();

    let mut out_of_range = false;
    for (label, time) in [("Start", input.start_time), ("End", input.end_time)] {
        if !time.is_within_day() {
            result.error(format!(
                "{} time {} must be between 00:00:00 and 23:59:59",
                label, time
            ));
            out_of_range = true;
        }
    }
    if out_of_range {
        return result;
    }

    let start = input.start_time;
    let end = input.end_time;
    result.crosses_midnight = crosses_midnight(start, end);
    result.actual_duration_hours = actual_duration_hours(start, end);
    let actual = result.actual_duration_hours;

    if (actual - input.declared_duration_hours).abs() > DURATION_TOLERANCE_HOURS + EPSILON {
        result.error(format!(
            "Declared duration {:.2}h does not match the time window ({:.2}h, tolerance {}h)",
            input.declared_duration_hours, actual, DURATION_TOLERANCE_HOURS
        ));
    }

    if let Some(declared) = input.declared_crosses_midnight {
        if declared != result.crosses_midnight {
            result.warning(format!(
                "Crosses-midnight flag was declared {} but {}–{} {}; using the computed value",
                declared,
                start,
                end,
                if result.crosses_midnight {
                    "crosses midnight"
                } else {
                    "does not cross midnight"
                }
            ));
        }
    }

    if actual < MIN_SHIFT_HOURS {
        result.error(format!(
            "Shift duration {:.2}h is shorter than the minimum of {}h",
            actual, MIN_SHIFT_HOURS
        ));
    } else if actual > MAX_SHIFT_HOURS {
        result.error(format!(
            "Shift duration {:.2}h exceeds the maximum of {}h",
            actual, MAX_SHIFT_HOURS
        ));
    }

    if actual > LONG_SHIFT_WARNING_HOURS {
        result.warning(format!(
            "Shift duration {:.2}h exceeds {}h; check labor-law limits",
            actual, LONG_SHIFT_WARNING_HOURS
        ));
    }

    if input.break_minutes < 0 {
        result.error(format!(
            "Break minutes cannot be negative (got {})",
            input.break_minutes
        ));
    } else if input.break_minutes as f64 > actual * 60.0 + EPSILON {
        result.error(format!(
            "Break of {} minutes is longer than the {:.0}-minute shift",
            input.break_minutes,
            actual * 60.0
        ));
    }

    if actual >= BREAK_EXPECTED_AFTER_HOURS - EPSILON && input.break_minutes == 0 {
        result.warning(format!(
            "Shift of {:.2}h has no break scheduled",
            actual
        ));
    }

    result.is_night_shift = is_night_shift(start, end);

    if !input.day_flags.any() {
        result.error("At least one day of the week must be selected".to_string());
    }

    if input.guards_per_shift <= 0 {
        result.error(format!(
            "Guards per shift must be positive (got {})",
            input.guards_per_shift
        ));
    } else if input.guards_per_shift > MAX_GUARDS_BEFORE_WARNING {
        result.warning(format!(
            "{} guards per shift is unusually high",
            input.guards_per_shift
        ));
    }

    if let Some(effective_to) = input.effective_to {
        if effective_to < input.effective_from {
            result.error(format!(
                "Effective end date {} is before the start date {}",
                effective_to, input.effective_from
            ));
        }
    }

    result.is_valid = result.errors.is_empty();
    result
}
