//! Common validation rules shared across request payloads.

use chrono::NaiveDate;
use validator::ValidationError;

use crate::models::request::RequestPayload;

/// Validates that a date window is not inverted (`start <= end`).
pub fn validate_date_window(start: NaiveDate, end: NaiveDate) -> Result<(), ValidationError> {
    if start > end {
        return Err(ValidationError::new("date_window_inverted"));
    }
    Ok(())
}

/// Validates that a leave day count is positive and plausible for its window.
pub fn validate_day_count(day_count: f64) -> Result<(), ValidationError> {
    if !day_count.is_finite() || day_count <= 0.0 {
        return Err(ValidationError::new("day_count_not_positive"));
    }
    Ok(())
}

/// Validates that planned hours are within acceptable range.
///
/// Requirements:
/// - Between 0.5 and 24.0 hours
pub fn validate_planned_hours(hours: f64) -> Result<(), ValidationError> {
    if !(0.5..=24.0).contains(&hours) {
        return Err(ValidationError::new("planned_hours_out_of_range"));
    }
    Ok(())
}

/// Validates a free-text reason for commands that require one.
pub fn validate_reason(reason: &str) -> Result<(), ValidationError> {
    if reason.trim().is_empty() {
        return Err(ValidationError::new("reason_required"));
    }
    if reason.len() > 1000 {
        return Err(ValidationError::new("reason_too_long"));
    }
    Ok(())
}

/// Aggregated payload validation used at request creation; returns one
/// message per failed rule, empty when the payload is acceptable.
pub fn validate_request_payload(payload: &RequestPayload) -> Vec<String> {
    let mut errors = Vec::new();
    match payload {
        RequestPayload::Leave {
            start_date,
            end_date,
            day_count,
            ..
        } => {
            if validate_date_window(*start_date, *end_date).is_err() {
                errors.push("start_date: date_window_inverted".to_string());
            }
            if validate_day_count(*day_count).is_err() {
                errors.push("day_count: day_count_not_positive".to_string());
            }
        }
        RequestPayload::Overtime { planned_hours, .. } => {
            if validate_planned_hours(*planned_hours).is_err() {
                errors.push("planned_hours: planned_hours_out_of_range".to_string());
            }
        }
        RequestPayload::Correction {
            requested_clock_in,
            requested_clock_out,
            ..
        } => {
            if requested_clock_in.is_none() && requested_clock_out.is_none() {
                errors.push("requested_clock: at_least_one_required".to_string());
            }
            if let (Some(clock_in), Some(clock_out)) = (requested_clock_in, requested_clock_out) {
                if clock_in >= clock_out {
                    errors.push("requested_clock: out_not_after_in".to_string());
                }
            }
        }
    }
    errors
}
