//! Rule consistency checks for the authoring write path.
//!
//! Validation is advisory: the expander never raises on a bad rule (it
//! degrades to an empty expansion), but the admin write path must call
//! [`validate`] before persisting and reject on any non-empty result so a
//! broken rule never reaches storage in the first place.

use serde::Serialize;
use thiserror::Error;

use crate::rule::RecurrenceRule;

/// Bounds enforced on rule fields.
pub const MAX_INTERVAL: i32 = 366;
pub const MAX_COUNT: i32 = 1000;
pub const MAX_SET_POSITION: i32 = 5;

/// A single named validation failure. Each check in [`validate`] produces a
/// distinct variant so the authoring UI can attach messages to fields.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleViolation {
    #[error("FREQ is required")]
    MissingFrequency,

    #[error("FREQ must be one of DAILY, WEEKLY, MONTHLY, YEARLY")]
    UnknownFrequency,

    #[error("INTERVAL must be between 1 and 366")]
    IntervalOutOfRange,

    #[error("COUNT must be between 1 and 1000")]
    CountOutOfRange,

    #[error("BYSETPOS entries must be between -5 and 5, excluding 0")]
    SetPositionOutOfRange,

    #[error("BYSETPOS and BYMONTHDAY cannot be combined")]
    SetPositionWithMonthDay,
}

/// Check a parsed rule for internal consistency.
///
/// Returns an empty list when the rule is valid. Order of the returned
/// violations follows the order of the checks and is stable.
pub fn validate(rule: &RecurrenceRule) -> Vec<RuleViolation> {
    let mut violations = Vec::new();

    match (rule.frequency, &rule.unknown_frequency) {
        (Some(_), _) => {}
        (None, Some(_)) => violations.push(RuleViolation::UnknownFrequency),
        (None, None) => violations.push(RuleViolation::MissingFrequency),
    }

    if rule.interval < 1 || rule.interval > MAX_INTERVAL {
        violations.push(RuleViolation::IntervalOutOfRange);
    }

    if let Some(count) = rule.count {
        if count < 1 || count > MAX_COUNT {
            violations.push(RuleViolation::CountOutOfRange);
        }
    }

    if rule
        .by_set_positions
        .iter()
        .any(|&p| p == 0 || p < -MAX_SET_POSITION || p > MAX_SET_POSITION)
    {
        violations.push(RuleViolation::SetPositionOutOfRange);
    }

    // A monthly rule selects its day either by fixed day-of-month or by
    // ordinal weekday, never both.
    if !rule.by_set_positions.is_empty() && rule.by_month_day.is_some() {
        violations.push(RuleViolation::SetPositionWithMonthDay);
    }

    violations
}
