//! Per-instance override resolution and exception/override bookkeeping.
//!
//! Two distinct mechanisms act on a generated instance date and must not be
//! conflated: an *exception date* removes the instance entirely (the
//! expander never emits it), while an *override* modifies or cancels a
//! still-visible instance after expansion. Per date, the states are
//!
//! ```text
//! NORMAL ⇄ EXCLUDED              (add/remove exception)
//! NORMAL ⇄ OVERRIDDEN-CHANGED    (set/clear override)
//! NORMAL → OVERRIDDEN-CANCELLED  (cancel) → NORMAL (restore)
//! ```
//!
//! EXCLUDED and the OVERRIDDEN states are mutually exclusive; the mutation
//! operations guard both directions and reject rather than silently clearing
//! the other collection, so admin-entered data (a cancellation reason, an
//! edited title) never disappears as a side effect.
//!
//! All mutations are pure: they take a definition snapshot and return a new
//! one, leaving persistence and write-ordering to the storage layer.

use chrono::{Duration, NaiveDate, Utc};

use crate::dst::resolve_wall_clock;
use crate::error::{Result, SeriesError};
use crate::series::{InstanceOverride, InstancePatch, Occurrence, SeriesDefinition};

/// Overlay the series' per-instance overrides onto expanded occurrences.
///
/// Cancelled instances stay in the list flagged `is_cancelled` with their
/// reason attached — the calendar UI renders them struck through rather than
/// having them vanish. Changed instances get only the fields present in the
/// patch replaced; title and description fall back through
/// override > series default > base event field.
pub fn apply_overrides(
    occurrences: Vec<Occurrence>,
    series: &SeriesDefinition,
) -> Vec<Occurrence> {
    occurrences
        .into_iter()
        .map(|occurrence| match series.overrides.get(&occurrence.instance_date) {
            None => occurrence,
            Some(InstanceOverride::Cancelled { reason }) => {
                let mut occurrence = occurrence;
                occurrence.is_cancelled = true;
                occurrence.cancellation_reason = reason.clone();
                occurrence
            }
            Some(InstanceOverride::Changed(patch)) => apply_patch(occurrence, patch, series),
        })
        .collect()
}

fn apply_patch(
    mut occurrence: Occurrence,
    patch: &InstancePatch,
    series: &SeriesDefinition,
) -> Occurrence {
    if let Some(title) = patch.title.clone().or_else(|| series.default_title.clone()) {
        occurrence.title = title;
    }
    if patch.description.is_some() {
        occurrence.description = patch.description.clone();
    } else if series.default_description.is_some() {
        occurrence.description = series.default_description.clone();
    }
    if let Some(location) = &patch.location {
        occurrence.location = Some(location.clone());
    }

    if patch.start_time.is_some() || patch.end_time.is_some() {
        let tz = series.base.timezone;
        let start_time = patch.start_time.unwrap_or_else(|| series.base.start.time());
        let start_wall = occurrence.instance_date.and_time(start_time);
        occurrence.start = resolve_wall_clock(tz, start_wall).with_timezone(&Utc);

        let end_wall = match patch.end_time {
            Some(end_time) => {
                let mut end_wall = occurrence.instance_date.and_time(end_time);
                // An end time at or before the start means the instance runs
                // past midnight.
                if end_wall <= start_wall {
                    end_wall += Duration::days(1);
                }
                end_wall
            }
            // Start moved, end untouched: hold the wall-clock duration.
            None => start_wall + series.base.end.signed_duration_since(series.base.start),
        };
        occurrence.end = resolve_wall_clock(tz, end_wall).with_timezone(&Utc);
    }

    occurrence
}

/// Add `date` to the exception set.
///
/// # Errors
///
/// [`SeriesError::DuplicateException`] when the date is already excluded,
/// [`SeriesError::OverrideConflict`] when the date carries an override (the
/// instance must be restored before it can be excluded).
pub fn add_exception_date(series: &SeriesDefinition, date: NaiveDate) -> Result<SeriesDefinition> {
    if series.is_excluded(date) {
        return Err(SeriesError::DuplicateException(date));
    }
    if series.overrides.contains_key(&date) {
        return Err(SeriesError::OverrideConflict(date));
    }
    let mut next = series.clone();
    next.exceptions.push(date);
    next.exceptions.sort_unstable();
    Ok(next)
}

/// Remove `date` from the exception set. A date that was never excluded is a
/// no-op, not an error.
pub fn remove_exception_date(series: &SeriesDefinition, date: NaiveDate) -> SeriesDefinition {
    let mut next = series.clone();
    next.exceptions.retain(|d| *d != date);
    next
}

/// Create or replace a CHANGED override for `date`.
///
/// # Errors
///
/// [`SeriesError::ExceptionConflict`] when the date is excluded — remove the
/// exception first.
pub fn set_override(
    series: &SeriesDefinition,
    date: NaiveDate,
    patch: InstancePatch,
) -> Result<SeriesDefinition> {
    if series.is_excluded(date) {
        return Err(SeriesError::ExceptionConflict(date));
    }
    let mut next = series.clone();
    next.overrides.insert(date, InstanceOverride::Changed(patch));
    Ok(next)
}

/// Remove a CHANGED or CANCELLED override for `date`. Absent overrides are a
/// no-op.
pub fn clear_override(series: &SeriesDefinition, date: NaiveDate) -> SeriesDefinition {
    let mut next = series.clone();
    next.overrides.remove(&date);
    next
}

/// Cancel the instance on `date`, keeping it visible in expansions with
/// `is_cancelled` set and `reason` attached. Overwrites any existing
/// override for that date.
///
/// `today` is passed in rather than read from the ambient clock so the check
/// stays pure and testable; callers supply the current date in the series
/// timezone.
///
/// # Errors
///
/// [`SeriesError::PastInstanceCancellation`] when `date` is strictly before
/// `today`, [`SeriesError::ExceptionConflict`] when the date is excluded.
pub fn cancel_instance(
    series: &SeriesDefinition,
    date: NaiveDate,
    reason: Option<String>,
    today: NaiveDate,
) -> Result<SeriesDefinition> {
    if date < today {
        return Err(SeriesError::PastInstanceCancellation { date, today });
    }
    if series.is_excluded(date) {
        return Err(SeriesError::ExceptionConflict(date));
    }
    let mut next = series.clone();
    next.overrides.insert(date, InstanceOverride::Cancelled { reason });
    Ok(next)
}

/// Remove any override (of either kind) for `date`, returning the instance
/// to its generated state. Absent overrides are a no-op.
pub fn restore_instance(series: &SeriesDefinition, date: NaiveDate) -> SeriesDefinition {
    clear_override(series, date)
}
