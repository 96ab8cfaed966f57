//! Occurrence expansion — the algorithmic heart of the engine.
//!
//! [`expand`] walks a series' recurrence periods from the base date forward
//! and materializes every candidate date that survives the rule's bounds
//! (COUNT/UNTIL), the exception set, and the query window. Overrides are a
//! separate pass ([`crate::overrides::apply_overrides`]) so each stage stays
//! individually testable; [`expand_with_overrides`] composes the two for
//! callers that want the final list.
//!
//! COUNT semantics: COUNT bounds the series' total cardinality, not the
//! windowed result. Candidates before the window (and candidates suppressed
//! by an exception date) still consume COUNT slots, so the same series
//! expanded over different windows never disagrees about which instance is
//! the last one.

use chrono::{Datelike, Duration, NaiveDate, Utc};

use crate::dst::resolve_wall_clock;
use crate::overrides::apply_overrides;
use crate::rule::{self, Frequency, RecurrenceRule};
use crate::series::{Occurrence, SeriesDefinition};
use crate::validate::validate;

/// Expand a series into the ordered occurrences intersecting
/// `[window_start, window_end]` (both inclusive, series-local calendar
/// dates).
///
/// Exception dates are already excluded from the result; per-instance
/// overrides are NOT yet applied. Output is ascending by start time.
///
/// An unparseable or invalid rule yields an empty list rather than an error:
/// one corrupt series must not break rendering of a whole calendar view.
/// The authoring write path is responsible for running
/// [`crate::validate::validate`] before persisting so this degradation stays
/// an edge case, and the calling layer is expected to log it.
pub fn expand(
    series: &SeriesDefinition,
    window_start: NaiveDate,
    window_end: NaiveDate,
) -> Vec<Occurrence> {
    if window_start > window_end {
        return Vec::new();
    }
    let Ok(parsed) = rule::parse(&series.rule) else {
        return Vec::new();
    };
    if !validate(&parsed).is_empty() {
        return Vec::new();
    }
    let Some(frequency) = parsed.frequency else {
        return Vec::new();
    };

    let base_date = series.base.start.date();
    let start_time = series.base.start.time();
    let duration = series.base.end.signed_duration_since(series.base.start);

    // Periods whose start is past this date cannot contribute anything:
    // UNTIL ends generation, window_end ends the scan.
    let scan_stop = match parsed.until {
        Some(until) => until.min(window_end),
        None => window_end,
    };
    if scan_stop < base_date {
        return Vec::new();
    }

    let mut occurrences = Vec::new();
    let mut produced: i32 = 0;

    'periods: for period in 0.. {
        let Some((period_start, candidates)) =
            period_dates(&parsed, frequency, base_date, period)
        else {
            break;
        };
        if period_start > scan_stop {
            break;
        }

        for date in candidates {
            if let Some(until) = parsed.until {
                if date > until {
                    break 'periods;
                }
            }
            if let Some(count) = parsed.count {
                if produced >= count {
                    break 'periods;
                }
            }
            // The candidate is generated: it consumes a COUNT slot whether
            // or not the window or the exception set lets it through.
            produced += 1;

            if date > window_end {
                break 'periods;
            }
            if series.is_excluded(date) {
                continue;
            }
            if date >= window_start {
                let start_wall = date.and_time(start_time);
                let start = resolve_wall_clock(series.base.timezone, start_wall);
                let end = resolve_wall_clock(series.base.timezone, start_wall + duration);
                occurrences.push(Occurrence {
                    parent_event_id: series.base.id,
                    instance_date: date,
                    start: start.with_timezone(&Utc),
                    end: end.with_timezone(&Utc),
                    is_recurring_instance: true,
                    title: series.base.title.clone(),
                    description: series.base.description.clone(),
                    location: series.base.location.clone(),
                    category: series.base.category.clone(),
                    tags: series.base.tags.clone(),
                    extra: series.base.extra.clone(),
                    is_cancelled: false,
                    cancellation_reason: None,
                });
            }
        }
    }

    occurrences
}

/// [`expand`], then apply the series' per-instance overrides.
pub fn expand_with_overrides(
    series: &SeriesDefinition,
    window_start: NaiveDate,
    window_end: NaiveDate,
) -> Vec<Occurrence> {
    apply_overrides(expand(series, window_start, window_end), series)
}

/// The candidate dates of recurrence period `k`, ascending, already filtered
/// to `>= base` (dates in the base period before the base date were never
/// part of the series).
///
/// Returns the period's start date alongside so the caller can terminate the
/// scan on an empty period, and `None` when date arithmetic leaves the
/// representable range.
fn period_dates(
    rule: &RecurrenceRule,
    frequency: Frequency,
    base: NaiveDate,
    k: i32,
) -> Option<(NaiveDate, Vec<NaiveDate>)> {
    let interval = i64::from(rule.interval);
    let step = i64::from(k) * interval;

    match frequency {
        Frequency::Daily => {
            let date = base.checked_add_signed(Duration::days(step))?;
            Some((date, vec![date]))
        }
        Frequency::Weekly => {
            let base_offset = i64::from(base.weekday().num_days_from_monday());
            let base_week = base - Duration::days(base_offset);
            let week_start = base_week.checked_add_signed(Duration::days(step * 7))?;

            let mut dates = Vec::new();
            if rule.by_weekdays.is_empty() {
                // No BYDAY: the base date's own weekday.
                let date = week_start + Duration::days(base_offset);
                if date >= base {
                    dates.push(date);
                }
            } else {
                // Monday-first iteration keeps candidates in weekday order
                // within the bucket.
                for offset in 0..7 {
                    let date = week_start + Duration::days(offset);
                    if date < base {
                        continue;
                    }
                    if rule.by_weekdays.iter().any(|e| e.weekday == date.weekday()) {
                        dates.push(date);
                    }
                }
            }
            Some((week_start, dates))
        }
        Frequency::Monthly => {
            let (year, month) = add_months(base.year(), base.month(), step)?;
            let first = NaiveDate::from_ymd_opt(year, month, 1)?;
            Some((first, month_candidates(rule, base, year, month)))
        }
        Frequency::Yearly => {
            let year = i32::try_from(i64::from(base.year()) + step).ok()?;
            let first = NaiveDate::from_ymd_opt(year, base.month(), 1)?;
            let mut dates = Vec::new();
            // Month/day preserved verbatim: a Feb-29 anchor produces nothing
            // in non-leap years, matching the monthly no-clamp rule.
            if let Some(date) = NaiveDate::from_ymd_opt(year, base.month(), base.day()) {
                if date >= base {
                    dates.push(date);
                }
            }
            Some((first, dates))
        }
    }
}

/// Candidate dates within one month, per the monthly selection rules.
fn month_candidates(
    rule: &RecurrenceRule,
    base: NaiveDate,
    year: i32,
    month: u32,
) -> Vec<NaiveDate> {
    let mut dates: Vec<NaiveDate> = Vec::new();

    if let Some(day) = rule.by_month_day {
        // Fixed day-of-month; negative counts from the month's end. Months
        // lacking the day produce no occurrence — no clamping or rollover.
        let last = i32::try_from(days_in_month(year, month)).unwrap_or(28);
        let resolved = if day > 0 { day } else { last + 1 + day };
        if (1..=last).contains(&resolved) {
            if let Some(date) = NaiveDate::from_ymd_opt(year, month, resolved as u32) {
                dates.push(date);
            }
        }
    } else if !rule.by_weekdays.is_empty() {
        let matches = weekday_matches(rule, year, month);
        if !rule.by_set_positions.is_empty() {
            // BYSETPOS indexes into the combined match set, 1-based from the
            // front, negative from the back.
            for &position in &rule.by_set_positions {
                if let Some(date) = select_position(&matches, position) {
                    dates.push(date);
                }
            }
        } else if rule.by_weekdays.iter().any(|e| e.ordinal.is_some()) {
            // Inline ordinals (`2TU`, `-1FR`) select within that weekday's
            // own match list; plain entries alongside keep all their dates.
            for entry in &rule.by_weekdays {
                let own: Vec<NaiveDate> = matches
                    .iter()
                    .copied()
                    .filter(|d| d.weekday() == entry.weekday)
                    .collect();
                match entry.ordinal {
                    Some(ordinal) => {
                        if let Some(date) = select_position(&own, ordinal) {
                            dates.push(date);
                        }
                    }
                    None => dates.extend(own),
                }
            }
        } else {
            dates = matches;
        }
    } else if let Some(date) = NaiveDate::from_ymd_opt(year, month, base.day()) {
        // Neither BYDAY nor BYMONTHDAY: the base date's day-of-month, in
        // months that have it.
        dates.push(date);
    }

    dates.sort_unstable();
    dates.dedup();
    dates.retain(|d| *d >= base);
    dates
}

/// All dates in the month whose weekday appears in the rule's BYDAY list,
/// ascending.
fn weekday_matches(rule: &RecurrenceRule, year: i32, month: u32) -> Vec<NaiveDate> {
    (1..=days_in_month(year, month))
        .filter_map(|day| NaiveDate::from_ymd_opt(year, month, day))
        .filter(|d| rule.by_weekdays.iter().any(|e| e.weekday == d.weekday()))
        .collect()
}

/// Select the element at a 1-based position, negative from the back.
/// Position 0 and out-of-range positions select nothing.
fn select_position(matches: &[NaiveDate], position: i32) -> Option<NaiveDate> {
    let len = i32::try_from(matches.len()).ok()?;
    let index = if position > 0 {
        position - 1
    } else if position < 0 {
        len + position
    } else {
        return None;
    };
    if (0..len).contains(&index) {
        matches.get(index as usize).copied()
    } else {
        None
    }
}

fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|d| d.pred_opt())
        .map_or(28, |d| d.day())
}

/// Month arithmetic on (year, month), step in whole months.
fn add_months(year: i32, month: u32, step: i64) -> Option<(i32, u32)> {
    let absolute = i64::from(year) * 12 + i64::from(month) - 1 + step;
    let year = i32::try_from(absolute.div_euclid(12)).ok()?;
    let month = u32::try_from(absolute.rem_euclid(12) + 1).ok()?;
    Some((year, month))
}
