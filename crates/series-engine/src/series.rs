//! Series, override, and occurrence value types.
//!
//! A [`SeriesDefinition`] is the persisted recurring-event record: the base
//! event, the stored rule text, the exception-date set, and the per-instance
//! override map. [`Occurrence`] values are the ephemeral expansion output —
//! recomputed on every read, identified only by (series id, instance date),
//! never persisted.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Result, SeriesError};

/// The base event a series generates occurrences from.
///
/// `start`/`end` are wall-clock times in `timezone`; every other field is
/// calendar-side data the engine copies onto occurrences verbatim. Fields the
/// engine has no opinion about (organizer, map coordinates, ...) travel in
/// `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaseEvent {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Wall-clock start in `timezone`.
    pub start: NaiveDateTime,
    /// Wall-clock end in `timezone`.
    pub end: NaiveDateTime,
    /// IANA timezone the series lives in.
    pub timezone: Tz,
    /// Opaque pass-through fields from the base-event store.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub extra: Map<String, Value>,
}

/// Partial field set of a CHANGED override. Unset fields keep the generated
/// occurrence's values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstancePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Replacement wall-clock start time on the instance date.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<NaiveTime>,
    /// Replacement wall-clock end time on the instance date.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<NaiveTime>,
}

/// A per-instance override, keyed by instance date in
/// [`SeriesDefinition::overrides`].
///
/// Changed overrides modify a still-visible instance; cancelled overrides
/// keep it in the expansion flagged as cancelled. Removing an instance
/// entirely is the exception set's job, a separate mechanism.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum InstanceOverride {
    Changed(InstancePatch),
    Cancelled {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },
}

/// A persisted recurring-event definition: base event + rule text +
/// exception dates + per-instance overrides.
///
/// Treated as an immutable snapshot per expansion call. The mutation
/// operations in [`crate::overrides`] never modify a value in place; they
/// return a new definition with the exception set or override map replaced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesDefinition {
    pub base: BaseEvent,
    /// Stored rule text (`FREQ=...;...`), parsed on each expansion.
    pub rule: String,
    /// Calendar dates (series-local) that never produce an occurrence.
    /// Sorted ascending.
    #[serde(default)]
    pub exceptions: Vec<NaiveDate>,
    /// Per-instance overrides keyed by the date they replace.
    #[serde(default)]
    pub overrides: BTreeMap<NaiveDate, InstanceOverride>,
    /// Series-level default title, between override and base in precedence.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_title: Option<String>,
    /// Series-level default description, between override and base in
    /// precedence.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_description: Option<String>,
}

impl SeriesDefinition {
    /// Bare definition with no exceptions, overrides, or series defaults.
    pub fn new(base: BaseEvent, rule: impl Into<String>) -> Self {
        SeriesDefinition {
            base,
            rule: rule.into(),
            exceptions: Vec::new(),
            overrides: BTreeMap::new(),
            default_title: None,
            default_description: None,
        }
    }

    /// Whether `date` is in the exception set.
    pub fn is_excluded(&self, date: NaiveDate) -> bool {
        // Linear scan: exception sets are a handful of dates at most, and
        // hand-built definitions are not guaranteed to arrive sorted.
        self.exceptions.contains(&date)
    }
}

/// Resolve an IANA timezone identifier from the persistence layer.
///
/// # Errors
///
/// Returns [`SeriesError::InvalidTimezone`] when the identifier is unknown
/// to the host timezone database.
pub fn parse_timezone(name: &str) -> Result<Tz> {
    name.parse::<Tz>()
        .map_err(|_| SeriesError::InvalidTimezone(name.to_string()))
}

/// Validate a raw instance-date input from the HTTP layer.
///
/// The API contract requires instance dates to match `YYYY-MM-DD` exactly.
///
/// # Errors
///
/// Returns [`SeriesError::MissingInstanceDate`] when the input is absent or
/// empty, [`SeriesError::InvalidInstanceDate`] when it does not match the
/// pattern or names an impossible date.
pub fn parse_instance_date(raw: Option<&str>) -> Result<NaiveDate> {
    let raw = match raw {
        Some(s) if !s.trim().is_empty() => s.trim(),
        _ => return Err(SeriesError::MissingInstanceDate),
    };

    let bytes = raw.as_bytes();
    let shape_ok = bytes.len() == 10
        && bytes[4] == b'-'
        && bytes[7] == b'-'
        && bytes
            .iter()
            .enumerate()
            .all(|(i, b)| i == 4 || i == 7 || b.is_ascii_digit());
    if !shape_ok {
        return Err(SeriesError::InvalidInstanceDate(raw.to_string()));
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| SeriesError::InvalidInstanceDate(raw.to_string()))
}

/// A single concrete calendar instance generated from a series.
///
/// Ephemeral: carries no identity beyond (`parent_event_id`,
/// `instance_date`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Occurrence {
    /// The series/base event this instance was generated from.
    pub parent_event_id: i64,
    /// The calendar date (series-local) this instance falls on.
    pub instance_date: NaiveDate,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// Always true for expansion output; lets the calling layer distinguish
    /// generated instances from one-off events in a mixed list.
    pub is_recurring_instance: bool,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub extra: Map<String, Value>,
    /// Set by override resolution; cancelled instances stay in the list so
    /// the calendar UI can render them struck through.
    #[serde(default)]
    pub is_cancelled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cancellation_reason: Option<String>,
}
