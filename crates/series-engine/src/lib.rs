//! # series-engine
//!
//! Recurring-event expansion engine for the meetup calendar.
//!
//! Translates a stored series definition — rule text, exception dates,
//! per-instance overrides — into the concrete, timezone-correct occurrence
//! list for a queried date window. The surrounding website (HTTP layer,
//! persistence, ICS feed) treats this crate as a pure function over value
//! types: no I/O, no clocks, no shared state.
//!
//! ## Modules
//!
//! - [`rule`] — rule text ⇄ [`RecurrenceRule`], plus human-readable
//!   descriptions
//! - [`validate`] — named consistency checks for the authoring write path
//! - [`expand`] — series + window → ordered occurrences
//! - [`overrides`] — override overlay and exception/override mutations
//! - [`series`] — series, override, and occurrence value types
//! - [`dst`] — wall-clock resolution across DST transitions
//! - [`error`] — error types

pub mod dst;
pub mod error;
pub mod expand;
pub mod overrides;
pub mod rule;
pub mod series;
pub mod validate;

pub use error::SeriesError;
pub use expand::{expand, expand_with_overrides};
pub use overrides::{
    add_exception_date, apply_overrides, cancel_instance, clear_override, remove_exception_date,
    restore_instance, set_override,
};
pub use rule::{describe, parse, serialize, ByDayEntry, Frequency, RecurrenceRule};
pub use series::{
    parse_instance_date, parse_timezone, BaseEvent, InstanceOverride, InstancePatch, Occurrence,
    SeriesDefinition,
};
pub use validate::{validate, RuleViolation};
