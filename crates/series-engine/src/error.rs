//! Error types for series-engine operations.

use chrono::NaiveDate;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SeriesError {
    /// A rule-text segment carried a value that could not be coerced to its
    /// expected type. Raised by the parser, never by the expander.
    #[error("Malformed rule segment '{segment}': {reason}")]
    MalformedRule { segment: String, reason: String },

    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),

    /// An instance-date input was absent or empty.
    #[error("Instance date is required (expected YYYY-MM-DD)")]
    MissingInstanceDate,

    /// An instance-date input did not match `YYYY-MM-DD`.
    #[error("Invalid instance date '{0}' (expected YYYY-MM-DD)")]
    InvalidInstanceDate(String),

    /// The date is already present in the exception set.
    #[error("Date {0} is already excluded from this series")]
    DuplicateException(NaiveDate),

    /// The date carries an override; it must be restored before it can be
    /// excluded.
    #[error("Date {0} has an instance override; restore the instance before excluding it")]
    OverrideConflict(NaiveDate),

    /// The date is in the exception set; the exception must be removed before
    /// the instance can be overridden or cancelled.
    #[error("Date {0} is excluded from this series; remove the exception first")]
    ExceptionConflict(NaiveDate),

    /// Instances strictly before today cannot be retroactively cancelled.
    #[error("Cannot cancel instance on {date}: date is in the past (today is {today})")]
    PastInstanceCancellation { date: NaiveDate, today: NaiveDate },
}

pub type Result<T> = std::result::Result<T, SeriesError>;
