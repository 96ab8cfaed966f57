//! Recurrence rule value type and its textual `KEY=VALUE;KEY=VALUE` encoding.
//!
//! The stored form of a rule is a `;`-separated list of `KEY=VALUE` segments
//! (`FREQ=MONTHLY;BYDAY=FR;BYSETPOS=-1`). [`parse`] turns that text into a
//! typed [`RecurrenceRule`], [`serialize`] emits it back in a stable field
//! order, and [`describe`] renders a one-line human-readable summary for the
//! admin UI.
//!
//! The parser is deliberately lenient: unknown keys are skipped and a missing
//! or unrecognized FREQ is carried through as-is. Whether a rule is actually
//! usable is the validator's call ([`crate::validate`]), not the parser's —
//! the parser only fails when a value cannot be coerced to its expected type.

use chrono::{NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SeriesError};

/// Recurrence frequency — the unit a rule steps in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl Frequency {
    /// The textual token used in rule text.
    pub fn token(self) -> &'static str {
        match self {
            Frequency::Daily => "DAILY",
            Frequency::Weekly => "WEEKLY",
            Frequency::Monthly => "MONTHLY",
            Frequency::Yearly => "YEARLY",
        }
    }

    fn from_token(token: &str) -> Option<Self> {
        match token {
            "DAILY" => Some(Frequency::Daily),
            "WEEKLY" => Some(Frequency::Weekly),
            "MONTHLY" => Some(Frequency::Monthly),
            "YEARLY" => Some(Frequency::Yearly),
            _ => None,
        }
    }
}

/// One BYDAY entry: a weekday with an optional ordinal position.
///
/// The ordinal selects the Nth occurrence of the weekday within the period
/// (negative counts from the end), exactly like a BYSETPOS applied to that
/// single weekday. `-1FR` is "the last Friday", `2TU` "the second Tuesday".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByDayEntry {
    pub weekday: Weekday,
    pub ordinal: Option<i32>,
}

impl ByDayEntry {
    pub fn plain(weekday: Weekday) -> Self {
        ByDayEntry {
            weekday,
            ordinal: None,
        }
    }

    pub fn nth(ordinal: i32, weekday: Weekday) -> Self {
        ByDayEntry {
            weekday,
            ordinal: Some(ordinal),
        }
    }

    /// Render as a rule-text token (`TU`, `-1FR`).
    pub fn token(&self) -> String {
        match self.ordinal {
            Some(n) => format!("{}{}", n, weekday_code(self.weekday)),
            None => weekday_code(self.weekday).to_string(),
        }
    }

    fn from_token(token: &str) -> Option<Self> {
        if token.len() < 2 {
            return None;
        }
        let (prefix, code) = token.split_at(token.len() - 2);
        let weekday = weekday_from_code(code)?;
        if prefix.is_empty() {
            return Some(ByDayEntry::plain(weekday));
        }
        let ordinal = prefix.parse::<i32>().ok()?;
        Some(ByDayEntry::nth(ordinal, weekday))
    }
}

// BYDAY entries cross the JSON boundary as their rule-text tokens, so the
// CLI and WASM surfaces see `["TU", "-1FR"]` rather than nested objects.
impl Serialize for ByDayEntry {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.token())
    }
}

impl<'de> Deserialize<'de> for ByDayEntry {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let token = String::deserialize(deserializer)?;
        ByDayEntry::from_token(&token)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid BYDAY token '{}'", token)))
    }
}

/// A parsed recurrence rule. Immutable once parsed; construction goes through
/// [`parse`] or the field initializers in tests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecurrenceRule {
    /// Recognized FREQ value, `None` when FREQ was absent or unrecognized.
    #[serde(default)]
    pub frequency: Option<Frequency>,
    /// FREQ token that was present but not one of the four known values.
    /// Kept so validation can distinguish "missing" from "unrecognized".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unknown_frequency: Option<String>,
    /// Step between occurrences in units of `frequency`. Defaults to 1.
    #[serde(default = "default_interval")]
    pub interval: i32,
    /// BYDAY list, in the order written.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub by_weekdays: Vec<ByDayEntry>,
    /// BYSETPOS list; selects the Nth (negative: Nth-from-end) candidate from
    /// the weekday match set of a monthly period.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub by_set_positions: Vec<i32>,
    /// BYMONTHDAY: fixed day-of-month.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub by_month_day: Option<i32>,
    /// COUNT: hard cap on total occurrences ever generated by the series.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<i32>,
    /// UNTIL: inclusive last calendar date, day granularity in series-local
    /// time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub until: Option<NaiveDate>,
}

fn default_interval() -> i32 {
    1
}

impl Default for RecurrenceRule {
    fn default() -> Self {
        RecurrenceRule {
            frequency: None,
            unknown_frequency: None,
            interval: 1,
            by_weekdays: Vec::new(),
            by_set_positions: Vec::new(),
            by_month_day: None,
            count: None,
            until: None,
        }
    }
}

fn weekday_code(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "MO",
        Weekday::Tue => "TU",
        Weekday::Wed => "WE",
        Weekday::Thu => "TH",
        Weekday::Fri => "FR",
        Weekday::Sat => "SA",
        Weekday::Sun => "SU",
    }
}

fn weekday_from_code(code: &str) -> Option<Weekday> {
    match code {
        "MO" => Some(Weekday::Mon),
        "TU" => Some(Weekday::Tue),
        "WE" => Some(Weekday::Wed),
        "TH" => Some(Weekday::Thu),
        "FR" => Some(Weekday::Fri),
        "SA" => Some(Weekday::Sat),
        "SU" => Some(Weekday::Sun),
        _ => None,
    }
}

fn malformed(segment: &str, reason: impl Into<String>) -> SeriesError {
    SeriesError::MalformedRule {
        segment: segment.to_string(),
        reason: reason.into(),
    }
}

fn parse_int(segment: &str, value: &str) -> Result<i32> {
    value
        .trim()
        .parse::<i32>()
        .map_err(|_| malformed(segment, format!("'{}' is not an integer", value)))
}

/// Parse an UNTIL value. Accepts the iCalendar basic forms `YYYYMMDD` and
/// `YYYYMMDDTHHMMSS[Z]` as well as the ISO form `YYYY-MM-DD`; any time part
/// is discarded since UNTIL is compared at day granularity.
fn parse_until(segment: &str, value: &str) -> Result<NaiveDate> {
    let compact: String = value
        .chars()
        .filter(|c| *c != '-')
        .take_while(|c| c.is_ascii_digit())
        .collect();
    if compact.len() < 8 {
        return Err(malformed(segment, format!("'{}' is not a date", value)));
    }
    let year = compact[0..4].parse::<i32>();
    let month = compact[4..6].parse::<u32>();
    let day = compact[6..8].parse::<u32>();
    match (year, month, day) {
        (Ok(y), Ok(m), Ok(d)) => NaiveDate::from_ymd_opt(y, m, d)
            .ok_or_else(|| malformed(segment, format!("'{}' is not a valid calendar date", value))),
        _ => Err(malformed(segment, format!("'{}' is not a date", value))),
    }
}

/// Parse rule text into a [`RecurrenceRule`].
///
/// Splits on `;`, treats each segment as a `KEY=VALUE` pair (keys are
/// case-insensitive), ignores unknown keys and segments without `=`.
///
/// # Errors
///
/// Returns [`SeriesError::MalformedRule`] only when a known key carries a
/// value that cannot be coerced: a non-integer INTERVAL/COUNT/BYSETPOS/
/// BYMONTHDAY, a BYDAY token that is not an optionally-signed-prefixed
/// two-letter weekday code, or an UNTIL that is not a date. A missing or
/// unrecognized FREQ is *not* an error here — see [`crate::validate`].
pub fn parse(text: &str) -> Result<RecurrenceRule> {
    let mut rule = RecurrenceRule::default();

    for segment in text.split(';') {
        let segment = segment.trim();
        if segment.is_empty() {
            continue;
        }
        let Some((key, value)) = segment.split_once('=') else {
            continue;
        };
        let key = key.trim().to_ascii_uppercase();
        let value = value.trim();

        match key.as_str() {
            "FREQ" => {
                let token = value.to_ascii_uppercase();
                match Frequency::from_token(&token) {
                    Some(freq) => rule.frequency = Some(freq),
                    None => rule.unknown_frequency = Some(value.to_string()),
                }
            }
            "INTERVAL" => rule.interval = parse_int(segment, value)?,
            "BYDAY" => {
                for token in value.split(',') {
                    let token = token.trim().to_ascii_uppercase();
                    let entry = ByDayEntry::from_token(&token).ok_or_else(|| {
                        malformed(segment, format!("'{}' is not a weekday token", token))
                    })?;
                    rule.by_weekdays.push(entry);
                }
            }
            "BYSETPOS" => {
                for token in value.split(',') {
                    rule.by_set_positions.push(parse_int(segment, token)?);
                }
            }
            "BYMONTHDAY" => rule.by_month_day = Some(parse_int(segment, value)?),
            "COUNT" => rule.count = Some(parse_int(segment, value)?),
            "UNTIL" => rule.until = Some(parse_until(segment, value)?),
            // Unknown keys (WKST, BYMONTH, ...) are tolerated and skipped.
            _ => {}
        }
    }

    Ok(rule)
}

/// Serialize a rule back to its textual encoding.
///
/// FREQ comes first, remaining fields follow in a stable order, unset
/// optional fields are omitted, and INTERVAL is omitted at its default of 1.
/// `parse(&serialize(rule))` reproduces an equivalent rule.
pub fn serialize(rule: &RecurrenceRule) -> String {
    let mut segments: Vec<String> = Vec::new();

    if let Some(freq) = rule.frequency {
        segments.push(format!("FREQ={}", freq.token()));
    } else if let Some(raw) = &rule.unknown_frequency {
        segments.push(format!("FREQ={}", raw));
    }
    if rule.interval != 1 {
        segments.push(format!("INTERVAL={}", rule.interval));
    }
    if !rule.by_weekdays.is_empty() {
        let days: Vec<String> = rule.by_weekdays.iter().map(ByDayEntry::token).collect();
        segments.push(format!("BYDAY={}", days.join(",")));
    }
    if !rule.by_set_positions.is_empty() {
        let positions: Vec<String> = rule.by_set_positions.iter().map(i32::to_string).collect();
        segments.push(format!("BYSETPOS={}", positions.join(",")));
    }
    if let Some(day) = rule.by_month_day {
        segments.push(format!("BYMONTHDAY={}", day));
    }
    if let Some(count) = rule.count {
        segments.push(format!("COUNT={}", count));
    }
    if let Some(until) = rule.until {
        segments.push(format!("UNTIL={}", until.format("%Y%m%d")));
    }

    segments.join(";")
}

fn weekday_name(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

fn ordinal_name(n: i32) -> String {
    match n {
        -1 => "last".to_string(),
        n if n < 0 => format!("{} from last", ordinal_name(-n)),
        1 => "1st".to_string(),
        2 => "2nd".to_string(),
        3 => "3rd".to_string(),
        n => format!("{}th", n),
    }
}

fn join_names(names: &[String]) -> String {
    match names {
        [] => String::new(),
        [single] => single.clone(),
        [head @ .., tail] => format!("{} and {}", head.join(", "), tail),
    }
}

/// Render a one-line human-readable description of a rule, e.g.
/// `"Monthly on the last Friday, until Dec 31, 2025"`.
///
/// The exact wording is a UI convenience and not load-bearing for expansion.
pub fn describe(rule: &RecurrenceRule) -> String {
    let Some(freq) = rule.frequency else {
        return "Does not repeat".to_string();
    };

    let mut text = if rule.interval == 1 {
        match freq {
            Frequency::Daily => "Daily".to_string(),
            Frequency::Weekly => "Weekly".to_string(),
            Frequency::Monthly => "Monthly".to_string(),
            Frequency::Yearly => "Yearly".to_string(),
        }
    } else {
        let unit = match freq {
            Frequency::Daily => "days",
            Frequency::Weekly => "weeks",
            Frequency::Monthly => "months",
            Frequency::Yearly => "years",
        };
        format!("Every {} {}", rule.interval, unit)
    };

    if !rule.by_weekdays.is_empty() {
        if !rule.by_set_positions.is_empty() {
            // BYSETPOS selects from the combined weekday match set.
            let positions: Vec<String> =
                rule.by_set_positions.iter().map(|&p| ordinal_name(p)).collect();
            let days: Vec<String> = rule
                .by_weekdays
                .iter()
                .map(|e| weekday_name(e.weekday).to_string())
                .collect();
            text.push_str(&format!(
                " on the {} {}",
                join_names(&positions),
                join_names(&days)
            ));
        } else {
            let days: Vec<String> = rule
                .by_weekdays
                .iter()
                .map(|e| match e.ordinal {
                    Some(n) => format!("the {} {}", ordinal_name(n), weekday_name(e.weekday)),
                    None => weekday_name(e.weekday).to_string(),
                })
                .collect();
            text.push_str(&format!(" on {}", join_names(&days)));
        }
    } else if let Some(day) = rule.by_month_day {
        text.push_str(&format!(" on day {}", day));
    }

    if let Some(count) = rule.count {
        if count == 1 {
            text.push_str(", for 1 occurrence");
        } else {
            text.push_str(&format!(", for {} occurrences", count));
        }
    }
    if let Some(until) = rule.until {
        text.push_str(&format!(", until {}", until.format("%b %-d, %Y")));
    }

    text
}
