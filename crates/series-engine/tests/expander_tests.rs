//! Tests for occurrence expansion.

use chrono::{NaiveDate, NaiveDateTime, TimeZone, Utc};
use series_engine::{expand, BaseEvent, Occurrence, SeriesDefinition};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn wall(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S").unwrap()
}

fn series(rule: &str, start: &str, end: &str, timezone: &str) -> SeriesDefinition {
    SeriesDefinition::new(
        BaseEvent {
            id: 42,
            title: "Monthly board-game night".to_string(),
            description: Some("Bring a game".to_string()),
            location: Some("Club cellar".to_string()),
            category: Some("games".to_string()),
            tags: vec!["regular".to_string()],
            start: wall(start),
            end: wall(end),
            timezone: timezone.parse().unwrap(),
            extra: serde_json::Map::new(),
        },
        rule,
    )
}

fn instance_dates(occurrences: &[Occurrence]) -> Vec<(i32, u32, u32)> {
    use chrono::Datelike;
    occurrences
        .iter()
        .map(|o| {
            (
                o.instance_date.year(),
                o.instance_date.month(),
                o.instance_date.day(),
            )
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Weekly
// ---------------------------------------------------------------------------

#[test]
fn weekly_tuesdays_across_january() {
    // Base date is a Tuesday; January 2025 has exactly four Tuesdays left
    // from the 7th on.
    let s = series("FREQ=WEEKLY;BYDAY=TU", "2025-01-07T19:00:00", "2025-01-07T21:00:00", "UTC");
    let result = expand(&s, date(2025, 1, 1), date(2025, 1, 31));

    assert_eq!(
        instance_dates(&result),
        vec![(2025, 1, 7), (2025, 1, 14), (2025, 1, 21), (2025, 1, 28)]
    );
}

#[test]
fn weekly_without_byday_uses_base_weekday() {
    let s = series("FREQ=WEEKLY", "2025-01-07T19:00:00", "2025-01-07T21:00:00", "UTC");
    let result = expand(&s, date(2025, 1, 1), date(2025, 1, 31));

    assert_eq!(
        instance_dates(&result),
        vec![(2025, 1, 7), (2025, 1, 14), (2025, 1, 21), (2025, 1, 28)]
    );
}

#[test]
fn biweekly_tue_thu_skips_alternate_weeks() {
    let s = series(
        "FREQ=WEEKLY;INTERVAL=2;BYDAY=TU,TH;COUNT=8",
        "2026-01-06T10:00:00",
        "2026-01-06T11:00:00",
        "UTC",
    );
    let result = expand(&s, date(2026, 1, 1), date(2026, 12, 31));

    assert_eq!(
        instance_dates(&result),
        vec![
            (2026, 1, 6),
            (2026, 1, 8),
            (2026, 1, 20),
            (2026, 1, 22),
            (2026, 2, 3),
            (2026, 2, 5),
            (2026, 2, 17),
            (2026, 2, 19),
        ]
    );
}

#[test]
fn weekly_count_three_over_full_year() {
    let s = series(
        "FREQ=WEEKLY;BYDAY=TU;COUNT=3",
        "2025-01-07T19:00:00",
        "2025-01-07T21:00:00",
        "UTC",
    );
    let result = expand(&s, date(2025, 1, 1), date(2025, 12, 31));

    assert_eq!(
        instance_dates(&result),
        vec![(2025, 1, 7), (2025, 1, 14), (2025, 1, 21)]
    );
}

// ---------------------------------------------------------------------------
// Monthly: BYSETPOS and inline ordinals
// ---------------------------------------------------------------------------

#[test]
fn monthly_first_tuesday() {
    let s = series(
        "FREQ=MONTHLY;BYDAY=TU;BYSETPOS=1",
        "2025-01-07T19:00:00",
        "2025-01-07T21:00:00",
        "UTC",
    );
    let result = expand(&s, date(2025, 1, 1), date(2025, 6, 30));

    assert_eq!(
        instance_dates(&result),
        vec![
            (2025, 1, 7),
            (2025, 2, 4),
            (2025, 3, 4),
            (2025, 4, 1),
            (2025, 5, 6),
            (2025, 6, 3),
        ]
    );
}

#[test]
fn monthly_last_friday() {
    let s = series(
        "FREQ=MONTHLY;BYDAY=FR;BYSETPOS=-1",
        "2025-01-31T20:00:00",
        "2025-01-31T22:00:00",
        "UTC",
    );
    let result = expand(&s, date(2025, 1, 1), date(2025, 4, 30));

    assert_eq!(
        instance_dates(&result),
        vec![(2025, 1, 31), (2025, 2, 28), (2025, 3, 28), (2025, 4, 25)]
    );
}

#[test]
fn inline_ordinal_matches_bysetpos_form() {
    let setpos = series(
        "FREQ=MONTHLY;BYDAY=FR;BYSETPOS=-1",
        "2025-01-31T20:00:00",
        "2025-01-31T22:00:00",
        "UTC",
    );
    let inline = series(
        "FREQ=MONTHLY;BYDAY=-1FR",
        "2025-01-31T20:00:00",
        "2025-01-31T22:00:00",
        "UTC",
    );

    let window = (date(2025, 1, 1), date(2025, 12, 31));
    assert_eq!(
        instance_dates(&expand(&setpos, window.0, window.1)),
        instance_dates(&expand(&inline, window.0, window.1)),
    );
}

#[test]
fn monthly_third_tuesday_with_multiple_setpos() {
    // First and last Tuesday of each month.
    let s = series(
        "FREQ=MONTHLY;BYDAY=TU;BYSETPOS=1,-1",
        "2025-01-07T19:00:00",
        "2025-01-07T21:00:00",
        "UTC",
    );
    let result = expand(&s, date(2025, 1, 1), date(2025, 2, 28));

    assert_eq!(
        instance_dates(&result),
        vec![(2025, 1, 7), (2025, 1, 28), (2025, 2, 4), (2025, 2, 25)]
    );
}

#[test]
fn monthly_plain_byday_emits_every_matching_weekday() {
    let s = series(
        "FREQ=MONTHLY;BYDAY=FR",
        "2025-02-07T20:00:00",
        "2025-02-07T22:00:00",
        "UTC",
    );
    let result = expand(&s, date(2025, 2, 1), date(2025, 2, 28));

    assert_eq!(
        instance_dates(&result),
        vec![(2025, 2, 7), (2025, 2, 14), (2025, 2, 21), (2025, 2, 28)]
    );
}

// ---------------------------------------------------------------------------
// Monthly: BYMONTHDAY
// ---------------------------------------------------------------------------

#[test]
fn monthday_31_skips_short_months() {
    let s = series(
        "FREQ=MONTHLY;BYMONTHDAY=31",
        "2025-01-31T19:00:00",
        "2025-01-31T21:00:00",
        "UTC",
    );
    let result = expand(&s, date(2025, 1, 1), date(2025, 12, 31));

    assert_eq!(
        instance_dates(&result),
        vec![
            (2025, 1, 31),
            (2025, 3, 31),
            (2025, 5, 31),
            (2025, 7, 31),
            (2025, 8, 31),
            (2025, 10, 31),
            (2025, 12, 31),
        ]
    );
}

#[test]
fn monthly_without_selectors_keeps_base_day() {
    let s = series(
        "FREQ=MONTHLY",
        "2025-01-15T19:00:00",
        "2025-01-15T21:00:00",
        "UTC",
    );
    let result = expand(&s, date(2025, 1, 1), date(2025, 3, 31));

    assert_eq!(
        instance_dates(&result),
        vec![(2025, 1, 15), (2025, 2, 15), (2025, 3, 15)]
    );
}

// ---------------------------------------------------------------------------
// Daily and yearly
// ---------------------------------------------------------------------------

#[test]
fn daily_with_interval() {
    let s = series(
        "FREQ=DAILY;INTERVAL=3",
        "2025-06-01T09:00:00",
        "2025-06-01T10:00:00",
        "UTC",
    );
    let result = expand(&s, date(2025, 6, 1), date(2025, 6, 10));

    assert_eq!(
        instance_dates(&result),
        vec![(2025, 6, 1), (2025, 6, 4), (2025, 6, 7), (2025, 6, 10)]
    );
}

#[test]
fn yearly_preserves_month_and_day() {
    let s = series(
        "FREQ=YEARLY",
        "2024-07-20T12:00:00",
        "2024-07-20T18:00:00",
        "UTC",
    );
    let result = expand(&s, date(2024, 1, 1), date(2027, 12, 31));

    assert_eq!(
        instance_dates(&result),
        vec![(2024, 7, 20), (2025, 7, 20), (2026, 7, 20), (2027, 7, 20)]
    );
}

#[test]
fn yearly_feb_29_skips_non_leap_years() {
    let s = series(
        "FREQ=YEARLY",
        "2024-02-29T12:00:00",
        "2024-02-29T14:00:00",
        "UTC",
    );
    let result = expand(&s, date(2024, 1, 1), date(2029, 12, 31));

    assert_eq!(instance_dates(&result), vec![(2024, 2, 29), (2028, 2, 29)]);
}

// ---------------------------------------------------------------------------
// Bounding: COUNT, UNTIL, window
// ---------------------------------------------------------------------------

#[test]
fn count_consumes_candidates_before_the_window() {
    // COUNT bounds the series' total cardinality: seven candidates fall
    // before the window, so only three remain inside it.
    let s = series(
        "FREQ=DAILY;COUNT=10",
        "2025-01-01T09:00:00",
        "2025-01-01T10:00:00",
        "UTC",
    );
    let result = expand(&s, date(2025, 1, 8), date(2025, 1, 31));

    assert_eq!(
        instance_dates(&result),
        vec![(2025, 1, 8), (2025, 1, 9), (2025, 1, 10)]
    );
}

#[test]
fn count_consumes_exception_suppressed_candidates() {
    let mut s = series(
        "FREQ=WEEKLY;BYDAY=TU;COUNT=3",
        "2025-01-07T19:00:00",
        "2025-01-07T21:00:00",
        "UTC",
    );
    s.exceptions.push(date(2025, 1, 14));

    let result = expand(&s, date(2025, 1, 1), date(2025, 12, 31));

    // The excluded 14th still used up a COUNT slot.
    assert_eq!(instance_dates(&result), vec![(2025, 1, 7), (2025, 1, 21)]);
}

#[test]
fn until_is_inclusive_and_day_granular() {
    let s = series(
        "FREQ=DAILY;UNTIL=20250105",
        "2025-01-01T09:00:00",
        "2025-01-01T10:00:00",
        "UTC",
    );
    let result = expand(&s, date(2025, 1, 1), date(2025, 1, 31));

    assert_eq!(
        instance_dates(&result),
        vec![
            (2025, 1, 1),
            (2025, 1, 2),
            (2025, 1, 3),
            (2025, 1, 4),
            (2025, 1, 5),
        ]
    );
}

#[test]
fn tighter_of_count_and_until_wins() {
    // COUNT=3 bites before UNTIL does.
    let s = series(
        "FREQ=DAILY;COUNT=3;UNTIL=20250110",
        "2025-01-01T09:00:00",
        "2025-01-01T10:00:00",
        "UTC",
    );
    assert_eq!(expand(&s, date(2025, 1, 1), date(2025, 1, 31)).len(), 3);

    // UNTIL bites before COUNT does.
    let s = series(
        "FREQ=DAILY;COUNT=30;UNTIL=20250103",
        "2025-01-01T09:00:00",
        "2025-01-01T10:00:00",
        "UTC",
    );
    assert_eq!(expand(&s, date(2025, 1, 1), date(2025, 1, 31)).len(), 3);
}

#[test]
fn window_boundaries_are_inclusive() {
    let s = series(
        "FREQ=WEEKLY;BYDAY=TU",
        "2025-01-07T19:00:00",
        "2025-01-07T21:00:00",
        "UTC",
    );
    let result = expand(&s, date(2025, 1, 7), date(2025, 1, 14));

    assert_eq!(instance_dates(&result), vec![(2025, 1, 7), (2025, 1, 14)]);
}

#[test]
fn window_before_base_date_is_empty() {
    let s = series(
        "FREQ=WEEKLY;BYDAY=TU",
        "2025-01-07T19:00:00",
        "2025-01-07T21:00:00",
        "UTC",
    );
    assert!(expand(&s, date(2024, 1, 1), date(2024, 12, 31)).is_empty());
}

// ---------------------------------------------------------------------------
// Exceptions
// ---------------------------------------------------------------------------

#[test]
fn exception_date_round_trip() {
    let s = series(
        "FREQ=WEEKLY;BYDAY=TU",
        "2025-01-07T19:00:00",
        "2025-01-07T21:00:00",
        "UTC",
    );
    let window = (date(2025, 1, 1), date(2025, 1, 31));

    let excluded = series_engine::add_exception_date(&s, date(2025, 1, 14)).unwrap();
    assert_eq!(
        instance_dates(&expand(&excluded, window.0, window.1)),
        vec![(2025, 1, 7), (2025, 1, 21), (2025, 1, 28)]
    );

    let restored = series_engine::remove_exception_date(&excluded, date(2025, 1, 14));
    assert_eq!(
        instance_dates(&expand(&restored, window.0, window.1)),
        vec![(2025, 1, 7), (2025, 1, 14), (2025, 1, 21), (2025, 1, 28)]
    );
}

// ---------------------------------------------------------------------------
// Timezones and DST
// ---------------------------------------------------------------------------

#[test]
fn wall_clock_time_is_preserved_across_spring_forward() {
    // America/Los_Angeles springs forward on 2026-03-08: the 14:00 local
    // start is 22:00 UTC before and 21:00 UTC after.
    let s = series(
        "FREQ=WEEKLY;BYDAY=TU",
        "2026-02-17T14:00:00",
        "2026-02-17T15:00:00",
        "America/Los_Angeles",
    );
    let result = expand(&s, date(2026, 2, 17), date(2026, 3, 17));

    assert_eq!(result.len(), 5);
    assert_eq!(result[0].start, Utc.with_ymd_and_hms(2026, 2, 17, 22, 0, 0).unwrap());
    assert_eq!(result[2].start, Utc.with_ymd_and_hms(2026, 3, 3, 22, 0, 0).unwrap());
    assert_eq!(result[3].start, Utc.with_ymd_and_hms(2026, 3, 10, 21, 0, 0).unwrap());
    assert_eq!(result[4].start, Utc.with_ymd_and_hms(2026, 3, 17, 21, 0, 0).unwrap());
}

#[test]
fn duration_is_held_in_wall_clock_terms() {
    let s = series(
        "FREQ=WEEKLY;BYDAY=TU",
        "2026-02-17T14:00:00",
        "2026-02-17T16:30:00",
        "America/Los_Angeles",
    );
    let result = expand(&s, date(2026, 2, 17), date(2026, 3, 17));

    for occurrence in &result {
        assert_eq!(
            (occurrence.end - occurrence.start).num_minutes(),
            150,
            "each instance keeps its 2.5h wall-clock duration"
        );
    }
}

// ---------------------------------------------------------------------------
// Field propagation
// ---------------------------------------------------------------------------

#[test]
fn occurrences_copy_base_fields_and_mark_recurrence() {
    let mut s = series(
        "FREQ=WEEKLY;BYDAY=TU;COUNT=1",
        "2025-01-07T19:00:00",
        "2025-01-07T21:00:00",
        "UTC",
    );
    s.base
        .extra
        .insert("organizer".to_string(), serde_json::json!("Jo"));

    let result = expand(&s, date(2025, 1, 1), date(2025, 1, 31));
    assert_eq!(result.len(), 1);

    let occurrence = &result[0];
    assert_eq!(occurrence.parent_event_id, 42);
    assert!(occurrence.is_recurring_instance);
    assert!(!occurrence.is_cancelled);
    assert_eq!(occurrence.title, "Monthly board-game night");
    assert_eq!(occurrence.description.as_deref(), Some("Bring a game"));
    assert_eq!(occurrence.location.as_deref(), Some("Club cellar"));
    assert_eq!(occurrence.category.as_deref(), Some("games"));
    assert_eq!(occurrence.tags, vec!["regular".to_string()]);
    assert_eq!(occurrence.extra["organizer"], serde_json::json!("Jo"));
}

#[test]
fn output_is_ordered_by_start_time() {
    let s = series(
        "FREQ=WEEKLY;BYDAY=MO,WE,FR",
        "2025-01-06T19:00:00",
        "2025-01-06T21:00:00",
        "UTC",
    );
    let result = expand(&s, date(2025, 1, 1), date(2025, 3, 31));

    assert!(result.windows(2).all(|w| w[0].start < w[1].start));
}

// ---------------------------------------------------------------------------
// Degradation on bad rules
// ---------------------------------------------------------------------------

#[test]
fn unparseable_rule_expands_to_nothing() {
    let s = series(
        "FREQ=WEEKLY;INTERVAL=soon",
        "2025-01-07T19:00:00",
        "2025-01-07T21:00:00",
        "UTC",
    );
    assert!(expand(&s, date(2025, 1, 1), date(2025, 12, 31)).is_empty());
}

#[test]
fn invalid_rule_expands_to_nothing() {
    // BYSETPOS together with BYMONTHDAY never produces a valid expansion.
    let s = series(
        "FREQ=MONTHLY;BYSETPOS=1;BYMONTHDAY=15",
        "2025-01-15T19:00:00",
        "2025-01-15T21:00:00",
        "UTC",
    );
    assert!(expand(&s, date(2025, 1, 1), date(2025, 12, 31)).is_empty());

    let s = series(
        "BYDAY=TU",
        "2025-01-07T19:00:00",
        "2025-01-07T21:00:00",
        "UTC",
    );
    assert!(expand(&s, date(2025, 1, 1), date(2025, 12, 31)).is_empty());
}

#[test]
fn inverted_window_is_empty() {
    let s = series(
        "FREQ=DAILY",
        "2025-01-01T09:00:00",
        "2025-01-01T10:00:00",
        "UTC",
    );
    assert!(expand(&s, date(2025, 2, 1), date(2025, 1, 1)).is_empty());
}
