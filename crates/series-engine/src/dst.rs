//! Wall-clock resolution across DST transitions.
//!
//! Occurrence times are stored as wall-clock values in the series timezone,
//! so the same 19:00 meetup stays at 19:00 local whether or not DST is in
//! effect. Resolution policy for the two awkward cases:
//!
//! - Ambiguous local times (fall-back, the repeated hour) resolve to the
//!   earlier offset.
//! - Nonexistent local times (spring-forward gap) shift forward to the next
//!   representable instant.

use chrono::{DateTime, Duration, LocalResult, NaiveDateTime, TimeZone};
use chrono_tz::Tz;

/// Resolve a wall-clock datetime in `tz` to a concrete instant.
pub fn resolve_wall_clock(tz: Tz, wall: NaiveDateTime) -> DateTime<Tz> {
    let mut candidate = wall;
    loop {
        match tz.from_local_datetime(&candidate) {
            LocalResult::Single(dt) => return dt,
            LocalResult::Ambiguous(earlier, _later) => return earlier,
            LocalResult::None => {
                // Inside a DST gap. Gaps are at most a few hours in any real
                // timezone; probing forward in 15-minute steps finds the
                // first instant after the transition.
                candidate += Duration::minutes(15);
            }
        }
    }
}
