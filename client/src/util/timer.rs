//! Match clock.

#[cfg(test)]
#[path = "timer_test.rs"]
mod timer_test;

use std::time::Duration;

use time::OffsetDateTime;

/// Time played: from `start` to `end`, or to `now` while the game runs.
/// Zero before the first move or if the clocks disagree.
#[must_use]
pub fn elapsed(start: Option<OffsetDateTime>, end: Option<OffsetDateTime>, now: OffsetDateTime) -> Duration {
    let Some(start) = start else {
        return Duration::ZERO;
    };
    let stop = end.unwrap_or(now);
    Duration::try_from(stop - start).unwrap_or(Duration::ZERO)
}

/// `MM:SS`; minutes keep counting past 59.
#[must_use]
pub fn format_clock(elapsed: Duration) -> String {
    let total = elapsed.as_secs();
    format!("{:02}:{:02}", total / 60, total % 60)
}
