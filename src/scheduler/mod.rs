//! # Boundary Scheduler
//!
//! Pure scheduling math: given an execution frequency in minutes, compute the
//! next "clean" boundary an indicator should run at, and decide whether an
//! indicator is currently due.
//!
//! Boundaries are multiples of the frequency counted from midnight UTC. For
//! the calendar-aligned frequencies in [`ALIGNED_FREQUENCIES`] (all of which
//! divide the day evenly) this lands on the familiar instants: every-5-minutes
//! aligns to :00/:05/:10, hourly to the top of the hour, daily to 00:00 UTC.
//! For any other frequency the same rule applies, except that a boundary that
//! would fall past the end of the calendar day rolls to the next midnight.
//!
//! All math is UTC; timezone conversion is an external concern.

use chrono::{DateTime, Duration, NaiveTime, Utc};

use crate::constants::{ALIGNED_FREQUENCIES, MINUTES_PER_DAY};

/// Whether boundaries for this frequency coincide with calendar alignment
/// (i.e. the frequency divides a day evenly).
pub fn is_calendar_aligned(frequency_minutes: u32) -> bool {
    frequency_minutes != 0 && MINUTES_PER_DAY % i64::from(frequency_minutes) == 0
}

/// Compute the next boundary strictly after `from` for the given frequency.
///
/// Zero frequencies are rejected at indicator-validation time; this function
/// treats them as 1 minute rather than dividing by zero.
pub fn next_boundary(frequency_minutes: u32, from: DateTime<Utc>) -> DateTime<Utc> {
    let freq = i64::from(frequency_minutes.max(1));
    let midnight = from.date_naive().and_time(NaiveTime::MIN).and_utc();
    let elapsed_minutes = (from - midnight).num_minutes();
    let next_multiple = (elapsed_minutes / freq + 1) * freq;

    if next_multiple >= MINUTES_PER_DAY {
        // Boundary leaves the calendar day: roll to the next midnight
        midnight + Duration::days(1)
    } else {
        midnight + Duration::minutes(next_multiple)
    }
}

/// Whether an indicator is due at `now`.
///
/// An indicator that has never run is always due; otherwise it becomes due
/// at (or after) the next boundary computed from its last run.
pub fn is_due(last_run: Option<DateTime<Utc>>, frequency_minutes: u32, now: DateTime<Utc>) -> bool {
    match last_run {
        None => true,
        Some(last) => now >= next_boundary(frequency_minutes, last),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
    }

    #[test]
    fn hourly_boundary_aligns_to_top_of_hour() {
        let from = utc(2024, 1, 1, 10, 3, 0);
        assert_eq!(next_boundary(60, from), utc(2024, 1, 1, 11, 0, 0));
    }

    #[test]
    fn five_minute_boundary_aligns_to_five_minute_marks() {
        let from = utc(2024, 1, 1, 10, 3, 0);
        assert_eq!(next_boundary(5, from), utc(2024, 1, 1, 10, 5, 0));
        // Exactly on a boundary moves to the next one
        assert_eq!(
            next_boundary(5, utc(2024, 1, 1, 10, 5, 0)),
            utc(2024, 1, 1, 10, 10, 0)
        );
    }

    #[test]
    fn daily_boundary_is_next_midnight() {
        let from = utc(2024, 1, 1, 23, 59, 0);
        assert_eq!(next_boundary(1440, from), utc(2024, 1, 2, 0, 0, 0));
        assert_eq!(
            next_boundary(1440, utc(2024, 1, 1, 0, 0, 0)),
            utc(2024, 1, 2, 0, 0, 0)
        );
    }

    #[test]
    fn unaligned_frequency_rolls_into_next_day() {
        // 700-minute boundaries: 00:00, 11:40, 23:20, then past midnight
        let from = utc(2024, 1, 1, 23, 30, 0);
        assert_eq!(next_boundary(700, from), utc(2024, 1, 2, 0, 0, 0));
        assert_eq!(
            next_boundary(700, utc(2024, 1, 1, 12, 0, 0)),
            utc(2024, 1, 1, 23, 20, 0)
        );
    }

    #[test]
    fn never_run_is_always_due() {
        assert!(is_due(None, 60, utc(2024, 1, 1, 0, 0, 0)));
        assert!(is_due(None, 1, utc(1999, 12, 31, 23, 59, 59)));
    }

    #[test]
    fn due_flips_exactly_at_boundary() {
        let last_run = Some(utc(2024, 1, 1, 10, 3, 0));
        assert!(!is_due(last_run, 60, utc(2024, 1, 1, 10, 59, 59)));
        assert!(is_due(last_run, 60, utc(2024, 1, 1, 11, 0, 0)));
        assert!(is_due(last_run, 60, utc(2024, 1, 1, 11, 30, 0)));
    }

    #[test]
    fn aligned_frequency_table_is_calendar_aligned() {
        for freq in ALIGNED_FREQUENCIES {
            assert!(is_calendar_aligned(freq), "{freq} should divide the day");
        }
        assert!(!is_calendar_aligned(7));
        assert!(!is_calendar_aligned(700));
        assert!(!is_calendar_aligned(0));
    }

    proptest! {
        #[test]
        fn boundary_is_strictly_after_from(
            freq_idx in 0usize..ALIGNED_FREQUENCIES.len(),
            secs in 0i64..(4 * 24 * 3600),
        ) {
            let freq = ALIGNED_FREQUENCIES[freq_idx];
            let from = utc(2024, 1, 1, 0, 0, 0) + Duration::seconds(secs);
            let boundary = next_boundary(freq, from);
            prop_assert!(boundary > from);
        }

        #[test]
        fn boundary_lands_on_a_multiple_of_frequency(
            freq_idx in 0usize..ALIGNED_FREQUENCIES.len(),
            secs in 0i64..(4 * 24 * 3600),
        ) {
            let freq = ALIGNED_FREQUENCIES[freq_idx];
            let from = utc(2024, 1, 1, 0, 0, 0) + Duration::seconds(secs);
            let boundary = next_boundary(freq, from);
            let midnight = boundary.date_naive().and_time(NaiveTime::MIN).and_utc();
            let offset = (boundary - midnight).num_seconds();
            prop_assert_eq!(offset % (i64::from(freq) * 60), 0);
        }

        #[test]
        fn boundary_alignment_is_idempotent(
            freq_idx in 0usize..ALIGNED_FREQUENCIES.len(),
            secs in 0i64..(4 * 24 * 3600),
        ) {
            let freq = ALIGNED_FREQUENCIES[freq_idx];
            let from = utc(2024, 1, 1, 0, 0, 0) + Duration::seconds(secs);
            let first = next_boundary(freq, from);
            let second = next_boundary(freq, first);
            prop_assert!(second > first);
            // Consecutive boundaries are exactly one frequency apart unless
            // the second rolls over midnight
            let gap = (second - first).num_minutes();
            prop_assert!(gap == i64::from(freq) || second.time() == NaiveTime::MIN);
        }

        #[test]
        fn is_due_matches_boundary_definition(
            freq_idx in 0usize..ALIGNED_FREQUENCIES.len(),
            last_secs in 0i64..(24 * 3600),
            delta_secs in 0i64..(2 * 24 * 3600),
        ) {
            let freq = ALIGNED_FREQUENCIES[freq_idx];
            let last_run = utc(2024, 1, 1, 0, 0, 0) + Duration::seconds(last_secs);
            let now = last_run + Duration::seconds(delta_secs);
            let due = is_due(Some(last_run), freq, now);
            prop_assert_eq!(due, now >= next_boundary(freq, last_run));
        }
    }
}
