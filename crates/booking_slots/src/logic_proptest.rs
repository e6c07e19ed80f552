#[cfg(test)]
mod tests {
    use crate::logic::{calculate_free_slots, clock_offset, BusyInterval, SLOT_STEP_MINUTES};
    use crate::schedule::ResolvedDate;
    use booking_common::models::TimeRange;
    use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveTime, TimeZone, Utc};
    use proptest::prelude::*;

    fn base() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2030, 1, 7, 0, 0, 0).unwrap()
    }

    // Helper to build an interval from minute offsets since the base instant
    fn interval(start_min: i64, len_min: i64) -> BusyInterval {
        BusyInterval::starting_at(base() + Duration::minutes(start_min), Duration::minutes(len_min))
    }

    fn hhmm(minutes: i64) -> String {
        format!("{:02}:{:02}", minutes / 60, minutes % 60)
    }

    proptest! {
        // Overlap is symmetric and matches the half-open interval definition
        #[test]
        fn test_overlap_is_symmetric(
            a_start in 0..1440i64,
            a_len in 1..240i64,
            b_start in 0..1440i64,
            b_len in 1..240i64,
        ) {
            let a = interval(a_start, a_len);
            let b = interval(b_start, b_len);
            prop_assert_eq!(a.overlaps(&b), b.overlaps(&a));
            let expected = a_start < b_start + b_len && a_start + a_len > b_start;
            prop_assert_eq!(a.overlaps(&b), expected);
        }

        // Intervals that only touch never overlap
        #[test]
        fn test_touching_intervals_never_overlap(
            start in 0..1440i64,
            len_a in 1..240i64,
            len_b in 1..240i64,
        ) {
            let a = interval(start, len_a);
            let b = interval(start + len_a, len_b);
            prop_assert!(!a.overlaps(&b));
            prop_assert!(!b.overlaps(&a));
        }

        // No returned slot overlaps a busy interval, and every slot fits inside its range
        #[test]
        fn test_slots_avoid_busy_and_fit_range(
            range_start in 0..(20 * 60i64),
            range_len in 0..(4 * 60i64),
            slot_len in 15..120i64,
            busy in proptest::collection::vec((0..1440i64, 15..120i64), 0..6),
            offset_hours in -12..12i32,
        ) {
            let offset = FixedOffset::east_opt(offset_hours * 3600).unwrap();
            let day = ResolvedDate::new(NaiveDate::from_ymd_opt(2030, 1, 7).unwrap(), offset);
            let range_end = (range_start + range_len).min(24 * 60);
            let ranges = [TimeRange::new(&hhmm(range_start), &hhmm(range_end))];
            let busy: Vec<BusyInterval> = busy
                .into_iter()
                .map(|(start, len)| {
                    BusyInterval::starting_at(day.at(Duration::minutes(start)), Duration::minutes(len))
                })
                .collect();

            let slots = calculate_free_slots(&day, &ranges, Duration::minutes(slot_len), &busy);

            let end = day.at(clock_offset(&ranges[0].end));
            let mut previous: Option<i64> = None;
            for slot in &slots {
                let time = NaiveTime::parse_from_str(slot, "%H:%M").unwrap();
                let since_midnight = (time - NaiveTime::MIN).num_minutes();
                let candidate = BusyInterval::starting_at(
                    day.at(Duration::minutes(since_midnight)),
                    Duration::minutes(slot_len),
                );
                prop_assert!(candidate.end <= end);
                prop_assert!(busy.iter().all(|b| !candidate.overlaps(b)));
                prop_assert_eq!((since_midnight - range_start) % SLOT_STEP_MINUTES, 0);
                if let Some(prev) = previous {
                    prop_assert!(since_midnight > prev);
                }
                previous = Some(since_midnight);
            }
        }

        // Identical inputs give identical output
        #[test]
        fn test_slot_computation_is_deterministic(
            range_start in 0..(20 * 60i64),
            range_len in 0..(4 * 60i64),
            slot_len in 15..120i64,
        ) {
            let day = ResolvedDate::utc(NaiveDate::from_ymd_opt(2030, 1, 7).unwrap());
            let ranges = [TimeRange::new(&hhmm(range_start), &hhmm((range_start + range_len).min(1440)))];
            let first = calculate_free_slots(&day, &ranges, Duration::minutes(slot_len), &[]);
            let second = calculate_free_slots(&day, &ranges, Duration::minutes(slot_len), &[]);
            prop_assert_eq!(first, second);
        }

        // The clock parser never panics, whatever it is given
        #[test]
        fn test_clock_offset_never_panics(raw in ".{0,12}") {
            let offset = clock_offset(&raw);
            prop_assert!(offset >= Duration::zero());
            prop_assert!(offset <= Duration::hours(24) + Duration::minutes(59));
        }
    }
}
