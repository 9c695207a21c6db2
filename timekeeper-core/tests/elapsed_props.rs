//! Property tests for wraparound-safe interval arithmetic and the clock gate

use proptest::prelude::*;

use timekeeper_core::{
    constants::MIN_PLAUSIBLE_EPOCH,
    mock::MockHardwareClock,
    time::{elapsed, has_elapsed, IntervalTimer, Millis},
    ClockSource, SyncConfig, SystemClock,
};

proptest! {
    #[test]
    fn elapsed_is_true_forward_distance(mark in any::<u32>(), distance in any::<u32>()) {
        let now = mark.wrapping_add(distance);
        prop_assert_eq!(elapsed(now, mark).ticks(), distance);
    }

    #[test]
    fn has_elapsed_matches_distance(
        mark in any::<u32>(),
        distance in any::<u32>(),
        interval in any::<u32>(),
    ) {
        let now = mark.wrapping_add(distance);
        prop_assert_eq!(
            has_elapsed(now, mark, Millis::from_ticks(interval)),
            distance >= interval
        );
    }

    #[test]
    fn interval_not_due_right_after_rearm(
        start in any::<u32>(),
        fire_after in 0u32..1_000_000,
        interval in 1u32..1_000_000,
    ) {
        let mut timer = IntervalTimer::new(start, Millis::from_ticks(interval));
        let fired_at = start.wrapping_add(interval).wrapping_add(fire_after);

        prop_assert!(timer.poll(fired_at));
        prop_assert!(!timer.is_due(fired_at));
        prop_assert!(!timer.is_due(fired_at.wrapping_add(interval - 1)));
        prop_assert!(timer.is_due(fired_at.wrapping_add(interval)));
    }

    #[test]
    fn implausible_candidates_never_change_state(
        candidate in 0u64..MIN_PLAUSIBLE_EPOCH,
        source in prop_oneof![
            Just(ClockSource::Hardware),
            Just(ClockSource::Network),
            Just(ClockSource::Satellite),
        ],
    ) {
        let mut clock = SystemClock::bootstrap(
            MockHardwareClock::new(1_600_000_000),
            &SyncConfig::default(),
            0,
        );
        let before = *clock.state();

        prop_assert!(clock.apply(candidate, source).is_err());
        prop_assert_eq!(*clock.state(), before);
    }

    #[test]
    fn only_satellite_time_is_shifted(
        // Far enough above the threshold that any shift stays plausible
        candidate in (MIN_PLAUSIBLE_EPOCH + 12 * 3600)..4_000_000_000u64,
        hours in -12i8..=14,
    ) {
        let config = SyncConfig::default().with_utc_offset_hours(hours);
        let mut clock = SystemClock::bootstrap(MockHardwareClock::new(0), &config, 0);

        let network = clock.apply(candidate, ClockSource::Network).unwrap();
        prop_assert_eq!(network.time, candidate);

        let satellite = clock.apply(candidate, ClockSource::Satellite).unwrap();
        prop_assert_eq!(satellite.time as i64, candidate as i64 + i64::from(hours) * 3600);
    }
}
