//! Clock authority
//!
//! [`SystemClock`] owns the time of record. Every source hands its candidate
//! to [`SystemClock::apply`], which is the only place a plausibility check,
//! the zone offset and the hardware write-back happen.
//!
//! Sources are not ranked. The last plausible candidate wins, because the
//! network and satellite sources are both better than a free-running RTC
//! whenever they succeed at all.
//!
//! Between syncs the clock free-runs on the loop counter: [`SystemClock::advance`]
//! rolls whole elapsed seconds into the time of record.

use core::fmt;

use crate::config::SyncConfig;
use crate::errors::{SyncError, SyncResult};
use crate::time::{ElapsedTimer, Millis, Ticks, Timestamp};
use crate::traits::HardwareClock;

/// Where the current time of record came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ClockSource {
    /// Nothing plausible yet
    None,
    /// Battery-backed RTC
    Hardware,
    /// Companion radio (NTP)
    Network,
    /// Satellite receiver
    Satellite,
}

impl ClockSource {
    /// Lowercase name for logs
    pub const fn name(&self) -> &'static str {
        match self {
            ClockSource::None => "none",
            ClockSource::Hardware => "hardware",
            ClockSource::Network => "network",
            ClockSource::Satellite => "satellite",
        }
    }
}

impl fmt::Display for ClockSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Snapshot of the clock
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockState {
    /// Time of record, seconds since the Unix epoch
    pub current_time: Timestamp,
    /// Set by the first plausible commit, never cleared
    pub is_synced: bool,
    /// Source of the last commit
    pub source: ClockSource,
}

/// A successful [`SystemClock::apply`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Committed {
    /// Time now on record, zone offset included
    pub time: Timestamp,
    /// Source handed to `apply`
    pub source: ClockSource,
    /// False when the hardware clock write failed
    pub persisted: bool,
}

/// The single writer of the time of record
pub struct SystemClock<H> {
    hardware: H,
    state: ClockState,
    zone_offset: i64,
    min_epoch: Timestamp,
    second_mark: ElapsedTimer,
    last_tick: Ticks,
}

impl<H: HardwareClock> SystemClock<H> {
    /// Initialize from the hardware clock at boot
    ///
    /// The reading becomes the time of record even when implausible; only a
    /// plausible reading marks the clock synced.
    pub fn bootstrap(mut hardware: H, config: &SyncConfig, now: Ticks) -> Self {
        let min_epoch = config.min_plausible_epoch;

        let state = match hardware.read() {
            Ok(time) if time >= min_epoch => {
                log_info!("Hardware clock set the system time: {}", time);
                ClockState {
                    current_time: time,
                    is_synced: true,
                    source: ClockSource::Hardware,
                }
            }
            Ok(time) => {
                log_warn!("Hardware clock holds implausible time {}", time);
                ClockState {
                    current_time: time,
                    is_synced: false,
                    source: ClockSource::None,
                }
            }
            Err(_e) => {
                log_warn!("Unable to read the hardware clock");
                ClockState {
                    current_time: 0,
                    is_synced: false,
                    source: ClockSource::None,
                }
            }
        };

        Self {
            hardware,
            state,
            zone_offset: config.zone_offset_seconds(),
            min_epoch,
            second_mark: ElapsedTimer::new(now),
            last_tick: now,
        }
    }

    /// Commit a candidate from `source`
    ///
    /// Satellite candidates are UTC and get the zone offset added. Both the
    /// raw candidate and the shifted time must pass the plausibility gate, so
    /// a fix just above the threshold cannot land below it once shifted.
    ///
    /// Every commit goes to memory first and then to the hardware clock,
    /// whatever the source. A failed hardware write is reported through
    /// [`Committed::persisted`] and never rolls the memory commit back.
    pub fn apply(&mut self, candidate: Timestamp, source: ClockSource) -> SyncResult<Committed> {
        self.check_plausible(candidate)?;

        let time = match source {
            ClockSource::Satellite => {
                let shifted = candidate
                    .checked_add_signed(self.zone_offset)
                    .ok_or(SyncError::ImplausibleTimestamp { candidate })?;
                self.check_plausible(shifted)?
            }
            _ => candidate,
        };

        self.state.current_time = time;
        self.state.source = source;
        self.state.is_synced = true;
        self.second_mark.mark(self.last_tick);

        let persisted = match self.hardware.write(time) {
            Ok(()) => true,
            Err(_e) => {
                log_warn!("Hardware clock write failed, keeping {} in memory", time);
                false
            }
        };

        log_info!("Time synced via {}: {}", source, time);

        Ok(Committed {
            time,
            source,
            persisted,
        })
    }

    /// Reject candidates older than the plausibility threshold
    pub fn check_plausible(&self, candidate: Timestamp) -> SyncResult<Timestamp> {
        if candidate < self.min_epoch {
            log_warn!("Rejected implausible timestamp {}", candidate);
            return Err(SyncError::ImplausibleTimestamp { candidate });
        }
        Ok(candidate)
    }

    /// Free-run: roll whole seconds elapsed since the last mark into the
    /// time of record
    ///
    /// Must be called at least once per counter period (~49.7 days).
    pub fn advance(&mut self, now: Ticks) {
        self.last_tick = now;

        let seconds = self.second_mark.elapsed(now).ticks() / 1000;
        if seconds > 0 {
            self.state.current_time = self.state.current_time.saturating_add(u64::from(seconds));
            self.second_mark.advance(Millis::from_ticks(seconds * 1000));
        }
    }

    /// Current time of record
    pub fn now(&self) -> Timestamp {
        self.state.current_time
    }

    /// Full snapshot
    pub fn state(&self) -> &ClockState {
        &self.state
    }

    /// True once any plausible time has been committed
    pub fn is_synced(&self) -> bool {
        self.state.is_synced
    }

    /// Source of the time of record
    pub fn source(&self) -> ClockSource {
        self.state.source
    }

    /// Signed offset added to satellite time, in seconds
    pub fn zone_offset(&self) -> i64 {
        self.zone_offset
    }

    /// The hardware clock driver
    pub fn hardware(&self) -> &H {
        &self.hardware
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::MIN_PLAUSIBLE_EPOCH;
    use crate::mock::MockHardwareClock;

    fn clock_at(time: Timestamp) -> SystemClock<MockHardwareClock> {
        SystemClock::bootstrap(MockHardwareClock::new(time), &SyncConfig::default(), 0)
    }

    #[test]
    fn bootstrap_from_plausible_rtc() {
        let clock = clock_at(1_357_041_600);

        assert!(clock.is_synced());
        assert_eq!(clock.now(), 1_357_041_600);
        assert_eq!(clock.source(), ClockSource::Hardware);
    }

    #[test]
    fn bootstrap_from_dead_rtc() {
        let clock = clock_at(42);

        assert!(!clock.is_synced());
        assert_eq!(clock.now(), 42);
        assert_eq!(clock.source(), ClockSource::None);
    }

    #[test]
    fn bootstrap_read_failure() {
        let hardware = MockHardwareClock::new(1_700_000_000).failing_reads();
        let clock = SystemClock::bootstrap(hardware, &SyncConfig::default(), 0);

        assert!(!clock.is_synced());
        assert_eq!(clock.now(), 0);
    }

    #[test]
    fn implausible_candidate_leaves_state() {
        let mut clock = clock_at(1_600_000_000);
        let before = *clock.state();

        let result = clock.apply(MIN_PLAUSIBLE_EPOCH - 1, ClockSource::Network);
        assert_eq!(
            result,
            Err(SyncError::ImplausibleTimestamp { candidate: MIN_PLAUSIBLE_EPOCH - 1 })
        );
        assert_eq!(*clock.state(), before);
        assert_eq!(clock.hardware().writes(), 0);
    }

    #[test]
    fn threshold_itself_is_accepted() {
        let mut clock = clock_at(0);
        assert!(clock.apply(MIN_PLAUSIBLE_EPOCH, ClockSource::Network).is_ok());
        assert!(clock.is_synced());
    }

    #[test]
    fn zone_offset_only_for_satellite() {
        let mut clock = clock_at(1_600_000_000);

        let committed = clock.apply(1_700_003_600, ClockSource::Satellite).unwrap();
        assert_eq!(committed.time, 1_699_989_200);
        assert_eq!(clock.source(), ClockSource::Satellite);

        let committed = clock.apply(1_700_003_600, ClockSource::Network).unwrap();
        assert_eq!(committed.time, 1_700_003_600);

        let committed = clock.apply(1_700_003_600, ClockSource::Hardware).unwrap();
        assert_eq!(committed.time, 1_700_003_600);
    }

    #[test]
    fn shifted_satellite_time_is_gated_too() {
        let mut clock = clock_at(1_600_000_000);
        let before = *clock.state();

        // Plausible as UTC, 4h before the threshold once shifted
        let result = clock.apply(MIN_PLAUSIBLE_EPOCH, ClockSource::Satellite);
        assert_eq!(
            result,
            Err(SyncError::ImplausibleTimestamp { candidate: MIN_PLAUSIBLE_EPOCH - 14_400 })
        );
        assert_eq!(*clock.state(), before);
        assert_eq!(clock.hardware().writes(), 0);

        let committed = clock.apply(MIN_PLAUSIBLE_EPOCH + 14_400, ClockSource::Satellite).unwrap();
        assert_eq!(committed.time, MIN_PLAUSIBLE_EPOCH);
    }

    #[test]
    fn every_source_writes_back() {
        let mut clock = clock_at(0);

        clock.apply(1_700_000_000, ClockSource::Hardware).unwrap();
        assert_eq!(clock.hardware().writes(), 1);

        clock.apply(1_700_000_100, ClockSource::None).unwrap();
        assert_eq!(clock.hardware().writes(), 2);
        assert_eq!(clock.hardware().time(), 1_700_000_100);
    }

    #[test]
    fn commit_writes_back_to_rtc() {
        let mut clock = clock_at(1_600_000_000);
        clock.apply(1_700_000_000, ClockSource::Network).unwrap();

        assert_eq!(clock.hardware().time(), 1_700_000_000);
        assert_eq!(clock.hardware().writes(), 1);
    }

    #[test]
    fn write_failure_keeps_memory_commit() {
        let hardware = MockHardwareClock::new(1_600_000_000).failing_writes();
        let mut clock = SystemClock::bootstrap(hardware, &SyncConfig::default(), 0);

        let committed = clock.apply(1_700_000_000, ClockSource::Network).unwrap();
        assert!(!committed.persisted);
        assert_eq!(clock.now(), 1_700_000_000);
        assert_eq!(clock.hardware().time(), 1_600_000_000);
    }

    #[test]
    fn synced_flag_never_cleared() {
        let mut clock = clock_at(1_600_000_000);
        let _ = clock.apply(5, ClockSource::Network);
        assert!(clock.is_synced());
    }

    #[test]
    fn advance_rolls_whole_seconds() {
        let mut clock = clock_at(1_600_000_000);

        clock.advance(999);
        assert_eq!(clock.now(), 1_600_000_000);

        clock.advance(2500);
        assert_eq!(clock.now(), 1_600_000_002);

        // The 500ms remainder is kept
        clock.advance(3000);
        assert_eq!(clock.now(), 1_600_000_003);
    }

    #[test]
    fn apply_restarts_second_mark() {
        let mut clock = clock_at(1_600_000_000);

        clock.advance(700);
        clock.apply(1_700_000_000, ClockSource::Network).unwrap();
        clock.advance(1500);
        assert_eq!(clock.now(), 1_700_000_000);
        clock.advance(1700);
        assert_eq!(clock.now(), 1_700_000_001);
    }

    #[test]
    fn advance_across_counter_wrap() {
        let hardware = MockHardwareClock::new(1_600_000_000);
        let mut clock = SystemClock::bootstrap(hardware, &SyncConfig::default(), u32::MAX - 499);

        clock.advance(500);
        assert_eq!(clock.now(), 1_600_000_001);
    }
}
