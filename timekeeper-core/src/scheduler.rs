//! Sync scheduler
//!
//! [`SyncScheduler`] is the single owned context of the firmware: the clock,
//! the serial link, the fix machine and the interval timers all live inside
//! it and are mutated only from [`SyncScheduler::tick`].
//!
//! ## One Tick
//!
//! ```text
//! 0. clock.advance(now)               free-run whole seconds
//! 1. network interval due?            send '$', re-arm
//! 2. serial bytes waiting?            decode, apply(Network)
//! 3. positioning interval due?        re-arm, start fix if idle
//! 4. fix machine poll                 no-op when idle
//! 5. display interval due?            report clock.now()
//! ```
//!
//! Construction validates the [`SyncConfig`] first: a zero interval would
//! fire on every tick and flood the companion radio with requests.
//!
//! Steps run in this order on every tick and each is best-effort: a
//! malformed frame in step 2 does not skip the fix poll in step 4. Clock
//! commits are synchronous within their step, so the display step always
//! sees a fully applied clock.
//!
//! ## Example
//!
//! ```rust
//! use timekeeper_core::config::SyncConfig;
//! use timekeeper_core::mock::{MockHardwareClock, MockPowerLine, MockReceiver, MockSerial};
//! use timekeeper_core::scheduler::SyncScheduler;
//!
//! let mut scheduler = SyncScheduler::new(
//!     &SyncConfig::default(),
//!     MockHardwareClock::new(1_700_000_000),
//!     MockSerial::new(),
//!     MockReceiver::new(),
//!     MockPowerLine::new(),
//!     0,
//! )?;
//!
//! for now in (0..60_000).step_by(10) {
//!     for event in scheduler.tick(now) {
//!         // hand Display events to the screen, log the rest
//!         let _ = event;
//!     }
//! }
//! assert!(scheduler.clock().is_synced());
//! # Ok::<(), timekeeper_core::ConfigError>(())
//! ```

use crate::clock::{ClockSource, Committed, SystemClock};
use crate::config::SyncConfig;
use crate::errors::{ConfigError, SyncError};
use crate::events::{SyncEvent, TickEvents};
use crate::fix::{FixAcquisition, FixOutcome, FixPolicy};
use crate::protocol::{send_sync_request, SyncReceiver};
use crate::time::{IntervalTimer, Ticks};
use crate::traits::{FixReceiver, HardwareClock, PowerLine, SerialPort, TickSource};

/// The three periodic triggers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncSchedule {
    /// Network time requests
    pub network: IntervalTimer,
    /// Positioning attempts, first one after the configured delay
    pub positioning: IntervalTimer,
    /// Display updates
    pub display: IntervalTimer,
}

impl SyncSchedule {
    /// Arm every trigger from `now`
    pub fn new(config: &SyncConfig, now: Ticks) -> Self {
        Self {
            network: IntervalTimer::new(now, config.network_interval()),
            positioning: IntervalTimer::with_first_delay(
                now,
                config.positioning_interval(),
                config.positioning_first_delay(),
            ),
            display: IntervalTimer::new(now, config.display_interval()),
        }
    }
}

/// Running totals for observability
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncStats {
    /// Request bytes accepted by the serial port
    pub requests_sent: u32,
    /// Network times committed
    pub network_syncs: u32,
    /// Satellite times committed
    pub satellite_syncs: u32,
    /// Candidates refused by the plausibility gate
    pub rejected: u32,
    /// Network messages that did not decode
    pub malformed: u32,
    /// Positioning attempts started
    pub fix_attempts: u32,
    /// Positioning attempts that ran out of time
    pub fix_timeouts: u32,
    /// Commits the hardware clock did not persist
    pub write_failures: u32,
}

/// Top-level owner of all sync state
pub struct SyncScheduler<H, S, R, P> {
    clock: SystemClock<H>,
    serial: S,
    receiver: SyncReceiver,
    fix: FixAcquisition<R, P>,
    schedule: SyncSchedule,
    stats: SyncStats,
}

impl<H, S, R, P> SyncScheduler<H, S, R, P>
where
    H: HardwareClock,
    S: SerialPort,
    R: FixReceiver,
    P: PowerLine,
{
    /// Bootstrap the clock from `hardware` and arm every interval from `now`
    ///
    /// Fails on a config [`SyncConfig::validate`] refuses, before any
    /// peripheral is touched.
    pub fn new(
        config: &SyncConfig,
        hardware: H,
        serial: S,
        receiver: R,
        power: P,
        now: Ticks,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let policy = FixPolicy {
            min_satellites: config.min_satellites,
        };

        Ok(Self {
            clock: SystemClock::bootstrap(hardware, config, now),
            serial,
            receiver: SyncReceiver::new(now, config.serial_timeout()),
            fix: FixAcquisition::new(receiver, power, config.fix_timeout(), policy),
            schedule: SyncSchedule::new(config, now),
            stats: SyncStats::default(),
        })
    }

    /// Run one loop iteration at counter value `now`
    pub fn tick(&mut self, now: Ticks) -> TickEvents {
        let mut events = TickEvents::new();

        self.clock.advance(now);
        self.request_network_time(now, &mut events);
        self.receive_network_time(now, &mut events);
        self.start_positioning(now, &mut events);
        self.poll_fix(now, &mut events);
        self.report_display(now, &mut events);

        events
    }

    /// [`tick`](Self::tick) at the current value of `ticks`
    pub fn poll<T: TickSource>(&mut self, ticks: &T) -> TickEvents {
        self.tick(ticks.now())
    }

    fn request_network_time(&mut self, now: Ticks, events: &mut TickEvents) {
        if !self.schedule.network.poll(now) {
            return;
        }

        match send_sync_request(&mut self.serial) {
            Ok(()) => {
                log_info!("Requesting network time");
                self.stats.requests_sent += 1;
                push(events, SyncEvent::SyncRequested);
            }
            Err(nb::Error::WouldBlock) => {
                log_warn!("Serial busy, skipping network time request");
                push(events, failed(ClockSource::Network, SyncError::TransportBusy));
            }
            Err(nb::Error::Other(_e)) => {
                log_warn!("Serial write failed, skipping network time request");
                push(events, failed(ClockSource::Network, SyncError::TransportBusy));
            }
        }
    }

    fn receive_network_time(&mut self, now: Ticks, events: &mut TickEvents) {
        let candidate = match self.receiver.poll(&mut self.serial, now) {
            None => return,
            Some(Ok(candidate)) => candidate,
            Some(Err(error)) => {
                log_warn!("Discarding malformed sync message");
                self.stats.malformed += 1;
                push(events, failed(ClockSource::Network, error));
                return;
            }
        };

        match self.clock.apply(candidate, ClockSource::Network) {
            Ok(committed) => {
                self.stats.network_syncs += 1;
                self.record_commit(committed, events);
            }
            Err(error) => {
                self.stats.rejected += 1;
                push(events, failed(ClockSource::Network, error));
            }
        }
    }

    fn start_positioning(&mut self, now: Ticks, events: &mut TickEvents) {
        if !self.schedule.positioning.poll(now) {
            return;
        }

        if self.fix.start(now) {
            self.stats.fix_attempts += 1;
            push(events, SyncEvent::FixStarted);
        } else {
            log_debug!("Positioning attempt still running, not restarting");
        }
    }

    fn poll_fix(&mut self, now: Ticks, events: &mut TickEvents) {
        match self.fix.poll(now, &mut self.clock) {
            FixOutcome::Idle | FixOutcome::Waiting => {}
            FixOutcome::Synced(committed) => {
                self.stats.satellite_syncs += 1;
                self.record_commit(committed, events);
            }
            FixOutcome::Rejected(error) => {
                self.stats.rejected += 1;
                push(events, failed(ClockSource::Satellite, error));
            }
            FixOutcome::TimedOut { waited } => {
                self.stats.fix_timeouts += 1;
                push(
                    events,
                    failed(
                        ClockSource::Satellite,
                        SyncError::FixTimeout {
                            waited_ms: waited.ticks(),
                        },
                    ),
                );
            }
        }
    }

    fn report_display(&mut self, now: Ticks, events: &mut TickEvents) {
        if self.schedule.display.poll(now) {
            push(events, SyncEvent::Display { time: self.clock.now() });
        }
    }

    fn record_commit(&mut self, committed: Committed, events: &mut TickEvents) {
        push(
            events,
            SyncEvent::TimeSynced {
                source: committed.source,
                time: committed.time,
            },
        );

        if !committed.persisted {
            self.stats.write_failures += 1;
            push(events, failed(committed.source, SyncError::ClockWriteFailure));
        }
    }

    /// The clock of record
    pub fn clock(&self) -> &SystemClock<H> {
        &self.clock
    }

    /// The positioning state machine
    pub fn fix(&self) -> &FixAcquisition<R, P> {
        &self.fix
    }

    /// Receiver driver access; the power line stays private to the fix machine
    pub fn receiver_mut(&mut self) -> &mut R {
        self.fix.receiver_mut()
    }

    /// The serial link to the companion radio
    pub fn serial(&self) -> &S {
        &self.serial
    }

    /// Mutable serial link, for drivers that need servicing
    pub fn serial_mut(&mut self) -> &mut S {
        &mut self.serial
    }

    /// Interval triggers
    pub fn schedule(&self) -> &SyncSchedule {
        &self.schedule
    }

    /// Counters since boot
    pub fn stats(&self) -> &SyncStats {
        &self.stats
    }
}

fn failed(source: ClockSource, error: SyncError) -> SyncEvent {
    SyncEvent::Failed { source, error }
}

fn push(events: &mut TickEvents, event: SyncEvent) {
    if events.push(event).is_err() {
        log_warn!("Tick event list full, dropping event");
    }
}
