//! Satellite fix acquisition
//!
//! The receiver is the most accurate source and the most expensive one: it
//! draws more current than the rest of the device, and a cold start takes
//! tens of seconds to minutes. So it is only powered while an attempt is
//! running, and every attempt is bounded by a hard timeout.
//!
//! ## State Machine
//!
//! ```text
//!            start()                    fix with date+time
//!   Idle ───────────────► PoweredWaitingForFix ─────────────────► Idle
//!    ▲     power on,              │          apply(Satellite), power off
//!    │     mark start             │
//!    └────────────────────────────┘
//!        elapsed > fix_timeout: power off, nothing committed
//! ```
//!
//! There is no separate "done" state: committing the time and powering down
//! happen on the same edge back to `Idle`.
//!
//! ## Ownership
//!
//! [`FixAcquisition`] takes the [`PowerLine`] by value and only hands out a
//! shared reference to it. Nothing else in the firmware can switch the
//! receiver supply.

use chrono::NaiveDateTime;

use crate::clock::{ClockSource, Committed, SystemClock};
use crate::errors::SyncError;
use crate::time::{ElapsedTimer, Millis, Ticks, Timestamp};
use crate::traits::{FixReceiver, HardwareClock, PowerLine};

/// Per-field validity reported by the fix decoder
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FixValidity {
    /// Calendar date decoded
    pub date: bool,
    /// Time of day decoded
    pub time: bool,
    /// Satellite count decoded
    pub satellites: bool,
}

/// One decoded reading from the receiver
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Fix {
    /// Which fields below can be trusted
    pub valid: FixValidity,
    /// UTC seconds since the Unix epoch; meaningful only when both date
    /// and time are valid
    pub date_time: Timestamp,
    /// Satellites used; meaningful only when `valid.satellites`
    pub satellites: u8,
}

impl Fix {
    /// Fix carrying a decoded UTC date and time
    ///
    /// Dates before the Unix epoch cannot be represented and produce a fix
    /// with invalid date and time.
    pub fn from_utc(date_time: NaiveDateTime) -> Self {
        match u64::try_from(date_time.and_utc().timestamp()) {
            Ok(seconds) => Self {
                valid: FixValidity {
                    date: true,
                    time: true,
                    satellites: false,
                },
                date_time: seconds,
                satellites: 0,
            },
            Err(_) => Self::default(),
        }
    }

    /// Fix from NMEA calendar fields; `None` for an impossible date or time
    pub fn from_calendar(
        year: i32,
        month: u32,
        day: u32,
        hour: u32,
        minute: u32,
        second: u32,
    ) -> Option<Self> {
        let date_time = chrono::NaiveDate::from_ymd_opt(year, month, day)?
            .and_hms_opt(hour, minute, second)?;
        Some(Self::from_utc(date_time))
    }

    /// Attach a decoded satellite count
    pub fn with_satellites(mut self, satellites: u8) -> Self {
        self.satellites = satellites;
        self.valid.satellites = true;
        self
    }

    /// Both date and time decoded
    pub fn has_date_time(&self) -> bool {
        self.valid.date && self.valid.time
    }

    /// The UTC time this fix offers, if it satisfies `policy`
    pub fn time_candidate(&self, policy: &FixPolicy) -> Option<Timestamp> {
        if !self.has_date_time() {
            return None;
        }

        if let Some(min) = policy.min_satellites {
            if !self.valid.satellites || self.satellites < min {
                return None;
            }
        }

        Some(self.date_time)
    }
}

/// Acceptance criteria for a fix
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FixPolicy {
    /// When set, fixes with fewer satellites are ignored
    pub min_satellites: Option<u8>,
}

/// Where the acquisition machine is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FixState {
    /// Receiver off
    Idle,
    /// Receiver on, polling for a fix
    PoweredWaitingForFix,
}

/// Result of one [`FixAcquisition::poll`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixOutcome {
    /// No attempt running
    Idle,
    /// Attempt running, no usable fix yet
    Waiting,
    /// Fix committed, receiver off
    Synced(Committed),
    /// Fix rejected by the clock, receiver off
    Rejected(SyncError),
    /// Window expired, receiver off
    TimedOut {
        /// How long the receiver was powered
        waited: Millis,
    },
}

/// Satellite receiver power and fix polling
pub struct FixAcquisition<R, P> {
    receiver: R,
    power: P,
    state: FixState,
    started_at: ElapsedTimer,
    timeout: Millis,
    policy: FixPolicy,
}

impl<R: FixReceiver, P: PowerLine> FixAcquisition<R, P> {
    /// Takes ownership of the power line and switches the receiver off
    pub fn new(receiver: R, mut power: P, timeout: Millis, policy: FixPolicy) -> Self {
        power.set_low();

        Self {
            receiver,
            power,
            state: FixState::Idle,
            started_at: ElapsedTimer::new(0),
            timeout,
            policy,
        }
    }

    /// `Idle → PoweredWaitingForFix`; false if an attempt is already running
    pub fn start(&mut self, now: Ticks) -> bool {
        if self.state != FixState::Idle {
            return false;
        }

        self.power.set_high();
        self.started_at.mark(now);
        self.state = FixState::PoweredWaitingForFix;
        log_info!("Receiver powered, waiting for fix");
        true
    }

    /// Check once for a fix or an expired window. Never blocks.
    pub fn poll<H: HardwareClock>(&mut self, now: Ticks, clock: &mut SystemClock<H>) -> FixOutcome {
        if self.state == FixState::Idle {
            return FixOutcome::Idle;
        }

        match self.receiver.poll_fix() {
            Ok(fix) => {
                if let Some(candidate) = fix.time_candidate(&self.policy) {
                    let result = clock.apply(candidate, ClockSource::Satellite);
                    log_debug!("Fix after {}ms", self.started_at.elapsed(now).ticks());
                    self.power_down();
                    return match result {
                        Ok(committed) => FixOutcome::Synced(committed),
                        Err(error) => FixOutcome::Rejected(error),
                    };
                }
            }
            Err(nb::Error::WouldBlock) => {}
            Err(nb::Error::Other(_e)) => {
                log_warn!("Receiver read failed, still waiting for fix");
            }
        }

        let waited = self.started_at.elapsed(now);
        if waited.ticks() > self.timeout.ticks() {
            log_warn!("No fix after {}ms, powering receiver down", waited.ticks());
            self.power_down();
            return FixOutcome::TimedOut { waited };
        }

        FixOutcome::Waiting
    }

    fn power_down(&mut self) {
        self.power.set_low();
        self.state = FixState::Idle;
        log_debug!("Receiver powered down");
    }

    /// Current state
    pub fn state(&self) -> FixState {
        self.state
    }

    /// True while the receiver is off
    pub fn is_idle(&self) -> bool {
        self.state == FixState::Idle
    }

    /// Acquisition window
    pub fn timeout(&self) -> Millis {
        self.timeout
    }

    /// Acceptance criteria in use
    pub fn policy(&self) -> &FixPolicy {
        &self.policy
    }

    /// Read-only view of the supply line
    pub fn power(&self) -> &P {
        &self.power
    }

    /// The receiver driver
    pub fn receiver(&self) -> &R {
        &self.receiver
    }

    /// Driver access, e.g. to feed it bytes from the receiver UART
    pub fn receiver_mut(&mut self) -> &mut R {
        &mut self.receiver
    }
}
