//! Time management for edge devices
//!
//! Two kinds of time flow through the crate:
//! - Wall clock [`Timestamp`]s in seconds since the Unix epoch, produced by
//!   the hardware clock, the companion radio and the satellite receiver
//! - Loop [`Ticks`], a free-running millisecond counter that wraps every
//!   ~49.7 days and is only ever used to measure intervals
//!
//! Every interval check in the crate goes through [`elapsed`] so that a
//! counter rollover can never produce a negative or huge duration.
//!
//! ```rust
//! use timekeeper_core::time::{elapsed, ElapsedTimer};
//!
//! // Counter wrapped between the mark and now
//! assert_eq!(elapsed(5, u32::MAX - 4).ticks(), 10);
//!
//! let timer = ElapsedTimer::new(u32::MAX - 99);
//! assert!(timer.has_elapsed(0, timer.elapsed(0)));
//! ```

use crate::traits::TickSource;

/// Wall clock time in seconds since the Unix epoch
///
/// 64 bits wide, so the 2106 rollover of a 32-bit `time_t` does not apply.
pub type Timestamp = u64;

/// Loop counter in milliseconds; wraps on overflow
pub type Ticks = u32;

/// Millisecond duration between two [`Ticks`]
pub type Millis = fugit::MillisDurationU32;

/// Forward distance from `last_mark` to `now`
///
/// Unsigned wrapping subtraction: correct as long as less than one full
/// counter period separates the two readings, including when `now` has
/// wrapped past zero and is numerically smaller than `last_mark`.
#[inline]
pub const fn elapsed(now: Ticks, last_mark: Ticks) -> Millis {
    Millis::from_ticks(now.wrapping_sub(last_mark))
}

/// True once at least `interval` has passed since `last_mark`
#[inline]
pub const fn has_elapsed(now: Ticks, last_mark: Ticks, interval: Millis) -> bool {
    elapsed(now, last_mark).ticks() >= interval.ticks()
}

/// A single mark on the loop counter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ElapsedTimer {
    last_mark: Ticks,
}

impl ElapsedTimer {
    /// Timer marked at `now`
    pub const fn new(now: Ticks) -> Self {
        Self { last_mark: now }
    }

    /// Counter value of the last mark
    pub const fn last_mark(&self) -> Ticks {
        self.last_mark
    }

    /// Move the mark to `now`
    pub fn mark(&mut self, now: Ticks) {
        self.last_mark = now;
    }

    /// Move the mark forward by `by`, keeping any remainder past it
    pub fn advance(&mut self, by: Millis) {
        self.last_mark = self.last_mark.wrapping_add(by.ticks());
    }

    /// Time since the mark
    pub const fn elapsed(&self, now: Ticks) -> Millis {
        elapsed(now, self.last_mark)
    }

    /// True once `interval` has passed since the mark
    pub const fn has_elapsed(&self, now: Ticks, interval: Millis) -> bool {
        has_elapsed(now, self.last_mark, interval)
    }
}

/// Periodic trigger: an [`ElapsedTimer`] with a fixed interval
///
/// Re-armed every time it fires, whatever the triggered work did, so a
/// failing attempt waits a full interval like a successful one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntervalTimer {
    timer: ElapsedTimer,
    interval: Millis,
}

impl IntervalTimer {
    /// First firing one full interval after `now`
    pub const fn new(now: Ticks, interval: Millis) -> Self {
        Self {
            timer: ElapsedTimer::new(now),
            interval,
        }
    }

    /// First firing `first_delay` after `now`, then every `interval`
    ///
    /// A delay longer than the interval is clamped to the interval.
    pub const fn with_first_delay(now: Ticks, interval: Millis, first_delay: Millis) -> Self {
        let delay = if first_delay.ticks() < interval.ticks() {
            first_delay.ticks()
        } else {
            interval.ticks()
        };
        let backdate = interval.ticks() - delay;

        Self {
            timer: ElapsedTimer::new(now.wrapping_sub(backdate)),
            interval,
        }
    }

    /// Firing period
    pub const fn interval(&self) -> Millis {
        self.interval
    }

    /// Counter value when last armed
    pub const fn last_mark(&self) -> Ticks {
        self.timer.last_mark()
    }

    /// Due without re-arming
    pub const fn is_due(&self, now: Ticks) -> bool {
        self.timer.has_elapsed(now, self.interval)
    }

    /// Re-arm from `now`
    pub fn rearm(&mut self, now: Ticks) {
        self.timer.mark(now);
    }

    /// Returns true and re-arms when due
    pub fn poll(&mut self, now: Ticks) -> bool {
        if self.is_due(now) {
            self.rearm(now);
            true
        } else {
            false
        }
    }
}

/// Tick source backed by the host's monotonic clock (requires std)
///
/// Milliseconds since construction, truncated to 32 bits so it wraps exactly
/// like a microcontroller `millis()` counter.
#[cfg(feature = "std")]
#[derive(Debug, Clone)]
pub struct MonotonicTicks {
    start: std::time::Instant,
}

#[cfg(feature = "std")]
impl MonotonicTicks {
    /// Counter starting at zero now
    pub fn new() -> Self {
        Self {
            start: std::time::Instant::now(),
        }
    }
}

#[cfg(feature = "std")]
impl Default for MonotonicTicks {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "std")]
impl TickSource for MonotonicTicks {
    fn now(&self) -> Ticks {
        self.start.elapsed().as_millis() as Ticks
    }
}

/// Fixed tick source for testing
#[derive(Debug, Clone)]
pub struct FixedTicks {
    ticks: Ticks,
}

impl FixedTicks {
    /// Counter held at `ticks`
    pub fn new(ticks: Ticks) -> Self {
        Self { ticks }
    }

    /// Jump to `ticks`
    pub fn set(&mut self, ticks: Ticks) {
        self.ticks = ticks;
    }

    /// Advance by `ms`, wrapping like the hardware counter
    pub fn advance(&mut self, ms: u32) {
        self.ticks = self.ticks.wrapping_add(ms);
    }
}

impl TickSource for FixedTicks {
    fn now(&self) -> Ticks {
        self.ticks
    }
}
