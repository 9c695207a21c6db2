//! Events reported by the scheduler tick
//!
//! The scheduler owns the peripherals it needs to make decisions (serial
//! link, receiver, power line, RTC). Everything else it wants the outside
//! world to know about, it reports as a [`SyncEvent`]: what was requested,
//! what was committed, what failed, and when the display is due.
//!
//! Events are plain `Copy` data so a tick's worth of them fits in a
//! fixed-capacity `heapless::Vec` on the stack.

use core::fmt;

use heapless::Vec;

use crate::clock::ClockSource;
use crate::constants::sync::MAX_EVENTS_PER_TICK;
use crate::errors::SyncError;
use crate::time::Timestamp;

/// Something observable that happened during a tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncEvent {
    /// Request byte sent to the companion radio
    SyncRequested,
    /// A source's time was committed
    TimeSynced {
        /// Source that won
        source: ClockSource,
        /// Committed time, zone offset included
        time: Timestamp,
    },
    /// A sync attempt did not produce a committed time, or the commit was
    /// not persisted
    Failed {
        /// Source of the attempt
        source: ClockSource,
        /// What went wrong
        error: SyncError,
    },
    /// Receiver powered for a new positioning attempt
    FixStarted,
    /// Display interval elapsed; `time` is the clock reading to show
    Display {
        /// Seconds since the Unix epoch, local
        time: Timestamp,
    },
}

impl SyncEvent {
    /// True for [`SyncEvent::Failed`]
    pub fn is_failure(&self) -> bool {
        matches!(self, SyncEvent::Failed { .. })
    }
}

impl fmt::Display for SyncEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncEvent::SyncRequested => write!(f, "Requesting network time"),
            SyncEvent::TimeSynced { source, time } => {
                write!(f, "Time synced via {}: {}", source, time)
            }
            SyncEvent::Failed { source, error } => write!(f, "{} sync failed: {}", source, error),
            SyncEvent::FixStarted => write!(f, "Receiver powered for fix"),
            SyncEvent::Display { time } => write!(f, "Display {}", time),
        }
    }
}

/// Events of a single tick, in the order they happened
pub type TickEvents = Vec<SyncEvent, MAX_EVENTS_PER_TICK>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_classification() {
        let failed = SyncEvent::Failed {
            source: ClockSource::Satellite,
            error: SyncError::FixTimeout { waited_ms: 120_001 },
        };
        assert!(failed.is_failure());
        assert!(!SyncEvent::FixStarted.is_failure());
    }

    #[cfg(feature = "std")]
    #[test]
    fn events_render_for_logs() {
        let event = SyncEvent::TimeSynced {
            source: ClockSource::Network,
            time: 1_700_000_000,
        };
        assert_eq!(event.to_string(), "Time synced via network: 1700000000");
    }
}
