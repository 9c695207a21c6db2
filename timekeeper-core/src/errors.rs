//! Error Types for Clock Synchronization Failures
//!
//! ## Design Philosophy
//!
//! Nothing in Timekeeper is fatal. Every error below describes a sync attempt
//! that did not produce a usable time; the clock keeps whatever it had and
//! the next scheduled attempt proceeds normally.
//!
//! Errors follow the same rules as the rest of the crate:
//!
//! 1. **Small Size**: variants carry at most one integer so they can travel
//!    inside per-tick event lists without bloating them.
//!
//! 2. **No Heap Allocation**: only `&'static str` for messages.
//!
//! 3. **Copy Semantics**: errors are returned from the hot loop and copied
//!    into events freely.
//!
//! ## Error Categories
//!
//! ### Rejected Candidates
//! - `ImplausibleTimestamp`: a source produced a time before the plausibility
//!   threshold (Jan 1 2013), almost always upstream corruption
//! - `MalformedSyncMessage`: the companion radio sent a header with no usable digits
//!
//! ### Source Failures
//! - `FixTimeout`: the satellite receiver never produced a fix in its window
//! - `TransportBusy`: the sync request byte could not be written this tick
//!
//! ### Persistence
//! - `ClockWriteFailure`: the hardware clock refused a write; the in-memory
//!   time remains authoritative for the session
//!
//! ## Error Handling Strategy
//!
//! ```rust
//! use timekeeper_core::SyncError;
//!
//! fn on_failure(error: SyncError) {
//!     match error {
//!         SyncError::ImplausibleTimestamp { .. } => {
//!             // Source is sending garbage - count it, keep the clock
//!         }
//!         SyncError::FixTimeout { .. } => {
//!             // Receiver already powered down, retry on the next interval
//!         }
//!         _ => {}
//!     }
//! }
//! ```

use thiserror_no_std::Error;

/// Result type for sync operations
pub type SyncResult<T> = Result<T, SyncError>;

/// Sync errors - kept small for embedded use
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncError {
    /// Candidate is older than the minimum plausible epoch
    #[error("Implausible timestamp {candidate}")]
    ImplausibleTimestamp {
        /// The rejected value; for satellite time, whichever of the raw or
        /// shifted value failed
        candidate: u64,
    },

    /// Header seen, but no digits, a zero value, or an overflowing digit run
    #[error("Malformed sync message")]
    MalformedSyncMessage,

    /// No valid fix within the acquisition window
    #[error("No fix after {waited_ms}ms")]
    FixTimeout {
        /// Time the receiver was powered
        waited_ms: u32,
    },

    /// Durable write to the hardware clock failed
    #[error("Hardware clock write failed")]
    ClockWriteFailure,

    /// Serial transport could not accept the request byte
    #[error("Serial transport busy")]
    TransportBusy,
}

/// Configuration errors reported by [`crate::config::SyncConfig::validate`]
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// An interval or timeout of zero would fire on every tick
    #[error("Interval '{name}' must be non-zero")]
    ZeroInterval {
        /// Config field name
        name: &'static str,
    },

    /// Zone offset outside the range of real time zones
    #[error("UTC offset {hours}h outside [-12, 14]")]
    OffsetOutOfRange {
        /// The configured offset
        hours: i8,
    },
}

#[cfg(feature = "defmt")]
impl defmt::Format for SyncError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::ImplausibleTimestamp { candidate } =>
                defmt::write!(fmt, "Implausible timestamp {}", candidate),
            Self::MalformedSyncMessage =>
                defmt::write!(fmt, "Malformed sync message"),
            Self::FixTimeout { waited_ms } =>
                defmt::write!(fmt, "No fix after {}ms", waited_ms),
            Self::ClockWriteFailure =>
                defmt::write!(fmt, "Hardware clock write failed"),
            Self::TransportBusy =>
                defmt::write!(fmt, "Serial transport busy"),
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for ConfigError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::ZeroInterval { name } =>
                defmt::write!(fmt, "Interval '{}' must be non-zero", name),
            Self::OffsetOutOfRange { hours } =>
                defmt::write!(fmt, "UTC offset {}h out of range", hours),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_stay_small() {
        assert!(core::mem::size_of::<SyncError>() <= 16);
    }

    #[cfg(feature = "std")]
    #[test]
    fn messages_carry_context() {
        let err = SyncError::ImplausibleTimestamp { candidate: 5 };
        assert_eq!(err.to_string(), "Implausible timestamp 5");

        let err = SyncError::FixTimeout { waited_ms: 120_001 };
        assert_eq!(err.to_string(), "No fix after 120001ms");
    }
}
