//! Time-Related Constants
//!
//! Conversion factors between the units the crate mixes: millisecond ticks
//! from the loop counter and whole seconds on the wall clock.

/// Milliseconds per second.
pub const MS_PER_SECOND: u32 = 1000;

/// Seconds per minute.
pub const SECONDS_PER_MINUTE: u32 = 60;

/// Minutes per hour.
pub const MINUTES_PER_HOUR: u32 = 60;

/// Seconds per hour.
///
/// Zone offsets are configured in hours and applied in seconds.
pub const SECONDS_PER_HOUR: i64 = (SECONDS_PER_MINUTE * MINUTES_PER_HOUR) as i64;

/// Milliseconds per minute.
pub const MS_PER_MINUTE: u32 = MS_PER_SECOND * SECONDS_PER_MINUTE;
