//! Sync Protocol and Scheduling Constants
//!
//! Defaults for the three time sources and the loop that drives them.

use super::time::{MS_PER_MINUTE, MS_PER_SECOND};

// ===== PLAUSIBILITY =====

/// Minimum plausible Unix time (seconds): 2013-01-01 12:00:00 UTC.
///
/// Anything older means the source lost its state (dead RTC battery, radio
/// that never reached an NTP server). Such candidates are rejected.
pub const MIN_PLAUSIBLE_EPOCH: u64 = 1_357_041_600;

// ===== SERIAL PROTOCOL =====

/// Header byte that starts a time message from the companion radio.
pub const TIME_HEADER: u8 = b'T';

/// Request byte sent to the companion radio to ask for network time.
pub const TIME_REQUEST: u8 = b'$';

/// Inter-byte timeout (milliseconds) after which a pending digit run is
/// considered complete.
pub const DEFAULT_SERIAL_TIMEOUT_MS: u32 = MS_PER_SECOND;

// ===== SCHEDULING =====

/// Interval between network time requests (milliseconds).
///
/// The companion radio answers each request with an NTP lookup; asking more
/// often only floods it.
pub const DEFAULT_NETWORK_INTERVAL_MS: u32 = 30 * MS_PER_SECOND;

/// Interval between positioning attempts (milliseconds).
pub const DEFAULT_POSITIONING_INTERVAL_MS: u32 = 30 * MS_PER_SECOND;

/// Delay before the first positioning attempt (milliseconds).
///
/// Staggers the receiver power-up against the first network request.
pub const DEFAULT_POSITIONING_FIRST_DELAY_MS: u32 = 15 * MS_PER_SECOND;

/// Maximum time the receiver stays powered waiting for a fix (milliseconds).
///
/// Cold-start acquisition routinely takes tens of seconds.
pub const DEFAULT_FIX_TIMEOUT_MS: u32 = 2 * MS_PER_MINUTE;

/// Interval between display updates (milliseconds).
pub const DEFAULT_DISPLAY_INTERVAL_MS: u32 = MS_PER_SECOND;

/// Default offset from UTC applied to satellite time (hours).
pub const DEFAULT_UTC_OFFSET_HOURS: i8 = -4;

/// Valid range of zone offsets (hours).
pub const UTC_OFFSET_RANGE_HOURS: (i8, i8) = (-12, 14);

// ===== BUFFERS =====

/// Upper bound on events produced by a single scheduler tick.
///
/// request + network result + write failure + fix start + fix result
/// + write failure + display = 7.
pub const MAX_EVENTS_PER_TICK: usize = 8;

/// Capacity of a formatted display line.
pub const DISPLAY_LINE_CAPACITY: usize = 32;
