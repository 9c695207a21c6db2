//! Constants for Timekeeper Core
//!
//! Every numeric default used by the clock, the serial protocol and the
//! scheduler lives here, grouped by domain:
//! - **Time**: unit conversions
//! - **Sync**: plausibility threshold, protocol bytes, default intervals
//!
//! ## Usage Guidelines
//!
//! 1. Always use these constants instead of magic numbers
//! 2. Defaults feed [`crate::config::SyncConfig::default`]; deployments
//!    override them through the config, not by editing this module
//! 3. Include units in the name

/// Time unit conversions.
pub mod time;

/// Sync protocol bytes, thresholds and default intervals.
pub mod sync;

pub use time::{MS_PER_SECOND, SECONDS_PER_HOUR};

pub use sync::{
    MIN_PLAUSIBLE_EPOCH, TIME_HEADER, TIME_REQUEST,
    DEFAULT_NETWORK_INTERVAL_MS, DEFAULT_POSITIONING_INTERVAL_MS,
    DEFAULT_FIX_TIMEOUT_MS, DEFAULT_DISPLAY_INTERVAL_MS,
};
