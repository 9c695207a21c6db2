//! Runtime configuration
//!
//! One flat struct with every tunable of the sync core. Defaults come from
//! [`crate::constants`]; firmware usually builds it in code with the `with_*`
//! setters, host tools can deserialize it (feature `serde`) with missing
//! fields falling back to defaults.
//!
//! ```rust
//! use timekeeper_core::config::SyncConfig;
//!
//! let config = SyncConfig::default()
//!     .with_utc_offset_hours(1)
//!     .with_fix_timeout_ms(90_000);
//!
//! assert!(config.validate().is_ok());
//! assert_eq!(config.zone_offset_seconds(), 3600);
//! ```

use crate::constants::sync::{
    DEFAULT_DISPLAY_INTERVAL_MS, DEFAULT_FIX_TIMEOUT_MS, DEFAULT_NETWORK_INTERVAL_MS,
    DEFAULT_POSITIONING_FIRST_DELAY_MS, DEFAULT_POSITIONING_INTERVAL_MS,
    DEFAULT_SERIAL_TIMEOUT_MS, DEFAULT_UTC_OFFSET_HOURS, MIN_PLAUSIBLE_EPOCH,
    UTC_OFFSET_RANGE_HOURS,
};
use crate::constants::time::SECONDS_PER_HOUR;
use crate::errors::ConfigError;
use crate::time::{Millis, Timestamp};

/// Tunables for the clock, protocol, fix machine and scheduler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SyncConfig {
    /// Milliseconds between network time requests
    pub network_interval_ms: u32,

    /// Milliseconds between positioning attempts
    pub positioning_interval_ms: u32,

    /// Milliseconds from boot to the first positioning attempt
    pub positioning_first_delay_ms: u32,

    /// Milliseconds the receiver may stay powered without a fix
    pub fix_timeout_ms: u32,

    /// Milliseconds between display updates
    pub display_interval_ms: u32,

    /// Inter-byte timeout closing a pending network time message
    pub serial_timeout_ms: u32,

    /// Zone offset applied to satellite (UTC) time, in hours
    pub utc_offset_hours: i8,

    /// Oldest acceptable timestamp
    pub min_plausible_epoch: Timestamp,

    /// Minimum satellites for a fix to count; `None` accepts any fix with
    /// valid date and time
    pub min_satellites: Option<u8>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            network_interval_ms: DEFAULT_NETWORK_INTERVAL_MS,
            positioning_interval_ms: DEFAULT_POSITIONING_INTERVAL_MS,
            positioning_first_delay_ms: DEFAULT_POSITIONING_FIRST_DELAY_MS,
            fix_timeout_ms: DEFAULT_FIX_TIMEOUT_MS,
            display_interval_ms: DEFAULT_DISPLAY_INTERVAL_MS,
            serial_timeout_ms: DEFAULT_SERIAL_TIMEOUT_MS,
            utc_offset_hours: DEFAULT_UTC_OFFSET_HOURS,
            min_plausible_epoch: MIN_PLAUSIBLE_EPOCH,
            min_satellites: None,
        }
    }
}

impl SyncConfig {
    /// Set the network request interval
    pub fn with_network_interval_ms(mut self, ms: u32) -> Self {
        self.network_interval_ms = ms;
        self
    }

    /// Set the positioning attempt interval
    pub fn with_positioning_interval_ms(mut self, ms: u32) -> Self {
        self.positioning_interval_ms = ms;
        self
    }

    /// Set the delay before the first positioning attempt
    pub fn with_positioning_first_delay_ms(mut self, ms: u32) -> Self {
        self.positioning_first_delay_ms = ms;
        self
    }

    /// Set how long the receiver may stay powered without a fix
    pub fn with_fix_timeout_ms(mut self, ms: u32) -> Self {
        self.fix_timeout_ms = ms;
        self
    }

    /// Set the display interval
    pub fn with_display_interval_ms(mut self, ms: u32) -> Self {
        self.display_interval_ms = ms;
        self
    }

    /// Set the inter-byte timeout for network time messages
    pub fn with_serial_timeout_ms(mut self, ms: u32) -> Self {
        self.serial_timeout_ms = ms;
        self
    }

    /// Set the zone offset for satellite time
    pub fn with_utc_offset_hours(mut self, hours: i8) -> Self {
        self.utc_offset_hours = hours;
        self
    }

    /// Set the plausibility threshold
    pub fn with_min_plausible_epoch(mut self, epoch: Timestamp) -> Self {
        self.min_plausible_epoch = epoch;
        self
    }

    /// Require a minimum satellite count for fixes
    pub fn with_min_satellites(mut self, satellites: Option<u8>) -> Self {
        self.min_satellites = satellites;
        self
    }

    /// Reject settings that would hot-loop or describe no real time zone
    pub fn validate(&self) -> Result<(), ConfigError> {
        let intervals = [
            ("network_interval_ms", self.network_interval_ms),
            ("positioning_interval_ms", self.positioning_interval_ms),
            ("fix_timeout_ms", self.fix_timeout_ms),
            ("display_interval_ms", self.display_interval_ms),
            ("serial_timeout_ms", self.serial_timeout_ms),
        ];
        for (name, ms) in intervals {
            if ms == 0 {
                return Err(ConfigError::ZeroInterval { name });
            }
        }

        let (min, max) = UTC_OFFSET_RANGE_HOURS;
        if !(min..=max).contains(&self.utc_offset_hours) {
            return Err(ConfigError::OffsetOutOfRange {
                hours: self.utc_offset_hours,
            });
        }

        Ok(())
    }

    /// Zone offset in seconds, signed
    pub fn zone_offset_seconds(&self) -> i64 {
        i64::from(self.utc_offset_hours) * SECONDS_PER_HOUR
    }

    /// [`Self::network_interval_ms`] as a duration
    pub fn network_interval(&self) -> Millis {
        Millis::from_ticks(self.network_interval_ms)
    }

    /// [`Self::positioning_interval_ms`] as a duration
    pub fn positioning_interval(&self) -> Millis {
        Millis::from_ticks(self.positioning_interval_ms)
    }

    /// [`Self::positioning_first_delay_ms`] as a duration
    pub fn positioning_first_delay(&self) -> Millis {
        Millis::from_ticks(self.positioning_first_delay_ms)
    }

    /// [`Self::fix_timeout_ms`] as a duration
    pub fn fix_timeout(&self) -> Millis {
        Millis::from_ticks(self.fix_timeout_ms)
    }

    /// [`Self::display_interval_ms`] as a duration
    pub fn display_interval(&self) -> Millis {
        Millis::from_ticks(self.display_interval_ms)
    }

    /// [`Self::serial_timeout_ms`] as a duration
    pub fn serial_timeout(&self) -> Millis {
        Millis::from_ticks(self.serial_timeout_ms)
    }
}
