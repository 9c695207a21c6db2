//! Clock arbitration core for Timekeeper
//!
//! Keeps an authoritative wall-clock time on a device without a reliable
//! network of its own by arbitrating between three unreliable sources:
//! - a battery-backed hardware clock (always there, drifts)
//! - a companion radio on a serial link that answers with NTP time
//! - a satellite receiver (accurate, slow to fix, power hungry)
//!
//! Key constraints:
//! - Single-threaded cooperative loop, nothing ever blocks
//! - No heap allocation
//! - Interval arithmetic survives the 32-bit millisecond counter wrapping
//!
//! ```no_run
//! use timekeeper_core::{SyncConfig, SyncScheduler};
//! use timekeeper_core::mock::{MockHardwareClock, MockPowerLine, MockReceiver, MockSerial};
//!
//! let mut scheduler = SyncScheduler::new(
//!     &SyncConfig::default(),
//!     MockHardwareClock::new(1_357_041_600),
//!     MockSerial::new(),
//!     MockReceiver::new(),
//!     MockPowerLine::new(),
//!     0,
//! )?;
//!
//! // Call once per loop iteration with the millisecond counter
//! let events = scheduler.tick(1_000);
//! # let _ = events;
//! # Ok::<(), timekeeper_core::ConfigError>(())
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![deny(unsafe_code)]
#![warn(missing_docs)]

#[macro_use]
mod logging;

pub mod clock;
pub mod config;
pub mod constants;
pub mod display;
pub mod errors;
pub mod events;
pub mod fix;
pub mod mock;
pub mod protocol;
pub mod scheduler;
pub mod time;
pub mod traits;

// Public API
pub use clock::{ClockSource, ClockState, Committed, SystemClock};
pub use config::SyncConfig;
pub use errors::{ConfigError, SyncError, SyncResult};
pub use events::{SyncEvent, TickEvents};
pub use fix::{Fix, FixAcquisition, FixOutcome, FixPolicy, FixState};
pub use scheduler::{SyncSchedule, SyncScheduler, SyncStats};
pub use time::{ElapsedTimer, IntervalTimer, Millis, Ticks, Timestamp};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
