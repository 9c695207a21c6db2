//! Tick Source Abstraction for Embedded Systems
//!
//! The scheduler measures every interval on a free-running millisecond
//! counter. This trait abstracts where that counter comes from.
//!
//! ## Common Implementations
//!
//! - `MonotonicTicks`: host monotonic clock (std)
//! - `FixedTicks`: controllable counter for testing
//! - Firmware: SysTick / RTC prescaler / `millis()` equivalent
//!
//! ## Platform-Specific Considerations
//!
//! ### Bare Metal (no_std)
//! - A 32-bit millisecond counter wraps after ~49.7 days. That is expected;
//!   the crate only ever subtracts two readings with wrapping arithmetic
//! - Ensure interrupt-safe access if the counter is updated from an ISR
//!
//! ### Linux/Unix
//! - Use `CLOCK_MONOTONIC`; wall clock time may jump

use crate::time::Ticks;

/// Source of loop ticks
///
/// ## Implementation Requirements
///
/// - Must be monotonic apart from wrapping at `u32::MAX`
/// - Millisecond resolution; coarser counters delay interval edges
///
/// ## Example Implementation
///
/// ```rust
/// use timekeeper_core::traits::TickSource;
/// use timekeeper_core::time::Ticks;
///
/// struct SysTick {
///     // ... counter incremented by the SysTick ISR
///     count: Ticks,
/// }
///
/// impl TickSource for SysTick {
///     fn now(&self) -> Ticks {
///         self.count
///     }
/// }
/// ```
pub trait TickSource {
    /// Current counter value in milliseconds
    fn now(&self) -> Ticks;
}
