//! Collaborator Traits for Timekeeper
//!
//! Everything outside the arbitration core is reached through a trait
//! defined here. The core never touches a register, pin or UART directly,
//! which keeps it testable on the host with the in-memory doubles from
//! [`crate::mock`].
//!
//! ## Module Organization
//!
//! - [`time`] - loop tick counter abstraction
//! - [`peripherals`] - hardware clock, serial link, satellite receiver,
//!   receiver power line and display sink
//!
//! ## Design Philosophy
//!
//! - **Non-blocking**: anything that may have nothing to report answers
//!   through `nb::Result` or a cheap availability check
//! - **Static Dispatch**: the scheduler is generic over its peripherals, no
//!   trait objects in the hot loop
//! - **Associated Errors**: each driver keeps its own error type; the core
//!   only needs `Debug` to report it

pub mod peripherals;
pub mod time;

pub use peripherals::{DisplaySink, FixReceiver, HardwareClock, PowerLine, SerialPort};
pub use time::TickSource;
