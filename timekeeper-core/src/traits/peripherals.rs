//! Peripheral interfaces consumed by the sync core
//!
//! Each trait is the smallest surface the core needs from an opaque driver.

use core::fmt::Debug;

use crate::fix::Fix;
use crate::time::Timestamp;

/// Battery-backed real-time clock
///
/// Always available, drifts over time. Read once at boot and written back
/// after every successful sync.
pub trait HardwareClock {
    /// Driver error
    type Error: Debug;

    /// Current register value in seconds since the Unix epoch
    fn read(&mut self) -> Result<Timestamp, Self::Error>;

    /// Store a new time. Callers treat failure as non-fatal.
    fn write(&mut self, time: Timestamp) -> Result<(), Self::Error>;
}

/// Byte-oriented link to the companion radio
///
/// Same shape as the embedded-hal 0.2 serial traits.
///
/// - `Err(nb::Error::WouldBlock)` from `read` means no byte is waiting
/// - `Err(nb::Error::WouldBlock)` from `write` means the TX buffer is full
pub trait SerialPort {
    /// Line error (framing, overrun, parity)
    type Error: Debug;

    /// Take the next received byte
    fn read(&mut self) -> nb::Result<u8, Self::Error>;

    /// Queue one byte for transmission
    fn write(&mut self, byte: u8) -> nb::Result<(), Self::Error>;
}

/// Satellite receiver driver with its fix decoder
pub trait FixReceiver {
    /// Driver error
    type Error: Debug;

    /// Cheap check: has the decoder completed a fix since the last read?
    fn available(&mut self) -> bool;

    /// Take the latest decoded fix
    fn read_fix(&mut self) -> Result<Fix, Self::Error>;

    /// Non-blocking read: `WouldBlock` while no fix is available
    fn poll_fix(&mut self) -> nb::Result<Fix, Self::Error> {
        if !self.available() {
            return Err(nb::Error::WouldBlock);
        }
        self.read_fix().map_err(nb::Error::Other)
    }
}

/// Discrete output switching the receiver's supply. High means powered.
pub trait PowerLine {
    /// Power the receiver
    fn set_high(&mut self);

    /// Cut receiver power
    fn set_low(&mut self);

    /// Current line level
    fn is_high(&self) -> bool;
}

/// Fire-and-forget text output (LCD, debug UART, log)
pub trait DisplaySink {
    /// Replace what is shown with `line`
    fn show(&mut self, line: &str);
}
