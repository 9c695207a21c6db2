//! In-memory peripherals for tests and host simulation
//!
//! Each double records what the core did to it so tests can assert on
//! side effects (RTC writes, bytes sent, power toggles) without hardware.

use heapless::{Deque, Vec};

use crate::fix::Fix;
use crate::time::Timestamp;
use crate::traits::{DisplaySink, FixReceiver, HardwareClock, PowerLine, SerialPort};

/// Error returned by every mock when told to fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockError;

/// RTC register with switchable read/write failures
#[derive(Debug, Clone)]
pub struct MockHardwareClock {
    time: Timestamp,
    fail_reads: bool,
    fail_writes: bool,
    writes: u32,
}

impl MockHardwareClock {
    /// Register holding `time`
    pub fn new(time: Timestamp) -> Self {
        Self {
            time,
            fail_reads: false,
            fail_writes: false,
            writes: 0,
        }
    }

    /// Every read fails
    pub fn failing_reads(mut self) -> Self {
        self.fail_reads = true;
        self
    }

    /// Every write fails and leaves the register alone
    pub fn failing_writes(mut self) -> Self {
        self.fail_writes = true;
        self
    }

    /// Register contents
    pub fn time(&self) -> Timestamp {
        self.time
    }

    /// Successful writes so far
    pub fn writes(&self) -> u32 {
        self.writes
    }
}

impl HardwareClock for MockHardwareClock {
    type Error = MockError;

    fn read(&mut self) -> Result<Timestamp, Self::Error> {
        if self.fail_reads {
            return Err(MockError);
        }
        Ok(self.time)
    }

    fn write(&mut self, time: Timestamp) -> Result<(), Self::Error> {
        if self.fail_writes {
            return Err(MockError);
        }
        self.time = time;
        self.writes += 1;
        Ok(())
    }
}

/// Serial link with a bounded inbound queue and an outbound record
#[derive(Debug, Default)]
pub struct MockSerial {
    inbound: Deque<u8, 128>,
    outbound: Vec<u8, 64>,
    busy: bool,
    fault_next_read: bool,
}

impl MockSerial {
    /// Idle line, nothing queued
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue bytes as if the companion radio sent them; excess is dropped
    pub fn push_inbound(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            if self.inbound.push_back(byte).is_err() {
                break;
            }
        }
    }

    /// Bytes written by the core
    pub fn outbound(&self) -> &[u8] {
        &self.outbound
    }

    /// Bytes not yet read by the core
    pub fn pending_inbound(&self) -> usize {
        self.inbound.len()
    }

    /// Make writes report `WouldBlock`
    pub fn set_busy(&mut self, busy: bool) {
        self.busy = busy;
    }

    /// Make the next read report a line error (framing/overrun)
    pub fn fault_next_read(&mut self) {
        self.fault_next_read = true;
    }
}

impl SerialPort for MockSerial {
    type Error = MockError;

    fn read(&mut self) -> nb::Result<u8, Self::Error> {
        if self.fault_next_read {
            self.fault_next_read = false;
            return Err(nb::Error::Other(MockError));
        }
        self.inbound.pop_front().ok_or(nb::Error::WouldBlock)
    }

    fn write(&mut self, byte: u8) -> nb::Result<(), Self::Error> {
        if self.busy {
            return Err(nb::Error::WouldBlock);
        }
        self.outbound.push(byte).map_err(|_| nb::Error::WouldBlock)
    }
}

/// Receiver holding at most one decoded fix
#[derive(Debug, Default)]
pub struct MockReceiver {
    pending: Option<Fix>,
    reads: u32,
    fail_reads: bool,
}

impl MockReceiver {
    /// No fix pending
    pub fn new() -> Self {
        Self::default()
    }

    /// Make a fix available to the next poll
    pub fn deliver(&mut self, fix: Fix) {
        self.pending = Some(fix);
    }

    /// Make reads fail, consuming the pending fix
    pub fn set_failing(&mut self, failing: bool) {
        self.fail_reads = failing;
    }

    /// Read attempts so far
    pub fn reads(&self) -> u32 {
        self.reads
    }
}

impl FixReceiver for MockReceiver {
    type Error = MockError;

    fn available(&mut self) -> bool {
        self.pending.is_some()
    }

    fn read_fix(&mut self) -> Result<Fix, Self::Error> {
        self.reads += 1;
        if self.fail_reads {
            self.pending = None;
            return Err(MockError);
        }
        self.pending.take().ok_or(MockError)
    }
}

/// Power line that counts transitions
#[derive(Debug, Default)]
pub struct MockPowerLine {
    high: bool,
    power_ups: u32,
}

impl MockPowerLine {
    /// Line low
    pub fn new() -> Self {
        Self::default()
    }

    /// Low-to-high transitions so far
    pub fn power_ups(&self) -> u32 {
        self.power_ups
    }
}

impl PowerLine for MockPowerLine {
    fn set_high(&mut self) {
        if !self.high {
            self.power_ups += 1;
        }
        self.high = true;
    }

    fn set_low(&mut self) {
        self.high = false;
    }

    fn is_high(&self) -> bool {
        self.high
    }
}

/// Display that keeps the last line shown
#[derive(Debug, Default)]
pub struct MockDisplay {
    last: heapless::String<64>,
    shown: u32,
}

impl MockDisplay {
    /// Blank display
    pub fn new() -> Self {
        Self::default()
    }

    /// Most recent line
    pub fn last(&self) -> &str {
        &self.last
    }

    /// Lines shown so far
    pub fn shown(&self) -> u32 {
        self.shown
    }
}

impl DisplaySink for MockDisplay {
    fn show(&mut self, line: &str) {
        self.last.clear();
        let _ = self.last.push_str(line);
        self.shown += 1;
    }
}
