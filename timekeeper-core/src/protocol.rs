//! Serial sync protocol with the companion radio
//!
//! ## Wire Format
//!
//! ```text
//! core  -> radio   '$'                       request, one byte
//! radio -> core    'T' <decimal digits> <any non-digit>
//!                  e.g. "T1700000000\n"
//! ```
//!
//! There is no correlation id; at most one request is outstanding, since
//! requests are rate-limited by the network interval.
//!
//! ## Decoding Rules
//!
//! - Bytes before a header are line noise and are skipped
//! - Any non-digit bytes between the header and the first digit are skipped,
//!   so `"T\r\n1700000000"` decodes; a second header restarts the message
//! - The digit run ends at the first non-digit, at the end of a buffer
//!   ([`try_receive_sync`]) or after the inter-byte timeout ([`SyncReceiver`])
//! - A header with no digits, a zero value or a digit run that overflows
//!   64 bits is a [`SyncError::MalformedSyncMessage`]
//!
//! The protocol layer only frames and decodes. Whether the decoded value is a
//! believable time is decided by [`crate::clock::SystemClock::apply`].

use crate::constants::{TIME_HEADER, TIME_REQUEST};
use crate::errors::{SyncError, SyncResult};
use crate::time::{ElapsedTimer, Millis, Ticks, Timestamp};
use crate::traits::SerialPort;

/// Ask the companion radio for network time
///
/// Writes the single request byte. `WouldBlock` means the transport could
/// not take it this tick; callers do not retry until the next interval.
pub fn send_sync_request<S: SerialPort>(port: &mut S) -> nb::Result<(), S::Error> {
    port.write(TIME_REQUEST)
}

/// Decode the first time message in `inbound`
///
/// - `Ok(None)`: no header in the buffer, nothing to report yet
/// - `Ok(Some(t))`: header followed by digits
/// - `Err(MalformedSyncMessage)`: header without a usable number
///
/// ```rust
/// use timekeeper_core::protocol::try_receive_sync;
///
/// assert_eq!(try_receive_sync(b"T1700000000"), Ok(Some(1_700_000_000)));
/// assert_eq!(try_receive_sync(b"noise"), Ok(None));
/// ```
pub fn try_receive_sync(inbound: &[u8]) -> SyncResult<Option<Timestamp>> {
    let mut decoder = SyncDecoder::new();

    for &byte in inbound {
        if let Some(result) = decoder.feed(byte) {
            return result.map(Some);
        }
    }

    decoder.finish().transpose()
}

/// Byte-at-a-time decoder state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DecodeState {
    /// Looking for a header
    Searching,
    /// Header seen, accumulating digits
    Digits { value: u64, count: u8 },
}

/// Incremental decoder for the time message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncDecoder {
    state: DecodeState,
}

impl Default for SyncDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl SyncDecoder {
    /// Decoder waiting for a header
    pub const fn new() -> Self {
        Self {
            state: DecodeState::Searching,
        }
    }

    /// True between a header and the end of its digit run
    pub fn in_message(&self) -> bool {
        matches!(self.state, DecodeState::Digits { .. })
    }

    /// Consume one byte; `Some` when a message just completed
    pub fn feed(&mut self, byte: u8) -> Option<SyncResult<Timestamp>> {
        match self.state {
            DecodeState::Searching => {
                if byte == TIME_HEADER {
                    self.state = DecodeState::Digits { value: 0, count: 0 };
                }
                None
            }
            DecodeState::Digits { value, count } => {
                if byte.is_ascii_digit() {
                    let digit = u64::from(byte - b'0');
                    match value.checked_mul(10).and_then(|v| v.checked_add(digit)) {
                        Some(value) => {
                            self.state = DecodeState::Digits {
                                value,
                                count: count.saturating_add(1),
                            };
                            None
                        }
                        None => {
                            self.state = DecodeState::Searching;
                            Some(Err(SyncError::MalformedSyncMessage))
                        }
                    }
                } else if count == 0 && byte != TIME_HEADER {
                    None
                } else {
                    let result = self.finish();
                    // A header doubles as terminator and as the next start
                    if byte == TIME_HEADER {
                        self.state = DecodeState::Digits { value: 0, count: 0 };
                    }
                    result
                }
            }
        }
    }

    /// Close any pending message and return to searching
    pub fn finish(&mut self) -> Option<SyncResult<Timestamp>> {
        let state = core::mem::replace(&mut self.state, DecodeState::Searching);

        match state {
            DecodeState::Searching => None,
            DecodeState::Digits { count: 0, .. } | DecodeState::Digits { value: 0, .. } => {
                Some(Err(SyncError::MalformedSyncMessage))
            }
            DecodeState::Digits { value, .. } => Some(Ok(value)),
        }
    }

    /// Drop any partial message
    pub fn reset(&mut self) {
        self.state = DecodeState::Searching;
    }
}

/// Streaming receiver over a non-blocking serial port
///
/// Holds decode state across loop ticks. A digit run is closed by a
/// terminator byte or, failing that, by `timeout` of silence on the line.
#[derive(Debug, Clone, Copy)]
pub struct SyncReceiver {
    decoder: SyncDecoder,
    last_byte: ElapsedTimer,
    timeout: Millis,
}

impl SyncReceiver {
    /// Receiver closing partial messages after `timeout` of silence
    pub fn new(now: Ticks, timeout: Millis) -> Self {
        Self {
            decoder: SyncDecoder::new(),
            last_byte: ElapsedTimer::new(now),
            timeout,
        }
    }

    /// Drain available bytes; returns at the first completed message
    ///
    /// Bytes behind a completed message stay in the port for the next call.
    pub fn poll<S: SerialPort>(&mut self, port: &mut S, now: Ticks) -> Option<SyncResult<Timestamp>> {
        loop {
            match port.read() {
                Ok(byte) => {
                    self.last_byte.mark(now);
                    if let Some(result) = self.decoder.feed(byte) {
                        return Some(result);
                    }
                }
                Err(nb::Error::WouldBlock) => break,
                Err(nb::Error::Other(_e)) => {
                    log_warn!("Serial read error, discarding partial sync message");
                    let was_pending = self.decoder.in_message();
                    self.decoder.reset();
                    if was_pending {
                        return Some(Err(SyncError::MalformedSyncMessage));
                    }
                    return None;
                }
            }
        }

        if self.decoder.in_message() && self.last_byte.has_elapsed(now, self.timeout) {
            return self.decoder.finish();
        }

        None
    }

    /// True while a message is partially received
    pub fn in_message(&self) -> bool {
        self.decoder.in_message()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockSerial;

    const TIMEOUT: Millis = Millis::from_ticks(1000);

    #[test]
    fn request_is_single_marker_byte() {
        let mut port = MockSerial::new();
        send_sync_request(&mut port).unwrap();
        assert_eq!(port.outbound(), b"$");
    }

    #[test]
    fn decodes_network_time() {
        assert_eq!(try_receive_sync(b"T1700000000"), Ok(Some(1_700_000_000)));
        assert_eq!(try_receive_sync(b"T1700000000\r\n"), Ok(Some(1_700_000_000)));
    }

    #[test]
    fn small_values_are_decoded_not_judged() {
        // Plausibility belongs to the clock
        assert_eq!(try_receive_sync(b"T5"), Ok(Some(5)));
    }

    #[test]
    fn skips_noise_before_header() {
        assert_eq!(try_receive_sync(b"\x00garbage T 1700000000\n"), Ok(Some(1_700_000_000)));
    }

    #[test]
    fn skips_any_non_digits_before_value() {
        assert_eq!(try_receive_sync(b"T\r\n1700000000\n"), Ok(Some(1_700_000_000)));
        assert_eq!(try_receive_sync(b"T: 1700000000\n"), Ok(Some(1_700_000_000)));
    }

    #[test]
    fn receiver_waits_across_line_break_after_header() {
        let mut port = MockSerial::new();
        let mut receiver = SyncReceiver::new(0, TIMEOUT);

        port.push_inbound(b"T\r\n");
        assert_eq!(receiver.poll(&mut port, 10), None);
        assert!(receiver.in_message());

        port.push_inbound(b"1700000000\n");
        assert_eq!(receiver.poll(&mut port, 20), Some(Ok(1_700_000_000)));
    }

    #[test]
    fn header_alone_times_out_as_malformed() {
        let mut port = MockSerial::new();
        let mut receiver = SyncReceiver::new(0, TIMEOUT);

        port.push_inbound(b"T\n");
        assert_eq!(receiver.poll(&mut port, 0), None);
        assert_eq!(
            receiver.poll(&mut port, 1000),
            Some(Err(SyncError::MalformedSyncMessage))
        );
    }

    #[test]
    fn no_header_is_not_an_error() {
        assert_eq!(try_receive_sync(b""), Ok(None));
        assert_eq!(try_receive_sync(b"1700000000"), Ok(None));
    }

    #[test]
    fn header_without_digits_is_malformed() {
        assert_eq!(try_receive_sync(b"T"), Err(SyncError::MalformedSyncMessage));
        assert_eq!(try_receive_sync(b"Tabc"), Err(SyncError::MalformedSyncMessage));
    }

    #[test]
    fn zero_is_malformed() {
        assert_eq!(try_receive_sync(b"T0000\n"), Err(SyncError::MalformedSyncMessage));
    }

    #[test]
    fn overflow_is_malformed() {
        assert_eq!(
            try_receive_sync(b"T99999999999999999999999"),
            Err(SyncError::MalformedSyncMessage)
        );
    }

    #[test]
    fn header_terminates_and_restarts() {
        let mut decoder = SyncDecoder::new();
        assert_eq!(decoder.feed(b'T'), None);
        assert_eq!(decoder.feed(b'T'), Some(Err(SyncError::MalformedSyncMessage)));
        for &b in b"1700000000" {
            assert_eq!(decoder.feed(b), None);
        }
        assert_eq!(decoder.feed(b'\n'), Some(Ok(1_700_000_000)));
    }

    #[test]
    fn receiver_waits_for_terminator_across_ticks() {
        let mut port = MockSerial::new();
        let mut receiver = SyncReceiver::new(0, TIMEOUT);

        port.push_inbound(b"T17000");
        assert_eq!(receiver.poll(&mut port, 10), None);
        assert!(receiver.in_message());

        port.push_inbound(b"00000\n");
        assert_eq!(receiver.poll(&mut port, 20), Some(Ok(1_700_000_000)));
        assert!(!receiver.in_message());
    }

    #[test]
    fn receiver_closes_message_after_silence() {
        let mut port = MockSerial::new();
        let mut receiver = SyncReceiver::new(0, TIMEOUT);

        port.push_inbound(b"T1700000000");
        assert_eq!(receiver.poll(&mut port, 100), None);
        assert_eq!(receiver.poll(&mut port, 1099), None);
        assert_eq!(receiver.poll(&mut port, 1100), Some(Ok(1_700_000_000)));
    }

    #[test]
    fn receiver_leaves_following_bytes_for_next_poll() {
        let mut port = MockSerial::new();
        let mut receiver = SyncReceiver::new(0, TIMEOUT);

        port.push_inbound(b"T1700000000\nT1700000001\n");
        assert_eq!(receiver.poll(&mut port, 0), Some(Ok(1_700_000_000)));
        assert_eq!(receiver.poll(&mut port, 0), Some(Ok(1_700_000_001)));
        assert_eq!(receiver.poll(&mut port, 0), None);
    }

    #[test]
    fn line_error_discards_partial_message() {
        let mut port = MockSerial::new();
        let mut receiver = SyncReceiver::new(0, TIMEOUT);

        port.push_inbound(b"T1700");
        assert_eq!(receiver.poll(&mut port, 0), None);

        port.fault_next_read();
        assert_eq!(
            receiver.poll(&mut port, 5),
            Some(Err(SyncError::MalformedSyncMessage))
        );
        assert!(!receiver.in_message());
    }
}
