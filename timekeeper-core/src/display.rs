//! Clock display formatting
//!
//! Renders a timestamp as `H:MM:SS D M YYYY`, the layout the device shows
//! on its status line, into a fixed-capacity string.

use core::fmt::Write;

use chrono::{DateTime, Datelike, Timelike};
use heapless::String;

use crate::constants::sync::DISPLAY_LINE_CAPACITY;
use crate::events::SyncEvent;
use crate::time::Timestamp;
use crate::traits::DisplaySink;

/// One formatted status line
pub type DisplayLine = String<DISPLAY_LINE_CAPACITY>;

/// Format `time` as `H:MM:SS D M YYYY`
///
/// Times chrono cannot represent render as a placeholder rather than failing.
///
/// ```rust
/// use timekeeper_core::display::format_clock;
///
/// assert_eq!(format_clock(1_357_041_600).as_str(), "12:00:00 1 1 2013");
/// ```
pub fn format_clock(time: Timestamp) -> DisplayLine {
    let mut line = DisplayLine::new();

    let date_time = i64::try_from(time)
        .ok()
        .and_then(|secs| DateTime::from_timestamp(secs, 0));

    // Capacity covers the longest representable date
    let _ = match date_time {
        Some(dt) => write!(
            line,
            "{}:{:02}:{:02} {} {} {}",
            dt.hour(),
            dt.minute(),
            dt.second(),
            dt.day(),
            dt.month(),
            dt.year()
        ),
        None => line.write_str("--:--:--"),
    };

    line
}

/// Hand every display event of a tick to `sink`
pub fn forward<D: DisplaySink>(events: &[SyncEvent], sink: &mut D) {
    for event in events {
        if let SyncEvent::Display { time } = event {
            sink.show(&format_clock(*time));
        }
    }
}
