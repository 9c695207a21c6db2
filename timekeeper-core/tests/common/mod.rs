//! Common test utilities for integration tests
//!
//! Provides:
//! - A scheduler wired to in-memory peripherals
//! - A loop driver that advances the tick counter and collects events
//! - Fix builders

#![allow(dead_code)]

use timekeeper_core::{
    fix::{Fix, FixValidity},
    mock::{MockHardwareClock, MockPowerLine, MockReceiver, MockSerial},
    time::{FixedTicks, Ticks, Timestamp},
    traits::TickSource,
    SyncConfig, SyncEvent, SyncScheduler,
};

pub type MockScheduler = SyncScheduler<MockHardwareClock, MockSerial, MockReceiver, MockPowerLine>;

/// Scheduler plus the counter driving it
pub struct TestRig {
    pub scheduler: MockScheduler,
    pub ticks: FixedTicks,
    pub events: Vec<(Ticks, SyncEvent)>,
}

impl TestRig {
    /// Boot with the RTC holding `rtc_time` at counter value `start`
    pub fn boot(config: SyncConfig, rtc_time: Timestamp, start: Ticks) -> Self {
        Self::boot_with(config, MockHardwareClock::new(rtc_time), start)
    }

    pub fn boot_with(config: SyncConfig, hardware: MockHardwareClock, start: Ticks) -> Self {
        Self {
            scheduler: SyncScheduler::new(
                &config,
                hardware,
                MockSerial::new(),
                MockReceiver::new(),
                MockPowerLine::new(),
                start,
            )
            .expect("test config is valid"),
            ticks: FixedTicks::new(start),
            events: Vec::new(),
        }
    }

    /// Run the loop for `duration_ms`, one tick every `step_ms`
    pub fn run_for(&mut self, duration_ms: u32, step_ms: u32) {
        let mut remaining = duration_ms;
        while remaining > 0 {
            let step = step_ms.min(remaining);
            self.ticks.advance(step);
            remaining -= step;
            self.step();
        }
    }

    /// One tick at the current counter value
    pub fn step(&mut self) {
        let now = self.ticks.now();
        for event in self.scheduler.poll(&self.ticks) {
            self.events.push((now, event));
        }
    }

    pub fn now(&self) -> Ticks {
        self.ticks.now()
    }

    pub fn count(&self, predicate: impl Fn(&SyncEvent) -> bool) -> usize {
        self.events.iter().filter(|(_, e)| predicate(e)).count()
    }

    pub fn first_tick_of(&self, predicate: impl Fn(&SyncEvent) -> bool) -> Option<Ticks> {
        self.events.iter().find(|(_, e)| predicate(e)).map(|(t, _)| *t)
    }

    pub fn clear_events(&mut self) {
        self.events.clear();
    }
}

/// Fix with valid date and time at `utc`
pub fn utc_fix(utc: Timestamp) -> Fix {
    Fix {
        valid: FixValidity {
            date: true,
            time: true,
            satellites: false,
        },
        date_time: utc,
        satellites: 0,
    }
}

/// Fix the receiver reports before it has a time solution
pub fn no_time_fix() -> Fix {
    Fix::default().with_satellites(2)
}
