//! Per-question countdown driven by external ticks.
//!
//! The timer never sleeps. An outside scheduler calls `tick()` once per
//! second; reaching zero only raises the `expired()` flag and the session
//! decides what that means for the active question.

use std::fmt;

use serde::Serialize;

/// Remaining seconds below which a running timer is considered low.
pub const LOW_TIME_SECS: u32 = 30;

/// Countdown for the active question.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Timer {
    limit: Option<u32>,
    remaining: u32,
    running: bool,
}

impl Timer {
    /// An idle timer with no limit.
    pub fn new() -> Self {
        Self::default()
    }

    /// (Re)initialize to `limit_secs` and start counting.
    ///
    /// A missing or zero limit means the question has no time pressure and
    /// the call is a no-op.
    pub fn start(&mut self, limit_secs: Option<u32>) {
        let Some(limit) = limit_secs.filter(|&l| l > 0) else {
            return;
        };
        self.limit = Some(limit);
        self.remaining = limit;
        self.running = true;
    }

    /// Decrement by one second, never below zero. Ignored while stopped.
    ///
    /// Returns `true` only on the tick that reaches zero.
    pub fn tick(&mut self) -> bool {
        if !self.running || self.remaining == 0 {
            return false;
        }
        self.remaining -= 1;
        self.remaining == 0
    }

    /// True once a timer started with a positive limit has counted down to 0.
    pub fn expired(&self) -> bool {
        self.limit.is_some() && self.remaining == 0
    }

    /// Freeze the remaining time.
    pub fn stop(&mut self) {
        self.running = false;
    }

    /// Back to idle: no limit, nothing remaining, not running.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn limit(&self) -> Option<u32> {
        self.limit
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Running with fewer than `LOW_TIME_SECS` seconds left.
    pub fn is_low(&self) -> bool {
        self.running && self.limit.is_some() && self.remaining < LOW_TIME_SECS
    }
}

impl fmt::Display for Timer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{:02}", self.remaining / 60, self.remaining % 60)
    }
}
