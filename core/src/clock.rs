//! World time sources.
//!
//! The core never reads the wall clock itself; drivers hand `now` in.
//! Both sources here are monotonic and stay within the uint40 range.

use crate::{
    error::{StateError, StateResult},
    types::{Timestamp, MAX_TIMESTAMP},
};
use std::sync::atomic::{AtomicU64, Ordering};

pub trait TimeSource: Send + Sync {
    fn now(&self) -> Timestamp;
}

/// Unix seconds from the system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl TimeSource for SystemClock {
    fn now(&self) -> Timestamp {
        let secs = chrono::Utc::now().timestamp().max(0) as u64;
        secs.min(MAX_TIMESTAMP)
    }
}

/// Hand-driven clock for tests and scripted runs.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicU64,
}

impl ManualClock {
    pub fn new(start: Timestamp) -> Self {
        Self { now: AtomicU64::new(start.min(MAX_TIMESTAMP)) }
    }

    /// Move forward by `secs`. Returns the new time.
    pub fn advance(&self, secs: Timestamp) -> StateResult<Timestamp> {
        let next = self
            .now()
            .checked_add(secs)
            .filter(|t| *t <= MAX_TIMESTAMP)
            .ok_or(StateError::Overflow { field: "clock" })?;
        self.now.store(next, Ordering::SeqCst);
        Ok(next)
    }

    /// Jump to `to`. Going backwards is a `ClockRegression`.
    pub fn set(&self, to: Timestamp) -> StateResult<()> {
        let current = self.now();
        if to < current {
            return Err(StateError::ClockRegression { now: to, last_updated: current });
        }
        if to > MAX_TIMESTAMP {
            return Err(StateError::Overflow { field: "clock" });
        }
        self.now.store(to, Ordering::SeqCst);
        Ok(())
    }
}

impl TimeSource for ManualClock {
    fn now(&self) -> Timestamp {
        self.now.load(Ordering::SeqCst)
    }
}
