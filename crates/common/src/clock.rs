// SPDX-License-Identifier: LGPL-2.1-or-later
// Copyright (C) 2025 Shahzad A. Bhatti <bhatti@plexobject.com>
//
// This file is part of Cuirass.
//
// Cuirass is free software: you can redistribute it and/or modify
// it under the terms of the GNU Lesser General Public License as published by
// the Free Software Foundation, either version 2.1 of the License, or
// (at your option) any later version.
//
// Cuirass is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Lesser General Public License for more details.
//
// You should have received a copy of the GNU Lesser General Public License
// along with Cuirass. If not, see <https://www.gnu.org/licenses/>.

//! Injectable monotonic time source.
//!
//! ## Purpose
//! Every time comparison in the runtime (window rotation, sleep windows,
//! health snapshot intervals) goes through [`Clock`] so tests can drive time
//! explicitly with [`ManualClock`] instead of sleeping.

use std::fmt;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::{Duration, Instant};

/// Monotonic time source measured in nanoseconds.
///
/// Implementations must be monotonic within one process; the absolute origin
/// is unspecified and only differences are meaningful.
pub trait Clock: fmt::Debug + Send + Sync {
    /// Current monotonic time in nanoseconds.
    fn now_nanos(&self) -> i64;
}

/// Production clock backed by a process-local [`Instant`] origin.
#[derive(Debug)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    /// Create a clock with its origin at the moment of construction.
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_nanos(&self) -> i64 {
        // Saturates after ~292 years of process uptime.
        self.origin.elapsed().as_nanos().min(i64::MAX as u128) as i64
    }
}

/// Advanceable clock for tests.
///
/// ## Examples
/// ```rust
/// use std::time::Duration;
/// use cuirass_common::{Clock, ManualClock};
///
/// let clock = ManualClock::new(0);
/// clock.advance(Duration::from_millis(500));
/// assert_eq!(clock.now_nanos(), 500_000_000);
/// ```
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicI64,
}

impl ManualClock {
    /// Create a clock pinned at `start_nanos`.
    pub fn new(start_nanos: i64) -> Self {
        Self {
            now: AtomicI64::new(start_nanos),
        }
    }

    /// Pin the clock to an absolute nanosecond value.
    pub fn set(&self, nanos: i64) {
        self.now.store(nanos, Ordering::SeqCst);
    }

    /// Move the clock forward by `duration`.
    pub fn advance(&self, duration: Duration) {
        self.now
            .fetch_add(duration.as_nanos().min(i64::MAX as u128) as i64, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_nanos(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}
