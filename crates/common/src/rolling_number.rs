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

//! Bucketed sliding-window counter.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::Clock;

/// Default statistical window covered by a rolling counter.
pub const DEFAULT_WINDOW_SIZE: Duration = Duration::from_millis(10_000);

/// Default number of buckets the window is divided into.
pub const DEFAULT_WINDOW_BUCKETS: usize = 10;

/// Integer counter over a sliding time window.
///
/// The window is divided into `bucket_count` buckets; increments land in the
/// bucket covering the current instant and expire once the window moves past
/// them. [`RollingNumber::sum`] reports the total across all live buckets.
///
/// All operations are serialised by one internal mutex: readers rotate stale
/// buckets too, so `sum` takes the same lock as `increment`.
#[derive(Debug)]
pub struct RollingNumber {
    clock: Arc<dyn Clock>,
    state: Mutex<WindowState>,
}

#[derive(Debug)]
struct WindowState {
    bucket_nanos: i64,
    current: usize,
    current_start: i64,
    buckets: Vec<u64>,
}

/// Bucket duration, clamped so pathological window/bucket ratios cannot
/// produce sub-millisecond (or zero) buckets.
fn bucket_duration(window_size: Duration, bucket_count: usize) -> Duration {
    let raw = window_size / bucket_count.max(1) as u32;
    raw.max(Duration::from_millis(1))
}

impl WindowState {
    /// Rotate stale buckets forward to `now` and return the current index.
    ///
    /// With `k` whole bucket durations elapsed, the `min(k, n)` buckets
    /// following the current one are zeroed and the index advances by
    /// `k mod n`, so an arbitrarily long idle gap collapses to one full pass
    /// over the ring.
    fn rotate(&mut self, now: i64) -> usize {
        let elapsed = now - self.current_start;
        if elapsed < self.bucket_nanos {
            return self.current;
        }
        let n = self.buckets.len();
        let k = (elapsed / self.bucket_nanos) as usize;
        for i in 1..=k.min(n) {
            self.buckets[(self.current + i) % n] = 0;
        }
        self.current = (self.current + k % n) % n;
        self.current_start = now;
        self.current
    }
}

impl RollingNumber {
    /// Create a counter covering `window_size` split into `bucket_count`
    /// buckets, starting empty at the clock's current time.
    pub fn new(window_size: Duration, bucket_count: usize, clock: Arc<dyn Clock>) -> Self {
        let now = clock.now_nanos();
        Self {
            clock,
            state: Mutex::new(WindowState {
                bucket_nanos: bucket_duration(window_size, bucket_count).as_nanos() as i64,
                current: 0,
                current_start: now,
                buckets: vec![0; bucket_count.max(1)],
            }),
        }
    }

    /// The duration covered by one bucket.
    pub fn bucket_duration(&self) -> Duration {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        Duration::from_nanos(state.bucket_nanos as u64)
    }

    /// Add one to the bucket covering the current instant.
    pub fn increment(&self) {
        let now = self.clock.now_nanos();
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        let current = state.rotate(now);
        state.buckets[current] += 1;
    }

    /// Total across all buckets still inside the window.
    pub fn sum(&self) -> u64 {
        let now = self.clock.now_nanos();
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.rotate(now);
        state.buckets.iter().sum()
    }

    /// Zero every bucket and restart the window at the current instant.
    pub fn reset(&self) {
        let now = self.clock.now_nanos();
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.current = 0;
        state.current_start = now;
        for bucket in state.buckets.iter_mut() {
            *bucket = 0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ManualClock;

    fn new_number(clock: Arc<ManualClock>) -> RollingNumber {
        RollingNumber::new(Duration::from_millis(1_000), 10, clock)
    }

    #[test]
    fn test_increment_and_sum() {
        let clock = Arc::new(ManualClock::new(0));
        let number = new_number(clock.clone());

        number.increment();
        number.increment();
        number.increment();
        assert_eq!(number.sum(), 3);
    }

    #[test]
    fn test_bucket_duration_is_window_over_buckets() {
        let clock = Arc::new(ManualClock::new(0));
        let number = new_number(clock);
        assert_eq!(number.bucket_duration(), Duration::from_millis(100));
    }

    #[test]
    fn test_bucket_duration_clamped_to_one_millisecond() {
        let clock = Arc::new(ManualClock::new(0));
        let number = RollingNumber::new(Duration::from_micros(10), 100, clock);
        assert_eq!(number.bucket_duration(), Duration::from_millis(1));
    }

    #[test]
    fn test_counts_spread_across_buckets_stay_in_window() {
        let clock = Arc::new(ManualClock::new(0));
        let number = new_number(clock.clone());

        number.increment();
        clock.advance(Duration::from_millis(100));
        number.increment();
        clock.advance(Duration::from_millis(100));
        number.increment();

        assert_eq!(number.sum(), 3);
    }

    #[test]
    fn test_counts_expire_after_window() {
        let clock = Arc::new(ManualClock::new(0));
        let number = new_number(clock.clone());

        number.increment();
        number.increment();
        assert_eq!(number.sum(), 2);

        clock.advance(Duration::from_millis(1_000));
        assert_eq!(number.sum(), 0);
    }

    #[test]
    fn test_old_buckets_expire_incrementally() {
        let clock = Arc::new(ManualClock::new(0));
        let number = new_number(clock.clone());

        number.increment();
        clock.advance(Duration::from_millis(500));
        number.increment();

        // First increment is 500ms old, second is fresh.
        clock.advance(Duration::from_millis(600));
        assert_eq!(number.sum(), 1);

        clock.advance(Duration::from_millis(500));
        assert_eq!(number.sum(), 0);
    }

    #[test]
    fn test_long_idle_gap_collapses_to_empty_window() {
        let clock = Arc::new(ManualClock::new(0));
        let number = new_number(clock.clone());

        for _ in 0..50 {
            number.increment();
        }
        // Many multiples of the whole window elapse while idle.
        clock.advance(Duration::from_secs(3_600));
        assert_eq!(number.sum(), 0);

        number.increment();
        assert_eq!(number.sum(), 1);
    }

    #[test]
    fn test_reset_zeros_all_buckets() {
        let clock = Arc::new(ManualClock::new(0));
        let number = new_number(clock.clone());

        number.increment();
        clock.advance(Duration::from_millis(300));
        number.increment();

        number.reset();
        assert_eq!(number.sum(), 0);
    }
}
