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

//! Bucketed sliding-window latency reservoir.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::Clock;

/// Sliding-window reservoir of duration samples with percentile queries.
///
/// The window shares the bucket topology of
/// [`RollingNumber`](crate::RollingNumber). Each bucket keeps at most
/// `bucket_capacity` samples; once full, new samples overwrite the oldest via
/// a per-bucket write cursor. Queries concatenate all live samples, sort, and
/// interpolate linearly between the two nearest ranks.
#[derive(Debug)]
pub struct RollingPercentile {
    clock: Arc<dyn Clock>,
    state: Mutex<PercentileState>,
}

#[derive(Debug)]
struct PercentileState {
    bucket_nanos: i64,
    current: usize,
    current_start: i64,
    buckets: Vec<SampleBucket>,
}

#[derive(Debug)]
struct SampleBucket {
    capacity: usize,
    cursor: usize,
    values: Vec<i64>,
}

impl SampleBucket {
    fn new(capacity: usize) -> Self {
        Self {
            capacity,
            cursor: 0,
            values: Vec::new(),
        }
    }

    fn add(&mut self, value: i64) {
        if self.values.len() < self.capacity {
            self.values.push(value);
        } else {
            self.values[self.cursor] = value;
        }
        self.cursor = (self.cursor + 1) % self.capacity;
    }

    fn reset(&mut self) {
        self.values.clear();
        self.cursor = 0;
    }
}

impl PercentileState {
    fn rotate(&mut self, now: i64) -> usize {
        let elapsed = now - self.current_start;
        if elapsed < self.bucket_nanos {
            return self.current;
        }
        let n = self.buckets.len();
        let k = (elapsed / self.bucket_nanos) as usize;
        for i in 1..=k.min(n) {
            self.buckets[(self.current + i) % n].reset();
        }
        self.current = (self.current + k % n) % n;
        self.current_start = now;
        self.current
    }

    fn live_samples(&self) -> Vec<i64> {
        let mut samples: Vec<i64> = Vec::new();
        for bucket in &self.buckets {
            samples.extend_from_slice(&bucket.values);
        }
        samples
    }
}

impl RollingPercentile {
    /// Create a reservoir covering `window_size` split into `bucket_count`
    /// buckets of at most `bucket_capacity` samples each.
    pub fn new(
        window_size: Duration,
        bucket_count: usize,
        bucket_capacity: usize,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let bucket_nanos = (window_size / bucket_count.max(1) as u32)
            .max(Duration::from_millis(1))
            .as_nanos() as i64;
        let now = clock.now_nanos();
        Self {
            clock,
            state: Mutex::new(PercentileState {
                bucket_nanos,
                current: 0,
                current_start: now,
                buckets: (0..bucket_count.max(1))
                    .map(|_| SampleBucket::new(bucket_capacity.max(1)))
                    .collect(),
            }),
        }
    }

    /// Record one duration sample in the bucket covering the current instant.
    pub fn add(&self, sample: Duration) {
        let now = self.clock.now_nanos();
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        let current = state.rotate(now);
        let nanos = sample.as_nanos().min(i64::MAX as u128) as i64;
        state.buckets[current].add(nanos);
    }

    /// The `percentile`-th percentile of all live samples.
    ///
    /// `percentile <= 0` returns the minimum, `>= 100` the maximum; other
    /// ranks interpolate linearly (integer-truncated) between the two nearest
    /// samples. An empty window yields [`Duration::ZERO`].
    pub fn percentile(&self, percentile: f64) -> Duration {
        let samples = self.sorted_samples();
        Duration::from_nanos(interpolated_rank(percentile, &samples).max(0) as u64)
    }

    /// Arithmetic mean of all live samples, integer-truncated; zero when the
    /// window is empty.
    pub fn mean(&self) -> Duration {
        let samples = self.sorted_samples();
        if samples.is_empty() {
            return Duration::ZERO;
        }
        let sum: i64 = samples.iter().sum();
        Duration::from_nanos((sum / samples.len() as i64).max(0) as u64)
    }

    /// Drop every sample and restart the window at the current instant.
    pub fn reset(&self) {
        let now = self.clock.now_nanos();
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.current = 0;
        state.current_start = now;
        for bucket in state.buckets.iter_mut() {
            bucket.reset();
        }
    }

    fn sorted_samples(&self) -> Vec<i64> {
        let now = self.clock.now_nanos();
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.rotate(now);
        let mut samples = state.live_samples();
        drop(state);
        samples.sort_unstable();
        samples
    }
}

/// Linear interpolation between the two ranks bracketing `percentile`.
fn interpolated_rank(percentile: f64, sorted: &[i64]) -> i64 {
    if sorted.is_empty() {
        return 0;
    }
    if percentile <= 0.0 {
        return sorted[0];
    }
    if percentile >= 100.0 {
        return sorted[sorted.len() - 1];
    }
    let rank = percentile / 100.0 * sorted.len() as f64;
    let low = rank.floor() as usize;
    let high = rank.ceil() as usize;
    if high >= sorted.len() {
        sorted[sorted.len() - 1]
    } else if low == high {
        sorted[low]
    } else {
        sorted[low] + ((rank - low as f64) * (sorted[high] - sorted[low]) as f64) as i64
    }
}
