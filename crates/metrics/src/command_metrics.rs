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

//! Rolling statistics for one command.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use cuirass_common::{
    Clock, RollingNumber, RollingPercentile, DEFAULT_WINDOW_BUCKETS, DEFAULT_WINDOW_SIZE,
};
use cuirass_request_log::ExecutionEvent;

use crate::{HealthCounts, MetricsProperties};

/// Event counters, latency reservoir, and health snapshot for one command.
pub struct CommandMetrics {
    name: String,
    group: String,
    clock: Arc<dyn Clock>,
    properties: MetricsProperties,
    event_counters: Mutex<HashMap<ExecutionEvent, RollingNumber>>,
    execution_time: RollingPercentile,
    health: Mutex<HealthCache>,
}

#[derive(Debug)]
struct HealthCache {
    counts: HealthCounts,
    /// None forces recomputation on the next read.
    taken_at_nanos: Option<i64>,
}

impl CommandMetrics {
    pub(crate) fn new(
        name: impl Into<String>,
        group: impl Into<String>,
        properties: MetricsProperties,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let bucket_capacity = properties.rolling_percentile_bucket_size.get().max(1) as usize;
        Self {
            name: name.into(),
            group: group.into(),
            execution_time: RollingPercentile::new(
                DEFAULT_WINDOW_SIZE,
                DEFAULT_WINDOW_BUCKETS,
                bucket_capacity,
                clock.clone(),
            ),
            clock,
            properties,
            event_counters: Mutex::new(HashMap::new()),
            health: Mutex::new(HealthCache {
                counts: HealthCounts::default(),
                taken_at_nanos: None,
            }),
        }
    }

    /// Name of the command these statistics belong to.
    pub fn command_name(&self) -> &str {
        &self.name
    }

    /// Group of the command these statistics belong to.
    pub fn command_group(&self) -> &str {
        &self.group
    }

    /// Record one execution outcome.
    ///
    /// An event list containing [`ExecutionEvent::ResponseFromCache`]
    /// increments only that counter: a cache hit performed no work, so it
    /// must not skew any other statistic. Otherwise every event increments
    /// its counter, and the duration feeds the latency reservoir unless the
    /// call was denied before doing work (short-circuited or
    /// semaphore-rejected).
    pub fn update(&self, execution_time: Duration, events: &[ExecutionEvent]) {
        if events.contains(&ExecutionEvent::ResponseFromCache) {
            self.counter_increment(ExecutionEvent::ResponseFromCache);
            return;
        }
        for event in events {
            self.counter_increment(*event);
        }
        if !events.contains(&ExecutionEvent::ShortCircuited)
            && !events.contains(&ExecutionEvent::SemaphoreRejected)
        {
            self.execution_time.add(execution_time);
        }
    }

    /// Rolling count of `event` within the statistical window.
    pub fn rolling_sum(&self, event: ExecutionEvent) -> u64 {
        let counters = self.event_counters.lock().unwrap_or_else(|e| e.into_inner());
        counters.get(&event).map(RollingNumber::sum).unwrap_or(0)
    }

    /// Requests observed in the window: every terminal outcome counts,
    /// whether it did work or was denied.
    pub fn total_requests(&self) -> u64 {
        self.rolling_sum(ExecutionEvent::Success)
            + self.rolling_sum(ExecutionEvent::Failure)
            + self.rolling_sum(ExecutionEvent::Timeout)
            + self.rolling_sum(ExecutionEvent::ShortCircuited)
            + self.rolling_sum(ExecutionEvent::SemaphoreRejected)
    }

    /// Requests in the window that did not succeed.
    pub fn error_count(&self) -> u64 {
        self.rolling_sum(ExecutionEvent::Failure)
            + self.rolling_sum(ExecutionEvent::Timeout)
            + self.rolling_sum(ExecutionEvent::ShortCircuited)
            + self.rolling_sum(ExecutionEvent::SemaphoreRejected)
    }

    /// Error share in whole percent, truncated; zero with no requests.
    pub fn error_percentage(&self) -> u32 {
        let total = self.total_requests();
        if total == 0 {
            return 0;
        }
        (self.error_count() * 100 / total) as u32
    }

    /// Mean execution time over the window.
    pub fn execution_time_mean(&self) -> Duration {
        self.execution_time.mean()
    }

    /// Execution-time percentile over the window.
    pub fn execution_time_percentile(&self, percentile: f64) -> Duration {
        self.execution_time.percentile(percentile)
    }

    /// The health snapshot the circuit breaker consults.
    ///
    /// Recomputed at most once per the configured snapshot interval; between
    /// refreshes every caller sees the same cached pair, so volume and error
    /// rate are always mutually consistent.
    pub fn health_counts(&self) -> HealthCounts {
        let now = self.clock.now_nanos();
        let interval = self.properties.health_snapshot_interval.get();

        let mut cache = self.health.lock().unwrap_or_else(|e| e.into_inner());
        let stale = match cache.taken_at_nanos {
            None => true,
            Some(taken_at) => now - taken_at >= interval.as_nanos() as i64,
        };
        if stale {
            cache.counts = HealthCounts {
                total_requests: self.total_requests(),
                error_percentage: self.error_percentage(),
            };
            cache.taken_at_nanos = Some(now);
        }
        cache.counts
    }

    /// Zero every event counter and drop the cached health snapshot.
    ///
    /// Called when the circuit breaker closes after a successful trial: the
    /// window restarts so stale failures cannot immediately re-trip it.
    pub fn reset_counters(&self) {
        {
            let counters = self.event_counters.lock().unwrap_or_else(|e| e.into_inner());
            for counter in counters.values() {
                counter.reset();
            }
        }
        let mut cache = self.health.lock().unwrap_or_else(|e| e.into_inner());
        cache.counts = HealthCounts::default();
        cache.taken_at_nanos = None;
    }

    fn counter_increment(&self, event: ExecutionEvent) {
        let mut counters = self.event_counters.lock().unwrap_or_else(|e| e.into_inner());
        counters
            .entry(event)
            .or_insert_with(|| {
                RollingNumber::new(DEFAULT_WINDOW_SIZE, DEFAULT_WINDOW_BUCKETS, self.clock.clone())
            })
            .increment();
    }
}

impl std::fmt::Debug for CommandMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandMetrics")
            .field("name", &self.name)
            .field("group", &self.group)
            .field("total_requests", &self.total_requests())
            .field("error_percentage", &self.error_percentage())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cuirass_common::ManualClock;
    use cuirass_config::{DynamicConfig, PropertyFactory};

    fn new_metrics(clock: Arc<ManualClock>) -> CommandMetrics {
        let factory = PropertyFactory::new(Arc::new(DynamicConfig::new()));
        CommandMetrics::new(
            "GetOrder",
            "Orders",
            MetricsProperties::new(&factory, "GetOrder"),
            clock,
        )
    }

    #[test]
    fn test_update_counts_each_event() {
        let clock = Arc::new(ManualClock::new(0));
        let metrics = new_metrics(clock);

        metrics.update(
            Duration::from_millis(3),
            &[ExecutionEvent::Failure, ExecutionEvent::FallbackSuccess],
        );

        assert_eq!(metrics.rolling_sum(ExecutionEvent::Failure), 1);
        assert_eq!(metrics.rolling_sum(ExecutionEvent::FallbackSuccess), 1);
        assert_eq!(metrics.rolling_sum(ExecutionEvent::Success), 0);
    }

    #[test]
    fn test_cache_hit_counts_only_response_from_cache() {
        let clock = Arc::new(ManualClock::new(0));
        let metrics = new_metrics(clock);

        metrics.update(
            Duration::from_millis(3),
            &[ExecutionEvent::Success, ExecutionEvent::ResponseFromCache],
        );

        assert_eq!(metrics.rolling_sum(ExecutionEvent::ResponseFromCache), 1);
        assert_eq!(metrics.rolling_sum(ExecutionEvent::Success), 0);
        assert_eq!(metrics.execution_time_percentile(100.0), Duration::ZERO);
        assert_eq!(metrics.total_requests(), 0);
    }

    #[test]
    fn test_denied_calls_record_no_latency() {
        let clock = Arc::new(ManualClock::new(0));
        let metrics = new_metrics(clock);

        metrics.update(Duration::from_millis(9), &[ExecutionEvent::ShortCircuited]);
        metrics.update(Duration::from_millis(9), &[ExecutionEvent::SemaphoreRejected]);
        metrics.update(Duration::from_millis(5), &[ExecutionEvent::Success]);

        assert_eq!(metrics.execution_time_percentile(100.0), Duration::from_millis(5));
        assert_eq!(metrics.execution_time_mean(), Duration::from_millis(5));
    }

    #[test]
    fn test_derived_totals_and_error_percentage() {
        let clock = Arc::new(ManualClock::new(0));
        let metrics = new_metrics(clock);

        metrics.update(Duration::from_millis(1), &[ExecutionEvent::Success]);
        metrics.update(Duration::from_millis(1), &[ExecutionEvent::Failure]);
        metrics.update(Duration::from_millis(1), &[ExecutionEvent::Timeout]);
        metrics.update(Duration::from_millis(1), &[ExecutionEvent::ShortCircuited]);

        assert_eq!(metrics.total_requests(), 4);
        assert_eq!(metrics.error_count(), 3);
        assert_eq!(metrics.error_percentage(), 75);
    }

    #[test]
    fn test_error_percentage_zero_without_requests() {
        let clock = Arc::new(ManualClock::new(0));
        let metrics = new_metrics(clock);
        assert_eq!(metrics.error_percentage(), 0);
    }

    #[test]
    fn test_health_snapshot_is_cached_for_interval() {
        let clock = Arc::new(ManualClock::new(0));
        let metrics = new_metrics(clock.clone());

        metrics.update(Duration::from_millis(1), &[ExecutionEvent::Failure]);
        let first = metrics.health_counts();
        assert_eq!(first.total_requests, 1);
        assert_eq!(first.error_percentage, 100);

        // More failures inside the snapshot interval are not yet visible.
        metrics.update(Duration::from_millis(1), &[ExecutionEvent::Failure]);
        assert_eq!(metrics.health_counts().total_requests, 1);

        clock.advance(Duration::from_millis(500));
        assert_eq!(metrics.health_counts().total_requests, 2);
    }

    #[test]
    fn test_reset_counters_clears_counts_and_snapshot() {
        let clock = Arc::new(ManualClock::new(0));
        let metrics = new_metrics(clock);

        metrics.update(Duration::from_millis(1), &[ExecutionEvent::Failure]);
        let _ = metrics.health_counts();

        metrics.reset_counters();
        assert_eq!(metrics.total_requests(), 0);
        // The stale snapshot is gone too; a fresh one sees the empty window.
        assert_eq!(metrics.health_counts(), HealthCounts::default());
    }
}
