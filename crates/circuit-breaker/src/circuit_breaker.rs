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

//! Circuit breaker state machine.
//!
//! Core implementation of the circuit breaker pattern for failing fast when
//! a dependency is unhealthy.

use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Arc;

use cuirass_common::Clock;
use cuirass_metrics::CommandMetrics;

use crate::CircuitBreakerProperties;

/// Derived breaker state, for observability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    /// Requests flow normally.
    Closed,
    /// Requests are denied.
    Open,
    /// Open, but the sleep window has elapsed: the next caller to win the
    /// trial CAS probes the dependency.
    HalfOpen,
}

/// Per-command circuit breaker.
///
/// Stored state is two atomics: the open flag and the nanosecond timestamp
/// of the last trial. Health comes from the command's metrics, refreshed on
/// the snapshot interval; the breaker itself counts nothing.
pub struct CircuitBreaker {
    properties: CircuitBreakerProperties,
    metrics: Arc<CommandMetrics>,
    clock: Arc<dyn Clock>,
    circuit_open: AtomicBool,
    last_trial_nanos: AtomicI64,
}

impl CircuitBreaker {
    /// Create a closed breaker for the command `metrics` belongs to.
    pub fn new(
        properties: CircuitBreakerProperties,
        metrics: Arc<CommandMetrics>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            properties,
            metrics,
            clock,
            circuit_open: AtomicBool::new(false),
            last_trial_nanos: AtomicI64::new(0),
        }
    }

    /// The breaker's config handles.
    pub fn properties(&self) -> &CircuitBreakerProperties {
        &self.properties
    }

    /// Whether the circuit is open (or half-open).
    ///
    /// When the stored flag is false this also evaluates the trip guard:
    /// once the window holds at least `requestVolumeThreshold` requests and
    /// the error percentage exceeds `errorThresholdPercentage`, the flag is
    /// CASed open and the sleep window starts.
    pub fn is_open(&self) -> bool {
        if self.circuit_open.load(Ordering::SeqCst) {
            return true;
        }
        let health = self.metrics.health_counts();
        if health.total_requests < self.properties.request_volume_threshold.get().max(0) as u64 {
            return false;
        }
        if i64::from(health.error_percentage) > self.properties.error_threshold_percentage.get() {
            if self
                .circuit_open
                .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
                .is_ok()
            {
                self.last_trial_nanos
                    .store(self.clock.now_nanos(), Ordering::SeqCst);
                tracing::warn!(
                    command = self.metrics.command_name(),
                    error_percentage = health.error_percentage,
                    total_requests = health.total_requests,
                    "circuit breaker opened"
                );
            }
            // Lost the race: another caller opened it; either way it is open.
            true
        } else {
            false
        }
    }

    /// Whether a request may proceed, and whether it is the trial call.
    ///
    /// The contract, in order:
    /// - `forceClosed`: always allowed; trial bookkeeping still runs so the
    ///   half-open machinery stays consistent while forced
    /// - `forceOpen`: always denied
    /// - breaker disabled: always allowed, never a trial
    /// - open with the sleep window elapsed: exactly one caller wins the
    ///   CAS on the last-trial timestamp and becomes the trial; everyone
    ///   else is denied
    /// - otherwise: allowed iff closed
    pub fn is_request_allowed(&self) -> (bool, bool) {
        if self.properties.force_closed.get() {
            return (true, self.try_acquire_trial());
        }
        if self.properties.force_open.get() {
            return (false, false);
        }
        if !self.properties.enabled.get() {
            return (true, false);
        }
        if self.is_open() {
            let trial = self.try_acquire_trial();
            (trial, trial)
        } else {
            (true, false)
        }
    }

    /// The trial call succeeded: zero the command's counters and close.
    pub fn mark_trial_success(&self) {
        self.metrics.reset_counters();
        if self
            .circuit_open
            .compare_exchange(true, false, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            tracing::info!(
                command = self.metrics.command_name(),
                "circuit breaker closed after successful trial"
            );
        }
    }

    /// Manually open the circuit (maintenance or tests).
    pub fn trip(&self) {
        if self
            .circuit_open
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            self.last_trial_nanos
                .store(self.clock.now_nanos(), Ordering::SeqCst);
        }
    }

    /// Manually close the circuit and reset the command's counters.
    pub fn reset(&self) {
        self.metrics.reset_counters();
        self.circuit_open.store(false, Ordering::SeqCst);
    }

    /// Derived state for dashboards and logs.
    pub fn state(&self) -> CircuitState {
        if !self.circuit_open.load(Ordering::SeqCst) {
            return CircuitState::Closed;
        }
        let elapsed = self.clock.now_nanos() - self.last_trial_nanos.load(Ordering::SeqCst);
        if elapsed >= self.properties.sleep_window.get().as_nanos() as i64 {
            CircuitState::HalfOpen
        } else {
            CircuitState::Open
        }
    }

    /// Win the right to probe: CAS the last-trial timestamp forward.
    ///
    /// Contenders that read a stale timestamp lose the CAS and are denied;
    /// that is the whole mutual-exclusion story for trials.
    fn try_acquire_trial(&self) -> bool {
        if !self.circuit_open.load(Ordering::SeqCst) {
            return false;
        }
        let last_trial = self.last_trial_nanos.load(Ordering::SeqCst);
        let now = self.clock.now_nanos();
        if now - last_trial < self.properties.sleep_window.get().as_nanos() as i64 {
            return false;
        }
        self.last_trial_nanos
            .compare_exchange(last_trial, now, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }
}

impl std::fmt::Debug for CircuitBreaker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CircuitBreaker")
            .field("command", &self.metrics.command_name())
            .field("state", &self.state())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use cuirass_common::ManualClock;
    use cuirass_config::{DynamicConfig, PropertyFactory};
    use cuirass_metrics::ExecutionMetrics;
    use cuirass_request_log::ExecutionEvent;

    struct Fixture {
        clock: Arc<ManualClock>,
        config: Arc<DynamicConfig>,
        metrics: Arc<CommandMetrics>,
        breaker: CircuitBreaker,
    }

    fn fixture(entries: &[(&str, &str)]) -> Fixture {
        let mut config = DynamicConfig::new()
            // Fast windows so tests drive time in small steps.
            .with_property("cuirass.default.circuitbreaker.sleepWindowInMilliseconds", "500")
            .with_property(
                "cuirass.default.metrics.healthSnapshot.intervalInMilliseconds",
                "500",
            );
        for (key, value) in entries {
            config = config.with_property(*key, *value);
        }
        let config = Arc::new(config);
        let factory = PropertyFactory::new(config.clone());
        let clock = Arc::new(ManualClock::new(0));
        let registry = ExecutionMetrics::new(factory.clone(), clock.clone());
        let metrics = registry.for_command("GetOrder", "Orders");
        let breaker = CircuitBreaker::new(
            CircuitBreakerProperties::new(&factory, "GetOrder"),
            metrics.clone(),
            clock.clone(),
        );
        Fixture {
            clock,
            config,
            metrics,
            breaker,
        }
    }

    fn record_failures(fixture: &Fixture, count: usize) {
        for _ in 0..count {
            fixture
                .metrics
                .update(Duration::from_millis(1), &[ExecutionEvent::Failure]);
        }
    }

    #[test]
    fn test_closed_by_default() {
        let f = fixture(&[]);
        assert_eq!(f.breaker.state(), CircuitState::Closed);
        assert_eq!(f.breaker.is_request_allowed(), (true, false));
    }

    #[test]
    fn test_stays_closed_below_volume_threshold() {
        let f = fixture(&[]);
        record_failures(&f, 19);
        f.clock.advance(Duration::from_millis(501));

        assert!(!f.breaker.is_open());
        assert_eq!(f.breaker.is_request_allowed(), (true, false));
    }

    #[test]
    fn test_trips_at_volume_and_error_threshold() {
        let f = fixture(&[]);
        record_failures(&f, 20);
        f.clock.advance(Duration::from_millis(501));

        assert!(f.breaker.is_open());
        assert_eq!(f.breaker.is_request_allowed(), (false, false));
        assert_eq!(f.breaker.state(), CircuitState::Open);
    }

    #[test]
    fn test_stays_closed_below_error_threshold() {
        let f = fixture(&[]);
        // 50% errors does not exceed a 50% threshold.
        for _ in 0..15 {
            f.metrics
                .update(Duration::from_millis(1), &[ExecutionEvent::Failure]);
            f.metrics
                .update(Duration::from_millis(1), &[ExecutionEvent::Success]);
        }
        f.clock.advance(Duration::from_millis(501));

        assert!(!f.breaker.is_open());
    }

    #[test]
    fn test_single_trial_after_sleep_window() {
        let f = fixture(&[]);
        record_failures(&f, 20);
        f.clock.advance(Duration::from_millis(501));
        assert!(f.breaker.is_open());

        f.clock.advance(Duration::from_millis(501));
        assert_eq!(f.breaker.state(), CircuitState::HalfOpen);

        // First contender wins the trial, the rest are denied.
        assert_eq!(f.breaker.is_request_allowed(), (true, true));
        assert_eq!(f.breaker.is_request_allowed(), (false, false));
        assert_eq!(f.breaker.is_request_allowed(), (false, false));
    }

    #[test]
    fn test_trial_success_closes_and_resets() {
        let f = fixture(&[]);
        record_failures(&f, 20);
        f.clock.advance(Duration::from_millis(501));
        assert!(f.breaker.is_open());

        f.clock.advance(Duration::from_millis(501));
        assert_eq!(f.breaker.is_request_allowed(), (true, true));

        f.breaker.mark_trial_success();
        assert_eq!(f.breaker.state(), CircuitState::Closed);
        assert_eq!(f.metrics.total_requests(), 0);
        assert_eq!(f.breaker.is_request_allowed(), (true, false));
    }

    #[test]
    fn test_failed_trial_keeps_circuit_open_for_another_window() {
        let f = fixture(&[]);
        record_failures(&f, 20);
        f.clock.advance(Duration::from_millis(501));
        assert!(f.breaker.is_open());

        f.clock.advance(Duration::from_millis(501));
        assert_eq!(f.breaker.is_request_allowed(), (true, true));
        // Trial failed: nothing is marked, the stamp from winning the CAS
        // already restarted the sleep window.
        assert_eq!(f.breaker.is_request_allowed(), (false, false));

        f.clock.advance(Duration::from_millis(501));
        assert_eq!(f.breaker.is_request_allowed(), (true, true));
    }

    #[test]
    fn test_force_open_denies_everything() {
        let f = fixture(&[("cuirass.GetOrder.circuitbreaker.forceOpen", "true")]);
        assert_eq!(f.breaker.is_request_allowed(), (false, false));
    }

    #[test]
    fn test_force_closed_allows_despite_unhealthy_window() {
        let f = fixture(&[("cuirass.GetOrder.circuitbreaker.forceClosed", "true")]);
        record_failures(&f, 20);
        f.clock.advance(Duration::from_millis(501));

        let (allowed, _) = f.breaker.is_request_allowed();
        assert!(allowed);
    }

    #[test]
    fn test_disabled_breaker_always_allows() {
        let f = fixture(&[("cuirass.GetOrder.circuitbreaker.enabled", "false")]);
        record_failures(&f, 20);
        f.clock.advance(Duration::from_millis(501));

        assert_eq!(f.breaker.is_request_allowed(), (true, false));
    }

    #[test]
    fn test_manual_trip_and_reset() {
        let f = fixture(&[]);
        f.breaker.trip();
        assert_eq!(f.breaker.is_request_allowed(), (false, false));

        f.breaker.reset();
        assert_eq!(f.breaker.state(), CircuitState::Closed);
        assert_eq!(f.breaker.is_request_allowed(), (true, false));
    }

    #[test]
    fn test_config_change_takes_effect_between_calls() {
        let f = fixture(&[]);
        record_failures(&f, 10);
        f.clock.advance(Duration::from_millis(501));
        assert!(!f.breaker.is_open());

        // Lower the volume threshold at runtime; past the next snapshot
        // refresh the same window trips.
        f.config
            .set_property("cuirass.GetOrder.circuitbreaker.requestVolumeThreshold", "10");
        f.clock.advance(Duration::from_millis(501));
        assert!(f.breaker.is_open());
    }
}
