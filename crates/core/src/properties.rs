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

//! Per-command execution properties.

use std::time::Duration;

use cuirass_circuit_breaker::CircuitBreakerProperties;
use cuirass_config::{BoolProperty, DurationProperty, IntProperty, PropertyFactory};
use cuirass_metrics::MetricsProperties;

const EXECUTION_TIMEOUT_DEFAULT: Duration = Duration::ZERO;
const MAX_CONCURRENT_REQUESTS_DEFAULT: i64 = 100;
const FALLBACK_ENABLED_DEFAULT: bool = true;
const REQUEST_CACHE_ENABLED_DEFAULT: bool = true;
const REQUEST_LOG_ENABLED_DEFAULT: bool = true;

/// The full set of config handles governing one command's execution.
///
/// Constructed lazily by the executor on a command's first call and cached
/// by name; every handle re-resolves on read, so the cache never holds a
/// stale value.
#[derive(Debug, Clone)]
pub struct CommandProperties {
    /// Circuit breaker thresholds and forced modes.
    pub circuit_breaker: CircuitBreakerProperties,
    /// Metrics reservoir size and health snapshot interval.
    pub metrics: MetricsProperties,
    /// Deadline for the primary action
    /// (`execution.isolation.thread.timeoutInMilliseconds`, default 0 =
    /// disabled).
    pub execution_timeout: DurationProperty,
    /// Concurrency gate capacity for the command's group
    /// (`execution.isolation.semaphore.maxConcurrentRequests`, default 100).
    pub max_concurrent_requests: IntProperty,
    /// Whether the fallback runs on failure (`fallback.enabled`, default
    /// true).
    pub fallback_enabled: BoolProperty,
    /// Whether cacheable responses are served from the request cache
    /// (`requestCache.enabled`, default true).
    pub request_cache_enabled: BoolProperty,
    /// Whether executions are recorded in the request log
    /// (`requestLog.enabled`, default true).
    pub request_log_enabled: BoolProperty,
}

impl CommandProperties {
    /// Build the handles for `command`.
    pub fn new(factory: &PropertyFactory, command: &str) -> Self {
        Self {
            circuit_breaker: CircuitBreakerProperties::new(factory, command),
            metrics: MetricsProperties::new(factory, command),
            execution_timeout: factory.duration_property(
                command,
                "execution.isolation.thread.timeoutInMilliseconds",
                EXECUTION_TIMEOUT_DEFAULT,
            ),
            max_concurrent_requests: factory.int_property(
                command,
                "execution.isolation.semaphore.maxConcurrentRequests",
                MAX_CONCURRENT_REQUESTS_DEFAULT,
            ),
            fallback_enabled: factory.bool_property(
                command,
                "fallback.enabled",
                FALLBACK_ENABLED_DEFAULT,
            ),
            request_cache_enabled: factory.bool_property(
                command,
                "requestCache.enabled",
                REQUEST_CACHE_ENABLED_DEFAULT,
            ),
            request_log_enabled: factory.bool_property(
                command,
                "requestLog.enabled",
                REQUEST_LOG_ENABLED_DEFAULT,
            ),
        }
    }
}
