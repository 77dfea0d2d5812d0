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

//! Circuit breaker configuration handles.

use std::time::Duration;

use cuirass_config::{BoolProperty, DurationProperty, IntProperty, PropertyFactory};

const ENABLED_DEFAULT: bool = true;
const REQUEST_VOLUME_THRESHOLD_DEFAULT: i64 = 20;
const SLEEP_WINDOW_DEFAULT: Duration = Duration::from_millis(5_000);
const ERROR_THRESHOLD_PERCENTAGE_DEFAULT: i64 = 50;
const FORCE_OPEN_DEFAULT: bool = false;
const FORCE_CLOSED_DEFAULT: bool = false;

/// Chained config handles for one command's circuit breaker.
///
/// Handles resolve on every read, so operators can flip `forceOpen` or
/// adjust thresholds at runtime and the very next call observes it.
#[derive(Debug, Clone)]
pub struct CircuitBreakerProperties {
    /// Whether breaker allowance logic applies at all
    /// (`circuitbreaker.enabled`, default true).
    pub enabled: BoolProperty,
    /// Deny every request regardless of health
    /// (`circuitbreaker.forceOpen`, default false).
    pub force_open: BoolProperty,
    /// Allow every request regardless of health; trial bookkeeping still
    /// runs (`circuitbreaker.forceClosed`, default false).
    pub force_closed: BoolProperty,
    /// Requests that must be seen in the window before the error rate can
    /// trip the breaker (`circuitbreaker.requestVolumeThreshold`, default
    /// 20).
    pub request_volume_threshold: IntProperty,
    /// Error percentage above which the breaker trips
    /// (`circuitbreaker.errorThresholdPercentage`, default 50).
    pub error_threshold_percentage: IntProperty,
    /// Minimum time between trial calls while open
    /// (`circuitbreaker.sleepWindowInMilliseconds`, default 5000 ms).
    pub sleep_window: DurationProperty,
}

impl CircuitBreakerProperties {
    /// Build the handles for `command`.
    pub fn new(factory: &PropertyFactory, command: &str) -> Self {
        Self {
            enabled: factory.bool_property(command, "circuitbreaker.enabled", ENABLED_DEFAULT),
            force_open: factory.bool_property(
                command,
                "circuitbreaker.forceOpen",
                FORCE_OPEN_DEFAULT,
            ),
            force_closed: factory.bool_property(
                command,
                "circuitbreaker.forceClosed",
                FORCE_CLOSED_DEFAULT,
            ),
            request_volume_threshold: factory.int_property(
                command,
                "circuitbreaker.requestVolumeThreshold",
                REQUEST_VOLUME_THRESHOLD_DEFAULT,
            ),
            error_threshold_percentage: factory.int_property(
                command,
                "circuitbreaker.errorThresholdPercentage",
                ERROR_THRESHOLD_PERCENTAGE_DEFAULT,
            ),
            sleep_window: factory.duration_property(
                command,
                "circuitbreaker.sleepWindowInMilliseconds",
                SLEEP_WINDOW_DEFAULT,
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use cuirass_config::DynamicConfig;

    #[test]
    fn test_defaults() {
        let factory = PropertyFactory::new(Arc::new(DynamicConfig::new()));
        let props = CircuitBreakerProperties::new(&factory, "GetOrder");

        assert!(props.enabled.get());
        assert!(!props.force_open.get());
        assert!(!props.force_closed.get());
        assert_eq!(props.request_volume_threshold.get(), 20);
        assert_eq!(props.error_threshold_percentage.get(), 50);
        assert_eq!(props.sleep_window.get(), Duration::from_millis(5_000));
    }

    #[test]
    fn test_command_override_beats_default_tier() {
        let config = DynamicConfig::new()
            .with_property("cuirass.default.circuitbreaker.errorThresholdPercentage", "60")
            .with_property("cuirass.GetOrder.circuitbreaker.errorThresholdPercentage", "10");
        let factory = PropertyFactory::new(Arc::new(config));

        let order = CircuitBreakerProperties::new(&factory, "GetOrder");
        let user = CircuitBreakerProperties::new(&factory, "GetUser");
        assert_eq!(order.error_threshold_percentage.get(), 10);
        assert_eq!(user.error_threshold_percentage.get(), 60);
    }
}
