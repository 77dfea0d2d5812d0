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

//! Metrics configuration handles.

use std::time::Duration;

use cuirass_config::{DurationProperty, IntProperty, PropertyFactory};

/// Default capacity of one percentile reservoir bucket.
pub(crate) const ROLLING_PERCENTILE_BUCKET_SIZE_DEFAULT: i64 = 100;

/// Default maximum age of a health snapshot.
pub(crate) const HEALTH_SNAPSHOT_INTERVAL_DEFAULT: Duration = Duration::from_millis(500);

/// Chained config handles for one command's metrics.
#[derive(Debug, Clone)]
pub struct MetricsProperties {
    /// Samples kept per percentile reservoir bucket
    /// (`metrics.rollingPercentile.bucketSize`, default 100).
    pub rolling_percentile_bucket_size: IntProperty,
    /// Maximum age of a cached health snapshot
    /// (`metrics.healthSnapshot.intervalInMilliseconds`, default 500 ms).
    pub health_snapshot_interval: DurationProperty,
}

impl MetricsProperties {
    /// Build the handles for `command`.
    pub fn new(factory: &PropertyFactory, command: &str) -> Self {
        Self {
            rolling_percentile_bucket_size: factory.int_property(
                command,
                "metrics.rollingPercentile.bucketSize",
                ROLLING_PERCENTILE_BUCKET_SIZE_DEFAULT,
            ),
            health_snapshot_interval: factory.duration_property(
                command,
                "metrics.healthSnapshot.intervalInMilliseconds",
                HEALTH_SNAPSHOT_INTERVAL_DEFAULT,
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
        let props = MetricsProperties::new(&factory, "GetOrder");

        assert_eq!(props.rolling_percentile_bucket_size.get(), 100);
        assert_eq!(
            props.health_snapshot_interval.get(),
            Duration::from_millis(500)
        );
    }

    #[test]
    fn test_per_command_override() {
        let config = DynamicConfig::new()
            .with_property("cuirass.default.metrics.rollingPercentile.bucketSize", "10")
            .with_property(
                "cuirass.GetOrder.metrics.healthSnapshot.intervalInMilliseconds",
                "50",
            );
        let factory = PropertyFactory::new(Arc::new(config));
        let props = MetricsProperties::new(&factory, "GetOrder");

        assert_eq!(props.rolling_percentile_bucket_size.get(), 10);
        assert_eq!(
            props.health_snapshot_interval.get(),
            Duration::from_millis(50)
        );
    }
}
