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

//! Registry of per-command metrics.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use cuirass_common::Clock;
use cuirass_config::PropertyFactory;
use cuirass_request_log::ExecutionEvent;

use crate::{CommandMetrics, MetricsProperties};

/// Maps command name to its [`CommandMetrics`], creating entries on first
/// use.
///
/// Reads dominate once a command has executed at least once, so the map sits
/// behind a reader-writer lock and hands out `Arc`s.
#[derive(Debug)]
pub struct ExecutionMetrics {
    clock: Arc<dyn Clock>,
    property_factory: PropertyFactory,
    commands: RwLock<HashMap<String, Arc<CommandMetrics>>>,
}

impl ExecutionMetrics {
    /// Create an empty registry.
    pub fn new(property_factory: PropertyFactory, clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            property_factory,
            commands: RwLock::new(HashMap::new()),
        }
    }

    /// The metrics for `name`, created with `group` identity on first use.
    pub fn for_command(&self, name: &str, group: &str) -> Arc<CommandMetrics> {
        {
            let commands = self.commands.read().unwrap_or_else(|e| e.into_inner());
            if let Some(metrics) = commands.get(name) {
                return metrics.clone();
            }
        }
        let mut commands = self.commands.write().unwrap_or_else(|e| e.into_inner());
        commands
            .entry(name.to_string())
            .or_insert_with(|| {
                Arc::new(CommandMetrics::new(
                    name,
                    group,
                    MetricsProperties::new(&self.property_factory, name),
                    self.clock.clone(),
                ))
            })
            .clone()
    }

    /// The metrics for `name`, if the command has executed before.
    pub fn get(&self, name: &str) -> Option<Arc<CommandMetrics>> {
        let commands = self.commands.read().unwrap_or_else(|e| e.into_inner());
        commands.get(name).cloned()
    }

    /// Every command's metrics, in no particular order.
    pub fn all(&self) -> Vec<Arc<CommandMetrics>> {
        let commands = self.commands.read().unwrap_or_else(|e| e.into_inner());
        commands.values().cloned().collect()
    }

    /// Record one execution outcome for `name`.
    pub fn update(
        &self,
        name: &str,
        group: &str,
        execution_time: Duration,
        events: &[ExecutionEvent],
    ) {
        self.for_command(name, group).update(execution_time, events);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cuirass_common::ManualClock;
    use cuirass_config::DynamicConfig;

    fn new_registry() -> ExecutionMetrics {
        let factory = PropertyFactory::new(Arc::new(DynamicConfig::new()));
        ExecutionMetrics::new(factory, Arc::new(ManualClock::new(0)))
    }

    #[test]
    fn test_for_command_reuses_instance() {
        let registry = new_registry();

        let first = registry.for_command("GetOrder", "Orders");
        let second = registry.for_command("GetOrder", "Orders");
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_get_only_returns_known_commands() {
        let registry = new_registry();
        assert!(registry.get("GetOrder").is_none());

        registry.update("GetOrder", "Orders", Duration::from_millis(1), &[ExecutionEvent::Success]);
        let metrics = registry.get("GetOrder").unwrap();
        assert_eq!(metrics.rolling_sum(ExecutionEvent::Success), 1);
        assert_eq!(metrics.command_group(), "Orders");
    }

    #[test]
    fn test_all_lists_every_command() {
        let registry = new_registry();
        registry.update("GetOrder", "Orders", Duration::from_millis(1), &[ExecutionEvent::Success]);
        registry.update("GetUser", "Users", Duration::from_millis(1), &[ExecutionEvent::Failure]);

        let mut names: Vec<String> = registry
            .all()
            .iter()
            .map(|m| m.command_name().to_string())
            .collect();
        names.sort();
        assert_eq!(names, vec!["GetOrder", "GetUser"]);
    }
}
