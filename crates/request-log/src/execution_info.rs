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

//! Per-execution record.

use std::time::Duration;

use crate::ExecutionEvent;

/// One command execution: name, duration, and the ordered events that
/// happened during it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionInfo {
    command_name: String,
    execution_time: Duration,
    events: Vec<ExecutionEvent>,
}

impl ExecutionInfo {
    /// Create an execution record. Negative durations (a clock read moving
    /// backwards between start and finish) clamp to zero.
    pub fn new(
        command_name: impl Into<String>,
        execution_nanos: i64,
        events: Vec<ExecutionEvent>,
    ) -> Self {
        Self {
            command_name: command_name.into(),
            execution_time: Duration::from_nanos(execution_nanos.max(0) as u64),
            events,
        }
    }

    /// Name of the command this execution belongs to.
    pub fn command_name(&self) -> &str {
        &self.command_name
    }

    /// Time spent executing the command.
    pub fn execution_time(&self) -> Duration {
        self.execution_time
    }

    /// Events in the order they occurred.
    pub fn events(&self) -> &[ExecutionEvent] {
        &self.events
    }

    /// A copy of this record with `event` appended and the execution time
    /// zeroed; used when storing a response in the request cache.
    pub fn for_cache(&self, event: ExecutionEvent) -> Self {
        let mut events = self.events.clone();
        events.push(event);
        Self {
            command_name: self.command_name.clone(),
            execution_time: Duration::ZERO,
            events,
        }
    }

    /// Whether this execution renders identically to `other` (same name and
    /// event sequence); such entries aggregate in the request-log display.
    pub(crate) fn aggregates_with(&self, other: &ExecutionInfo) -> bool {
        self.command_name == other.command_name && self.events == other.events
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_negative_duration_clamps_to_zero() {
        let info = ExecutionInfo::new("GetOrder", -5, vec![ExecutionEvent::Success]);
        assert_eq!(info.execution_time(), Duration::ZERO);
    }

    #[test]
    fn test_for_cache_appends_event_and_zeroes_time() {
        let info = ExecutionInfo::new("GetOrder", 5_000_000, vec![ExecutionEvent::Success]);
        let cached = info.for_cache(ExecutionEvent::ResponseFromCache);

        assert_eq!(cached.execution_time(), Duration::ZERO);
        assert_eq!(
            cached.events(),
            &[ExecutionEvent::Success, ExecutionEvent::ResponseFromCache]
        );
        // The original record is untouched.
        assert_eq!(info.events(), &[ExecutionEvent::Success]);
    }

    #[test]
    fn test_aggregation_ignores_duration() {
        let a = ExecutionInfo::new("GetOrder", 1_000_000, vec![ExecutionEvent::Success]);
        let b = ExecutionInfo::new("GetOrder", 9_000_000, vec![ExecutionEvent::Success]);
        let c = ExecutionInfo::new("GetOrder", 1_000_000, vec![ExecutionEvent::Failure]);

        assert!(a.aggregates_with(&b));
        assert!(!a.aggregates_with(&c));
    }
}
