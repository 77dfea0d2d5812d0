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

//! Request-scoped execution history.

use std::fmt;
use std::sync::RwLock;
use std::time::Duration;

use crate::ExecutionInfo;

/// Ordered history of the command executions within one request scope.
///
/// Safe to share across the tasks serving a request. The [`fmt::Display`]
/// rendering aggregates entries with identical name and event sequence,
/// preserving first-occurrence order and summing durations:
/// `GetOrder[SUCCESS][3ms]x2, GetUser[FAILURE, FALLBACK_SUCCESS][10ms]`.
#[derive(Debug, Default)]
pub struct RequestLog {
    entries: RwLock<Vec<ExecutionInfo>>,
}

impl RequestLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one execution record.
    pub fn add(&self, info: ExecutionInfo) {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.push(info);
    }

    /// Number of executions recorded so far.
    pub fn len(&self) -> usize {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries.len()
    }

    /// Whether no execution has been recorded yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The most recently recorded execution.
    pub fn last(&self) -> Option<ExecutionInfo> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries.last().cloned()
    }

    /// A snapshot of every recorded execution, in order.
    pub fn entries(&self) -> Vec<ExecutionInfo> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries.clone()
    }
}

impl fmt::Display for RequestLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let entries = self.entries();

        // (representative entry index, summed duration, occurrence count),
        // in first-occurrence order.
        let mut groups: Vec<(usize, Duration, usize)> = Vec::new();
        for (index, info) in entries.iter().enumerate() {
            match groups
                .iter_mut()
                .find(|(first, _, _)| entries[*first].aggregates_with(info))
            {
                Some((_, total, count)) => {
                    *total += info.execution_time();
                    *count += 1;
                }
                None => groups.push((index, info.execution_time(), 1)),
            }
        }

        for (position, (first, total, count)) in groups.iter().enumerate() {
            if position > 0 {
                f.write_str(", ")?;
            }
            let info = &entries[*first];
            write!(f, "{}[", info.command_name())?;
            for (i, event) in info.events().iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{event}")?;
            }
            write!(f, "][{}ms]", total.as_millis())?;
            if *count > 1 {
                write!(f, "x{count}")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ExecutionEvent;

    fn info(name: &str, millis: i64, events: Vec<ExecutionEvent>) -> ExecutionInfo {
        ExecutionInfo::new(name, millis * 1_000_000, events)
    }

    #[test]
    fn test_add_and_size() {
        let log = RequestLog::new();
        assert!(log.is_empty());

        log.add(info("GetOrder", 1, vec![ExecutionEvent::Success]));
        log.add(info("GetUser", 2, vec![ExecutionEvent::Failure]));

        assert_eq!(log.len(), 2);
        assert_eq!(log.last().unwrap().command_name(), "GetUser");
    }

    #[test]
    fn test_display_single_entry() {
        let log = RequestLog::new();
        log.add(info("GetOrder", 2, vec![ExecutionEvent::Success]));
        assert_eq!(log.to_string(), "GetOrder[SUCCESS][2ms]");
    }

    #[test]
    fn test_display_multiple_events() {
        let log = RequestLog::new();
        log.add(info(
            "GetOrder",
            7,
            vec![ExecutionEvent::Failure, ExecutionEvent::FallbackSuccess],
        ));
        assert_eq!(log.to_string(), "GetOrder[FAILURE, FALLBACK_SUCCESS][7ms]");
    }

    #[test]
    fn test_display_aggregates_matching_entries() {
        let log = RequestLog::new();
        log.add(info("GetOrder", 2, vec![ExecutionEvent::Success]));
        log.add(info("GetUser", 1, vec![ExecutionEvent::Failure]));
        log.add(info("GetOrder", 1, vec![ExecutionEvent::Success]));

        // Matching entries aggregate under the first occurrence even when
        // another command is interleaved between them.
        assert_eq!(
            log.to_string(),
            "GetOrder[SUCCESS][3ms]x2, GetUser[FAILURE][1ms]"
        );
    }

    #[test]
    fn test_display_does_not_aggregate_different_events() {
        let log = RequestLog::new();
        log.add(info("GetOrder", 1, vec![ExecutionEvent::Success]));
        log.add(info(
            "GetOrder",
            1,
            vec![ExecutionEvent::Success, ExecutionEvent::ResponseFromCache],
        ));

        assert_eq!(
            log.to_string(),
            "GetOrder[SUCCESS][1ms], GetOrder[SUCCESS, RESPONSE_FROM_CACHE][1ms]"
        );
    }

    #[test]
    fn test_display_empty_log() {
        let log = RequestLog::new();
        assert_eq!(log.to_string(), "");
    }
}
