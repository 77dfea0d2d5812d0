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

//! Execution outcome events.

use std::fmt;

/// Outcome of one stage of a command execution.
///
/// A single execution records an ordered sequence of these; the sequence is
/// what the request log and the metrics registry consume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExecutionEvent {
    /// The primary action completed successfully.
    Success,
    /// The primary action returned an error or panicked.
    Failure,
    /// The primary action exceeded its deadline.
    Timeout,
    /// The circuit breaker denied the call.
    ShortCircuited,
    /// The concurrency gate for the command's group was full.
    SemaphoreRejected,
    /// The response was served from the request cache.
    ResponseFromCache,
    /// The fallback action completed successfully.
    FallbackSuccess,
    /// The fallback action returned an error or panicked.
    FallbackFailure,
}

impl ExecutionEvent {
    /// Wire name used in log rendering and dashboards.
    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionEvent::Success => "SUCCESS",
            ExecutionEvent::Failure => "FAILURE",
            ExecutionEvent::Timeout => "TIMEOUT",
            ExecutionEvent::ShortCircuited => "SHORT_CIRCUITED",
            ExecutionEvent::SemaphoreRejected => "SEMAPHORE_REJECTED",
            ExecutionEvent::ResponseFromCache => "RESPONSE_FROM_CACHE",
            ExecutionEvent::FallbackSuccess => "FALLBACK_SUCCESS",
            ExecutionEvent::FallbackFailure => "FALLBACK_FAILURE",
        }
    }
}

impl fmt::Display for ExecutionEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
