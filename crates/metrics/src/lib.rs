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

//! # Cuirass Metrics
//!
//! ## Purpose
//! Rolling-window execution statistics per command:
//! - [`CommandMetrics`]: one rolling counter per observed event kind plus an
//!   execution-time percentile reservoir and an interval-cached
//!   [`HealthCounts`] snapshot
//! - [`ExecutionMetrics`]: the registry mapping command name to its metrics,
//!   written through by the executor on every call
//! - [`MetricsProperties`]: the config handles governing reservoir size and
//!   health snapshot freshness
//!
//! ## Architecture Context
//! The circuit breaker derives its open/closed decisions from the health
//! snapshot; the dashboard stream serialises the same counters for
//! operators. Both observe what the executor records — nothing else writes
//! here.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod command_metrics;
mod execution_metrics;
mod health;
mod properties;

pub use command_metrics::CommandMetrics;
pub use execution_metrics::ExecutionMetrics;
pub use health::HealthCounts;
pub use properties::MetricsProperties;
