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

//! # Cuirass Common
//!
//! ## Purpose
//! Shared primitives used across the Cuirass runtime:
//! - [`Clock`]: injectable monotonic time source so every time comparison in
//!   the runtime is deterministic under test
//! - [`RollingNumber`]: bucketed sliding-window counter feeding circuit
//!   breaker health and dashboard counts
//! - [`RollingPercentile`]: bucketed sliding-window latency reservoir with
//!   percentile and mean queries
//! - [`ConcurrencyGate`] / [`GateFactory`]: non-blocking bounded-concurrency
//!   permits keyed by command group
//!
//! ## Architecture Context
//! These are the leaves of the dependency graph; every other Cuirass crate
//! builds on them. None of them know about commands, breakers, or metrics —
//! they are plain time-and-counting machinery.
//!
//! ## Dependencies
//! - [`tokio`]: semaphore backing the concurrency gate

#![warn(missing_docs)]
#![warn(clippy::all)]

mod clock;
mod gate;
mod rolling_number;
mod rolling_percentile;

pub use clock::{Clock, ManualClock, SystemClock};
pub use gate::{ConcurrencyGate, GateFactory, GatePermit};
pub use rolling_number::{RollingNumber, DEFAULT_WINDOW_BUCKETS, DEFAULT_WINDOW_SIZE};
pub use rolling_percentile::RollingPercentile;
