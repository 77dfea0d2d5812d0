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

//! # Cuirass Circuit Breaker
//!
//! ## Purpose
//! Fast-fail protection for outbound dependency calls: once a command's
//! rolling error rate crosses its threshold at sufficient volume, further
//! calls are denied until a probe succeeds.
//!
//! ## Architecture Context
//! The breaker derives everything from two atomics and the command's health
//! snapshot:
//!
//! ```text
//!  ┌────────┐ volume ≥ threshold ∧ error% > threshold ┌────────┐
//!  │ Closed │ ───────────────────────────────────────>│  Open  │
//!  │        │ <─────────────────────────────────────  │        │
//!  └────────┘        trial call succeeds              └───┬────┘
//!       ▲    (counters reset, circuit closes)             │ sleep window
//!       │                                                 ▼ elapses
//!       │                                            ┌──────────┐
//!       └────────────────────────────────────────────┤ HalfOpen │
//!                trial call fails (stays open)       └──────────┘
//! ```
//!
//! Half-open is not stored: it is the derived condition "open, and the sleep
//! window has elapsed since the last trial". The compare-and-swap on the
//! last-trial timestamp is what guarantees at most one in-flight trial per
//! sleep window, no matter how many callers race for it.
//!
//! ## Key Components
//! - [`CircuitBreaker`]: the state machine
//! - [`CircuitBreakerProperties`]: its chained config handles
//! - [`CircuitState`]: the derived state, for observability
//!
//! ## Dependencies
//! - [`cuirass_metrics`]: health snapshots driving the trip decision
//! - [`cuirass_config`]: runtime-changeable thresholds and forced modes

#![warn(missing_docs)]
#![warn(clippy::all)]

mod circuit_breaker;
mod properties;

pub use circuit_breaker::{CircuitBreaker, CircuitState};
pub use properties::CircuitBreakerProperties;
