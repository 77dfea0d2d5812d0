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

//! # Cuirass Request Log
//!
//! ## Purpose
//! Per-request execution diagnostics:
//! - [`ExecutionEvent`]: the closed set of outcomes a command execution can
//!   produce
//! - [`ExecutionInfo`]: one command execution — name, duration, ordered
//!   events
//! - [`RequestLog`]: the ordered list of executions within one request
//!   scope, with an aggregated string rendering for request-level logging
//!
//! ## Examples
//! ```rust
//! use cuirass_request_log::{ExecutionEvent, ExecutionInfo, RequestLog};
//!
//! let log = RequestLog::new();
//! log.add(ExecutionInfo::new("GetOrder", 2_000_000, vec![ExecutionEvent::Success]));
//! log.add(ExecutionInfo::new("GetOrder", 1_000_000, vec![ExecutionEvent::Success]));
//! assert_eq!(log.to_string(), "GetOrder[SUCCESS][3ms]x2");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

mod event;
mod execution_info;
mod request_log;

pub use event::ExecutionEvent;
pub use execution_info::ExecutionInfo;
pub use request_log::RequestLog;
