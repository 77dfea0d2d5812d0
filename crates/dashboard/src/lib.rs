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

//! # Cuirass Dashboard
//!
//! ## Purpose
//! Operator-facing surfaces for a service embedding Cuirass:
//! - an axum route streaming per-command metrics as server-sent events in
//!   the Hystrix dashboard wire format (one JSON record per command every
//!   2000 ms, `ping: ` lines while idle)
//! - a tracing bootstrap for structured logs
//!
//! ## Examples
//! ```rust,no_run
//! use std::sync::Arc;
//! use cuirass::Executor;
//! use cuirass_config::DynamicConfig;
//! use cuirass_dashboard::metrics_stream_router;
//!
//! # async fn example() {
//! let executor = Arc::new(Executor::new(Arc::new(DynamicConfig::new())));
//! let app: axum::Router = metrics_stream_router(executor);
//! // serve `app` with axum; dashboards subscribe to GET /metrics.stream
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

mod metrics_stream;
mod telemetry;

pub use metrics_stream::{metrics_stream_router, MetricsStream, METRICS_STREAM_PATH};
pub use telemetry::init_tracing;
