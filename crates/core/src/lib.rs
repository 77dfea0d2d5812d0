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

//! # Cuirass
//!
//! ## Purpose
//! A latency and fault tolerance runtime for dependency calls. Every
//! outbound call — typically a network RPC — runs inside an isolation
//! envelope that provides:
//!
//! - **Fast-fail** via per-command circuit breakers
//! - **Deadline enforcement** on the primary action
//! - **Bounded concurrency** per logical command group
//! - **One-shot fallback** on any failure
//! - **Request-scoped memoisation** of responses
//! - **Rolling statistics** feeding both the breaker and the metrics stream
//!
//! ## Key Components
//! - [`Executor`]: orchestrates every call through the envelope
//! - [`Command`]: immutable description of one dependency call
//! - [`RequestContext`]: per-request scope carrying the optional cache and
//!   log collaborators
//! - [`CommandError`]: sentinel and dependency errors
//! - [`CommandProperties`]: per-command configuration handles
//!
//! ## Examples
//! ```rust,no_run
//! use std::sync::Arc;
//! use cuirass::{Command, Executor, RequestContext};
//! use cuirass_config::DynamicConfig;
//!
//! # async fn example() -> Result<(), cuirass::CommandError> {
//! let executor = Executor::new(Arc::new(DynamicConfig::new()));
//!
//! let command = Command::builder("GetOrder", || async {
//!     Ok::<_, anyhow::Error>("order-42".to_string())
//! })
//! .group("Orders")
//! .fallback(|| async { Ok("unknown-order".to_string()) })
//! .build();
//!
//! let ctx = RequestContext::new().with_request_cache().with_request_log();
//! let order = executor.exec(&ctx, &command).await?;
//!
//! if let Some(log) = ctx.request_log() {
//!     tracing::info!(request = %log, "request finished");
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Dependencies
//! - [`cuirass_circuit_breaker`]: breaker state machine
//! - [`cuirass_metrics`]: rolling statistics registry
//! - [`cuirass_config`]: chained dynamic properties
//! - [`cuirass_request_log`]: events and the request log
//! - [`tokio`]: deadlines; [`futures`]: panic isolation

#![warn(missing_docs)]
#![warn(clippy::all)]

mod command;
mod error;
mod executor;
mod properties;
mod request_cache;
mod request_context;

pub use command::{Command, CommandBuilder};
pub use error::{CommandError, CommandResult};
pub use executor::Executor;
pub use properties::CommandProperties;
pub use request_cache::RequestCache;
pub use request_context::RequestContext;

// Re-exported so callers can name events and logs without a second import.
pub use cuirass_request_log::{ExecutionEvent, ExecutionInfo, RequestLog};
