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

//! Command executor.
//!
//! ## Purpose
//! Runs every dependency call inside the isolation envelope: request cache,
//! circuit breaker, concurrency gate, deadline, panic barrier, fallback, and
//! exactly-once statistics.
//!
//! ## Architecture Context
//! One call flows through the envelope in a fixed order:
//!
//! ```text
//! exec ──> force-open? ──> cache hit? ──> breaker allowance
//!                                             │ allowed
//!                                             ▼
//!                                      gate try-acquire ──> deadline ──> primary
//!                                             │ rejected        │ elapsed    │
//!                                             ▼                 ▼            ▼
//!                                      SemaphoreRejected   DeadlineExceeded  result
//!          failure of any kind ──> fallback (if enabled) ──> record + cache
//! ```
//!
//! Exactly one execution record is logged and exactly one metrics update
//! made per call, whatever path the call takes.

use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use cuirass_circuit_breaker::{CircuitBreaker, CircuitBreakerProperties};
use cuirass_common::{Clock, GateFactory, SystemClock};
use cuirass_config::{DynamicConfig, PropertyFactory};
use cuirass_metrics::ExecutionMetrics;
use cuirass_request_log::{ExecutionEvent, ExecutionInfo};
use futures::FutureExt;

use crate::{Command, CommandError, CommandProperties, CommandResult, RequestContext};

/// Executes commands inside the isolation envelope.
///
/// One executor instance is shared by every caller in the process; it owns
/// the breaker registry, the metrics registry, the gate factory, and the
/// per-command property cache. All of them key on the command name, so
/// commands themselves stay cheap throwaway descriptions.
///
/// ## Examples
/// ```rust,no_run
/// use std::sync::Arc;
/// use cuirass::{Command, Executor, RequestContext};
/// use cuirass_config::DynamicConfig;
///
/// # async fn example() -> Result<(), cuirass::CommandError> {
/// let executor = Executor::new(Arc::new(DynamicConfig::new()));
/// let ctx = RequestContext::new().with_request_log();
///
/// let command = Command::builder("GetOrder", || async {
///     Ok::<_, anyhow::Error>("order-42".to_string())
/// })
/// .build();
///
/// let order = executor.exec(&ctx, &command).await?;
/// # Ok(())
/// # }
/// ```
pub struct Executor {
    clock: Arc<dyn Clock>,
    property_factory: PropertyFactory,
    metrics: Arc<ExecutionMetrics>,
    breakers: RwLock<HashMap<String, Arc<CircuitBreaker>>>,
    gates: GateFactory,
    properties: RwLock<HashMap<String, Arc<CommandProperties>>>,
}

enum FallbackOutcome<T> {
    Success(T),
    NotImplemented,
    Failed(CommandError),
    Panicked(CommandError),
}

impl Executor {
    /// Create an executor reading properties from `config`.
    pub fn new(config: Arc<DynamicConfig>) -> Self {
        Self::with_clock(config, Arc::new(SystemClock::new()))
    }

    /// Create an executor with an injected clock (deterministic tests).
    pub fn with_clock(config: Arc<DynamicConfig>, clock: Arc<dyn Clock>) -> Self {
        let property_factory = PropertyFactory::new(config);
        Self {
            metrics: Arc::new(ExecutionMetrics::new(property_factory.clone(), clock.clone())),
            clock,
            property_factory,
            breakers: RwLock::new(HashMap::new()),
            gates: GateFactory::new(),
            properties: RwLock::new(HashMap::new()),
        }
    }

    /// The metrics registry, for dashboards and operators.
    pub fn metrics(&self) -> &Arc<ExecutionMetrics> {
        &self.metrics
    }

    /// Whether the breaker for `name` is currently open. Commands that have
    /// never executed read as closed.
    pub fn is_circuit_breaker_open(&self, name: &str) -> bool {
        let breakers = self.breakers.read().unwrap_or_else(|e| e.into_inner());
        breakers.get(name).map(|b| b.is_open()).unwrap_or(false)
    }

    /// The resolved property handles for `name`.
    pub fn command_properties(&self, name: &str) -> Arc<CommandProperties> {
        {
            let properties = self.properties.read().unwrap_or_else(|e| e.into_inner());
            if let Some(props) = properties.get(name) {
                return props.clone();
            }
        }
        let mut properties = self.properties.write().unwrap_or_else(|e| e.into_inner());
        properties
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(CommandProperties::new(&self.property_factory, name)))
            .clone()
    }

    /// Execute `command` within the scope of `ctx`.
    ///
    /// Always returns either the primary's value, the fallback's value, or
    /// an error; panics in either action are converted to errors and never
    /// escape.
    pub async fn exec<T>(&self, ctx: &RequestContext, command: &Command<T>) -> CommandResult<T>
    where
        T: Clone + Send + Sync + 'static,
    {
        let properties = self.command_properties(command.name());
        let start = self.clock.now_nanos();

        // Forced-open denies before any other work, the cache included.
        if properties.circuit_breaker.force_open.get() {
            self.record(
                ctx,
                &properties,
                command.name(),
                command.group(),
                start,
                vec![ExecutionEvent::ShortCircuited],
            );
            return Err(CommandError::CircuitOpen);
        }

        if let (Some(cache), Some(key)) = (ctx.request_cache(), command.cache_key()) {
            if properties.request_cache_enabled.get() {
                if let Some((response, cached_info)) = cache.get::<T>(command.name(), key) {
                    self.metrics.update(
                        command.name(),
                        command.group(),
                        Duration::ZERO,
                        cached_info.events(),
                    );
                    if properties.request_log_enabled.get() {
                        if let Some(log) = ctx.request_log() {
                            log.add(cached_info);
                        }
                    }
                    return response;
                }
            }
        }

        let breaker = self.breaker_for(command.name(), command.group());
        let (allowed, trial) = breaker.is_request_allowed();

        let primary_result: CommandResult<T> = if allowed {
            match self.run_primary(command, &properties).await {
                Ok(value) => {
                    if trial {
                        breaker.mark_trial_success();
                    }
                    Ok(value)
                }
                Err(err) if trial => {
                    // A failed probe reads as "still unhealthy"; the real
                    // error is not the caller's business.
                    tracing::debug!(
                        command = command.name(),
                        error = %err,
                        "trial call failed, circuit stays open"
                    );
                    Err(CommandError::CircuitOpen)
                }
                Err(err) => Err(err),
            }
        } else {
            tracing::debug!(command = command.name(), "circuit breaker denied request");
            Err(CommandError::CircuitOpen)
        };

        let mut events = Vec::new();
        let primary_err = match primary_result {
            Ok(value) => {
                events.push(ExecutionEvent::Success);
                let info = self.record(
                    ctx,
                    &properties,
                    command.name(),
                    command.group(),
                    start,
                    events,
                );
                self.store_in_cache(ctx, command, &properties, &info, Ok(value.clone()));
                return Ok(value);
            }
            Err(err) => {
                events.push(classify(&err));
                err
            }
        };

        if !properties.fallback_enabled.get() {
            let info = self.record(
                ctx,
                &properties,
                command.name(),
                command.group(),
                start,
                events,
            );
            self.store_in_cache::<T>(ctx, command, &properties, &info, Err(primary_err.clone()));
            return Err(primary_err);
        }

        tracing::debug!(command = command.name(), error = %primary_err, "running fallback");
        let (value, error) = match self.run_fallback(command).await {
            FallbackOutcome::Success(value) => {
                events.push(ExecutionEvent::FallbackSuccess);
                (Some(value), None)
            }
            // An unimplemented fallback adds no event; the caller gets the
            // primary's error.
            FallbackOutcome::NotImplemented => (None, Some(primary_err)),
            FallbackOutcome::Failed(fallback_err) => {
                events.push(ExecutionEvent::FallbackFailure);
                tracing::debug!(
                    command = command.name(),
                    error = %fallback_err,
                    "fallback failed, returning primary error"
                );
                (None, Some(primary_err))
            }
            FallbackOutcome::Panicked(panic_err) => {
                events.push(ExecutionEvent::FallbackFailure);
                (None, Some(panic_err))
            }
        };

        let info = self.record(
            ctx,
            &properties,
            command.name(),
            command.group(),
            start,
            events,
        );
        match (value, error) {
            (Some(value), _) => {
                self.store_in_cache(ctx, command, &properties, &info, Ok(value.clone()));
                Ok(value)
            }
            (None, Some(err)) => {
                self.store_in_cache::<T>(ctx, command, &properties, &info, Err(err.clone()));
                Err(err)
            }
            // run_fallback always yields a value or an error.
            (None, None) => Err(CommandError::UnknownPanic),
        }
    }

    /// Gate, deadline, and panic barrier around the primary action.
    async fn run_primary<T>(
        &self,
        command: &Command<T>,
        properties: &CommandProperties,
    ) -> CommandResult<T> {
        let capacity = properties.max_concurrent_requests.get().max(0) as usize;
        let gate = self.gates.get(command.group(), capacity);
        let Some(_permit) = gate.try_acquire() else {
            tracing::debug!(
                command = command.name(),
                group = command.group(),
                capacity,
                "concurrency gate full, rejecting"
            );
            return Err(CommandError::SemaphoreRejected);
        };

        let action = AssertUnwindSafe(command.run_primary()).catch_unwind();
        let deadline = properties.execution_timeout.get();
        let outcome = if deadline > Duration::ZERO {
            match tokio::time::timeout(deadline, action).await {
                Ok(outcome) => outcome,
                Err(_) => {
                    tracing::debug!(
                        command = command.name(),
                        deadline_ms = deadline.as_millis() as u64,
                        "execution deadline exceeded"
                    );
                    return Err(CommandError::DeadlineExceeded);
                }
            }
        } else {
            action.await
        };

        match outcome {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(err)) => Err(CommandError::from_dependency(err)),
            Err(payload) => Err(CommandError::from_panic(payload)),
        }
    }

    /// Panic barrier around the fallback action.
    async fn run_fallback<T>(&self, command: &Command<T>) -> FallbackOutcome<T> {
        let Some(fallback) = command.run_fallback() else {
            return FallbackOutcome::NotImplemented;
        };
        match AssertUnwindSafe(fallback).catch_unwind().await {
            Ok(Ok(value)) => FallbackOutcome::Success(value),
            Ok(Err(err)) => match CommandError::from_dependency(err) {
                CommandError::FallbackNotImplemented => FallbackOutcome::NotImplemented,
                other => FallbackOutcome::Failed(other),
            },
            Err(payload) => FallbackOutcome::Panicked(CommandError::from_panic(payload)),
        }
    }

    /// The exactly-once statistics write for one call.
    fn record(
        &self,
        ctx: &RequestContext,
        properties: &CommandProperties,
        name: &str,
        group: &str,
        start_nanos: i64,
        events: Vec<ExecutionEvent>,
    ) -> ExecutionInfo {
        let info = ExecutionInfo::new(name, self.clock.now_nanos() - start_nanos, events);
        self.metrics
            .update(name, group, info.execution_time(), info.events());
        if properties.request_log_enabled.get() {
            if let Some(log) = ctx.request_log() {
                log.add(info.clone());
            }
        }
        info
    }

    fn store_in_cache<T>(
        &self,
        ctx: &RequestContext,
        command: &Command<T>,
        properties: &CommandProperties,
        info: &ExecutionInfo,
        response: CommandResult<T>,
    ) where
        T: Clone + Send + Sync + 'static,
    {
        if !properties.request_cache_enabled.get() {
            return;
        }
        let (Some(cache), Some(key)) = (ctx.request_cache(), command.cache_key()) else {
            return;
        };
        cache.add(command.name(), key, info, response);
    }

    fn breaker_for(&self, name: &str, group: &str) -> Arc<CircuitBreaker> {
        {
            let breakers = self.breakers.read().unwrap_or_else(|e| e.into_inner());
            if let Some(breaker) = breakers.get(name) {
                return breaker.clone();
            }
        }
        let mut breakers = self.breakers.write().unwrap_or_else(|e| e.into_inner());
        breakers
            .entry(name.to_string())
            .or_insert_with(|| {
                Arc::new(CircuitBreaker::new(
                    CircuitBreakerProperties::new(&self.property_factory, name),
                    self.metrics.for_command(name, group),
                    self.clock.clone(),
                ))
            })
            .clone()
    }
}

impl std::fmt::Debug for Executor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Executor").finish_non_exhaustive()
    }
}

/// Map a primary error to its execution event.
fn classify(err: &CommandError) -> ExecutionEvent {
    match err {
        CommandError::DeadlineExceeded => ExecutionEvent::Timeout,
        CommandError::CircuitOpen => ExecutionEvent::ShortCircuited,
        CommandError::SemaphoreRejected => ExecutionEvent::SemaphoreRejected,
        _ => ExecutionEvent::Failure,
    }
}
