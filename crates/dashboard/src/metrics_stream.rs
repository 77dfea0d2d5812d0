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

//! SSE metrics stream in the Hystrix dashboard wire format.
//!
//! The field names and the raw `ping: ` idle lines are fixed: downstream
//! dashboards parse this exact shape, so the handler writes the SSE body by
//! hand instead of going through a typed SSE layer.

use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::body::{Body, Bytes};
use axum::extract::State;
use axum::http::header::CONTENT_TYPE;
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use cuirass::Executor;
use cuirass_request_log::ExecutionEvent;
use serde::Serialize;

/// Route the stream is mounted on.
pub const METRICS_STREAM_PATH: &str = "/metrics.stream";

/// Interval between stream ticks.
const TICK_INTERVAL: Duration = Duration::from_millis(2_000);

/// Streams every command's metrics to dashboard clients.
#[derive(Clone)]
pub struct MetricsStream {
    executor: Arc<Executor>,
}

/// One `HystrixCommand` record, serialised per command per tick.
#[derive(Debug, Serialize)]
struct CommandRecord {
    #[serde(rename = "type")]
    record_type: &'static str,
    name: String,
    group: String,
    #[serde(rename = "currentTime")]
    current_time: i64,
    #[serde(rename = "isCircuitBreakerOpen")]
    is_circuit_breaker_open: bool,
    #[serde(rename = "errorPercentage")]
    error_percentage: u32,
    #[serde(rename = "errorCount")]
    error_count: u64,
    #[serde(rename = "requestCount")]
    request_count: u64,
    #[serde(rename = "rollingCountCollapsedRequests")]
    rolling_count_collapsed_requests: u64,
    #[serde(rename = "rollingCountExceptionsThrown")]
    rolling_count_exceptions_thrown: u64,
    #[serde(rename = "rollingCountFailure")]
    rolling_count_failure: u64,
    #[serde(rename = "rollingCountFallbackFailure")]
    rolling_count_fallback_failure: u64,
    #[serde(rename = "rollingCountFallbackRejection")]
    rolling_count_fallback_rejection: u64,
    #[serde(rename = "rollingCountFallbackSuccess")]
    rolling_count_fallback_success: u64,
    #[serde(rename = "rollingCountResponsesFromCache")]
    rolling_count_responses_from_cache: u64,
    #[serde(rename = "rollingCountSemaphoreRejected")]
    rolling_count_semaphore_rejected: u64,
    #[serde(rename = "rollingCountShortCircuited")]
    rolling_count_short_circuited: u64,
    #[serde(rename = "rollingCountSuccess")]
    rolling_count_success: u64,
    #[serde(rename = "rollingCountThreadPoolRejected")]
    rolling_count_thread_pool_rejected: u64,
    #[serde(rename = "rollingCountTimeout")]
    rolling_count_timeout: u64,
    #[serde(rename = "currentConcurrentExecutionCount")]
    current_concurrent_execution_count: u64,
    #[serde(rename = "latencyExecute_mean")]
    latency_execute_mean: u64,
    #[serde(rename = "latencyExecute")]
    latency_execute: HashMap<String, u64>,
    #[serde(rename = "latencyTotal_mean")]
    latency_total_mean: u64,
    #[serde(rename = "latencyTotal")]
    latency_total: HashMap<String, u64>,
    #[serde(rename = "propertyValue_circuitBreakerRequestVolumeThreshold")]
    property_circuit_breaker_request_volume_threshold: i64,
    #[serde(rename = "propertyValue_circuitBreakerSleepWindowInMilliseconds")]
    property_circuit_breaker_sleep_window_ms: u64,
    #[serde(rename = "propertyValue_circuitBreakerErrorThresholdPercentage")]
    property_circuit_breaker_error_threshold_percentage: i64,
    #[serde(rename = "propertyValue_circuitBreakerForceOpen")]
    property_circuit_breaker_force_open: bool,
    #[serde(rename = "propertyValue_circuitBreakerForceClosed")]
    property_circuit_breaker_force_closed: bool,
    #[serde(rename = "propertyValue_executionIsolationStrategy")]
    property_execution_isolation_strategy: &'static str,
    #[serde(rename = "propertyValue_executionIsolationThreadTimeoutInMilliseconds")]
    property_execution_isolation_thread_timeout_ms: u64,
    #[serde(rename = "propertyValue_executionIsolationThreadInterruptOnTimeout")]
    property_execution_isolation_thread_interrupt_on_timeout: bool,
    #[serde(rename = "propertyValue_executionIsolationSemaphoreMaxConcurrentRequests")]
    property_execution_isolation_semaphore_max_concurrent_requests: i64,
    #[serde(rename = "propertyValue_fallbackIsolationSemaphoreMaxConcurrentRequests")]
    property_fallback_isolation_semaphore_max_concurrent_requests: i64,
    #[serde(rename = "propertyValue_requestCacheEnabled")]
    property_request_cache_enabled: bool,
    #[serde(rename = "propertyValue_requestLogEnabled")]
    property_request_log_enabled: bool,
    #[serde(rename = "propertyValue_metricsRollingStatisticalWindowInMilliseconds")]
    property_metrics_rolling_statistical_window_ms: u64,
    #[serde(rename = "reportingHosts")]
    reporting_hosts: u32,
}

impl MetricsStream {
    /// Create a stream over `executor`'s metrics registry.
    pub fn new(executor: Arc<Executor>) -> Self {
        Self { executor }
    }

    /// The body chunk for one tick: one `data:` line per command, or a
    /// `ping: ` line when no command has reported yet.
    fn render_tick(&self) -> String {
        let all = self.executor.metrics().all();
        if all.is_empty() {
            return "ping: \n".to_string();
        }
        let mut chunk = String::new();
        for metrics in all {
            match serde_json::to_string(&self.command_record(
                metrics.command_name(),
                metrics.command_group(),
                &metrics,
            )) {
                Ok(json) => {
                    chunk.push_str("data: ");
                    chunk.push_str(&json);
                    chunk.push_str("\n\n");
                }
                Err(error) => {
                    tracing::warn!(
                        command = metrics.command_name(),
                        %error,
                        "failed to serialise metrics record"
                    );
                }
            }
        }
        chunk
    }

    fn command_record(
        &self,
        name: &str,
        group: &str,
        metrics: &cuirass_metrics::CommandMetrics,
    ) -> CommandRecord {
        let properties = self.executor.command_properties(name);
        let latency = collect_percentiles(metrics);
        let max_concurrent = properties.max_concurrent_requests.get();
        CommandRecord {
            record_type: "HystrixCommand",
            name: name.to_string(),
            group: group.to_string(),
            current_time: chrono::Utc::now().timestamp_millis(),
            is_circuit_breaker_open: self.executor.is_circuit_breaker_open(name),
            error_percentage: metrics.error_percentage(),
            error_count: metrics.error_count(),
            request_count: metrics.total_requests(),
            rolling_count_collapsed_requests: 0,
            rolling_count_exceptions_thrown: 0,
            rolling_count_failure: metrics.rolling_sum(ExecutionEvent::Failure),
            rolling_count_fallback_failure: metrics.rolling_sum(ExecutionEvent::FallbackFailure),
            rolling_count_fallback_rejection: 0,
            rolling_count_fallback_success: metrics.rolling_sum(ExecutionEvent::FallbackSuccess),
            rolling_count_responses_from_cache: metrics
                .rolling_sum(ExecutionEvent::ResponseFromCache),
            rolling_count_semaphore_rejected: metrics
                .rolling_sum(ExecutionEvent::SemaphoreRejected),
            rolling_count_short_circuited: metrics.rolling_sum(ExecutionEvent::ShortCircuited),
            rolling_count_success: metrics.rolling_sum(ExecutionEvent::Success),
            rolling_count_thread_pool_rejected: 0,
            rolling_count_timeout: metrics.rolling_sum(ExecutionEvent::Timeout),
            current_concurrent_execution_count: 0,
            latency_execute_mean: metrics.execution_time_mean().as_millis() as u64,
            latency_execute: latency.clone(),
            latency_total_mean: metrics.execution_time_mean().as_millis() as u64,
            latency_total: latency,
            property_circuit_breaker_request_volume_threshold: properties
                .circuit_breaker
                .request_volume_threshold
                .get(),
            property_circuit_breaker_sleep_window_ms: properties
                .circuit_breaker
                .sleep_window
                .get()
                .as_millis() as u64,
            property_circuit_breaker_error_threshold_percentage: properties
                .circuit_breaker
                .error_threshold_percentage
                .get(),
            property_circuit_breaker_force_open: properties.circuit_breaker.force_open.get(),
            property_circuit_breaker_force_closed: properties.circuit_breaker.force_closed.get(),
            property_execution_isolation_strategy: "SEMAPHORE",
            property_execution_isolation_thread_timeout_ms: properties
                .execution_timeout
                .get()
                .as_millis() as u64,
            property_execution_isolation_thread_interrupt_on_timeout: false,
            property_execution_isolation_semaphore_max_concurrent_requests: max_concurrent,
            property_fallback_isolation_semaphore_max_concurrent_requests: max_concurrent,
            property_request_cache_enabled: properties.request_cache_enabled.get(),
            property_request_log_enabled: properties.request_log_enabled.get(),
            property_metrics_rolling_statistical_window_ms: cuirass_common::DEFAULT_WINDOW_SIZE
                .as_millis() as u64,
            reporting_hosts: 1,
        }
    }
}

/// Build a router serving the stream at [`METRICS_STREAM_PATH`].
pub fn metrics_stream_router(executor: Arc<Executor>) -> Router {
    Router::new()
        .route(METRICS_STREAM_PATH, get(stream_handler))
        .with_state(MetricsStream::new(executor))
}

async fn stream_handler(State(stream): State<MetricsStream>) -> Response {
    let body = futures::stream::unfold(
        (stream, tokio::time::interval(TICK_INTERVAL)),
        |(stream, mut ticker)| async move {
            ticker.tick().await;
            let chunk = Bytes::from(stream.render_tick());
            Some((Ok::<_, Infallible>(chunk), (stream, ticker)))
        },
    );

    Response::builder()
        .header(CONTENT_TYPE, "text/event-stream;charset=utf-8")
        .body(Body::from_stream(body))
        // The only failure mode is a malformed header literal.
        .unwrap_or_else(|_| Response::new(Body::empty()))
}

fn collect_percentiles(metrics: &cuirass_metrics::CommandMetrics) -> HashMap<String, u64> {
    let mut out = HashMap::new();
    for (label, percentile) in [
        ("0", 0.0),
        ("25", 25.0),
        ("50", 50.0),
        ("75", 75.0),
        ("90", 90.0),
        ("95", 95.0),
        ("99", 99.0),
        ("99.5", 99.5),
        ("100", 100.0),
    ] {
        out.insert(
            label.to_string(),
            metrics.execution_time_percentile(percentile).as_millis() as u64,
        );
    }
    out
}
