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

//! Integration tests for the SSE metrics stream route.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use cuirass::{Command, Executor, RequestContext};
use cuirass_config::DynamicConfig;
use cuirass_dashboard::{metrics_stream_router, METRICS_STREAM_PATH};
use http_body_util::BodyExt;
use tower::ServiceExt;

async fn first_chunk(executor: Arc<Executor>) -> (StatusCode, String, String) {
    let app = metrics_stream_router(executor);
    let response = app
        .oneshot(
            Request::builder()
                .uri(METRICS_STREAM_PATH)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let content_type = response
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();

    // The stream is endless; read just the first frame.
    let mut body = response.into_body();
    let frame = body
        .frame()
        .await
        .expect("stream yields a first frame")
        .expect("first frame is not an error");
    let chunk = String::from_utf8(frame.into_data().expect("data frame").to_vec()).unwrap();
    (status, content_type, chunk)
}

#[tokio::test]
async fn test_stream_pings_before_any_command_runs() {
    let executor = Arc::new(Executor::new(Arc::new(DynamicConfig::new())));
    let (status, content_type, chunk) = first_chunk(executor).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type, "text/event-stream;charset=utf-8");
    assert_eq!(chunk, "ping: \n");
}

#[tokio::test]
async fn test_stream_emits_command_records() {
    let executor = Arc::new(Executor::new(Arc::new(DynamicConfig::new())));
    let ctx = RequestContext::new();

    let command: Command<String> = Command::builder("GetOrder", || async {
        Ok("order".to_string())
    })
    .group("Orders")
    .build();
    executor.exec(&ctx, &command).await.unwrap();

    let (_, _, chunk) = first_chunk(executor).await;
    assert!(chunk.starts_with("data: "));

    let json = chunk.trim_start_matches("data: ").trim();
    let record: serde_json::Value = serde_json::from_str(json).unwrap();
    assert_eq!(record["type"], "HystrixCommand");
    assert_eq!(record["name"], "GetOrder");
    assert_eq!(record["group"], "Orders");
    assert_eq!(record["rollingCountSuccess"], 1);
    assert_eq!(record["isCircuitBreakerOpen"], false);
}
