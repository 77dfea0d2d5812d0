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

//! Request scope.
//!
//! ## Purpose
//! The dynamic context of one caller request. It carries the optional
//! request-scoped collaborators — response cache and execution log — plus a
//! request id for tracing. Cloning shares the collaborators, so every
//! command executed on behalf of the same request sees the same cache and
//! log.

use std::sync::Arc;

use cuirass_request_log::RequestLog;
use ulid::Ulid;

use crate::RequestCache;

/// The dynamic context of one caller request.
///
/// ## Examples
/// ```rust,no_run
/// use cuirass::RequestContext;
///
/// let ctx = RequestContext::new()
///     .with_request_cache()
///     .with_request_log();
/// assert!(ctx.request_cache().is_some());
/// assert!(ctx.request_log().is_some());
/// ```
#[derive(Debug, Clone)]
pub struct RequestContext {
    request_id: Arc<str>,
    cache: Option<Arc<RequestCache>>,
    log: Option<Arc<RequestLog>>,
}

impl RequestContext {
    /// Create a bare context with a fresh request id and no collaborators:
    /// executions are neither cached nor logged until the corresponding
    /// `with_*` builder attaches the collaborator.
    pub fn new() -> Self {
        Self {
            request_id: Arc::from(Ulid::new().to_string()),
            cache: None,
            log: None,
        }
    }

    /// Attach a fresh request cache.
    pub fn with_request_cache(mut self) -> Self {
        self.cache = Some(Arc::new(RequestCache::new()));
        self
    }

    /// Attach a fresh request log.
    pub fn with_request_log(mut self) -> Self {
        self.log = Some(Arc::new(RequestLog::new()));
        self
    }

    /// Unique id of this request, for tracing.
    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    /// The request cache, if one is attached.
    pub fn request_cache(&self) -> Option<&Arc<RequestCache>> {
        self.cache.as_ref()
    }

    /// The request log, if one is attached.
    pub fn request_log(&self) -> Option<&Arc<RequestLog>> {
        self.log.as_ref()
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}
