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

//! Request-scoped response memoisation.

use std::any::Any;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use cuirass_request_log::{ExecutionEvent, ExecutionInfo};

use crate::CommandResult;

/// Key: command name plus the command's cache key.
type CacheKey = (String, String);

#[derive(Clone)]
struct CachedResponse {
    /// Type-erased `CommandResult<T>`; the cache outlives any single
    /// command's result type.
    response: Arc<dyn Any + Send + Sync>,
    info: ExecutionInfo,
}

/// Memoises command responses for the duration of one request scope.
///
/// The first execution of a cacheable command stores its `(value, error)`
/// pair and execution record; every later execution with the same
/// `(name, cache key)` replays that pair without touching the breaker, the
/// gate, or the dependency. The stored record carries a trailing
/// [`ExecutionEvent::ResponseFromCache`] and zero execution time.
#[derive(Default)]
pub struct RequestCache {
    entries: RwLock<HashMap<CacheKey, CachedResponse>>,
}

impl RequestCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// The stored response for `(name, key)`, if any.
    ///
    /// A stored response of a different result type reads as a miss; the
    /// pair identifies one command, so this only happens when two commands
    /// share a name with different types.
    pub fn get<T>(&self, name: &str, key: &str) -> Option<(CommandResult<T>, ExecutionInfo)>
    where
        T: Clone + Send + Sync + 'static,
    {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        let cached = entries.get(&(name.to_string(), key.to_string()))?;
        let response = cached.response.downcast_ref::<CommandResult<T>>()?;
        Some((response.clone(), cached.info.clone()))
    }

    /// Store a response for `(name, key)`.
    ///
    /// The stored execution record is `info` with
    /// [`ExecutionEvent::ResponseFromCache`] appended and its execution time
    /// zeroed.
    pub fn add<T>(&self, name: &str, key: &str, info: &ExecutionInfo, response: CommandResult<T>)
    where
        T: Clone + Send + Sync + 'static,
    {
        let cached = CachedResponse {
            response: Arc::new(response),
            info: info.for_cache(ExecutionEvent::ResponseFromCache),
        };
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.insert((name.to_string(), key.to_string()), cached);
    }

    /// Number of stored responses.
    pub fn len(&self) -> usize {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries.len()
    }

    /// Whether nothing has been stored yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for RequestCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestCache").field("len", &self.len()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CommandError;

    fn success_info(name: &str) -> ExecutionInfo {
        ExecutionInfo::new(name, 3_000_000, vec![ExecutionEvent::Success])
    }

    #[test]
    fn test_miss_on_empty_cache() {
        let cache = RequestCache::new();
        assert!(cache.get::<String>("GetOrder", "a").is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_stores_and_replays_success() {
        let cache = RequestCache::new();
        cache.add(
            "GetOrder",
            "a",
            &success_info("GetOrder"),
            Ok("order-1".to_string()),
        );

        let (response, info) = cache.get::<String>("GetOrder", "a").unwrap();
        assert_eq!(response.unwrap(), "order-1");
        assert_eq!(info.execution_time(), std::time::Duration::ZERO);
        assert_eq!(
            info.events(),
            &[ExecutionEvent::Success, ExecutionEvent::ResponseFromCache]
        );
    }

    #[test]
    fn test_stores_and_replays_error() {
        let cache = RequestCache::new();
        let info = ExecutionInfo::new("GetOrder", 1_000_000, vec![ExecutionEvent::Failure]);
        cache.add::<String>(
            "GetOrder",
            "a",
            &info,
            Err(CommandError::failure(anyhow::anyhow!("boom"))),
        );

        let (response, _) = cache.get::<String>("GetOrder", "a").unwrap();
        assert_eq!(
            response.unwrap_err(),
            CommandError::failure(anyhow::anyhow!("boom"))
        );
    }

    #[test]
    fn test_keys_are_name_and_cache_key() {
        let cache = RequestCache::new();
        cache.add("GetOrder", "a", &success_info("GetOrder"), Ok(1_u32));

        assert!(cache.get::<u32>("GetOrder", "b").is_none());
        assert!(cache.get::<u32>("GetUser", "a").is_none());
        assert!(cache.get::<u32>("GetOrder", "a").is_some());
    }

    #[test]
    fn test_type_mismatch_reads_as_miss() {
        let cache = RequestCache::new();
        cache.add("GetOrder", "a", &success_info("GetOrder"), Ok(1_u32));
        assert!(cache.get::<String>("GetOrder", "a").is_none());
    }
}
