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

//! Command description.
//!
//! ## Purpose
//! A [`Command`] is an immutable description of one dependency call: its
//! name (the identity for breakers, metrics, and caching), its group (the
//! identity for concurrency limiting), the primary action, an optional
//! fallback, and an optional cache key. Commands are cheap to construct and
//! may be rebuilt for every call; all state lives in the executor, keyed by
//! name.

use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;

type ActionFn<T> = Arc<dyn Fn() -> BoxFuture<'static, anyhow::Result<T>> + Send + Sync>;

/// Immutable description of a dependency call.
///
/// ## Examples
/// ```rust,no_run
/// use cuirass::Command;
///
/// let command = Command::builder("GetOrder", || async {
///     // call the order service
///     Ok::<_, anyhow::Error>("order-42".to_string())
/// })
/// .group("Orders")
/// .fallback(|| async { Ok("cached-order".to_string()) })
/// .cache_key("order-42")
/// .build();
///
/// assert_eq!(command.name(), "GetOrder");
/// assert!(command.is_cacheable());
/// ```
pub struct Command<T> {
    name: String,
    group: String,
    cache_key: Option<String>,
    primary: ActionFn<T>,
    fallback: Option<ActionFn<T>>,
}

impl<T> Command<T> {
    /// Start building a command with its name and primary action.
    pub fn builder<F, Fut>(name: impl Into<String>, primary: F) -> CommandBuilder<T>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<T>> + Send + 'static,
    {
        CommandBuilder {
            name: name.into(),
            group: None,
            cache_key: None,
            primary: Arc::new(move || Box::pin(primary())),
            fallback: None,
        }
    }

    /// Identity for the breaker, metrics, and cache lookups.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Identity for the concurrency gate; defaults to the command name.
    pub fn group(&self) -> &str {
        &self.group
    }

    /// Cache key within a request scope, if the command is cacheable.
    pub fn cache_key(&self) -> Option<&str> {
        self.cache_key.as_deref()
    }

    /// Whether responses may be served from the request cache.
    pub fn is_cacheable(&self) -> bool {
        self.cache_key.is_some()
    }

    /// Invoke the primary action.
    pub(crate) fn run_primary(&self) -> BoxFuture<'static, anyhow::Result<T>> {
        (self.primary)()
    }

    /// Invoke the fallback action, if one was configured.
    pub(crate) fn run_fallback(&self) -> Option<BoxFuture<'static, anyhow::Result<T>>> {
        self.fallback.as_ref().map(|fallback| fallback())
    }
}

impl<T> std::fmt::Debug for Command<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.name)
            .field("group", &self.group)
            .field("cache_key", &self.cache_key)
            .field("has_fallback", &self.fallback.is_some())
            .finish()
    }
}

/// Builder for [`Command`].
pub struct CommandBuilder<T> {
    name: String,
    group: Option<String>,
    cache_key: Option<String>,
    primary: ActionFn<T>,
    fallback: Option<ActionFn<T>>,
}

impl<T> CommandBuilder<T> {
    /// Set the concurrency group (defaults to the command name).
    pub fn group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    /// Set the fallback action run when the primary fails.
    pub fn fallback<F, Fut>(mut self, fallback: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<T>> + Send + 'static,
    {
        self.fallback = Some(Arc::new(move || Box::pin(fallback())));
        self
    }

    /// Mark the command cacheable under `key` within a request scope.
    pub fn cache_key(mut self, key: impl Into<String>) -> Self {
        self.cache_key = Some(key.into());
        self
    }

    /// Finish the command.
    pub fn build(self) -> Command<T> {
        Command {
            group: self.group.unwrap_or_else(|| self.name.clone()),
            name: self.name,
            cache_key: self.cache_key,
            primary: self.primary,
            fallback: self.fallback,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_builder_defaults() {
        let command = Command::builder("GetOrder", || async { Ok(1_u32) }).build();

        assert_eq!(command.name(), "GetOrder");
        assert_eq!(command.group(), "GetOrder");
        assert_eq!(command.cache_key(), None);
        assert!(!command.is_cacheable());
        assert!(command.run_fallback().is_none());
        assert_eq!(command.run_primary().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_builder_with_everything() {
        let command = Command::builder("GetOrder", || async { Ok("primary") })
            .group("Orders")
            .fallback(|| async { Ok("fallback") })
            .cache_key("order-1")
            .build();

        assert_eq!(command.group(), "Orders");
        assert_eq!(command.cache_key(), Some("order-1"));
        assert!(command.is_cacheable());
        assert_eq!(command.run_fallback().unwrap().await.unwrap(), "fallback");
    }

    #[tokio::test]
    async fn test_command_is_reusable_across_calls() {
        let command = Command::builder("Counter", || async { Ok(7_i32) }).build();
        assert_eq!(command.run_primary().await.unwrap(), 7);
        assert_eq!(command.run_primary().await.unwrap(), 7);
    }
}
