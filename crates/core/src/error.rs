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

//! Error types for command execution.

use std::any::Any;
use std::sync::Arc;

/// Result of executing a command through the executor.
pub type CommandResult<T> = Result<T, CommandError>;

/// Error returned from command execution.
///
/// The sentinel variants describe what the isolation envelope did to the
/// call; [`CommandError::Failure`] carries whatever the dependency itself
/// returned. The whole type is cheap to clone so cached responses can be
/// replayed verbatim within a request scope.
#[derive(Debug, Clone, thiserror::Error)]
pub enum CommandError {
    /// The circuit breaker denied the call (or a trial call failed).
    #[error("circuit open")]
    CircuitOpen,

    /// The command has no fallback configured.
    #[error("fallback not implemented")]
    FallbackNotImplemented,

    /// The concurrency gate for the command's group was full.
    #[error("semaphore rejected")]
    SemaphoreRejected,

    /// The call exceeded its configured deadline.
    #[error("execution deadline exceeded")]
    DeadlineExceeded,

    /// The primary or fallback panicked with an uninterpretable payload.
    #[error("unknown panic")]
    UnknownPanic,

    /// The dependency returned an error of its own.
    #[error("{0}")]
    Failure(Arc<anyhow::Error>),
}

impl CommandError {
    /// Wrap a dependency error.
    pub fn failure(err: impl Into<anyhow::Error>) -> Self {
        CommandError::Failure(Arc::new(err.into()))
    }

    /// Classify an error returned by a primary or fallback action: sentinel
    /// errors pass through (so an action observing its own cancellation can
    /// surface [`CommandError::DeadlineExceeded`]), anything else is a
    /// dependency failure.
    pub(crate) fn from_dependency(err: anyhow::Error) -> Self {
        match err.downcast::<CommandError>() {
            Ok(sentinel) => sentinel,
            Err(other) => CommandError::Failure(Arc::new(other)),
        }
    }

    /// Convert an unwind payload into an error: a panic message string is
    /// carried as a failure, a panicked `CommandError` passes through, and
    /// anything else maps to [`CommandError::UnknownPanic`].
    pub(crate) fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        if let Some(err) = payload.downcast_ref::<CommandError>() {
            err.clone()
        } else if let Some(message) = payload.downcast_ref::<&'static str>() {
            CommandError::failure(anyhow::anyhow!(*message))
        } else if let Some(message) = payload.downcast_ref::<String>() {
            CommandError::failure(anyhow::anyhow!(message.clone()))
        } else {
            CommandError::UnknownPanic
        }
    }
}

/// Sentinels compare by variant; failures compare by rendered message.
impl PartialEq for CommandError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (CommandError::CircuitOpen, CommandError::CircuitOpen)
            | (CommandError::FallbackNotImplemented, CommandError::FallbackNotImplemented)
            | (CommandError::SemaphoreRejected, CommandError::SemaphoreRejected)
            | (CommandError::DeadlineExceeded, CommandError::DeadlineExceeded)
            | (CommandError::UnknownPanic, CommandError::UnknownPanic) => true,
            (CommandError::Failure(a), CommandError::Failure(b)) => {
                a.to_string() == b.to_string()
            }
            _ => false,
        }
    }
}

impl Eq for CommandError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_displays_inner_message() {
        let err = CommandError::failure(anyhow::anyhow!("connection refused"));
        assert_eq!(err.to_string(), "connection refused");
    }

    #[test]
    fn test_from_dependency_passes_sentinels_through() {
        let err = CommandError::from_dependency(anyhow::Error::new(CommandError::DeadlineExceeded));
        assert_eq!(err, CommandError::DeadlineExceeded);

        let err = CommandError::from_dependency(anyhow::anyhow!("boom"));
        assert_eq!(err, CommandError::failure(anyhow::anyhow!("boom")));
    }

    #[test]
    fn test_from_panic_string_payloads() {
        let err = CommandError::from_panic(Box::new("static panic"));
        assert_eq!(err.to_string(), "static panic");

        let err = CommandError::from_panic(Box::new(String::from("owned panic")));
        assert_eq!(err.to_string(), "owned panic");
    }

    #[test]
    fn test_from_panic_other_payloads_are_unknown() {
        let err = CommandError::from_panic(Box::new(42_u32));
        assert_eq!(err, CommandError::UnknownPanic);
    }

    #[test]
    fn test_equality_by_variant_and_message() {
        assert_eq!(CommandError::CircuitOpen, CommandError::CircuitOpen);
        assert_ne!(CommandError::CircuitOpen, CommandError::UnknownPanic);
        assert_eq!(
            CommandError::failure(anyhow::anyhow!("x")),
            CommandError::failure(anyhow::anyhow!("x"))
        );
        assert_ne!(
            CommandError::failure(anyhow::anyhow!("x")),
            CommandError::failure(anyhow::anyhow!("y"))
        );
    }
}
