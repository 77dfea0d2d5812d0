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

//! Non-blocking bounded-concurrency gate.
//!
//! ## Purpose
//! Limits the number of dependency calls in flight per command group. The
//! design is strictly fail-fast: there is no blocking acquire, a full gate
//! rejects immediately.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::{OwnedSemaphorePermit, Semaphore, TryAcquireError};

/// Bounded permit gate with try-acquire semantics.
///
/// Permits are RAII: dropping a [`GatePermit`] releases its slot, so a gate
/// can never be over-released.
#[derive(Debug, Clone)]
pub struct ConcurrencyGate {
    semaphore: Arc<Semaphore>,
    capacity: usize,
}

/// A held concurrency slot; the slot frees when this is dropped.
#[derive(Debug)]
pub struct GatePermit {
    _permit: OwnedSemaphorePermit,
}

impl ConcurrencyGate {
    /// Create a gate admitting at most `capacity` concurrent holders.
    pub fn new(capacity: usize) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
            capacity,
        }
    }

    /// Acquire a permit if one is free, without waiting.
    pub fn try_acquire(&self) -> Option<GatePermit> {
        match self.semaphore.clone().try_acquire_owned() {
            Ok(permit) => Some(GatePermit { _permit: permit }),
            Err(TryAcquireError::NoPermits) | Err(TryAcquireError::Closed) => None,
        }
    }

    /// Maximum number of concurrent holders.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of permits currently held.
    pub fn held(&self) -> usize {
        self.capacity.saturating_sub(self.semaphore.available_permits())
    }
}

/// Provides one [`ConcurrencyGate`] per group name.
///
/// When a gate is requested with a capacity different from the stored one,
/// a fresh gate replaces it: configuration changes take effect immediately
/// and outstanding holders drain into the abandoned gate.
#[derive(Debug, Default)]
pub struct GateFactory {
    gates: Mutex<HashMap<String, ConcurrencyGate>>,
}

impl GateFactory {
    /// Create an empty factory.
    pub fn new() -> Self {
        Self::default()
    }

    /// The gate for `group`, created (or replaced on capacity change) with
    /// `capacity` slots.
    pub fn get(&self, group: &str, capacity: usize) -> ConcurrencyGate {
        let mut gates = self.gates.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(gate) = gates.get(group) {
            if gate.capacity() == capacity {
                return gate.clone();
            }
            tracing::debug!(group, capacity, "replacing concurrency gate with new capacity");
        }
        let gate = ConcurrencyGate::new(capacity);
        gates.insert(group.to_string(), gate.clone());
        gate
    }
}
