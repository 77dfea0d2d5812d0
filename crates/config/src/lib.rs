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

//! # Cuirass Config
//!
//! ## Purpose
//! Name-indexed typed property lookup for the Cuirass runtime:
//! - [`DynamicConfig`]: a string-keyed property map, loadable from YAML with
//!   `${VAR}` / `${VAR:-default}` environment substitution, mutable at
//!   runtime so operators can flip breaker properties without restarts
//! - [`PropertyFactory`] and the typed handles ([`BoolProperty`],
//!   [`IntProperty`], [`DurationProperty`], [`StringProperty`]): chained
//!   lookup resolving `prefix.<command>.<leaf>`, then
//!   `prefix.default.<leaf>`, then a hard-coded default, on every read
//!
//! ## Design Principles
//! 1. **Dynamic**: handles hold keys, not values; a config change is visible
//!    on the next `get()`
//! 2. **Chained**: per-command overrides always win over the `default` tier
//! 3. **Forgiving**: an unparsable value logs a warning and falls through to
//!    the next tier instead of failing the call path

#![warn(missing_docs)]
#![warn(clippy::all)]

mod dynamic_config;
mod property;

pub use dynamic_config::{ConfigError, DynamicConfig};
pub use property::{
    BoolProperty, DurationProperty, IntProperty, PropertyFactory, StringProperty,
    DEFAULT_PROPERTY_PREFIX,
};
