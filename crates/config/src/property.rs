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

//! Typed chained property handles.
//!
//! A handle resolves `prefix.<command>.<leaf>`, then `prefix.default.<leaf>`,
//! then its hard-coded default, on every read, so configuration changes take
//! effect without re-creating the handle.

use std::sync::Arc;
use std::time::Duration;

use crate::DynamicConfig;

/// Property prefix used when the config carries no override.
pub const DEFAULT_PROPERTY_PREFIX: &str = "cuirass";

/// Config key holding the property prefix itself.
const PREFIX_KEY: &str = "cuirass.config.prefix";

macro_rules! chained_property {
    ($(#[$doc:meta])* $name:ident, $value:ty, $getter:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone)]
        pub struct $name {
            config: Arc<DynamicConfig>,
            command_key: String,
            default_key: String,
            fallback: $value,
        }

        impl $name {
            /// Resolve the property: per-command value, then the `default`
            /// tier, then the hard-coded fallback.
            pub fn get(&self) -> $value {
                self.config
                    .$getter(&self.command_key)
                    .or_else(|| self.config.$getter(&self.default_key))
                    .unwrap_or_else(|| self.fallback.clone())
            }
        }
    };
}

chained_property!(
    /// Chained boolean property.
    BoolProperty,
    bool,
    get_bool
);
chained_property!(
    /// Chained integer property.
    IntProperty,
    i64,
    get_i64
);
chained_property!(
    /// Chained duration property, stored as whole milliseconds.
    DurationProperty,
    Duration,
    get_duration_ms
);
chained_property!(
    /// Chained string property.
    StringProperty,
    String,
    get_string
);

/// Creates typed chained property handles for one config.
///
/// ## Examples
/// ```rust
/// use std::sync::Arc;
/// use cuirass_config::{DynamicConfig, PropertyFactory};
///
/// let config = Arc::new(
///     DynamicConfig::new().with_property("cuirass.default.fallback.enabled", "false"),
/// );
/// let factory = PropertyFactory::new(config);
/// let enabled = factory.bool_property("GetOrder", "fallback.enabled", true);
/// assert!(!enabled.get());
/// ```
#[derive(Debug, Clone)]
pub struct PropertyFactory {
    config: Arc<DynamicConfig>,
    prefix: String,
}

impl PropertyFactory {
    /// Create a factory; the prefix is read once from
    /// `cuirass.config.prefix` (default `cuirass`).
    pub fn new(config: Arc<DynamicConfig>) -> Self {
        let prefix = config
            .get_string(PREFIX_KEY)
            .unwrap_or_else(|| DEFAULT_PROPERTY_PREFIX.to_string());
        Self { config, prefix }
    }

    /// The resolved property prefix.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// The underlying config.
    pub fn config(&self) -> &Arc<DynamicConfig> {
        &self.config
    }

    fn keys(&self, command: &str, leaf: &str) -> (String, String) {
        (
            format!("{}.{}.{}", self.prefix, command, leaf),
            format!("{}.default.{}", self.prefix, leaf),
        )
    }

    /// Boolean property handle for `command` and `leaf`.
    pub fn bool_property(&self, command: &str, leaf: &str, fallback: bool) -> BoolProperty {
        let (command_key, default_key) = self.keys(command, leaf);
        BoolProperty {
            config: self.config.clone(),
            command_key,
            default_key,
            fallback,
        }
    }

    /// Integer property handle for `command` and `leaf`.
    pub fn int_property(&self, command: &str, leaf: &str, fallback: i64) -> IntProperty {
        let (command_key, default_key) = self.keys(command, leaf);
        IntProperty {
            config: self.config.clone(),
            command_key,
            default_key,
            fallback,
        }
    }

    /// Duration property handle for `command` and `leaf` (milliseconds).
    pub fn duration_property(
        &self,
        command: &str,
        leaf: &str,
        fallback: Duration,
    ) -> DurationProperty {
        let (command_key, default_key) = self.keys(command, leaf);
        DurationProperty {
            config: self.config.clone(),
            command_key,
            default_key,
            fallback,
        }
    }

    /// String property handle for `command` and `leaf`.
    pub fn string_property(&self, command: &str, leaf: &str, fallback: &str) -> StringProperty {
        let (command_key, default_key) = self.keys(command, leaf);
        StringProperty {
            config: self.config.clone(),
            command_key,
            default_key,
            fallback: fallback.to_string(),
        }
    }
}
