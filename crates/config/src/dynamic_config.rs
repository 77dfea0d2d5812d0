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

//! Dynamic string-keyed property map with YAML loading.

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::Duration;

use regex::Regex;
use thiserror::Error;

/// Config errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// YAML parsing error.
    #[error("failed to parse YAML config: {0}")]
    Yaml(#[from] serde_yaml::Error),
    /// Environment variable substitution error.
    #[error("environment variable substitution failed: {0}")]
    EnvSubstitution(String),
}

/// Runtime-mutable property map keyed by dotted paths.
///
/// Values are stored as strings and parsed on read; an unparsable value is
/// treated as absent so a typo in one tier falls through to the next.
///
/// ## Examples
/// ```rust
/// use cuirass_config::DynamicConfig;
///
/// let config = DynamicConfig::new()
///     .with_property("cuirass.default.circuitbreaker.enabled", "true");
/// assert_eq!(
///     config.get_bool("cuirass.default.circuitbreaker.enabled"),
///     Some(true)
/// );
/// ```
#[derive(Debug, Default)]
pub struct DynamicConfig {
    values: RwLock<HashMap<String, String>>,
}

impl DynamicConfig {
    /// Create an empty config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style property insertion, for construction and tests.
    pub fn with_property(self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_property(key, value);
        self
    }

    /// Parse a YAML document into dotted-path properties.
    ///
    /// Nested mappings flatten with `.` separators; scalar leaves become the
    /// property values. `${VAR}` and `${VAR:-default}` references are
    /// substituted from the process environment before parsing, so secrets
    /// and per-environment values stay out of the file.
    ///
    /// ## Errors
    /// - [`ConfigError::EnvSubstitution`] if a referenced variable is unset
    ///   and carries no default
    /// - [`ConfigError::Yaml`] if the document does not parse
    pub fn from_yaml_str(content: &str) -> Result<Self, ConfigError> {
        let substituted = substitute_env_vars(content)?;
        let root: serde_yaml::Value = serde_yaml::from_str(&substituted)?;
        let config = Self::new();
        {
            let mut values = config.values.write().unwrap_or_else(|e| e.into_inner());
            flatten_yaml("", &root, &mut values);
        }
        Ok(config)
    }

    /// Set one property; visible to every handle on its next read.
    pub fn set_property(&self, key: impl Into<String>, value: impl Into<String>) {
        let mut values = self.values.write().unwrap_or_else(|e| e.into_inner());
        values.insert(key.into(), value.into());
    }

    /// Remove one property, restoring fallback resolution for its key.
    pub fn remove_property(&self, key: &str) {
        let mut values = self.values.write().unwrap_or_else(|e| e.into_inner());
        values.remove(key);
    }

    /// Raw string value for `key`.
    pub fn get_raw(&self, key: &str) -> Option<String> {
        let values = self.values.read().unwrap_or_else(|e| e.into_inner());
        values.get(key).cloned()
    }

    /// Boolean value for `key`; unparsable values read as absent.
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.parse_value(key, |raw| raw.parse::<bool>().ok())
    }

    /// Integer value for `key`; unparsable values read as absent.
    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.parse_value(key, |raw| raw.parse::<i64>().ok())
    }

    /// Duration value for `key`, stored as whole milliseconds.
    pub fn get_duration_ms(&self, key: &str) -> Option<Duration> {
        self.parse_value(key, |raw| {
            raw.parse::<u64>().ok().map(Duration::from_millis)
        })
    }

    /// String value for `key`.
    pub fn get_string(&self, key: &str) -> Option<String> {
        self.get_raw(key)
    }

    fn parse_value<T>(&self, key: &str, parse: impl Fn(&str) -> Option<T>) -> Option<T> {
        let raw = self.get_raw(key)?;
        let parsed = parse(&raw);
        if parsed.is_none() {
            tracing::warn!(key, value = %raw, "ignoring unparsable config value");
        }
        parsed
    }
}

/// Substitute `${VAR}` and `${VAR:-default}` references from the process
/// environment.
fn substitute_env_vars(content: &str) -> Result<String, ConfigError> {
    // ${VAR} or ${VAR:-default}
    let pattern = Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)(?::-([^}]*))?\}")
        .map_err(|e| ConfigError::EnvSubstitution(e.to_string()))?;

    let mut failure: Option<String> = None;
    let substituted = pattern.replace_all(content, |caps: &regex::Captures<'_>| {
        let var = &caps[1];
        match std::env::var(var) {
            Ok(value) => value,
            Err(_) => match caps.get(2) {
                Some(default) => default.as_str().to_string(),
                None => {
                    failure.get_or_insert_with(|| {
                        format!("environment variable '{var}' is not set and has no default")
                    });
                    String::new()
                }
            },
        }
    });

    match failure {
        Some(message) => Err(ConfigError::EnvSubstitution(message)),
        None => Ok(substituted.into_owned()),
    }
}

fn flatten_yaml(prefix: &str, value: &serde_yaml::Value, out: &mut HashMap<String, String>) {
    match value {
        serde_yaml::Value::Mapping(mapping) => {
            for (key, nested) in mapping {
                let Some(key) = key.as_str() else { continue };
                let path = if prefix.is_empty() {
                    key.to_string()
                } else {
                    format!("{prefix}.{key}")
                };
                flatten_yaml(&path, nested, out);
            }
        }
        serde_yaml::Value::Null => {}
        serde_yaml::Value::Bool(b) => {
            out.insert(prefix.to_string(), b.to_string());
        }
        serde_yaml::Value::Number(n) => {
            out.insert(prefix.to_string(), n.to_string());
        }
        serde_yaml::Value::String(s) => {
            out.insert(prefix.to_string(), s.clone());
        }
        other => {
            tracing::warn!(key = prefix, ?other, "ignoring non-scalar config value");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_get_typed_values() {
        let config = DynamicConfig::new();
        config.set_property("cuirass.default.fallback.enabled", "false");
        config.set_property("cuirass.default.circuitbreaker.requestVolumeThreshold", "30");
        config.set_property(
            "cuirass.default.circuitbreaker.sleepWindowInMilliseconds",
            "2500",
        );

        assert_eq!(config.get_bool("cuirass.default.fallback.enabled"), Some(false));
        assert_eq!(
            config.get_i64("cuirass.default.circuitbreaker.requestVolumeThreshold"),
            Some(30)
        );
        assert_eq!(
            config.get_duration_ms("cuirass.default.circuitbreaker.sleepWindowInMilliseconds"),
            Some(Duration::from_millis(2500))
        );
    }

    #[test]
    fn test_missing_key_reads_as_none() {
        let config = DynamicConfig::new();
        assert_eq!(config.get_bool("no.such.key"), None);
        assert_eq!(config.get_string("no.such.key"), None);
    }

    #[test]
    fn test_unparsable_value_reads_as_none() {
        let config = DynamicConfig::new().with_property("cuirass.default.x", "not-a-number");
        assert_eq!(config.get_i64("cuirass.default.x"), None);
        assert_eq!(config.get_bool("cuirass.default.x"), None);
    }

    #[test]
    fn test_remove_property() {
        let config = DynamicConfig::new().with_property("a.b", "1");
        assert_eq!(config.get_i64("a.b"), Some(1));

        config.remove_property("a.b");
        assert_eq!(config.get_i64("a.b"), None);
    }

    #[test]
    fn test_yaml_flattens_nested_mappings() {
        let yaml = r#"
cuirass:
  default:
    circuitbreaker:
      enabled: true
      errorThresholdPercentage: 40
  GetOrder:
    circuitbreaker:
      enabled: false
"#;
        let config = DynamicConfig::from_yaml_str(yaml).unwrap();

        assert_eq!(
            config.get_bool("cuirass.default.circuitbreaker.enabled"),
            Some(true)
        );
        assert_eq!(
            config.get_i64("cuirass.default.circuitbreaker.errorThresholdPercentage"),
            Some(40)
        );
        assert_eq!(
            config.get_bool("cuirass.GetOrder.circuitbreaker.enabled"),
            Some(false)
        );
    }

    #[test]
    fn test_yaml_env_substitution_with_default() {
        let yaml = "cuirass:\n  default:\n    requestCache:\n      enabled: ${CUIRASS_TEST_UNSET_VAR:-false}\n";
        let config = DynamicConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(
            config.get_bool("cuirass.default.requestCache.enabled"),
            Some(false)
        );
    }

    #[test]
    fn test_yaml_env_substitution_missing_var_fails() {
        let yaml = "key: ${CUIRASS_TEST_DEFINITELY_UNSET}\n";
        let err = DynamicConfig::from_yaml_str(yaml).unwrap_err();
        assert!(matches!(err, ConfigError::EnvSubstitution(_)));
    }
}
