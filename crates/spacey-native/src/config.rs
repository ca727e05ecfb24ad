// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Runtime configuration
//!
//! Sources, later ones winning: built-in defaults, a TOML file, then
//! `SPACEY_NATIVE_*` environment variables.

use crate::error::{NativeError, Result};
use crate::runtime::DEFAULT_TIMER_CAPACITY;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable prefix
pub const ENV_PREFIX: &str = "SPACEY_NATIVE_";

/// Configuration for contexts and the command-line tool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Timer slots per context
    pub timer_capacity: usize,

    /// Object allocation limit per context (unbounded when absent)
    pub heap_capacity: Option<usize>,

    /// Registry manifest to load
    pub registry: Option<PathBuf>,

    /// `tracing` filter directive
    pub log_filter: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            timer_capacity: DEFAULT_TIMER_CAPACITY,
            heap_capacity: None,
            registry: None,
            log_filter: "spacey_native=warn".to_string(),
        }
    }
}

impl RuntimeConfig {
    /// Defaults, then `path` if given, then the process environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.merge_env_with(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML file over the defaults
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse TOML over the defaults
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `SPACEY_NATIVE_*` overrides looked up through `lookup`
    pub fn merge_env_with<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        for key in ["timer_capacity", "heap_capacity", "registry", "log"] {
            let var = format!("{}{}", ENV_PREFIX, key.to_uppercase());
            if let Some(value) = lookup(&var) {
                tracing::trace!(%var, "configuration override");
                self.set(key, &value)?;
            }
        }
        Ok(())
    }

    /// Set a configuration value by key
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "timer_capacity" => self.timer_capacity = parse_count(key, value)?,
            "heap_capacity" => {
                self.heap_capacity = match value.trim() {
                    "" | "none" | "unlimited" => None,
                    _ => Some(parse_count(key, value)?),
                }
            }
            "registry" => self.registry = Some(PathBuf::from(value)),
            "log" | "log_filter" => self.log_filter = value.to_string(),
            _ => {
                return Err(NativeError::Config(format!(
                    "unknown configuration key '{}'",
                    key
                )));
            }
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.timer_capacity == 0 {
            return Err(NativeError::Config(
                "timer_capacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

fn parse_count(key: &str, value: &str) -> Result<usize> {
    value.trim().parse().map_err(|_| {
        NativeError::Config(format!("{} must be a non-negative integer, got '{}'", key, value))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = RuntimeConfig::default();
        assert_eq!(config.timer_capacity, 16);
        assert_eq!(config.heap_capacity, None);
        assert_eq!(config.log_filter, "spacey_native=warn");
    }

    #[test]
    fn test_file_then_env() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "timer_capacity = 4\nheap_capacity = 100").unwrap();

        let mut config = RuntimeConfig::from_file(file.path()).unwrap();
        assert_eq!(config.timer_capacity, 4);
        assert_eq!(config.heap_capacity, Some(100));

        let env: HashMap<&str, &str> = [
            ("SPACEY_NATIVE_TIMER_CAPACITY", "32"),
            ("SPACEY_NATIVE_HEAP_CAPACITY", "none"),
            ("SPACEY_NATIVE_LOG", "spacey_native=trace"),
        ]
        .into_iter()
        .collect();
        config
            .merge_env_with(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.timer_capacity, 32);
        assert_eq!(config.heap_capacity, None);
        assert_eq!(config.log_filter, "spacey_native=trace");
        assert_eq!(config.registry, None);
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(matches!(
            RuntimeConfig::from_toml_str("timer_capacity = 0"),
            Err(NativeError::Config(_))
        ));
        assert!(matches!(
            RuntimeConfig::from_toml_str("timer_capacity = \"many\""),
            Err(NativeError::Toml(_))
        ));

        let mut config = RuntimeConfig::default();
        assert!(config.set("timer_capacity", "-1").is_err());
        assert!(config.set("colour", "blue").is_err());
    }
}
