// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Error types for the native extension layer

use crate::value::Value;
use thiserror::Error;

/// Result type for native extension operations
pub type Result<T> = std::result::Result<T, NativeError>;

/// Errors that can occur while resolving modules or driving timers
#[derive(Debug, Error)]
pub enum NativeError {
    /// No registered module satisfies the specifier (or the specifier is malformed)
    #[error("require {0} failed: module not found.")]
    ModuleNotFound(String),

    /// Every timer slot is occupied
    #[error("too many timers")]
    TooManyTimers,

    /// Type error (wrong argument type)
    #[error("TypeError: {0}")]
    TypeError(String),

    /// The context's allocation budget is exhausted
    #[error("InternalError: out of memory (capacity {capacity} objects)")]
    OutOfMemory {
        /// Number of objects the context may allocate
        capacity: usize,
    },

    /// A value thrown by script or native code
    #[error("Uncaught {0}")]
    Thrown(Value),

    /// Invalid module registration
    #[error("Registry error: {0}")]
    Registry(String),

    /// Invalid registry manifest
    #[error("Manifest error: {0}")]
    Manifest(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// File system error
    #[error("File system error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing error
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// JSON parsing error
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

impl NativeError {
    /// Create a new TypeError
    pub fn type_error(msg: impl Into<String>) -> Self {
        Self::TypeError(msg.into())
    }

    /// Create a module not found error
    pub fn module_not_found(spec: impl Into<String>) -> Self {
        Self::ModuleNotFound(spec.into())
    }

    /// Wrap a thrown value
    pub fn thrown(value: impl Into<Value>) -> Self {
        Self::Thrown(value.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_message() {
        let err = NativeError::module_not_found("no.such.module");
        assert_eq!(
            err.to_string(),
            "require no.such.module failed: module not found."
        );
    }

    #[test]
    fn test_thrown_message() {
        let err = NativeError::thrown("boom");
        assert_eq!(err.to_string(), "Uncaught boom");
    }
}
