// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! The module registry: every native module the host makes requirable

use super::specifier::MAX_BASE_LEN;
use super::version::Version;
use crate::error::{NativeError, Result};
use crate::value::ClassDef;
use std::sync::Arc;

/// A registered module
#[derive(Debug, Clone)]
pub struct ModuleDescriptor {
    /// Base name used in specifiers
    pub base: String,
    /// Registered version
    pub version: Version,
    /// Export surface instantiated by `require`
    pub surface: Arc<ClassDef>,
}

impl ModuleDescriptor {
    /// `base@major.minor.patch`
    pub fn id(&self) -> String {
        format!("{}@{}", self.base, self.version)
    }
}

/// Ordered list of module descriptors.
///
/// Order only matters when two descriptors share both base name and version:
/// the one registered first wins resolution.
#[derive(Debug, Clone, Default)]
pub struct ModuleRegistry {
    modules: Vec<ModuleDescriptor>,
}

impl ModuleRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a module version
    pub fn register(
        &mut self,
        base: impl Into<String>,
        version: impl Into<Version>,
        surface: Arc<ClassDef>,
    ) -> Result<()> {
        let base = base.into();
        validate_base(&base)?;

        let descriptor = ModuleDescriptor {
            base,
            version: version.into(),
            surface,
        };
        tracing::trace!(module = %descriptor.id(), "registered module");
        self.modules.push(descriptor);
        Ok(())
    }

    /// Builder-style [`register`](Self::register)
    pub fn with_module(
        mut self,
        base: impl Into<String>,
        version: impl Into<Version>,
        surface: Arc<ClassDef>,
    ) -> Result<Self> {
        self.register(base, version, surface)?;
        Ok(self)
    }

    /// Get a descriptor by registration index
    pub fn get(&self, index: usize) -> Option<&ModuleDescriptor> {
        self.modules.get(index)
    }

    /// Iterate descriptors in registration order
    pub fn iter(&self) -> impl Iterator<Item = &ModuleDescriptor> {
        self.modules.iter()
    }

    /// Registered versions of `base`, in registration order
    pub fn versions_of(&self, base: &str) -> Vec<Version> {
        self.modules
            .iter()
            .filter(|m| m.base == base)
            .map(|m| m.version)
            .collect()
    }

    /// Distinct base names, in order of first registration
    pub fn bases(&self) -> Vec<&str> {
        let mut bases: Vec<&str> = Vec::new();
        for module in &self.modules {
            if !bases.contains(&module.base.as_str()) {
                bases.push(&module.base);
            }
        }
        bases
    }

    /// Number of registered descriptors
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

/// Base names must be usable in every specifier form, including `base@version`.
fn validate_base(base: &str) -> Result<()> {
    if base.is_empty() {
        return Err(NativeError::Registry("module name is empty".to_string()));
    }
    if base.len() >= MAX_BASE_LEN {
        return Err(NativeError::Registry(format!(
            "module name is {} bytes long (limit {})",
            base.len(),
            MAX_BASE_LEN
        )));
    }
    if base.bytes().any(|b| b <= b' ' || b == b'@') {
        return Err(NativeError::Registry(format!(
            "module name '{}' contains whitespace or '@'",
            base.escape_debug()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn surface(name: &str) -> Arc<ClassDef> {
        ClassDef::builder(name).build()
    }

    #[test]
    fn test_register_and_query() {
        let mut registry = ModuleRegistry::new();
        registry.register("net", (1, 0, 0), surface("net")).unwrap();
        registry.register("fs", (0, 1, 0), surface("fs")).unwrap();
        registry.register("net", (2, 1, 0), surface("net")).unwrap();

        assert_eq!(registry.len(), 3);
        assert_eq!(registry.bases(), vec!["net", "fs"]);
        assert_eq!(
            registry.versions_of("net"),
            vec![Version::new(1, 0, 0), Version::new(2, 1, 0)]
        );
        assert_eq!(registry.get(2).map(ModuleDescriptor::id), Some("net@2.1.0".to_string()));
    }

    #[test]
    fn test_register_rejects_unrequirable_names() {
        let mut registry = ModuleRegistry::new();
        assert!(registry.register("", (1, 0, 0), surface("x")).is_err());
        assert!(registry.register("a b", (1, 0, 0), surface("x")).is_err());
        assert!(registry.register("a@1", (1, 0, 0), surface("x")).is_err());
        assert!(
            registry
                .register("a".repeat(MAX_BASE_LEN), (1, 0, 0), surface("x"))
                .is_err()
        );
        assert!(registry.is_empty());
    }
}
