// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Declarative registry manifests
//!
//! A manifest lists module versions and the shape of their export surfaces:
//!
//! ```toml
//! [[module]]
//! name = "system.network"
//! version = "1.2"
//! functions = ["ping"]
//! values = { PROTOCOL = "tcp", PORT = 80 }
//!
//! [[module.classes]]
//! name = "Socket"
//! methods = ["send", "close"]
//! ```
//!
//! Functions and methods declared this way are inert and return `undefined`;
//! a manifest describes surfaces for inspection and tooling, the host still
//! registers real implementations programmatically.

use super::registry::ModuleRegistry;
use super::version::Version;
use crate::error::{NativeError, Result};
use crate::runtime::Context;
use crate::value::{ClassBuilder, ClassDef, Value};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

/// A parsed registry manifest
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegistryManifest {
    /// Module entries, in registration order
    #[serde(default, rename = "module")]
    pub modules: Vec<ModuleEntry>,
}

/// One `[[module]]` table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleEntry {
    /// Base name
    pub name: String,
    /// `MAJOR[.MINOR[.PATCH]]`
    pub version: String,
    /// Function exports
    #[serde(default)]
    pub functions: Vec<String>,
    /// Plain value exports
    #[serde(default)]
    pub values: BTreeMap<String, ManifestValue>,
    /// Constructible exports
    #[serde(default)]
    pub classes: Vec<ClassEntry>,
}

/// A constructible export
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassEntry {
    /// Class name
    pub name: String,
    /// Prototype methods
    #[serde(default)]
    pub methods: Vec<String>,
    /// Static functions
    #[serde(default)]
    pub functions: Vec<String>,
    /// Nested classes
    #[serde(default)]
    pub classes: Vec<ClassEntry>,
}

/// A literal value export
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ManifestValue {
    /// Boolean literal
    Bool(bool),
    /// Numeric literal
    Number(f64),
    /// String literal
    String(String),
}

impl From<&ManifestValue> for Value {
    fn from(value: &ManifestValue) -> Self {
        match value {
            ManifestValue::Bool(b) => Value::Boolean(*b),
            ManifestValue::Number(n) => Value::Number(*n),
            ManifestValue::String(s) => Value::String(s.clone()),
        }
    }
}

fn inert(_cx: &mut Context, _args: &[Value]) -> Result<Value> {
    Ok(Value::Undefined)
}

impl RegistryManifest {
    /// Parse a TOML manifest
    pub fn from_toml_str(source: &str) -> Result<Self> {
        Ok(toml::from_str(source)?)
    }

    /// Parse a JSON manifest
    pub fn from_json_str(source: &str) -> Result<Self> {
        Ok(serde_json::from_str(source)?)
    }

    /// Load a manifest file; `.json` files are JSON, everything else TOML
    pub fn load(path: &Path) -> Result<Self> {
        let source = std::fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json_str(&source),
            _ => Self::from_toml_str(&source),
        }
    }

    /// Build a registry from the declared modules
    pub fn into_registry(self) -> Result<ModuleRegistry> {
        let mut registry = ModuleRegistry::new();
        for entry in &self.modules {
            let version = Version::parse(&entry.version).map_err(|e| {
                NativeError::Manifest(format!(
                    "module '{}': invalid version '{}': {}",
                    entry.name, entry.version, e
                ))
            })?;
            registry.register(entry.name.as_str(), version, entry.surface())?;
        }
        Ok(registry)
    }
}

impl ModuleEntry {
    fn surface(&self) -> Arc<ClassDef> {
        let mut builder = ClassDef::builder(self.name.as_str());
        for name in &self.functions {
            builder = builder.function(name.as_str(), inert);
        }
        for (name, value) in &self.values {
            builder = builder.value(name.as_str(), value);
        }
        add_classes(builder, &self.classes).build()
    }
}

impl ClassEntry {
    fn class(&self) -> Arc<ClassDef> {
        let mut builder = ClassDef::builder(self.name.as_str());
        for name in &self.methods {
            builder = builder.method(name.as_str(), inert);
        }
        for name in &self.functions {
            builder = builder.function(name.as_str(), inert);
        }
        add_classes(builder, &self.classes).build()
    }
}

fn add_classes(mut builder: ClassBuilder, classes: &[ClassEntry]) -> ClassBuilder {
    for class in classes {
        builder = builder.class(class.class());
    }
    builder
}

/// Load a manifest file straight into a registry
pub fn load_registry(path: &Path) -> Result<ModuleRegistry> {
    RegistryManifest::load(path)?.into_registry()
}
