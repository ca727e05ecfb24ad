// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Specifier resolution against the module registry

use super::registry::{ModuleDescriptor, ModuleRegistry};
use super::specifier::{Specifier, SpecifierError};
use crate::error::NativeError;
use thiserror::Error;

/// Why a specifier did not resolve.
///
/// `require` reports both variants as the same "module not found" error; the
/// distinction is kept here for hosts and tests.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    /// The specifier did not parse
    #[error("malformed specifier: {0}")]
    Malformed(#[from] SpecifierError),

    /// Well-formed, but no registered version satisfies it
    #[error("no registered module satisfies '{0}'")]
    NotFound(String),
}

impl ResolveError {
    /// The error surfaced to script code for a failed `require(raw)`.
    pub fn into_not_found(self, raw: &str) -> NativeError {
        match self {
            ResolveError::Malformed(SpecifierError::Whitespace) => {
                NativeError::module_not_found("<invalid>")
            }
            _ => NativeError::module_not_found(raw),
        }
    }
}

/// A selected descriptor and its registration index
#[derive(Debug, Clone, Copy)]
pub struct ResolvedModule<'a> {
    /// Position in the registry
    pub index: usize,
    /// The selected descriptor
    pub descriptor: &'a ModuleDescriptor,
}

/// Selects the best registered module for a specifier
pub struct ModuleResolver<'a> {
    registry: &'a ModuleRegistry,
}

impl<'a> ModuleResolver<'a> {
    /// Create a resolver over a registry
    pub fn new(registry: &'a ModuleRegistry) -> Self {
        Self { registry }
    }

    /// Parse and resolve a raw specifier
    pub fn resolve(&self, raw: &str) -> Result<ResolvedModule<'a>, ResolveError> {
        let spec = Specifier::parse(raw)?;
        self.select(&spec)
            .ok_or_else(|| ResolveError::NotFound(spec.to_string()))
    }

    /// Highest version among descriptors whose base matches and whose version
    /// satisfies the constraint. Only a strictly greater version replaces the
    /// running best, so exact ties go to the earliest registration.
    pub fn select(&self, spec: &Specifier) -> Option<ResolvedModule<'a>> {
        let mut best: Option<ResolvedModule<'a>> = None;

        for (index, descriptor) in self.registry.iter().enumerate() {
            if descriptor.base != spec.base {
                continue;
            }
            if !spec.constraint.accepts(descriptor.version) {
                continue;
            }
            if best.is_none_or(|b| descriptor.version > b.descriptor.version) {
                best = Some(ResolvedModule { index, descriptor });
            }
        }

        match &best {
            Some(found) => tracing::debug!(
                specifier = %spec,
                module = %found.descriptor.id(),
                index = found.index,
                "resolved module"
            ),
            None => tracing::debug!(specifier = %spec, "no module satisfies specifier"),
        }

        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module_system::version::{Version, VersionError};
    use crate::value::ClassDef;

    fn registry(entries: &[(&str, (u16, u16, u16))]) -> ModuleRegistry {
        let mut registry = ModuleRegistry::new();
        for (base, version) in entries {
            registry
                .register(*base, *version, ClassDef::builder(*base).build())
                .unwrap();
        }
        registry
    }

    fn resolved_version(registry: &ModuleRegistry, raw: &str) -> Option<Version> {
        ModuleResolver::new(registry)
            .resolve(raw)
            .ok()
            .map(|r| r.descriptor.version)
    }

    #[test]
    fn test_latest_picks_max_version() {
        let reg = registry(&[
            ("net", (1, 2, 0)),
            ("net", (1, 10, 0)),
            ("fs", (9, 0, 0)),
            ("net", (1, 9, 9)),
        ]);
        assert_eq!(resolved_version(&reg, "net"), Some(Version::new(1, 10, 0)));
    }

    #[test]
    fn test_exact_tie_keeps_first_registered() {
        let reg = registry(&[("net", (1, 0, 0)), ("net", (1, 0, 0)), ("net", (0, 5, 0))]);
        let resolver = ModuleResolver::new(&reg);
        assert_eq!(resolver.resolve("net").unwrap().index, 0);
        assert_eq!(resolver.resolve("net@1").unwrap().index, 0);
        assert_eq!(resolver.resolve("net@<=1.0.0").unwrap().index, 0);
    }

    #[test]
    fn test_exact_match() {
        let reg = registry(&[("x", (1, 2, 3)), ("x", (1, 2, 4))]);
        assert_eq!(resolved_version(&reg, "x@1.2.3"), Some(Version::new(1, 2, 3)));
        assert_eq!(resolved_version(&reg, "x@1.2"), None);
    }

    #[test]
    fn test_range_operators() {
        let reg = registry(&[
            ("x", (0, 9, 0)),
            ("x", (1, 2, 0)),
            ("x", (1, 5, 0)),
            ("x", (2, 0, 0)),
        ]);
        assert_eq!(resolved_version(&reg, "x@>=1.2"), Some(Version::new(2, 0, 0)));
        assert_eq!(resolved_version(&reg, "x@<1.0.0"), Some(Version::new(0, 9, 0)));
        assert_eq!(resolved_version(&reg, "x@<2"), Some(Version::new(1, 5, 0)));
        assert_eq!(resolved_version(&reg, "x@<=1.2"), Some(Version::new(1, 2, 0)));
        assert_eq!(resolved_version(&reg, "x@>2"), None);
        assert_eq!(resolved_version(&reg, "x@>1.5"), Some(Version::new(2, 0, 0)));
    }

    #[test]
    fn test_malformed_is_distinguished_internally() {
        let reg = registry(&[("x", (1, 0, 0))]);
        let resolver = ModuleResolver::new(&reg);

        assert_eq!(
            resolver.resolve("x @1.0").unwrap_err(),
            ResolveError::Malformed(SpecifierError::Whitespace)
        );
        assert_eq!(
            resolver.resolve("x@99999").unwrap_err(),
            ResolveError::Malformed(SpecifierError::Version(VersionError::Overflow(0)))
        );
        assert_eq!(
            resolver.resolve("x@2").unwrap_err(),
            ResolveError::NotFound("x@2.0.0".to_string())
        );
        assert_eq!(
            resolver.resolve("y").unwrap_err(),
            ResolveError::NotFound("y".to_string())
        );
    }

    #[test]
    fn test_merged_not_found_message() {
        let err = ResolveError::Malformed(SpecifierError::Whitespace).into_not_found("x @1");
        assert_eq!(err.to_string(), "require <invalid> failed: module not found.");

        let err = ResolveError::NotFound("x@2.0.0".to_string()).into_not_found("x@2");
        assert_eq!(err.to_string(), "require x@2 failed: module not found.");
    }
}
