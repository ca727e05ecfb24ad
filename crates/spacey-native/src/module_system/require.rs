// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! require() for native extension modules

use super::instantiate::instantiate;
use super::registry::{ModuleDescriptor, ModuleRegistry};
use super::resolver::{ModuleResolver, ResolveError};
use crate::error::{NativeError, Result};
use crate::runtime::Context;
use crate::value::ObjectRef;
use std::sync::Arc;

/// Resolve `specifier` and build a fresh instance of the selected module.
///
/// Instances are never cached: every successful call returns a new object.
pub fn require(cx: &mut Context, specifier: &str) -> Result<ObjectRef> {
    let registry = Arc::clone(cx.registry());
    let resolved = ModuleResolver::new(&registry)
        .resolve(specifier)
        .map_err(|err| not_found(err, specifier))?;
    instantiate(cx, resolved.index)
}

/// require.resolve() - the descriptor `require` would instantiate
pub fn require_resolve<'a>(
    registry: &'a ModuleRegistry,
    specifier: &str,
) -> Result<&'a ModuleDescriptor> {
    ModuleResolver::new(registry)
        .resolve(specifier)
        .map(|resolved| resolved.descriptor)
        .map_err(|err| not_found(err, specifier))
}

fn not_found(err: ResolveError, specifier: &str) -> NativeError {
    tracing::debug!(specifier, reason = %err, "require failed");
    err.into_not_found(specifier)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::ClassDef;

    #[test]
    fn test_require_resolve_merges_errors() {
        let registry = ModuleRegistry::new()
            .with_module("fs", (1, 4, 0), ClassDef::builder("fs").build())
            .unwrap();

        assert_eq!(require_resolve(&registry, "fs").unwrap().id(), "fs@1.4.0");
        for raw in ["fs@2", "fs@1.2.3.4", "@1", "", "nope"] {
            let err = require_resolve(&registry, raw).unwrap_err();
            assert_eq!(err.to_string(), format!("require {} failed: module not found.", raw));
        }
        let err = require_resolve(&registry, "fs @1").unwrap_err();
        assert_eq!(err.to_string(), "require <invalid> failed: module not found.");
    }
}
