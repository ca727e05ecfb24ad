// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Versioned native module resolution
//!
//! ## Specifiers
//! - `base` - the highest registered version
//! - `base@1.2.3` - exactly that version (`1.2` means `1.2.0`)
//! - `base@>=1.2`, `base@>1`, `base@<=2.0`, `base@<2` - the highest version
//!   satisfying the comparison
//!
//! ## Instances
//! Each `require` builds a new instance. Plain values and functions live on a
//! per-context template prototype; constructible exports become own
//! constructor properties of the instance.

mod instantiate;
pub mod manifest;
mod registry;
mod require;
mod resolver;
mod specifier;
mod version;

pub use instantiate::{instantiate, materialize};
pub use manifest::{load_registry, RegistryManifest};
pub use registry::{ModuleDescriptor, ModuleRegistry};
pub use require::{require, require_resolve};
pub use resolver::{ModuleResolver, ResolveError, ResolvedModule};
pub use specifier::{Constraint, Specifier, SpecifierError, VersionOp, MAX_BASE_LEN};
pub use version::{Version, VersionError};
