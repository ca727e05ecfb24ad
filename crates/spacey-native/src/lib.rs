// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! # spacey-native
//!
//! Versioned native-extension modules and cooperative timers for the Spacey
//! runtime.
//!
//! This crate provides:
//!
//! - A module registry holding several versions of each native module
//! - `require()` with version constraints (`net`, `net@1.2`, `net@>=1.2`, ...)
//! - Fresh module instances with one level of materialized constructors
//! - A fixed-capacity `setTimeout`/`clearTimeout` table per context
//! - A blocking timer drain that runs callbacks in-line
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use spacey_native::{ClassDef, Context, ModuleRegistry, Value};
//! use std::sync::Arc;
//!
//! let mut registry = ModuleRegistry::new();
//! registry.register(
//!     "system.network",
//!     (1, 2, 0),
//!     ClassDef::builder("system.network")
//!         .function("ping", |_cx, _args| Ok(Value::from("pong")))
//!         .class(ClassDef::builder("Socket").build())
//!         .build(),
//! )?;
//!
//! let mut cx = Context::new(Arc::new(registry));
//! let net = cx.require("system.network@>=1.0")?;
//! cx.call_global("setTimeout", &[callback, Value::from(10.0)])?;
//! cx.run_timers()?;
//! ```
//!
//! ## Registry Manifests
//!
//! Registries can also be declared in TOML or JSON, see [`module_system::manifest`].

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod globals;
pub mod module_system;
pub mod runtime;
pub mod value;

// Re-exports
pub use config::RuntimeConfig;
pub use error::{NativeError, Result};
pub use module_system::{
    ModuleDescriptor, ModuleRegistry, ResolveError, Specifier, SpecifierError, Version,
    VersionError,
};
pub use runtime::{Clock, Context, ContextBuilder, ManualClock, SystemClock, TimerId};
pub use value::{Callable, ClassDef, ExportEntry, NativeFn, Object, ObjectRef, Value};

/// Version of the spacey-native crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
