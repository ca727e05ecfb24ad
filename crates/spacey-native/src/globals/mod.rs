// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Global functions installed on every context
//!
//! Implements:
//! - `require` - load a native module by specifier
//! - `setTimeout` - defer a callback
//! - `clearTimeout` - cancel a deferred callback

pub mod timers;

use crate::error::{NativeError, Result};
use crate::runtime::Context;
use crate::value::{Callable, Object, Value};
use std::sync::Arc;

/// Install the global functions on `global`
pub fn install(global: &mut Object) {
    let functions: [(&str, fn(&mut Context, &[Value]) -> Result<Value>); 3] = [
        ("require", require),
        ("setTimeout", timers::set_timeout),
        ("clearTimeout", timers::clear_timeout),
    ];
    for (name, func) in functions {
        global.set(name, Value::Function(Arc::new(Callable::native(name, func))));
    }
}

/// require(specifier)
pub fn require(cx: &mut Context, args: &[Value]) -> Result<Value> {
    let specifier = args
        .first()
        .and_then(Value::as_str)
        .ok_or_else(|| NativeError::type_error("require expects a string"))?;
    cx.require(specifier).map(Value::Object)
}
