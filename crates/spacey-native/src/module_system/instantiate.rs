// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Module instantiation
//!
//! An instance is a fresh object whose prototype is the context's template
//! for the module. The template holds the surface's plain values and
//! functions; constructible exports are written onto each instance as own
//! constructor properties, one level deep.

use super::registry::ModuleDescriptor;
use crate::error::{NativeError, Result};
use crate::runtime::Context;
use crate::value::{Callable, ClassDef, ExportEntry, Object, ObjectRef, Value};
use std::sync::Arc;

/// Build a new instance of the module registered at `index`
pub fn instantiate(cx: &mut Context, index: usize) -> Result<ObjectRef> {
    let registry = Arc::clone(cx.registry());
    let descriptor = registry.get(index).ok_or_else(|| {
        NativeError::Registry(format!("no module registered at index {}", index))
    })?;

    let template = module_template(cx, index, descriptor)?;
    let instance = cx.alloc(Object::with_class(descriptor.base.as_str(), Some(template)))?;
    materialize(cx, &instance, &descriptor.surface)?;

    tracing::trace!(module = %descriptor.id(), "instantiated module");
    Ok(instance)
}

/// Write a constructor property onto `instance` for every constructible
/// export of `surface`. Exports nested inside those classes are left alone.
pub fn materialize(cx: &mut Context, instance: &ObjectRef, surface: &ClassDef) -> Result<()> {
    for (name, class) in surface.constructible_exports() {
        let constructor = cx.alloc_function(Callable::Constructor(Arc::clone(class)))?;
        instance.write().set(name, constructor);
    }
    Ok(())
}

fn module_template(
    cx: &mut Context,
    index: usize,
    descriptor: &ModuleDescriptor,
) -> Result<ObjectRef> {
    if let Some(template) = cx.cached_template(index) {
        return Ok(template);
    }

    let mut template = Object::with_class(descriptor.base.as_str(), None);
    for (name, entry) in &descriptor.surface.members {
        match entry {
            ExportEntry::Value(value) => template.set(name.as_str(), value.clone()),
            ExportEntry::Function(func) => template.set(
                name.as_str(),
                Value::Function(Arc::new(Callable::Native {
                    name: name.clone(),
                    func: Arc::clone(func),
                })),
            ),
            ExportEntry::Class(_) => {}
        }
    }

    let template = cx.alloc(template)?;
    cx.cache_template(index, Arc::clone(&template));
    Ok(template)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module_system::ModuleRegistry;

    fn context(heap_capacity: Option<usize>) -> Context {
        let nested = ClassDef::builder("Deep").build();
        let socket = ClassDef::builder("Socket").class(nested).build();
        let surface = ClassDef::builder("net")
            .value("PORT", 80.0)
            .function("ping", |_cx, _args| Ok(Value::from("pong")))
            .class(socket)
            .class(ClassDef::builder("Server").build())
            .build();
        let registry = ModuleRegistry::new()
            .with_module("net", (1, 0, 0), surface)
            .unwrap();
        Context::builder(Arc::new(registry))
            .heap_capacity(heap_capacity)
            .build()
    }

    #[test]
    fn test_instance_layout() {
        let mut cx = context(None);
        let instance = instantiate(&mut cx, 0).unwrap();
        let obj = instance.read();

        assert_eq!(obj.keys(), vec!["Server".to_string(), "Socket".to_string()]);
        assert_eq!(obj.get("PORT"), Some(Value::from(80.0)));
        assert!(obj.get("ping").is_some_and(|v| v.is_function()));
        assert!(!obj.has("Deep"));
    }

    #[test]
    fn test_template_shared_constructors_fresh() {
        let mut cx = context(None);
        let a = instantiate(&mut cx, 0).unwrap();
        let b = instantiate(&mut cx, 0).unwrap();

        assert!(!Arc::ptr_eq(&a, &b));
        let (pa, pb) = (a.read().prototype.clone().unwrap(), b.read().prototype.clone().unwrap());
        assert!(Arc::ptr_eq(&pa, &pb));
        assert_ne!(a.read().get("Socket"), b.read().get("Socket"));
        // One template, then an instance and two constructors per call
        assert_eq!(cx.heap_used(), 7);
    }

    #[test]
    fn test_allocation_failures_propagate() {
        // Template fits, instance does not
        let mut cx = context(Some(1));
        assert!(matches!(
            instantiate(&mut cx, 0),
            Err(NativeError::OutOfMemory { capacity: 1 })
        ));

        // Instance fits, second constructor does not
        let mut cx = context(Some(3));
        assert!(matches!(
            instantiate(&mut cx, 0),
            Err(NativeError::OutOfMemory { capacity: 3 })
        ));
    }

    #[test]
    fn test_unknown_index() {
        let mut cx = context(None);
        assert!(matches!(instantiate(&mut cx, 9), Err(NativeError::Registry(_))));
    }
}
