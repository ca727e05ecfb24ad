// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Execution context
//!
//! A `Context` is one script execution environment: it owns its timer table,
//! its module templates and its allocation budget, and shares the read-only
//! module registry with every other context.

use super::clock::{Clock, SystemClock};
use super::timers::{TimerId, TimerPoll, TimerScheduler, DEFAULT_TIMER_CAPACITY};
use crate::config::RuntimeConfig;
use crate::error::{NativeError, Result};
use crate::globals;
use crate::module_system::{self, ModuleDescriptor, ModuleRegistry};
use crate::value::{Callable, ClassDef, Object, ObjectRef, Value};
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use std::sync::Arc;

/// Object allocation budget.
///
/// Every object and function created on behalf of script code is counted.
/// There is no collector, so the count only grows.
#[derive(Debug, Clone, Copy)]
struct HeapBudget {
    capacity: Option<usize>,
    allocated: usize,
}

impl HeapBudget {
    fn charge(&mut self) -> Result<()> {
        match self.capacity {
            Some(capacity) if self.allocated >= capacity => {
                Err(NativeError::OutOfMemory { capacity })
            }
            _ => {
                self.allocated += 1;
                Ok(())
            }
        }
    }
}

/// A script execution context
pub struct Context {
    registry: Arc<ModuleRegistry>,
    timers: TimerScheduler,
    clock: Arc<dyn Clock>,
    heap: HeapBudget,
    /// Module templates by registry index
    templates: FxHashMap<usize, ObjectRef>,
    /// Class prototypes keyed by `ClassDef` address; the `Arc` pins the address
    class_prototypes: FxHashMap<usize, (Arc<ClassDef>, ObjectRef)>,
    global: ObjectRef,
}

impl Context {
    /// Create a context with default settings and the system clock
    pub fn new(registry: Arc<ModuleRegistry>) -> Self {
        ContextBuilder::new(registry).build()
    }

    /// Create a context from runtime configuration
    pub fn with_config(registry: Arc<ModuleRegistry>, config: &RuntimeConfig) -> Self {
        ContextBuilder::new(registry)
            .timer_capacity(config.timer_capacity)
            .heap_capacity(config.heap_capacity)
            .build()
    }

    /// Start building a context
    pub fn builder(registry: Arc<ModuleRegistry>) -> ContextBuilder {
        ContextBuilder::new(registry)
    }

    /// The shared module registry
    pub fn registry(&self) -> &Arc<ModuleRegistry> {
        &self.registry
    }

    /// This context's timer table
    pub fn timers(&self) -> &TimerScheduler {
        &self.timers
    }

    /// This context's clock
    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Number of pending timers
    pub fn pending_timers(&self) -> usize {
        self.timers.pending()
    }

    /// Objects allocated so far
    pub fn heap_used(&self) -> usize {
        self.heap.allocated
    }

    /// Allocation limit, if any
    pub fn heap_capacity(&self) -> Option<usize> {
        self.heap.capacity
    }

    /// Allocate an object against the budget
    pub fn alloc(&mut self, object: Object) -> Result<ObjectRef> {
        self.heap.charge()?;
        Ok(Arc::new(RwLock::new(object)))
    }

    /// Allocate a function object against the budget
    pub fn alloc_function(&mut self, callable: Callable) -> Result<Value> {
        self.heap.charge()?;
        Ok(Value::Function(Arc::new(callable)))
    }

    /// Resolve a specifier and build a fresh module instance
    pub fn require(&mut self, specifier: &str) -> Result<ObjectRef> {
        module_system::require(self, specifier)
    }

    /// Resolve a specifier without instantiating it
    pub fn require_resolve(&self, specifier: &str) -> Result<&ModuleDescriptor> {
        module_system::require_resolve(&self.registry, specifier)
    }

    /// Schedule `callback` to run after `delay_ms` (negative counts as 0)
    pub fn set_timeout(&mut self, callback: &Value, delay_ms: i64) -> Result<TimerId> {
        let callback = callback.as_callable().cloned().ok_or_else(|| {
            NativeError::type_error(format!(
                "setTimeout callback must be a function, got {}",
                callback.type_of()
            ))
        })?;
        let now = self.clock.now_ms();
        self.timers.set_timeout(callback, delay_ms, now)
    }

    /// Cancel a pending timer; returns false if nothing was pending
    pub fn clear_timeout(&mut self, id: TimerId) -> bool {
        self.timers.clear_timeout(id)
    }

    /// Drain the timer table.
    ///
    /// Returns once no timer is pending. If a callback fails the drain stops
    /// and the error is returned; timers that had not fired stay pending.
    pub fn run_timers(&mut self) -> Result<()> {
        loop {
            let now = self.clock.now_ms();
            match self.timers.poll(now) {
                TimerPoll::Idle => return Ok(()),
                TimerPoll::Wait(delay) => {
                    tracing::trace!(?delay, "waiting for next timer");
                    self.clock.sleep(delay);
                }
                TimerPoll::Fire { id, callback } => {
                    tracing::debug!(timer = id.0, callback = callback.name(), "firing timer");
                    if let Err(err) = callback.call(self, &[]) {
                        tracing::warn!(
                            timer = id.0,
                            error = %err,
                            pending = self.timers.pending(),
                            "timer callback failed, drain aborted"
                        );
                        return Err(err);
                    }
                }
            }
        }
    }

    /// Call a function value
    pub fn call(&mut self, function: &Value, args: &[Value]) -> Result<Value> {
        match function.as_callable() {
            Some(callable) => Arc::clone(callable).call(self, args),
            None => Err(NativeError::type_error(format!(
                "{} is not a function",
                function
            ))),
        }
    }

    /// Construct an instance with `new`
    pub fn construct(&mut self, constructor: &Value, args: &[Value]) -> Result<Value> {
        let class = match constructor.as_callable().and_then(|c| c.class()) {
            Some(class) => Arc::clone(class),
            None => {
                return Err(NativeError::type_error(format!(
                    "{} is not a constructor",
                    constructor
                )));
            }
        };

        let prototype = self.class_prototype(&class)?;
        let instance = self.alloc(Object::with_class(class.name.as_str(), Some(prototype)))?;

        if let Some(initializer) = &class.initializer {
            let mut init_args = Vec::with_capacity(args.len() + 1);
            init_args.push(Value::Object(Arc::clone(&instance)));
            init_args.extend_from_slice(args);
            initializer(self, &init_args)?;
        }

        Ok(Value::Object(instance))
    }

    /// Read a global binding
    pub fn global(&self, name: &str) -> Option<Value> {
        self.global.read().get(name)
    }

    /// Call a global function by name
    pub fn call_global(&mut self, name: &str, args: &[Value]) -> Result<Value> {
        match self.global(name) {
            Some(function) => self.call(&function, args),
            None => Err(NativeError::type_error(format!("{} is not defined", name))),
        }
    }

    pub(crate) fn cached_template(&self, index: usize) -> Option<ObjectRef> {
        self.templates.get(&index).cloned()
    }

    pub(crate) fn cache_template(&mut self, index: usize, template: ObjectRef) {
        self.templates.insert(index, template);
    }

    /// Prototype shared by every instance of `class` in this context
    fn class_prototype(&mut self, class: &Arc<ClassDef>) -> Result<ObjectRef> {
        let key = Arc::as_ptr(class) as usize;
        if let Some((_, prototype)) = self.class_prototypes.get(&key) {
            return Ok(Arc::clone(prototype));
        }

        let mut prototype = Object::with_class(class.name.as_str(), None);
        for (name, func) in &class.methods {
            prototype.set(
                name.as_str(),
                Value::Function(Arc::new(Callable::Native {
                    name: name.clone(),
                    func: Arc::clone(func),
                })),
            );
        }
        let prototype = self.alloc(prototype)?;
        self.class_prototypes
            .insert(key, (Arc::clone(class), Arc::clone(&prototype)));
        Ok(prototype)
    }
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("modules", &self.registry.len())
            .field("timers", &self.timers)
            .field("heap", &self.heap)
            .finish()
    }
}

/// Builder for [`Context`]
pub struct ContextBuilder {
    registry: Arc<ModuleRegistry>,
    timer_capacity: usize,
    heap_capacity: Option<usize>,
    clock: Option<Arc<dyn Clock>>,
}

impl ContextBuilder {
    /// Start from defaults
    pub fn new(registry: Arc<ModuleRegistry>) -> Self {
        Self {
            registry,
            timer_capacity: DEFAULT_TIMER_CAPACITY,
            heap_capacity: None,
            clock: None,
        }
    }

    /// Timer slot count
    pub fn timer_capacity(mut self, capacity: usize) -> Self {
        self.timer_capacity = capacity;
        self
    }

    /// Object allocation limit (`None` for unbounded)
    pub fn heap_capacity(mut self, capacity: Option<usize>) -> Self {
        self.heap_capacity = capacity;
        self
    }

    /// Time source for the timer drain
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Build the context and install its globals.
    ///
    /// The global object and the global functions are not charged to the
    /// allocation budget.
    pub fn build(self) -> Context {
        let mut global = Object::with_class("global", None);
        globals::install(&mut global);

        Context {
            registry: self.registry,
            timers: TimerScheduler::with_capacity(self.timer_capacity),
            clock: self
                .clock
                .unwrap_or_else(|| Arc::new(SystemClock::new())),
            heap: HeapBudget {
                capacity: self.heap_capacity,
                allocated: 0,
            },
            templates: FxHashMap::default(),
            class_prototypes: FxHashMap::default(),
            global: Arc::new(RwLock::new(global)),
        }
    }
}
