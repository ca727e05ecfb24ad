// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Host-side values exchanged with native extension modules.
//!
//! This is not an engine value model. It carries just enough structure to
//! describe export surfaces, constructible types, timer callbacks and module
//! instances, and it keeps the engine's conventions (`typeof`, identity
//! equality for objects and functions, prototype lookup).

use crate::error::{NativeError, Result};
use crate::runtime::Context;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use std::fmt;
use std::sync::Arc;

/// Shared, mutable object handle
pub type ObjectRef = Arc<RwLock<Object>>;

/// A native (Rust) function callable from script code.
pub type NativeFn = Arc<dyn Fn(&mut Context, &[Value]) -> Result<Value> + Send + Sync>;

/// A script-visible value.
#[derive(Debug, Clone)]
pub enum Value {
    /// undefined
    Undefined,
    /// null
    Null,
    /// Boolean value
    Boolean(bool),
    /// Number (IEEE 754 double)
    Number(f64),
    /// String
    String(String),
    /// Object reference
    Object(ObjectRef),
    /// Function or constructor reference
    Function(Arc<Callable>),
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) => true,
            (Value::Null, Value::Null) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            // NaN != NaN falls out of f64 equality
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => Arc::ptr_eq(a, b),
            (Value::Function(a), Value::Function(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl Value {
    /// Returns true if this value can be called.
    pub fn is_function(&self) -> bool {
        matches!(self, Value::Function(_))
    }

    /// Returns the callable behind a function value.
    pub fn as_callable(&self) -> Option<&Arc<Callable>> {
        match self {
            Value::Function(callable) => Some(callable),
            _ => None,
        }
    }

    /// Returns the object behind an object value.
    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Object(obj) => Some(obj),
            _ => None,
        }
    }

    /// Returns the string contents of a string value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the type of this value as a string.
    pub fn type_of(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null => "object",
            Value::Boolean(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Object(_) => "object",
            Value::Function(_) => "function",
        }
    }

    /// Looks up a property, walking the prototype chain of objects.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.as_object().and_then(|obj| obj.read().get(key))
    }
}

impl Default for Value {
    fn default() -> Self {
        Value::Undefined
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<ObjectRef> for Value {
    fn from(obj: ObjectRef) -> Self {
        Value::Object(obj)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => write!(f, "undefined"),
            Value::Null => write!(f, "null"),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Number(n) => write!(f, "{}", n),
            Value::String(s) => write!(f, "{}", s),
            Value::Object(obj) => match &obj.read().class_name {
                Some(name) => write!(f, "[object {}]", name),
                None => write!(f, "[object Object]"),
            },
            Value::Function(callable) => match callable.as_ref() {
                Callable::Native { name, .. } => write!(f, "[Function: {} (native)]", name),
                Callable::Constructor(class) => write!(f, "[class {}]", class.name),
            },
        }
    }
}

/// An object: own properties plus an optional prototype.
#[derive(Debug, Clone)]
pub struct Object {
    /// Class tag shown by `Display` (e.g. the module base name)
    pub class_name: Option<String>,
    /// The prototype of this object
    pub prototype: Option<ObjectRef>,
    /// The own properties
    pub properties: FxHashMap<String, Value>,
}

impl Object {
    /// Creates a new empty object.
    pub fn new() -> Self {
        Self {
            class_name: None,
            prototype: None,
            properties: FxHashMap::default(),
        }
    }

    /// Creates an object tagged with a class name and prototype.
    pub fn with_class(class_name: impl Into<String>, prototype: Option<ObjectRef>) -> Self {
        Self {
            class_name: Some(class_name.into()),
            prototype,
            properties: FxHashMap::default(),
        }
    }

    /// Gets a property value, walking the prototype chain.
    pub fn get(&self, key: &str) -> Option<Value> {
        if let Some(value) = self.properties.get(key) {
            return Some(value.clone());
        }
        self.prototype.as_ref().and_then(|proto| proto.read().get(key))
    }

    /// Gets an own property value.
    pub fn get_own(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }

    /// Sets an own property value.
    pub fn set(&mut self, key: impl Into<String>, value: Value) {
        self.properties.insert(key.into(), value);
    }

    /// Checks if an own property exists.
    pub fn has_own(&self, key: &str) -> bool {
        self.properties.contains_key(key)
    }

    /// Checks if a property exists on the object or its prototype chain.
    pub fn has(&self, key: &str) -> bool {
        self.has_own(key)
            || self
                .prototype
                .as_ref()
                .is_some_and(|proto| proto.read().has(key))
    }

    /// Own property names, sorted.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.properties.keys().cloned().collect();
        keys.sort();
        keys
    }
}

impl Default for Object {
    fn default() -> Self {
        Self::new()
    }
}

/// A callable value: a native function or a class constructor.
#[derive(Clone)]
pub enum Callable {
    /// A native Rust function
    Native {
        /// The function name
        name: String,
        /// The native function
        func: NativeFn,
    },
    /// A constructor for a constructible export
    Constructor(Arc<ClassDef>),
}

impl Callable {
    /// Wraps a Rust closure as a native function.
    pub fn native<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&mut Context, &[Value]) -> Result<Value> + Send + Sync + 'static,
    {
        Callable::Native {
            name: name.into(),
            func: Arc::new(func),
        }
    }

    /// The function or class name.
    pub fn name(&self) -> &str {
        match self {
            Callable::Native { name, .. } => name,
            Callable::Constructor(class) => &class.name,
        }
    }

    /// The class behind a constructor, if this is one.
    pub fn class(&self) -> Option<&Arc<ClassDef>> {
        match self {
            Callable::Constructor(class) => Some(class),
            Callable::Native { .. } => None,
        }
    }

    /// Calls the function without `new`.
    pub fn call(&self, cx: &mut Context, args: &[Value]) -> Result<Value> {
        match self {
            Callable::Native { func, .. } => func(cx, args),
            Callable::Constructor(class) => Err(NativeError::type_error(format!(
                "Class constructor {} cannot be invoked without 'new'",
                class.name
            ))),
        }
    }
}

impl fmt::Debug for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Callable::Native { name, .. } => write!(f, "NativeFunction({})", name),
            Callable::Constructor(class) => write!(f, "Constructor({})", class.name),
        }
    }
}

/// One member of an export surface.
#[derive(Clone)]
pub enum ExportEntry {
    /// A plain value
    Value(Value),
    /// A callable function
    Function(NativeFn),
    /// A constructible type
    Class(Arc<ClassDef>),
}

impl ExportEntry {
    /// Returns the class if this entry can be constructed with `new`.
    pub fn as_constructible(&self) -> Option<&Arc<ClassDef>> {
        match self {
            ExportEntry::Class(class) => Some(class),
            ExportEntry::Value(_) | ExportEntry::Function(_) => None,
        }
    }

    /// Short name of the entry kind.
    pub fn kind(&self) -> &'static str {
        match self {
            ExportEntry::Value(_) => "value",
            ExportEntry::Function(_) => "function",
            ExportEntry::Class(_) => "class",
        }
    }
}

impl fmt::Debug for ExportEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportEntry::Value(v) => f.debug_tuple("Value").field(v).finish(),
            ExportEntry::Function(_) => write!(f, "Function"),
            ExportEntry::Class(class) => write!(f, "Class({})", class.name),
        }
    }
}

/// A class-like export table.
///
/// Module surfaces are classes too: their `members` are the module's exports,
/// and any member that is itself a `ClassDef` is a nested constructible export.
pub struct ClassDef {
    /// The class name
    pub name: String,
    /// Static members, in declaration order
    pub members: Vec<(String, ExportEntry)>,
    /// Methods installed on the class prototype
    pub methods: Vec<(String, NativeFn)>,
    /// Runs on `new` with the fresh instance as the first argument
    pub initializer: Option<NativeFn>,
}

impl ClassDef {
    /// Starts building a class.
    pub fn builder(name: impl Into<String>) -> ClassBuilder {
        ClassBuilder {
            def: ClassDef {
                name: name.into(),
                members: Vec::new(),
                methods: Vec::new(),
                initializer: None,
            },
        }
    }

    /// Looks up a static member by name.
    pub fn member(&self, name: &str) -> Option<&ExportEntry> {
        self.members
            .iter()
            .find(|(member, _)| member == name)
            .map(|(_, entry)| entry)
    }

    /// Static members that can be constructed with `new`.
    pub fn constructible_exports(&self) -> impl Iterator<Item = (&str, &Arc<ClassDef>)> + '_ {
        self.members.iter().filter_map(|(name, entry)| {
            entry.as_constructible().map(|class| (name.as_str(), class))
        })
    }
}

impl fmt::Debug for ClassDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassDef")
            .field("name", &self.name)
            .field("members", &self.members)
            .field(
                "methods",
                &self.methods.iter().map(|(name, _)| name).collect::<Vec<_>>(),
            )
            .finish()
    }
}

/// Builder for [`ClassDef`].
pub struct ClassBuilder {
    def: ClassDef,
}

impl ClassBuilder {
    /// Adds a plain value member.
    pub fn value(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.def
            .members
            .push((name.into(), ExportEntry::Value(value.into())));
        self
    }

    /// Adds a function member.
    pub fn function<F>(mut self, name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&mut Context, &[Value]) -> Result<Value> + Send + Sync + 'static,
    {
        self.def
            .members
            .push((name.into(), ExportEntry::Function(Arc::new(func))));
        self
    }

    /// Adds a nested constructible member, named after the class.
    pub fn class(mut self, class: impl Into<Arc<ClassDef>>) -> Self {
        let class = class.into();
        self.def
            .members
            .push((class.name.clone(), ExportEntry::Class(class)));
        self
    }

    /// Adds a prototype method.
    pub fn method<F>(mut self, name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&mut Context, &[Value]) -> Result<Value> + Send + Sync + 'static,
    {
        self.def.methods.push((name.into(), Arc::new(func)));
        self
    }

    /// Sets the initializer run by `new`.
    pub fn initializer<F>(mut self, func: F) -> Self
    where
        F: Fn(&mut Context, &[Value]) -> Result<Value> + Send + Sync + 'static,
    {
        self.def.initializer = Some(Arc::new(func));
        self
    }

    /// Finishes the class.
    pub fn build(self) -> Arc<ClassDef> {
        Arc::new(self.def)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop(_cx: &mut Context, _args: &[Value]) -> Result<Value> {
        Ok(Value::Undefined)
    }

    #[test]
    fn test_type_of() {
        assert_eq!(Value::Undefined.type_of(), "undefined");
        assert_eq!(Value::Null.type_of(), "object");
        assert_eq!(Value::from(1.0).type_of(), "number");
        assert_eq!(Value::from("x").type_of(), "string");
        let f = Value::Function(Arc::new(Callable::native("f", noop)));
        assert_eq!(f.type_of(), "function");
    }

    #[test]
    fn test_identity_equality() {
        let a: ObjectRef = Arc::new(RwLock::new(Object::new()));
        let b: ObjectRef = Arc::new(RwLock::new(Object::new()));
        assert_eq!(Value::Object(a.clone()), Value::Object(a.clone()));
        assert_ne!(Value::Object(a), Value::Object(b));
        assert_ne!(Value::Number(f64::NAN), Value::Number(f64::NAN));
    }

    #[test]
    fn test_prototype_lookup() {
        let mut proto = Object::new();
        proto.set("ping", Value::from("pong"));
        let proto: ObjectRef = Arc::new(RwLock::new(proto));

        let mut obj = Object::with_class("m", Some(proto));
        obj.set("own", Value::from(true));

        assert_eq!(obj.get("ping"), Some(Value::from("pong")));
        assert!(obj.get_own("ping").is_none());
        assert!(obj.has("ping"));
        assert!(!obj.has_own("ping"));
        assert_eq!(obj.keys(), vec!["own".to_string()]);
    }

    #[test]
    fn test_constructible_exports() {
        let inner = ClassDef::builder("Inner").build();
        let outer = ClassDef::builder("Outer").class(inner).build();
        let surface = ClassDef::builder("m")
            .value("VERSION", "1.0")
            .function("ping", noop)
            .class(outer)
            .build();

        let names: Vec<&str> = surface.constructible_exports().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["Outer"]);
        assert_eq!(surface.member("ping").map(ExportEntry::kind), Some("function"));
        assert_eq!(surface.member("VERSION").map(ExportEntry::kind), Some("value"));
    }

    #[test]
    fn test_display() {
        let class = ClassDef::builder("Foo").build();
        let ctor = Value::Function(Arc::new(Callable::Constructor(class)));
        assert_eq!(ctor.to_string(), "[class Foo]");
        let obj: ObjectRef = Arc::new(RwLock::new(Object::with_class("net", None)));
        assert_eq!(Value::Object(obj).to_string(), "[object net]");
    }
}
