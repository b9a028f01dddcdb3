// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Values exchanged between the loaders and compiled units.
//!
//! The bootstrap realm is single threaded and compiled units re-enter the
//! loaders while holding references to the same objects, so objects are
//! shared through `Rc<RefCell<_>>` handles with identity semantics. No
//! borrow is held across a call back into user code.

use crate::error::Result;
use indexmap::IndexMap;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Signature of a native (Rust) function exposed as a value
pub type NativeFn = dyn Fn(&[Value]) -> Result<Value>;

/// A named native function
#[derive(Clone)]
pub struct NativeFunction {
    name: Rc<str>,
    func: Rc<NativeFn>,
}

impl NativeFunction {
    /// Wrap a closure as a native function
    pub fn new(name: &str, func: impl Fn(&[Value]) -> Result<Value> + 'static) -> Self {
        Self {
            name: Rc::from(name),
            func: Rc::new(func),
        }
    }

    /// The function name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Invoke the function
    pub fn call(&self, args: &[Value]) -> Result<Value> {
        (self.func)(args)
    }

    /// Identity comparison
    pub fn ptr_eq(&self, other: &NativeFunction) -> bool {
        Rc::ptr_eq(&self.func, &other.func)
    }
}

impl fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NativeFunction({})", self.name)
    }
}

/// A property slot
#[derive(Debug, Clone)]
pub struct Property {
    /// The property value
    pub value: Value,
    /// Whether the property shows up in own-key enumeration
    pub enumerable: bool,
}

/// A property bag with an optional prototype
#[derive(Debug, Default)]
pub struct Object {
    prototype: Option<ObjectRef>,
    properties: IndexMap<String, Property>,
}

/// Shared handle to an [`Object`]. Clones alias the same object.
#[derive(Clone, Default)]
pub struct ObjectRef(Rc<RefCell<Object>>);

impl ObjectRef {
    /// Create an empty object with no prototype
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty object inheriting from `prototype`
    pub fn with_prototype(prototype: ObjectRef) -> Self {
        Self(Rc::new(RefCell::new(Object {
            prototype: Some(prototype),
            properties: IndexMap::new(),
        })))
    }

    /// Build an object from key/value pairs, in order
    pub fn from_entries<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        let obj = Self::new();
        for (key, value) in entries {
            obj.set(key, value);
        }
        obj
    }

    /// Assign a property. Existing properties keep their enumerability.
    pub fn set(&self, key: impl Into<String>, value: impl Into<Value>) {
        let value = value.into();
        self.0
            .borrow_mut()
            .properties
            .entry(key.into())
            .and_modify(|prop| prop.value = value.clone())
            .or_insert(Property {
                value,
                enumerable: true,
            });
    }

    /// Define a non-enumerable property
    pub fn define_hidden(&self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.borrow_mut().properties.insert(
            key.into(),
            Property {
                value: value.into(),
                enumerable: false,
            },
        );
    }

    /// Read an own property, `Undefined` when absent. Never consults the
    /// prototype chain.
    pub fn get_own(&self, key: &str) -> Value {
        self.0
            .borrow()
            .properties
            .get(key)
            .map(|prop| prop.value.clone())
            .unwrap_or(Value::Undefined)
    }

    /// Read a property through the prototype chain
    pub fn get(&self, key: &str) -> Value {
        let mut current = self.clone();
        loop {
            let next = {
                let obj = current.0.borrow();
                if let Some(prop) = obj.properties.get(key) {
                    return prop.value.clone();
                }
                obj.prototype.clone()
            };
            match next {
                Some(proto) => current = proto,
                None => return Value::Undefined,
            }
        }
    }

    /// Check for an own property
    pub fn has_own(&self, key: &str) -> bool {
        self.0.borrow().properties.contains_key(key)
    }

    /// Remove an own property
    pub fn delete(&self, key: &str) -> bool {
        self.0.borrow_mut().properties.shift_remove(key).is_some()
    }

    /// Own enumerable keys in insertion order
    pub fn own_enumerable_keys(&self) -> Vec<String> {
        self.0
            .borrow()
            .properties
            .iter()
            .filter(|(_, prop)| prop.enumerable)
            .map(|(key, _)| key.clone())
            .collect()
    }

    /// Number of own properties
    pub fn len(&self) -> usize {
        self.0.borrow().properties.len()
    }

    /// Whether the object has no own properties
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The prototype, if any
    pub fn prototype(&self) -> Option<ObjectRef> {
        self.0.borrow().prototype.clone()
    }

    /// Identity comparison
    pub fn ptr_eq(&self, other: &ObjectRef) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for ObjectRef {
    // Objects may be cyclic; only the keys are printed.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let obj = self.0.borrow();
        f.debug_set().entries(obj.properties.keys()).finish()
    }
}

/// A JavaScript value as seen by the loaders
#[derive(Debug, Clone, Default)]
pub enum Value {
    /// undefined
    #[default]
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
    /// Native function
    Function(NativeFunction),
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) => true,
            (Value::Null, Value::Null) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a.ptr_eq(b),
            (Value::Function(a), Value::Function(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl Value {
    /// Returns true if this value is undefined.
    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    /// Returns the object handle, if this is an object.
    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Object(obj) => Some(obj),
            _ => None,
        }
    }

    /// Returns the function, if this is a function.
    pub fn as_function(&self) -> Option<&NativeFunction> {
        match self {
            Value::Function(func) => Some(func),
            _ => None,
        }
    }

    /// Returns the type of this value as a string.
    pub fn type_of(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null | Value::Object(_) => "object",
            Value::Boolean(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Function(_) => "function",
        }
    }

    /// Canonical string coercion, as `String(value)` does.
    pub fn to_js_string(&self) -> String {
        match self {
            Value::Undefined => "undefined".to_string(),
            Value::Null => "null".to_string(),
            Value::Boolean(b) => b.to_string(),
            Value::Number(n) => number_to_string(*n),
            Value::String(s) => s.clone(),
            Value::Object(_) => "[object Object]".to_string(),
            Value::Function(func) => format!("function {}() {{ [native code] }}", func.name()),
        }
    }
}

fn number_to_string(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        let s = if n > 0.0 { "Infinity" } else { "-Infinity" };
        s.to_string()
    } else if n == 0.0 {
        // -0 prints as 0
        "0".to_string()
    } else {
        n.to_string()
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_js_string())
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

impl From<&String> for Value {
    fn from(s: &String) -> Self {
        Value::String(s.clone())
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

impl From<NativeFunction> for Value {
    fn from(func: NativeFunction) -> Self {
        Value::Function(func)
    }
}

/// Convert parsed JSON into a loader value
pub fn json_to_value(json: &serde_json::Value) -> Value {
    match json {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Boolean(*b),
        serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
        serde_json::Value::String(s) => Value::String(s.clone()),
        serde_json::Value::Array(arr) => {
            let obj = ObjectRef::new();
            for (i, item) in arr.iter().enumerate() {
                obj.set(i.to_string(), json_to_value(item));
            }
            obj.define_hidden("length", Value::Number(arr.len() as f64));
            Value::Object(obj)
        }
        serde_json::Value::Object(map) => Value::Object(ObjectRef::from_entries(
            map.iter().map(|(k, v)| (k.clone(), json_to_value(v))),
        )),
    }
}
