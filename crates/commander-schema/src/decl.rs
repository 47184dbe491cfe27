//! # Type Declarations
//!
//! The input side of the registry. A [`StructureDecl`] lists the fields of a
//! type that is bound recursively; a [`ScalarDecl`] names a type built from
//! one raw value by a default constructor or a named factory.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use commander_core::{FieldDecl, Wrapped, WrappedValue};
use serde_json::Value;

type ConstructFn = dyn Fn(&Value) -> Result<Wrapped, String> + Send + Sync;

/// A registered way of building a scalar wrapper from one raw payload value.
#[derive(Clone)]
pub struct Constructor(Arc<ConstructFn>);

impl Constructor {
    /// Wrap a typed constructor so its output is tagged with `type_name`.
    pub fn new<T, E, F>(type_name: &str, f: F) -> Self
    where
        T: WrappedValue,
        E: fmt::Display,
        F: Fn(&Value) -> Result<T, E> + Send + Sync + 'static,
    {
        let type_name = type_name.to_string();
        Self(Arc::new(move |raw: &Value| {
            f(raw)
                .map(|value| Wrapped::new(type_name.clone(), value))
                .map_err(|e| e.to_string())
        }))
    }

    /// Build a value from raw input.
    pub fn call(&self, raw: &Value) -> Result<Wrapped, String> {
        (self.0)(raw)
    }
}

impl fmt::Debug for Constructor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Constructor(..)")
    }
}

/// A type bound field by field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructureDecl {
    /// Registered name.
    pub name: String,
    /// Parent structure whose bindable fields are inherited.
    pub extends: Option<String>,
    /// Own fields, in declaration order.
    pub fields: Vec<FieldDecl>,
}

impl StructureDecl {
    /// A structure with no parent and no fields.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            extends: None,
            fields: Vec::new(),
        }
    }

    /// Inherit from another registered structure.
    pub fn extends(mut self, parent: impl Into<String>) -> Self {
        self.extends = Some(parent.into());
        self
    }

    /// Add a field.
    pub fn field(mut self, field: FieldDecl) -> Self {
        self.fields.push(field);
        self
    }
}

/// A type constructed from a single raw value.
#[derive(Debug, Clone)]
pub struct ScalarDecl {
    /// Registered name.
    pub name: String,
    pub(crate) constructor: Option<Constructor>,
    pub(crate) factories: BTreeMap<String, Constructor>,
}

impl ScalarDecl {
    /// A scalar type with neither constructor nor factories yet.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            constructor: None,
            factories: BTreeMap::new(),
        }
    }

    /// Register the default constructor.
    pub fn constructor<T, E, F>(mut self, f: F) -> Self
    where
        T: WrappedValue,
        E: fmt::Display,
        F: Fn(&Value) -> Result<T, E> + Send + Sync + 'static,
    {
        self.constructor = Some(Constructor::new(&self.name, f));
        self
    }

    /// Register a named factory.
    pub fn factory<T, E, F>(mut self, name: impl Into<String>, f: F) -> Self
    where
        T: WrappedValue,
        E: fmt::Display,
        F: Fn(&Value) -> Result<T, E> + Send + Sync + 'static,
    {
        let constructor = Constructor::new(&self.name, f);
        self.factories.insert(name.into(), constructor);
        self
    }

    /// Whether a default constructor is registered.
    pub fn has_constructor(&self) -> bool {
        self.constructor.is_some()
    }

    /// Names of the registered factories, sorted.
    pub fn factory_names(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }
}
