//! # Bound Values
//!
//! The target side of a bind: an [`Instance`] of a registered structure type
//! whose fields hold [`BoundValue`]s. Scalar-wrapper values are stored
//! type-erased in a [`Wrapped`] and recovered with
//! [`Wrapped::downcast_ref`].

use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::error::BindError;

/// A scalar-wrapper value that can live inside a [`Wrapped`].
///
/// Implemented for every `Debug + PartialEq + Send + Sync + 'static` type.
pub trait WrappedValue: Any + fmt::Debug + Send + Sync {
    /// Upcast for downcasting.
    fn as_any(&self) -> &dyn Any;

    /// Equality across the type-erased boundary.
    fn dyn_eq(&self, other: &dyn WrappedValue) -> bool;
}

impl<T> WrappedValue for T
where
    T: Any + fmt::Debug + PartialEq + Send + Sync,
{
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn dyn_eq(&self, other: &dyn WrappedValue) -> bool {
        other
            .as_any()
            .downcast_ref::<T>()
            .is_some_and(|other| self == other)
    }
}

/// A constructed scalar-wrapper value, tagged with its registered type name.
#[derive(Clone)]
pub struct Wrapped {
    type_name: String,
    value: Arc<dyn WrappedValue>,
}

impl Wrapped {
    /// Wrap a value under a registered type name.
    pub fn new<T: WrappedValue>(type_name: impl Into<String>, value: T) -> Self {
        Self {
            type_name: type_name.into(),
            value: Arc::new(value),
        }
    }

    /// The registered type name.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Borrow the inner value as `T`, if that is what it holds.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.value.as_any().downcast_ref::<T>()
    }
}

impl fmt::Debug for Wrapped {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({:?})", self.type_name, self.value)
    }
}

impl PartialEq for Wrapped {
    fn eq(&self, other: &Self) -> bool {
        self.type_name == other.type_name && self.value.dyn_eq(other.value.as_ref())
    }
}

/// The value held by one field of an [`Instance`].
#[derive(Debug, Clone, PartialEq)]
pub enum BoundValue {
    /// Explicit absence.
    Null,
    /// `bool` primitive.
    Bool(bool),
    /// `int` primitive.
    Int(i64),
    /// `float` primitive.
    Float(f64),
    /// `string` primitive.
    String(String),
    /// A list field.
    List(Vec<BoundValue>),
    /// A recursively bound structure.
    Object(Instance),
    /// A constructed scalar wrapper.
    Wrapped(Wrapped),
}

impl BoundValue {
    /// Short name of the variant, used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::String(_) => "string",
            Self::List(_) => "list",
            Self::Object(_) => "object",
            Self::Wrapped(_) => "wrapped",
        }
    }

    /// Whether this is `Null`.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Borrow as a string slice.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Copy out an `int`.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Copy out a `float`.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(n) => Some(*n),
            _ => None,
        }
    }

    /// Copy out a `bool`.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Borrow a list.
    pub fn as_list(&self) -> Option<&[BoundValue]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// Borrow a nested instance.
    pub fn as_object(&self) -> Option<&Instance> {
        match self {
            Self::Object(instance) => Some(instance),
            _ => None,
        }
    }

    /// Borrow a scalar wrapper.
    pub fn as_wrapped(&self) -> Option<&Wrapped> {
        match self {
            Self::Wrapped(w) => Some(w),
            _ => None,
        }
    }

    fn write_indented(&self, f: &mut fmt::Formatter<'_>, indent: usize) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(n) => write!(f, "{n}"),
            Self::Float(n) => write!(f, "{n:?}"),
            Self::String(s) => write!(f, "{s:?}"),
            Self::Wrapped(w) => write!(f, "{w:?}"),
            Self::Object(instance) => instance.write_indented(f, indent),
            Self::List(items) if items.is_empty() => f.write_str("[]"),
            Self::List(items) => {
                f.write_str("[\n")?;
                for item in items {
                    write!(f, "{:width$}", "", width = (indent + 1) * 2)?;
                    item.write_indented(f, indent + 1)?;
                    f.write_str(",\n")?;
                }
                write!(f, "{:width$}]", "", width = indent * 2)
            }
        }
    }
}

impl fmt::Display for BoundValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_indented(f, 0)
    }
}

/// An object of a registered structure type.
///
/// Created empty by the caller; the binder assigns the fields the type's
/// plan owns and leaves every other field as it was.
#[derive(Debug, Clone, PartialEq)]
pub struct Instance {
    type_name: String,
    fields: BTreeMap<String, BoundValue>,
}

impl Instance {
    /// An empty instance of the named type.
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            fields: BTreeMap::new(),
        }
    }

    /// The structure type this instance belongs to.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Borrow a field.
    pub fn get(&self, ident: &str) -> Option<&BoundValue> {
        self.fields.get(ident)
    }

    /// Assign a field, returning the previous value.
    pub fn set(&mut self, ident: impl Into<String>, value: BoundValue) -> Option<BoundValue> {
        self.fields.insert(ident.into(), value)
    }

    /// Remove a field and return its value.
    pub fn take(&mut self, ident: &str) -> Option<BoundValue> {
        self.fields.remove(ident)
    }

    /// Whether the field has been assigned.
    pub fn contains(&self, ident: &str) -> bool {
        self.fields.contains_key(ident)
    }

    /// Number of assigned fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether no field has been assigned.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterate assigned fields in identifier order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &BoundValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Take a field out and convert it into `T`.
    ///
    /// # Errors
    ///
    /// `BindError::Extraction` if the field is unassigned (and `T` has no
    /// representation for absence) or holds a different kind of value.
    pub fn extract<T: FromBound>(&mut self, ident: &str) -> Result<T, BindError> {
        match self.fields.remove(ident) {
            Some(value) => T::from_bound(value).map_err(|reason| BindError::Extraction {
                field: ident.to_string(),
                reason,
            }),
            None => T::from_missing().ok_or_else(|| BindError::Extraction {
                field: ident.to_string(),
                reason: "field was not bound".to_string(),
            }),
        }
    }

    /// Take a scalar-wrapper field out as its concrete Rust type.
    pub fn extract_wrapped<T: Any + Clone>(&mut self, ident: &str) -> Result<T, BindError> {
        let wrapped: Wrapped = self.extract(ident)?;
        wrapped
            .downcast_ref::<T>()
            .cloned()
            .ok_or_else(|| BindError::Extraction {
                field: ident.to_string(),
                reason: format!(
                    "{} does not hold a {}",
                    wrapped.type_name(),
                    std::any::type_name::<T>()
                ),
            })
    }

    fn write_indented(&self, f: &mut fmt::Formatter<'_>, indent: usize) -> fmt::Result {
        if self.fields.is_empty() {
            return write!(f, "{} {{}}", self.type_name);
        }
        writeln!(f, "{} {{", self.type_name)?;
        for (ident, value) in &self.fields {
            write!(f, "{:width$}{ident}: ", "", width = (indent + 1) * 2)?;
            value.write_indented(f, indent + 1)?;
            f.write_str(",\n")?;
        }
        write!(f, "{:width$}}}", "", width = indent * 2)
    }
}

impl fmt::Display for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_indented(f, 0)
    }
}

/// Conversion from a [`BoundValue`] into a Rust type.
pub trait FromBound: Sized {
    /// Name of the accepted kind, for error messages.
    const EXPECTED: &'static str;

    /// Convert, or explain why the value does not fit.
    fn from_bound(value: BoundValue) -> Result<Self, String>;

    /// The value to use when the field was never assigned.
    fn from_missing() -> Option<Self> {
        None
    }
}

fn mismatch<T: FromBound>(value: &BoundValue) -> String {
    format!("expected {}, got {}", T::EXPECTED, value.kind())
}

macro_rules! from_bound_variant {
    ($ty:ty, $variant:ident, $expected:literal) => {
        impl FromBound for $ty {
            const EXPECTED: &'static str = $expected;

            fn from_bound(value: BoundValue) -> Result<Self, String> {
                match value {
                    BoundValue::$variant(inner) => Ok(inner),
                    other => Err(mismatch::<Self>(&other)),
                }
            }
        }
    };
}

from_bound_variant!(String, String, "string");
from_bound_variant!(i64, Int, "int");
from_bound_variant!(f64, Float, "float");
from_bound_variant!(bool, Bool, "bool");
from_bound_variant!(Instance, Object, "object");
from_bound_variant!(Wrapped, Wrapped, "wrapped");

impl<T: FromBound> FromBound for Option<T> {
    const EXPECTED: &'static str = T::EXPECTED;

    fn from_bound(value: BoundValue) -> Result<Self, String> {
        match value {
            BoundValue::Null => Ok(None),
            other => T::from_bound(other).map(Some),
        }
    }

    fn from_missing() -> Option<Self> {
        Some(None)
    }
}

impl<T: FromBound> FromBound for Vec<T> {
    const EXPECTED: &'static str = "list";

    fn from_bound(value: BoundValue) -> Result<Self, String> {
        match value {
            BoundValue::List(items) => items
                .into_iter()
                .enumerate()
                .map(|(i, item)| T::from_bound(item).map_err(|reason| format!("item {i}: {reason}")))
                .collect(),
            other => Err(mismatch::<Self>(&other)),
        }
    }
}
