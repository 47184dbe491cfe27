//! # Error Types — Structured Error Hierarchy
//!
//! Defines the error types shared by every Commander crate. All errors use
//! `thiserror` for derive-based `Display` and `Error` implementations.
//!
//! ## Design
//!
//! - Bind errors are terminal for the current `bind` call. The first
//!   failure wins; nothing is aggregated.
//! - Field-level bind errors carry the full field path (`ship.city`,
//!   `tags[1]`) so callers can point at the offending input.
//! - Schema errors are raised once, when a schema is built, and name the
//!   owning type and field.

use thiserror::Error;

/// Error while binding a payload onto an instance.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BindError {
    /// No usable payload was supplied at all.
    #[error("request payload is empty")]
    EmptyPayload,

    /// A non-nullable scalar field had no corresponding input.
    #[error("missing required parameter \"{field}\"")]
    MissingRequiredField {
        /// Path of the field in the payload.
        field: String,
    },

    /// Input was present but not convertible under the field's strictness rule.
    #[error("parameter \"{field}\" is expected to be {expected}, got {actual}")]
    TypeMismatch {
        /// Path of the field in the payload.
        field: String,
        /// The kind the field accepts.
        expected: &'static str,
        /// The kind that was supplied.
        actual: &'static str,
    },

    /// The instance's type is not registered in the schema.
    #[error("type not found: \"{type_name}\"")]
    UnknownType {
        /// The unresolved type name.
        type_name: String,
    },

    /// A scalar-wrapper constructor or factory rejected the raw input.
    #[error("parameter \"{field}\" could not be constructed as {type_name}: {reason}")]
    Construction {
        /// Path of the field in the payload.
        field: String,
        /// The scalar-wrapper type being constructed.
        type_name: String,
        /// Message returned by the constructor.
        reason: String,
    },

    /// Structure recursion went deeper than the configured limit.
    #[error("parameter \"{field}\" exceeds the maximum nesting depth of {max_depth}")]
    DepthExceeded {
        /// Path of the field where the limit was hit.
        field: String,
        /// The configured limit.
        max_depth: usize,
    },

    /// A bound instance could not be converted into a Rust type.
    #[error("field \"{field}\" could not be extracted: {reason}")]
    Extraction {
        /// Field identifier on the instance.
        field: String,
        /// Why the conversion failed.
        reason: String,
    },
}

impl BindError {
    /// Returns the field path this error refers to, if any.
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::MissingRequiredField { field }
            | Self::TypeMismatch { field, .. }
            | Self::Construction { field, .. }
            | Self::DepthExceeded { field, .. }
            | Self::Extraction { field, .. } => Some(field),
            Self::EmptyPayload | Self::UnknownType { .. } => None,
        }
    }
}

/// Error while registering types and resolving field descriptors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchemaError {
    /// Two declarations share one type name.
    #[error("type \"{0}\" is declared more than once")]
    DuplicateType(String),

    /// A declaration tried to take a primitive type name.
    #[error("type name \"{0}\" is reserved for a primitive")]
    ReservedTypeName(String),

    /// One declaration lists the same field identifier twice.
    #[error("field \"{field}\" is declared more than once on \"{owner}\"")]
    DuplicateField {
        /// Declaring type.
        owner: String,
        /// Repeated identifier.
        field: String,
    },

    /// `extends` names a type that is not a registered structure.
    #[error("\"{owner}\" extends unknown structure \"{parent}\"")]
    UnknownParent {
        /// Declaring type.
        owner: String,
        /// Missing parent.
        parent: String,
    },

    /// The `extends` chain loops back on itself.
    #[error("inheritance cycle: {}", .path.join(" -> "))]
    InheritanceCycle {
        /// Type names along the cycle, first repeated at the end.
        path: Vec<String>,
    },

    /// Neither the descriptor nor the field declaration provides a type.
    #[error("cannot resolve the type of \"{owner}.{field}\": no declared type and no type expression")]
    MetadataResolution {
        /// Declaring type.
        owner: String,
        /// Field identifier.
        field: String,
    },

    /// A type expression does not match `['?'] name ['[]']`.
    #[error("invalid type expression \"{expression}\" on \"{owner}.{field}\": {reason}")]
    InvalidTypeExpression {
        /// Declaring type.
        owner: String,
        /// Field identifier.
        field: String,
        /// The offending expression.
        expression: String,
        /// What is wrong with it.
        reason: String,
    },

    /// A bare type name is neither a primitive nor registered.
    #[error("class not found: \"{type_name}\" (field \"{owner}.{field}\")")]
    UnknownType {
        /// Declaring type.
        owner: String,
        /// Field identifier.
        field: String,
        /// The unresolved name.
        type_name: String,
    },

    /// `structure` was set on a field whose type is a scalar wrapper.
    #[error("field \"{owner}.{field}\" is marked as a structure but \"{type_name}\" is a scalar type")]
    NotAStructure {
        /// Declaring type.
        owner: String,
        /// Field identifier.
        field: String,
        /// The scalar wrapper type.
        type_name: String,
    },

    /// A structure type was referenced without the `structure` flag.
    #[error("field \"{owner}.{field}\" refers to structure \"{type_name}\" without the structure flag")]
    ConstructedStructure {
        /// Declaring type.
        owner: String,
        /// Field identifier.
        field: String,
        /// The structure type.
        type_name: String,
    },

    /// A scalar wrapper is used without a factory but has no default constructor.
    #[error("scalar type \"{type_name}\" has no default constructor (field \"{owner}.{field}\")")]
    MissingConstructor {
        /// Declaring type.
        owner: String,
        /// Field identifier.
        field: String,
        /// The scalar wrapper type.
        type_name: String,
    },

    /// The named factory is not registered on the scalar wrapper.
    #[error("scalar type \"{type_name}\" has no factory \"{factory}\" (field \"{owner}.{field}\")")]
    UnknownFactory {
        /// Declaring type.
        owner: String,
        /// Field identifier.
        field: String,
        /// The scalar wrapper type.
        type_name: String,
        /// The missing factory name.
        factory: String,
    },

    /// Structure fields form a cycle the schema does not permit.
    #[error("structure cycle: {}", .path.join(" -> "))]
    StructureCycle {
        /// `Type.field` hops along the cycle.
        path: Vec<String>,
    },
}
