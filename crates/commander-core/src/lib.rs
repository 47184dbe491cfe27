//! # commander-core — Foundational Types for Commander
//!
//! Commander binds an untyped payload (decoded form data or JSON) onto
//! instances of registered types, driven by per-field binding metadata.
//! This crate holds the vocabulary every other crate shares; it depends on
//! nothing internal.
//!
//! ## Key Types
//!
//! - [`FieldDescriptor`] / [`ResolvedDescriptor`]: the binding metadata of
//!   one field, before and after defaults are filled in.
//! - [`TypeExpr`]: the `['?'] name ['[]']` type grammar.
//! - [`Payload`]: the decoded input mapping, with JSON and form decoders.
//! - [`Instance`] / [`BoundValue`]: the bind target and its field values.
//! - [`BindError`] / [`SchemaError`]: the error hierarchy.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `commander-*` crates (this is the leaf of the DAG).
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod descriptor;
pub mod error;
pub mod payload;
pub mod typexpr;
pub mod value;

// Re-export primary types for ergonomic imports.
pub use descriptor::{DeclaredType, FieldDecl, FieldDescriptor, ResolvedDescriptor};
pub use error::{BindError, SchemaError};
pub use payload::{kind_of, Payload, MAX_FORM_NESTING, ROOT_PATH};
pub use typexpr::{Primitive, TypeExpr, TypeExprError};
pub use value::{BoundValue, FromBound, Instance, Wrapped, WrappedValue};
