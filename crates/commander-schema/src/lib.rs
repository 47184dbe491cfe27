//! # commander-schema — Static Type Registry
//!
//! Replaces runtime reflection with an explicit registry. Callers declare
//! their structure types (fields plus binding metadata) and scalar-wrapper
//! types (constructors and named factories) on a [`SchemaBuilder`]; `build`
//! validates everything once and yields a [`Schema`] holding a flattened,
//! fully resolved [`StructurePlan`] per structure.
//!
//! ## Modules
//!
//! - [`decl`]: the declarations fed into the builder.
//! - [`plan`]: the per-field plans the binder dispatches on.
//! - [`registry`]: [`SchemaBuilder`] and [`Schema`].
//! - [`description`]: YAML/JSON schema descriptions.
//! - [`validate`]: JSON Schema validation of descriptions.
//!
//! ## Crate Policy
//!
//! - Depends only on `commander-core` internally.
//! - Every schema problem is reported by `build`, never while binding.

pub mod decl;
pub mod description;
pub mod plan;
pub mod registry;
pub mod validate;

pub use decl::{Constructor, ScalarDecl, StructureDecl};
pub use description::{
    load_schema, DescriptionError, FieldDescription, SchemaDescription, StructureDescription,
};
pub use plan::{Coercion, FieldKind, FieldPlan, StructurePlan};
pub use registry::{Schema, SchemaBuilder};
pub use validate::{DescriptionValidator, ValidationViolations, Violation};
