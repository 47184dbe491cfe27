//! # Binding Plans
//!
//! The output side of the registry: per structure type, the flattened list
//! of bindable fields with their descriptors resolved and their coercion
//! chosen. The binder dispatches on [`FieldKind`] and [`Coercion`] with a
//! `match`; it never looks a type name up while binding a scalar.

use commander_core::{Primitive, ResolvedDescriptor};

use crate::decl::Constructor;

/// How one raw value becomes a field value.
#[derive(Debug, Clone)]
pub enum Coercion {
    /// One of `string`, `int`, `float`, `bool`.
    Primitive(Primitive),
    /// Bind a fresh instance of the named structure recursively.
    Structure(String),
    /// Call the scalar type's default constructor.
    Constructed {
        /// Scalar type name.
        type_name: String,
        /// The constructor.
        constructor: Constructor,
    },
    /// Call a named factory on the scalar type.
    FactoryConstructed {
        /// Scalar type name.
        type_name: String,
        /// Factory name.
        factory: String,
        /// The factory.
        constructor: Constructor,
    },
}

impl Coercion {
    /// Human name of the target, used in error messages.
    pub fn target_name(&self) -> &str {
        match self {
            Self::Primitive(p) => p.name(),
            Self::Structure(name) => name,
            Self::Constructed { type_name, .. } | Self::FactoryConstructed { type_name, .. } => {
                type_name
            }
        }
    }
}

/// Shape of a field: one value or a list of values, each coerced the same way.
#[derive(Debug, Clone)]
pub enum FieldKind {
    /// A single value.
    Scalar(Coercion),
    /// An ordered list.
    List(Coercion),
}

impl FieldKind {
    /// The per-value coercion.
    pub fn coercion(&self) -> &Coercion {
        match self {
            Self::Scalar(c) | Self::List(c) => c,
        }
    }
}

/// A bindable field, ready for the binder.
#[derive(Debug, Clone)]
pub struct FieldPlan {
    /// Field identifier on the instance.
    pub ident: String,
    /// Structure that declared the field (an ancestor for inherited fields).
    pub declared_by: String,
    /// Resolved binding metadata.
    pub descriptor: ResolvedDescriptor,
    /// Dispatch tag.
    pub kind: FieldKind,
}

impl FieldPlan {
    /// Payload key.
    pub fn binding_name(&self) -> &str {
        &self.descriptor.binding_name
    }

    /// Whether absence is accepted for a single-valued field.
    pub fn is_nullable(&self) -> bool {
        self.descriptor.is_nullable()
    }
}

/// All bindable fields of one structure, own fields first.
#[derive(Debug, Clone)]
pub struct StructurePlan {
    /// Registered name.
    pub name: String,
    /// Direct parent, if any.
    pub extends: Option<String>,
    /// Flattened field plans.
    pub fields: Vec<FieldPlan>,
}

impl StructurePlan {
    /// Look up the plan for a field identifier.
    pub fn field(&self, ident: &str) -> Option<&FieldPlan> {
        self.fields.iter().find(|f| f.ident == ident)
    }
}
