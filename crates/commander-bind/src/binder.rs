//! # Binder
//!
//! Walks a structure's flattened field plans and assigns each field from
//! the payload:
//!
//! - **Scalar fields**: an absent key and an explicit `null` both mean "no
//!   input". No input on a non-nullable field is `MissingRequiredField`;
//!   on a nullable field the field is set to `Null`.
//! - **List fields**: absent or `null` binds an empty list. An array is
//!   coerced element by element; a mapping (what bracketed form keys decode
//!   to) is coerced value by value in key order. Anything else is a
//!   `TypeMismatch`.
//! - **Structure values**: must be mappings; a fresh instance of the target
//!   structure is bound from the mapping, recursively.
//!
//! The first failure aborts the call. Fields assigned before it are kept.
//!
//! Field-level errors carry the payload path of the offending value, for
//! example `ship.city` or `tags[1]`.

use std::sync::Arc;

use commander_core::{kind_of, BindError, BoundValue, Instance, Payload, Primitive, ROOT_PATH};
use commander_schema::{Coercion, FieldKind, FieldPlan, Schema, StructurePlan};
use serde_json::{Map, Value};

use crate::coerce::{coerce_float, coerce_int, truthy};
use crate::typed::FromInstance;

/// Default bound on structure nesting.
pub const DEFAULT_MAX_DEPTH: usize = 32;

/// Per-binder settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BindOptions {
    /// Maximum number of nested structure levels below the root instance.
    pub max_depth: usize,
}

impl Default for BindOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// Binds payloads onto instances of the structures in a [`Schema`].
///
/// Cheap to clone and safe to share across threads.
#[derive(Debug, Clone)]
pub struct Binder {
    schema: Arc<Schema>,
    options: BindOptions,
}

impl Binder {
    /// A binder with default options.
    pub fn new(schema: Arc<Schema>) -> Self {
        Self::with_options(schema, BindOptions::default())
    }

    /// A binder with explicit options.
    pub fn with_options(schema: Arc<Schema>, options: BindOptions) -> Self {
        Self { schema, options }
    }

    /// The schema this binder reads plans from.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// The active options.
    pub fn options(&self) -> BindOptions {
        self.options
    }

    /// Bind `payload` onto `instance`, in place.
    ///
    /// Only fields owned by the instance type's plan are touched.
    ///
    /// # Errors
    ///
    /// `BindError::UnknownType` if the instance's type is not registered,
    /// otherwise the first field-level failure.
    pub fn bind(&self, instance: &mut Instance, payload: &Payload) -> Result<(), BindError> {
        let plan = self.plan_for(instance.type_name())?;
        self.bind_object(plan, instance, payload.as_map(), "", 0)
    }

    /// Create an empty instance of `type_name` and bind `payload` onto it.
    pub fn fill(&self, type_name: &str, payload: &Payload) -> Result<Instance, BindError> {
        let plan = self.plan_for(type_name)?;
        let mut instance = Instance::new(plan.name.clone());
        self.bind_object(plan, &mut instance, payload.as_map(), "", 0)?;
        Ok(instance)
    }

    /// Bind into a fresh instance and convert it into `T`.
    pub fn fill_typed<T: FromInstance>(&self, payload: &Payload) -> Result<T, BindError> {
        let instance = self.fill(T::TYPE_NAME, payload)?;
        T::from_instance(instance)
    }

    fn plan_for(&self, type_name: &str) -> Result<&StructurePlan, BindError> {
        self.schema
            .structure(type_name)
            .ok_or_else(|| BindError::UnknownType {
                type_name: type_name.to_string(),
            })
    }

    fn bind_object(
        &self,
        plan: &StructurePlan,
        instance: &mut Instance,
        params: &Map<String, Value>,
        prefix: &str,
        depth: usize,
    ) -> Result<(), BindError> {
        let at = if prefix.is_empty() { ROOT_PATH } else { prefix };
        tracing::debug!(
            type_name = %plan.name,
            path = at,
            fields = plan.fields.len(),
            depth,
            "binding object"
        );

        for field in &plan.fields {
            let path = child_path(prefix, field.binding_name());
            let value = match &field.kind {
                FieldKind::Scalar(coercion) => {
                    self.bind_scalar(field, coercion, params, &path, depth)?
                }
                FieldKind::List(coercion) => self.bind_list(field, coercion, params, &path, depth)?,
            };
            tracing::trace!(field = %field.ident, path = %path, kind = value.kind(), "field bound");
            instance.set(field.ident.clone(), value);
        }
        Ok(())
    }

    fn bind_scalar(
        &self,
        field: &FieldPlan,
        coercion: &Coercion,
        params: &Map<String, Value>,
        path: &str,
        depth: usize,
    ) -> Result<BoundValue, BindError> {
        match params.get(field.binding_name()) {
            Some(raw) if !raw.is_null() => self.coerce(coercion, raw, path, depth),
            _ if field.is_nullable() => Ok(BoundValue::Null),
            _ => Err(BindError::MissingRequiredField {
                field: path.to_string(),
            }),
        }
    }

    fn bind_list(
        &self,
        field: &FieldPlan,
        coercion: &Coercion,
        params: &Map<String, Value>,
        path: &str,
        depth: usize,
    ) -> Result<BoundValue, BindError> {
        let items: Vec<BoundValue> = match params.get(field.binding_name()) {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(items)) => items
                .iter()
                .enumerate()
                .map(|(i, raw)| self.coerce(coercion, raw, &format!("{path}[{i}]"), depth))
                .collect::<Result<_, _>>()?,
            Some(Value::Object(map)) => map
                .iter()
                .map(|(key, raw)| self.coerce(coercion, raw, &format!("{path}[{key}]"), depth))
                .collect::<Result<_, _>>()?,
            Some(other) => {
                return Err(BindError::TypeMismatch {
                    field: path.to_string(),
                    expected: "array",
                    actual: kind_of(other),
                })
            }
        };
        Ok(BoundValue::List(items))
    }

    fn coerce(
        &self,
        coercion: &Coercion,
        raw: &Value,
        path: &str,
        depth: usize,
    ) -> Result<BoundValue, BindError> {
        if raw.is_null() {
            return Ok(BoundValue::Null);
        }

        match coercion {
            Coercion::Primitive(primitive) => coerce_primitive(*primitive, raw, path),
            Coercion::Structure(type_name) => {
                let Value::Object(params) = raw else {
                    return Err(BindError::TypeMismatch {
                        field: path.to_string(),
                        expected: "object",
                        actual: kind_of(raw),
                    });
                };
                if depth >= self.options.max_depth {
                    return Err(BindError::DepthExceeded {
                        field: path.to_string(),
                        max_depth: self.options.max_depth,
                    });
                }
                let plan = self.plan_for(type_name)?;
                let mut nested = Instance::new(plan.name.clone());
                self.bind_object(plan, &mut nested, params, path, depth + 1)?;
                Ok(BoundValue::Object(nested))
            }
            Coercion::Constructed {
                type_name,
                constructor,
            }
            | Coercion::FactoryConstructed {
                type_name,
                constructor,
                ..
            } => constructor
                .call(raw)
                .map(BoundValue::Wrapped)
                .map_err(|reason| {
                    tracing::debug!(path, type_name = %type_name, %reason, "constructor rejected input");
                    BindError::Construction {
                        field: path.to_string(),
                        type_name: type_name.clone(),
                        reason,
                    }
                }),
        }
    }
}

fn coerce_primitive(primitive: Primitive, raw: &Value, path: &str) -> Result<BoundValue, BindError> {
    let mismatch = |expected| BindError::TypeMismatch {
        field: path.to_string(),
        expected,
        actual: kind_of(raw),
    };
    match primitive {
        Primitive::Int => Ok(BoundValue::Int(coerce_int(raw))),
        Primitive::Bool => Ok(BoundValue::Bool(truthy(raw))),
        Primitive::Float => coerce_float(raw)
            .map(BoundValue::Float)
            .ok_or_else(|| mismatch("float")),
        Primitive::String => match raw {
            Value::String(s) => Ok(BoundValue::String(s.clone())),
            _ => Err(mismatch("string")),
        },
    }
}

fn child_path(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}.{name}")
    }
}
