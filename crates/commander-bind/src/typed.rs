//! # Typed Extraction
//!
//! Bound instances are dynamic. [`FromInstance`] turns one into a plain
//! Rust struct once binding has succeeded:
//!
//! ```ignore
//! struct Address { city: String }
//!
//! impl FromInstance for Address {
//!     const TYPE_NAME: &'static str = "Address";
//!
//!     fn from_instance(mut instance: Instance) -> Result<Self, BindError> {
//!         Ok(Self { city: instance.extract("city")? })
//!     }
//! }
//! ```

use commander_core::{BindError, BoundValue, Instance};

/// Conversion from a bound instance of a registered structure.
pub trait FromInstance: Sized {
    /// Registered structure name this type is bound from.
    const TYPE_NAME: &'static str;

    /// Convert a bound instance.
    fn from_instance(instance: Instance) -> Result<Self, BindError>;
}

/// Extraction of nested structure fields into [`FromInstance`] types.
pub trait InstanceExt {
    /// Take a required structure field.
    fn extract_structure<T: FromInstance>(&mut self, ident: &str) -> Result<T, BindError>;

    /// Take a nullable structure field.
    fn extract_optional_structure<T: FromInstance>(
        &mut self,
        ident: &str,
    ) -> Result<Option<T>, BindError>;

    /// Take a list-of-structures field.
    fn extract_structure_list<T: FromInstance>(&mut self, ident: &str)
        -> Result<Vec<T>, BindError>;
}

impl InstanceExt for Instance {
    fn extract_structure<T: FromInstance>(&mut self, ident: &str) -> Result<T, BindError> {
        let nested: Instance = self.extract(ident)?;
        convert(ident, nested)
    }

    fn extract_optional_structure<T: FromInstance>(
        &mut self,
        ident: &str,
    ) -> Result<Option<T>, BindError> {
        let nested: Option<Instance> = self.extract(ident)?;
        nested.map(|instance| convert(ident, instance)).transpose()
    }

    fn extract_structure_list<T: FromInstance>(
        &mut self,
        ident: &str,
    ) -> Result<Vec<T>, BindError> {
        let items: Vec<BoundValue> = match self.take(ident) {
            Some(BoundValue::List(items)) => items,
            Some(other) => {
                return Err(BindError::Extraction {
                    field: ident.to_string(),
                    reason: format!("expected list, got {}", other.kind()),
                })
            }
            None => {
                return Err(BindError::Extraction {
                    field: ident.to_string(),
                    reason: "field was not bound".to_string(),
                })
            }
        };

        items
            .into_iter()
            .enumerate()
            .map(|(i, item)| {
                let label = format!("{ident}[{i}]");
                match item {
                    BoundValue::Object(instance) => convert(&label, instance),
                    other => Err(BindError::Extraction {
                        field: label,
                        reason: format!("expected object, got {}", other.kind()),
                    }),
                }
            })
            .collect()
    }
}

fn convert<T: FromInstance>(ident: &str, instance: Instance) -> Result<T, BindError> {
    if instance.type_name() != T::TYPE_NAME {
        return Err(BindError::Extraction {
            field: ident.to_string(),
            reason: format!(
                "expected {}, got {}",
                T::TYPE_NAME,
                instance.type_name()
            ),
        });
    }
    T::from_instance(instance)
}
