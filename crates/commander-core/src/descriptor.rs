//! # Field Descriptors
//!
//! A [`FieldDescriptor`] is the binding metadata attached to one field of a
//! target type. Every property is optional; [`FieldDescriptor::resolve`]
//! fills the gaps from the field's declaration and yields an immutable
//! [`ResolvedDescriptor`].
//!
//! A field without a descriptor is not bindable and is never touched.

use serde::Deserialize;

use crate::error::SchemaError;
use crate::typexpr::{Primitive, TypeExpr};

/// Raw binding metadata, as declared.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldDescriptor {
    /// Payload key. Defaults to the field identifier.
    #[serde(default, rename = "name")]
    pub binding_name: Option<String>,

    /// Type expression. Defaults to the declared type.
    #[serde(default, rename = "type")]
    pub type_expression: Option<String>,

    /// Named factory on the scalar-wrapper type.
    #[serde(default)]
    pub factory: Option<String>,

    /// Bind the type recursively instead of constructing it from one value.
    #[serde(default, rename = "structure")]
    pub is_structure: bool,
}

impl FieldDescriptor {
    /// An empty descriptor: every property defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read the field from this payload key.
    pub fn name(mut self, binding_name: impl Into<String>) -> Self {
        self.binding_name = Some(binding_name.into());
        self
    }

    /// Override the type expression.
    pub fn ty(mut self, type_expression: impl Into<String>) -> Self {
        self.type_expression = Some(type_expression.into());
        self
    }

    /// Construct values through the named factory.
    pub fn factory(mut self, factory: impl Into<String>) -> Self {
        self.factory = Some(factory.into());
        self
    }

    /// Bind the field's type recursively.
    pub fn structure(mut self) -> Self {
        self.is_structure = true;
        self
    }

    /// Fill in defaults from the field declaration.
    ///
    /// # Errors
    ///
    /// `SchemaError::MetadataResolution` when no type expression is given and
    /// the field has no declared type. `SchemaError::InvalidTypeExpression`
    /// when the given or synthesized expression does not parse.
    pub fn resolve(&self, owner: &str, field: &FieldDecl) -> Result<ResolvedDescriptor, SchemaError> {
        let binding_name = self
            .binding_name
            .clone()
            .unwrap_or_else(|| field.ident.clone());

        let parsed = match (&self.type_expression, &field.declared) {
            (Some(expr), _) => TypeExpr::parse(expr).map_err(|e| (expr.clone(), e)),
            (None, Some(declared)) => TypeExpr::declared(&declared.name, declared.nullable)
                .map_err(|e| (declared.name.clone(), e)),
            (None, None) => {
                return Err(SchemaError::MetadataResolution {
                    owner: owner.to_string(),
                    field: field.ident.clone(),
                })
            }
        };

        let type_expr = parsed.map_err(|(expression, e)| SchemaError::InvalidTypeExpression {
            owner: owner.to_string(),
            field: field.ident.clone(),
            expression,
            reason: e.to_string(),
        })?;

        Ok(ResolvedDescriptor {
            binding_name,
            type_expr,
            factory: self.factory.clone(),
            is_structure: self.is_structure,
        })
    }
}

/// The statically declared type of a field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclaredType {
    /// Bare type name.
    pub name: String,
    /// Whether the declaration admits absence.
    pub nullable: bool,
}

/// One field of a target type, with its optional binding metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDecl {
    /// Field identifier on the instance.
    pub ident: String,
    /// Declared type, when known.
    pub declared: Option<DeclaredType>,
    /// Binding metadata. `None` keeps the field out of the bound surface.
    pub descriptor: Option<FieldDescriptor>,
}

impl FieldDecl {
    /// A field with no declared type and no descriptor.
    pub fn new(ident: impl Into<String>) -> Self {
        Self {
            ident: ident.into(),
            declared: None,
            descriptor: None,
        }
    }

    /// Declare a non-nullable type.
    pub fn declared(mut self, type_name: impl Into<String>) -> Self {
        self.declared = Some(DeclaredType {
            name: type_name.into(),
            nullable: false,
        });
        self
    }

    /// Declare a nullable type.
    pub fn declared_nullable(mut self, type_name: impl Into<String>) -> Self {
        self.declared = Some(DeclaredType {
            name: type_name.into(),
            nullable: true,
        });
        self
    }

    /// Attach binding metadata.
    pub fn bind(mut self, descriptor: FieldDescriptor) -> Self {
        self.descriptor = Some(descriptor);
        self
    }

    /// Whether the field opts in to binding.
    pub fn is_bindable(&self) -> bool {
        self.descriptor.is_some()
    }

    /// Resolve the attached descriptor, or `None` if the field is not bindable.
    pub fn resolve(&self, owner: &str) -> Result<Option<ResolvedDescriptor>, SchemaError> {
        self.descriptor
            .as_ref()
            .map(|d| d.resolve(owner, self))
            .transpose()
    }
}

/// A descriptor with every default filled in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedDescriptor {
    /// Payload key.
    pub binding_name: String,
    /// Full type expression.
    pub type_expr: TypeExpr,
    /// Named factory, if any.
    pub factory: Option<String>,
    /// Recursive binding flag.
    pub is_structure: bool,
}

impl ResolvedDescriptor {
    /// The type name with markers stripped.
    pub fn bare_name(&self) -> &str {
        self.type_expr.bare_name()
    }

    /// Whether the field holds a list.
    pub fn is_list(&self) -> bool {
        self.type_expr.is_list()
    }

    /// Whether the field admits null.
    pub fn is_nullable(&self) -> bool {
        self.type_expr.is_nullable()
    }

    /// The primitive kind, if the bare name is one.
    pub fn primitive(&self) -> Option<Primitive> {
        self.type_expr.primitive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_declaration() {
        let field = FieldDecl::new("title")
            .declared("string")
            .bind(FieldDescriptor::new());
        let resolved = field.resolve("Post").unwrap().unwrap();
        assert_eq!(resolved.binding_name, "title");
        assert_eq!(resolved.type_expr.as_str(), "string");
        assert!(!resolved.is_nullable());
    }

    #[test]
    fn test_nullable_declaration_prefixes_marker() {
        let field = FieldDecl::new("ship")
            .declared_nullable("Address")
            .bind(FieldDescriptor::new().structure());
        let resolved = field.resolve("Order").unwrap().unwrap();
        assert_eq!(resolved.type_expr.as_str(), "?Address");
        assert!(resolved.is_nullable());
        assert!(resolved.is_structure);
    }

    #[test]
    fn test_explicit_values_win() {
        let field = FieldDecl::new("tags")
            .declared("array")
            .bind(FieldDescriptor::new().name("labels").ty("string[]"));
        let resolved = field.resolve("Order").unwrap().unwrap();
        assert_eq!(resolved.binding_name, "labels");
        assert!(resolved.is_list());
        assert_eq!(resolved.bare_name(), "string");
    }

    #[test]
    fn test_unbindable_field_resolves_to_none() {
        let field = FieldDecl::new("internal").declared("int");
        assert!(!field.is_bindable());
        assert_eq!(field.resolve("Order").unwrap(), None);
    }

    #[test]
    fn test_missing_type_information() {
        let field = FieldDecl::new("mystery").bind(FieldDescriptor::new());
        let err = field.resolve("Order").unwrap_err();
        assert_eq!(
            err,
            SchemaError::MetadataResolution {
                owner: "Order".into(),
                field: "mystery".into(),
            }
        );
    }

    #[test]
    fn test_invalid_expression_reports_context() {
        let field = FieldDecl::new("n").bind(FieldDescriptor::new().ty("int[][]"));
        match field.resolve("Order").unwrap_err() {
            SchemaError::InvalidTypeExpression {
                owner,
                field,
                expression,
                ..
            } => {
                assert_eq!(owner, "Order");
                assert_eq!(field, "n");
                assert_eq!(expression, "int[][]");
            }
            other => panic!("Expected InvalidTypeExpression, got: {other}"),
        }
    }

    #[test]
    fn test_resolution_does_not_mutate_descriptor() {
        let descriptor = FieldDescriptor::new();
        let field = FieldDecl::new("id").declared("int").bind(descriptor.clone());
        field.resolve("Order").unwrap();
        field.resolve("Order").unwrap();
        assert_eq!(field.descriptor, Some(descriptor));
    }

    #[test]
    fn test_deserialize_descriptor_keys() {
        let d: FieldDescriptor = serde_json::from_value(serde_json::json!({
            "name": "amount",
            "type": "?app.Money",
            "factory": "fromCents",
            "structure": false
        }))
        .unwrap();
        assert_eq!(d, FieldDescriptor::new().name("amount").ty("?app.Money").factory("fromCents"));
    }
}
