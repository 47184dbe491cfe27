//! # Schema Descriptions
//!
//! Structure declarations written as YAML or JSON documents:
//!
//! ```yaml
//! allow_recursion: false
//! structures:
//!   Address:
//!     fields:
//!       - ident: city
//!         declared: string
//!         bind: {}
//!   Order:
//!     extends: Command
//!     fields:
//!       - ident: tags
//!         bind: { type: "string[]" }
//! ```
//!
//! Documents are validated against the bundled JSON Schema first, then
//! deserialized and applied to a [`SchemaBuilder`]. Scalar wrappers need
//! code (their constructors), so they are registered on the builder
//! before the description is applied.

use std::collections::BTreeMap;
use std::path::Path;

use commander_core::{FieldDecl, FieldDescriptor, SchemaError};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::decl::StructureDecl;
use crate::registry::{Schema, SchemaBuilder};
use crate::validate::{DescriptionValidator, ValidationViolations};

/// Error while loading a schema description.
#[derive(Error, Debug)]
pub enum DescriptionError {
    /// The document did not conform to the description schema.
    #[error("schema description '{source_name}' is invalid:\n{violations}")]
    ValidationFailed {
        /// File path or other label of the document.
        source_name: String,
        /// Structured list of individual violations.
        violations: ValidationViolations,
    },

    /// The document could not be read or parsed.
    #[error("cannot load schema description '{path}': {reason}")]
    LoadError {
        /// Path to the document.
        path: String,
        /// Why loading failed.
        reason: String,
    },

    /// The bundled description schema could not be compiled.
    #[error("cannot build description validator: {reason}")]
    ValidatorBuild {
        /// Why compilation failed.
        reason: String,
    },

    /// The declarations were read but do not form a valid schema.
    #[error(transparent)]
    Schema(#[from] SchemaError),
}

/// A whole description document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SchemaDescription {
    /// See [`SchemaBuilder::allow_recursion`].
    #[serde(default)]
    pub allow_recursion: bool,
    /// Structure declarations by name.
    pub structures: BTreeMap<String, StructureDescription>,
}

/// One structure in a description.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StructureDescription {
    /// Parent structure.
    #[serde(default)]
    pub extends: Option<String>,
    /// Own fields, in declaration order.
    #[serde(default)]
    pub fields: Vec<FieldDescription>,
}

/// One field in a description.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldDescription {
    /// Field identifier.
    pub ident: String,
    /// Declared type name.
    #[serde(default)]
    pub declared: Option<String>,
    /// Whether the declared type admits null.
    #[serde(default)]
    pub nullable: bool,
    /// Binding metadata; absent means the field is not bound.
    #[serde(default)]
    pub bind: Option<FieldDescriptor>,
}

impl FieldDescription {
    fn into_decl(self) -> FieldDecl {
        let mut decl = FieldDecl::new(self.ident);
        decl = match (self.declared, self.nullable) {
            (Some(name), true) => decl.declared_nullable(name),
            (Some(name), false) => decl.declared(name),
            (None, _) => decl,
        };
        match self.bind {
            Some(descriptor) => decl.bind(descriptor),
            None => decl,
        }
    }
}

impl SchemaDescription {
    /// Validate and deserialize a parsed document.
    ///
    /// # Errors
    ///
    /// `ValidationFailed` with every violation, or `LoadError` if the
    /// validated document still does not deserialize.
    pub fn from_value(source_name: &str, document: &Value) -> Result<Self, DescriptionError> {
        DescriptionValidator::new()?.validate(source_name, document)?;
        Self::deserialize(document).map_err(|e| DescriptionError::LoadError {
            path: source_name.to_string(),
            reason: e.to_string(),
        })
    }

    /// Parse a JSON document.
    pub fn from_json_str(source_name: &str, text: &str) -> Result<Self, DescriptionError> {
        let document: Value = serde_json::from_str(text).map_err(|e| DescriptionError::LoadError {
            path: source_name.to_string(),
            reason: format!("invalid JSON: {e}"),
        })?;
        Self::from_value(source_name, &document)
    }

    /// Parse a YAML document.
    pub fn from_yaml_str(source_name: &str, text: &str) -> Result<Self, DescriptionError> {
        let document: Value = serde_yaml::from_str(text).map_err(|e| DescriptionError::LoadError {
            path: source_name.to_string(),
            reason: format!("invalid YAML: {e}"),
        })?;
        Self::from_value(source_name, &document)
    }

    /// Read a description file. `.yaml` and `.yml` files are parsed as YAML,
    /// anything else as JSON.
    pub fn load(path: &Path) -> Result<Self, DescriptionError> {
        let source_name = path.display().to_string();
        let text = std::fs::read_to_string(path).map_err(|e| DescriptionError::LoadError {
            path: source_name.clone(),
            reason: format!("cannot read file: {e}"),
        })?;

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        let description = match ext {
            "yaml" | "yml" => Self::from_yaml_str(&source_name, &text)?,
            _ => Self::from_json_str(&source_name, &text)?,
        };
        tracing::debug!(
            path = %source_name,
            structures = description.structures.len(),
            "schema description loaded"
        );
        Ok(description)
    }

    /// Register every described structure on `builder`.
    pub fn apply(self, builder: SchemaBuilder) -> SchemaBuilder {
        let mut builder = builder;
        if self.allow_recursion {
            builder = builder.allow_recursion(true);
        }
        for (name, structure) in self.structures {
            let mut decl = StructureDecl::new(name);
            if let Some(parent) = structure.extends {
                decl = decl.extends(parent);
            }
            for field in structure.fields {
                decl = decl.field(field.into_decl());
            }
            builder = builder.structure(decl);
        }
        builder
    }

    /// A fresh builder holding only the described structures.
    pub fn into_builder(self) -> SchemaBuilder {
        self.apply(SchemaBuilder::new())
    }
}

/// Load a description file and build it into a schema with no scalar
/// wrappers.
pub fn load_schema(path: &Path) -> Result<Schema, DescriptionError> {
    Ok(SchemaDescription::load(path)?.into_builder().build()?)
}
