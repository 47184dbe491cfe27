//! # Description Validation
//!
//! Checks schema-description documents against the bundled JSON Schema
//! (Draft 2020-12) before they are converted into declarations.
//!
//! Validation is the first gate for descriptions read from disk: documents
//! that fail are rejected with every violation listed, each carrying the
//! instance path and the schema path that triggered it.

use std::fmt;

use jsonschema::Validator;
use serde_json::Value;

use crate::description::DescriptionError;

/// Name under which the bundled schema is reported.
pub const DESCRIPTION_SCHEMA_NAME: &str = "schema-description.schema.json";

const DESCRIPTION_SCHEMA: &str = include_str!("../schemas/schema-description.schema.json");

/// One place where a description breaks the bundled schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// Pointer into the description document; empty for the document itself.
    pub instance_path: String,
    /// Pointer to the schema keyword that failed.
    pub schema_path: String,
    pub message: String,
}

impl Violation {
    fn from_error(err: &jsonschema::ValidationError<'_>) -> Self {
        Self {
            instance_path: err.instance_path.to_string(),
            schema_path: err.schema_path.to_string(),
            message: err.to_string(),
        }
    }

    /// Where the violation sits, with `(root)` for the whole document.
    pub fn location(&self) -> &str {
        if self.instance_path.is_empty() {
            "(root)"
        } else {
            &self.instance_path
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.location(), self.schema_path, self.message)
    }
}

/// Every violation found in one description, in validator order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationViolations(Vec<Violation>);

impl ValidationViolations {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Violation> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[Violation] {
        &self.0
    }
}

impl<'a> IntoIterator for &'a ValidationViolations {
    type Item = &'a Violation;
    type IntoIter = std::slice::Iter<'a, Violation>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// One `- location (keyword): message` line per violation.
impl fmt::Display for ValidationViolations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut lines = self.0.iter().peekable();
        while let Some(violation) = lines.next() {
            write!(f, "  - {violation}")?;
            if lines.peek().is_some() {
                f.write_str("\n")?;
            }
        }
        Ok(())
    }
}

/// Compiled validator for schema descriptions.
///
/// Compile once and reuse; `DescriptionValidator` is `Send + Sync`.
pub struct DescriptionValidator {
    validator: Validator,
}

impl fmt::Debug for DescriptionValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DescriptionValidator")
            .field("schema", &DESCRIPTION_SCHEMA_NAME)
            .finish()
    }
}

impl DescriptionValidator {
    /// Compile the bundled description schema.
    ///
    /// # Errors
    ///
    /// `DescriptionError::ValidatorBuild` if the bundled schema does not
    /// parse or compile.
    pub fn new() -> Result<Self, DescriptionError> {
        let schema: Value =
            serde_json::from_str(DESCRIPTION_SCHEMA).map_err(|e| DescriptionError::ValidatorBuild {
                reason: format!("invalid JSON: {e}"),
            })?;
        let validator = jsonschema::options()
            .with_draft(jsonschema::Draft::Draft202012)
            .build(&schema)
            .map_err(|e| DescriptionError::ValidatorBuild {
                reason: e.to_string(),
            })?;
        Ok(Self { validator })
    }

    /// Validate a parsed description document.
    ///
    /// # Errors
    ///
    /// `DescriptionError::ValidationFailed` listing every violation.
    pub fn validate(&self, source_name: &str, document: &Value) -> Result<(), DescriptionError> {
        let violations: Vec<Violation> = self
            .validator
            .iter_errors(document)
            .map(|e| Violation::from_error(&e))
            .collect();

        if violations.is_empty() {
            Ok(())
        } else {
            tracing::debug!(
                source = source_name,
                violations = violations.len(),
                "schema description rejected"
            );
            Err(DescriptionError::ValidationFailed {
                source_name: source_name.to_string(),
                violations: ValidationViolations(violations),
            })
        }
    }
}
