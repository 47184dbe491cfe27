//! # Type Expressions
//!
//! A field's type is written as `['?'] name ['[]']`:
//!
//! | Expression   | Nullable | List | Bare name |
//! |--------------|----------|------|-----------|
//! | `string`     | no       | no   | `string`  |
//! | `?int`       | yes      | no   | `int`     |
//! | `Address[]`  | no       | yes  | `Address` |
//! | `?app.Money` | yes      | no   | `app.Money` |
//!
//! The derived properties are computed from the expression text every time
//! they are asked for; nothing is cached.

use std::fmt;

use thiserror::Error;

/// The four primitive kinds a field can coerce to without a registered type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    /// Strict: input must already be a string.
    String,
    /// Permissive numeric conversion.
    Int,
    /// Strict: input must be a number.
    Float,
    /// Permissive truthiness.
    Bool,
}

impl Primitive {
    /// All primitives, in grammar order.
    pub const ALL: [Primitive; 4] = [Self::String, Self::Int, Self::Float, Self::Bool];

    /// Resolve a bare type name to a primitive.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "string" => Some(Self::String),
            "int" => Some(Self::Int),
            "float" => Some(Self::Float),
            "bool" => Some(Self::Bool),
            _ => None,
        }
    }

    /// The grammar spelling of this primitive.
    pub fn name(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Int => "int",
            Self::Float => "float",
            Self::Bool => "bool",
        }
    }
}

impl fmt::Display for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Why a type expression was rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TypeExprError {
    /// Nothing left once the markers are stripped.
    #[error("missing type name")]
    EmptyName,

    /// A character outside the type-name alphabet.
    #[error("unexpected character '{0}' in type name")]
    InvalidCharacter(char),
}

/// A parsed, validated type expression.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeExpr(String);

impl TypeExpr {
    /// Parse and validate an expression.
    pub fn parse(raw: &str) -> Result<Self, TypeExprError> {
        let rest = raw.strip_prefix('?').unwrap_or(raw);
        let name = rest.strip_suffix("[]").unwrap_or(rest);

        if name.is_empty() {
            return Err(TypeExprError::EmptyName);
        }
        if let Some(c) = name.chars().find(|c| !is_name_char(*c)) {
            return Err(TypeExprError::InvalidCharacter(c));
        }

        Ok(Self(raw.to_string()))
    }

    /// Synthesize the expression for a declared field type.
    pub fn declared(type_name: &str, nullable: bool) -> Result<Self, TypeExprError> {
        let prefix = if nullable { "?" } else { "" };
        Self::parse(&format!("{prefix}{type_name}"))
    }

    /// The type name with the `?` and `[]` markers removed.
    pub fn bare_name(&self) -> &str {
        self.0.trim_matches(|c| matches!(c, '?' | '[' | ']'))
    }

    /// Whether the expression ends in `[]`.
    pub fn is_list(&self) -> bool {
        self.0.ends_with("[]")
    }

    /// Whether the expression starts with `?`.
    pub fn is_nullable(&self) -> bool {
        self.0.starts_with('?')
    }

    /// The primitive this expression names, if any.
    pub fn primitive(&self) -> Option<Primitive> {
        Primitive::from_name(self.bare_name())
    }

    /// The expression as written.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '.' | ':' | '\\')
}
