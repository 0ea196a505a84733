//! Field types and type aliases.

use std::fmt;

use crate::{annotation::Annotation, primitive::PrimitiveType};

/// A scalar type after alias resolution.
///
/// Keeps the name of the alias the field was declared with, if any, so
/// generators can emit a dedicated value type for it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ScalarType {
    primitive: PrimitiveType,
    alias: Option<String>,
}

impl ScalarType {
    /// A scalar declared directly with a primitive keyword.
    pub fn primitive(primitive: PrimitiveType) -> Self {
        Self {
            primitive,
            alias: None,
        }
    }

    /// A scalar declared through the type alias `alias`.
    pub fn aliased(primitive: PrimitiveType, alias: impl Into<String>) -> Self {
        Self {
            primitive,
            alias: Some(alias.into()),
        }
    }

    /// The primitive type every alias in the chain resolves to.
    pub fn primitive_type(&self) -> PrimitiveType {
        self.primitive
    }

    /// The alias name used at the declaration site.
    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.alias {
            Some(alias) => f.write_str(alias),
            None => write!(f, "{}", self.primitive),
        }
    }
}

/// A parameter or return type of a service function.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ValueType {
    Scalar(ScalarType),
    /// A concrete or abstract entity, by name.
    Entity(String),
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueType::Scalar(scalar) => write!(f, "{scalar}"),
            ValueType::Entity(name) => f.write_str(name),
        }
    }
}

/// A field after merging, with its alias annotations folded in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    name: String,
    ty: ScalarType,
    mutable: bool,
    annotations: Vec<Annotation>,
}

impl Field {
    pub fn new(
        name: impl Into<String>,
        ty: ScalarType,
        mutable: bool,
        annotations: Vec<Annotation>,
    ) -> Self {
        Self {
            name: name.into(),
            ty,
            mutable,
            annotations,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ty(&self) -> &ScalarType {
        &self.ty
    }

    /// `true` for `var` fields, `false` for `val` fields.
    pub fn is_mutable(&self) -> bool {
        self.mutable
    }

    /// Effective annotations: the alias chain's annotations overridden by
    /// the field's own.
    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    /// Returns `true` if two declarations of a field agree on type and mutability.
    ///
    /// Annotations do not take part: the same trait field reached along two
    /// inheritance paths is the same field.
    pub fn is_compatible_with(&self, other: &Field) -> bool {
        self.name == other.name
            && self.ty.primitive_type() == other.ty.primitive_type()
            && self.mutable == other.mutable
    }
}

/// A resolved type alias.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alias {
    name: String,
    primitive: PrimitiveType,
    annotations: Vec<Annotation>,
}

impl Alias {
    pub fn new(name: impl Into<String>, primitive: PrimitiveType, annotations: Vec<Annotation>) -> Self {
        Self {
            name: name.into(),
            primitive,
            annotations,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The primitive the alias chain terminates in.
    pub fn primitive(&self) -> PrimitiveType {
        self.primitive
    }

    /// Annotations accumulated along the alias chain, innermost alias first.
    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    /// The scalar type a field declared with this alias has.
    pub fn scalar_type(&self) -> ScalarType {
        ScalarType::aliased(self.primitive, self.name.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_display_prefers_alias() {
        let plain = ScalarType::primitive(PrimitiveType::String);
        let email = ScalarType::aliased(PrimitiveType::String, "Email");

        assert_eq!(plain.to_string(), "String");
        assert_eq!(email.to_string(), "Email");
        assert_eq!(email.primitive_type(), PrimitiveType::String);
    }

    #[test]
    fn test_field_compatibility_ignores_alias_and_annotations() {
        let a = Field::new(
            "email",
            ScalarType::aliased(PrimitiveType::String, "Email"),
            true,
            vec![Annotation::Max(10)],
        );
        let b = Field::new(
            "email",
            ScalarType::primitive(PrimitiveType::String),
            true,
            Vec::new(),
        );

        assert!(a.is_compatible_with(&b));
    }

    #[test]
    fn test_field_compatibility_checks_type_and_mutability() {
        let name = Field::new("name", ScalarType::primitive(PrimitiveType::String), true, vec![]);
        let number = Field::new("name", ScalarType::primitive(PrimitiveType::Int32), true, vec![]);
        let frozen = Field::new("name", ScalarType::primitive(PrimitiveType::String), false, vec![]);

        assert!(!name.is_compatible_with(&number));
        assert!(!name.is_compatible_with(&frozen));
    }
}
