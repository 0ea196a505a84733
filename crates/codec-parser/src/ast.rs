//! Raw syntax tree produced by the parser.
//!
//! Leaf values that diagnostics may cite (names, type references, column
//! names) are wrapped in [`Spanned`]. Composite nodes own their children, so
//! a [`CodecProject`] is independent of the source buffer it was parsed from.
//!
//! Equality ignores spans: parsing the same text at different offsets yields
//! equal trees.

use std::fmt;

use codec_core::{
    annotation::Annotation,
    primitive::PrimitiveType,
    schema::{
        CollectionKind, CompareOp, ConstraintKind, InheritanceStrategy, Literal, OnDelete,
        RelationSide,
    },
};

pub use codec_core::statement::Statement;

use crate::span::{Span, Spanned};

/// The root of a parsed schema.
///
/// Declarations are kept in source order per kind. Order carries no meaning:
/// resolution is order-independent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CodecProject {
    /// Every `package` declaration; more than one is reported by the resolver.
    pub packages: Vec<Spanned<String>>,
    pub type_aliases: Vec<TypeAlias>,
    pub traits: Vec<TraitDefinition>,
    pub abstract_entities: Vec<AbstractEntityDefinition>,
    pub entities: Vec<EntityDefinition>,
    pub services: Vec<ServiceDefinition>,
    pub views: Vec<ViewDefinition>,
    pub configs: Vec<ConfigDefinition>,
}

impl CodecProject {
    /// The package name, taken from the first `package` declaration.
    pub fn package(&self) -> Option<&Spanned<String>> {
        self.packages.first()
    }

    /// Total number of top-level declarations, package declarations included.
    pub fn declaration_count(&self) -> usize {
        self.packages.len()
            + self.type_aliases.len()
            + self.traits.len()
            + self.abstract_entities.len()
            + self.entities.len()
            + self.services.len()
            + self.views.len()
            + self.configs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.declaration_count() == 0
    }
}

/// A type as written at a use site.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeRef {
    Primitive(PrimitiveType),
    /// A PascalCase name: a type alias, or an entity where the context allows.
    Named(String),
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Primitive(primitive) => write!(f, "{primitive}"),
            TypeRef::Named(name) => f.write_str(name),
        }
    }
}

/// `type Email = String { constraint max_len(254) }`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeAlias {
    pub name: Spanned<String>,
    pub target: Spanned<TypeRef>,
    pub annotations: Vec<Spanned<Annotation>>,
}

/// `var name: String` or `val id: Uuid { constraint unique }`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDefinition {
    pub name: Spanned<String>,
    pub ty: Spanned<TypeRef>,
    /// `true` for `var`, `false` for `val`.
    pub mutable: bool,
    pub annotations: Vec<Spanned<Annotation>>,
}

impl FieldDefinition {
    pub fn span(&self) -> Span {
        let span = self.name.span().union(self.ty.span());
        self.annotations
            .iter()
            .fold(span, |acc, annotation| acc.union(annotation.span()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraitDefinition {
    pub name: Spanned<String>,
    pub extends: Vec<Spanned<String>>,
    pub fields: Vec<FieldDefinition>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AbstractEntityDefinition {
    pub name: Spanned<String>,
    pub traits: Vec<Spanned<String>>,
    pub fields: Vec<FieldDefinition>,
    /// Every `inheritance` clause in the body; more than one is reported by
    /// the resolver.
    pub strategies: Vec<Spanned<InheritanceStrategy>>,
}

impl AbstractEntityDefinition {
    /// The declared strategy, defaulting to joined-table.
    pub fn strategy(&self) -> InheritanceStrategy {
        self.strategies
            .first()
            .map(|strategy| strategy.inner().clone())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityDefinition {
    pub name: Spanned<String>,
    /// Names after the colon. The resolver sorts them into at most one base
    /// abstract entity and any number of traits.
    pub supertypes: Vec<Spanned<String>>,
    pub fields: Vec<FieldDefinition>,
    pub relationships: Vec<RelationshipDefinition>,
    pub constraints: Vec<ConstraintDefinition>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelationKind {
    /// `one Target`
    Single,
    /// `many Target` or `set Target`
    Collection(CollectionKind),
    /// `map(Key) Target`
    Dictionary(Spanned<TypeRef>),
}

/// `relation documents: many Document mapped_by(owner) on_delete(cascade)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationshipDefinition {
    pub name: Spanned<String>,
    pub kind: RelationKind,
    pub target: Spanned<String>,
    pub foreign_key: Option<Spanned<String>>,
    pub mapped_by: Option<Spanned<String>>,
    pub on_delete: OnDelete,
}

impl RelationshipDefinition {
    pub fn side(&self) -> RelationSide {
        if self.mapped_by.is_some() {
            RelationSide::Inverse
        } else {
            RelationSide::Owning
        }
    }
}

/// `constraint unique(email)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConstraintDefinition {
    PrimaryKey(Vec<Spanned<String>>),
    Unique(Vec<Spanned<String>>),
    Index(Vec<Spanned<String>>),
}

impl ConstraintDefinition {
    pub fn new(kind: ConstraintKind, columns: Vec<Spanned<String>>) -> Self {
        match kind {
            ConstraintKind::PrimaryKey => ConstraintDefinition::PrimaryKey(columns),
            ConstraintKind::Unique => ConstraintDefinition::Unique(columns),
            ConstraintKind::Index => ConstraintDefinition::Index(columns),
        }
    }

    pub fn kind(&self) -> ConstraintKind {
        match self {
            ConstraintDefinition::PrimaryKey(_) => ConstraintKind::PrimaryKey,
            ConstraintDefinition::Unique(_) => ConstraintKind::Unique,
            ConstraintDefinition::Index(_) => ConstraintKind::Index,
        }
    }

    pub fn columns(&self) -> &[Spanned<String>] {
        match self {
            ConstraintDefinition::PrimaryKey(columns)
            | ConstraintDefinition::Unique(columns)
            | ConstraintDefinition::Index(columns) => columns,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceDefinition {
    pub name: Spanned<String>,
    pub functions: Vec<FunctionDefinition>,
}

/// `fn register(name: String, email: Email) -> Individual { ... }`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionDefinition {
    pub name: Spanned<String>,
    pub parameters: Vec<ParameterDefinition>,
    pub returns: Option<Spanned<TypeRef>>,
    pub body: Vec<Statement>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterDefinition {
    pub name: Spanned<String>,
    pub ty: Spanned<TypeRef>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewDefinition {
    pub name: Spanned<String>,
    pub traits: Vec<Spanned<String>>,
    pub fields: Vec<FieldDefinition>,
    pub query: QueryBlock,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryBlock {
    pub from: Vec<FromClause>,
    pub filters: Vec<WhereClause>,
    pub select: SelectClause,
}

/// `from Person as p`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FromClause {
    pub entity: Spanned<String>,
    pub alias: Option<Spanned<String>>,
}

/// `name` or `p.name`; the qualifier is an entity name or a `from` alias.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPath {
    pub qualifier: Option<Spanned<String>>,
    pub field: Spanned<String>,
}

impl FieldPath {
    pub fn span(&self) -> Span {
        match &self.qualifier {
            Some(qualifier) => qualifier.span().union(self.field.span()),
            None => self.field.span(),
        }
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.qualifier {
            Some(qualifier) => write!(f, "{qualifier}.{}", self.field),
            None => write!(f, "{}", self.field),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
    Literal(Spanned<Literal>),
    Field(FieldPath),
}

/// `where p.age >= 18`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WhereClause {
    pub field: FieldPath,
    pub op: CompareOp,
    pub operand: Operand,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectClause {
    pub fields: Vec<SelectField>,
}

/// `p.name as person_name`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectField {
    pub path: FieldPath,
    pub alias: Option<Spanned<String>>,
}

/// `config { schema = "people" }`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigDefinition {
    pub settings: Vec<Setting>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Setting {
    pub key: Spanned<String>,
    pub value: Spanned<String>,
}
