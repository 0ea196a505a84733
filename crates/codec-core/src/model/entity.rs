//! Traits, entities, relationships and constraints after resolution.

use crate::{
    model::{Field, ScalarType},
    schema::{CollectionKind, ConstraintKind, InheritanceStrategy, OnDelete, RelationSide},
};

/// Looks up a field by name in a merged field list.
fn find_field<'a>(fields: &'a [Field], name: &str) -> Option<&'a Field> {
    fields.iter().find(|field| field.name() == name)
}

/// A trait with its full field closure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trait {
    name: String,
    extends: Vec<String>,
    fields: Vec<Field>,
}

impl Trait {
    pub fn new(name: impl Into<String>, extends: Vec<String>, fields: Vec<Field>) -> Self {
        Self {
            name: name.into(),
            extends,
            fields,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Traits this trait directly extends.
    pub fn extends(&self) -> &[String] {
        &self.extends
    }

    /// Own fields merged with the closures of every extended trait.
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        find_field(&self.fields, name)
    }
}

/// A non-instantiable base type of an entity hierarchy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AbstractEntity {
    name: String,
    traits: Vec<String>,
    fields: Vec<Field>,
    strategy: InheritanceStrategy,
}

impl AbstractEntity {
    pub fn new(
        name: impl Into<String>,
        traits: Vec<String>,
        fields: Vec<Field>,
        strategy: InheritanceStrategy,
    ) -> Self {
        Self {
            name: name.into(),
            traits,
            fields,
            strategy,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn traits(&self) -> &[String] {
        &self.traits
    }

    /// Trait closures merged with own fields.
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        find_field(&self.fields, name)
    }

    pub fn strategy(&self) -> &InheritanceStrategy {
        &self.strategy
    }
}

/// A concrete entity with its effective field set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entity {
    name: String,
    base: Option<String>,
    traits: Vec<String>,
    fields: Vec<Field>,
    relationships: Vec<Relationship>,
    constraints: Vec<Constraint>,
}

impl Entity {
    pub fn new(
        name: impl Into<String>,
        base: Option<String>,
        traits: Vec<String>,
        fields: Vec<Field>,
        relationships: Vec<Relationship>,
        constraints: Vec<Constraint>,
    ) -> Self {
        Self {
            name: name.into(),
            base,
            traits,
            fields,
            relationships,
            constraints,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The abstract entity this entity extends, if any.
    pub fn base(&self) -> Option<&str> {
        self.base.as_deref()
    }

    pub fn traits(&self) -> &[String] {
        &self.traits
    }

    /// Base fields, then trait closures, then own fields.
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        find_field(&self.fields, name)
    }

    pub fn relationships(&self) -> &[Relationship] {
        &self.relationships
    }

    pub fn relationship(&self, name: &str) -> Option<&Relationship> {
        self.relationships.iter().find(|rel| rel.name() == name)
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    /// Columns of the primary key constraint, if one is declared.
    pub fn primary_key(&self) -> Option<&[String]> {
        self.constraints
            .iter()
            .find(|constraint| constraint.kind() == ConstraintKind::PrimaryKey)
            .map(Constraint::columns)
    }
}

/// The cardinality of a relationship.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelationKind {
    /// At most one target (`one`).
    Single,
    /// Many targets (`many`, `set`).
    Collection(CollectionKind),
    /// Many targets keyed by a scalar (`map(Key)`).
    Dictionary(ScalarType),
}

/// A verified association between entities.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    name: String,
    kind: RelationKind,
    target: String,
    foreign_key: Option<String>,
    mapped_by: Option<String>,
    on_delete: OnDelete,
}

impl Relationship {
    pub fn new(
        name: impl Into<String>,
        kind: RelationKind,
        target: impl Into<String>,
        foreign_key: Option<String>,
        mapped_by: Option<String>,
        on_delete: OnDelete,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            target: target.into(),
            foreign_key,
            mapped_by,
            on_delete,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &RelationKind {
        &self.kind
    }

    /// Name of the target entity; use [`ResolvedProject::entity_ref`](crate::model::ResolvedProject::entity_ref)
    /// to look it up.
    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn foreign_key(&self) -> Option<&str> {
        self.foreign_key.as_deref()
    }

    /// The owning relationship on the target, when this is the inverse side.
    pub fn mapped_by(&self) -> Option<&str> {
        self.mapped_by.as_deref()
    }

    pub fn on_delete(&self) -> OnDelete {
        self.on_delete
    }

    /// The inverse side names its owning counterpart with `mapped_by`.
    pub fn side(&self) -> RelationSide {
        if self.mapped_by.is_some() {
            RelationSide::Inverse
        } else {
            RelationSide::Owning
        }
    }
}

/// A table-level constraint whose columns all name merged fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Constraint {
    PrimaryKey(Vec<String>),
    Unique(Vec<String>),
    Index(Vec<String>),
}

impl Constraint {
    pub fn new(kind: ConstraintKind, columns: Vec<String>) -> Self {
        match kind {
            ConstraintKind::PrimaryKey => Constraint::PrimaryKey(columns),
            ConstraintKind::Unique => Constraint::Unique(columns),
            ConstraintKind::Index => Constraint::Index(columns),
        }
    }

    pub fn kind(&self) -> ConstraintKind {
        match self {
            Constraint::PrimaryKey(_) => ConstraintKind::PrimaryKey,
            Constraint::Unique(_) => ConstraintKind::Unique,
            Constraint::Index(_) => ConstraintKind::Index,
        }
    }

    pub fn columns(&self) -> &[String] {
        match self {
            Constraint::PrimaryKey(columns)
            | Constraint::Unique(columns)
            | Constraint::Index(columns) => columns,
        }
    }
}
