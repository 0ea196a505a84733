//! Views and their validated queries.

use std::fmt;

use crate::{
    model::Field,
    schema::{CompareOp, Literal},
};

/// A `from` clause: an entity, optionally under an alias.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Source {
    entity: String,
    alias: Option<String>,
}

impl Source {
    pub fn new(entity: impl Into<String>, alias: Option<String>) -> Self {
        Self {
            entity: entity.into(),
            alias,
        }
    }

    pub fn entity(&self) -> &str {
        &self.entity
    }

    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    /// The name other clauses use to qualify fields of this source.
    pub fn qualifier(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.entity)
    }
}

/// A field reference bound to the source that provides it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldRef {
    source: usize,
    field: String,
}

impl FieldRef {
    /// `source` is the index of the providing clause in [`Query::sources`].
    pub fn new(source: usize, field: impl Into<String>) -> Self {
        Self {
            source,
            field: field.into(),
        }
    }

    pub fn source(&self) -> usize {
        self.source
    }

    pub fn field(&self) -> &str {
        &self.field
    }
}

/// The right-hand side of a filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
    Literal(Literal),
    Field(FieldRef),
}

/// A `where` clause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    field: FieldRef,
    op: CompareOp,
    operand: Operand,
}

impl Filter {
    pub fn new(field: FieldRef, op: CompareOp, operand: Operand) -> Self {
        Self { field, op, operand }
    }

    pub fn field(&self) -> &FieldRef {
        &self.field
    }

    pub fn op(&self) -> CompareOp {
        self.op
    }

    pub fn operand(&self) -> &Operand {
        &self.operand
    }
}

/// One projected column of a `select` clause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    field: FieldRef,
    alias: Option<String>,
}

impl Selection {
    pub fn new(field: FieldRef, alias: Option<String>) -> Self {
        Self { field, alias }
    }

    pub fn field(&self) -> &FieldRef {
        &self.field
    }

    /// The output column name: the alias if present, else the field name.
    pub fn output_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(self.field.field())
    }
}

/// A query whose every field reference is bound to a source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    sources: Vec<Source>,
    filters: Vec<Filter>,
    selections: Vec<Selection>,
}

impl Query {
    pub fn new(sources: Vec<Source>, filters: Vec<Filter>, selections: Vec<Selection>) -> Self {
        Self {
            sources,
            filters,
            selections,
        }
    }

    pub fn sources(&self) -> &[Source] {
        &self.sources
    }

    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    pub fn selections(&self) -> &[Selection] {
        &self.selections
    }

    /// The source a field reference is bound to.
    pub fn source_of(&self, field: &FieldRef) -> Option<&Source> {
        self.sources.get(field.source())
    }

    /// Renders `qualifier.field` for a bound reference.
    pub fn qualified<'a>(&'a self, field: &'a FieldRef) -> QualifiedField<'a> {
        QualifiedField {
            qualifier: self.source_of(field).map(Source::qualifier),
            field: field.field(),
        }
    }
}

/// Display helper returned by [`Query::qualified`].
pub struct QualifiedField<'a> {
    qualifier: Option<&'a str>,
    field: &'a str,
}

impl fmt::Display for QualifiedField<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.qualifier {
            Some(qualifier) => write!(f, "{qualifier}.{}", self.field),
            None => f.write_str(self.field),
        }
    }
}

/// A read-only projection over one or more entities.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct View {
    name: String,
    traits: Vec<String>,
    fields: Vec<Field>,
    query: Query,
}

impl View {
    pub fn new(name: impl Into<String>, traits: Vec<String>, fields: Vec<Field>, query: Query) -> Self {
        Self {
            name: name.into(),
            traits,
            fields,
            query,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn traits(&self) -> &[String] {
        &self.traits
    }

    /// Trait closures merged with the projected fields declared on the view.
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn query(&self) -> &Query {
        &self.query
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_qualifier_prefers_alias() {
        assert_eq!(Source::new("Person", None).qualifier(), "Person");
        assert_eq!(Source::new("Person", Some("p".to_string())).qualifier(), "p");
    }

    #[test]
    fn test_qualified_field_borrows_query_and_reference() {
        let query = Query::new(
            vec![Source::new("Person", Some("p".to_string()))],
            vec![],
            vec![],
        );
        let fields = vec![FieldRef::new(0, "name"), FieldRef::new(0, "email")];

        let rendered: Vec<QualifiedField<'_>> =
            fields.iter().map(|field| query.qualified(field)).collect();

        let names: Vec<String> = rendered.iter().map(ToString::to_string).collect();
        assert_eq!(names, vec!["p.name", "p.email"]);
    }

    #[test]
    fn test_qualified_field_display() {
        let query = Query::new(
            vec![
                Source::new("Person", Some("p".to_string())),
                Source::new("Document", None),
            ],
            vec![],
            vec![],
        );

        assert_eq!(query.qualified(&FieldRef::new(0, "name")).to_string(), "p.name");
        assert_eq!(
            query.qualified(&FieldRef::new(1, "number")).to_string(),
            "Document.number"
        );
    }

    #[test]
    fn test_selection_output_name() {
        let plain = Selection::new(FieldRef::new(0, "name"), None);
        let renamed = Selection::new(FieldRef::new(0, "name"), Some("person_name".to_string()));

        assert_eq!(plain.output_name(), "name");
        assert_eq!(renamed.output_name(), "person_name");
    }
}
