//! Maps a resolved project onto PostgreSQL tables.
//!
//! Storage follows the inheritance strategy of each hierarchy:
//!
//! - `joined_table`: the abstract entity has a table holding the inherited
//!   columns; every subtype table holds its own columns and references the
//!   base row through its primary key.
//! - `single_table`: the whole hierarchy shares the abstract entity's table.
//!   Columns declared only by some subtypes are nullable and the
//!   discriminator column tells rows apart.
//!
//! Owning relationships become foreign keys. A `one` relationship adds a
//! column to the owner's table; a `many`/`set` relationship with a
//! `foreign_key` adds the column to the target's table; every other
//! collection and dictionary gets a join table.

use log::{debug, trace};

use codec_core::{
    annotation::Annotation,
    model::{AbstractEntity, Entity, EntityRef, Field, RelationKind, Relationship, ResolvedProject},
    primitive::PrimitiveType,
    schema::{CollectionKind, ConstraintKind, InheritanceKind, OnDelete, RelationSide},
};

use crate::{config::NamingConfig, generate::GenerationError};

use super::{quote_ident, string_literal};

/// Tables and indexes of a project, in declaration order.
#[derive(Debug, Default)]
pub(super) struct Schema {
    pub tables: Vec<Table>,
    pub indexes: Vec<Index>,
}

impl Schema {
    fn table_mut(&mut self, name: &str) -> Option<&mut Table> {
        self.tables.iter_mut().find(|table| table.name == name)
    }
}

#[derive(Debug)]
pub(super) struct Table {
    pub name: String,
    pub columns: Vec<Column>,
    pub primary_key: Vec<String>,
    pub unique: Vec<Vec<String>>,
    pub foreign_keys: Vec<ForeignKey>,
}

impl Table {
    fn new(name: String) -> Self {
        Self {
            name,
            columns: Vec::new(),
            primary_key: Vec::new(),
            unique: Vec::new(),
            foreign_keys: Vec::new(),
        }
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|column| column.name == name)
    }

    fn has_columns(&self, names: &[String]) -> bool {
        names.iter().all(|name| self.has_column(name))
    }

    fn add_column(&mut self, column: Column) {
        if !self.has_column(&column.name) {
            self.columns.push(column);
        }
    }

    fn add_unique(&mut self, columns: Vec<String>) {
        if !self.unique.contains(&columns) {
            self.unique.push(columns);
        }
    }
}

#[derive(Debug)]
pub(super) struct Column {
    pub name: String,
    pub sql_type: String,
    pub nullable: bool,
    pub unique: bool,
    pub checks: Vec<String>,
}

impl Column {
    fn new(name: String, sql_type: String, nullable: bool) -> Self {
        Self {
            name,
            sql_type,
            nullable,
            unique: false,
            checks: Vec::new(),
        }
    }
}

#[derive(Debug)]
pub(super) struct ForeignKey {
    pub columns: Vec<String>,
    pub table: String,
    pub references: Vec<String>,
    pub on_delete: OnDelete,
}

#[derive(Debug)]
pub(super) struct Index {
    pub name: String,
    pub table: String,
    pub columns: Vec<String>,
}

/// Builds the table layout of `project`.
///
/// # Errors
///
/// Returns [`GenerationError::Unsupported`] when a foreign key would point at
/// an entity without a single-column primary key, or when a constraint spans
/// columns stored in different tables of a joined hierarchy.
pub(super) fn plan(
    project: &ResolvedProject,
    naming: NamingConfig,
) -> Result<Schema, GenerationError> {
    let planner = Planner { project, naming };
    let mut schema = Schema::default();

    for base in project.abstract_entities() {
        let table = planner.abstract_table(base, &mut schema)?;
        schema.tables.push(table);
    }

    for entity in project.entities() {
        if planner.shares_base_table(entity) {
            continue;
        }
        let table = planner.entity_table(entity, &mut schema)?;
        schema.tables.push(table);
    }

    for entity in project.entities() {
        for relationship in entity.relationships() {
            if relationship.side() == RelationSide::Inverse {
                continue;
            }
            planner.relationship(entity, relationship, &mut schema)?;
        }
    }

    debug!(
        tables = schema.tables.len(),
        indexes = schema.indexes.len();
        "Planned PostgreSQL schema"
    );
    Ok(schema)
}

/// A single-column key other tables can reference.
struct KeyRef {
    table: String,
    column: String,
    sql_type: String,
}

struct Planner<'a> {
    project: &'a ResolvedProject,
    naming: NamingConfig,
}

impl<'a> Planner<'a> {
    fn table_name(&self, name: &str) -> String {
        self.naming.table().apply(name)
    }

    fn column_name(&self, name: &str) -> String {
        self.naming.column().apply(name)
    }

    fn column_names(&self, names: &[String]) -> Vec<String> {
        names.iter().map(|name| self.column_name(name)).collect()
    }

    fn is_single_table(&self, name: &str) -> bool {
        self.project
            .abstract_entity(name)
            .is_some_and(|base| base.strategy().kind() == InheritanceKind::SingleTable)
    }

    fn shares_base_table(&self, entity: &Entity) -> bool {
        entity.base().is_some_and(|base| self.is_single_table(base))
    }

    /// The table rows of `name` are stored in.
    fn storage_table(&self, name: &str) -> String {
        let stored_as = self
            .project
            .entity(name)
            .and_then(Entity::base)
            .filter(|base| self.is_single_table(base))
            .unwrap_or(name);
        self.table_name(stored_as)
    }

    /// Primary key fields of the table storing `name`.
    ///
    /// An abstract entity borrows the key of its first subtype whose primary
    /// key consists of inherited fields only.
    fn key_fields(&self, name: &str) -> Vec<&'a Field> {
        match self.project.entity_ref(name) {
            Some(EntityRef::Concrete(entity)) => {
                let own = primary_key_fields(entity, entity.fields());
                match entity.base() {
                    Some(base) if self.is_single_table(base) => self.key_fields(base),
                    Some(base) if own.is_empty() => self.key_fields(base),
                    _ => own,
                }
            }
            Some(EntityRef::Abstract(base)) => self
                .project
                .subtypes_of(base.name())
                .map(|entity| primary_key_fields(entity, base.fields()))
                .find(|fields| !fields.is_empty())
                .unwrap_or_default(),
            None => Vec::new(),
        }
    }

    fn key_names(&self, name: &str) -> Vec<String> {
        self.key_fields(name)
            .iter()
            .map(|field| self.column_name(field.name()))
            .collect()
    }

    /// The key a foreign key from `site` to `name` points at.
    fn single_key(&self, name: &str, site: &str) -> Result<KeyRef, GenerationError> {
        match self.key_fields(name).as_slice() {
            [field] => Ok(KeyRef {
                table: self.storage_table(name),
                column: self.column_name(field.name()),
                sql_type: sql_type(field.ty().primitive_type(), field.annotations()),
            }),
            _ => Err(GenerationError::Unsupported(format!(
                "`{site}` references `{name}`, which has no single-column primary key"
            ))),
        }
    }

    fn column(&self, field: &Field, nullable: bool) -> Column {
        let name = self.column_name(field.name());
        let quoted = quote_ident(&name).into_owned();
        let primitive = field.ty().primitive_type();
        let mut column = Column::new(
            name,
            sql_type(primitive, field.annotations()),
            nullable,
        );

        for annotation in field.annotations() {
            match annotation {
                Annotation::Unique => column.unique = true,
                Annotation::Max(bound) if primitive == PrimitiveType::String && *bound > 0 => {}
                Annotation::Min(bound) => {
                    column.checks.extend(bound_check(&quoted, primitive, ">=", *bound));
                }
                Annotation::Max(bound) => {
                    column.checks.extend(bound_check(&quoted, primitive, "<=", *bound));
                }
                Annotation::Regex(pattern) if primitive == PrimitiveType::String => {
                    column
                        .checks
                        .push(format!("{quoted} ~ {}", string_literal(pattern)));
                }
                Annotation::Regex(_) => {
                    debug!(column = column.name, primitive:%; "Skipping regex check on non-text column");
                }
            }
        }
        column
    }

    // ========================================================================
    // Tables
    // ========================================================================

    fn abstract_table(
        &self,
        base: &AbstractEntity,
        schema: &mut Schema,
    ) -> Result<Table, GenerationError> {
        let mut table = Table::new(self.table_name(base.name()));
        table.primary_key = self.key_names(base.name());

        let strategy = base.strategy();
        if let Some(discriminator) = strategy.discriminator() {
            let mut column = Column::new(self.column_name(discriminator), "TEXT".to_string(), false);
            let values: Vec<String> = self
                .project
                .subtypes_of(base.name())
                .map(|entity| string_literal(entity.name()))
                .collect();
            if !values.is_empty() {
                column.checks.push(format!(
                    "{} IN ({})",
                    quote_ident(&column.name),
                    values.join(", ")
                ));
            }
            table.add_column(column);
        }

        for field in base.fields() {
            table.add_column(self.column(field, false));
        }

        if strategy.kind() == InheritanceKind::SingleTable {
            for entity in self.project.subtypes_of(base.name()) {
                trace!(table = table.name, subtype = entity.name(); "Folding subtype into shared table");
                for field in entity.fields() {
                    let nullable = base.field(field.name()).is_none();
                    table.add_column(self.column(field, nullable));
                }
                self.constraints(&mut table, entity, schema)?;
            }
        }

        Ok(table)
    }

    fn entity_table(&self, entity: &Entity, schema: &mut Schema) -> Result<Table, GenerationError> {
        let mut table = Table::new(self.table_name(entity.name()));
        let key = self.key_fields(entity.name());
        table.primary_key = key.iter().map(|field| self.column_name(field.name())).collect();

        match entity.base().and_then(|base| self.project.abstract_entity(base)) {
            Some(base) => {
                // Inherited columns live in the base table, except the key.
                for field in &key {
                    table.add_column(self.column(field, false));
                }
                for field in entity.fields() {
                    if base.field(field.name()).is_none() {
                        table.add_column(self.column(field, false));
                    }
                }

                let base_key = self.key_names(base.name());
                let inherited = key.iter().all(|field| base.field(field.name()).is_some());
                if inherited && !base_key.is_empty() && base_key == table.primary_key {
                    table.foreign_keys.push(ForeignKey {
                        columns: table.primary_key.clone(),
                        table: self.table_name(base.name()),
                        references: base_key,
                        on_delete: OnDelete::Cascade,
                    });
                }
            }
            None => {
                for field in entity.fields() {
                    table.add_column(self.column(field, false));
                }
            }
        }

        self.constraints(&mut table, entity, schema)?;
        Ok(table)
    }

    /// Adds the unique and index constraints of `entity` to `table`, or to
    /// the base table when the columns are inherited.
    fn constraints(
        &self,
        table: &mut Table,
        entity: &Entity,
        schema: &mut Schema,
    ) -> Result<(), GenerationError> {
        for constraint in entity.constraints() {
            if constraint.kind() == ConstraintKind::PrimaryKey {
                continue;
            }

            let columns = self.column_names(constraint.columns());
            let target = if table.has_columns(&columns) {
                &mut *table
            } else {
                let base_table = entity.base().map(|base| self.table_name(base));
                let found = match &base_table {
                    Some(name) => schema.tables.iter_mut().find(|table| &table.name == name),
                    None => None,
                };
                match found {
                    Some(base) if base.has_columns(&columns) => base,
                    _ => {
                        return Err(GenerationError::Unsupported(format!(
                            "{} constraint on `{}({})` spans the tables of a joined hierarchy",
                            constraint.kind(),
                            entity.name(),
                            constraint.columns().join(", ")
                        )));
                    }
                }
            };

            match constraint.kind() {
                ConstraintKind::Unique => target.add_unique(columns),
                _ => {
                    let name = format!("{}_{}_idx", target.name, columns.join("_"));
                    if !schema.indexes.iter().any(|index| index.name == name) {
                        schema.indexes.push(Index {
                            name,
                            table: target.name.clone(),
                            columns,
                        });
                    }
                }
            }
        }
        Ok(())
    }

    // ========================================================================
    // Relationships
    // ========================================================================

    fn relationship(
        &self,
        entity: &Entity,
        relationship: &Relationship,
        schema: &mut Schema,
    ) -> Result<(), GenerationError> {
        let site = format!("{}.{}", entity.name(), relationship.name());
        trace!(relationship = site; "Planning relationship");

        match (relationship.kind(), relationship.foreign_key()) {
            (RelationKind::Single, foreign_key) => {
                let target = self.single_key(relationship.target(), &site)?;
                let column = match foreign_key {
                    Some(column) => self.column_name(column),
                    None => self.column_name(&format!("{}_id", relationship.name())),
                };
                let owner = self.storage_table(entity.name());
                reference(schema, &owner, column, target, relationship.on_delete());
            }
            (RelationKind::Collection(_), Some(column)) => {
                let owner = self.single_key(entity.name(), &site)?;
                let target = self.storage_table(relationship.target());
                reference(schema, &target, self.column_name(column), owner, relationship.on_delete());
            }
            (RelationKind::Collection(kind), None) => {
                let table = self.join_table(entity, relationship, &site, JoinKey::Pair(*kind))?;
                schema.tables.push(table);
            }
            (RelationKind::Dictionary(key), _) => {
                let key_type = sql_type(key.primitive_type(), &[]);
                let table = self.join_table(entity, relationship, &site, JoinKey::Dictionary(key_type))?;
                schema.tables.push(table);
            }
        }
        Ok(())
    }

    fn join_table(
        &self,
        entity: &Entity,
        relationship: &Relationship,
        site: &str,
        key: JoinKey,
    ) -> Result<Table, GenerationError> {
        let owner = self.single_key(entity.name(), site)?;
        let target = self.single_key(relationship.target(), site)?;

        let mut table = Table::new(
            self.table_name(&format!("{}_{}", entity.name(), relationship.name())),
        );
        let owner_column = self.column_name(&format!("{}_id", entity.name()));
        let mut target_column = match relationship.foreign_key() {
            Some(column) => self.column_name(column),
            None => self.column_name(&format!("{}_id", relationship.target())),
        };
        if target_column == owner_column {
            target_column = self.column_name(&format!("{}_id", relationship.name()));
        }

        table.add_column(Column::new(owner_column.clone(), owner.sql_type.clone(), false));
        match key {
            JoinKey::Dictionary(key_type) => {
                let key_column = self.column_name("key");
                table.add_column(Column::new(key_column.clone(), key_type, false));
                table.primary_key = vec![owner_column.clone(), key_column];
            }
            JoinKey::Pair(CollectionKind::Set) => {
                table.primary_key = vec![owner_column.clone(), target_column.clone()];
            }
            JoinKey::Pair(CollectionKind::List) => {}
        }
        table.add_column(Column::new(target_column.clone(), target.sql_type.clone(), false));

        table.foreign_keys.push(ForeignKey {
            columns: vec![owner_column],
            table: owner.table,
            references: vec![owner.column],
            on_delete: OnDelete::Cascade,
        });
        table.foreign_keys.push(ForeignKey {
            columns: vec![target_column],
            table: target.table,
            references: vec![target.column],
            on_delete: relationship.on_delete(),
        });
        Ok(table)
    }
}

/// What identifies a row of a join table besides the owner.
enum JoinKey {
    Pair(CollectionKind),
    Dictionary(String),
}

/// Adds a nullable `column` to `table` referencing `target`.
fn reference(schema: &mut Schema, table: &str, column: String, target: KeyRef, on_delete: OnDelete) {
    let Some(table) = schema.table_mut(table) else {
        debug!(table = table; "Referencing table was not planned");
        return;
    };
    table.add_column(Column::new(column.clone(), target.sql_type, true));
    table.foreign_keys.push(ForeignKey {
        columns: vec![column],
        table: target.table,
        references: vec![target.column],
        on_delete,
    });
}

/// The fields named by the primary key of `entity`, looked up in `fields`.
///
/// Empty unless every key column is found.
fn primary_key_fields<'f>(entity: &Entity, fields: &'f [Field]) -> Vec<&'f Field> {
    let Some(columns) = entity.primary_key() else {
        return Vec::new();
    };
    columns
        .iter()
        .map(|column| fields.iter().find(|field| field.name() == column))
        .collect::<Option<Vec<_>>>()
        .unwrap_or_default()
}

/// The column type of `primitive`.
///
/// A positive `max` bound turns text into `VARCHAR(n)`.
pub(super) fn sql_type(primitive: PrimitiveType, annotations: &[Annotation]) -> String {
    let name = match primitive {
        PrimitiveType::Bool => "BOOLEAN",
        PrimitiveType::String => {
            let limit = annotations.iter().find_map(|annotation| match annotation {
                Annotation::Max(bound) if *bound > 0 => Some(*bound),
                _ => None,
            });
            return match limit {
                Some(limit) => format!("VARCHAR({limit})"),
                None => "TEXT".to_string(),
            };
        }
        PrimitiveType::Int8 | PrimitiveType::Int16 | PrimitiveType::UInt8 => "SMALLINT",
        PrimitiveType::Int32 | PrimitiveType::UInt16 => "INTEGER",
        PrimitiveType::Int64 | PrimitiveType::UInt32 => "BIGINT",
        PrimitiveType::UInt64 => "NUMERIC(20)",
        PrimitiveType::Float32 => "REAL",
        PrimitiveType::Float64 => "DOUBLE PRECISION",
        PrimitiveType::Decimal => "NUMERIC",
        PrimitiveType::Date => "DATE",
        PrimitiveType::DateTime => "TIMESTAMPTZ",
        PrimitiveType::TimeSpan => "INTERVAL",
        PrimitiveType::Uuid => "UUID",
        PrimitiveType::ByteArray => "BYTEA",
        PrimitiveType::Json => "JSONB",
    };
    name.to_string()
}

/// A `min`/`max` check: on the length of text and binary values, on the
/// value of numbers. Other types have no ordering a bound could express.
fn bound_check(column: &str, primitive: PrimitiveType, op: &str, bound: i64) -> Option<String> {
    let subject = match primitive {
        PrimitiveType::String => format!("char_length({column})"),
        PrimitiveType::Json => format!("char_length({column}::text)"),
        PrimitiveType::ByteArray => format!("octet_length({column})"),
        PrimitiveType::Float32 | PrimitiveType::Float64 | PrimitiveType::Decimal => column.to_string(),
        primitive if primitive.is_integer() => column.to_string(),
        _ => return None,
    };
    Some(format!("{subject} {op} {bound}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan_source(source: &str) -> Schema {
        let project = codec_parser::compile(source).expect("valid schema");
        plan(&project, NamingConfig::default()).expect("plannable schema")
    }

    fn table<'s>(schema: &'s Schema, name: &str) -> &'s Table {
        schema
            .tables
            .iter()
            .find(|table| table.name == name)
            .unwrap_or_else(|| panic!("no table `{name}`"))
    }

    fn column_names(table: &Table) -> Vec<&str> {
        table.columns.iter().map(|column| column.name.as_str()).collect()
    }

    #[test]
    fn test_joined_table_hierarchy() {
        let schema = plan_source(
            r#"
            abstract entity Party {
                inheritance joined_table
                val id: Uuid
                var name: String
            }
            entity Company : Party {
                var tax_number: String
                constraint primary_key(id)
            }
            "#,
        );

        let party = table(&schema, "party");
        assert_eq!(column_names(party), vec!["id", "name"]);
        assert_eq!(party.primary_key, vec!["id"]);

        let company = table(&schema, "company");
        assert_eq!(column_names(company), vec!["id", "tax_number"]);
        assert_eq!(company.foreign_keys.len(), 1);
        assert_eq!(company.foreign_keys[0].table, "party");
        assert_eq!(company.foreign_keys[0].on_delete, OnDelete::Cascade);
    }

    #[test]
    fn test_single_table_hierarchy() {
        let schema = plan_source(
            r#"
            abstract entity Party {
                inheritance single_table discriminator kind
                val id: Uuid
            }
            entity Company : Party {
                var tax_number: String
                constraint primary_key(id)
                constraint unique(tax_number)
            }
            entity Individual : Party {
                var birth_date: Date
                constraint primary_key(id)
            }
            "#,
        );

        assert_eq!(schema.tables.len(), 1);
        let party = table(&schema, "party");
        assert_eq!(column_names(party), vec!["kind", "id", "tax_number", "birth_date"]);
        assert!(!party.columns[0].nullable);
        assert_eq!(
            party.columns[0].checks,
            vec!["kind IN ('Company', 'Individual')".to_string()]
        );
        assert!(party.columns[2].nullable);
        assert_eq!(party.unique, vec![vec!["tax_number".to_string()]]);
    }

    #[test]
    fn test_owning_single_relationship_adds_foreign_key() {
        let schema = plan_source(
            r#"
            entity Person {
                val id: Uuid
                relation documents: many Document mapped_by(owner)
                constraint primary_key(id)
            }
            entity Document {
                val id: Int64
                relation owner: one Person foreign_key(owner_id) on_delete(set_null)
                constraint primary_key(id)
            }
            "#,
        );

        let document = table(&schema, "document");
        let owner = document
            .columns
            .iter()
            .find(|column| column.name == "owner_id")
            .expect("foreign key column");
        assert_eq!(owner.sql_type, "UUID");
        assert!(owner.nullable);
        assert_eq!(document.foreign_keys[0].on_delete, OnDelete::SetNull);
        assert_eq!(schema.tables.len(), 2);
    }

    #[test]
    fn test_collections_get_join_tables() {
        let schema = plan_source(
            r#"
            entity Person {
                val id: Uuid
                relation tags: set Tag
                relation labels: map(String) Tag
                constraint primary_key(id)
            }
            entity Tag {
                val id: Int32
                constraint primary_key(id)
            }
            "#,
        );

        let tags = table(&schema, "person_tags");
        assert_eq!(column_names(tags), vec!["person_id", "tag_id"]);
        assert_eq!(tags.primary_key, vec!["person_id", "tag_id"]);

        let labels = table(&schema, "person_labels");
        assert_eq!(column_names(labels), vec!["person_id", "key", "tag_id"]);
        assert_eq!(labels.columns[1].sql_type, "TEXT");
    }

    #[test]
    fn test_missing_key_is_unsupported() {
        let project = codec_parser::compile(
            "entity A { relation b: one B }\nentity B { var name: String }",
        )
        .expect("valid schema");

        let err = plan(&project, NamingConfig::default()).expect_err("B has no key");
        assert!(err.to_string().contains("`A.b` references `B`"));
    }

    #[test]
    fn test_annotations_become_column_constraints() {
        let schema = plan_source(
            r#"
            type Email = String { constraint max_len(254) constraint unique }
            entity Account {
                var email: Email
                var age: Int32 { constraint min(18) }
                var code: String { constraint regex("^[A-Z]+$") }
            }
            "#,
        );

        let account = table(&schema, "account");
        assert_eq!(account.columns[0].sql_type, "VARCHAR(254)");
        assert!(account.columns[0].unique);
        assert_eq!(account.columns[1].checks, vec!["age >= 18".to_string()]);
        assert_eq!(account.columns[2].checks, vec!["code ~ '^[A-Z]+$'".to_string()]);
    }

    #[test]
    fn test_naming_conventions() {
        let project = codec_parser::compile("entity LegalEntity { var tax_number: String }")
            .expect("valid schema");
        let naming = NamingConfig::new(
            codec_core::naming::WordConvention::PascalCase,
            codec_core::naming::WordConvention::CamelCase,
            codec_core::naming::WordConvention::SnakeCase,
        );

        let schema = plan(&project, naming).expect("plannable schema");
        assert_eq!(schema.tables[0].name, "LegalEntity");
        assert_eq!(schema.tables[0].columns[0].name, "taxNumber");
    }
}
