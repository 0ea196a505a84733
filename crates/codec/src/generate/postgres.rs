//! The `postgres-ddl` template.
//!
//! Writes a single `schema.sql` script creating one table per storage unit
//! of the project (see [`plan`] for the mapping), followed by the indexes.
//! Tables are ordered so that referenced tables come first; foreign keys
//! that cannot be declared inline because of a reference cycle are added
//! with `ALTER TABLE` once every table exists.

mod plan;

use std::{
    borrow::Cow,
    collections::HashSet,
    fmt::{self, Write as _},
    fs,
    path::Path,
};

use log::{debug, info, warn};
use petgraph::{algo::toposort, graph::DiGraph};

use codec_core::{model::ResolvedProject, schema::OnDelete};

use crate::{
    config::NamingConfig,
    generate::{GenerationError, Generator},
};

use plan::{ForeignKey, Schema, Table};

/// Name of the file written by [`PostgresDdl`].
pub const SCHEMA_FILE: &str = "schema.sql";

/// Words that must be quoted when used as identifiers.
const RESERVED: &[&str] = &[
    "all", "and", "any", "as", "asc", "between", "both", "case", "check", "column", "constraint",
    "create", "default", "desc", "distinct", "do", "else", "end", "except", "false", "for",
    "foreign", "from", "grant", "group", "having", "in", "into", "is", "join", "key", "limit",
    "not", "null", "offset", "on", "or", "order", "primary", "references", "select", "table",
    "then", "to", "true", "union", "unique", "user", "using", "when", "where", "with",
];

/// Generator emitting a PostgreSQL schema script.
#[derive(Debug, Clone, Default)]
pub struct PostgresDdl {
    naming: NamingConfig,
}

impl PostgresDdl {
    pub fn new(naming: NamingConfig) -> Self {
        Self { naming }
    }

    /// Renders the script for `project` without writing it.
    ///
    /// # Errors
    ///
    /// Returns [`GenerationError::Unsupported`] when the project cannot be
    /// mapped onto tables.
    pub fn render(&self, project: &ResolvedProject) -> Result<String, GenerationError> {
        let schema = plan::plan(project, self.naming)?;
        let mut out = String::new();
        self.write_script(&mut out, project, &schema)
            .map_err(|err| GenerationError::Unsupported(format!("failed to format script: {err}")))?;
        Ok(out)
    }

    fn write_script(
        &self,
        out: &mut String,
        project: &ResolvedProject,
        schema: &Schema,
    ) -> fmt::Result {
        match project.package() {
            Some(package) => writeln!(out, "-- Generated by codec from package {package}.")?,
            None => writeln!(out, "-- Generated by codec.")?,
        }
        writeln!(out, "-- Do not edit by hand.")?;

        if let Some(name) = project.setting("schema") {
            let name = quote_ident(name);
            write!(
                out,
                "\nCREATE SCHEMA IF NOT EXISTS {name};\nSET search_path TO {name};\n"
            )?;
        }

        let mut created = HashSet::new();
        let mut deferred = Vec::new();

        for index in table_order(schema) {
            let table = &schema.tables[index];
            created.insert(table.name.as_str());
            let (inline, later): (Vec<&ForeignKey>, Vec<&ForeignKey>) = table
                .foreign_keys
                .iter()
                .partition(|fk| created.contains(fk.table.as_str()));
            deferred.extend(later.into_iter().map(|fk| (table.name.as_str(), fk)));
            write_table(out, table, &inline)?;
        }

        for (table, fk) in &deferred {
            write!(out, "\nALTER TABLE {}\n    ADD ", quote_ident(table))?;
            write_foreign_key(out, table, fk)?;
            out.push_str(";\n");
        }

        if !schema.indexes.is_empty() {
            out.push('\n');
        }
        for index in &schema.indexes {
            writeln!(
                out,
                "CREATE INDEX {} ON {} ({});",
                quote_ident(&index.name),
                quote_ident(&index.table),
                identifiers(&index.columns)
            )?;
        }

        self.write_services(out, project)?;

        debug!(
            tables = schema.tables.len(),
            deferred_foreign_keys = deferred.len();
            "Rendered PostgreSQL schema"
        );
        Ok(())
    }

    /// Lists service functions under the configured function names, so the
    /// script documents the API the tables back.
    fn write_services(&self, out: &mut String, project: &ResolvedProject) -> fmt::Result {
        for service in project.services() {
            write!(out, "\n-- Service {}\n", service.name())?;
            for function in service.functions() {
                let parameters: Vec<String> = function
                    .parameters()
                    .iter()
                    .map(|parameter| format!("{}: {}", parameter.name(), parameter.ty()))
                    .collect();
                write!(
                    out,
                    "--   {}({})",
                    self.naming.function().apply(function.name()),
                    parameters.join(", ")
                )?;
                match function.returns() {
                    Some(returns) => writeln!(out, " -> {returns}")?,
                    None => writeln!(out)?,
                }
            }
        }
        Ok(())
    }
}

impl Generator for PostgresDdl {
    fn display_name(&self) -> &str {
        "PostgreSQL DDL"
    }

    fn generate(&self, project: &ResolvedProject, output_dir: &Path) -> Result<(), GenerationError> {
        let script = self.render(project)?;
        let path = output_dir.join(SCHEMA_FILE);

        fs::write(&path, script).map_err(|source| GenerationError::Io {
            path: path.clone(),
            source,
        })?;

        info!(path = path.display().to_string(); "Wrote PostgreSQL schema");
        Ok(())
    }
}

/// Table indices with referenced tables first.
///
/// Falls back to plan order when the references form a cycle.
fn table_order(schema: &Schema) -> Vec<usize> {
    let mut graph = DiGraph::<usize, ()>::new();
    let nodes: Vec<_> = (0..schema.tables.len()).map(|index| graph.add_node(index)).collect();

    for (index, table) in schema.tables.iter().enumerate() {
        for fk in &table.foreign_keys {
            let referenced = schema.tables.iter().position(|other| other.name == fk.table);
            match referenced {
                Some(referenced) if referenced != index => {
                    graph.add_edge(nodes[referenced], nodes[index], ());
                }
                _ => {}
            }
        }
    }

    match toposort(&graph, None) {
        Ok(sorted) => sorted.into_iter().map(|node| graph[node]).collect(),
        Err(cycle) => {
            warn!(
                table = schema.tables[graph[cycle.node_id()]].name;
                "Tables reference each other, adding foreign keys after creation"
            );
            (0..schema.tables.len()).collect()
        }
    }
}

fn write_table(out: &mut String, table: &Table, foreign_keys: &[&ForeignKey]) -> fmt::Result {
    let name = quote_ident(&table.name);
    let mut lines = Vec::new();

    for column in &table.columns {
        let mut line = format!("{} {}", quote_ident(&column.name), column.sql_type);
        if !column.nullable {
            line.push_str(" NOT NULL");
        }
        if column.unique {
            line.push_str(" UNIQUE");
        }
        for check in &column.checks {
            write!(line, " CHECK ({check})")?;
        }
        lines.push(line);
    }

    if !table.primary_key.is_empty() {
        lines.push(format!("PRIMARY KEY ({})", identifiers(&table.primary_key)));
    }
    for columns in &table.unique {
        lines.push(format!(
            "CONSTRAINT {} UNIQUE ({})",
            quote_ident(&format!("{}_{}_key", table.name, columns.join("_"))),
            identifiers(columns)
        ));
    }
    for fk in foreign_keys {
        let mut line = String::new();
        write_foreign_key(&mut line, &table.name, fk)?;
        lines.push(line);
    }

    write!(out, "\nCREATE TABLE {name} (\n    {}\n);\n", lines.join(",\n    "))
}

fn write_foreign_key(out: &mut String, table: &str, fk: &ForeignKey) -> fmt::Result {
    write!(
        out,
        "CONSTRAINT {} FOREIGN KEY ({}) REFERENCES {} ({})",
        quote_ident(&format!("{table}_{}_fkey", fk.columns.join("_"))),
        identifiers(&fk.columns),
        quote_ident(&fk.table),
        identifiers(&fk.references)
    )?;
    match fk.on_delete {
        OnDelete::None => Ok(()),
        OnDelete::Cascade => out.write_str(" ON DELETE CASCADE"),
        OnDelete::SetNull => out.write_str(" ON DELETE SET NULL"),
        OnDelete::Restrict => out.write_str(" ON DELETE RESTRICT"),
    }
}

fn identifiers(names: &[String]) -> String {
    names
        .iter()
        .map(|name| quote_ident(name))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Quotes `name` unless it is a plain lowercase identifier.
pub(crate) fn quote_ident(name: &str) -> Cow<'_, str> {
    let plain = name
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_lowercase() || c == '_')
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
        && !RESERVED.contains(&name);

    if plain {
        Cow::Borrowed(name)
    } else {
        Cow::Owned(format!("\"{}\"", name.replace('"', "\"\"")))
    }
}

/// A single-quoted SQL string literal.
pub(crate) fn string_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIBRARY: &str = r#"
        package Samples.Library;

        config { schema = "library" }

        type Isbn = String { constraint max_len(13) }

        entity Author {
            val id: Uuid
            var name: String
            relation books: many Book mapped_by(author)
            constraint primary_key(id)
        }

        entity Book {
            val isbn: Isbn
            var title: String
            relation author: one Author on_delete(restrict)
            constraint primary_key(isbn)
            constraint index(title)
        }

        service Catalog {
            fn find_by_title(title: String) -> Book { }
        }
    "#;

    fn render(source: &str) -> String {
        let project = codec_parser::compile(source).expect("valid schema");
        PostgresDdl::default().render(&project).expect("renderable schema")
    }

    #[test]
    fn test_quote_ident() {
        assert_eq!(quote_ident("person"), "person");
        assert_eq!(quote_ident("birth_date2"), "birth_date2");
        assert_eq!(quote_ident("user"), "\"user\"");
        assert_eq!(quote_ident("LegalEntity"), "\"LegalEntity\"");
        assert_eq!(quote_ident("a\"b"), "\"a\"\"b\"");
    }

    #[test]
    fn test_string_literal() {
        assert_eq!(string_literal("it's"), "'it''s'");
    }

    #[test]
    fn test_render_library() {
        let script = render(LIBRARY);

        assert!(script.starts_with("-- Generated by codec from package Samples.Library."));
        assert!(script.contains("CREATE SCHEMA IF NOT EXISTS library;"));
        assert!(script.contains("CREATE TABLE author (\n    id UUID NOT NULL,"));
        assert!(script.contains("isbn VARCHAR(13) NOT NULL"));
        assert!(script.contains(
            "CONSTRAINT book_author_id_fkey FOREIGN KEY (author_id) REFERENCES author (id) ON DELETE RESTRICT"
        ));
        assert!(script.contains("CREATE INDEX book_title_idx ON book (title);"));
        assert!(script.contains("--   find_by_title(title: String) -> Book"));
    }

    #[test]
    fn test_referenced_tables_come_first() {
        let script = render(LIBRARY);

        let author = script.find("CREATE TABLE author").expect("author table");
        let book = script.find("CREATE TABLE book").expect("book table");
        assert!(author < book);
        assert!(!script.contains("ALTER TABLE"));
    }

    #[test]
    fn test_reference_cycle_defers_foreign_keys() {
        let script = render(
            r#"
            entity A { val id: Int64 relation b: one B constraint primary_key(id) }
            entity B { val id: Int64 relation a: one A constraint primary_key(id) }
            "#,
        );

        assert!(script.contains("ALTER TABLE"));
        assert_eq!(script.matches("FOREIGN KEY").count(), 2);
    }

    #[test]
    fn test_self_reference_is_inline() {
        let script = render(
            "entity Node { val id: Int64 relation parent: one Node on_delete(set_null) constraint primary_key(id) }",
        );

        assert!(script.contains("REFERENCES node (id) ON DELETE SET NULL"));
        assert!(!script.contains("ALTER TABLE"));
    }

    #[test]
    fn test_generate_writes_schema_file() {
        let project = codec_parser::compile(LIBRARY).expect("valid schema");
        let dir = tempfile::tempdir().expect("temp dir");

        PostgresDdl::default()
            .generate(&project, dir.path())
            .expect("generation succeeds");

        let written = fs::read_to_string(dir.path().join(SCHEMA_FILE)).expect("schema.sql");
        assert!(written.contains("CREATE TABLE book"));
    }
}
