//! Binding of view queries to their sources.
//!
//! Every field path in a `where` or `select` clause is bound to the index of
//! the `from` clause that provides it. A qualified path names its source by
//! entity name or alias; an unqualified path binds to the first source whose
//! entity has the field.

use codec_core::model::{self, Field, FieldRef, Filter, Query, Selection, Source};

use crate::{
    ast::{FieldPath, Operand, QueryBlock},
    error::{Diagnostic, DiagnosticCollector, ErrorCode},
    resolve::symbols::check_unique,
    span::Spanned,
};

struct BoundSource<'r> {
    entity: &'r str,
    alias: Option<&'r str>,
    /// Merged fields, `None` when the entity is unknown.
    fields: Option<&'r [Field]>,
}

impl BoundSource<'_> {
    fn answers_to(&self, qualifier: &str) -> bool {
        self.entity == qualifier || self.alias == Some(qualifier)
    }

    fn provides(&self, field: &str) -> bool {
        self.fields
            .is_some_and(|fields| fields.iter().any(|f| f.name() == field))
    }
}

pub(super) struct QueryBinder<'r> {
    view: &'r str,
    sources: Vec<BoundSource<'r>>,
}

impl<'r> QueryBinder<'r> {
    /// Bind the `from` clauses of `query`.
    ///
    /// `lookup` returns the merged fields of a concrete or abstract entity.
    pub fn new(
        view: &'r str,
        query: &'r QueryBlock,
        lookup: impl Fn(&str) -> Option<&'r [Field]>,
        collector: &mut DiagnosticCollector,
    ) -> Self {
        let qualifiers: Vec<&Spanned<String>> = query
            .from
            .iter()
            .map(|clause| clause.alias.as_ref().unwrap_or(&clause.entity))
            .collect();
        check_unique("query source", qualifiers, collector);

        let sources = query
            .from
            .iter()
            .map(|clause| {
                let fields = lookup(clause.entity.as_str());
                if fields.is_none() {
                    collector.emit(
                        Diagnostic::error(format!(
                            "view `{view}` queries unknown entity `{}`",
                            clause.entity
                        ))
                        .with_code(ErrorCode::E307)
                        .with_subject(view)
                        .with_subject(clause.entity.as_str())
                        .with_label(clause.entity.span(), "not a declared entity"),
                    );
                }
                BoundSource {
                    entity: clause.entity.as_str(),
                    alias: clause.alias.as_ref().map(|alias| alias.as_str()),
                    fields,
                }
            })
            .collect();

        Self { view, sources }
    }

    /// Bind the `where` and `select` clauses and build the validated query.
    pub fn bind(self, query: &QueryBlock, collector: &mut DiagnosticCollector) -> Query {
        let filters = query
            .filters
            .iter()
            .filter_map(|clause| {
                let field = self.bind_path(&clause.field, collector);
                let operand = match &clause.operand {
                    Operand::Literal(literal) => Some(model::Operand::Literal(literal.inner().clone())),
                    Operand::Field(path) => self.bind_path(path, collector).map(model::Operand::Field),
                };
                Some(Filter::new(field?, clause.op, operand?))
            })
            .collect();

        let selections = query
            .select
            .fields
            .iter()
            .filter_map(|selected| {
                let field = self.bind_path(&selected.path, collector)?;
                let alias = selected.alias.as_ref().map(|alias| alias.inner().clone());
                Some(Selection::new(field, alias))
            })
            .collect();

        let sources = self
            .sources
            .iter()
            .map(|source| Source::new(source.entity, source.alias.map(str::to_string)))
            .collect();

        Query::new(sources, filters, selections)
    }

    fn bind_path(&self, path: &FieldPath, collector: &mut DiagnosticCollector) -> Option<FieldRef> {
        let field = path.field.as_str();

        let Some(qualifier) = &path.qualifier else {
            if let Some(index) = self.sources.iter().position(|source| source.provides(field)) {
                return Some(FieldRef::new(index, field));
            }
            // An unknown source may well have provided it; that is reported already.
            if self.sources.iter().all(|source| source.fields.is_some()) {
                collector.emit(
                    self.unresolved(path)
                        .with_label(path.span(), "no queried entity has this field"),
                );
            }
            return None;
        };

        let Some(index) = self
            .sources
            .iter()
            .position(|source| source.answers_to(qualifier.as_str()))
        else {
            collector.emit(
                self.unresolved(path)
                    .with_label(qualifier.span(), "not an entity or alias in a `from` clause"),
            );
            return None;
        };

        let source = &self.sources[index];
        if source.provides(field) {
            Some(FieldRef::new(index, field))
        } else {
            if source.fields.is_some() {
                collector.emit(
                    self.unresolved(path)
                        .with_label(path.field.span(), format!("`{}` has no such field", source.entity)),
                );
            }
            None
        }
    }

    fn unresolved(&self, path: &FieldPath) -> Diagnostic {
        Diagnostic::error(format!(
            "cannot resolve `{path}` in the query of view `{}`",
            self.view
        ))
        .with_code(ErrorCode::E311)
        .with_subject(self.view)
        .with_subject(path.to_string())
    }
}
