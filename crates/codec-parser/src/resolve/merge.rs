//! Field-set merging for traits, abstract entities, entities and views.

use indexmap::IndexMap;

use codec_core::{annotation::Annotation, model::Field};

use crate::{
    error::{Diagnostic, DiagnosticCollector, ErrorCode},
    span::Span,
};

/// Where a merged field came from.
#[derive(Debug, Clone)]
enum Origin {
    /// Inherited from the named declaration, through the reference at `span`.
    Inherited { from: String, span: Span },
    /// Declared in the owner's own body.
    Declared(Span),
}

impl Origin {
    fn describe(&self) -> String {
        match self {
            Origin::Inherited { from, .. } => format!("inherited from `{from}`"),
            Origin::Declared(_) => "declared here".to_string(),
        }
    }

    fn span(&self) -> Span {
        match self {
            Origin::Inherited { span, .. } | Origin::Declared(span) => *span,
        }
    }
}

/// Accumulates the effective field set of one declaration.
///
/// A field reached twice collapses when both declarations agree on type and
/// mutability. Otherwise a field conflict is reported and the first
/// declaration wins. A declared field replaces a compatible inherited one in
/// place, so its own annotations apply.
#[derive(Debug)]
pub(super) struct FieldMerger<'a> {
    owner: &'a str,
    fields: IndexMap<String, (Field, Origin)>,
}

impl<'a> FieldMerger<'a> {
    pub fn new(owner: &'a str) -> Self {
        Self {
            owner,
            fields: IndexMap::new(),
        }
    }

    /// Merge the fields of `from`, referenced by the owner at `span`.
    pub fn inherit(
        &mut self,
        fields: &[Field],
        from: &str,
        span: Span,
        collector: &mut DiagnosticCollector,
    ) {
        for field in fields {
            let origin = Origin::Inherited {
                from: from.to_string(),
                span,
            };
            self.add(field.clone(), origin, collector);
        }
    }

    /// Merge a field from the owner's own body.
    pub fn declare(&mut self, field: Field, span: Span, collector: &mut DiagnosticCollector) {
        self.add(field, Origin::Declared(span), collector);
    }

    fn add(&mut self, field: Field, origin: Origin, collector: &mut DiagnosticCollector) {
        if !self.fields.contains_key(field.name()) {
            self.fields
                .insert(field.name().to_string(), (field, origin));
            return;
        }
        let Some((existing, existing_origin)) = self.fields.get_mut(field.name()) else {
            return;
        };

        if existing.is_compatible_with(&field) {
            if matches!(origin, Origin::Declared(_))
                && matches!(existing_origin, Origin::Inherited { .. })
            {
                *existing = field;
                *existing_origin = origin;
            }
            return;
        }

        collector.emit(
            Diagnostic::error(format!(
                "field `{}` of `{}` is declared with conflicting types",
                field.name(),
                self.owner
            ))
            .with_code(ErrorCode::E304)
            .with_subject(self.owner)
            .with_subject(field.name())
            .with_label(
                origin.span(),
                format!("`{}` {}", describe(&field), origin.describe()),
            )
            .with_secondary_label(
                existing_origin.span(),
                format!("`{}` {}", describe(existing), existing_origin.describe()),
            )
            .with_help("a field reached more than once must agree on type and mutability"),
        );
    }

    pub fn finish(self) -> Vec<Field> {
        self.fields.into_values().map(|(field, _)| field).collect()
    }
}

fn describe(field: &Field) -> String {
    let keyword = if field.is_mutable() { "var" } else { "val" };
    format!("{keyword} {}: {}", field.name(), field.ty())
}

/// Fold own annotations over inherited ones.
///
/// An inherited annotation is dropped when an own annotation of the same kind
/// exists; the survivors come first, followed by the own annotations.
pub(super) fn merge_annotations(inherited: &[Annotation], own: &[Annotation]) -> Vec<Annotation> {
    inherited
        .iter()
        .filter(|annotation| !own.iter().any(|mine| mine.same_kind(annotation)))
        .chain(own)
        .cloned()
        .collect()
}
