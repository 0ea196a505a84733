//! Symbol table built in the first resolution pass.
//!
//! Each declaration kind has its own namespace, so an entity and a trait may
//! share a name. A name declared twice in one namespace is reported once per
//! extra declaration; lookups always see the first declaration.

use indexmap::IndexMap;

use crate::{
    ast::{
        AbstractEntityDefinition, CodecProject, EntityDefinition, ServiceDefinition,
        TraitDefinition, TypeAlias, ViewDefinition,
    },
    error::{Diagnostic, DiagnosticCollector, ErrorCode},
    span::{Span, Spanned},
};

/// A declaration that owns a name in one of the project namespaces.
pub(super) trait Declared {
    /// Human-readable kind, used in diagnostics.
    const KIND: &'static str;

    fn name(&self) -> &Spanned<String>;
}

macro_rules! declared {
    ($ty:ty, $kind:literal) => {
        impl Declared for $ty {
            const KIND: &'static str = $kind;

            fn name(&self) -> &Spanned<String> {
                &self.name
            }
        }
    };
}

declared!(TypeAlias, "type alias");
declared!(TraitDefinition, "trait");
declared!(AbstractEntityDefinition, "abstract entity");
declared!(EntityDefinition, "entity");
declared!(ServiceDefinition, "service");
declared!(ViewDefinition, "view");

/// Declarations of one kind, keyed by name in declaration order.
#[derive(Debug)]
pub(super) struct Namespace<'p, T> {
    entries: IndexMap<&'p str, &'p T>,
}

impl<'p, T: Declared> Namespace<'p, T> {
    fn collect(definitions: &'p [T], collector: &mut DiagnosticCollector) -> Self {
        let mut entries: IndexMap<&'p str, &'p T> = IndexMap::new();

        for definition in definitions {
            let name = definition.name();
            match entries.get(name.as_str()) {
                Some(first) => {
                    collector.emit(duplicate_name(T::KIND, name, first.name().span()));
                }
                None => {
                    entries.insert(name.as_str(), definition);
                }
            }
        }

        Self { entries }
    }

    pub fn get(&self, name: &str) -> Option<&'p T> {
        self.entries.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &'p str> + '_ {
        self.entries.keys().copied()
    }

    pub fn values(&self) -> impl Iterator<Item = &'p T> + '_ {
        self.entries.values().copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

/// One namespace per declaration kind.
#[derive(Debug)]
pub(super) struct SymbolTable<'p> {
    pub aliases: Namespace<'p, TypeAlias>,
    pub traits: Namespace<'p, TraitDefinition>,
    pub abstract_entities: Namespace<'p, AbstractEntityDefinition>,
    pub entities: Namespace<'p, EntityDefinition>,
    pub services: Namespace<'p, ServiceDefinition>,
    pub views: Namespace<'p, ViewDefinition>,
}

impl<'p> SymbolTable<'p> {
    /// Collect every declaration of `project`, reporting duplicates.
    pub fn build(project: &'p CodecProject, collector: &mut DiagnosticCollector) -> Self {
        Self {
            aliases: Namespace::collect(&project.type_aliases, collector),
            traits: Namespace::collect(&project.traits, collector),
            abstract_entities: Namespace::collect(&project.abstract_entities, collector),
            entities: Namespace::collect(&project.entities, collector),
            services: Namespace::collect(&project.services, collector),
            views: Namespace::collect(&project.views, collector),
        }
    }

    /// Returns `true` if `name` is a concrete or abstract entity.
    pub fn is_entity(&self, name: &str) -> bool {
        self.entities.contains(name) || self.abstract_entities.contains(name)
    }
}

/// Report every repeated name in `names`, in order.
pub(super) fn check_unique<'a>(
    kind: &str,
    names: impl IntoIterator<Item = &'a Spanned<String>>,
    collector: &mut DiagnosticCollector,
) {
    let mut seen: IndexMap<&str, Span> = IndexMap::new();
    for name in names {
        match seen.get(name.as_str()) {
            Some(first) => collector.emit(duplicate_name(kind, name, *first)),
            None => {
                seen.insert(name.as_str(), name.span());
            }
        }
    }
}

pub(super) fn duplicate_name(kind: &str, name: &Spanned<String>, first: Span) -> Diagnostic {
    Diagnostic::error(format!("{kind} `{name}` is defined multiple times"))
        .with_code(ErrorCode::E301)
        .with_subject(name.as_str())
        .with_label(name.span(), "duplicate definition")
        .with_secondary_label(first, "first defined here")
        .with_help("remove the duplicate or use a different name")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spanned(value: &str, start: usize) -> Spanned<String> {
        Spanned::new(value.to_string(), Span::new(start..start + value.len()))
    }

    fn alias(name: &str, start: usize) -> TypeAlias {
        TypeAlias {
            name: spanned(name, start),
            target: Spanned::new(
                crate::ast::TypeRef::Primitive(codec_core::primitive::PrimitiveType::String),
                Span::new(start..start),
            ),
            annotations: vec![],
        }
    }

    #[test]
    fn test_namespace_keeps_first_definition() {
        let aliases = vec![alias("Email", 5), alias("Name", 30), alias("Email", 60)];
        let mut collector = DiagnosticCollector::new();

        let namespace = Namespace::collect(&aliases, &mut collector);

        assert_eq!(namespace.len(), 2);
        assert_eq!(namespace.get("Email").map(|a| a.name.span()), Some(Span::new(5..10)));

        let err = collector.finish().unwrap_err();
        let diag = &err.diagnostics()[0];
        assert_eq!(diag.code(), Some(ErrorCode::E301));
        assert_eq!(diag.primary_span(), Some(Span::new(60..65)));
        assert!(diag.labels().iter().any(|l| l.is_secondary() && l.span() == Span::new(5..10)));
    }

    #[test]
    fn test_namespaces_are_independent() {
        let project = CodecProject {
            type_aliases: vec![alias("Person", 0)],
            traits: vec![TraitDefinition {
                name: spanned("Person", 20),
                extends: vec![],
                fields: vec![],
            }],
            ..CodecProject::default()
        };
        let mut collector = DiagnosticCollector::new();

        let symbols = SymbolTable::build(&project, &mut collector);

        assert!(symbols.aliases.contains("Person"));
        assert!(symbols.traits.contains("Person"));
        assert!(collector.finish().is_ok());
    }

    #[test]
    fn test_check_unique_reports_each_repeat() {
        let names = vec![spanned("a", 0), spanned("b", 2), spanned("a", 4), spanned("a", 6)];
        let mut collector = DiagnosticCollector::new();

        check_unique("parameter", &names, &mut collector);

        let err = collector.finish().unwrap_err();
        assert_eq!(err.with_code(ErrorCode::E301).count(), 2);
    }
}
