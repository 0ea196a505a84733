//! Semantic resolution of a parsed project.
//!
//! Resolution runs in two passes. The first collects every declaration into a
//! [`SymbolTable`] with one namespace per declaration kind, so references
//! never depend on declaration order. The second resolves and validates:
//!
//! 1. type aliases, transitively down to a primitive,
//! 2. trait closures,
//! 3. abstract entities and their inheritance strategies,
//! 4. entities: base and trait merging, relationships, constraints,
//! 5. services, views and their queries, config blocks.
//!
//! Every check runs and every defect is reported. A resolved project is only
//! produced when no error was found.

mod cycles;
mod merge;
mod query;
mod symbols;

use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;
use log::{debug, trace};

use codec_core::{
    annotation::Annotation,
    model::{
        AbstractEntity, Alias, Config, Constraint, Entity, Field, Function, Parameter,
        RelationKind, Relationship, ResolvedProject, ScalarType, Service, Trait, ValueType, View,
    },
    schema::InheritanceKind,
};

use crate::{
    ast::{self, CodecProject, TypeRef},
    error::{Diagnostic, DiagnosticCollector, ErrorCode, ParseError},
    span::{Span, Spanned},
};

use cycles::find_cycles;
use merge::{FieldMerger, merge_annotations};
use query::QueryBinder;
use symbols::{SymbolTable, check_unique};

/// Resolve `project` into a [`ResolvedProject`], or report every defect.
pub(crate) fn resolve(project: &CodecProject) -> Result<ResolvedProject, ParseError> {
    Resolver::new(project).resolve()
}

struct Resolver<'p> {
    project: &'p CodecProject,
    symbols: SymbolTable<'p>,
    collector: DiagnosticCollector,
    cyclic_aliases: HashSet<&'p str>,
    /// `None` marks an alias that failed to resolve.
    aliases: HashMap<&'p str, Option<Alias>>,
    cyclic_traits: HashSet<&'p str>,
    traits: IndexMap<&'p str, Trait>,
    abstract_entities: IndexMap<&'p str, AbstractEntity>,
    entities: IndexMap<&'p str, Entity>,
}

impl<'p> Resolver<'p> {
    fn new(project: &'p CodecProject) -> Self {
        let mut collector = DiagnosticCollector::new();
        let symbols = SymbolTable::build(project, &mut collector);

        debug!(
            aliases = symbols.aliases.len(),
            traits = symbols.traits.len(),
            abstract_entities = symbols.abstract_entities.len(),
            entities = symbols.entities.len(),
            services = symbols.services.len(),
            views = symbols.views.len();
            "Collected symbols"
        );

        Self {
            project,
            symbols,
            collector,
            cyclic_aliases: HashSet::new(),
            aliases: HashMap::new(),
            cyclic_traits: HashSet::new(),
            traits: IndexMap::new(),
            abstract_entities: IndexMap::new(),
            entities: IndexMap::new(),
        }
    }

    fn resolve(mut self) -> Result<ResolvedProject, ParseError> {
        self.check_packages();
        self.resolve_aliases();
        self.resolve_traits();

        for definition in self.symbols.abstract_entities.values().collect::<Vec<_>>() {
            self.resolve_abstract_entity(definition);
        }
        for definition in self.symbols.entities.values().collect::<Vec<_>>() {
            self.resolve_entity(definition);
        }

        let services: Vec<Service> = self
            .symbols
            .services
            .values()
            .collect::<Vec<_>>()
            .into_iter()
            .map(|definition| self.resolve_service(definition))
            .collect();
        let views: Vec<View> = self
            .symbols
            .views
            .values()
            .collect::<Vec<_>>()
            .into_iter()
            .map(|definition| self.resolve_view(definition))
            .collect();
        let configs = self.resolve_configs();

        if self.collector.has_errors() {
            debug!("Resolution failed");
        }
        self.collector.finish()?;

        let aliases = self
            .symbols
            .aliases
            .names()
            .filter_map(|name| self.aliases.get(name).cloned().flatten())
            .collect();

        debug!("Resolution succeeded");
        Ok(ResolvedProject::new(
            self.project.package().map(|name| name.inner().clone()),
            aliases,
            self.traits.into_values().collect(),
            self.abstract_entities.into_values().collect(),
            self.entities.into_values().collect(),
            services,
            views,
            configs,
        ))
    }

    // ========================================================================
    // Diagnostics
    // ========================================================================

    /// Describe what `name` is declared as, if anything.
    fn describe_symbol(&self, name: &str) -> Option<&'static str> {
        if self.symbols.aliases.contains(name) {
            Some("a type alias")
        } else if self.symbols.traits.contains(name) {
            Some("a trait")
        } else if self.symbols.abstract_entities.contains(name) {
            Some("an abstract entity")
        } else if self.symbols.entities.contains(name) {
            Some("an entity")
        } else if self.symbols.services.contains(name) {
            Some("a service")
        } else if self.symbols.views.contains(name) {
            Some("a view")
        } else {
            None
        }
    }

    fn unknown_type(&self, name: &str, span: Span, expected: &str) -> Diagnostic {
        let diagnostic = Diagnostic::error(format!("unknown type `{name}`"))
            .with_code(ErrorCode::E300)
            .with_subject(name)
            .with_label(span, format!("expected {expected}"));

        match self.describe_symbol(name) {
            Some(kind) => {
                diagnostic.with_help(format!("`{name}` is {kind}, but {expected} is required here"))
            }
            None => diagnostic,
        }
    }

    fn emit_cycle(
        &mut self,
        code: ErrorCode,
        (kind, kinds): (&str, &str),
        members: &[(&str, Span)],
    ) {
        let names: Vec<String> = members.iter().map(|(name, _)| format!("`{name}`")).collect();
        let message = match names.as_slice() {
            [single] => format!("{kind} {single} refers to itself"),
            _ => format!("{kinds} {} form a cycle", names.join(", ")),
        };

        let mut diagnostic = Diagnostic::error(message).with_code(code);
        for (index, (name, span)) in members.iter().enumerate() {
            diagnostic = diagnostic.with_subject(*name);
            diagnostic = if index == 0 {
                diagnostic.with_label(*span, "part of the cycle")
            } else {
                diagnostic.with_secondary_label(*span, "part of the cycle")
            };
        }

        self.collector.emit(diagnostic);
    }

    fn check_packages(&mut self) {
        let Some((first, rest)) = self.project.packages.split_first() else {
            return;
        };

        for extra in rest {
            self.collector.emit(
                Diagnostic::error("package is declared more than once")
                    .with_code(ErrorCode::E301)
                    .with_subject(extra.as_str())
                    .with_label(extra.span(), "second package declaration")
                    .with_secondary_label(first.span(), "package first declared here")
                    .with_help("a source file has at most one package declaration"),
            );
        }
    }

    // ========================================================================
    // Type Aliases
    // ========================================================================

    fn resolve_aliases(&mut self) {
        let aliases = &self.symbols.aliases;
        let cycles = find_cycles(aliases.names(), |name| {
            match aliases.get(name).map(|alias| alias.target.inner()) {
                Some(TypeRef::Named(target)) => vec![target.as_str()],
                _ => Vec::new(),
            }
        });

        for cycle in cycles {
            let members: Vec<(&str, Span)> = cycle
                .iter()
                .filter_map(|name| self.symbols.aliases.get(name))
                .map(|alias| (alias.name.as_str(), alias.name.span()))
                .collect();
            self.emit_cycle(ErrorCode::E302, ("type alias", "type aliases"), &members);
            self.cyclic_aliases.extend(cycle);
        }

        for name in self.symbols.aliases.names().collect::<Vec<_>>() {
            self.resolve_alias(name);
        }
    }

    /// Resolve one alias, memoized. Reports an unknown target once.
    fn resolve_alias(&mut self, name: &'p str) -> Option<Alias> {
        if let Some(resolved) = self.aliases.get(name) {
            return resolved.clone();
        }
        let definition = self.symbols.aliases.get(name)?;

        if self.cyclic_aliases.contains(name) {
            self.aliases.insert(name, None);
            return None;
        }

        let target = match definition.target.inner() {
            TypeRef::Primitive(primitive) => Some((*primitive, Vec::new())),
            TypeRef::Named(target) if self.symbols.aliases.contains(target) => self
                .resolve_alias(target.as_str())
                .map(|alias| (alias.primitive(), alias.annotations().to_vec())),
            TypeRef::Named(target) => {
                let diagnostic = self.unknown_type(
                    target,
                    definition.target.span(),
                    "a primitive or type alias",
                );
                self.collector.emit(diagnostic);
                None
            }
        };

        let resolved = target.map(|(primitive, inherited)| {
            let own = own_annotations(&definition.annotations);
            Alias::new(name, primitive, merge_annotations(&inherited, &own))
        });
        trace!(alias = name, resolved = resolved.is_some(); "Resolved type alias");

        self.aliases.insert(name, resolved.clone());
        resolved
    }

    /// Resolve a field type to a scalar, with the alias chain's annotations.
    fn resolve_scalar(
        &mut self,
        ty: &'p Spanned<TypeRef>,
        expected: &str,
    ) -> Option<(ScalarType, Vec<Annotation>)> {
        match ty.inner() {
            TypeRef::Primitive(primitive) => Some((ScalarType::primitive(*primitive), Vec::new())),
            TypeRef::Named(name) if self.symbols.aliases.contains(name) => {
                let alias = self.resolve_alias(name.as_str())?;
                Some((alias.scalar_type(), alias.annotations().to_vec()))
            }
            TypeRef::Named(name) => {
                let diagnostic = self.unknown_type(name, ty.span(), expected);
                self.collector.emit(diagnostic);
                None
            }
        }
    }

    fn resolve_field(&mut self, field: &'p ast::FieldDefinition) -> Option<Field> {
        let (ty, inherited) = self.resolve_scalar(&field.ty, "a primitive or type alias")?;
        let own = own_annotations(&field.annotations);

        Some(Field::new(
            field.name.as_str(),
            ty,
            field.mutable,
            merge_annotations(&inherited, &own),
        ))
    }

    fn declare_fields(
        &mut self,
        merger: &mut FieldMerger<'_>,
        fields: &'p [ast::FieldDefinition],
    ) {
        for field in fields {
            if let Some(resolved) = self.resolve_field(field) {
                merger.declare(resolved, field.span(), &mut self.collector);
            }
        }
    }

    // ========================================================================
    // Traits
    // ========================================================================

    fn resolve_traits(&mut self) {
        let traits = &self.symbols.traits;
        let cycles = find_cycles(traits.names(), |name| {
            traits
                .get(name)
                .map(|definition| {
                    definition
                        .extends
                        .iter()
                        .map(|extended| extended.as_str())
                        .collect()
                })
                .unwrap_or_default()
        });

        for cycle in cycles {
            let members: Vec<(&str, Span)> = cycle
                .iter()
                .filter_map(|name| self.symbols.traits.get(name))
                .map(|definition| (definition.name.as_str(), definition.name.span()))
                .collect();
            self.emit_cycle(ErrorCode::E303, ("trait", "traits"), &members);
            self.cyclic_traits.extend(cycle);
        }

        for name in self.symbols.traits.names().collect::<Vec<_>>() {
            self.trait_closure(name);
        }
    }

    /// Compute the merged field set of a trait, memoized.
    ///
    /// Extensions between members of a cycle are skipped.
    fn trait_closure(&mut self, name: &'p str) -> Option<Vec<Field>> {
        if let Some(resolved) = self.traits.get(name) {
            return Some(resolved.fields().to_vec());
        }
        let definition = self.symbols.traits.get(name)?;
        let cyclic = self.cyclic_traits.contains(name);

        let mut merger = FieldMerger::new(name);
        for extended in &definition.extends {
            if !self.symbols.traits.contains(extended.as_str()) {
                let diagnostic = self.unknown_type(extended, extended.span(), "a trait");
                self.collector.emit(diagnostic);
                continue;
            }
            if cyclic && self.cyclic_traits.contains(extended.as_str()) {
                continue;
            }
            if let Some(fields) = self.trait_closure(extended.as_str()) {
                merger.inherit(&fields, extended, extended.span(), &mut self.collector);
            }
        }
        self.declare_fields(&mut merger, &definition.fields);

        let fields = merger.finish();
        let extends = definition
            .extends
            .iter()
            .map(|extended| extended.inner().clone())
            .collect();
        trace!(name, fields = fields.len(); "Resolved trait");

        self.traits
            .insert(name, Trait::new(name, extends, fields.clone()));
        Some(fields)
    }

    fn trait_fields(&self, name: &str) -> Option<Vec<Field>> {
        self.traits.get(name).map(|resolved| resolved.fields().to_vec())
    }

    /// Merge the closures of `references`, reporting names that are not traits.
    fn inherit_traits(
        &mut self,
        merger: &mut FieldMerger<'_>,
        references: &'p [Spanned<String>],
    ) -> Vec<String> {
        let mut traits = Vec::new();
        for reference in references {
            match self.trait_fields(reference) {
                Some(fields) => {
                    merger.inherit(&fields, reference, reference.span(), &mut self.collector);
                    traits.push(reference.inner().clone());
                }
                None => {
                    let diagnostic = self.unknown_type(reference, reference.span(), "a trait");
                    self.collector.emit(diagnostic);
                }
            }
        }
        traits
    }

    // ========================================================================
    // Abstract Entities
    // ========================================================================

    fn resolve_abstract_entity(&mut self, definition: &'p ast::AbstractEntityDefinition) {
        let name = definition.name.as_str();

        let mut merger = FieldMerger::new(name);
        let traits = self.inherit_traits(&mut merger, &definition.traits);
        self.declare_fields(&mut merger, &definition.fields);

        if let Some((first, rest)) = definition.strategies.split_first() {
            for extra in rest {
                self.collector.emit(
                    Diagnostic::error(format!(
                        "inheritance strategy of `{name}` is declared more than once"
                    ))
                    .with_code(ErrorCode::E301)
                    .with_subject(name)
                    .with_label(extra.span(), "second inheritance clause")
                    .with_secondary_label(first.span(), "first declared here"),
                );
            }

            if first.kind() == InheritanceKind::SingleTable && first.discriminator().is_none() {
                self.collector.emit(
                    Diagnostic::error(format!(
                        "abstract entity `{name}` uses single-table inheritance without a discriminator"
                    ))
                    .with_code(ErrorCode::E310)
                    .with_subject(name)
                    .with_label(first.span(), "no discriminator column")
                    .with_help("name the column, e.g. `inheritance single_table discriminator kind`"),
                );
            }
        }

        let fields = merger.finish();
        trace!(name, fields = fields.len(); "Resolved abstract entity");

        self.abstract_entities.insert(
            name,
            AbstractEntity::new(name, traits, fields, definition.strategy()),
        );
    }

    // ========================================================================
    // Entities
    // ========================================================================

    fn resolve_entity(&mut self, definition: &'p ast::EntityDefinition) {
        let name = definition.name.as_str();

        let mut base: Option<&'p Spanned<String>> = None;
        let mut trait_references: Vec<Spanned<String>> = Vec::new();
        for supertype in &definition.supertypes {
            if self.symbols.abstract_entities.contains(supertype) {
                match base {
                    None => base = Some(supertype),
                    Some(first) => self.collector.emit(
                        Diagnostic::error(format!(
                            "entity `{name}` extends more than one abstract entity"
                        ))
                        .with_code(ErrorCode::E306)
                        .with_subject(name)
                        .with_subject(supertype.as_str())
                        .with_label(supertype.span(), "second base")
                        .with_secondary_label(first.span(), "first base")
                        .with_help("an entity has at most one abstract base; use traits to share fields"),
                    ),
                }
            } else if self.symbols.traits.contains(supertype) {
                trait_references.push(supertype.clone());
            } else {
                let diagnostic = Diagnostic::error(format!(
                    "unknown base type `{supertype}` for entity `{name}`"
                ))
                .with_code(ErrorCode::E305)
                .with_subject(name)
                .with_subject(supertype.as_str())
                .with_label(supertype.span(), "not an abstract entity or trait");
                let diagnostic = match self.describe_symbol(supertype) {
                    Some(kind) => diagnostic.with_help(format!(
                        "`{supertype}` is {kind}; entities extend abstract entities and traits"
                    )),
                    None => diagnostic,
                };
                self.collector.emit(diagnostic);
            }
        }

        let mut merger = FieldMerger::new(name);
        if let Some(base) = base {
            let inherited = self
                .abstract_entities
                .get(base.as_str())
                .map(|abstract_entity| abstract_entity.fields().to_vec());
            if let Some(fields) = inherited {
                merger.inherit(&fields, base, base.span(), &mut self.collector);
            }
        }
        let mut traits = Vec::new();
        for reference in &trait_references {
            if let Some(fields) = self.trait_fields(reference) {
                merger.inherit(&fields, reference, reference.span(), &mut self.collector);
                traits.push(reference.inner().clone());
            }
        }
        self.declare_fields(&mut merger, &definition.fields);
        let fields = merger.finish();

        check_unique(
            "relationship",
            definition.relationships.iter().map(|relationship| &relationship.name),
            &mut self.collector,
        );
        let relationships = definition
            .relationships
            .iter()
            .filter_map(|relationship| {
                self.resolve_relationship(name, base.map(|base| base.as_str()), relationship)
            })
            .collect();

        let constraints = definition
            .constraints
            .iter()
            .map(|constraint| self.resolve_constraint(name, &fields, constraint))
            .collect();

        trace!(name, fields = fields.len(); "Resolved entity");

        self.entities.insert(
            name,
            Entity::new(
                name,
                base.map(|base| base.inner().clone()),
                traits,
                fields,
                relationships,
                constraints,
            ),
        );
    }

    fn resolve_relationship(
        &mut self,
        owner: &'p str,
        owner_base: Option<&'p str>,
        relationship: &'p ast::RelationshipDefinition,
    ) -> Option<Relationship> {
        let target = relationship.target.as_str();
        let mut valid = true;

        if !self.symbols.is_entity(target) {
            self.collector.emit(
                Diagnostic::error(format!(
                    "relationship `{owner}.{}` targets unknown entity `{target}`",
                    relationship.name
                ))
                .with_code(ErrorCode::E307)
                .with_subject(owner)
                .with_subject(target)
                .with_label(relationship.target.span(), "not a declared entity"),
            );
            valid = false;
        }

        let kind = match &relationship.kind {
            ast::RelationKind::Single => Some(RelationKind::Single),
            ast::RelationKind::Collection(collection) => Some(RelationKind::Collection(*collection)),
            ast::RelationKind::Dictionary(key) => self
                .resolve_scalar(key, "a primitive or type alias")
                .map(|(scalar, _)| RelationKind::Dictionary(scalar)),
        };

        if let Some(mapped_by) = &relationship.mapped_by {
            if let Some(foreign_key) = &relationship.foreign_key {
                self.collector.emit(
                    Diagnostic::error(format!(
                        "inverse relationship `{owner}.{}` declares a foreign key",
                        relationship.name
                    ))
                    .with_code(ErrorCode::E308)
                    .with_subject(owner)
                    .with_subject(relationship.name.as_str())
                    .with_label(foreign_key.span(), "foreign key on the inverse side")
                    .with_secondary_label(mapped_by.span(), "inverse because of `mapped_by`")
                    .with_help(format!(
                        "move the foreign key to `{target}.{mapped_by}`, the owning side"
                    )),
                );
                valid = false;
            }

            if self.symbols.is_entity(target)
                && !self.check_mapped_by(owner, owner_base, relationship, mapped_by)
            {
                valid = false;
            }
        }

        let kind = kind?;
        valid.then(|| {
            Relationship::new(
                relationship.name.as_str(),
                kind,
                target,
                relationship
                    .foreign_key
                    .as_ref()
                    .map(|column| column.inner().clone()),
                relationship
                    .mapped_by
                    .as_ref()
                    .map(|property| property.inner().clone()),
                relationship.on_delete,
            )
        })
    }

    /// Check that `mapped_by` names an owning relationship of the target that
    /// points back at `owner` or its base.
    fn check_mapped_by(
        &mut self,
        owner: &str,
        owner_base: Option<&str>,
        relationship: &ast::RelationshipDefinition,
        mapped_by: &Spanned<String>,
    ) -> bool {
        let target = relationship.target.as_str();
        let counterpart = self.symbols.entities.get(target).and_then(|entity| {
            entity
                .relationships
                .iter()
                .find(|other| other.name.as_str() == mapped_by.as_str())
        });

        let mismatch = |message: String| {
            Diagnostic::error(message)
                .with_code(ErrorCode::E308)
                .with_subject(owner)
                .with_subject(relationship.name.as_str())
        };

        let diagnostic = match counterpart {
            None => mismatch(format!(
                "`{target}` has no relationship `{mapped_by}` to map `{owner}.{}` by",
                relationship.name
            ))
            .with_label(mapped_by.span(), "no such relationship on the target"),
            Some(other) if other.mapped_by.is_some() => mismatch(format!(
                "both sides of `{owner}.{}` and `{target}.{mapped_by}` are inverse",
                relationship.name
            ))
            .with_label(mapped_by.span(), "refers to another inverse side")
            .with_secondary_label(other.name.span(), "also declares `mapped_by`")
            .with_help("exactly one side of a relationship owns it; remove one `mapped_by`"),
            Some(other)
                if other.target.as_str() != owner && Some(other.target.as_str()) != owner_base =>
            {
                mismatch(format!(
                    "`{target}.{mapped_by}` targets `{}`, not `{owner}`",
                    other.target
                ))
                .with_label(mapped_by.span(), "mapped by a relationship to another entity")
                .with_secondary_label(other.target.span(), "targets this entity instead")
            }
            Some(_) => return true,
        };

        self.collector.emit(diagnostic);
        false
    }

    fn resolve_constraint(
        &mut self,
        owner: &str,
        fields: &[Field],
        constraint: &ast::ConstraintDefinition,
    ) -> Constraint {
        for column in constraint.columns() {
            if !fields.iter().any(|field| field.name() == column.as_str()) {
                self.collector.emit(
                    Diagnostic::error(format!("entity `{owner}` has no column `{column}`"))
                        .with_code(ErrorCode::E309)
                        .with_subject(owner)
                        .with_subject(column.as_str())
                        .with_label(column.span(), "not a field of the entity")
                        .with_help("constraints may only name fields, including inherited ones"),
                );
            }
        }

        let columns = constraint
            .columns()
            .iter()
            .map(|column| column.inner().clone())
            .collect();
        Constraint::new(constraint.kind(), columns)
    }

    // ========================================================================
    // Services
    // ========================================================================

    /// Resolve a parameter or return type: a scalar, or a (possibly abstract)
    /// entity. Aliases take precedence over entities of the same name.
    fn resolve_value_type(&mut self, ty: &'p Spanned<TypeRef>) -> Option<ValueType> {
        match ty.inner() {
            TypeRef::Named(name)
                if !self.symbols.aliases.contains(name) && self.symbols.is_entity(name) =>
            {
                Some(ValueType::Entity(name.clone()))
            }
            _ => self
                .resolve_scalar(ty, "a primitive, type alias or entity")
                .map(|(scalar, _)| ValueType::Scalar(scalar)),
        }
    }

    fn resolve_service(&mut self, definition: &'p ast::ServiceDefinition) -> Service {
        check_unique(
            "function",
            definition.functions.iter().map(|function| &function.name),
            &mut self.collector,
        );

        let functions = definition
            .functions
            .iter()
            .map(|function| {
                check_unique(
                    "parameter",
                    function.parameters.iter().map(|parameter| &parameter.name),
                    &mut self.collector,
                );

                let parameters = function
                    .parameters
                    .iter()
                    .filter_map(|parameter| {
                        self.resolve_value_type(&parameter.ty)
                            .map(|ty| Parameter::new(parameter.name.as_str(), ty))
                    })
                    .collect();
                let returns = function
                    .returns
                    .as_ref()
                    .and_then(|returns| self.resolve_value_type(returns));

                Function::new(
                    function.name.as_str(),
                    parameters,
                    returns,
                    function.body.clone(),
                )
            })
            .collect();

        Service::new(definition.name.as_str(), functions)
    }

    // ========================================================================
    // Views and Configs
    // ========================================================================

    fn resolve_view(&mut self, definition: &'p ast::ViewDefinition) -> View {
        let name = definition.name.as_str();

        let mut merger = FieldMerger::new(name);
        let traits = self.inherit_traits(&mut merger, &definition.traits);
        self.declare_fields(&mut merger, &definition.fields);

        let entities = &self.entities;
        let abstract_entities = &self.abstract_entities;
        let binder = QueryBinder::new(
            name,
            &definition.query,
            |entity| {
                entities
                    .get(entity)
                    .map(Entity::fields)
                    .or_else(|| abstract_entities.get(entity).map(AbstractEntity::fields))
            },
            &mut self.collector,
        );
        let query = binder.bind(&definition.query, &mut self.collector);

        View::new(name, traits, merger.finish(), query)
    }

    fn resolve_configs(&mut self) -> Vec<Config> {
        self.project
            .configs
            .iter()
            .map(|config| {
                check_unique(
                    "config key",
                    config.settings.iter().map(|setting| &setting.key),
                    &mut self.collector,
                );

                let mut settings = IndexMap::new();
                for setting in &config.settings {
                    settings
                        .entry(setting.key.inner().clone())
                        .or_insert_with(|| setting.value.inner().clone());
                }
                Config::new(settings)
            })
            .collect()
    }
}

fn own_annotations(annotations: &[Spanned<Annotation>]) -> Vec<Annotation> {
    annotations
        .iter()
        .map(|annotation| annotation.inner().clone())
        .collect()
}
