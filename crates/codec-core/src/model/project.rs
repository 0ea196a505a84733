//! The resolved project root.

use indexmap::IndexMap;

use crate::model::{AbstractEntity, Alias, Entity, Field, Service, Trait, View};

/// Opaque generator settings from a `config { ... }` block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    settings: IndexMap<String, String>,
}

impl Config {
    pub fn new(settings: IndexMap<String, String>) -> Self {
        Self { settings }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.settings.get(key).map(String::as_str)
    }

    pub fn settings(&self) -> &IndexMap<String, String> {
        &self.settings
    }
}

/// A declaration a relationship may target.
#[derive(Debug, Clone, Copy)]
pub enum EntityRef<'a> {
    Concrete(&'a Entity),
    Abstract(&'a AbstractEntity),
}

impl<'a> EntityRef<'a> {
    pub fn name(&self) -> &'a str {
        match self {
            EntityRef::Concrete(entity) => entity.name(),
            EntityRef::Abstract(entity) => entity.name(),
        }
    }

    pub fn fields(&self) -> &'a [Field] {
        match self {
            EntityRef::Concrete(entity) => entity.fields(),
            EntityRef::Abstract(entity) => entity.fields(),
        }
    }
}

/// A project whose every cross reference is verified and whose field sets
/// are fully merged.
///
/// Only the resolver constructs this type, and only when no diagnostics were
/// raised, so consumers may treat every lookup of a name stored in the model
/// as infallible in practice.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedProject {
    package: Option<String>,
    aliases: Vec<Alias>,
    traits: Vec<Trait>,
    abstract_entities: Vec<AbstractEntity>,
    entities: Vec<Entity>,
    services: Vec<Service>,
    views: Vec<View>,
    configs: Vec<Config>,
}

impl ResolvedProject {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        package: Option<String>,
        aliases: Vec<Alias>,
        traits: Vec<Trait>,
        abstract_entities: Vec<AbstractEntity>,
        entities: Vec<Entity>,
        services: Vec<Service>,
        views: Vec<View>,
        configs: Vec<Config>,
    ) -> Self {
        Self {
            package,
            aliases,
            traits,
            abstract_entities,
            entities,
            services,
            views,
            configs,
        }
    }

    /// The dotted package name, e.g. `Samples.PersonManagement`.
    pub fn package(&self) -> Option<&str> {
        self.package.as_deref()
    }

    pub fn aliases(&self) -> &[Alias] {
        &self.aliases
    }

    pub fn traits(&self) -> &[Trait] {
        &self.traits
    }

    pub fn abstract_entities(&self) -> &[AbstractEntity] {
        &self.abstract_entities
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn services(&self) -> &[Service] {
        &self.services
    }

    pub fn views(&self) -> &[View] {
        &self.views
    }

    pub fn configs(&self) -> &[Config] {
        &self.configs
    }

    /// Looks up a setting across all config blocks, first block wins.
    pub fn setting(&self, key: &str) -> Option<&str> {
        self.configs.iter().find_map(|config| config.get(key))
    }

    pub fn alias(&self, name: &str) -> Option<&Alias> {
        self.aliases.iter().find(|alias| alias.name() == name)
    }

    pub fn trait_def(&self, name: &str) -> Option<&Trait> {
        self.traits.iter().find(|t| t.name() == name)
    }

    pub fn abstract_entity(&self, name: &str) -> Option<&AbstractEntity> {
        self.abstract_entities.iter().find(|e| e.name() == name)
    }

    pub fn entity(&self, name: &str) -> Option<&Entity> {
        self.entities.iter().find(|e| e.name() == name)
    }

    pub fn service(&self, name: &str) -> Option<&Service> {
        self.services.iter().find(|s| s.name() == name)
    }

    pub fn view(&self, name: &str) -> Option<&View> {
        self.views.iter().find(|v| v.name() == name)
    }

    /// Resolves an entity name that may denote either a concrete or an
    /// abstract entity, such as a relationship target.
    pub fn entity_ref(&self, name: &str) -> Option<EntityRef<'_>> {
        self.entity(name)
            .map(EntityRef::Concrete)
            .or_else(|| self.abstract_entity(name).map(EntityRef::Abstract))
    }

    /// Concrete entities whose base is the abstract entity `base`.
    pub fn subtypes_of<'a>(&'a self, base: &'a str) -> impl Iterator<Item = &'a Entity> + 'a {
        self.entities
            .iter()
            .filter(move |entity| entity.base() == Some(base))
    }
}
