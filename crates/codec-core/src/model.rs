//! Resolved project model.
//!
//! This module contains the representation produced by semantic resolution.
//! Every cross reference has been verified and every field set is fully
//! merged, so generators can consume it without further checks.
//!
//! # Pipeline Position
//!
//! ```text
//! Source Text
//!     ↓ parser
//! Raw AST (CodecProject) - syntactic structure with spans
//!     ↓ resolver
//! Resolved Model (these types) - merged fields, verified references
//!     ↓ generator
//! Generated files
//! ```
//!
//! References between declarations (a relationship's target, an entity's
//! base, a view source) are stored as names. [`ResolvedProject`] offers
//! lookups that turn those names back into declarations, which keeps the
//! model acyclic and trivially shareable across threads.
//!
//! # Organization
//!
//! - [`types`] - Field types and type aliases: [`ScalarType`], [`ValueType`], [`Field`], [`Alias`]
//! - [`entity`] - Traits, entities, relationships and constraints
//! - [`service`] - Services and their functions
//! - [`view`] - Views and validated queries
//! - [`project`] - The [`ResolvedProject`] root and its lookups

pub mod entity;
pub mod project;
pub mod service;
pub mod types;
pub mod view;

pub use entity::*;
pub use project::*;
pub use service::*;
pub use types::*;
pub use view::*;
