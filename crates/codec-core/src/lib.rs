//! Codec Core Types and Definitions
//!
//! This crate provides the foundational types shared by every stage of the
//! Codec schema compiler. It includes:
//!
//! - **Primitives**: The closed set of built-in scalar types ([`primitive::PrimitiveType`])
//! - **Annotations**: Validation constraints carried into generated code ([`annotation::Annotation`])
//! - **Schema vocabulary**: Leaf enums for relationships, inheritance and queries ([`schema`] module)
//! - **Statements**: The structured control-flow sublanguage of service functions ([`statement`] module)
//! - **Naming**: Word conventions applied by generators ([`naming::WordConvention`])
//! - **Options**: Parser recovery policy ([`options::Recovery`])
//! - **Model**: The fully resolved project handed to generators ([`model`] module)

pub mod annotation;
pub mod model;
pub mod naming;
pub mod options;
pub mod primitive;
pub mod schema;
pub mod statement;
