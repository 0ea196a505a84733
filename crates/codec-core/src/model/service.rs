//! Services and their functions.

use crate::{model::ValueType, statement::Statement};

/// A function parameter with a resolved type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    name: String,
    ty: ValueType,
}

impl Parameter {
    pub fn new(name: impl Into<String>, ty: ValueType) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ty(&self) -> &ValueType {
        &self.ty
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Function {
    name: String,
    parameters: Vec<Parameter>,
    returns: Option<ValueType>,
    body: Vec<Statement>,
}

impl Function {
    pub fn new(
        name: impl Into<String>,
        parameters: Vec<Parameter>,
        returns: Option<ValueType>,
        body: Vec<Statement>,
    ) -> Self {
        Self {
            name: name.into(),
            parameters,
            returns,
            body,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    pub fn returns(&self) -> Option<&ValueType> {
        self.returns.as_ref()
    }

    pub fn body(&self) -> &[Statement] {
        &self.body
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Service {
    name: String,
    functions: Vec<Function>,
}

impl Service {
    pub fn new(name: impl Into<String>, functions: Vec<Function>) -> Self {
        Self {
            name: name.into(),
            functions,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn functions(&self) -> &[Function] {
        &self.functions
    }

    pub fn function(&self, name: &str) -> Option<&Function> {
        self.functions.iter().find(|function| function.name() == name)
    }
}
