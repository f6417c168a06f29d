//! Per-translation parameter registry.

use crate::value::Value;

/// A named parameter bound to a command.
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: String,
    pub value: Value,
}

impl Param {
    pub fn new(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Append-only store of generated parameters.
///
/// Names are `@param0`, `@param1`, ... in append order. A store belongs to
/// exactly one translation; nothing is shared between stores, so translating
/// the same query twice yields the same names.
#[derive(Debug, Default)]
pub struct ParamStore {
    params: Vec<Param>,
}

impl ParamStore {
    pub fn new() -> Self {
        Self { params: Vec::new() }
    }

    /// Add a value and return its generated name.
    pub fn append(&mut self, value: impl Into<Value>) -> String {
        let name = format!("@param{}", self.params.len());
        self.params.push(Param {
            name: name.clone(),
            value: value.into(),
        });
        name
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Param> {
        self.params.iter()
    }

    pub fn into_params(self) -> Vec<Param> {
        self.params
    }
}
