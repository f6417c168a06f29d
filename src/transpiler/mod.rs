//! SQL transpiler for query descriptions.
//!
//! Turns an operator chain into one parameterized statement. Translation is
//! pure: every call gets its own [`ParamStore`], so translating the same
//! description twice yields the same text and the same parameters.

pub mod dialect;
pub mod dml;
pub mod filter;
pub mod order;
pub mod projection;
pub mod select;

#[cfg(test)]
mod tests;

use crate::ast::query::QueryDescription;
use crate::error::ShadowResult;
use crate::params::{Param, ParamStore};
use crate::value::Value;

pub use dialect::Dialect;
pub use dml::{build_delete, build_stored_procedure, build_update};
pub use filter::FilterTranslator;
pub use select::{Pagination, build_select};

/// A translated statement and its bound parameters, in binding order.
#[derive(Debug, Clone, PartialEq)]
pub struct Translation {
    pub sql: String,
    pub params: Vec<Param>,
}

impl Translation {
    pub(crate) fn new(sql: String, store: ParamStore) -> Self {
        Self {
            sql,
            params: store.into_params(),
        }
    }
}

impl std::fmt::Display for Translation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.sql)
    }
}

/// Trait for converting query descriptions to SQL.
pub trait ToSql {
    /// Translate using the default dialect.
    fn to_sql(&self) -> ShadowResult<Translation> {
        self.to_sql_with_dialect(Dialect::default())
    }
    /// Translate for a specific dialect.
    fn to_sql_with_dialect(&self, dialect: Dialect) -> ShadowResult<Translation>;
}

impl ToSql for QueryDescription {
    fn to_sql_with_dialect(&self, dialect: Dialect) -> ShadowResult<Translation> {
        let translation = build_select(self, dialect)?;
        tracing::trace!(
            source = self.source().name(),
            operators = self.len(),
            sql = %translation.sql,
            "translated query"
        );
        Ok(translation)
    }
}

/// Push a value into the store and return the placeholder to emit.
pub(crate) fn bind(store: &mut ParamStore, dialect: Dialect, value: Value) -> String {
    let name = store.append(value);
    dialect.placeholder(&name, store.len())
}
