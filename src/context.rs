//! Database context: the entry point for queries and mutations.

use crate::ast::predicate::Predicate;
use crate::ast::{QueryDescription, Source};
use crate::cancel::CancellationToken;
use crate::driver::{AsyncDriver, Driver};
use crate::engine::QueryProvider;
use crate::error::ShadowResult;
use crate::query::Query;
use crate::row::Row;
use crate::transpiler::{Dialect, build_delete, build_stored_procedure, build_update};
use crate::value::Value;

/// Owns a driver and hands out queries against it.
///
/// The connection is opened lazily by the first command. A context is not
/// meant for concurrent execution; use one per concurrent caller unless the
/// driver itself allows sharing.
pub struct DatabaseContext<D> {
    driver: D,
    dialect: Dialect,
}

impl<D> DatabaseContext<D> {
    /// Create a context emitting the default (SQL Server) dialect.
    pub fn new(driver: D) -> Self {
        Self::with_dialect(driver, Dialect::default())
    }

    pub fn with_dialect(driver: D, dialect: Dialect) -> Self {
        Self { driver, dialect }
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub(crate) fn provider(&self) -> QueryProvider<'_, D> {
        QueryProvider::new(&self.driver, self.dialect)
    }

    /// Start a query over a table or view.
    pub fn query_table(&self, name: &str) -> ShadowResult<Query<'_, D>> {
        Ok(Query::new(self, QueryDescription::new(Source::table(name)?)))
    }

    /// Start a query over a table-valued function call.
    pub fn query_function<V: Into<Value>>(
        &self,
        name: &str,
        args: impl IntoIterator<Item = V>,
    ) -> ShadowResult<Query<'_, D>> {
        Ok(Query::new(
            self,
            QueryDescription::new(Source::function(name, args)?),
        ))
    }
}

impl<D: Driver> DatabaseContext<D> {
    /// Call a stored procedure and return the rows of its return-value batch.
    pub fn query_stored_procedure(
        &self,
        name: &str,
        params: &[(String, Value)],
    ) -> ShadowResult<Vec<Row>> {
        let translation = build_stored_procedure(name, params, self.dialect)?;
        self.provider().query_rows(&translation)?.collect()
    }

    /// Update matching rows of `target`; returns the affected count.
    pub fn update(
        &self,
        target: &str,
        fields: &[(String, Value)],
        predicate: Option<&Predicate>,
    ) -> ShadowResult<u64> {
        let translation = build_update(target, fields, predicate, self.dialect)?;
        self.provider().execute_non_query(&translation)
    }

    /// Delete matching rows of `source`; returns the affected count.
    pub fn remove(&self, source: &str, predicate: Option<&Predicate>) -> ShadowResult<u64> {
        let translation = build_delete(source, predicate, self.dialect)?;
        self.provider().execute_non_query(&translation)
    }

    pub fn close(&self) -> ShadowResult<()> {
        if self.driver.is_open() {
            self.driver.close()?;
        }
        Ok(())
    }
}

impl<D: AsyncDriver> DatabaseContext<D> {
    pub async fn query_stored_procedure_async(
        &self,
        name: &str,
        params: &[(String, Value)],
        cancel: &CancellationToken,
    ) -> ShadowResult<Vec<Row>> {
        let translation = build_stored_procedure(name, params, self.dialect)?;
        self.provider().query_rows_async(&translation, cancel).await
    }

    pub async fn update_async(
        &self,
        target: &str,
        fields: &[(String, Value)],
        predicate: Option<&Predicate>,
    ) -> ShadowResult<u64> {
        let translation = build_update(target, fields, predicate, self.dialect)?;
        self.provider().execute_non_query_async(&translation).await
    }

    pub async fn remove_async(
        &self,
        source: &str,
        predicate: Option<&Predicate>,
    ) -> ShadowResult<u64> {
        let translation = build_delete(source, predicate, self.dialect)?;
        self.provider().execute_non_query_async(&translation).await
    }

    pub async fn close_async(&self) -> ShadowResult<()> {
        if self.driver.is_open() {
            self.driver.close().await?;
        }
        Ok(())
    }
}
