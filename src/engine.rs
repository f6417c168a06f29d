//! Query execution engine.
//!
//! [`QueryProvider`] turns a terminal call into one translated statement,
//! dispatches it through a driver and post-processes the result: `Count`
//! applies Skip/Take to the scalar, `First`/`FirstOrDefault` enforce the
//! single-row contract. Driver errors are returned unchanged.

use crate::ast::predicate::Predicate;
use crate::ast::{QueryDescription, Terminal};
use crate::cancel::CancellationToken;
use crate::cursor::{AsyncRowStream, RowStream};
use crate::driver::{AsyncDriver, Driver};
use crate::error::{ShadowError, ShadowResult};
use crate::row::Row;
use crate::transpiler::{Dialect, Pagination, ToSql, Translation};
use crate::value::Value;

/// Executes query descriptions against a driver.
pub struct QueryProvider<'d, D: ?Sized> {
    driver: &'d D,
    dialect: Dialect,
}

impl<'d, D: ?Sized> QueryProvider<'d, D> {
    pub fn new(driver: &'d D, dialect: Dialect) -> Self {
        Self { driver, dialect }
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Translate without executing.
    pub fn translate(&self, query: &QueryDescription) -> ShadowResult<Translation> {
        query.to_sql_with_dialect(self.dialect)
    }
}

impl<'d, D: Driver + ?Sized> QueryProvider<'d, D> {
    fn ensure_open(&self) -> ShadowResult<()> {
        if !self.driver.is_open() {
            self.driver.open()?;
        }
        Ok(())
    }

    /// Execute and return a lazy row stream.
    pub fn stream(&self, query: &QueryDescription) -> ShadowResult<RowStream<'d>> {
        let translation = self.translate(&query.terminate(Terminal::ToList))?;
        self.query_rows(&translation)
    }

    pub fn to_list(&self, query: &QueryDescription) -> ShadowResult<Vec<Row>> {
        self.stream(query)?.collect()
    }

    pub fn count(&self, query: &QueryDescription, predicate: Option<Predicate>) -> ShadowResult<i64> {
        let translation = self.translate(&query.terminate(Terminal::Count(predicate)))?;
        self.ensure_open()?;
        log_dispatch(&translation);
        let scalar = self
            .driver
            .execute_scalar(&translation.sql, &translation.params)?;
        adjusted_count(query, &scalar)
    }

    pub fn first(&self, query: &QueryDescription, predicate: Option<Predicate>) -> ShadowResult<Row> {
        let translation = self.translate(&query.terminate(Terminal::First(predicate)))?;
        let rows = self.query_rows(&translation)?;
        single(rows)?.ok_or_else(|| not_found(query))
    }

    pub fn first_or_default(
        &self,
        query: &QueryDescription,
        predicate: Option<Predicate>,
    ) -> ShadowResult<Option<Row>> {
        let translation = self.translate(&query.terminate(Terminal::FirstOrDefault(predicate)))?;
        single(self.query_rows(&translation)?)
    }

    /// Run an already translated statement that returns rows.
    pub fn query_rows(&self, translation: &Translation) -> ShadowResult<RowStream<'d>> {
        self.ensure_open()?;
        log_dispatch(translation);
        let cursor = self
            .driver
            .execute_query(&translation.sql, &translation.params)?;
        Ok(RowStream::new(cursor))
    }

    /// Run an already translated statement and return the affected count.
    pub fn execute_non_query(&self, translation: &Translation) -> ShadowResult<u64> {
        self.ensure_open()?;
        log_dispatch(translation);
        Ok(self
            .driver
            .execute_non_query(&translation.sql, &translation.params)?)
    }
}

impl<'d, D: AsyncDriver + ?Sized> QueryProvider<'d, D> {
    async fn ensure_open_async(&self) -> ShadowResult<()> {
        if !self.driver.is_open() {
            self.driver.open().await?;
        }
        Ok(())
    }

    pub async fn to_list_async(
        &self,
        query: &QueryDescription,
        cancel: &CancellationToken,
    ) -> ShadowResult<Vec<Row>> {
        let translation = self.translate(&query.terminate(Terminal::ToList))?;
        self.query_rows_async(&translation, cancel).await
    }

    pub async fn count_async(
        &self,
        query: &QueryDescription,
        predicate: Option<Predicate>,
    ) -> ShadowResult<i64> {
        let translation = self.translate(&query.terminate(Terminal::Count(predicate)))?;
        self.ensure_open_async().await?;
        log_dispatch(&translation);
        let scalar = self
            .driver
            .execute_scalar(&translation.sql, &translation.params)
            .await?;
        adjusted_count(query, &scalar)
    }

    pub async fn first_async(
        &self,
        query: &QueryDescription,
        predicate: Option<Predicate>,
    ) -> ShadowResult<Row> {
        let translation = self.translate(&query.terminate(Terminal::First(predicate)))?;
        let rows = self
            .query_rows_async(&translation, &CancellationToken::none())
            .await?;
        single(rows.into_iter().map(Ok))?.ok_or_else(|| not_found(query))
    }

    pub async fn first_or_default_async(
        &self,
        query: &QueryDescription,
        predicate: Option<Predicate>,
    ) -> ShadowResult<Option<Row>> {
        let translation = self.translate(&query.terminate(Terminal::FirstOrDefault(predicate)))?;
        let rows = self
            .query_rows_async(&translation, &CancellationToken::none())
            .await?;
        single(rows.into_iter().map(Ok))
    }

    /// Run a translated statement and materialize its rows, checking the
    /// token before the command is issued and before every fetch.
    pub async fn query_rows_async(
        &self,
        translation: &Translation,
        cancel: &CancellationToken,
    ) -> ShadowResult<Vec<Row>> {
        cancel.check()?;
        self.ensure_open_async().await?;
        log_dispatch(translation);
        let cursor = self
            .driver
            .execute_query(&translation.sql, &translation.params)
            .await?;
        AsyncRowStream::new(cursor, cancel.clone()).collect().await
    }

    pub async fn execute_non_query_async(&self, translation: &Translation) -> ShadowResult<u64> {
        self.ensure_open_async().await?;
        log_dispatch(translation);
        Ok(self
            .driver
            .execute_non_query(&translation.sql, &translation.params)
            .await?)
    }
}

fn log_dispatch(translation: &Translation) {
    tracing::debug!(
        sql = %translation.sql,
        params = translation.params.len(),
        "dispatching command"
    );
}

/// Apply the query's Skip/Take to a `COUNT(*)` scalar.
fn adjusted_count(query: &QueryDescription, scalar: &Value) -> ShadowResult<i64> {
    let total = scalar.as_i64().ok_or_else(|| {
        ShadowError::invalid_operation(format!(
            "COUNT(*) returned a non-integer value: {}",
            scalar
        ))
    })?;
    Ok(Pagination::of(query).adjust_count(total))
}

/// Enforce "at most one row", reading the result to the end.
fn single(rows: impl Iterator<Item = ShadowResult<Row>>) -> ShadowResult<Option<Row>> {
    let mut first = None;
    let mut actual = 0;
    for row in rows {
        let row = row?;
        actual += 1;
        if first.is_none() {
            first = Some(row);
        }
    }
    if actual > 1 {
        tracing::warn!(actual, "single-row terminal matched several rows");
        return Err(ShadowError::Cardinality {
            expected: 1,
            actual,
        });
    }
    Ok(first)
}

fn not_found(query: &QueryDescription) -> ShadowError {
    ShadowError::NotFound(format!(
        "no row of '{}' matches the query",
        query.source().name()
    ))
}
