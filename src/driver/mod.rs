//! Database driver abstraction.
//!
//! The query engine talks to the database only through these traits. A
//! driver binds parameters by name, returns rows as ordered
//! `(column, value)` pairs and reports failures as [`DriverError`], which
//! the engine passes through untouched.

pub mod pool;

use std::collections::HashSet;

use async_trait::async_trait;

use crate::error::DriverError;
use crate::params::Param;
use crate::value::Value;

pub use pool::SqlxDriver;

/// One row as returned by a driver, in column order.
pub type RawRow = Vec<(String, Value)>;

/// Forward-only cursor over a blocking result set.
///
/// Dropping the cursor releases the underlying command.
pub trait RowCursor {
    fn next_row(&mut self) -> Result<Option<RawRow>, DriverError>;
}

/// Blocking database connection.
pub trait Driver: Send + Sync {
    fn open(&self) -> Result<(), DriverError>;

    fn is_open(&self) -> bool;

    fn close(&self) -> Result<(), DriverError>;

    fn execute_query<'a>(
        &'a self,
        sql: &str,
        params: &[Param],
    ) -> Result<Box<dyn RowCursor + 'a>, DriverError>;

    /// First column of the first row, `Value::Null` if there is none.
    fn execute_scalar(&self, sql: &str, params: &[Param]) -> Result<Value, DriverError>;

    /// Affected row count.
    fn execute_non_query(&self, sql: &str, params: &[Param]) -> Result<u64, DriverError>;
}

/// Forward-only cursor over an asynchronous result set.
#[async_trait]
pub trait AsyncRowCursor: Send {
    async fn next_row(&mut self) -> Result<Option<RawRow>, DriverError>;
}

/// Asynchronous database connection.
///
/// Only command execution and row fetches suspend.
#[async_trait]
pub trait AsyncDriver: Send + Sync {
    async fn open(&self) -> Result<(), DriverError>;

    fn is_open(&self) -> bool;

    async fn close(&self) -> Result<(), DriverError>;

    async fn execute_query<'a>(
        &'a self,
        sql: &'a str,
        params: &'a [Param],
    ) -> Result<Box<dyn AsyncRowCursor + 'a>, DriverError>;

    async fn execute_scalar(&self, sql: &str, params: &[Param]) -> Result<Value, DriverError>;

    async fn execute_non_query(&self, sql: &str, params: &[Param]) -> Result<u64, DriverError>;
}

/// Reject a command that binds the same parameter name twice.
///
/// Names are compared case-insensitively, as SQL Server does.
pub fn check_unique_names(params: &[Param]) -> Result<(), DriverError> {
    let mut seen = HashSet::with_capacity(params.len());
    for param in params {
        if !seen.insert(param.name.to_ascii_lowercase()) {
            return Err(DriverError::message(format!(
                "The variable name '{}' has already been declared.",
                param.name
            )));
        }
    }
    Ok(())
}
