//! sqlx-backed driver over an `AnyPool`.
//!
//! Values the `Any` driver can't carry natively (decimal, date-time, guid)
//! are bound as text.

use async_trait::async_trait;
use futures::TryStreamExt;
use futures::stream::BoxStream;
use sqlx::any::{AnyArguments, AnyPoolOptions, AnyRow};
use sqlx::query::Query;
use sqlx::{Any, AnyPool, Column, Row, TypeInfo};
use tokio::sync::OnceCell;

use crate::driver::{AsyncDriver, AsyncRowCursor, RawRow, check_unique_names};
use crate::error::DriverError;
use crate::params::Param;
use crate::value::Value;

/// Asynchronous driver that connects lazily on [`AsyncDriver::open`].
pub struct SqlxDriver {
    url: String,
    max_connections: u32,
    pool: OnceCell<AnyPool>,
}

impl SqlxDriver {
    /// Create a driver for a connection URL such as `postgres://localhost/app`.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_connections: 5,
            pool: OnceCell::new(),
        }
    }

    pub fn with_max_connections(mut self, max_connections: u32) -> Self {
        self.max_connections = max_connections.max(1);
        self
    }

    /// Wrap an already connected pool.
    pub fn from_pool(pool: AnyPool) -> Self {
        Self {
            url: String::new(),
            max_connections: 0,
            pool: OnceCell::new_with(Some(pool)),
        }
    }

    fn pool(&self) -> Result<&AnyPool, DriverError> {
        self.pool
            .get()
            .ok_or_else(|| DriverError::message("connection is not open"))
    }
}

#[async_trait]
impl AsyncDriver for SqlxDriver {
    async fn open(&self) -> Result<(), DriverError> {
        self.pool
            .get_or_try_init(|| async {
                sqlx::any::install_default_drivers();
                tracing::debug!(max_connections = self.max_connections, "connecting");
                AnyPoolOptions::new()
                    .max_connections(self.max_connections)
                    .connect(&self.url)
                    .await
            })
            .await?;
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.pool.get().is_some_and(|pool| !pool.is_closed())
    }

    async fn close(&self) -> Result<(), DriverError> {
        if let Some(pool) = self.pool.get() {
            pool.close().await;
        }
        Ok(())
    }

    async fn execute_query<'a>(
        &'a self,
        sql: &'a str,
        params: &'a [Param],
    ) -> Result<Box<dyn AsyncRowCursor + 'a>, DriverError> {
        let query = bind_params(sql, params)?;
        let pool = self.pool()?;
        Ok(Box::new(PoolCursor {
            rows: query.fetch(pool),
        }))
    }

    async fn execute_scalar(&self, sql: &str, params: &[Param]) -> Result<Value, DriverError> {
        let query = bind_params(sql, params)?;
        let row = query.fetch_optional(self.pool()?).await?;
        match row {
            Some(row) => Ok(decode_row(&row)?
                .into_iter()
                .next()
                .map(|(_, value)| value)
                .unwrap_or(Value::Null)),
            None => Ok(Value::Null),
        }
    }

    async fn execute_non_query(&self, sql: &str, params: &[Param]) -> Result<u64, DriverError> {
        let query = bind_params(sql, params)?;
        let result = query.execute(self.pool()?).await?;
        Ok(result.rows_affected())
    }
}

struct PoolCursor<'a> {
    rows: BoxStream<'a, Result<AnyRow, sqlx::Error>>,
}

#[async_trait]
impl AsyncRowCursor for PoolCursor<'_> {
    async fn next_row(&mut self) -> Result<Option<RawRow>, DriverError> {
        match self.rows.try_next().await? {
            Some(row) => Ok(Some(decode_row(&row)?)),
            None => Ok(None),
        }
    }
}

/// Bind parameters positionally, in store order.
fn bind_params<'q>(
    sql: &'q str,
    params: &[Param],
) -> Result<Query<'q, Any, AnyArguments<'q>>, DriverError> {
    check_unique_names(params)?;
    let mut query = sqlx::query(sql);
    for param in params {
        query = match &param.value {
            Value::Null => query.bind(None::<String>),
            Value::Bool(v) => query.bind(*v),
            Value::Byte(v) => query.bind(i16::from(*v)),
            Value::Int16(v) => query.bind(*v),
            Value::Int32(v) => query.bind(*v),
            Value::Int64(v) => query.bind(*v),
            Value::Double(v) => query.bind(*v),
            Value::String(v) => query.bind(v.clone()),
            Value::Decimal(v) => query.bind(v.to_string()),
            Value::DateTime(v) => query.bind(v.to_string()),
            Value::Guid(v) => query.bind(v.to_string()),
        };
    }
    Ok(query)
}

/// Convert an AnyRow into ordered column/value pairs.
fn decode_row(row: &AnyRow) -> Result<RawRow, DriverError> {
    let mut values = Vec::with_capacity(row.columns().len());

    for (i, column) in row.columns().iter().enumerate() {
        let name = column.name().to_string();
        let value = match column.type_info().name() {
            "NULL" => Value::Null,
            "BOOL" | "BOOLEAN" => row.try_get::<Option<bool>, _>(i)?.into(),
            "INT2" | "SMALLINT" => row.try_get::<Option<i16>, _>(i)?.into(),
            "INT4" | "INTEGER" => row.try_get::<Option<i32>, _>(i)?.into(),
            "INT8" | "BIGINT" => row.try_get::<Option<i64>, _>(i)?.into(),
            "FLOAT4" | "REAL" => row
                .try_get::<Option<f32>, _>(i)?
                .map(f64::from)
                .into(),
            "FLOAT8" | "DOUBLE" => row.try_get::<Option<f64>, _>(i)?.into(),
            // anything else comes back as text
            _ => text_value(row.try_get::<Option<String>, _>(i))?,
        };
        values.push((name, value));
    }

    Ok(values)
}

/// A text-decoded column. SQL NULL stays `Null`; a decode failure is an error.
fn text_value(decoded: Result<Option<String>, sqlx::Error>) -> Result<Value, DriverError> {
    Ok(decoded?.into())
}
