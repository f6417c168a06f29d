//! # shadowq
//!
//! > **Compose queries, not strings.**
//!
//! shadowq builds queries against tables, views, table-valued functions and
//! stored procedures with a fluent, LINQ-style API, translates them into
//! parameterized SQL and returns loosely-typed rows.
//!
//! ## Quick Example
//!
//! ```rust,ignore
//! use shadowq::prelude::*;
//!
//! let ctx = DatabaseContext::new(driver);
//! let alex = ctx
//!     .query_table("Users")?
//!     .filter(equals("Id", 1)?)
//!     .first()?;
//! // => SELECT TOP 1 * FROM Users WHERE Id = @param0
//! assert_eq!(alex.get_str("UserName"), Some("Alex"));
//! ```
//!
//! ## Operators
//!
//! | Operator                | SQL                                   |
//! |-------------------------|---------------------------------------|
//! | `filter`                | `WHERE` (repeated calls are AND-ed)   |
//! | `order_by` / `then_by`  | `ORDER BY a ASC, b DESC`              |
//! | `skip` / `take`         | `OFFSET n ROWS FETCH NEXT m ROW ONLY` |
//! | `select_only`           | explicit column list, last call wins  |
//! | `count`                 | `SELECT COUNT(*)`, Skip/Take applied to the result |
//! | `first`                 | `SELECT TOP 1`                        |

pub mod ast;
pub mod cancel;
pub mod config;
pub mod context;
pub mod cursor;
pub mod driver;
pub mod engine;
pub mod error;
pub mod params;
pub mod parser;
pub mod query;
pub mod row;
pub mod transpiler;
pub mod value;

pub mod prelude {
    pub use crate::ast::builders::*;
    pub use crate::ast::*;
    pub use crate::cancel::CancellationToken;
    pub use crate::context::DatabaseContext;
    pub use crate::cursor::RowStream;
    pub use crate::driver::{AsyncDriver, Driver, SqlxDriver};
    pub use crate::error::*;
    pub use crate::params::Param;
    pub use crate::parser::parse_predicate;
    pub use crate::query::Query;
    pub use crate::row::Row;
    pub use crate::transpiler::{Dialect, ToSql, Translation};
    pub use crate::value::Value;
}

pub use context::DatabaseContext;
pub use error::{DriverError, ShadowError, ShadowResult};

/// Parse a textual filter expression into a predicate.
///
/// ```
/// use shadowq::parse_predicate;
/// use shadowq::transpiler::ToSql;
/// use shadowq::ast::{QueryDescription, Source};
///
/// let p = parse_predicate("Id IN (0, 1)").unwrap();
/// let q = QueryDescription::new(Source::table("Users").unwrap()).filter(p);
/// assert_eq!(q.to_sql().unwrap().sql, "SELECT * FROM Users WHERE Id IN (@param0, @param1)");
/// ```
pub fn parse_predicate(input: &str) -> ShadowResult<ast::Predicate> {
    parser::parse_predicate(input)
}
