//! Transpiler test modules.
//!
//! Tests are organized by category:
//! - `core`: SELECT shape, pagination, terminals, projection
//! - `filters`: WHERE rendering of every predicate form
//! - `dialects`: Postgres placeholders and paging
//! - `dml`: UPDATE, DELETE and stored procedure batches

mod dialects;
mod dml;
