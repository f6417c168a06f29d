//! Dialect-specific output.

use pretty_assertions::assert_eq;

use crate::ast::builders::{collection_contains, equals, not_equals};
use crate::ast::{QueryDescription, Source, Terminal};
use crate::transpiler::{Dialect, ToSql};
use crate::value::Value;

#[test]
fn test_default_is_sqlserver() {
    assert_eq!(Dialect::default(), Dialect::SqlServer);
    assert_eq!("pg".parse::<Dialect>().unwrap(), Dialect::Postgres);
    assert_eq!("MSSQL".parse::<Dialect>().unwrap(), Dialect::SqlServer);
    assert!("oracle".parse::<Dialect>().is_err());
}

#[test]
fn test_postgres_placeholders() {
    let q = QueryDescription::new(Source::function("user_page", [10]).unwrap())
        .filter(collection_contains([0, 1], "id").unwrap());
    let t = q.to_sql_with_dialect(Dialect::Postgres).unwrap();
    assert_eq!(t.sql, "SELECT * FROM user_page($1) WHERE id IN ($2, $3)");
    // names stay store-generated
    assert_eq!(t.params[2].name, "@param2");
}

#[test]
fn test_postgres_first_pages_instead_of_top() {
    let q = QueryDescription::new(Source::table("users").unwrap())
        .filter(equals("id", 1).unwrap())
        .terminate(Terminal::First(None));
    assert_eq!(
        q.to_sql_with_dialect(Dialect::Postgres).unwrap().sql,
        "SELECT * FROM users WHERE id = $1 ORDER BY (SELECT NULL) OFFSET 0 ROWS FETCH NEXT 1 ROW ONLY"
    );
}

#[test]
fn test_postgres_count() {
    let q = QueryDescription::new(Source::table("users").unwrap())
        .skip(2)
        .unwrap()
        .terminate(Terminal::Count(Some(equals("id", 1).unwrap())));
    assert_eq!(
        q.to_sql_with_dialect(Dialect::Postgres).unwrap().sql,
        "SELECT COUNT(*) FROM users WHERE id = $1"
    );
}

#[test]
fn test_postgres_binds_real_booleans() {
    let q = QueryDescription::new(Source::table("users").unwrap())
        .filter(equals("is_active", true).unwrap())
        .filter(not_equals("is_admin", true).unwrap());
    let t = q.to_sql_with_dialect(Dialect::Postgres).unwrap();
    assert_eq!(t.sql, "SELECT * FROM users WHERE (is_active = $1 AND is_admin <> $2)");
    assert_eq!(t.params[0].value, Value::Bool(true));
    assert_eq!(t.params[1].value, Value::Bool(true));

    let t = q.to_sql().unwrap();
    assert_eq!(t.params[0].value, Value::Int32(1));
}
