//! UPDATE, DELETE and stored procedure tests.

use pretty_assertions::assert_eq;

use crate::ast::builders::{and, equals, greater_than};
use crate::error::ShadowError;
use crate::params::Param;
use crate::transpiler::{Dialect, build_delete, build_stored_procedure, build_update};
use crate::value::Value;

#[test]
fn test_update_binds_fields_first() {
    let fields = vec![
        ("UserName".to_string(), Value::from("Bob")),
        ("Email".to_string(), Value::Null),
    ];
    let predicate = equals("Id", 1).unwrap();
    let t = build_update("Users", &fields, Some(&predicate), Dialect::SqlServer).unwrap();
    assert_eq!(
        t.sql,
        "UPDATE Users SET UserName = @param0, Email = @param1 WHERE Id = @param2"
    );
    assert_eq!(
        t.params,
        vec![
            Param::new("@param0", "Bob"),
            Param::new("@param1", Value::Null),
            Param::new("@param2", 1),
        ]
    );
}

#[test]
fn test_update_without_predicate() {
    let fields = vec![("IsActive".to_string(), Value::from(true))];
    let t = build_update("Users", &fields, None, Dialect::SqlServer).unwrap();
    assert_eq!(t.sql, "UPDATE Users SET IsActive = @param0");
}

#[test]
fn test_update_validation() {
    let fields = vec![("UserName".to_string(), Value::from("x"))];
    assert!(matches!(
        build_update(" ", &fields, None, Dialect::SqlServer).unwrap_err(),
        ShadowError::InvalidArgument { param: "update_target", .. }
    ));
    assert!(matches!(
        build_update("Users", &[], None, Dialect::SqlServer).unwrap_err(),
        ShadowError::InvalidArgument { param: "update_fields", .. }
    ));
    let blank = vec![("".to_string(), Value::from(1))];
    assert!(build_update("Users", &blank, None, Dialect::SqlServer).is_err());
}

#[test]
fn test_update_postgres() {
    let fields = vec![("name".to_string(), Value::from("Bob"))];
    let predicate = equals("id", 1).unwrap();
    let t = build_update("users", &fields, Some(&predicate), Dialect::Postgres).unwrap();
    assert_eq!(t.sql, "UPDATE users SET name = $1 WHERE id = $2");
}

#[test]
fn test_delete() {
    let predicate = and([greater_than("Id", 0).unwrap(), equals("UserName", "Katrin").unwrap()]).unwrap();
    let t = build_delete("Users", Some(&predicate), Dialect::SqlServer).unwrap();
    assert_eq!(
        t.sql,
        "DELETE FROM Users WHERE (Id > @param0 AND UserName = @param1)"
    );
    assert_eq!(
        build_delete("Users", None, Dialect::SqlServer).unwrap().sql,
        "DELETE FROM Users"
    );
}

#[test]
fn test_stored_procedure_batch() {
    let params = vec![
        ("From".to_string(), Value::from(1)),
        ("@To".to_string(), Value::from(3)),
    ];
    let t = build_stored_procedure("dbo.CountUsers", &params, Dialect::SqlServer).unwrap();
    assert_eq!(
        t.sql,
        "DECLARE @return_value int; EXEC @return_value = dbo.CountUsers @From, @To; SELECT 'Return Value' = @return_value"
    );
    assert_eq!(
        t.params,
        vec![Param::new("@From", 1), Param::new("@To", 3)]
    );
}

#[test]
fn test_stored_procedure_without_parameters() {
    let t = build_stored_procedure("dbo.Ping", &[], Dialect::SqlServer).unwrap();
    assert_eq!(
        t.sql,
        "DECLARE @return_value int; EXEC @return_value = dbo.Ping; SELECT 'Return Value' = @return_value"
    );
}

#[test]
fn test_stored_procedure_rejects_duplicates() {
    let params = vec![
        ("From".to_string(), Value::from(1)),
        ("@from".to_string(), Value::from(2)),
    ];
    assert!(matches!(
        build_stored_procedure("dbo.CountUsers", &params, Dialect::SqlServer).unwrap_err(),
        ShadowError::InvalidArgument { param: "parameters", .. }
    ));
}

#[test]
fn test_stored_procedure_needs_sqlserver() {
    assert!(matches!(
        build_stored_procedure("count_users", &[], Dialect::Postgres).unwrap_err(),
        ShadowError::InvalidOperation(_)
    ));
}
