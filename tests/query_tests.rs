mod common;

use common::{Reply, ScriptedDriver, ids, user, users};
use pretty_assertions::assert_eq;
use shadowq::prelude::*;

fn ctx(driver: ScriptedDriver) -> DatabaseContext<ScriptedDriver> {
    DatabaseContext::new(driver)
}

#[test]
fn first_by_id_returns_alex() {
    let ctx = ctx(ScriptedDriver::new().reply(Reply::Rows(vec![user(1, "Alex", None)])));

    let row = ctx
        .query_table("Users")
        .unwrap()
        .filter(equals("Id", 1).unwrap())
        .first()
        .unwrap();

    assert_eq!(row.get_str("UserName"), Some("Alex"));
    assert!(row.is_null("Email"));
    assert!(!row.contains("Missing"));

    let cmd = ctx.driver().last();
    assert_eq!(cmd.sql, "SELECT TOP 1 * FROM Users WHERE Id = @param0");
    assert_eq!(cmd.params, vec![Param::new("@param0", 1)]);
}

#[test]
fn collection_contains_returns_matching_rows() {
    let fixture: Vec<_> = users().into_iter().take(2).collect();
    let ctx = ctx(ScriptedDriver::new().reply(Reply::Rows(fixture)));

    let rows = ctx
        .query_table("Users")
        .unwrap()
        .filter(collection_contains([0, 1], "Id").unwrap())
        .to_list()
        .unwrap();

    assert_eq!(ids(&rows), vec![0, 1]);
    assert_eq!(
        ctx.driver().last().sql,
        "SELECT * FROM Users WHERE Id IN (@param0, @param1)"
    );
}

#[test]
fn rows_keep_driver_order() {
    let ordered = vec![
        user(1, "Alex", None),
        user(0, "Dzianis", None),
        user(2, "Katrin", None),
    ];
    let ctx = ctx(ScriptedDriver::new().reply(Reply::Rows(ordered)));

    let rows = ctx
        .query_table("Users")
        .unwrap()
        .order_by("UserName")
        .unwrap()
        .to_list()
        .unwrap();

    let names: Vec<&str> = rows.iter().filter_map(|r| r.get_str("UserName")).collect();
    assert_eq!(names, vec!["Alex", "Dzianis", "Katrin"]);
    assert_eq!(
        ctx.driver().last().sql,
        "SELECT * FROM Users ORDER BY UserName ASC"
    );
}

#[test]
fn null_filters_use_is_null() {
    let ctx = ctx(ScriptedDriver::new());
    let users = ctx.query_table("Users").unwrap();

    users.filter(equals("Email", Value::Null).unwrap()).to_list().unwrap();
    assert_eq!(ctx.driver().last().sql, "SELECT * FROM Users WHERE Email IS NULL");

    users.filter(not_equals("Email", Value::Null).unwrap()).to_list().unwrap();
    assert_eq!(ctx.driver().last().sql, "SELECT * FROM Users WHERE Email IS NOT NULL");
    assert!(ctx.driver().last().params.is_empty());
}

#[test]
fn count_applies_skip_and_take_to_scalar() {
    let cases: [(Option<i64>, Option<i64>, i64); 5] = [
        (None, None, 3),
        (Some(1), None, 2),
        (Some(4), None, 0),
        (None, Some(4), 3),
        (None, Some(1), 1),
    ];

    for (skip, take, expected) in cases {
        let ctx = ctx(ScriptedDriver::new().reply(Reply::Scalar(Value::Int32(3))));
        let mut q = ctx.query_table("Users").unwrap();
        if let Some(n) = skip {
            q = q.skip(n).unwrap();
        }
        if let Some(n) = take {
            q = q.take(n).unwrap();
        }

        assert_eq!(q.count().unwrap(), expected, "skip={:?} take={:?}", skip, take);
        assert_eq!(ctx.driver().last().sql, "SELECT COUNT(*) FROM Users");
    }
}

#[test]
fn count_where_adds_conjunct() {
    let ctx = ctx(ScriptedDriver::new().reply(Reply::Scalar(Value::Int64(1))));

    let n = ctx
        .query_table("Users")
        .unwrap()
        .filter(greater_than("Id", 0).unwrap())
        .count_where(contains("UserName", "a").unwrap())
        .unwrap();

    assert_eq!(n, 1);
    let cmd = ctx.driver().last();
    assert_eq!(
        cmd.sql,
        "SELECT COUNT(*) FROM Users WHERE (Id > @param0 AND UserName LIKE @param1)"
    );
    assert_eq!(cmd.params[1].value, Value::from("%a%"));
}

#[test]
fn first_with_no_rows_is_not_found() {
    let ctx = ctx(ScriptedDriver::new());
    let err = ctx
        .query_table("Users")
        .unwrap()
        .first_where(equals("Id", 42).unwrap())
        .unwrap_err();
    assert!(matches!(err, ShadowError::NotFound(_)));
}

#[test]
fn first_or_default_with_no_rows_is_none() {
    let ctx = ctx(ScriptedDriver::new());
    let row = ctx
        .query_table("Users")
        .unwrap()
        .first_or_default_where(equals("Id", 42).unwrap())
        .unwrap();
    assert_eq!(row, None);
}

#[test]
fn ambiguous_first_is_rejected() {
    let duplicates = vec![user(1, "Alex", None), user(1, "Alex", None)];
    let ctx = ctx(
        ScriptedDriver::new()
            .reply(Reply::Rows(duplicates.clone()))
            .reply(Reply::Rows(duplicates)),
    );
    let users = ctx.query_table("Users").unwrap();

    assert!(matches!(
        users.first().unwrap_err(),
        ShadowError::Cardinality { expected: 1, actual: 2 }
    ));
    assert!(matches!(
        users.first_or_default().unwrap_err(),
        ShadowError::Cardinality { expected: 1, actual: 2 }
    ));
    assert_eq!(ctx.driver().live_cursors(), 0);
}

#[test]
fn first_after_skip_pages() {
    let ctx = ctx(ScriptedDriver::new().reply(Reply::Rows(vec![user(1, "Alex", None)])));

    let row = ctx.query_table("Users").unwrap().skip(1).unwrap().first().unwrap();

    assert_eq!(row.get_i64("Id"), Some(1));
    assert_eq!(
        ctx.driver().last().sql,
        "SELECT * FROM Users ORDER BY (SELECT NULL) OFFSET 1 ROWS FETCH NEXT 1 ROW ONLY"
    );
}

#[test]
fn skip_take_window() {
    let ctx = ctx(ScriptedDriver::new().reply(Reply::Rows(vec![user(1, "Alex", None)])));

    let rows = ctx
        .query_table("Users")
        .unwrap()
        .skip(1)
        .unwrap()
        .take(1)
        .unwrap()
        .to_list()
        .unwrap();

    assert_eq!(ids(&rows), vec![1]);
    assert_eq!(
        ctx.driver().last().sql,
        "SELECT * FROM Users ORDER BY (SELECT NULL) OFFSET 1 ROWS FETCH NEXT 1 ROW ONLY"
    );
}

#[test]
fn select_only_last_call_wins() {
    let ctx = ctx(ScriptedDriver::new().reply(Reply::Rows(vec![vec![(
        "Id".to_string(),
        Value::Int32(0),
    )]])));

    let rows = ctx
        .query_table("Users")
        .unwrap()
        .select_only(["UserName"])
        .unwrap()
        .select_only(["Id"])
        .unwrap()
        .to_list()
        .unwrap();

    assert_eq!(rows[0].columns().collect::<Vec<_>>(), vec!["Id"]);
    assert_eq!(ctx.driver().last().sql, "SELECT Id FROM Users");
}

#[test]
fn function_source_binds_arguments_first() {
    let ctx = ctx(ScriptedDriver::new());

    ctx.query_function("GetUsers", ["Katrin"])
        .unwrap()
        .filter(less_than("Id", 5).unwrap())
        .to_list()
        .unwrap();

    let cmd = ctx.driver().last();
    assert_eq!(cmd.sql, "SELECT * FROM GetUsers(@param0) WHERE Id < @param1");
    assert_eq!(
        cmd.params,
        vec![Param::new("@param0", "Katrin"), Param::new("@param1", 5)]
    );
}

#[test]
fn connection_opens_lazily_once() {
    let ctx = ctx(ScriptedDriver::new());
    assert_eq!(ctx.driver().open_count(), 0);

    let users = ctx.query_table("Users").unwrap();
    assert_eq!(ctx.driver().open_count(), 0);

    users.to_list().unwrap();
    users.to_list().unwrap();
    assert_eq!(ctx.driver().open_count(), 1);

    ctx.close().unwrap();
    users.to_list().unwrap();
    assert_eq!(ctx.driver().open_count(), 2);
}

#[test]
fn usage_errors_send_nothing() {
    let ctx = ctx(ScriptedDriver::new());
    let users = ctx.query_table("Users").unwrap();

    assert!(users.skip(0).is_err());
    assert!(users.order_by(" ").is_err());
    assert!(ctx.query_table("").is_err());
    assert!(equals("", 1).is_err());
    assert!(ctx.driver().commands().is_empty());
    assert_eq!(ctx.driver().open_count(), 0);
}

#[test]
fn driver_errors_pass_through() {
    let message = "Invalid column name 'Nope'.";
    let ctx = ctx(ScriptedDriver::new().reply(Reply::Fail(message.to_string())));

    let err = ctx
        .query_table("Users")
        .unwrap()
        .filter(equals("Nope", 1).unwrap())
        .to_list()
        .unwrap_err();

    assert!(matches!(err, ShadowError::Driver(_)));
    assert_eq!(err.to_string(), message);
}

#[test]
fn stream_is_lazy_and_forward_only() {
    let ctx = ctx(ScriptedDriver::new().reply(Reply::Rows(users())));
    let users = ctx.query_table("Users").unwrap();

    let mut stream = users.iter().unwrap();
    assert_eq!(ctx.driver().live_cursors(), 1);

    let first = stream.next().unwrap().unwrap();
    assert_eq!(first.get_str("UserName"), Some("Dzianis"));
    assert_eq!(stream.fetched(), 1);
    assert!(matches!(stream.reset(), Err(ShadowError::NotSupported(_))));

    let rest: Vec<Row> = stream.by_ref().collect::<Result<_, _>>().unwrap();
    assert_eq!(ids(&rest), vec![1, 2]);
    assert_eq!(ctx.driver().live_cursors(), 0);

    drop(stream);
    assert_eq!(ctx.driver().live_cursors(), 0);
}

#[test]
fn failing_fetch_releases_cursor() {
    let ctx = ctx(ScriptedDriver::new().reply(Reply::RowsThenFail(
        vec![user(0, "Dzianis", None)],
        "Connection reset".to_string(),
    )));

    let err = ctx.query_table("Users").unwrap().to_list().unwrap_err();

    assert_eq!(err.to_string(), "Connection reset");
    assert_eq!(ctx.driver().live_cursors(), 0);
}

#[test]
fn base_query_can_branch() {
    let ctx = ctx(
        ScriptedDriver::new()
            .reply(Reply::Scalar(Value::Int32(2)))
            .reply(Reply::Rows(vec![user(0, "Dzianis", None)])),
    );
    let base = ctx
        .query_table("Users")
        .unwrap()
        .filter(not(equals("Id", 1).unwrap()));

    assert_eq!(base.count().unwrap(), 2);
    base.order_by_descending("Id").unwrap().take(1).unwrap().to_list().unwrap();

    let commands = ctx.driver().commands();
    assert_eq!(commands[0].sql, "SELECT COUNT(*) FROM Users WHERE Id <> @param0");
    assert_eq!(
        commands[1].sql,
        "SELECT * FROM Users WHERE Id <> @param0 ORDER BY Id DESC OFFSET 0 ROWS FETCH NEXT 1 ROW ONLY"
    );
    assert_eq!(base.to_sql().unwrap().sql, "SELECT * FROM Users WHERE Id <> @param0");
}

#[test]
fn to_sql_for_terminal_does_not_execute() {
    let ctx = ctx(ScriptedDriver::new());
    let q = ctx.query_table("Users").unwrap().filter(equals("Id", 1).unwrap());

    let t = q.to_sql_for(Terminal::First(None)).unwrap();
    assert_eq!(t.sql, "SELECT TOP 1 * FROM Users WHERE Id = @param0");
    assert!(ctx.driver().commands().is_empty());
}
