//! Scripted in-memory driver shared by the integration tests.
//!
//! The driver never parses SQL. It records every command it receives and
//! answers from a queue of scripted replies, so tests can check both the
//! emitted statement and how the engine post-processes the answer.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use shadowq::cancel::CancellationToken;
use shadowq::driver::{
    AsyncDriver, AsyncRowCursor, Driver, RawRow, RowCursor, check_unique_names,
};
use shadowq::error::DriverError;
use shadowq::params::Param;
use shadowq::value::Value;

/// A command as the driver saw it.
#[derive(Debug, Clone, PartialEq)]
pub struct Recorded {
    pub sql: String,
    pub params: Vec<Param>,
}

/// What the driver answers to the next command.
#[derive(Debug, Clone)]
pub enum Reply {
    Rows(Vec<RawRow>),
    /// Yield the rows, then fail the next fetch.
    RowsThenFail(Vec<RawRow>, String),
    Scalar(Value),
    Affected(u64),
    Fail(String),
}

#[derive(Default)]
pub struct ScriptedDriver {
    open: AtomicBool,
    opens: AtomicUsize,
    replies: Mutex<VecDeque<Reply>>,
    commands: Mutex<Vec<Recorded>>,
    live_cursors: Arc<AtomicUsize>,
    cancel_after: Mutex<Option<(usize, CancellationToken)>>,
}

impl ScriptedDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(self, reply: Reply) -> Self {
        self.push(reply);
        self
    }

    pub fn push(&self, reply: Reply) {
        self.replies.lock().unwrap().push_back(reply);
    }

    /// Cancel `token` once `rows` rows have been fetched from the next cursor.
    pub fn cancel_after(&self, rows: usize, token: CancellationToken) {
        *self.cancel_after.lock().unwrap() = Some((rows, token));
    }

    pub fn commands(&self) -> Vec<Recorded> {
        self.commands.lock().unwrap().clone()
    }

    pub fn last(&self) -> Recorded {
        self.commands().pop().expect("no command was executed")
    }

    pub fn open_count(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    pub fn live_cursors(&self) -> usize {
        self.live_cursors.load(Ordering::SeqCst)
    }

    fn record(&self, sql: &str, params: &[Param]) -> Result<Reply, DriverError> {
        if !self.open.load(Ordering::SeqCst) {
            return Err(DriverError::message("connection is not open"));
        }
        check_unique_names(params)?;
        self.commands.lock().unwrap().push(Recorded {
            sql: sql.to_string(),
            params: params.to_vec(),
        });
        let reply = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Reply::Rows(Vec::new()));
        match reply {
            Reply::Fail(message) => Err(DriverError::message(message)),
            other => Ok(other),
        }
    }

    fn cursor(&self, reply: Reply) -> Result<ScriptedCursor, DriverError> {
        let (rows, fail) = match reply {
            Reply::Rows(rows) => (rows, None),
            Reply::RowsThenFail(rows, message) => (rows, Some(message)),
            other => return Err(DriverError::message(format!("expected rows, scripted {:?}", other))),
        };
        self.live_cursors.fetch_add(1, Ordering::SeqCst);
        Ok(ScriptedCursor {
            rows: rows.into(),
            fail,
            fetched: 0,
            cancel_after: self.cancel_after.lock().unwrap().take(),
            live: Arc::clone(&self.live_cursors),
        })
    }

    fn scalar(reply: Reply) -> Result<Value, DriverError> {
        match reply {
            Reply::Scalar(v) => Ok(v),
            Reply::Rows(rows) => Ok(rows
                .into_iter()
                .next()
                .and_then(|row| row.into_iter().next())
                .map(|(_, v)| v)
                .unwrap_or(Value::Null)),
            other => Err(DriverError::message(format!("expected a scalar, scripted {:?}", other))),
        }
    }

    fn affected(reply: Reply) -> Result<u64, DriverError> {
        match reply {
            Reply::Affected(n) => Ok(n),
            Reply::Rows(rows) if rows.is_empty() => Ok(0),
            other => Err(DriverError::message(format!("expected a count, scripted {:?}", other))),
        }
    }
}

pub struct ScriptedCursor {
    rows: VecDeque<RawRow>,
    fail: Option<String>,
    fetched: usize,
    cancel_after: Option<(usize, CancellationToken)>,
    live: Arc<AtomicUsize>,
}

impl ScriptedCursor {
    fn advance(&mut self) -> Result<Option<RawRow>, DriverError> {
        if let Some((n, token)) = &self.cancel_after {
            if self.fetched >= *n {
                token.cancel();
            }
        }
        match self.rows.pop_front() {
            Some(row) => {
                self.fetched += 1;
                Ok(Some(row))
            }
            None => match self.fail.take() {
                Some(message) => Err(DriverError::message(message)),
                None => Ok(None),
            },
        }
    }
}

impl Drop for ScriptedCursor {
    fn drop(&mut self) {
        self.live.fetch_sub(1, Ordering::SeqCst);
    }
}

impl RowCursor for ScriptedCursor {
    fn next_row(&mut self) -> Result<Option<RawRow>, DriverError> {
        self.advance()
    }
}

#[async_trait]
impl AsyncRowCursor for ScriptedCursor {
    async fn next_row(&mut self) -> Result<Option<RawRow>, DriverError> {
        self.advance()
    }
}

impl Driver for ScriptedDriver {
    fn open(&self) -> Result<(), DriverError> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        self.open.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    fn close(&self) -> Result<(), DriverError> {
        self.open.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn execute_query<'a>(
        &'a self,
        sql: &str,
        params: &[Param],
    ) -> Result<Box<dyn RowCursor + 'a>, DriverError> {
        let reply = self.record(sql, params)?;
        Ok(Box::new(self.cursor(reply)?))
    }

    fn execute_scalar(&self, sql: &str, params: &[Param]) -> Result<Value, DriverError> {
        Self::scalar(self.record(sql, params)?)
    }

    fn execute_non_query(&self, sql: &str, params: &[Param]) -> Result<u64, DriverError> {
        Self::affected(self.record(sql, params)?)
    }
}

#[async_trait]
impl AsyncDriver for ScriptedDriver {
    async fn open(&self) -> Result<(), DriverError> {
        Driver::open(self)
    }

    fn is_open(&self) -> bool {
        Driver::is_open(self)
    }

    async fn close(&self) -> Result<(), DriverError> {
        Driver::close(self)
    }

    async fn execute_query<'a>(
        &'a self,
        sql: &'a str,
        params: &'a [Param],
    ) -> Result<Box<dyn AsyncRowCursor + 'a>, DriverError> {
        let reply = self.record(sql, params)?;
        Ok(Box::new(self.cursor(reply)?))
    }

    async fn execute_scalar(&self, sql: &str, params: &[Param]) -> Result<Value, DriverError> {
        Self::scalar(self.record(sql, params)?)
    }

    async fn execute_non_query(&self, sql: &str, params: &[Param]) -> Result<u64, DriverError> {
        Self::affected(self.record(sql, params)?)
    }
}

/// One `Users` row.
pub fn user(id: i32, name: &str, email: Option<&str>) -> RawRow {
    vec![
        ("Id".to_string(), Value::Int32(id)),
        ("UserName".to_string(), Value::from(name)),
        ("Email".to_string(), Value::from(email)),
    ]
}

/// The three-user fixture.
pub fn users() -> Vec<RawRow> {
    vec![
        user(0, "Dzianis", Some("dzianis@example.com")),
        user(1, "Alex", None),
        user(2, "Katrin", Some("katrin@example.com")),
    ]
}

pub fn ids(rows: &[shadowq::row::Row]) -> Vec<i64> {
    rows.iter().filter_map(|r| r.get_i64("Id")).collect()
}
