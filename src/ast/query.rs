//! Query descriptions: immutable, append-only operator chains.

use std::sync::Arc;

use crate::ast::builders::check_member;
use crate::ast::operators::{Operator, OrderDirection, Terminal};
use crate::ast::predicate::Predicate;
use crate::error::{ShadowError, ShadowResult};
use crate::value::Value;

/// The database object a query reads from.
#[derive(Debug, Clone, PartialEq)]
pub enum Source {
    /// Table or view, emitted verbatim.
    Named(String),
    /// Table-valued function called with bound arguments.
    Function { name: String, args: Vec<Value> },
}

impl Source {
    pub fn table(name: impl Into<String>) -> ShadowResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ShadowError::invalid_argument(
                "source",
                "source name must not be empty or whitespace",
            ));
        }
        Ok(Source::Named(name))
    }

    pub fn function<V: Into<Value>>(
        name: impl Into<String>,
        args: impl IntoIterator<Item = V>,
    ) -> ShadowResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ShadowError::invalid_argument(
                "function_name",
                "function name must not be empty or whitespace",
            ));
        }
        Ok(Source::Function {
            name,
            args: args.into_iter().map(Into::into).collect(),
        })
    }

    pub fn name(&self) -> &str {
        match self {
            Source::Named(name) | Source::Function { name, .. } => name,
        }
    }
}

#[derive(Debug)]
struct OperatorNode {
    op: Operator,
    prev: Option<Arc<OperatorNode>>,
}

/// A composed query pipeline.
///
/// Each append creates a new description whose node points at the previous
/// tail, so a base query can be cloned and continued in several directions
/// without the branches seeing each other's operators.
#[derive(Debug, Clone)]
pub struct QueryDescription {
    source: Source,
    tail: Option<Arc<OperatorNode>>,
    len: usize,
}

impl QueryDescription {
    pub fn new(source: Source) -> Self {
        Self {
            source,
            tail: None,
            len: 0,
        }
    }

    pub fn source(&self) -> &Source {
        &self.source
    }

    /// Number of operators in the chain.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn append(&self, op: Operator) -> Self {
        Self {
            source: self.source.clone(),
            tail: Some(Arc::new(OperatorNode {
                op,
                prev: self.tail.clone(),
            })),
            len: self.len + 1,
        }
    }

    pub fn filter(&self, predicate: Predicate) -> Self {
        self.append(Operator::Filter(predicate))
    }

    fn ordering(
        &self,
        key: Predicate,
        direction: OrderDirection,
        primary: bool,
    ) -> ShadowResult<Self> {
        let member = key.as_member().ok_or_else(|| {
            ShadowError::invalid_operation("ordering key must be a member access")
        })?;
        check_member("key", member)?;
        let op = if primary {
            Operator::OrderBy { key, direction }
        } else {
            Operator::ThenBy { key, direction }
        };
        Ok(self.append(op))
    }

    /// Order by a key selector, replacing any earlier ordering.
    pub fn order_by_key(&self, key: Predicate, direction: OrderDirection) -> ShadowResult<Self> {
        self.ordering(key, direction, true)
    }

    /// Add a secondary ordering key.
    pub fn then_by_key(&self, key: Predicate, direction: OrderDirection) -> ShadowResult<Self> {
        self.ordering(key, direction, false)
    }

    pub fn order_by(&self, member: &str) -> ShadowResult<Self> {
        self.order_by_key(Predicate::member(member), OrderDirection::Asc)
    }

    pub fn order_by_descending(&self, member: &str) -> ShadowResult<Self> {
        self.order_by_key(Predicate::member(member), OrderDirection::Desc)
    }

    pub fn then_by(&self, member: &str) -> ShadowResult<Self> {
        self.then_by_key(Predicate::member(member), OrderDirection::Asc)
    }

    pub fn then_by_descending(&self, member: &str) -> ShadowResult<Self> {
        self.then_by_key(Predicate::member(member), OrderDirection::Desc)
    }

    pub fn skip(&self, count: i64) -> ShadowResult<Self> {
        Ok(self.append(Operator::Skip(positive(count)?)))
    }

    pub fn take(&self, count: i64) -> ShadowResult<Self> {
        Ok(self.append(Operator::Take(positive(count)?)))
    }

    /// Restrict the projection to the named fields.
    pub fn select_only<S: AsRef<str>>(
        &self,
        field_names: impl IntoIterator<Item = S>,
    ) -> ShadowResult<Self> {
        let mut fields = Vec::new();
        for name in field_names {
            let name = name.as_ref();
            if name.trim().is_empty() {
                return Err(ShadowError::invalid_argument(
                    "field_names",
                    "field name must not be empty or whitespace",
                ));
            }
            fields.push(name.to_string());
        }
        if fields.is_empty() {
            return Err(ShadowError::invalid_argument(
                "field_names",
                "at least one field must be selected",
            ));
        }
        Ok(self.append(Operator::SelectOnly(fields)))
    }

    /// Close the pipeline with a terminal operator.
    pub fn terminate(&self, terminal: Terminal) -> Self {
        self.append(Operator::Terminal(terminal))
    }

    /// The terminal operator, if the chain ends with one.
    pub fn terminal(&self) -> Option<&Terminal> {
        match self.tail.as_deref() {
            Some(OperatorNode {
                op: Operator::Terminal(t),
                ..
            }) => Some(t),
            _ => None,
        }
    }

    /// Operators in call order, oldest first.
    pub fn operators(&self) -> Vec<&Operator> {
        let mut ops = Vec::with_capacity(self.len);
        let mut node = self.tail.as_deref();
        while let Some(n) = node {
            ops.push(&n.op);
            node = n.prev.as_deref();
        }
        ops.reverse();
        ops
    }
}

fn positive(count: i64) -> ShadowResult<u64> {
    if count < 1 {
        return Err(ShadowError::invalid_argument(
            "count",
            format!("count must be at least 1, got {}", count),
        ));
    }
    Ok(count as u64)
}
