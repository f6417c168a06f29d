//! WHERE clause translation.
//!
//! Walks a predicate tree and emits a boolean SQL expression. Every constant
//! goes through the parameter store; only member identifiers and the
//! `NULL` keywords are written into the SQL text.

use crate::ast::predicate::{CompareOp, Predicate};
use crate::error::{ShadowError, ShadowResult};
use crate::params::ParamStore;
use crate::transpiler::Dialect;
use crate::transpiler::bind;
use crate::value::Value;

/// Translates filter predicates into a WHERE expression.
pub struct FilterTranslator<'a> {
    store: &'a mut ParamStore,
    dialect: Dialect,
    sql: String,
}

impl<'a> FilterTranslator<'a> {
    pub fn new(store: &'a mut ParamStore, dialect: Dialect) -> Self {
        Self {
            store,
            dialect,
            sql: String::new(),
        }
    }

    /// Fold the predicates into one conjunction and render it.
    ///
    /// Returns an empty string when there is nothing to filter on.
    pub fn translate<'p>(
        mut self,
        predicates: impl IntoIterator<Item = &'p Predicate>,
    ) -> ShadowResult<String> {
        let conjunction = predicates
            .into_iter()
            .cloned()
            .reduce(|left, right| left.and(right));

        if let Some(predicate) = conjunction {
            self.visit(&predicate, false)?;
        }
        Ok(self.sql)
    }

    fn bind(&mut self, value: Value) -> String {
        bind(self.store, self.dialect, value)
    }

    fn visit(&mut self, predicate: &Predicate, negated: bool) -> ShadowResult<()> {
        match predicate {
            Predicate::Member(name) => Err(ShadowError::invalid_operation(format!(
                "member '{}' is not a boolean condition",
                name
            ))),
            Predicate::Literal(value) => Err(ShadowError::invalid_operation(format!(
                "constant {} is not a boolean condition",
                value
            ))),
            Predicate::Not(inner) => self.visit(inner, !negated),
            Predicate::And(left, right) => self.visit_grouped(left, right, "AND", negated),
            Predicate::Or(left, right) => self.visit_grouped(left, right, "OR", negated),
            Predicate::BitAnd(left, right) => self.visit_flat(left, right, "AND", negated),
            Predicate::BitOr(left, right) => self.visit_flat(left, right, "OR", negated),
            Predicate::Compare { op, left, right } => {
                let op = if negated { op.negate() } else { *op };
                self.visit_compare(op, left, right)
            }
            Predicate::StringOp {
                kind,
                member,
                literal,
            } => {
                check_identifier(member)?;
                let placeholder = self.bind(Value::String(kind.pattern(literal)));
                let not = if negated { "NOT " } else { "" };
                self.sql
                    .push_str(&format!("{} {}LIKE {}", member, not, placeholder));
                Ok(())
            }
            Predicate::InSet { member, values } => {
                check_identifier(member)?;
                if values.is_empty() {
                    return Err(ShadowError::invalid_operation(format!(
                        "IN list for '{}' is empty",
                        member
                    )));
                }
                let placeholders: Vec<String> =
                    values.iter().map(|v| self.bind(v.clone())).collect();
                let not = if negated { "NOT " } else { "" };
                self.sql.push_str(&format!(
                    "{} {}IN ({})",
                    member,
                    not,
                    placeholders.join(", ")
                ));
                Ok(())
            }
            Predicate::BoolEquals { member, value } => {
                check_identifier(member)?;
                match value {
                    None => self.push_null_test(member, negated),
                    Some(b) => {
                        let placeholder = self.bind(self.dialect.bool_value(*b));
                        let op = if negated { "<>" } else { "=" };
                        self.sql
                            .push_str(&format!("{} {} {}", member, op, placeholder));
                    }
                }
                Ok(())
            }
        }
    }

    fn visit_grouped(
        &mut self,
        left: &Predicate,
        right: &Predicate,
        joiner: &str,
        negated: bool,
    ) -> ShadowResult<()> {
        if negated {
            self.sql.push_str("NOT ");
        }
        self.sql.push('(');
        self.visit_operand(left)?;
        self.sql.push_str(&format!(" {} ", joiner));
        self.visit_operand(right)?;
        self.sql.push(')');
        Ok(())
    }

    /// Operand of a grouped AND/OR. A flat conjunction or disjunction gets
    /// its own parentheses so it binds as one term.
    fn visit_operand(&mut self, predicate: &Predicate) -> ShadowResult<()> {
        match predicate {
            Predicate::BitAnd(..) | Predicate::BitOr(..) => {
                self.sql.push('(');
                self.visit(predicate, false)?;
                self.sql.push(')');
                Ok(())
            }
            other => self.visit(other, false),
        }
    }

    fn visit_flat(
        &mut self,
        left: &Predicate,
        right: &Predicate,
        joiner: &str,
        negated: bool,
    ) -> ShadowResult<()> {
        if negated {
            self.sql.push_str("NOT (");
        }
        self.visit(left, false)?;
        self.sql.push_str(&format!(" {} ", joiner));
        self.visit(right, false)?;
        if negated {
            self.sql.push(')');
        }
        Ok(())
    }

    fn visit_compare(
        &mut self,
        op: CompareOp,
        left: &Predicate,
        right: &Predicate,
    ) -> ShadowResult<()> {
        let (member, value, member_first) = match (left, right) {
            (Predicate::Member(m), Predicate::Literal(v)) => (m, v, true),
            (Predicate::Literal(v), Predicate::Member(m)) => (m, v, false),
            (Predicate::Member(a), Predicate::Member(b)) => {
                return Err(ShadowError::invalid_operation(format!(
                    "comparing member '{}' with member '{}' is not supported",
                    a, b
                )));
            }
            _ => {
                return Err(ShadowError::invalid_operation(
                    "comparisons must relate one member to one constant",
                ));
            }
        };
        check_identifier(member)?;

        if value.is_null() {
            return match op {
                CompareOp::Eq => {
                    self.push_null_test(member, false);
                    Ok(())
                }
                CompareOp::Ne => {
                    self.push_null_test(member, true);
                    Ok(())
                }
                _ => Err(ShadowError::invalid_operation(format!(
                    "NULL can't be used with '{}'",
                    op
                ))),
            };
        }

        let placeholder = self.bind(value.clone());
        if member_first {
            self.sql
                .push_str(&format!("{} {} {}", member, op, placeholder));
        } else {
            self.sql
                .push_str(&format!("{} {} {}", placeholder, op, member));
        }
        Ok(())
    }

    fn push_null_test(&mut self, member: &str, negated: bool) {
        if negated {
            self.sql.push_str(&format!("{} IS NOT NULL", member));
        } else {
            self.sql.push_str(&format!("{} IS NULL", member));
        }
    }
}

fn check_identifier(member: &str) -> ShadowResult<()> {
    crate::ast::builders::check_member("member", member)
}
