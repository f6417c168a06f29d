//! Predicate builders for WHERE clauses.
//!
//! Every builder validates its arguments up front, so a malformed predicate
//! fails where it is built rather than during translation.

use crate::ast::predicate::{CompareOp, Predicate, StringMatch};
use crate::error::{ShadowError, ShadowResult};
use crate::value::Value;

/// Reject blank member names.
pub(crate) fn check_member(param: &'static str, member: &str) -> ShadowResult<()> {
    if member.trim().is_empty() {
        return Err(ShadowError::invalid_argument(
            param,
            "member name must not be empty or whitespace",
        ));
    }
    Ok(())
}

/// Helper to create a member-vs-constant comparison
fn make_comparison(member: &str, op: CompareOp, value: Value) -> ShadowResult<Predicate> {
    check_member("member", member)?;
    Ok(Predicate::compare(
        op,
        Predicate::member(member),
        Predicate::Literal(value),
    ))
}

/// Helper for the ordered comparisons, which reject strings, booleans and NULL
fn make_ordered(member: &str, op: CompareOp, value: Value, name: &str) -> ShadowResult<Predicate> {
    check_member("member", member)?;
    if !value.is_ordered() {
        return Err(ShadowError::invalid_operation(format!(
            "values of type {} can't be compared with {}",
            value.type_name(),
            name
        )));
    }
    if value.is_null() {
        return Err(ShadowError::invalid_operation(format!(
            "NULL can't be compared with {}",
            name
        )));
    }
    make_comparison(member, op, value)
}

/// Create an equality predicate (`member = value`, `member IS NULL` for null).
pub fn equals(member: &str, value: impl Into<Value>) -> ShadowResult<Predicate> {
    match value.into() {
        Value::Bool(b) => bool_equals(member, Some(b)),
        value => make_comparison(member, CompareOp::Eq, value),
    }
}

/// Create an inequality predicate (`member <> value`, `member IS NOT NULL` for null).
pub fn not_equals(member: &str, value: impl Into<Value>) -> ShadowResult<Predicate> {
    match value.into() {
        Value::Bool(b) => Ok(bool_equals(member, Some(b))?.not()),
        value => make_comparison(member, CompareOp::Ne, value),
    }
}

/// Create a boolean column test; `None` matches NULL.
pub fn bool_equals(member: &str, value: Option<bool>) -> ShadowResult<Predicate> {
    check_member("member", member)?;
    Ok(Predicate::BoolEquals {
        member: member.to_string(),
        value,
    })
}

/// Create a greater-than predicate (`member > value`)
pub fn greater_than(member: &str, value: impl Into<Value>) -> ShadowResult<Predicate> {
    make_ordered(member, CompareOp::Gt, value.into(), "greater than")
}

/// Create a greater-than-or-equal predicate (`member >= value`)
pub fn greater_than_or_equal(member: &str, value: impl Into<Value>) -> ShadowResult<Predicate> {
    make_ordered(member, CompareOp::Ge, value.into(), "greater than or equal")
}

/// Create a less-than predicate (`member < value`)
pub fn less_than(member: &str, value: impl Into<Value>) -> ShadowResult<Predicate> {
    make_ordered(member, CompareOp::Lt, value.into(), "less than")
}

/// Create a less-than-or-equal predicate (`member <= value`)
pub fn less_than_or_equal(member: &str, value: impl Into<Value>) -> ShadowResult<Predicate> {
    make_ordered(member, CompareOp::Le, value.into(), "less than or equal")
}

fn make_string_op(member: &str, kind: StringMatch, literal: &str) -> ShadowResult<Predicate> {
    check_member("member", member)?;
    Ok(Predicate::StringOp {
        kind,
        member: member.to_string(),
        literal: literal.to_string(),
    })
}

/// Create a substring predicate (`member LIKE '%value%'`)
pub fn contains(member: &str, value: &str) -> ShadowResult<Predicate> {
    make_string_op(member, StringMatch::Contains, value)
}

/// Create a prefix predicate (`member LIKE 'value%'`)
pub fn starts_with(member: &str, value: &str) -> ShadowResult<Predicate> {
    make_string_op(member, StringMatch::StartsWith, value)
}

/// Create a suffix predicate (`member LIKE '%value'`)
pub fn ends_with(member: &str, value: &str) -> ShadowResult<Predicate> {
    make_string_op(member, StringMatch::EndsWith, value)
}

/// Create a set-membership predicate (`member IN (values)`)
pub fn collection_contains<V: Into<Value>>(
    values: impl IntoIterator<Item = V>,
    member: &str,
) -> ShadowResult<Predicate> {
    check_member("member", member)?;
    let values: Vec<Value> = values.into_iter().map(Into::into).collect();
    if values.is_empty() {
        return Err(ShadowError::invalid_argument(
            "values",
            "collection must contain at least one value",
        ));
    }
    Ok(Predicate::InSet {
        member: member.to_string(),
        values,
    })
}

/// Create a set-exclusion predicate (`member NOT IN (values)`)
pub fn collection_not_contains<V: Into<Value>>(
    values: impl IntoIterator<Item = V>,
    member: &str,
) -> ShadowResult<Predicate> {
    Ok(collection_contains(values, member)?.not())
}

fn fold<P: Into<Option<Predicate>>>(
    predicates: impl IntoIterator<Item = P>,
    combine: fn(Predicate, Predicate) -> Predicate,
) -> ShadowResult<Predicate> {
    let mut acc: Option<Predicate> = None;
    for (i, item) in predicates.into_iter().enumerate() {
        let predicate = item.into().ok_or_else(|| {
            ShadowError::invalid_operation(format!("predicate at index {} is missing", i))
        })?;
        acc = Some(match acc {
            Some(left) => combine(left, predicate),
            None => predicate,
        });
    }
    acc.ok_or_else(|| {
        ShadowError::invalid_argument("predicates", "at least one predicate is required")
    })
}

/// Combine predicates with AND, left to right.
///
/// Accepts plain predicates or `Option`s; a `None` entry fails with an
/// invalid-operation error, an empty input with invalid-argument.
pub fn and<P: Into<Option<Predicate>>>(
    predicates: impl IntoIterator<Item = P>,
) -> ShadowResult<Predicate> {
    fold(predicates, Predicate::and)
}

/// Combine predicates with OR, left to right.
pub fn or<P: Into<Option<Predicate>>>(
    predicates: impl IntoIterator<Item = P>,
) -> ShadowResult<Predicate> {
    fold(predicates, Predicate::or)
}

/// Negate a predicate.
pub fn not(predicate: Predicate) -> Predicate {
    predicate.not()
}
