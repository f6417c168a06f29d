//! ORDER BY translation.

use crate::ast::operators::{Operator, OrderDirection};
use crate::ast::predicate::Predicate;
use crate::error::{ShadowError, ShadowResult};

/// Collect the effective ordering keys.
///
/// `OrderBy` starts over; `ThenBy` appends. Keys must be member accesses.
pub fn collect_order_keys<'a>(
    operators: &[&'a Operator],
) -> ShadowResult<Vec<(&'a str, OrderDirection)>> {
    let mut keys = Vec::new();
    for &op in operators {
        let (key, direction) = match op {
            Operator::OrderBy { key, direction } => {
                keys.clear();
                (key, *direction)
            }
            Operator::ThenBy { key, direction } => (key, *direction),
            _ => continue,
        };
        keys.push((member_of(key)?, direction));
    }
    Ok(keys)
}

/// Render the ORDER BY list, or `None` when the query is unordered.
pub fn translate_order(operators: &[&Operator]) -> ShadowResult<Option<String>> {
    let keys = collect_order_keys(operators)?;
    if keys.is_empty() {
        return Ok(None);
    }
    let parts: Vec<String> = keys
        .iter()
        .map(|(member, direction)| format!("{} {}", member, direction))
        .collect();
    Ok(Some(parts.join(", ")))
}

fn member_of(key: &Predicate) -> ShadowResult<&str> {
    key.as_member()
        .ok_or_else(|| ShadowError::invalid_operation("ordering key must be a member access"))
}
