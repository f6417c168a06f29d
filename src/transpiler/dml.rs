//! UPDATE, DELETE and stored procedure generation.

use std::collections::HashSet;

use crate::ast::builders::check_member;
use crate::ast::predicate::Predicate;
use crate::error::{ShadowError, ShadowResult};
use crate::params::{Param, ParamStore};
use crate::transpiler::filter::FilterTranslator;
use crate::transpiler::{Dialect, Translation, bind};
use crate::value::Value;

/// Generate `UPDATE target SET f = @param0, ... [WHERE ...]`.
///
/// Field values are bound before any predicate constants.
pub fn build_update(
    target: &str,
    fields: &[(String, Value)],
    predicate: Option<&Predicate>,
    dialect: Dialect,
) -> ShadowResult<Translation> {
    check_member("update_target", target)?;
    if fields.is_empty() {
        return Err(ShadowError::invalid_argument(
            "update_fields",
            "at least one field must be updated",
        ));
    }

    let mut store = ParamStore::new();
    let mut assignments = Vec::with_capacity(fields.len());
    for (field, value) in fields {
        check_member("update_fields", field)?;
        let placeholder = bind(&mut store, dialect, value.clone());
        assignments.push(format!("{} = {}", field, placeholder));
    }

    let mut sql = format!("UPDATE {} SET {}", target, assignments.join(", "));
    push_where(&mut sql, &mut store, predicate, dialect)?;
    Ok(Translation::new(sql, store))
}

/// Generate `DELETE FROM source [WHERE ...]`.
pub fn build_delete(
    source: &str,
    predicate: Option<&Predicate>,
    dialect: Dialect,
) -> ShadowResult<Translation> {
    check_member("source", source)?;
    let mut store = ParamStore::new();
    let mut sql = format!("DELETE FROM {}", source);
    push_where(&mut sql, &mut store, predicate, dialect)?;
    Ok(Translation::new(sql, store))
}

/// Generate the stored procedure batch that captures the return code.
///
/// Parameter names come from the caller's keys rather than the store. A
/// leading `@` on a key is accepted and not doubled.
pub fn build_stored_procedure(
    name: &str,
    params: &[(String, Value)],
    dialect: Dialect,
) -> ShadowResult<Translation> {
    check_member("procedure_name", name)?;
    if !dialect.supports_stored_procedures() {
        return Err(ShadowError::invalid_operation(format!(
            "stored procedures are not available for {}",
            dialect
        )));
    }

    let mut seen = HashSet::new();
    let mut bound = Vec::with_capacity(params.len());
    for (key, value) in params {
        let key = key.trim_start_matches('@');
        check_member("parameters", key)?;
        let param_name = format!("@{}", key);
        if !seen.insert(param_name.to_ascii_lowercase()) {
            return Err(ShadowError::invalid_argument(
                "parameters",
                format!("parameter '{}' already exists", param_name),
            ));
        }
        bound.push(Param::new(param_name, value.clone()));
    }

    let mut sql = format!("DECLARE @return_value int; EXEC @return_value = {}", name);
    if !bound.is_empty() {
        let names: Vec<&str> = bound.iter().map(|p| p.name.as_str()).collect();
        sql.push(' ');
        sql.push_str(&names.join(", "));
    }
    sql.push_str("; SELECT 'Return Value' = @return_value");

    Ok(Translation { sql, params: bound })
}

fn push_where(
    sql: &mut String,
    store: &mut ParamStore,
    predicate: Option<&Predicate>,
    dialect: Dialect,
) -> ShadowResult<()> {
    let where_sql = FilterTranslator::new(store, dialect).translate(predicate)?;
    if !where_sql.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&where_sql);
    }
    Ok(())
}
