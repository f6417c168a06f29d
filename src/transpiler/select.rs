//! SELECT / COUNT statement generation.

use crate::ast::operators::{Operator, Terminal};
use crate::ast::predicate::Predicate;
use crate::ast::query::{QueryDescription, Source};
use crate::error::{ShadowError, ShadowResult};
use crate::params::ParamStore;
use crate::transpiler::filter::FilterTranslator;
use crate::transpiler::order::translate_order;
use crate::transpiler::projection::translate_projection;
use crate::transpiler::{Dialect, Translation, bind};

/// Effective Skip/Take of a pipeline.
///
/// Repeated `Skip` calls add up; repeated `Take` calls keep the smallest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Pagination {
    pub skip: Option<u64>,
    pub take: Option<u64>,
}

impl Pagination {
    pub fn from_operators(operators: &[&Operator]) -> Self {
        let mut page = Pagination::default();
        for op in operators {
            match op {
                Operator::Skip(n) => {
                    page.skip = Some(page.skip.unwrap_or(0).saturating_add(*n));
                }
                Operator::Take(n) => {
                    page.take = Some(page.take.map_or(*n, |t| t.min(*n)));
                }
                _ => {}
            }
        }
        page
    }

    pub fn of(query: &QueryDescription) -> Self {
        Self::from_operators(&query.operators())
    }

    /// Apply Skip/Take to a row count: `max(count - skip, 0)`, then
    /// `min(.., take)`.
    pub fn adjust_count(&self, count: i64) -> i64 {
        let skip = self.skip.map_or(0, |s| i64::try_from(s).unwrap_or(i64::MAX));
        let skipped = count.saturating_sub(skip).max(0);
        match self.take {
            Some(take) => skipped.min(i64::try_from(take).unwrap_or(i64::MAX)),
            None => skipped,
        }
    }
}

/// Render the FROM target, binding function arguments first.
pub fn render_source(source: &Source, store: &mut ParamStore, dialect: Dialect) -> String {
    match source {
        Source::Named(name) => name.clone(),
        Source::Function { name, args } => {
            let placeholders: Vec<String> = args
                .iter()
                .map(|arg| bind(store, dialect, arg.clone()))
                .collect();
            format!("{}({})", name, placeholders.join(", "))
        }
    }
}

/// Split a chain into its body operators and the terminal.
fn split_terminal<'a>(
    query: &'a QueryDescription,
) -> ShadowResult<(Vec<&'a Operator>, Terminal)> {
    let mut ops = query.operators();
    let terminal = match ops.last() {
        Some(Operator::Terminal(t)) => {
            let t = t.clone();
            ops.pop();
            t
        }
        _ => Terminal::ToList,
    };
    if let Some(op) = ops.iter().find(|op| matches!(op, Operator::Terminal(_))) {
        return Err(ShadowError::invalid_operation(format!(
            "'{}' must be the last operator of a query",
            op.kind()
        )));
    }
    Ok((ops, terminal))
}

/// Build the statement for a query description.
pub fn build_select(query: &QueryDescription, dialect: Dialect) -> ShadowResult<Translation> {
    let (ops, terminal) = split_terminal(query)?;
    let mut store = ParamStore::new();

    let source = render_source(query.source(), &mut store, dialect);

    let filters: Vec<&Predicate> = ops
        .iter()
        .filter_map(|op| match op {
            Operator::Filter(p) => Some(p),
            _ => None,
        })
        .chain(terminal.predicate())
        .collect();
    let where_sql = FilterTranslator::new(&mut store, dialect).translate(filters)?;

    let mut sql = String::new();

    if let Terminal::Count(_) = terminal {
        sql.push_str("SELECT COUNT(*) FROM ");
        sql.push_str(&source);
        push_where(&mut sql, &where_sql);
        return Ok(Translation::new(sql, store));
    }

    let page = Pagination::from_operators(&ops);
    let first = terminal.is_first();
    let top = first && page.skip.is_none() && dialect.supports_top();

    sql.push_str("SELECT ");
    if top {
        sql.push_str("TOP 1 ");
    }
    sql.push_str(&translate_projection(&ops));
    sql.push_str(" FROM ");
    sql.push_str(&source);
    push_where(&mut sql, &where_sql);

    let (offset, fetch) = if first {
        if top {
            (None, None)
        } else {
            (Some(page.skip.unwrap_or(0)), Some(1))
        }
    } else {
        match (page.skip, page.take) {
            (None, None) => (None, None),
            (skip, take) => (Some(skip.unwrap_or(0)), take),
        }
    };

    // OFFSET needs an ORDER BY
    match translate_order(&ops)? {
        Some(order) => {
            sql.push_str(" ORDER BY ");
            sql.push_str(&order);
        }
        None if offset.is_some() => sql.push_str(" ORDER BY (SELECT NULL)"),
        None => {}
    }

    if let Some(n) = offset {
        sql.push_str(&format!(" OFFSET {} ROWS", n));
    }
    if let Some(n) = fetch {
        sql.push_str(&format!(" FETCH NEXT {} ROW ONLY", n));
    }

    Ok(Translation::new(sql, store))
}

fn push_where(sql: &mut String, where_sql: &str) {
    if !where_sql.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(where_sql);
    }
}
