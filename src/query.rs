//! Fluent query surface bound to a [`DatabaseContext`].

use crate::ast::predicate::Predicate;
use crate::ast::{OrderDirection, QueryDescription, Terminal};
use crate::cancel::CancellationToken;
use crate::context::DatabaseContext;
use crate::cursor::RowStream;
use crate::driver::{AsyncDriver, Driver};
use crate::error::ShadowResult;
use crate::row::Row;
use crate::transpiler::Translation;

/// A composable query.
///
/// Every builder call returns a new `Query`; the receiver is left untouched,
/// so a base query can be reused for several terminals:
///
/// ```rust,ignore
/// let active = ctx.query_table("Users")?.filter(equals("IsActive", true)?);
/// let total = active.count()?;
/// let page = active.order_by("UserName")?.take(10)?.to_list()?;
/// ```
pub struct Query<'ctx, D> {
    ctx: &'ctx DatabaseContext<D>,
    desc: QueryDescription,
}

impl<D> Clone for Query<'_, D> {
    fn clone(&self) -> Self {
        Self {
            ctx: self.ctx,
            desc: self.desc.clone(),
        }
    }
}

impl<'ctx, D> Query<'ctx, D> {
    pub(crate) fn new(ctx: &'ctx DatabaseContext<D>, desc: QueryDescription) -> Self {
        Self { ctx, desc }
    }

    fn with(&self, desc: QueryDescription) -> Self {
        Self { ctx: self.ctx, desc }
    }

    pub fn description(&self) -> &QueryDescription {
        &self.desc
    }

    pub fn filter(&self, predicate: Predicate) -> Self {
        self.with(self.desc.filter(predicate))
    }

    pub fn order_by(&self, member: &str) -> ShadowResult<Self> {
        Ok(self.with(self.desc.order_by(member)?))
    }

    pub fn order_by_descending(&self, member: &str) -> ShadowResult<Self> {
        Ok(self.with(self.desc.order_by_descending(member)?))
    }

    pub fn then_by(&self, member: &str) -> ShadowResult<Self> {
        Ok(self.with(self.desc.then_by(member)?))
    }

    pub fn then_by_descending(&self, member: &str) -> ShadowResult<Self> {
        Ok(self.with(self.desc.then_by_descending(member)?))
    }

    /// Order by an arbitrary key selector, which must be a member access.
    pub fn order_by_key(&self, key: Predicate, direction: OrderDirection) -> ShadowResult<Self> {
        Ok(self.with(self.desc.order_by_key(key, direction)?))
    }

    pub fn then_by_key(&self, key: Predicate, direction: OrderDirection) -> ShadowResult<Self> {
        Ok(self.with(self.desc.then_by_key(key, direction)?))
    }

    pub fn skip(&self, count: i64) -> ShadowResult<Self> {
        Ok(self.with(self.desc.skip(count)?))
    }

    pub fn take(&self, count: i64) -> ShadowResult<Self> {
        Ok(self.with(self.desc.take(count)?))
    }

    pub fn select_only<S: AsRef<str>>(
        &self,
        field_names: impl IntoIterator<Item = S>,
    ) -> ShadowResult<Self> {
        Ok(self.with(self.desc.select_only(field_names)?))
    }

    /// The statement `to_list` would run.
    pub fn to_sql(&self) -> ShadowResult<Translation> {
        self.to_sql_for(Terminal::ToList)
    }

    /// The statement a given terminal would run.
    pub fn to_sql_for(&self, terminal: Terminal) -> ShadowResult<Translation> {
        self.ctx.provider().translate(&self.desc.terminate(terminal))
    }
}

impl<'ctx, D: Driver> Query<'ctx, D> {
    /// Execute and stream rows lazily.
    pub fn iter(&self) -> ShadowResult<RowStream<'ctx>> {
        self.ctx.provider().stream(&self.desc)
    }

    pub fn to_list(&self) -> ShadowResult<Vec<Row>> {
        self.ctx.provider().to_list(&self.desc)
    }

    pub fn count(&self) -> ShadowResult<i64> {
        self.ctx.provider().count(&self.desc, None)
    }

    pub fn count_where(&self, predicate: Predicate) -> ShadowResult<i64> {
        self.ctx.provider().count(&self.desc, Some(predicate))
    }

    pub fn first(&self) -> ShadowResult<Row> {
        self.ctx.provider().first(&self.desc, None)
    }

    pub fn first_where(&self, predicate: Predicate) -> ShadowResult<Row> {
        self.ctx.provider().first(&self.desc, Some(predicate))
    }

    pub fn first_or_default(&self) -> ShadowResult<Option<Row>> {
        self.ctx.provider().first_or_default(&self.desc, None)
    }

    pub fn first_or_default_where(&self, predicate: Predicate) -> ShadowResult<Option<Row>> {
        self.ctx.provider().first_or_default(&self.desc, Some(predicate))
    }
}

impl<'ctx, D: AsyncDriver> Query<'ctx, D> {
    pub async fn to_list_async(&self, cancel: &CancellationToken) -> ShadowResult<Vec<Row>> {
        self.ctx.provider().to_list_async(&self.desc, cancel).await
    }

    pub async fn count_async(&self) -> ShadowResult<i64> {
        self.ctx.provider().count_async(&self.desc, None).await
    }

    pub async fn count_where_async(&self, predicate: Predicate) -> ShadowResult<i64> {
        self.ctx.provider().count_async(&self.desc, Some(predicate)).await
    }

    pub async fn first_async(&self) -> ShadowResult<Row> {
        self.ctx.provider().first_async(&self.desc, None).await
    }

    pub async fn first_where_async(&self, predicate: Predicate) -> ShadowResult<Row> {
        self.ctx.provider().first_async(&self.desc, Some(predicate)).await
    }

    pub async fn first_or_default_async(&self) -> ShadowResult<Option<Row>> {
        self.ctx.provider().first_or_default_async(&self.desc, None).await
    }

    pub async fn first_or_default_where_async(
        &self,
        predicate: Predicate,
    ) -> ShadowResult<Option<Row>> {
        self.ctx
            .provider()
            .first_or_default_async(&self.desc, Some(predicate))
            .await
    }
}
