//! Joined query builder.
//!
//! A [`JoinedQuery`] selects every column of a base table and the tables joined to it, then
//! hands each result row to a mapper as a [`RowView`] that can be narrowed per alias.
//!
//! ```ignore
//! let p = Table::new("persons").alias("p");
//! let m = Table::new("memberships").alias("m");
//! let o = Table::new("organizations").alias("o");
//!
//! let pairs = m
//!     .join(&m.column("person_id"), &p.column("id"))
//!     .join(&m.column("organization_id"), &o.column("id"))
//!     .where_eq(o.column("name"), "Acme")
//!     .order_by(p.column("name"))
//!     .list(&client, |row| {
//!         Ok((
//!             row.table(&p)?.get_string("name")?,
//!             row.table(&o)?.get_string("name")?,
//!         ))
//!     })
//!     .await?;
//! ```

use crate::client::{GenericClient, RowStream, StreamingClient};
use crate::column::{ColumnRef, OrderBy, SqlField};
use crate::describe::describe_columns;
use crate::error::{FluentError, FluentResult};
use crate::expr::{Expr, ExprGroup};
use crate::ident::Ident;
use crate::index::ResultColumnIndex;
use crate::join::{JoinKind, JoinSpec};
use crate::param::{Param, ParamList};
use crate::row::RowView;
use crate::stream::JoinedRowStream;
use crate::table::TableAlias;
use std::pin::Pin;
use tokio_postgres::{Row, Statement};
use tokio_postgres::types::ToSql;

/// How LIMIT/OFFSET are rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PagingStyle {
    /// `LIMIT n OFFSET m`
    #[default]
    LimitOffset,
    /// `OFFSET m ROWS FETCH FIRST n ROWS ONLY` (SQL standard)
    FetchFirst,
}

/// SELECT over a base table and the tables joined to it.
///
/// A consuming builder: every call takes `self` and returns the extended query. Clone it to
/// run variations of one query. Without [`order_by`](Self::order_by) the row order is
/// whatever the server produces.
#[derive(Clone, Debug)]
#[must_use]
pub struct JoinedQuery {
    base: TableAlias,
    joins: Vec<JoinSpec>,
    where_group: ExprGroup,
    order_clauses: Vec<OrderBy>,
    limit: Option<i64>,
    offset: Option<i64>,
    paging: PagingStyle,
    tag: Option<String>,
    build_error: Option<String>,
}

/// A statement prepared and described, ready to run.
struct Prepared {
    statement: Statement,
    params: ParamList,
    index: ResultColumnIndex,
}

impl JoinedQuery {
    /// Create a query whose FROM clause starts at `base`.
    pub fn new(base: TableAlias) -> Self {
        Self {
            base,
            joins: Vec::new(),
            where_group: ExprGroup::new(),
            order_clauses: Vec::new(),
            limit: None,
            offset: None,
            paging: PagingStyle::default(),
            tag: None,
            build_error: None,
        }
    }

    // ==================== JOIN ====================

    /// INNER JOIN `right`'s table on `left = right`.
    pub fn join(mut self, left: &ColumnRef, right: &ColumnRef) -> Self {
        self.joins
            .push(JoinSpec::new(left.clone(), right.clone(), JoinKind::Inner));
        self
    }

    /// LEFT JOIN `right`'s table on `left = right`.
    ///
    /// Rows without a match expose the alias as absent through [`RowView::for_alias`].
    pub fn left_join(mut self, left: &ColumnRef, right: &ColumnRef) -> Self {
        self.joins
            .push(JoinSpec::new(left.clone(), right.clone(), JoinKind::Left));
        self
    }

    // ==================== WHERE ====================

    /// Add WHERE: field = value
    pub fn where_eq<T: ToSql + Send + Sync + 'static>(
        mut self,
        field: impl SqlField,
        value: T,
    ) -> Self {
        self.where_group
            .push(Expr::eq(field.field_sql(), Param::new(value)));
        self
    }

    /// Add WHERE if value is Some: field = value
    pub fn where_optional<T: ToSql + Send + Sync + 'static>(
        self,
        field: impl SqlField,
        value: Option<T>,
    ) -> Self {
        match value {
            Some(v) => self.where_eq(field, v),
            None => self,
        }
    }

    /// Add WHERE: field IN (values...)
    ///
    /// An empty collection renders `field <> field`, which matches no rows.
    pub fn where_in<T: ToSql + Send + Sync + 'static>(
        mut self,
        field: impl SqlField,
        values: impl IntoIterator<Item = T>,
    ) -> Self {
        let values = values.into_iter().map(Param::new).collect();
        self.where_group
            .push(Expr::in_list(field.field_sql(), values));
        self
    }

    /// Add a raw WHERE predicate without parameters. Its text, `?` included, is used as is.
    pub fn where_expr(mut self, expr: &str) -> Self {
        self.where_group.push(Expr::Raw(expr.to_string()));
        self
    }

    /// Add a WHERE predicate with exactly one `?` placeholder (`??` is a literal `?`).
    pub fn where_expr_with<T: ToSql + Send + Sync + 'static>(self, expr: &str, value: T) -> Self {
        self.where_expr_with_params(expr, vec![Param::new(value)])
    }

    /// Add a WHERE predicate whose `?` placeholders are bound to `params` in order.
    ///
    /// Write `??` for a literal `?`, e.g. the jsonb operators `??`, `??|` and `??&`.
    pub fn where_expr_with_params(mut self, expr: &str, params: Vec<Param>) -> Self {
        let placeholders = Expr::placeholder_count(expr);
        if placeholders != params.len() {
            self.record_error(format!(
                "predicate '{expr}' has {placeholders} placeholders but {} values",
                params.len()
            ));
            return self;
        }
        self.where_group.push(Expr::template(expr, params));
        self
    }

    /// Add WHERE: field_1 = value_1 AND ... AND field_n = value_n
    pub fn where_all<F: SqlField>(
        mut self,
        fields: impl IntoIterator<Item = F>,
        values: impl IntoIterator<Item = Param>,
    ) -> Self {
        let fields: Vec<String> = fields.into_iter().map(SqlField::field_sql).collect();
        let values: Vec<Param> = values.into_iter().collect();
        if fields.len() != values.len() {
            self.record_error(format!(
                "where_all got {} fields but {} values",
                fields.len(),
                values.len()
            ));
            return self;
        }
        for (field, value) in fields.into_iter().zip(values) {
            self.where_group.push(Expr::eq(field, value));
        }
        self
    }

    // ==================== ORDER BY / paging ====================

    /// Add ORDER BY item. Items render in call order.
    pub fn order_by(mut self, order: impl Into<OrderBy>) -> Self {
        self.order_clauses.push(order.into());
        self
    }

    /// Set LIMIT.
    pub fn limit(mut self, n: i64) -> Self {
        self.limit = Some(n);
        self
    }

    /// Set OFFSET.
    pub fn offset(mut self, n: i64) -> Self {
        self.offset = Some(n);
        self
    }

    /// Skip `offset` rows and return at most `limit`.
    pub fn skip_and_limit(self, offset: i64, limit: i64) -> Self {
        self.offset(offset).limit(limit)
    }

    /// Choose how LIMIT/OFFSET are rendered.
    pub fn paging(mut self, style: PagingStyle) -> Self {
        self.paging = style;
        self
    }

    /// Associate a tag with this query's log events.
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    // ==================== Inspection ====================

    /// Table occurrences in FROM/JOIN order, base table first.
    pub fn aliases(&self) -> Vec<TableAlias> {
        std::iter::once(self.base.clone())
            .chain(self.joins.iter().map(JoinSpec::joined_alias))
            .collect()
    }

    pub fn joins(&self) -> &[JoinSpec] {
        &self.joins
    }

    /// The rendered SELECT statement.
    pub fn to_sql(&self) -> String {
        self.build_sql(false).0
    }

    /// The rendered `count(*)` statement.
    pub fn to_count_sql(&self) -> String {
        self.build_sql(true).0
    }

    fn left_join_keys(&self) -> Vec<ColumnRef> {
        self.joins
            .iter()
            .filter(|j| j.kind == JoinKind::Left)
            .map(|j| j.right.clone())
            .collect()
    }

    fn record_error(&mut self, message: String) {
        if self.build_error.is_none() {
            self.build_error = Some(message);
        }
    }

    // ==================== Build ====================

    fn build_sql(&self, is_count: bool) -> (String, ParamList) {
        let mut params = ParamList::new();

        let select_part = if is_count { "count(*)" } else { "*" };
        let mut sql = format!(
            "SELECT {} FROM {}",
            select_part,
            self.base.table_and_alias_sql()
        );

        for join in &self.joins {
            sql.push(' ');
            sql.push_str(&join.to_sql());
        }

        if !self.where_group.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&self.where_group.build_into(&mut params));
        }

        if !is_count {
            if !self.order_clauses.is_empty() {
                let items: Vec<&str> = self.order_clauses.iter().map(OrderBy::as_sql).collect();
                sql.push_str(" ORDER BY ");
                sql.push_str(&items.join(", "));
            }
            self.push_paging(&mut sql);
        }

        (sql, params)
    }

    fn push_paging(&self, sql: &mut String) {
        match self.paging {
            PagingStyle::LimitOffset => {
                if let Some(limit) = self.limit {
                    sql.push_str(&format!(" LIMIT {}", limit));
                }
                if let Some(offset) = self.offset {
                    sql.push_str(&format!(" OFFSET {}", offset));
                }
            }
            PagingStyle::FetchFirst => {
                if let Some(offset) = self.offset {
                    sql.push_str(&format!(" OFFSET {} ROWS", offset));
                }
                if let Some(limit) = self.limit {
                    sql.push_str(&format!(" FETCH FIRST {} ROWS ONLY", limit));
                }
            }
        }
    }

    /// Validate builder state before execution.
    pub fn validate(&self) -> FluentResult<()> {
        if let Some(ref err) = self.build_error {
            return Err(FluentError::Validation(err.clone()));
        }

        let aliases = self.aliases();
        for (i, alias) in aliases.iter().enumerate() {
            Ident::parse(alias.table_name())?;
            if !Ident::parse(alias.alias())?.is_simple() {
                return Err(FluentError::validation(format!(
                    "alias '{}' must not be qualified",
                    alias.alias()
                )));
            }
            if aliases[..i].iter().any(|a| a.is_named(alias.alias())) {
                return Err(FluentError::validation(format!(
                    "alias '{}' is used more than once",
                    alias.alias()
                )));
            }
        }
        for join in &self.joins {
            for column in [&join.left, &join.right] {
                Ident::parse(column.alias())?;
                Ident::parse(column.column_name())?;
            }
        }
        Ok(())
    }

    fn log_execution(&self, operation: &'static str, sql: &str, param_count: usize) {
        tracing::debug!(
            target: "pgfluent.sql",
            operation,
            tag = self.tag.as_deref().unwrap_or("-"),
            param_count,
            sql = %sql,
            "executing joined query"
        );
    }

    async fn prepare(
        &self,
        conn: &impl GenericClient,
        operation: &'static str,
    ) -> FluentResult<Prepared> {
        self.validate()?;
        let (sql, params) = self.build_sql(false);
        self.log_execution(operation, &sql, params.len());

        let statement = conn.prepare_statement(&sql).await?;
        let columns = describe_columns(conn, &statement).await?;
        let index = ResultColumnIndex::build(&self.aliases(), &columns, &self.left_join_keys())?;

        Ok(Prepared {
            statement,
            params,
            index,
        })
    }

    // ==================== Execution ====================

    /// Execute and map every row.
    ///
    /// The first mapper error stops mapping and is returned.
    pub async fn list<T, F>(&self, conn: &impl GenericClient, mut mapper: F) -> FluentResult<Vec<T>>
    where
        F: FnMut(&RowView<'_>) -> FluentResult<T>,
    {
        let prepared = self.prepare(conn, "list").await?;
        let rows = conn
            .query_prepared(&prepared.statement, &prepared.params.as_refs())
            .await?;
        rows.iter()
            .map(|row| mapper(&RowView::new(row, &prepared.index)))
            .collect()
    }

    /// Execute and map the single matching row.
    ///
    /// Rows are streamed; fetching stops at the second one.
    ///
    /// Semantics:
    /// - 0 rows: returns `Ok(None)`
    /// - 1 row: returns the mapped row
    /// - multiple rows: returns [`FluentError::MultipleRowsReturned`] (`count_hint` is 2)
    pub async fn single_object<T, F>(
        &self,
        conn: &impl StreamingClient,
        mut mapper: F,
    ) -> FluentResult<Option<T>>
    where
        F: FnMut(&RowView<'_>) -> FluentResult<T>,
    {
        let prepared = self.prepare(conn, "single_object").await?;
        let mut rows = conn
            .query_stream_prepared(&prepared.statement, &prepared.params.as_refs())
            .await?;

        let Some(first) = next_row(&mut rows).await? else {
            return Ok(None);
        };
        if next_row(&mut rows).await?.is_some() {
            return Err(FluentError::multiple_rows(2));
        }
        mapper(&RowView::new(&first, &prepared.index)).map(Some)
    }

    /// Execute and return a lazy stream of mapped rows.
    ///
    /// The stream is single-pass. It ends after the first error (driver or mapper).
    pub async fn stream<T, F>(
        &self,
        conn: &impl StreamingClient,
        mapper: F,
    ) -> FluentResult<JoinedRowStream<T, F>>
    where
        F: FnMut(&RowView<'_>) -> FluentResult<T>,
    {
        let prepared = self.prepare(conn, "stream").await?;
        let rows = conn
            .query_stream_prepared(&prepared.statement, &prepared.params.as_refs())
            .await?;
        Ok(JoinedRowStream::new(rows, prepared.index, mapper))
    }

    /// Execute and call `callback` for each row as it arrives.
    pub async fn for_each<F>(&self, conn: &impl StreamingClient, callback: F) -> FluentResult<()>
    where
        F: FnMut(&RowView<'_>) -> FluentResult<()>,
    {
        let mut rows = self.stream(conn, callback).await?;
        while let Some(result) =
            std::future::poll_fn(|cx| futures_core::Stream::poll_next(Pin::new(&mut rows), cx))
                .await
        {
            result?;
        }
        Ok(())
    }

    /// Count rows matching the FROM/JOIN/WHERE clauses (ORDER BY and paging ignored).
    pub async fn get_count(&self, conn: &impl GenericClient) -> FluentResult<i64> {
        self.validate()?;
        let (sql, params) = self.build_sql(true);
        self.log_execution("get_count", &sql, params.len());

        let rows = conn.query(&sql, &params.as_refs()).await?;
        let row = rows
            .first()
            .ok_or_else(|| FluentError::Other("count(*) returned no rows".to_string()))?;
        row.try_get::<_, i64>(0)
            .map_err(|e| FluentError::decode("count", e.to_string()))
    }
}

async fn next_row(rows: &mut RowStream) -> FluentResult<Option<Row>> {
    std::future::poll_fn(|cx| futures_core::Stream::poll_next(Pin::new(&mut *rows), cx))
        .await
        .transpose()
}

#[cfg(test)]
mod tests;
