//! Physical tables and their query-local aliases.

use crate::column::{ColumnRef, OrderBy, SqlField};
use crate::query::JoinedQuery;
use tokio_postgres::types::ToSql;

/// A physical table, identified by name (optionally schema-qualified).
///
/// ```ignore
/// let persons = Table::new("persons");
/// let p = persons.alias("p");
/// let manager = persons.alias("manager"); // same table again, for a self-join
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    name: String,
}

impl Table {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Bind this table to a query-local alias.
    pub fn alias(&self, alias: impl Into<String>) -> TableAlias {
        TableAlias::new(self.name.clone(), alias)
    }
}

/// One occurrence of a physical table in a joined query.
///
/// The same physical table may be aliased several times in one query; each alias resolves
/// its own result columns independently.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableAlias {
    table_name: String,
    alias: String,
}

impl TableAlias {
    pub fn new(table_name: impl Into<String>, alias: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            alias: alias.into(),
        }
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    pub fn alias(&self) -> &str {
        &self.alias
    }

    /// A reference to `column` of this table occurrence.
    pub fn column(&self, column: impl Into<String>) -> ColumnRef {
        ColumnRef::new(self.alias.clone(), self.table_name.clone(), column)
    }

    /// `table alias`, as rendered in FROM and JOIN clauses.
    pub fn table_and_alias_sql(&self) -> String {
        format!("{} {}", self.table_name, self.alias)
    }

    /// Whether `name` is this alias (ASCII case-insensitive).
    pub(crate) fn is_named(&self, name: &str) -> bool {
        self.alias.eq_ignore_ascii_case(name)
    }

    // ==================== Query entry points ====================

    /// Start a joined query with this alias as the base table.
    pub fn query(&self) -> JoinedQuery {
        JoinedQuery::new(self.clone())
    }

    /// Start a query and INNER JOIN `right`'s table on `left = right`.
    pub fn join(&self, left: &ColumnRef, right: &ColumnRef) -> JoinedQuery {
        self.query().join(left, right)
    }

    /// Start a query and LEFT JOIN `right`'s table on `left = right`.
    pub fn left_join(&self, left: &ColumnRef, right: &ColumnRef) -> JoinedQuery {
        self.query().left_join(left, right)
    }

    /// Start a query filtered by `field = value`.
    pub fn where_eq<T: ToSql + Send + Sync + 'static>(
        &self,
        field: impl SqlField,
        value: T,
    ) -> JoinedQuery {
        self.query().where_eq(field, value)
    }

    /// Start a query filtered by `field IN (values...)`.
    pub fn where_in<T: ToSql + Send + Sync + 'static>(
        &self,
        field: impl SqlField,
        values: impl IntoIterator<Item = T>,
    ) -> JoinedQuery {
        self.query().where_in(field, values)
    }

    /// Start a query filtered by a raw predicate.
    pub fn where_expr(&self, expr: &str) -> JoinedQuery {
        self.query().where_expr(expr)
    }

    /// Start a query ordered by `order`.
    pub fn order_by(&self, order: impl Into<OrderBy>) -> JoinedQuery {
        self.query().order_by(order)
    }
}

impl std::fmt::Display for TableAlias {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.table_name, self.alias)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aliases_of_one_table_are_distinct() {
        let persons = Table::new("persons");
        let p = persons.alias("p");
        let manager = persons.alias("manager");

        assert_eq!(p.table_name(), manager.table_name());
        assert_ne!(p, manager);
        assert_ne!(p.column("id"), manager.column("id"));
        assert_eq!(p.table_and_alias_sql(), "persons p");
    }

    #[test]
    fn column_carries_alias_and_table() {
        let o = TableAlias::new("public.organizations", "o");
        let name = o.column("name");
        assert_eq!(name.alias(), "o");
        assert_eq!(name.table_name(), "public.organizations");
        assert_eq!(name.qualified_name(), "o.name");
        assert!(o.is_named("O"));
    }
}
