//! Column references: one column of one aliased table.

use std::hash::{Hash, Hasher};

/// Identifies a column of a specific aliased table occurrence.
///
/// Created by [`TableAlias::column`](crate::TableAlias::column). Equality and hashing
/// consider only the alias and the column name (ASCII case-insensitive), which is how
/// result columns are looked up.
#[derive(Debug, Clone)]
pub struct ColumnRef {
    alias: String,
    table_name: String,
    column_name: String,
}

impl ColumnRef {
    pub(crate) fn new(
        alias: impl Into<String>,
        table_name: impl Into<String>,
        column_name: impl Into<String>,
    ) -> Self {
        Self {
            alias: alias.into(),
            table_name: table_name.into(),
            column_name: column_name.into(),
        }
    }

    /// The alias of the table occurrence this column belongs to.
    pub fn alias(&self) -> &str {
        &self.alias
    }

    /// The physical table name.
    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// The unqualified column name.
    pub fn column_name(&self) -> &str {
        &self.column_name
    }

    /// `alias.column`, as used in predicates and join conditions.
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.alias, self.column_name)
    }

    /// ORDER BY this column ascending.
    pub fn asc(&self) -> OrderBy {
        OrderBy::new(format!("{} ASC", self.qualified_name()))
    }

    /// ORDER BY this column descending.
    pub fn desc(&self) -> OrderBy {
        OrderBy::new(format!("{} DESC", self.qualified_name()))
    }
}

impl PartialEq for ColumnRef {
    fn eq(&self, other: &Self) -> bool {
        self.alias.eq_ignore_ascii_case(&other.alias)
            && self.column_name.eq_ignore_ascii_case(&other.column_name)
    }
}

impl Eq for ColumnRef {}

impl Hash for ColumnRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.alias.to_ascii_uppercase().hash(state);
        self.column_name.to_ascii_uppercase().hash(state);
    }
}

impl std::fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.alias, self.column_name)
    }
}

/// Anything usable as the left-hand side of a predicate: a column reference or a raw
/// (usually qualified) field expression such as `"p.name"` or `"lower(o.name)"`.
pub trait SqlField {
    fn field_sql(self) -> String;
}

impl SqlField for &str {
    fn field_sql(self) -> String {
        self.to_string()
    }
}

impl SqlField for String {
    fn field_sql(self) -> String {
        self
    }
}

impl SqlField for &String {
    fn field_sql(self) -> String {
        self.clone()
    }
}

impl SqlField for ColumnRef {
    fn field_sql(self) -> String {
        self.qualified_name()
    }
}

impl SqlField for &ColumnRef {
    fn field_sql(self) -> String {
        self.qualified_name()
    }
}

/// One ORDER BY item, rendered verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy(String);

impl OrderBy {
    /// A raw ORDER BY clause item, e.g. `"p.name DESC NULLS LAST"`.
    pub fn new(clause: impl Into<String>) -> Self {
        Self(clause.into())
    }

    pub fn as_sql(&self) -> &str {
        &self.0
    }
}

impl From<&str> for OrderBy {
    fn from(clause: &str) -> Self {
        OrderBy::new(clause)
    }
}

impl From<String> for OrderBy {
    fn from(clause: String) -> Self {
        OrderBy::new(clause)
    }
}

impl From<ColumnRef> for OrderBy {
    fn from(column: ColumnRef) -> Self {
        OrderBy::new(column.qualified_name())
    }
}

impl From<&ColumnRef> for OrderBy {
    fn from(column: &ColumnRef) -> Self {
        OrderBy::new(column.qualified_name())
    }
}
