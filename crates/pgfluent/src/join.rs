//! Join specifications: how aliased tables are connected.

use crate::column::ColumnRef;
use crate::table::TableAlias;

/// Join kind. Only equi-joins on one column pair are expressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Inner,
    Left,
}

impl JoinKind {
    fn keyword(self) -> &'static str {
        match self {
            JoinKind::Inner => "INNER JOIN",
            JoinKind::Left => "LEFT JOIN",
        }
    }
}

/// One `JOIN right_table right_alias ON left = right` entry.
///
/// The right-hand reference names the table being joined in; the left-hand reference must
/// belong to the base table or to a table joined earlier. That is not checked here: an
/// unreachable alias surfaces as a driver error at execution.
#[derive(Debug, Clone)]
pub struct JoinSpec {
    pub left: ColumnRef,
    pub right: ColumnRef,
    pub kind: JoinKind,
}

impl JoinSpec {
    pub fn new(left: ColumnRef, right: ColumnRef, kind: JoinKind) -> Self {
        Self { left, right, kind }
    }

    /// The table occurrence this entry joins in.
    pub fn joined_alias(&self) -> TableAlias {
        TableAlias::new(self.right.table_name(), self.right.alias())
    }

    pub fn to_sql(&self) -> String {
        format!(
            "{} {} {} ON {} = {}",
            self.kind.keyword(),
            self.right.table_name(),
            self.right.alias(),
            self.left.qualified_name(),
            self.right.qualified_name()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_joined_table_from_right_reference() {
        let m = TableAlias::new("memberships", "m");
        let p = TableAlias::new("persons", "p");
        let spec = JoinSpec::new(m.column("person_id"), p.column("id"), JoinKind::Inner);
        assert_eq!(
            spec.to_sql(),
            "INNER JOIN persons p ON m.person_id = p.id"
        );
        assert_eq!(spec.joined_alias(), p);
    }

    #[test]
    fn renders_left_join() {
        let p = TableAlias::new("persons", "p");
        let a = TableAlias::new("addresses", "a");
        let spec = JoinSpec::new(p.column("id"), a.column("person_id"), JoinKind::Left);
        assert_eq!(
            spec.to_sql(),
            "LEFT JOIN addresses a ON p.id = a.person_id"
        );
    }
}
