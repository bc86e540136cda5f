//! Result column index: which aliased table produced each result column.
//!
//! PostgreSQL reports, for each result column, the table it was read from but not the alias
//! it was read through. With `SELECT *` over `base JOIN t1 ... JOIN tn`, the server emits all
//! columns of each table occurrence contiguously, in FROM order. The index is rebuilt by walking
//! the result columns and the declared aliases side by side:
//!
//! 1. a column whose source table differs from the current alias's table advances the alias
//!    cursor until the tables match (no match left is [`FluentError::UnresolvableColumn`]);
//! 2. a column name already present in the current alias's bucket means the same physical
//!    table occurs again as the next alias (self-join), so the cursor advances once more; if
//!    the next alias is a different table this is [`FluentError::DuplicateColumn`].
//!
//! The walk trusts that the server preserves declared join order. Two unrelated aliases of
//! the same physical table placed next to each other are told apart only by the repeated
//! column name, so a table exposing a column name twice would be misassigned.

use crate::column::ColumnRef;
use crate::error::{FluentError, FluentResult};
use crate::ident::relation_name;
use crate::table::TableAlias;
use std::collections::HashMap;
use std::collections::hash_map::Entry;

/// Metadata for one result column, as reported by the driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultColumn {
    /// Column name.
    pub name: String,
    /// Name of the physical table the column was read from; `None` for computed columns.
    pub table: Option<String>,
}

impl ResultColumn {
    pub fn new(name: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            table: Some(table.into()),
        }
    }

    /// A column with no source table (an expression).
    pub fn computed(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            table: None,
        }
    }
}

/// Columns assigned to one alias, keyed by uppercased name.
#[derive(Debug, Clone, Default)]
struct AliasColumns {
    alias: String,
    names: Vec<String>,
    ordinals: HashMap<String, usize>,
}

/// Mapping from result-set ordinals to `(alias, column)` pairs for one executed query.
#[derive(Debug, Clone, Default)]
pub struct ResultColumnIndex {
    global: HashMap<String, usize>,
    global_names: Vec<String>,
    per_alias: HashMap<String, AliasColumns>,
    join_key_ordinals: HashMap<String, usize>,
    column_count: usize,
}

impl ResultColumnIndex {
    /// Build the index.
    ///
    /// `aliases` must be in FROM/JOIN order (base table first). `left_join_keys` holds the
    /// right-hand reference of every LEFT JOIN entry; the ordinal of each is recorded so a NULL
    /// there can be read as "no matching row" for that alias.
    pub fn build(
        aliases: &[TableAlias],
        columns: &[ResultColumn],
        left_join_keys: &[ColumnRef],
    ) -> FluentResult<Self> {
        if aliases.is_empty() {
            return Err(FluentError::validation("joined query has no tables"));
        }

        let relations: Vec<String> = aliases
            .iter()
            .map(|a| relation_name(a.table_name()))
            .collect();

        let mut buckets: Vec<AliasColumns> = aliases
            .iter()
            .map(|a| AliasColumns {
                alias: a.alias().to_string(),
                ..AliasColumns::default()
            })
            .collect();

        let mut index = ResultColumnIndex {
            column_count: columns.len(),
            ..ResultColumnIndex::default()
        };

        let mut cursor = 0usize;
        for (ordinal, column) in columns.iter().enumerate() {
            let key = column.name.to_ascii_uppercase();
            let Some(table) = column.table.as_deref() else {
                return Err(FluentError::UnresolvableColumn {
                    column: column.name.clone(),
                    table: "<computed>".to_string(),
                });
            };

            loop {
                match relations.get(cursor) {
                    Some(relation) if relation.eq_ignore_ascii_case(table) => break,
                    Some(_) => cursor += 1,
                    None => {
                        return Err(FluentError::UnresolvableColumn {
                            column: column.name.clone(),
                            table: table.to_string(),
                        });
                    }
                }
            }

            if buckets[cursor].ordinals.contains_key(&key) {
                let next = cursor + 1;
                match relations.get(next) {
                    Some(relation) if relation.eq_ignore_ascii_case(table) => cursor = next,
                    _ => {
                        return Err(FluentError::DuplicateColumn {
                            column: column.name.clone(),
                            alias: aliases[cursor].alias().to_string(),
                        });
                    }
                }
            }

            let bucket = &mut buckets[cursor];
            bucket.ordinals.insert(key.clone(), ordinal);
            bucket.names.push(key.clone());
            tracing::trace!(
                target: "pgfluent.resolve",
                ordinal,
                column = %column.name,
                alias = %bucket.alias,
                "assigned result column"
            );

            match index.global.entry(key) {
                Entry::Vacant(slot) => {
                    index.global_names.push(slot.key().clone());
                    slot.insert(ordinal);
                }
                Entry::Occupied(slot) => {
                    tracing::debug!(
                        target: "pgfluent.resolve",
                        column = %slot.key(),
                        first = *slot.get(),
                        skipped = ordinal,
                        "duplicate result column name; unaliased lookups use the first"
                    );
                }
            }
        }

        for bucket in buckets {
            let key = bucket.alias.to_ascii_uppercase();
            if index.per_alias.insert(key, bucket).is_some() {
                return Err(FluentError::validation(
                    "alias is used more than once in one query",
                ));
            }
        }

        for join_key in left_join_keys {
            let ordinal = index
                .alias_ordinal(join_key.alias(), join_key.column_name())
                .ok_or_else(|| FluentError::UnresolvableColumn {
                    column: join_key.qualified_name(),
                    table: join_key.table_name().to_string(),
                })?;
            index
                .join_key_ordinals
                .insert(join_key.alias().to_ascii_uppercase(), ordinal);
        }

        Ok(index)
    }

    /// Ordinal of the first result column named `column`, regardless of alias.
    pub fn ordinal(&self, column: &str) -> Option<usize> {
        self.global.get(&column.to_ascii_uppercase()).copied()
    }

    /// Ordinal of `column` within `alias`'s columns.
    pub fn alias_ordinal(&self, alias: &str, column: &str) -> Option<usize> {
        self.per_alias
            .get(&alias.to_ascii_uppercase())?
            .ordinals
            .get(&column.to_ascii_uppercase())
            .copied()
    }

    /// Uppercased column names assigned to `alias`, in result order.
    pub fn alias_columns(&self, alias: &str) -> Option<&[String]> {
        self.per_alias
            .get(&alias.to_ascii_uppercase())
            .map(|bucket| bucket.names.as_slice())
    }

    /// Distinct uppercased column names, in order of first occurrence.
    pub fn column_names(&self) -> &[String] {
        &self.global_names
    }

    /// Ordinal of the join column of a left-joined alias.
    pub fn join_key_ordinal(&self, alias: &str) -> Option<usize> {
        self.join_key_ordinals
            .get(&alias.to_ascii_uppercase())
            .copied()
    }

    pub fn has_alias(&self, alias: &str) -> bool {
        self.per_alias.contains_key(&alias.to_ascii_uppercase())
    }

    /// Number of result columns indexed.
    pub fn len(&self) -> usize {
        self.column_count
    }

    pub fn is_empty(&self) -> bool {
        self.column_count == 0
    }
}
