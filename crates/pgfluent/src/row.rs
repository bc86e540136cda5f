//! Row views: typed, alias-scoped access to one fetched row.

use crate::error::{FluentError, FluentResult};
use crate::index::ResultColumnIndex;
use crate::table::TableAlias;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::de::DeserializeOwned;
use std::str::FromStr;
use tokio_postgres::Row;
use tokio_postgres::types::{FromSql, Type};
use uuid::Uuid;

/// A read-only projection over one result row.
///
/// The view handed to a row mapper is the *root* view: unqualified lookups resolve to the
/// first result column with that name. [`RowView::table`] and [`RowView::for_alias`] narrow
/// it to a single aliased table, so identically named columns of different tables (or of the
/// same table joined twice) stay apart.
///
/// Typed getters return `Ok(None)` for SQL NULL.
///
/// ```ignore
/// let rows = m.join(&m.column("person_id"), &p.column("id"))
///     .list(&client, |row| {
///         let person = row.table(&p)?;
///         Ok(person.get_string("name")?)
///     })
///     .await?;
/// ```
#[derive(Clone)]
pub struct RowView<'a> {
    row: &'a Row,
    index: &'a ResultColumnIndex,
    alias: Option<String>,
}

impl<'a> RowView<'a> {
    pub(crate) fn new(row: &'a Row, index: &'a ResultColumnIndex) -> Self {
        Self {
            row,
            index,
            alias: None,
        }
    }

    /// The alias this view is scoped to, or `None` for the root view.
    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    /// The underlying driver row.
    pub fn raw(&self) -> &'a Row {
        self.row
    }

    /// A view scoped to `alias`.
    pub fn table(&self, alias: &TableAlias) -> FluentResult<RowView<'a>> {
        self.table_named(alias.alias())
    }

    /// A view scoped to the alias named `alias`.
    pub fn table_named(&self, alias: &str) -> FluentResult<RowView<'a>> {
        if !self.index.has_alias(alias) {
            return Err(FluentError::UnknownAlias(alias.to_string()));
        }
        Ok(RowView {
            row: self.row,
            index: self.index,
            alias: Some(alias.to_string()),
        })
    }

    /// A view scoped to `alias`, or `None` when `alias` was LEFT JOINed and this row has no
    /// matching right-hand row (its join column is NULL).
    pub fn for_alias(&self, alias: &TableAlias) -> FluentResult<Option<RowView<'a>>> {
        let view = self.table(alias)?;
        match self.index.join_key_ordinal(alias.alias()) {
            Some(ordinal) if self.null_at(ordinal)? => Ok(None),
            _ => Ok(Some(view)),
        }
    }

    /// Column names visible through this view (uppercased).
    pub fn columns(&self) -> &'a [String] {
        match self.alias.as_deref() {
            Some(alias) => self.index.alias_columns(alias).unwrap_or_default(),
            None => self.index.column_names(),
        }
    }

    /// Result-set ordinal of `column` as seen through this view.
    pub fn ordinal(&self, column: &str) -> FluentResult<usize> {
        let found = match self.alias.as_deref() {
            Some(alias) => self.index.alias_ordinal(alias, column),
            None => self.index.ordinal(column),
        };
        found.ok_or_else(|| FluentError::UnknownColumn {
            alias: self.alias.clone().unwrap_or_else(|| "*".to_string()),
            column: column.to_string(),
            known: self.columns().to_vec(),
        })
    }

    /// Decode `column` as any `FromSql` type.
    pub fn get<T>(&self, column: &str) -> FluentResult<T>
    where
        T: FromSql<'a>,
    {
        let ordinal = self.ordinal(column)?;
        self.row
            .try_get(ordinal)
            .map_err(|e| FluentError::decode(self.describe(column), e.to_string()))
    }

    /// Whether `column` is NULL in this row.
    pub fn is_null(&self, column: &str) -> FluentResult<bool> {
        let ordinal = self.ordinal(column)?;
        self.null_at(ordinal)
    }

    pub fn get_string(&self, column: &str) -> FluentResult<Option<String>> {
        self.get(column)
    }

    /// `bigint` column.
    pub fn get_i64(&self, column: &str) -> FluentResult<Option<i64>> {
        self.get(column)
    }

    /// `integer` column.
    pub fn get_i32(&self, column: &str) -> FluentResult<Option<i32>> {
        self.get(column)
    }

    pub fn get_bool(&self, column: &str) -> FluentResult<Option<bool>> {
        self.get(column)
    }

    /// `timestamptz` column.
    pub fn get_timestamp(&self, column: &str) -> FluentResult<Option<DateTime<Utc>>> {
        self.get(column)
    }

    /// `timestamp` (without time zone) column.
    pub fn get_naive_timestamp(&self, column: &str) -> FluentResult<Option<NaiveDateTime>> {
        self.get(column)
    }

    pub fn get_date(&self, column: &str) -> FluentResult<Option<NaiveDate>> {
        self.get(column)
    }

    pub fn get_uuid(&self, column: &str) -> FluentResult<Option<Uuid>> {
        self.get(column)
    }

    /// A text column holding an enum variant's name, parsed with `FromStr`.
    pub fn get_enum<E>(&self, column: &str) -> FluentResult<Option<E>>
    where
        E: FromStr,
        E::Err: std::fmt::Display,
    {
        let Some(text) = self.get::<Option<String>>(column)? else {
            return Ok(None);
        };
        text.parse()
            .map(Some)
            .map_err(|e: E::Err| FluentError::decode(self.describe(column), e.to_string()))
    }

    /// A `json`/`jsonb` column deserialized into `T`.
    pub fn get_json<T: DeserializeOwned>(&self, column: &str) -> FluentResult<Option<T>> {
        let Some(value) = self.get::<Option<serde_json::Value>>(column)? else {
            return Ok(None);
        };
        serde_json::from_value(value)
            .map(Some)
            .map_err(|e| FluentError::decode(self.describe(column), e.to_string()))
    }

    fn null_at(&self, ordinal: usize) -> FluentResult<bool> {
        self.row
            .try_get::<_, NullCheck>(ordinal)
            .map(|v| v.0)
            .map_err(|e| FluentError::decode(ordinal.to_string(), e.to_string()))
    }

    fn describe(&self, column: &str) -> String {
        match self.alias.as_deref() {
            Some(alias) => format!("{alias}.{column}"),
            None => column.to_string(),
        }
    }
}

impl std::fmt::Debug for RowView<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RowView")
            .field("alias", &self.alias)
            .field("columns", &self.columns())
            .finish()
    }
}

/// Accepts a value of any type and reports only whether it was NULL.
struct NullCheck(bool);

impl<'a> FromSql<'a> for NullCheck {
    fn from_sql(
        _: &Type,
        _: &'a [u8],
    ) -> Result<Self, Box<dyn std::error::Error + Sync + Send>> {
        Ok(NullCheck(false))
    }

    fn from_sql_null(_: &Type) -> Result<Self, Box<dyn std::error::Error + Sync + Send>> {
        Ok(NullCheck(true))
    }

    fn accepts(_: &Type) -> bool {
        true
    }
}
