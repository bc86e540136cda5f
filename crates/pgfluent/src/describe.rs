//! Result column metadata from a prepared statement.
//!
//! A prepared [`Statement`] describes each result column by name and by the OID of the table
//! it was read from. Table OIDs are mapped to names with one `pg_class` lookup per execution.

use crate::client::GenericClient;
use crate::error::{FluentError, FluentResult};
use crate::index::ResultColumn;
use std::collections::HashMap;
use tokio_postgres::Statement;

const TABLE_NAMES_SQL: &str = "SELECT oid, relname FROM pg_catalog.pg_class WHERE oid = ANY($1)";

/// Describe the result columns of `stmt`, resolving source table names through `conn`.
pub async fn describe_columns(
    conn: &impl GenericClient,
    stmt: &Statement,
) -> FluentResult<Vec<ResultColumn>> {
    let raw: Vec<(&str, Option<u32>)> = stmt
        .columns()
        .iter()
        .map(|c| (c.name(), c.table_oid()))
        .collect();

    let oids = distinct_table_oids(&raw);
    let names = if oids.is_empty() {
        HashMap::new()
    } else {
        table_names(conn, &oids).await?
    };

    Ok(resolve_columns(&raw, &names))
}

async fn table_names(conn: &impl GenericClient, oids: &[u32]) -> FluentResult<HashMap<u32, String>> {
    let oids = oids.to_vec();
    let rows = conn.query(TABLE_NAMES_SQL, &[&oids]).await?;
    rows.iter()
        .map(|row| {
            let oid: u32 = row
                .try_get(0)
                .map_err(|e| FluentError::decode("oid", e.to_string()))?;
            let name: String = row
                .try_get(1)
                .map_err(|e| FluentError::decode("relname", e.to_string()))?;
            Ok((oid, name))
        })
        .collect()
}

/// Distinct non-zero table OIDs, in first-seen order.
fn distinct_table_oids(columns: &[(&str, Option<u32>)]) -> Vec<u32> {
    let mut oids = Vec::new();
    for (_, oid) in columns {
        if let Some(oid) = oid.filter(|&o| o != 0) {
            if !oids.contains(&oid) {
                oids.push(oid);
            }
        }
    }
    oids
}

fn resolve_columns(
    columns: &[(&str, Option<u32>)],
    names: &HashMap<u32, String>,
) -> Vec<ResultColumn> {
    columns
        .iter()
        .map(|(name, oid)| ResultColumn {
            name: (*name).to_string(),
            table: oid.and_then(|oid| names.get(&oid).cloned()),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collects_distinct_oids_in_order() {
        let columns = [
            ("id", Some(16402)),
            ("name", Some(16402)),
            ("id", Some(16390)),
            ("total", None),
            ("x", Some(0)),
        ];
        assert_eq!(distinct_table_oids(&columns), vec![16402, 16390]);
    }

    #[test]
    fn maps_oids_to_table_names() {
        let columns = [("id", Some(16402)), ("id", Some(16390)), ("total", None)];
        let names = HashMap::from([
            (16402, "persons".to_string()),
            (16390, "organizations".to_string()),
        ]);

        let resolved = resolve_columns(&columns, &names);

        assert_eq!(
            resolved,
            vec![
                ResultColumn::new("id", "persons"),
                ResultColumn::new("id", "organizations"),
                ResultColumn::computed("total"),
            ]
        );
    }
}
