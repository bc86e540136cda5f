//! # pgfluent
//!
//! Fluent joined queries for PostgreSQL, with row views that keep columns of different
//! tables apart.
//!
//! ## Features
//!
//! - **Aliased tables**: the same table can be joined any number of times under different aliases
//! - **`SELECT *` without collisions**: `id` of `persons p` and `id` of `organizations o` are
//!   read as `row.table(&p)?.get_i64("id")` and `row.table(&o)?.get_i64("id")`
//! - **LEFT JOIN absence**: `row.for_alias(&a)?` is `None` when the joined row is missing
//! - **Transaction-friendly**: pass a transaction anywhere a `GenericClient` is expected
//!
//! ## Joined queries
//!
//! ```ignore
//! use pgfluent::prelude::*;
//!
//! let p = Table::new("persons").alias("p");
//! let a = Table::new("addresses").alias("a");
//!
//! let people = p
//!     .left_join(&p.column("id"), &a.column("person_id"))
//!     .where_in(p.column("id"), vec![1_i64, 2, 3])
//!     .order_by(p.column("name"))
//!     .list(&client, |row| {
//!         let name = row.table(&p)?.get_string("name")?;
//!         let city = match row.for_alias(&a)? {
//!             Some(address) => address.get_string("city")?,
//!             None => None,
//!         };
//!         Ok((name, city))
//!     })
//!     .await?;
//! ```
//!
//! ## Logging
//!
//! Events are emitted through `tracing`: executed SQL on target `pgfluent.sql` (debug), alias
//! resolution on target `pgfluent.resolve` (trace/debug).

pub mod client;
pub mod column;
pub mod describe;
pub mod error;
pub mod expr;
pub mod ident;
pub mod index;
pub mod join;
pub mod param;
pub mod prelude;
pub mod query;
pub mod row;
pub mod stream;
pub mod table;

pub use client::{GenericClient, RowStream, StreamingClient};
pub use column::{ColumnRef, OrderBy, SqlField};
pub use error::{FluentError, FluentResult};
pub use expr::{Expr, ExprGroup};
pub use ident::{Ident, IdentPart};
pub use index::{ResultColumn, ResultColumnIndex};
pub use join::{JoinKind, JoinSpec};
pub use param::{Param, ParamList};
pub use query::{JoinedQuery, PagingStyle};
pub use row::RowView;
pub use stream::JoinedRowStream;
pub use table::{Table, TableAlias};

#[cfg(feature = "pool")]
pub mod pool;

#[cfg(feature = "pool")]
pub use pool::{create_pool, create_pool_with_config};
