//! Convenient imports for typical `pgfluent` usage.
//!
//! ```ignore
//! use pgfluent::prelude::*;
//! ```

pub use crate::{
    ColumnRef, FluentError, FluentResult, GenericClient, JoinedQuery, PagingStyle, Param,
    RowView, StreamingClient, Table, TableAlias,
};

#[cfg(feature = "pool")]
pub use crate::{create_pool, create_pool_with_config};
