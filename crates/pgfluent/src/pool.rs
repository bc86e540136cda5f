//! Connection pool utilities

use crate::error::{FluentError, FluentResult};
use deadpool_postgres::{Manager, ManagerConfig, Pool, RecyclingMethod};
use tokio_postgres::NoTls;

/// Create a connection pool from a database URL.
///
/// Uses `NoTls` and a maximum of 16 connections.
///
/// ```ignore
/// let pool = pgfluent::create_pool(&std::env::var("DATABASE_URL")?)?;
/// let client = pool.get().await?;
/// let n = p.query().get_count(&client).await?;
/// ```
pub fn create_pool(database_url: &str) -> FluentResult<Pool> {
    create_pool_with_config(database_url, 16)
}

/// Create a connection pool with a custom maximum size.
pub fn create_pool_with_config(database_url: &str, max_size: usize) -> FluentResult<Pool> {
    let pg_config: tokio_postgres::Config = database_url
        .parse()
        .map_err(|e: tokio_postgres::Error| FluentError::Connection(e.to_string()))?;

    let manager_config = ManagerConfig {
        recycling_method: RecyclingMethod::Fast,
    };
    let mgr = Manager::from_config(pg_config, NoTls, manager_config);
    Pool::builder(mgr)
        .max_size(max_size)
        .build()
        .map_err(|e| FluentError::Connection(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_malformed_url() {
        match create_pool("postgres://user@host:notaport/db") {
            Err(FluentError::Connection(_)) => {}
            Err(other) => panic!("unexpected error: {other:?}"),
            Ok(_) => panic!("malformed URL was accepted"),
        }
    }
}
