//! Client traits: the connection/statement layer joined queries execute through.

use crate::error::{FluentError, FluentResult};
use futures_core::Stream;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio_postgres::types::ToSql;
use tokio_postgres::{Row, Statement};

/// A trait that unifies database clients and transactions.
///
/// Joined queries accept anything implementing this trait, so the same builder
/// runs on a plain connection, a pooled connection or inside a transaction.
pub trait GenericClient: Send + Sync {
    /// Execute a query and return all rows.
    fn query(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> impl std::future::Future<Output = FluentResult<Vec<Row>>> + Send;

    /// Execute a statement and return the number of affected rows.
    fn execute(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> impl std::future::Future<Output = FluentResult<u64>> + Send;

    /// Prepare a statement on this connection.
    ///
    /// The returned [`Statement`] carries the result column metadata (name, source table OID)
    /// that joined queries use to resolve aliases.
    fn prepare_statement(
        &self,
        sql: &str,
    ) -> impl std::future::Future<Output = FluentResult<Statement>> + Send {
        let _ = sql;
        async {
            Err(FluentError::Other(
                "prepared statements are not supported by this client".to_string(),
            ))
        }
    }

    /// Execute a prepared statement and return all rows.
    fn query_prepared(
        &self,
        stmt: &Statement,
        params: &[&(dyn ToSql + Sync)],
    ) -> impl std::future::Future<Output = FluentResult<Vec<Row>>> + Send {
        let _ = stmt;
        let _ = params;
        async {
            Err(FluentError::Other(
                "prepared statements are not supported by this client".to_string(),
            ))
        }
    }
}

impl GenericClient for tokio_postgres::Client {
    async fn query(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> FluentResult<Vec<Row>> {
        tokio_postgres::Client::query(self, sql, params)
            .await
            .map_err(FluentError::from_db_error)
    }

    async fn execute(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> FluentResult<u64> {
        tokio_postgres::Client::execute(self, sql, params)
            .await
            .map_err(FluentError::from_db_error)
    }

    async fn prepare_statement(&self, sql: &str) -> FluentResult<Statement> {
        tokio_postgres::Client::prepare(self, sql)
            .await
            .map_err(FluentError::from_db_error)
    }

    async fn query_prepared(
        &self,
        stmt: &Statement,
        params: &[&(dyn ToSql + Sync)],
    ) -> FluentResult<Vec<Row>> {
        tokio_postgres::Client::query(self, stmt, params)
            .await
            .map_err(FluentError::from_db_error)
    }
}

impl GenericClient for tokio_postgres::Transaction<'_> {
    async fn query(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> FluentResult<Vec<Row>> {
        tokio_postgres::Transaction::query(self, sql, params)
            .await
            .map_err(FluentError::from_db_error)
    }

    async fn execute(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> FluentResult<u64> {
        tokio_postgres::Transaction::execute(self, sql, params)
            .await
            .map_err(FluentError::from_db_error)
    }

    async fn prepare_statement(&self, sql: &str) -> FluentResult<Statement> {
        tokio_postgres::Transaction::prepare(self, sql)
            .await
            .map_err(FluentError::from_db_error)
    }

    async fn query_prepared(
        &self,
        stmt: &Statement,
        params: &[&(dyn ToSql + Sync)],
    ) -> FluentResult<Vec<Row>> {
        tokio_postgres::Transaction::query(self, stmt, params)
            .await
            .map_err(FluentError::from_db_error)
    }
}

/// A stream of database rows.
///
/// This is a type-erased wrapper around a `Stream<Item = FluentResult<Row>>` so that different
/// client implementations can return a uniform streaming type. Dropping it releases the
/// underlying portal.
#[must_use]
pub struct RowStream {
    inner: Pin<Box<dyn Stream<Item = FluentResult<Row>> + Send>>,
}

impl RowStream {
    /// Create a new `RowStream` from any compatible stream.
    pub fn new<S>(stream: S) -> Self
    where
        S: Stream<Item = FluentResult<Row>> + Send + 'static,
    {
        Self {
            inner: Box::pin(stream),
        }
    }
}

impl Stream for RowStream {
    type Item = FluentResult<Row>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.as_mut().poll_next(cx)
    }
}

/// Streaming query support (RowStream).
///
/// Separate from [`GenericClient`] so that only clients that can stream rows incrementally
/// (via `tokio-postgres`'s `query_raw`) need to implement it.
pub trait StreamingClient: GenericClient {
    /// Execute a prepared statement and return a `RowStream` for incremental consumption.
    fn query_stream_prepared(
        &self,
        stmt: &Statement,
        params: &[&(dyn ToSql + Sync)],
    ) -> impl std::future::Future<Output = FluentResult<RowStream>> + Send;
}

struct MapDbRowStream<S> {
    inner: Pin<Box<S>>,
}

impl<S> MapDbRowStream<S> {
    fn new(stream: S) -> Self {
        Self {
            inner: Box::pin(stream),
        }
    }
}

impl<S> Stream for MapDbRowStream<S>
where
    S: Stream<Item = Result<Row, tokio_postgres::Error>> + Send + 'static,
{
    type Item = FluentResult<Row>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        match self.inner.as_mut().poll_next(cx) {
            Poll::Ready(Some(Ok(row))) => Poll::Ready(Some(Ok(row))),
            Poll::Ready(Some(Err(e))) => Poll::Ready(Some(Err(FluentError::from_db_error(e)))),
            Poll::Ready(None) => Poll::Ready(None),
            Poll::Pending => Poll::Pending,
        }
    }
}

impl StreamingClient for tokio_postgres::Client {
    async fn query_stream_prepared(
        &self,
        stmt: &Statement,
        params: &[&(dyn ToSql + Sync)],
    ) -> FluentResult<RowStream> {
        let stream = tokio_postgres::Client::query_raw(self, stmt, params.iter().copied())
            .await
            .map_err(FluentError::from_db_error)?;
        Ok(RowStream::new(MapDbRowStream::new(stream)))
    }
}

impl StreamingClient for tokio_postgres::Transaction<'_> {
    async fn query_stream_prepared(
        &self,
        stmt: &Statement,
        params: &[&(dyn ToSql + Sync)],
    ) -> FluentResult<RowStream> {
        let stream = tokio_postgres::Transaction::query_raw(self, stmt, params.iter().copied())
            .await
            .map_err(FluentError::from_db_error)?;
        Ok(RowStream::new(MapDbRowStream::new(stream)))
    }
}

// ===== deadpool-postgres support =====

/// Implement both client traits for a deadpool type by delegating to the
/// `tokio_postgres` type it dereferences to.
#[cfg(feature = "pool")]
macro_rules! delegate_pooled_client {
    ($ty:ty => $target:ty) => {
        impl GenericClient for $ty {
            async fn query(
                &self,
                sql: &str,
                params: &[&(dyn ToSql + Sync)],
            ) -> FluentResult<Vec<Row>> {
                let inner: &$target = self;
                GenericClient::query(inner, sql, params).await
            }

            async fn execute(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> FluentResult<u64> {
                let inner: &$target = self;
                GenericClient::execute(inner, sql, params).await
            }

            async fn prepare_statement(&self, sql: &str) -> FluentResult<Statement> {
                let inner: &$target = self;
                GenericClient::prepare_statement(inner, sql).await
            }

            async fn query_prepared(
                &self,
                stmt: &Statement,
                params: &[&(dyn ToSql + Sync)],
            ) -> FluentResult<Vec<Row>> {
                let inner: &$target = self;
                GenericClient::query_prepared(inner, stmt, params).await
            }
        }

        impl StreamingClient for $ty {
            async fn query_stream_prepared(
                &self,
                stmt: &Statement,
                params: &[&(dyn ToSql + Sync)],
            ) -> FluentResult<RowStream> {
                let inner: &$target = self;
                StreamingClient::query_stream_prepared(inner, stmt, params).await
            }
        }
    };
}

#[cfg(feature = "pool")]
delegate_pooled_client!(deadpool_postgres::Client => tokio_postgres::Client);

#[cfg(feature = "pool")]
delegate_pooled_client!(deadpool_postgres::Transaction<'_> => tokio_postgres::Transaction<'_>);

// ===== Reference implementations =====

impl<C: GenericClient> GenericClient for &C {
    async fn query(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> FluentResult<Vec<Row>> {
        (*self).query(sql, params).await
    }

    async fn execute(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> FluentResult<u64> {
        (*self).execute(sql, params).await
    }

    fn prepare_statement(
        &self,
        sql: &str,
    ) -> impl std::future::Future<Output = FluentResult<Statement>> + Send {
        (*self).prepare_statement(sql)
    }

    fn query_prepared(
        &self,
        stmt: &Statement,
        params: &[&(dyn ToSql + Sync)],
    ) -> impl std::future::Future<Output = FluentResult<Vec<Row>>> + Send {
        (*self).query_prepared(stmt, params)
    }
}

impl<C: StreamingClient> StreamingClient for &C {
    fn query_stream_prepared(
        &self,
        stmt: &Statement,
        params: &[&(dyn ToSql + Sync)],
    ) -> impl std::future::Future<Output = FluentResult<RowStream>> + Send {
        (*self).query_stream_prepared(stmt, params)
    }
}
