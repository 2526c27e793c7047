//! Statement surface shared by pool-direct and transaction sessions.

use std::future::Future;

use crate::decode::decode;
use crate::error::StoreMiddlewareError;
use crate::results::{DecodedRow, ExecOutcome, ResultSet};
use crate::store::SqlConnection;
use crate::types::RowValues;

/// A live handle through which statements are issued.
///
/// Implemented by [`crate::SqlPool`] (autocommit, or the open pool-level transaction
/// in strict mode) and [`crate::Transaction`]. Helpers written against this trait
/// work with either:
/// ```rust,no_run
/// use store_middleware::prelude::*;
///
/// async fn rename(s: &mut impl SqlSession, id: i64, name: &str) -> Result<u64, StoreMiddlewareError> {
///     s.update("UPDATE t SET name = ? WHERE id = ?", &[name.into(), id.into()]).await
/// }
/// ```
pub trait SqlSession: Send {
    /// Run a read statement and decode every row. An empty result is not an error.
    fn query(
        &mut self,
        statement: &str,
        params: &[RowValues],
    ) -> impl Future<Output = Result<ResultSet, StoreMiddlewareError>> + Send;

    /// Run a mutating statement.
    fn exec(
        &mut self,
        statement: &str,
        params: &[RowValues],
    ) -> impl Future<Output = Result<ExecOutcome, StoreMiddlewareError>> + Send;

    /// Run a read statement that must match exactly one row.
    fn get_one(
        &mut self,
        statement: &str,
        params: &[RowValues],
    ) -> impl Future<Output = Result<DecodedRow, StoreMiddlewareError>> + Send {
        async move { self.query(statement, params).await?.into_single_row() }
    }

    /// `exec`, returning rows affected.
    fn update(
        &mut self,
        statement: &str,
        params: &[RowValues],
    ) -> impl Future<Output = Result<u64, StoreMiddlewareError>> + Send {
        async move { Ok(self.exec(statement, params).await?.rows_affected) }
    }

    /// `exec`, returning the generated identity.
    fn insert(
        &mut self,
        statement: &str,
        params: &[RowValues],
    ) -> impl Future<Output = Result<u64, StoreMiddlewareError>> + Send {
        async move { Ok(self.exec(statement, params).await?.last_insert_id) }
    }

    /// `exec`, returning rows affected.
    fn delete(
        &mut self,
        statement: &str,
        params: &[RowValues],
    ) -> impl Future<Output = Result<u64, StoreMiddlewareError>> + Send {
        async move { Ok(self.exec(statement, params).await?.rows_affected) }
    }
}

pub(crate) async fn run_query<C: SqlConnection>(
    conn: &mut C,
    statement: &str,
    params: &[RowValues],
) -> Result<ResultSet, StoreMiddlewareError> {
    let cursor = conn.query(statement, params).await?;
    decode(cursor).await
}
