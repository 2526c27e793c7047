//! The relational store client as seen by sessions.
//!
//! A backend provides a [`bb8::ManageConnection`] whose connections implement
//! [`SqlConnection`]; dialing and the liveness probe live on the manager
//! (`connect` / `is_valid`), statements and transaction control live here.

use std::future::Future;

use crate::decode::RowCursor;
use crate::error::StoreMiddlewareError;
use crate::results::ExecOutcome;
use crate::types::RowValues;

pub trait SqlConnection: Send + 'static {
    /// Cursor borrowing this connection for the duration of one result set.
    type Cursor<'c>: RowCursor + 'c
    where
        Self: 'c;

    /// Run a read statement and hand back its cursor.
    fn query<'c>(
        &'c mut self,
        statement: &'c str,
        params: &'c [RowValues],
    ) -> impl Future<Output = Result<Self::Cursor<'c>, StoreMiddlewareError>> + Send + 'c;

    /// Run a mutating statement.
    fn exec(
        &mut self,
        statement: &str,
        params: &[RowValues],
    ) -> impl Future<Output = Result<ExecOutcome, StoreMiddlewareError>> + Send;

    /// Leave autocommit and open a transaction on this connection.
    fn begin(&mut self) -> impl Future<Output = Result<(), StoreMiddlewareError>> + Send;

    fn commit(&mut self) -> impl Future<Output = Result<(), StoreMiddlewareError>> + Send;

    fn rollback(&mut self) -> impl Future<Output = Result<(), StoreMiddlewareError>> + Send;
}
