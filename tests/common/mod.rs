//! In-memory scripted store shared by the integration tests.
//!
//! Statements are answered from a script keyed by statement text. Every statement
//! (including BEGIN/COMMIT/ROLLBACK) is logged with the id of the connection that
//! ran it, so tests can check routing as well as results.
#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::future::{Future, ready};
use std::sync::{Arc, Mutex, MutexGuard};

use bb8::ManageConnection;
use store_middleware::decode::RawRow;
use store_middleware::prelude::*;

#[derive(Debug, Clone)]
pub enum Reply {
    Rows {
        columns: Vec<ColumnDescriptor>,
        rows: Vec<RawRow>,
        /// Fail the cursor after this many rows
        fail_after: Option<usize>,
    },
    Exec(ExecOutcome),
    Fail(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Logged {
    pub conn: usize,
    pub statement: String,
    pub params: Vec<RowValues>,
}

#[derive(Default)]
struct State {
    unreachable: bool,
    fail_commit: bool,
    next_id: usize,
    connects: usize,
    closed: usize,
    log: Vec<Logged>,
    script: HashMap<String, Reply>,
}

#[derive(Clone, Default)]
pub struct FakeStore {
    state: Arc<Mutex<State>>,
}

impl FakeStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    pub fn script(&self, statement: &str, reply: Reply) {
        self.lock().script.insert(statement.to_string(), reply);
    }

    pub fn script_rows(&self, statement: &str, columns: &[(&str, &str)], rows: Vec<RawRow>) {
        let columns = columns
            .iter()
            .map(|(name, tag)| ColumnDescriptor::new(*name, *tag))
            .collect();
        self.script(
            statement,
            Reply::Rows {
                columns,
                rows,
                fail_after: None,
            },
        );
    }

    pub fn script_exec(&self, statement: &str, rows_affected: u64, last_insert_id: u64) {
        self.script(
            statement,
            Reply::Exec(ExecOutcome {
                rows_affected,
                last_insert_id,
            }),
        );
    }

    pub fn set_unreachable(&self, unreachable: bool) {
        self.lock().unreachable = unreachable;
    }

    pub fn set_fail_commit(&self, fail: bool) {
        self.lock().fail_commit = fail;
    }

    pub fn log(&self) -> Vec<Logged> {
        self.lock().log.clone()
    }

    pub fn statements(&self) -> Vec<String> {
        self.lock().log.iter().map(|l| l.statement.clone()).collect()
    }

    pub fn connects(&self) -> usize {
        self.lock().connects
    }

    pub fn closed(&self) -> usize {
        self.lock().closed
    }

    pub fn manager(&self) -> FakeManager {
        FakeManager {
            store: self.clone(),
        }
    }

    pub fn sql_pool(&self, config: PoolConfig, mode: TransactionMode) -> SqlPool<FakeManager> {
        SqlPool::new(self.manager(), config, mode).unwrap()
    }

    fn record(&self, conn: usize, statement: &str, params: &[RowValues]) -> Option<Reply> {
        let mut state = self.lock();
        state.log.push(Logged {
            conn,
            statement: statement.to_string(),
            params: params.to_vec(),
        });
        state.script.get(statement).cloned()
    }
}

pub fn cell(text: &str) -> Option<Vec<u8>> {
    Some(text.as_bytes().to_vec())
}

pub struct FakeManager {
    store: FakeStore,
}

impl ManageConnection for FakeManager {
    type Connection = FakeConnection;
    type Error = String;

    fn connect(&self) -> impl Future<Output = Result<Self::Connection, Self::Error>> + Send {
        let mut state = self.store.lock();
        let result = if state.unreachable {
            Err("connection refused".to_string())
        } else {
            state.next_id += 1;
            state.connects += 1;
            Ok(FakeConnection {
                id: state.next_id,
                store: self.store.clone(),
            })
        };
        ready(result)
    }

    fn is_valid(
        &self,
        _conn: &mut Self::Connection,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send {
        let unreachable = self.store.lock().unreachable;
        ready(if unreachable {
            Err("ping: connection reset".to_string())
        } else {
            Ok(())
        })
    }

    fn has_broken(&self, _conn: &mut Self::Connection) -> bool {
        false
    }
}

pub struct FakeConnection {
    pub id: usize,
    store: FakeStore,
}

impl Drop for FakeConnection {
    fn drop(&mut self) {
        self.store.lock().closed += 1;
    }
}

pub struct FakeCursor {
    columns: Vec<ColumnDescriptor>,
    rows: VecDeque<RawRow>,
    fail_after: Option<usize>,
    served: usize,
}

impl RowCursor for FakeCursor {
    fn columns(&self) -> &[ColumnDescriptor] {
        &self.columns
    }

    fn next_row(
        &mut self,
    ) -> impl Future<Output = Result<Option<RawRow>, StoreMiddlewareError>> + Send {
        let result = if self.fail_after == Some(self.served) {
            Err(StoreMiddlewareError::CursorError("stream interrupted".into()))
        } else {
            self.served += 1;
            Ok(self.rows.pop_front())
        };
        ready(result)
    }

    fn release(self) -> impl Future<Output = Result<(), StoreMiddlewareError>> + Send {
        ready(Ok(()))
    }
}

impl SqlConnection for FakeConnection {
    type Cursor<'c> = FakeCursor;

    fn query<'c>(
        &'c mut self,
        statement: &'c str,
        params: &'c [RowValues],
    ) -> impl Future<Output = Result<Self::Cursor<'c>, StoreMiddlewareError>> + Send + 'c {
        let result = match self.store.record(self.id, statement, params) {
            Some(Reply::Rows {
                columns,
                rows,
                fail_after,
            }) => Ok(FakeCursor {
                columns,
                rows: rows.into(),
                fail_after,
                served: 0,
            }),
            Some(Reply::Fail(msg)) => Err(StoreMiddlewareError::StatementError(msg)),
            Some(Reply::Exec(_)) | None => Ok(FakeCursor {
                columns: Vec::new(),
                rows: VecDeque::new(),
                fail_after: None,
                served: 0,
            }),
        };
        ready(result)
    }

    fn exec(
        &mut self,
        statement: &str,
        params: &[RowValues],
    ) -> impl Future<Output = Result<ExecOutcome, StoreMiddlewareError>> + Send {
        let result = match self.store.record(self.id, statement, params) {
            Some(Reply::Exec(outcome)) => Ok(outcome),
            Some(Reply::Fail(msg)) => Err(StoreMiddlewareError::StatementError(msg)),
            Some(Reply::Rows { .. }) | None => Ok(ExecOutcome::default()),
        };
        ready(result)
    }

    fn begin(&mut self) -> impl Future<Output = Result<(), StoreMiddlewareError>> + Send {
        self.store.record(self.id, "START TRANSACTION", &[]);
        ready(Ok(()))
    }

    fn commit(&mut self) -> impl Future<Output = Result<(), StoreMiddlewareError>> + Send {
        self.store.record(self.id, "COMMIT", &[]);
        let fail = self.store.lock().fail_commit;
        ready(if fail {
            Err(StoreMiddlewareError::StatementError(
                "commit rejected".into(),
            ))
        } else {
            Ok(())
        })
    }

    fn rollback(&mut self) -> impl Future<Output = Result<(), StoreMiddlewareError>> + Send {
        self.store.record(self.id, "ROLLBACK", &[]);
        ready(Ok(()))
    }
}

/// `SELECT id, name FROM t WHERE id = ?` answering one (BIGINT, VARCHAR) row.
pub const SELECT_BY_ID: &str = "SELECT id, name FROM t WHERE id = ?";

pub fn script_users(store: &FakeStore) {
    store.script_rows(
        SELECT_BY_ID,
        &[("id", "BIGINT"), ("name", "VARCHAR")],
        vec![vec![cell("5"), cell("alice")]],
    );
}
