use std::future::Future;

use mysql_async::consts::{ColumnFlags, ColumnType};
use mysql_async::prelude::Queryable;
use mysql_async::{BinaryProtocol, Column, QueryResult, TextProtocol, Value};

use super::manager::MysqlConnection;
use super::params::Params;
use crate::decode::{ColumnDescriptor, RawRow, RowCursor};
use crate::error::StoreMiddlewareError;
use crate::results::ExecOutcome;
use crate::store::SqlConnection;
use crate::types::RowValues;

/// Charset number MySQL reports for binary string columns.
const BINARY_CHARSET: u16 = 63;

enum Pending<'c> {
    Text(QueryResult<'c, 'static, TextProtocol>),
    Binary(QueryResult<'c, 'static, BinaryProtocol>),
}

/// Streams the rows of one MySQL result set.
pub struct MysqlCursor<'c> {
    pending: Pending<'c>,
    columns: Vec<ColumnDescriptor>,
    column_types: Vec<ColumnType>,
    exhausted: bool,
}

impl<'c> MysqlCursor<'c> {
    fn new(pending: Pending<'c>) -> Self {
        let driver_columns = match &pending {
            Pending::Text(result) => result.columns_ref(),
            Pending::Binary(result) => result.columns_ref(),
        };
        let columns = driver_columns
            .iter()
            .map(|col| ColumnDescriptor::new(col.name_str(), type_tag(col)))
            .collect();
        let column_types = driver_columns.iter().map(Column::column_type).collect();
        Self {
            pending,
            columns,
            column_types,
            exhausted: false,
        }
    }
}

impl RowCursor for MysqlCursor<'_> {
    fn columns(&self) -> &[ColumnDescriptor] {
        &self.columns
    }

    async fn next_row(&mut self) -> Result<Option<RawRow>, StoreMiddlewareError> {
        if self.exhausted {
            return Ok(None);
        }
        let next = match &mut self.pending {
            Pending::Text(result) => result.next().await,
            Pending::Binary(result) => result.next().await,
        }
        .map_err(|e| StoreMiddlewareError::CursorError(format!("MySQL row read failed: {e}")))?;

        let Some(row) = next else {
            // later result sets of a multi-statement query are drained on release
            self.exhausted = true;
            return Ok(None);
        };
        let raw = row
            .unwrap()
            .into_iter()
            .enumerate()
            .map(|(idx, value)| {
                let column_type = self
                    .column_types
                    .get(idx)
                    .copied()
                    .unwrap_or(ColumnType::MYSQL_TYPE_VAR_STRING);
                cell_bytes(value, column_type)
            })
            .collect();
        Ok(Some(raw))
    }

    async fn release(self) -> Result<(), StoreMiddlewareError> {
        let released = match self.pending {
            Pending::Text(result) => result.drop_result().await,
            Pending::Binary(result) => result.drop_result().await,
        };
        released.map_err(|e| {
            StoreMiddlewareError::CursorError(format!("MySQL result release failed: {e}"))
        })
    }
}

impl SqlConnection for MysqlConnection {
    type Cursor<'c> = MysqlCursor<'c>;

    fn query<'c>(
        &'c mut self,
        statement: &'c str,
        params: &'c [RowValues],
    ) -> impl Future<Output = Result<Self::Cursor<'c>, StoreMiddlewareError>> + Send + 'c {
        async move {
            let pending = if params.is_empty() {
                Pending::Text(
                    self.conn
                        .query_iter(statement)
                        .await
                        .map_err(statement_error)?,
                )
            } else {
                let params = Params::convert(params).into_driver();
                Pending::Binary(
                    self.conn
                        .exec_iter(statement, params)
                        .await
                        .map_err(statement_error)?,
                )
            };
            Ok(MysqlCursor::new(pending))
        }
    }

    async fn exec(
        &mut self,
        statement: &str,
        params: &[RowValues],
    ) -> Result<ExecOutcome, StoreMiddlewareError> {
        let done = if params.is_empty() {
            self.conn.query_drop(statement).await
        } else {
            let params = Params::convert(params).into_driver();
            self.conn.exec_drop(statement, params).await
        };
        done.map_err(statement_error)?;

        Ok(ExecOutcome {
            rows_affected: self.conn.affected_rows(),
            last_insert_id: self.conn.last_insert_id().unwrap_or(0),
        })
    }

    async fn begin(&mut self) -> Result<(), StoreMiddlewareError> {
        self.conn
            .query_drop("START TRANSACTION")
            .await
            .map_err(statement_error)
    }

    async fn commit(&mut self) -> Result<(), StoreMiddlewareError> {
        self.conn.query_drop("COMMIT").await.map_err(statement_error)
    }

    async fn rollback(&mut self) -> Result<(), StoreMiddlewareError> {
        self.conn.query_drop("ROLLBACK").await.map_err(statement_error)
    }
}

fn statement_error(e: mysql_async::Error) -> StoreMiddlewareError {
    StoreMiddlewareError::StatementError(format!("MySQL statement failed: {e}"))
}

/// Source type tag for a column, in the spelling the coercion table uses.
pub(crate) fn type_tag(col: &Column) -> &'static str {
    let flags = col.flags();
    let binary = col.character_set() == BINARY_CHARSET;
    let unsigned = flags.contains(ColumnFlags::UNSIGNED_FLAG);
    integer_tag(col.column_type(), unsigned)
        .unwrap_or_else(|| other_tag(col.column_type(), flags, binary))
}

fn integer_tag(column_type: ColumnType, unsigned: bool) -> Option<&'static str> {
    let tag = match (column_type, unsigned) {
        (ColumnType::MYSQL_TYPE_TINY, false) => "TINYINT",
        (ColumnType::MYSQL_TYPE_TINY, true) => "UNSIGNED TINYINT",
        (ColumnType::MYSQL_TYPE_SHORT, false) => "SMALLINT",
        (ColumnType::MYSQL_TYPE_SHORT, true) => "UNSIGNED SMALLINT",
        (ColumnType::MYSQL_TYPE_INT24, false) => "MEDIUMINT",
        (ColumnType::MYSQL_TYPE_INT24, true) => "UNSIGNED MEDIUMINT",
        (ColumnType::MYSQL_TYPE_LONG, false) => "INT",
        (ColumnType::MYSQL_TYPE_LONG, true) => "UNSIGNED INT",
        (ColumnType::MYSQL_TYPE_LONGLONG, false) => "BIGINT",
        (ColumnType::MYSQL_TYPE_LONGLONG, true) => "UNSIGNED BIGINT",
        _ => return None,
    };
    Some(tag)
}

fn other_tag(column_type: ColumnType, flags: ColumnFlags, binary: bool) -> &'static str {
    match column_type {
        ColumnType::MYSQL_TYPE_BIT => "BIT",
        ColumnType::MYSQL_TYPE_FLOAT => "FLOAT",
        ColumnType::MYSQL_TYPE_DOUBLE => "DOUBLE",
        ColumnType::MYSQL_TYPE_DECIMAL | ColumnType::MYSQL_TYPE_NEWDECIMAL => "DECIMAL",
        ColumnType::MYSQL_TYPE_YEAR => "YEAR",
        ColumnType::MYSQL_TYPE_DATE | ColumnType::MYSQL_TYPE_NEWDATE => "DATE",
        ColumnType::MYSQL_TYPE_TIME | ColumnType::MYSQL_TYPE_TIME2 => "TIME",
        ColumnType::MYSQL_TYPE_DATETIME | ColumnType::MYSQL_TYPE_DATETIME2 => "DATETIME",
        ColumnType::MYSQL_TYPE_TIMESTAMP | ColumnType::MYSQL_TYPE_TIMESTAMP2 => "TIMESTAMP",
        ColumnType::MYSQL_TYPE_JSON => "JSON",
        ColumnType::MYSQL_TYPE_ENUM => "ENUM",
        ColumnType::MYSQL_TYPE_SET => "SET",
        ColumnType::MYSQL_TYPE_GEOMETRY => "GEOMETRY",
        ColumnType::MYSQL_TYPE_NULL => "NULL",
        ColumnType::MYSQL_TYPE_TINY_BLOB if binary => "TINYBLOB",
        ColumnType::MYSQL_TYPE_TINY_BLOB => "TINYTEXT",
        ColumnType::MYSQL_TYPE_MEDIUM_BLOB if binary => "MEDIUMBLOB",
        ColumnType::MYSQL_TYPE_MEDIUM_BLOB => "MEDIUMTEXT",
        ColumnType::MYSQL_TYPE_LONG_BLOB if binary => "LONGBLOB",
        ColumnType::MYSQL_TYPE_LONG_BLOB => "LONGTEXT",
        ColumnType::MYSQL_TYPE_BLOB if binary => "BLOB",
        ColumnType::MYSQL_TYPE_BLOB => "TEXT",
        ColumnType::MYSQL_TYPE_STRING | ColumnType::MYSQL_TYPE_VAR_STRING
            if flags.contains(ColumnFlags::ENUM_FLAG) =>
        {
            "ENUM"
        }
        ColumnType::MYSQL_TYPE_STRING | ColumnType::MYSQL_TYPE_VAR_STRING
            if flags.contains(ColumnFlags::SET_FLAG) =>
        {
            "SET"
        }
        ColumnType::MYSQL_TYPE_STRING if binary => "BINARY",
        ColumnType::MYSQL_TYPE_STRING => "CHAR",
        ColumnType::MYSQL_TYPE_VARCHAR | ColumnType::MYSQL_TYPE_VAR_STRING if binary => {
            "VARBINARY"
        }
        ColumnType::MYSQL_TYPE_VARCHAR | ColumnType::MYSQL_TYPE_VAR_STRING => "VARCHAR",
        _ => "",
    }
}

/// Render one driver value as the undecoded bytes the coercion table expects.
///
/// The text protocol already yields bytes; the binary protocol yields typed values,
/// which are written back out in MySQL's own text layout.
pub(crate) fn cell_bytes(value: Value, column_type: ColumnType) -> Option<Vec<u8>> {
    let text = match value {
        Value::NULL => return None,
        Value::Bytes(bytes) if column_type == ColumnType::MYSQL_TYPE_BIT => {
            bit_value(&bytes).to_string()
        }
        Value::Bytes(bytes) => return Some(bytes),
        Value::Int(i) => i.to_string(),
        Value::UInt(u) => u.to_string(),
        Value::Float(f) => f.to_string(),
        Value::Double(d) => d.to_string(),
        Value::Date(year, month, day, hour, minute, second, micros) => {
            if matches!(
                column_type,
                ColumnType::MYSQL_TYPE_DATE | ColumnType::MYSQL_TYPE_NEWDATE
            ) {
                format!("{year:04}-{month:02}-{day:02}")
            } else {
                let mut s = format!(
                    "{year:04}-{month:02}-{day:02} {hour:02}:{minute:02}:{second:02}"
                );
                push_micros(&mut s, micros);
                s
            }
        }
        Value::Time(negative, days, hours, minutes, seconds, micros) => {
            let sign = if negative { "-" } else { "" };
            let hours = days * 24 + u32::from(hours);
            let mut s = format!("{sign}{hours:02}:{minutes:02}:{seconds:02}");
            push_micros(&mut s, micros);
            s
        }
    };
    Some(text.into_bytes())
}

fn push_micros(s: &mut String, micros: u32) {
    if micros > 0 {
        s.push_str(&format!(".{micros:06}"));
    }
}

/// BIT(n) arrives as big-endian bytes.
fn bit_value(bytes: &[u8]) -> u64 {
    bytes
        .iter()
        .fold(0u64, |acc, b| (acc << 8) | u64::from(*b))
}
