//! Turns a store cursor of raw cells into a [`ResultSet`].

use std::collections::HashMap;
use std::future::Future;

use crate::coercion::coerce;
use crate::error::StoreMiddlewareError;
use crate::results::ResultSet;
use crate::types::RowValues;

/// Name and store-reported type of one result column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDescriptor {
    pub name: String,
    pub source_type_tag: String,
}

impl ColumnDescriptor {
    #[must_use]
    pub fn new(name: impl Into<String>, source_type_tag: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source_type_tag: source_type_tag.into(),
        }
    }
}

/// One row as the store sent it: an undecoded buffer per column, `None` for SQL NULL.
pub type RawRow = Vec<Option<Vec<u8>>>;

/// Single-pass streaming handle over a result set.
pub trait RowCursor: Send {
    /// Column metadata, fixed for the life of the cursor.
    fn columns(&self) -> &[ColumnDescriptor];

    /// Next row, `Ok(None)` once the result set is exhausted.
    fn next_row(
        &mut self,
    ) -> impl Future<Output = Result<Option<RawRow>, StoreMiddlewareError>> + Send;

    /// Release the cursor and whatever it holds on the connection.
    fn release(self) -> impl Future<Output = Result<(), StoreMiddlewareError>> + Send;
}

/// Maps cursor columns onto unique row slots. A repeated column name reuses the
/// first slot, so the right-most value wins.
struct ColumnPlan {
    names: Vec<String>,
    tags: Vec<String>,
    slots: Vec<usize>,
}

impl ColumnPlan {
    fn new(columns: &[ColumnDescriptor]) -> Self {
        let mut names = Vec::with_capacity(columns.len());
        let mut seen: HashMap<&str, usize> = HashMap::with_capacity(columns.len());
        let mut slots = Vec::with_capacity(columns.len());
        for col in columns {
            let slot = *seen.entry(col.name.as_str()).or_insert_with(|| {
                names.push(col.name.clone());
                names.len() - 1
            });
            slots.push(slot);
        }
        Self {
            names,
            tags: columns.iter().map(|c| c.source_type_tag.clone()).collect(),
            slots,
        }
    }
}

/// Drain `cursor` into a [`ResultSet`], coercing each cell by its column's type tag.
///
/// The cursor is released on every path. A cursor error discards all rows decoded so
/// far; malformed cells never fail the call (see [`crate::coercion::coerce`]). SQL NULL
/// cells are coerced as an empty payload.
///
/// # Errors
/// Returns the cursor's error, a `CursorError` for a row whose width disagrees with
/// the column metadata, or the release error when draining succeeded.
pub async fn decode<C: RowCursor>(mut cursor: C) -> Result<ResultSet, StoreMiddlewareError> {
    let drained = drain(&mut cursor).await;
    let released = cursor.release().await;
    let result_set = drained?;
    released?;
    Ok(result_set)
}

async fn drain<C: RowCursor>(cursor: &mut C) -> Result<ResultSet, StoreMiddlewareError> {
    let plan = ColumnPlan::new(cursor.columns());
    let mut result_set = ResultSet::with_columns(plan.names.clone());

    while let Some(raw) = cursor.next_row().await? {
        if raw.len() != plan.slots.len() {
            return Err(StoreMiddlewareError::CursorError(format!(
                "row has {} cells but the result declares {} columns",
                raw.len(),
                plan.slots.len()
            )));
        }
        let mut values = vec![RowValues::Absent; plan.names.len()];
        for (idx, cell) in raw.iter().enumerate() {
            values[plan.slots[idx]] = coerce(cell.as_deref().unwrap_or_default(), &plan.tags[idx]);
        }
        result_set.add_row_values(values);
    }

    Ok(result_set)
}
