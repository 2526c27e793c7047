//! Decoded query output: rows as ordered name -> value mappings.

mod result_set;
mod row;

pub use result_set::ResultSet;
pub use row::DecodedRow;

/// Mutation outcome reported by the store for an `exec`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecOutcome {
    /// Rows changed by the statement
    pub rows_affected: u64,
    /// Identity generated by the statement; 0 when the store reported none
    pub last_insert_id: u64,
}
