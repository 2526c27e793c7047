use std::collections::HashMap;
use std::sync::Arc;

use super::row::{DecodedRow, build_column_index};
use crate::types::RowValues;

/// Ordered rows from a single pass over a cursor.
///
/// All rows share one column-name list and one lookup index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultSet {
    /// The decoded rows, in cursor order
    pub results: Vec<DecodedRow>,
    column_names: Arc<Vec<String>>,
    column_index: Arc<HashMap<String, usize>>,
}

impl ResultSet {
    /// Create an empty result set for the given (already de-duplicated) column names.
    #[must_use]
    pub fn with_columns(column_names: Vec<String>) -> Self {
        let column_index = Arc::new(build_column_index(&column_names));
        Self {
            results: Vec::new(),
            column_names: Arc::new(column_names),
            column_index,
        }
    }

    /// Column names shared by every row
    #[must_use]
    pub fn column_names(&self) -> &[String] {
        &self.column_names
    }

    /// Append a row; `values` must line up with [`Self::column_names`].
    pub fn add_row_values(&mut self, values: Vec<RowValues>) {
        debug_assert_eq!(values.len(), self.column_names.len());
        self.results.push(DecodedRow::with_index(
            Arc::clone(&self.column_names),
            values,
            Arc::clone(&self.column_index),
        ));
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.results.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DecodedRow> {
        self.results.iter()
    }

    /// Take the single row, or report how many there were.
    ///
    /// # Errors
    /// `NotFound` for zero rows, `TooManyRows` for more than one.
    pub fn into_single_row(self) -> Result<DecodedRow, crate::StoreMiddlewareError> {
        let count = self.results.len();
        match count {
            0 => Err(crate::StoreMiddlewareError::NotFound),
            1 => self
                .results
                .into_iter()
                .next()
                .ok_or(crate::StoreMiddlewareError::NotFound),
            _ => Err(crate::StoreMiddlewareError::TooManyRows(count)),
        }
    }
}

impl IntoIterator for ResultSet {
    type Item = DecodedRow;
    type IntoIter = std::vec::IntoIter<DecodedRow>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.into_iter()
    }
}

impl<'a> IntoIterator for &'a ResultSet {
    type Item = &'a DecodedRow;
    type IntoIter = std::slice::Iter<'a, DecodedRow>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.iter()
    }
}
