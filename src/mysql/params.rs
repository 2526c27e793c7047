use mysql_async::{Params as DriverParams, Value};

use crate::types::RowValues;

/// Positional MySQL parameters converted from `RowValues`.
pub struct Params(Vec<Value>);

impl Params {
    /// Convert from a slice of `RowValues`; `Absent` binds as SQL NULL.
    #[must_use]
    pub fn convert(params: &[RowValues]) -> Self {
        Params(params.iter().map(to_value).collect())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn into_driver(self) -> DriverParams {
        if self.0.is_empty() {
            DriverParams::Empty
        } else {
            DriverParams::Positional(self.0)
        }
    }
}

fn to_value(value: &RowValues) -> Value {
    match value {
        RowValues::Int(i) => Value::Int(*i),
        RowValues::UInt(u) => Value::UInt(*u),
        RowValues::Float(f) => Value::Double(*f),
        RowValues::Text(s) => Value::Bytes(s.as_bytes().to_vec()),
        RowValues::Absent => Value::NULL,
    }
}
