use chrono::{NaiveDate, NaiveDateTime};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Dynamically-typed cell value, also used for statement parameters.
///
/// Decoded rows carry one of these per column; which variant you get depends on the
/// column's source type family, not on the bytes themselves:
/// ```rust
/// use store_middleware::prelude::*;
///
/// let params = vec![RowValues::Int(5), RowValues::Text("alice".into())];
/// assert_eq!(params[0].as_int(), Some(&5));
/// assert!(RowValues::Absent.is_absent());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum RowValues {
    /// Signed integer (integer family)
    Int(i64),
    /// Unsigned integer (unsigned-wide family)
    UInt(u64),
    /// Floating point (single/double/decimal family)
    Float(f64),
    /// Text, blob, JSON, enum/set and temporal columns, passed through unconverted
    Text(String),
    /// Column type the coercion table does not know; as a parameter, SQL NULL
    Absent,
}

impl RowValues {
    #[must_use]
    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    #[must_use]
    pub fn as_int(&self) -> Option<&i64> {
        if let RowValues::Int(value) = self {
            Some(value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_uint(&self) -> Option<u64> {
        match self {
            RowValues::UInt(value) => Some(*value),
            RowValues::Int(value) => u64::try_from(*value).ok(),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_float(&self) -> Option<f64> {
        if let RowValues::Float(value) = self {
            Some(*value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        if let RowValues::Text(value) = self {
            Some(value)
        } else {
            None
        }
    }

    /// `BOOL`/`BIT` columns land in the integer family; 0 and 1 read as booleans.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self.as_int() {
            Some(1) => Some(true),
            Some(0) => Some(false),
            _ => None,
        }
    }

    /// Temporal columns decode as text; parse the common MySQL layouts on demand.
    #[must_use]
    pub fn as_timestamp(&self) -> Option<NaiveDateTime> {
        let s = self.as_text()?;
        // Try "YYYY-MM-DD HH:MM:SS"
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
            return Some(dt);
        }
        // Try "YYYY-MM-DD HH:MM:SS.ffffff"
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f") {
            return Some(dt);
        }
        // DATE columns
        NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
    }

    /// JSON rendering used by [`crate::DecodedRow::to_json`]; `Absent` becomes `null`.
    #[must_use]
    pub fn to_json(&self) -> JsonValue {
        match self {
            RowValues::Int(i) => JsonValue::from(*i),
            RowValues::UInt(u) => JsonValue::from(*u),
            RowValues::Float(f) => serde_json::Number::from_f64(*f)
                .map_or(JsonValue::Null, JsonValue::Number),
            RowValues::Text(s) => JsonValue::String(s.clone()),
            RowValues::Absent => JsonValue::Null,
        }
    }
}

impl From<i64> for RowValues {
    fn from(value: i64) -> Self {
        RowValues::Int(value)
    }
}

impl From<u64> for RowValues {
    fn from(value: u64) -> Self {
        RowValues::UInt(value)
    }
}

impl From<f64> for RowValues {
    fn from(value: f64) -> Self {
        RowValues::Float(value)
    }
}

impl From<&str> for RowValues {
    fn from(value: &str) -> Self {
        RowValues::Text(value.to_owned())
    }
}

impl From<String> for RowValues {
    fn from(value: String) -> Self {
        RowValues::Text(value)
    }
}

impl<T: Into<RowValues>> From<Option<T>> for RowValues {
    fn from(value: Option<T>) -> Self {
        value.map_or(RowValues::Absent, Into::into)
    }
}

/// How a pool hands out transactions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionMode {
    /// One pool-level transaction at a time (`transaction` / `commit` / `rollback` on the pool)
    #[default]
    Strict,
    /// Independent transaction handles from `begin`, each on its own connection
    Relaxed,
}

impl TransactionMode {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            TransactionMode::Strict => "strict",
            TransactionMode::Relaxed => "relaxed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bool_reads_from_integer_family() {
        assert_eq!(RowValues::Int(1).as_bool(), Some(true));
        assert_eq!(RowValues::Int(0).as_bool(), Some(false));
        assert_eq!(RowValues::Int(7).as_bool(), None);
        assert_eq!(RowValues::Text("1".into()).as_bool(), None);
    }

    #[test]
    fn timestamps_parse_from_temporal_text() {
        let dt = RowValues::Text("2024-03-01 12:30:45".into()).as_timestamp();
        assert_eq!(dt.map(|d| d.to_string()).as_deref(), Some("2024-03-01 12:30:45"));

        let frac = RowValues::Text("2024-03-01 12:30:45.250000".into()).as_timestamp();
        assert!(frac.is_some());

        let date = RowValues::Text("2024-03-01".into()).as_timestamp();
        assert_eq!(date.map(|d| d.to_string()).as_deref(), Some("2024-03-01 00:00:00"));

        assert!(RowValues::Int(5).as_timestamp().is_none());
    }

    #[test]
    fn optional_params_become_absent() {
        let none: Option<i64> = None;
        assert_eq!(RowValues::from(none), RowValues::Absent);
        assert_eq!(RowValues::from(Some("bob")), RowValues::Text("bob".into()));
    }

    #[test]
    fn json_rendering() {
        assert_eq!(RowValues::UInt(u64::MAX).to_json(), serde_json::json!(u64::MAX));
        assert_eq!(RowValues::Float(f64::NAN).to_json(), JsonValue::Null);
        assert_eq!(RowValues::Absent.to_json(), JsonValue::Null);
    }
}
