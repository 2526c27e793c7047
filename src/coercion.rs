//! Byte-to-value coercion keyed by the store-reported column type.
//!
//! The store client hands back every cell as undecoded bytes. The column's type tag
//! picks a [`TypeFamily`] from a single static table, and the family decides how the
//! bytes are read. Numeric parse failures degrade to the family's zero value instead
//! of failing the query; [`try_coerce`] exposes the failure for callers who want it.

use std::collections::HashMap;
use std::sync::LazyLock;

use thiserror::Error;

use crate::types::RowValues;

/// Coercion classification derived from a column type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeFamily {
    Integer,
    UnsignedWide,
    Text,
    Float,
    Unknown,
}

const TYPE_FAMILIES: &[(&str, TypeFamily)] = &[
    ("BIT", TypeFamily::Integer),
    ("BOOL", TypeFamily::Integer),
    ("BOOLEAN", TypeFamily::Integer),
    ("TINYINT", TypeFamily::Integer),
    ("SMALLINT", TypeFamily::Integer),
    ("MEDIUMINT", TypeFamily::Integer),
    ("INT", TypeFamily::Integer),
    ("INTEGER", TypeFamily::Integer),
    ("BIGINT", TypeFamily::Integer),
    ("UNSIGNED TINYINT", TypeFamily::Integer),
    ("UNSIGNED SMALLINT", TypeFamily::Integer),
    ("UNSIGNED MEDIUMINT", TypeFamily::Integer),
    ("UNSIGNED INT", TypeFamily::Integer),
    ("UNSIGNED BIGINT", TypeFamily::UnsignedWide),
    ("CHAR", TypeFamily::Text),
    ("VARCHAR", TypeFamily::Text),
    ("BINARY", TypeFamily::Text),
    ("VARBINARY", TypeFamily::Text),
    ("TINYTEXT", TypeFamily::Text),
    ("TEXT", TypeFamily::Text),
    ("MEDIUMTEXT", TypeFamily::Text),
    ("LONGTEXT", TypeFamily::Text),
    ("TINY TEXT", TypeFamily::Text),
    ("MEDIUM TEXT", TypeFamily::Text),
    ("LONG TEXT", TypeFamily::Text),
    ("TINYBLOB", TypeFamily::Text),
    ("BLOB", TypeFamily::Text),
    ("MEDIUMBLOB", TypeFamily::Text),
    ("LONGBLOB", TypeFamily::Text),
    ("TINY BLOB", TypeFamily::Text),
    ("MEDIUM BLOB", TypeFamily::Text),
    ("LONG BLOB", TypeFamily::Text),
    ("JSON", TypeFamily::Text),
    ("ENUM", TypeFamily::Text),
    ("SET", TypeFamily::Text),
    ("YEAR", TypeFamily::Text),
    ("DATE", TypeFamily::Text),
    ("TIME", TypeFamily::Text),
    ("TIMESTAMP", TypeFamily::Text),
    ("DATETIME", TypeFamily::Text),
    ("FLOAT", TypeFamily::Float),
    ("DOUBLE", TypeFamily::Float),
    ("DECIMAL", TypeFamily::Float),
];

static FAMILY_LOOKUP: LazyLock<HashMap<&'static str, TypeFamily>> =
    LazyLock::new(|| TYPE_FAMILIES.iter().copied().collect());

/// A numeric cell whose bytes did not parse for its family.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("cannot read {raw:?} as {family:?}")]
pub struct CoercionError {
    pub family: TypeFamily,
    pub raw: String,
}

impl CoercionError {
    /// The value `coerce` substitutes for the failed cell.
    #[must_use]
    pub fn fallback(&self) -> RowValues {
        zero_value(self.family)
    }
}

/// Classify a store type tag. Lookup ignores ASCII case; unknown tags map to
/// [`TypeFamily::Unknown`].
#[must_use]
pub fn classify(source_type_tag: &str) -> TypeFamily {
    if let Some(family) = FAMILY_LOOKUP.get(source_type_tag) {
        return *family;
    }
    let upper = source_type_tag.trim().to_ascii_uppercase();
    FAMILY_LOOKUP
        .get(upper.as_str())
        .copied()
        .unwrap_or(TypeFamily::Unknown)
}

/// Coerce one raw cell, reporting numeric parse failures.
///
/// # Errors
/// Returns `CoercionError` when an integer, unsigned or float cell is not valid
/// base-10 text. Text and unknown families never fail.
pub fn try_coerce(raw: &[u8], source_type_tag: &str) -> Result<RowValues, CoercionError> {
    let family = classify(source_type_tag);
    let text = String::from_utf8_lossy(raw);
    let malformed = || CoercionError {
        family,
        raw: text.to_string(),
    };
    match family {
        TypeFamily::Integer => text.parse::<i64>().map(RowValues::Int).map_err(|_| malformed()),
        TypeFamily::UnsignedWide => text.parse::<u64>().map(RowValues::UInt).map_err(|_| malformed()),
        TypeFamily::Float => text.parse::<f64>().map(RowValues::Float).map_err(|_| malformed()),
        TypeFamily::Text => Ok(RowValues::Text(text.to_string())),
        TypeFamily::Unknown => Ok(RowValues::Absent),
    }
}

/// Coerce one raw cell. Never fails: malformed numbers become the family's zero value.
#[must_use]
pub fn coerce(raw: &[u8], source_type_tag: &str) -> RowValues {
    try_coerce(raw, source_type_tag).unwrap_or_else(|err| {
        tracing::trace!(tag = source_type_tag, "degraded cell: {err}");
        err.fallback()
    })
}

fn zero_value(family: TypeFamily) -> RowValues {
    match family {
        TypeFamily::Integer => RowValues::Int(0),
        TypeFamily::UnsignedWide => RowValues::UInt(0),
        TypeFamily::Float => RowValues::Float(0.0),
        TypeFamily::Text => RowValues::Text(String::new()),
        TypeFamily::Unknown => RowValues::Absent,
    }
}
