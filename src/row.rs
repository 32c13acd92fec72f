//! Row decoding and parameter binding.
//!
//! [`StoreRow`] presents one row of tabular result with a dialect-uniform
//! surface, and [`Scannable`] is the contract façades use to populate typed
//! records from it. [`StoreValue`] is the matching closed set of bind values;
//! the per-dialect bind functions live here so array marshaling stays in one
//! place.

use crate::dialect::ArrayEncoding;
use crate::error::{StoreError, StoreResult};
use sqlx::postgres::{PgArguments, PgRow};
use sqlx::sqlite::{SqliteArguments, SqliteRow};
use sqlx::{Postgres, Row, Sqlite};

/// A value bound to a query placeholder.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreValue {
    Null,
    Bool(bool),
    Int(i64),
    Text(String),
    Bytes(Vec<u8>),
    TextArray(Vec<String>),
}

impl StoreValue {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    /// `None` binds SQL NULL.
    pub fn opt_text(value: Option<impl Into<String>>) -> Self {
        match value {
            Some(v) => Self::Text(v.into()),
            None => Self::Null,
        }
    }

    pub fn int(value: i64) -> Self {
        Self::Int(value)
    }

    pub fn opt_int(value: Option<i64>) -> Self {
        match value {
            Some(v) => Self::Int(v),
            None => Self::Null,
        }
    }

    pub fn bool(value: bool) -> Self {
        Self::Bool(value)
    }

    pub fn bytes(value: impl Into<Vec<u8>>) -> Self {
        Self::Bytes(value.into())
    }

    pub fn array(values: impl Into<Vec<String>>) -> Self {
        Self::TextArray(values.into())
    }
}

/// Serialize a string list as a JSON array. Infallible: JSON strings cannot
/// fail to serialize.
fn json_array(items: &[String]) -> String {
    serde_json::Value::Array(
        items
            .iter()
            .map(|s| serde_json::Value::String(s.clone()))
            .collect(),
    )
    .to_string()
}

/// Bind a value to a SQLite query. SQLite has no native arrays, lists are
/// stored as JSON text.
pub(crate) fn bind_sqlite_value<'q>(
    query: sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>>,
    value: &'q StoreValue,
) -> sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>> {
    match value {
        StoreValue::Null => query.bind(None::<String>),
        StoreValue::Bool(v) => query.bind(*v),
        StoreValue::Int(v) => query.bind(*v),
        StoreValue::Text(v) => query.bind(v.as_str()),
        StoreValue::Bytes(v) => query.bind(v.as_slice()),
        StoreValue::TextArray(v) => query.bind(json_array(v)),
    }
}

/// Bind a value to a PostgreSQL query, marshaling arrays per the handle's
/// strategy.
pub(crate) fn bind_postgres_value<'q>(
    query: sqlx::query::Query<'q, Postgres, PgArguments>,
    value: &'q StoreValue,
    arrays: ArrayEncoding,
) -> sqlx::query::Query<'q, Postgres, PgArguments> {
    match value {
        StoreValue::Null => query.bind(None::<String>),
        StoreValue::Bool(v) => query.bind(*v),
        StoreValue::Int(v) => query.bind(*v),
        StoreValue::Text(v) => query.bind(v.as_str()),
        StoreValue::Bytes(v) => query.bind(v.as_slice()),
        StoreValue::TextArray(v) => match arrays {
            ArrayEncoding::Native => query.bind(v.clone()),
            ArrayEncoding::JsonText => query.bind(json_array(v)),
        },
    }
}

enum RowInner {
    Sqlite(SqliteRow),
    Postgres(PgRow),
}

/// One row of tabular result, independent of the dialect that produced it.
pub struct StoreRow {
    inner: RowInner,
    arrays: ArrayEncoding,
}

impl StoreRow {
    pub(crate) fn sqlite(row: SqliteRow, arrays: ArrayEncoding) -> Self {
        Self {
            inner: RowInner::Sqlite(row),
            arrays,
        }
    }

    pub(crate) fn postgres(row: PgRow, arrays: ArrayEncoding) -> Self {
        Self {
            inner: RowInner::Postgres(row),
            arrays,
        }
    }

    pub fn get_str(&self, column: &str) -> StoreResult<String> {
        match &self.inner {
            RowInner::Sqlite(row) => Ok(row.try_get(column)?),
            RowInner::Postgres(row) => Ok(row.try_get(column)?),
        }
    }

    pub fn get_opt_str(&self, column: &str) -> StoreResult<Option<String>> {
        match &self.inner {
            RowInner::Sqlite(row) => Ok(row.try_get(column)?),
            RowInner::Postgres(row) => Ok(row.try_get(column)?),
        }
    }

    pub fn get_i64(&self, column: &str) -> StoreResult<i64> {
        match &self.inner {
            RowInner::Sqlite(row) => Ok(row.try_get(column)?),
            RowInner::Postgres(row) => Ok(row.try_get(column)?),
        }
    }

    pub fn get_opt_i64(&self, column: &str) -> StoreResult<Option<i64>> {
        match &self.inner {
            RowInner::Sqlite(row) => Ok(row.try_get(column)?),
            RowInner::Postgres(row) => Ok(row.try_get(column)?),
        }
    }

    pub fn get_bool(&self, column: &str) -> StoreResult<bool> {
        match &self.inner {
            RowInner::Sqlite(row) => Ok(row.try_get(column)?),
            RowInner::Postgres(row) => Ok(row.try_get(column)?),
        }
    }

    pub fn get_bytes(&self, column: &str) -> StoreResult<Vec<u8>> {
        match &self.inner {
            RowInner::Sqlite(row) => Ok(row.try_get(column)?),
            RowInner::Postgres(row) => Ok(row.try_get(column)?),
        }
    }

    /// Decode a list-valued column. NULL decodes as an empty list.
    pub fn get_str_array(&self, column: &str) -> StoreResult<Vec<String>> {
        match &self.inner {
            RowInner::Sqlite(row) => {
                let raw: Option<String> = row.try_get(column)?;
                decode_json_array(column, raw)
            }
            RowInner::Postgres(row) => match self.arrays {
                ArrayEncoding::Native => {
                    let values: Option<Vec<String>> = row.try_get(column)?;
                    Ok(values.unwrap_or_default())
                }
                ArrayEncoding::JsonText => {
                    let raw: Option<String> = row.try_get(column)?;
                    decode_json_array(column, raw)
                }
            },
        }
    }
}

fn decode_json_array(column: &str, raw: Option<String>) -> StoreResult<Vec<String>> {
    match raw {
        None => Ok(Vec::new()),
        Some(raw) => serde_json::from_str(&raw).map_err(|e| {
            StoreError::decode(format!("column {column} is not a JSON string array: {e}"))
        }),
    }
}

/// Capability to populate typed fields from one row of tabular result.
///
/// Implemented once per record type; works against either dialect because
/// [`StoreRow`] hides the engine-specific row behind typed accessors.
pub trait Scannable: Sized {
    fn scan(row: &StoreRow) -> StoreResult<Self>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_array_round_trip() {
        let items = vec!["a".to_string(), "b\"quoted\"".to_string()];
        let encoded = json_array(&items);
        let decoded: Vec<String> = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, items);
    }

    #[test]
    fn test_decode_json_array_null_is_empty() {
        assert_eq!(decode_json_array("tags", None).unwrap(), Vec::<String>::new());
    }

    #[test]
    fn test_decode_json_array_rejects_non_array() {
        let err = decode_json_array("tags", Some("{\"a\":1}".to_string())).unwrap_err();
        assert!(matches!(err, StoreError::Decode { .. }));
    }

    #[test]
    fn test_opt_helpers_map_none_to_null() {
        assert_eq!(StoreValue::opt_text(None::<String>), StoreValue::Null);
        assert_eq!(StoreValue::opt_int(None), StoreValue::Null);
        assert_eq!(
            StoreValue::opt_text(Some("x")),
            StoreValue::Text("x".to_string())
        );
    }
}
