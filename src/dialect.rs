//! Dialect resolution.
//!
//! Maps the configured engine identifier to a [`Dialect`] and picks the
//! array-marshaling strategy for it. The strategy is an explicit value
//! carried by the store handle and consulted at bind/decode time - there is
//! no process-wide install step, so opening several stores with different
//! dialects in one process is safe.

use crate::error::{StoreError, StoreResult};
use serde::{Deserialize, Serialize};

/// Relational engine family in use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// Embedded single-file engine, co-located with the process.
    Sqlite,
    /// Networked server engine.
    Postgres,
}

impl Dialect {
    /// Resolve a configured engine identifier. Unknown identifiers are a
    /// fatal construction error, never retried.
    pub fn from_config_type(db_type: &str) -> StoreResult<Self> {
        match db_type {
            "sqlite" | "sqlite3" => Ok(Self::Sqlite),
            "postgres" | "postgresql" => Ok(Self::Postgres),
            other => Err(StoreError::config(format!(
                "unsupported database type {other:?} (expected \"sqlite\" or \"postgres\")"
            ))),
        }
    }

    /// Embedded engines share the process's fate: there is no network hop
    /// whose failure could self-heal, so retry logic is skipped entirely.
    pub fn is_embedded(self) -> bool {
        matches!(self, Self::Sqlite)
    }

    /// Array-typed columns are stored natively where the engine supports
    /// them and as JSON text otherwise.
    pub fn array_encoding(self) -> ArrayEncoding {
        match self {
            Self::Sqlite => ArrayEncoding::JsonText,
            Self::Postgres => ArrayEncoding::Native,
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Self::Sqlite => "SQLite",
            Self::Postgres => "PostgreSQL",
        }
    }
}

impl std::fmt::Display for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// How list-valued columns are marshaled for the active dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrayEncoding {
    /// Engine-native array columns (`TEXT[]`).
    Native,
    /// JSON array serialized into a `TEXT` column.
    JsonText,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_known_identifiers() {
        assert_eq!(Dialect::from_config_type("sqlite").unwrap(), Dialect::Sqlite);
        assert_eq!(
            Dialect::from_config_type("sqlite3").unwrap(),
            Dialect::Sqlite
        );
        assert_eq!(
            Dialect::from_config_type("postgres").unwrap(),
            Dialect::Postgres
        );
        assert_eq!(
            Dialect::from_config_type("postgresql").unwrap(),
            Dialect::Postgres
        );
    }

    #[test]
    fn test_unknown_identifier_is_config_error() {
        let err = Dialect::from_config_type("mysql").unwrap_err();
        assert!(matches!(err, StoreError::Config { .. }));
    }

    #[test]
    fn test_retry_gate_and_array_strategy() {
        assert!(Dialect::Sqlite.is_embedded());
        assert!(!Dialect::Postgres.is_embedded());
        assert_eq!(Dialect::Sqlite.array_encoding(), ArrayEncoding::JsonText);
        assert_eq!(Dialect::Postgres.array_encoding(), ArrayEncoding::Native);
    }
}
