//! Error types for the bridge store.
//!
//! All failures surface as [`StoreError`] via `thiserror`. Retry
//! classification is a closed-kind check: the [`ErrorKind`] is derived exactly
//! once when a `sqlx::Error` crosses into this crate, and [`classify`] matches
//! on that kind rather than inspecting driver internals at every call site.

use thiserror::Error;

/// SQLSTATE class "connection exception".
pub const CLASS_CONNECTION_EXCEPTION: &str = "08";
/// SQLSTATE class "insufficient resources" (e.g. too many connections).
pub const CLASS_INSUFFICIENT_RESOURCES: &str = "53";
/// SQLSTATE class "operator intervention" (e.g. server restart).
pub const CLASS_OPERATOR_INTERVENTION: &str = "57";

/// Failure kind used for retry classification.
///
/// Derived once in `From<sqlx::Error>`; the first three kinds correspond to
/// the SQLSTATE classes above, `Transport` means the call to the server
/// failed before the engine could answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    ConnectionException,
    InsufficientResources,
    OperatorIntervention,
    Transport,
    Other,
}

impl ErrorKind {
    /// Map a SQLSTATE code to a kind by its two-character class.
    pub fn from_sqlstate(code: Option<&str>) -> Self {
        let class = match code.and_then(|c| c.get(..2)) {
            Some(class) => class,
            None => return Self::Other,
        };
        match class {
            CLASS_CONNECTION_EXCEPTION => Self::ConnectionException,
            CLASS_INSUFFICIENT_RESOURCES => Self::InsufficientResources,
            CLASS_OPERATOR_INTERVENTION => Self::OperatorIntervention,
            _ => Self::Other,
        }
    }

    /// Whether a failure of this kind is expected to self-resolve.
    pub fn is_retryable(self) -> bool {
        !matches!(self, Self::Other)
    }
}

/// Verdict of the error classifier: retry the operation or surface the error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    Retry,
    Stop,
}

#[derive(Error, Debug)]
pub enum StoreError {
    /// Bad configuration (engine identifier, connection URI, duration
    /// strings). Fatal at startup, never retried.
    #[error("Invalid store configuration: {message}")]
    Config { message: String },

    /// The store layer rejected or failed an operation.
    #[error("Database error: {message}")]
    Query {
        message: String,
        /// SQLSTATE code as reported by the engine, when available.
        sql_state: Option<String>,
        kind: ErrorKind,
    },

    /// A row was fetched but could not be decoded into the target type.
    #[error("Failed to decode row: {message}")]
    Decode { message: String },

    /// The schema migrator failed to bring the database up to date.
    #[error("Schema migration failed: {message}")]
    Migration { message: String },
}

impl StoreError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a query error with an explicit kind and no SQLSTATE.
    pub fn query(message: impl Into<String>, kind: ErrorKind) -> Self {
        Self::Query {
            message: message.into(),
            sql_state: None,
            kind,
        }
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    pub fn migration(message: impl Into<String>) -> Self {
        Self::Migration {
            message: message.into(),
        }
    }
}

/// Decide whether a store failure is safe to retry.
///
/// Engine-reported errors retry only for the connection-exception,
/// insufficient-resources and operator-intervention classes; transport
/// failures always retry; everything else indicates a logic or data problem
/// that will not self-heal. The decision is dialect-independent — gating on
/// the embedded dialect happens in the retry controller.
pub fn classify(err: &StoreError) -> RetryDecision {
    match err {
        StoreError::Query { kind, .. } if kind.is_retryable() => RetryDecision::Retry,
        _ => RetryDecision::Stop,
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Configuration(msg) => StoreError::config(msg.to_string()),
            sqlx::Error::Database(db_err) => {
                let code = db_err.code().map(|c| c.to_string());
                StoreError::Query {
                    message: db_err.message().to_string(),
                    kind: ErrorKind::from_sqlstate(code.as_deref()),
                    sql_state: code,
                }
            }
            // The network call itself failed; the engine never saw the query.
            sqlx::Error::Io(io_err) => {
                StoreError::query(format!("I/O error: {io_err}"), ErrorKind::Transport)
            }
            sqlx::Error::Tls(tls_err) => {
                StoreError::query(format!("TLS error: {tls_err}"), ErrorKind::Transport)
            }
            sqlx::Error::Protocol(msg) => {
                StoreError::query(format!("Protocol error: {msg}"), ErrorKind::Transport)
            }
            sqlx::Error::PoolTimedOut => StoreError::query(
                "Timed out acquiring a connection from the pool",
                ErrorKind::Transport,
            ),
            sqlx::Error::PoolClosed => {
                StoreError::query("Connection pool is closed", ErrorKind::Transport)
            }
            sqlx::Error::RowNotFound => StoreError::query("No rows returned", ErrorKind::Other),
            sqlx::Error::TypeNotFound { type_name } => {
                StoreError::decode(format!("Type not found: {type_name}"))
            }
            sqlx::Error::ColumnNotFound(col) => {
                StoreError::decode(format!("Column not found: {col}"))
            }
            sqlx::Error::ColumnIndexOutOfBounds { index, len } => {
                StoreError::decode(format!("Column index {index} out of bounds (len: {len})"))
            }
            sqlx::Error::ColumnDecode { index, source } => {
                StoreError::decode(format!("Failed to decode column {index}: {source}"))
            }
            sqlx::Error::Decode(source) => StoreError::decode(format!("Decode error: {source}")),
            sqlx::Error::WorkerCrashed => {
                StoreError::query("Database worker crashed", ErrorKind::Transport)
            }
            _ => StoreError::query(format!("Unknown database error: {err}"), ErrorKind::Other),
        }
    }
}

/// Result type alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn query_err(sql_state: &str) -> StoreError {
        StoreError::Query {
            message: "test".to_string(),
            sql_state: Some(sql_state.to_string()),
            kind: ErrorKind::from_sqlstate(Some(sql_state)),
        }
    }

    #[test]
    fn test_retryable_sqlstate_classes() {
        // Connection exception, e.g. connection_failure
        assert_eq!(classify(&query_err("08006")), RetryDecision::Retry);
        // Insufficient resources, e.g. too_many_connections
        assert_eq!(classify(&query_err("53300")), RetryDecision::Retry);
        // Operator intervention, e.g. admin_shutdown
        assert_eq!(classify(&query_err("57P01")), RetryDecision::Retry);
    }

    #[test]
    fn test_non_retryable_sqlstate_classes() {
        // string_data_right_truncation
        assert_eq!(classify(&query_err("22001")), RetryDecision::Stop);
        // syntax_error
        assert_eq!(classify(&query_err("42601")), RetryDecision::Stop);
        // unique_violation
        assert_eq!(classify(&query_err("23505")), RetryDecision::Stop);
    }

    #[test]
    fn test_transport_failures_always_retry() {
        let err = StoreError::query("connection reset by peer", ErrorKind::Transport);
        assert_eq!(classify(&err), RetryDecision::Retry);
    }

    #[test]
    fn test_config_decode_migration_never_retry() {
        assert_eq!(classify(&StoreError::config("bad uri")), RetryDecision::Stop);
        assert_eq!(classify(&StoreError::decode("bad row")), RetryDecision::Stop);
        assert_eq!(
            classify(&StoreError::migration("v4 failed")),
            RetryDecision::Stop
        );
    }

    #[test]
    fn test_kind_from_sqlstate_edge_cases() {
        assert_eq!(ErrorKind::from_sqlstate(None), ErrorKind::Other);
        assert_eq!(ErrorKind::from_sqlstate(Some("")), ErrorKind::Other);
        assert_eq!(ErrorKind::from_sqlstate(Some("5")), ErrorKind::Other);
        // SQLite numeric codes never match a SQLSTATE class
        assert_eq!(ErrorKind::from_sqlstate(Some("1555")), ErrorKind::Other);
        assert_eq!(
            ErrorKind::from_sqlstate(Some("08001")),
            ErrorKind::ConnectionException
        );
    }

    #[test]
    fn test_error_display() {
        let err = StoreError::config("unsupported database type foo");
        assert!(err.to_string().contains("Invalid store configuration"));
    }
}
