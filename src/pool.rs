//! Connection pool management.
//!
//! [`StoreHandle`] is the single owned resource for the process: the pooled
//! connection, the resolved dialect and the array-marshaling strategy.
//! Dialect-specific pools are used instead of `AnyPool` to keep full type
//! support; the handle hides the split behind uniform execute/fetch helpers.
//!
//! Pool construction is lazy - no connection is established until the first
//! query, so a handle can be built while the server is still coming up. The
//! first real query classifies any reachability failure like any other store
//! error.

use crate::config::StoreConfig;
use crate::dialect::{ArrayEncoding, Dialect};
use crate::error::{StoreError, StoreResult};
use crate::row::{Scannable, StoreRow, StoreValue, bind_postgres_value, bind_sqlite_value};
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use tracing::{debug, info};

/// Dialect-specific connection pool.
#[derive(Debug, Clone)]
pub enum DbPool {
    Sqlite(SqlitePool),
    Postgres(PgPool),
}

/// The open connection pool plus its resolved dialect.
///
/// Created once at startup and shared (via `Arc`) by every query façade;
/// dialect and array strategy are immutable after construction.
#[derive(Debug)]
pub struct StoreHandle {
    pool: DbPool,
    dialect: Dialect,
    arrays: ArrayEncoding,
}

impl StoreHandle {
    /// Open a pooled handle for the configured engine.
    ///
    /// Applies the pool-wide limits exactly once; duration strings that fail
    /// to parse and unknown engine identifiers are fatal here, before any
    /// pool exists.
    pub fn new(config: &StoreConfig) -> StoreResult<Self> {
        let dialect = Dialect::from_config_type(&config.db_type)?;
        let idle_timeout = config.conn_max_idle_time()?;
        let max_lifetime = config.conn_max_lifetime()?;
        let max_open = config.max_open_conns_or_default();
        let max_idle = config.max_idle_conns_or_default();

        let pool = match dialect {
            Dialect::Sqlite => {
                let options = SqliteConnectOptions::from_str(&config.uri)
                    .map_err(|e| {
                        StoreError::config(format!("invalid SQLite connection URI: {e}"))
                    })?
                    .create_if_missing(true)
                    .foreign_keys(true);
                DbPool::Sqlite(
                    SqlitePoolOptions::new()
                        .max_connections(max_open)
                        .min_connections(max_idle)
                        .idle_timeout(idle_timeout)
                        .max_lifetime(max_lifetime)
                        .connect_lazy_with(options),
                )
            }
            Dialect::Postgres => {
                // The URI carries credentials, keep it out of error text
                // where the driver doesn't already sanitize it.
                let options = PgConnectOptions::from_str(&config.uri).map_err(|e| {
                    StoreError::config(format!("invalid PostgreSQL connection URI: {e}"))
                })?;
                DbPool::Postgres(
                    PgPoolOptions::new()
                        .max_connections(max_open)
                        .min_connections(max_idle)
                        .idle_timeout(idle_timeout)
                        .max_lifetime(max_lifetime)
                        .connect_lazy_with(options),
                )
            }
        };

        info!(
            dialect = %dialect,
            max_open_conns = max_open,
            max_idle_conns = max_idle,
            "Opened store handle"
        );

        Ok(Self {
            pool,
            dialect,
            arrays: dialect.array_encoding(),
        })
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn array_encoding(&self) -> ArrayEncoding {
        self.arrays
    }

    /// Execute a statement, returning the number of affected rows.
    pub async fn execute(&self, sql: &str, params: &[StoreValue]) -> StoreResult<u64> {
        debug!(sql, params = params.len(), "Executing statement");
        match &self.pool {
            DbPool::Sqlite(pool) => {
                let mut query = sqlx::query(sql);
                for value in params {
                    query = bind_sqlite_value(query, value);
                }
                Ok(query.execute(pool).await?.rows_affected())
            }
            DbPool::Postgres(pool) => {
                let mut query = sqlx::query(sql);
                for value in params {
                    query = bind_postgres_value(query, value, self.arrays);
                }
                Ok(query.execute(pool).await?.rows_affected())
            }
        }
    }

    /// Fetch at most one row and decode it.
    pub async fn fetch_optional<T: Scannable>(
        &self,
        sql: &str,
        params: &[StoreValue],
    ) -> StoreResult<Option<T>> {
        debug!(sql, params = params.len(), "Fetching row");
        match &self.pool {
            DbPool::Sqlite(pool) => {
                let mut query = sqlx::query(sql);
                for value in params {
                    query = bind_sqlite_value(query, value);
                }
                query
                    .fetch_optional(pool)
                    .await?
                    .map(|row| T::scan(&StoreRow::sqlite(row, self.arrays)))
                    .transpose()
            }
            DbPool::Postgres(pool) => {
                let mut query = sqlx::query(sql);
                for value in params {
                    query = bind_postgres_value(query, value, self.arrays);
                }
                query
                    .fetch_optional(pool)
                    .await?
                    .map(|row| T::scan(&StoreRow::postgres(row, self.arrays)))
                    .transpose()
            }
        }
    }

    /// Fetch all matching rows and decode them.
    pub async fn fetch_all<T: Scannable>(
        &self,
        sql: &str,
        params: &[StoreValue],
    ) -> StoreResult<Vec<T>> {
        debug!(sql, params = params.len(), "Fetching rows");
        match &self.pool {
            DbPool::Sqlite(pool) => {
                let mut query = sqlx::query(sql);
                for value in params {
                    query = bind_sqlite_value(query, value);
                }
                query
                    .fetch_all(pool)
                    .await?
                    .into_iter()
                    .map(|row| T::scan(&StoreRow::sqlite(row, self.arrays)))
                    .collect()
            }
            DbPool::Postgres(pool) => {
                let mut query = sqlx::query(sql);
                for value in params {
                    query = bind_postgres_value(query, value, self.arrays);
                }
                query
                    .fetch_all(pool)
                    .await?
                    .into_iter()
                    .map(|row| T::scan(&StoreRow::postgres(row, self.arrays)))
                    .collect()
            }
        }
    }

    /// Close the pool. The handle is torn down at process shutdown and never
    /// reused afterwards.
    pub async fn close(&self) {
        match &self.pool {
            DbPool::Sqlite(pool) => pool.close().await,
            DbPool::Postgres(pool) => pool.close().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sqlite_config() -> StoreConfig {
        StoreConfig {
            db_type: "sqlite".to_string(),
            uri: "sqlite::memory:".to_string(),
            max_open_conns: 1,
            max_idle_conns: 1,
            conn_max_idle_time: None,
            conn_max_lifetime: None,
        }
    }

    // Pool construction spawns maintenance tasks, so these run on a runtime.
    #[tokio::test]
    async fn test_handle_carries_dialect_and_strategy() {
        let handle = StoreHandle::new(&sqlite_config()).unwrap();
        assert_eq!(handle.dialect(), Dialect::Sqlite);
        assert_eq!(handle.array_encoding(), ArrayEncoding::JsonText);
    }

    #[test]
    fn test_bad_idle_time_yields_no_handle() {
        let mut config = sqlite_config();
        config.conn_max_idle_time = Some("a while".to_string());
        let err = StoreHandle::new(&config).unwrap_err();
        assert!(matches!(err, StoreError::Config { .. }));
    }

    #[test]
    fn test_bad_lifetime_yields_no_handle() {
        let mut config = sqlite_config();
        config.conn_max_lifetime = Some("10 minutes".to_string());
        assert!(StoreHandle::new(&config).is_err());
    }

    #[test]
    fn test_unknown_engine_yields_no_handle() {
        let mut config = sqlite_config();
        config.db_type = "oracle".to_string();
        let err = StoreHandle::new(&config).unwrap_err();
        assert!(matches!(err, StoreError::Config { .. }));
    }

    #[tokio::test]
    async fn test_lazy_postgres_handle_needs_no_server() {
        // connect_lazy never touches the network; only the first query does.
        let config = StoreConfig {
            db_type: "postgres".to_string(),
            uri: "postgres://bridge@127.0.0.1:1/bridge".to_string(),
            max_open_conns: 5,
            max_idle_conns: 1,
            conn_max_idle_time: Some("30m".to_string()),
            conn_max_lifetime: Some("1h".to_string()),
        };
        let handle = StoreHandle::new(&config).unwrap();
        assert_eq!(handle.dialect(), Dialect::Postgres);
        assert_eq!(handle.array_encoding(), ArrayEncoding::Native);
    }
}
