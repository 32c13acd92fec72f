//! Persistence gateway for a Matrix bridge.
//!
//! One code path over two relational engines: embedded SQLite for small
//! deployments and networked PostgreSQL for everything else. The crate owns
//! the shared connection pool, resolves dialect differences (array encoding,
//! retry eligibility), classifies transient store failures, and provides the
//! retry decision oracle used around session-key-store operations where a
//! wrongly retried partial failure could corrupt ratchet state.

pub mod config;
pub mod dialect;
pub mod error;
pub mod migrate;
pub mod pool;
pub mod retry;
pub mod row;
pub mod store;

pub use config::StoreConfig;
pub use dialect::{ArrayEncoding, Dialect};
pub use error::{ErrorKind, RetryDecision, StoreError, StoreResult, classify};
pub use migrate::SchemaMigrator;
pub use pool::{DbPool, StoreHandle};
pub use retry::{SessionStoreRetry, backoff};
pub use row::{Scannable, StoreRow, StoreValue};
pub use store::BridgeDb;
