//! Schema migrator boundary.
//!
//! The migration engine lives outside this crate; it is handed the resolved
//! dialect and the live pool once, right after construction, and must bring
//! the schema to the current version or fail. Migration failures are fatal
//! and never retried.

use crate::dialect::Dialect;
use crate::error::StoreResult;
use crate::pool::StoreHandle;
use async_trait::async_trait;

#[async_trait]
pub trait SchemaMigrator: Send + Sync {
    async fn run(&self, dialect: Dialect, handle: &StoreHandle) -> StoreResult<()>;
}
