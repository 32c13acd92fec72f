//! Query registry: one façade per logical table group, all sharing the
//! single [`StoreHandle`].
//!
//! [`BridgeDb`] is constructed once at startup. Every façade holds a clone of
//! the same `Arc<StoreHandle>` - a façade without a handle is
//! unrepresentable - and carries its own namespaced span so query logs are
//! attributable per entity. Façades are stateless beyond that reference and
//! never touch dialect or pool configuration.

pub mod backfill;
pub mod disappearing;
pub mod history_sync;
pub mod media_backfill;
pub mod message;
pub mod portal;
pub mod puppet;
pub mod reaction;
pub mod user;

pub use backfill::{BackfillStore, BackfillTask};
pub use disappearing::{DisappearingMessage, DisappearingMessageStore};
pub use history_sync::{HistorySyncBlob, HistorySyncStore};
pub use media_backfill::{MediaBackfillRequest, MediaBackfillStore};
pub use message::{Message, MessageStore};
pub use portal::{Portal, PortalStore};
pub use puppet::{Puppet, PuppetStore};
pub use reaction::{Reaction, ReactionStore};
pub use user::{User, UserStore};

use crate::config::StoreConfig;
use crate::error::StoreResult;
use crate::migrate::SchemaMigrator;
use crate::pool::StoreHandle;
use crate::retry::SessionStoreRetry;
use std::sync::Arc;

/// The bridge's database: shared pool handle plus the per-entity façades.
#[derive(Debug)]
pub struct BridgeDb {
    handle: Arc<StoreHandle>,

    pub user: UserStore,
    pub portal: PortalStore,
    pub puppet: PuppetStore,
    pub message: MessageStore,
    pub reaction: ReactionStore,

    pub disappearing_message: DisappearingMessageStore,
    pub backfill: BackfillStore,
    pub history_sync: HistorySyncStore,
    pub media_backfill_request: MediaBackfillStore,
}

impl BridgeDb {
    /// Resolve the dialect, open the pool and construct every façade.
    pub fn new(config: &StoreConfig) -> StoreResult<Self> {
        let handle = Arc::new(StoreHandle::new(config)?);
        Ok(Self {
            user: UserStore::new(Arc::clone(&handle)),
            portal: PortalStore::new(Arc::clone(&handle)),
            puppet: PuppetStore::new(Arc::clone(&handle)),
            message: MessageStore::new(Arc::clone(&handle)),
            reaction: ReactionStore::new(Arc::clone(&handle)),
            disappearing_message: DisappearingMessageStore::new(Arc::clone(&handle)),
            backfill: BackfillStore::new(Arc::clone(&handle)),
            history_sync: HistorySyncStore::new(Arc::clone(&handle)),
            media_backfill_request: MediaBackfillStore::new(Arc::clone(&handle)),
            handle,
        })
    }

    /// Run the external schema migrator against the live pool. Called once
    /// after construction; a failure here is fatal and not retried.
    pub async fn init(&self, migrator: &dyn SchemaMigrator) -> StoreResult<()> {
        migrator.run(self.handle.dialect(), &self.handle).await
    }

    pub fn handle(&self) -> &Arc<StoreHandle> {
        &self.handle
    }

    /// Retry controller for session-key-store operations against this pool.
    pub fn session_retry(&self) -> SessionStoreRetry {
        SessionStoreRetry::new(Arc::clone(&self.handle))
    }

    /// Tear down the pool at process shutdown.
    pub async fn close(&self) {
        self.handle.close().await;
    }
}
