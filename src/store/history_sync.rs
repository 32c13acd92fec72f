//! History sync blobs: opaque serialized payloads from the remote network,
//! kept until backfill consumes them.

use crate::error::StoreResult;
use crate::pool::StoreHandle;
use crate::row::{Scannable, StoreRow, StoreValue};
use std::sync::Arc;
use tracing::{Instrument, Span, info_span};

#[derive(Debug, Clone, PartialEq)]
pub struct HistorySyncBlob {
    pub user_mxid: String,
    pub sync_type: i64,
    pub data: Vec<u8>,
    pub inserted_at_ms: i64,
}

impl Scannable for HistorySyncBlob {
    fn scan(row: &StoreRow) -> StoreResult<Self> {
        Ok(Self {
            user_mxid: row.get_str("user_mxid")?,
            sync_type: row.get_i64("sync_type")?,
            data: row.get_bytes("data")?,
            inserted_at_ms: row.get_i64("inserted_at_ms")?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct HistorySyncStore {
    db: Arc<StoreHandle>,
    span: Span,
}

impl HistorySyncStore {
    pub(crate) fn new(db: Arc<StoreHandle>) -> Self {
        Self {
            db,
            span: info_span!("store", entity = "history_sync"),
        }
    }

    pub fn handle(&self) -> &Arc<StoreHandle> {
        &self.db
    }

    pub async fn put_blob(&self, blob: &HistorySyncBlob) -> StoreResult<()> {
        self.db
            .execute(
                "INSERT INTO history_sync (user_mxid, sync_type, data, inserted_at_ms) \
                 VALUES ($1, $2, $3, $4) \
                 ON CONFLICT (user_mxid, sync_type) DO UPDATE \
                 SET data=excluded.data, inserted_at_ms=excluded.inserted_at_ms",
                &[
                    StoreValue::text(&blob.user_mxid),
                    StoreValue::int(blob.sync_type),
                    StoreValue::bytes(blob.data.clone()),
                    StoreValue::int(blob.inserted_at_ms),
                ],
            )
            .instrument(self.span.clone())
            .await?;
        Ok(())
    }

    pub async fn get_blob(
        &self,
        user_mxid: &str,
        sync_type: i64,
    ) -> StoreResult<Option<HistorySyncBlob>> {
        self.db
            .fetch_optional(
                "SELECT user_mxid, sync_type, data, inserted_at_ms FROM history_sync \
                 WHERE user_mxid=$1 AND sync_type=$2",
                &[StoreValue::text(user_mxid), StoreValue::int(sync_type)],
            )
            .instrument(self.span.clone())
            .await
    }

    /// Drop all stored payloads for a user, e.g. on logout.
    pub async fn delete_all_for_user(&self, user_mxid: &str) -> StoreResult<()> {
        self.db
            .execute(
                "DELETE FROM history_sync WHERE user_mxid=$1",
                &[StoreValue::text(user_mxid)],
            )
            .instrument(self.span.clone())
            .await?;
        Ok(())
    }
}
