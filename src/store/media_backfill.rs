//! Media backfill requests: deferred downloads of media referenced by
//! backfilled messages.

use crate::error::StoreResult;
use crate::pool::StoreHandle;
use crate::row::{Scannable, StoreRow, StoreValue};
use std::sync::Arc;
use tracing::{Instrument, Span, info_span};

/// Request lifecycle values stored in the `status` column.
pub const STATUS_PENDING: i64 = 0;
pub const STATUS_DONE: i64 = 1;
pub const STATUS_FAILED: i64 = -1;

#[derive(Debug, Clone, PartialEq)]
pub struct MediaBackfillRequest {
    pub user_mxid: String,
    pub portal_jid: String,
    pub event_id: String,
    /// Decryption key for the remote media, opaque to this layer.
    pub media_key: Vec<u8>,
    pub status: i64,
    pub error: Option<String>,
}

impl Scannable for MediaBackfillRequest {
    fn scan(row: &StoreRow) -> StoreResult<Self> {
        Ok(Self {
            user_mxid: row.get_str("user_mxid")?,
            portal_jid: row.get_str("portal_jid")?,
            event_id: row.get_str("event_id")?,
            media_key: row.get_bytes("media_key")?,
            status: row.get_i64("status")?,
            error: row.get_opt_str("error")?,
        })
    }
}

const COLUMNS: &str = "user_mxid, portal_jid, event_id, media_key, status, error";

#[derive(Debug, Clone)]
pub struct MediaBackfillStore {
    db: Arc<StoreHandle>,
    span: Span,
}

impl MediaBackfillStore {
    pub(crate) fn new(db: Arc<StoreHandle>) -> Self {
        Self {
            db,
            span: info_span!("store", entity = "media_backfill_request"),
        }
    }

    pub fn handle(&self) -> &Arc<StoreHandle> {
        &self.db
    }

    pub async fn put_request(&self, request: &MediaBackfillRequest) -> StoreResult<()> {
        let sql = format!(
            "INSERT INTO media_backfill_request ({COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6) \
             ON CONFLICT (user_mxid, portal_jid, event_id) DO UPDATE \
             SET media_key=excluded.media_key, status=excluded.status, error=excluded.error"
        );
        self.db
            .execute(
                &sql,
                &[
                    StoreValue::text(&request.user_mxid),
                    StoreValue::text(&request.portal_jid),
                    StoreValue::text(&request.event_id),
                    StoreValue::bytes(request.media_key.clone()),
                    StoreValue::int(request.status),
                    StoreValue::opt_text(request.error.as_deref()),
                ],
            )
            .instrument(self.span.clone())
            .await?;
        Ok(())
    }

    pub async fn get_pending(&self, user_mxid: &str) -> StoreResult<Vec<MediaBackfillRequest>> {
        let sql = format!(
            "SELECT {COLUMNS} FROM media_backfill_request WHERE user_mxid=$1 AND status=$2"
        );
        self.db
            .fetch_all(
                &sql,
                &[StoreValue::text(user_mxid), StoreValue::int(STATUS_PENDING)],
            )
            .instrument(self.span.clone())
            .await
    }

    pub async fn set_status(
        &self,
        user_mxid: &str,
        portal_jid: &str,
        event_id: &str,
        status: i64,
        error: Option<&str>,
    ) -> StoreResult<()> {
        self.db
            .execute(
                "UPDATE media_backfill_request SET status=$4, error=$5 \
                 WHERE user_mxid=$1 AND portal_jid=$2 AND event_id=$3",
                &[
                    StoreValue::text(user_mxid),
                    StoreValue::text(portal_jid),
                    StoreValue::text(event_id),
                    StoreValue::int(status),
                    StoreValue::opt_text(error),
                ],
            )
            .instrument(self.span.clone())
            .await?;
        Ok(())
    }
}
