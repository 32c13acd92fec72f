//! Backfill task queue: ordered work items for importing remote history
//! into Matrix rooms. The portal list is the one list-valued column in the
//! schema and goes through the handle's array strategy.

use crate::error::StoreResult;
use crate::pool::StoreHandle;
use crate::row::{Scannable, StoreRow, StoreValue};
use std::sync::Arc;
use tracing::{Instrument, Span, info_span};

#[derive(Debug, Clone, PartialEq)]
pub struct BackfillTask {
    pub queue_id: i64,
    pub user_mxid: String,
    /// Lower value runs first.
    pub priority: i64,
    /// Portals covered by this task.
    pub portal_jids: Vec<String>,
    pub max_batch_events: i64,
    /// Unix milliseconds when a worker picked the task up; NULL while queued.
    pub dispatch_time_ms: Option<i64>,
    pub completed: bool,
}

impl Scannable for BackfillTask {
    fn scan(row: &StoreRow) -> StoreResult<Self> {
        Ok(Self {
            queue_id: row.get_i64("queue_id")?,
            user_mxid: row.get_str("user_mxid")?,
            priority: row.get_i64("priority")?,
            portal_jids: row.get_str_array("portal_jids")?,
            max_batch_events: row.get_i64("max_batch_events")?,
            dispatch_time_ms: row.get_opt_i64("dispatch_time_ms")?,
            completed: row.get_bool("completed")?,
        })
    }
}

const COLUMNS: &str =
    "queue_id, user_mxid, priority, portal_jids, max_batch_events, dispatch_time_ms, completed";

#[derive(Debug, Clone)]
pub struct BackfillStore {
    db: Arc<StoreHandle>,
    span: Span,
}

impl BackfillStore {
    pub(crate) fn new(db: Arc<StoreHandle>) -> Self {
        Self {
            db,
            span: info_span!("store", entity = "backfill"),
        }
    }

    pub fn handle(&self) -> &Arc<StoreHandle> {
        &self.db
    }

    /// Queue tasks one statement at a time; no transaction spans the batch,
    /// a partially inserted batch is re-queued by the caller.
    pub async fn insert_many(&self, tasks: &[BackfillTask]) -> StoreResult<()> {
        let sql = format!(
            "INSERT INTO backfill_queue ({COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7)"
        );
        for task in tasks {
            self.db
                .execute(
                    &sql,
                    &[
                        StoreValue::int(task.queue_id),
                        StoreValue::text(&task.user_mxid),
                        StoreValue::int(task.priority),
                        StoreValue::array(task.portal_jids.clone()),
                        StoreValue::int(task.max_batch_events),
                        StoreValue::opt_int(task.dispatch_time_ms),
                        StoreValue::bool(task.completed),
                    ],
                )
                .instrument(self.span.clone())
                .await?;
        }
        Ok(())
    }

    /// Next runnable task for the user: lowest priority value, then queue
    /// order.
    pub async fn get_next(&self, user_mxid: &str) -> StoreResult<Option<BackfillTask>> {
        let sql = format!(
            "SELECT {COLUMNS} FROM backfill_queue \
             WHERE user_mxid=$1 AND completed=false AND dispatch_time_ms IS NULL \
             ORDER BY priority, queue_id LIMIT 1"
        );
        self.db
            .fetch_optional(&sql, &[StoreValue::text(user_mxid)])
            .instrument(self.span.clone())
            .await
    }

    pub async fn mark_dispatched(&self, queue_id: i64, dispatch_time_ms: i64) -> StoreResult<()> {
        self.db
            .execute(
                "UPDATE backfill_queue SET dispatch_time_ms=$2 WHERE queue_id=$1",
                &[StoreValue::int(queue_id), StoreValue::int(dispatch_time_ms)],
            )
            .instrument(self.span.clone())
            .await?;
        Ok(())
    }

    pub async fn mark_completed(&self, queue_id: i64) -> StoreResult<()> {
        self.db
            .execute(
                "UPDATE backfill_queue SET completed=true WHERE queue_id=$1",
                &[StoreValue::int(queue_id)],
            )
            .instrument(self.span.clone())
            .await?;
        Ok(())
    }

    pub async fn delete_for_user(&self, user_mxid: &str) -> StoreResult<()> {
        self.db
            .execute(
                "DELETE FROM backfill_queue WHERE user_mxid=$1",
                &[StoreValue::text(user_mxid)],
            )
            .instrument(self.span.clone())
            .await?;
        Ok(())
    }
}
