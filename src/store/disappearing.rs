//! Disappearing-message timers: events scheduled for redaction once their
//! remote-side expiry passes.

use crate::error::StoreResult;
use crate::pool::StoreHandle;
use crate::row::{Scannable, StoreRow, StoreValue};
use std::sync::Arc;
use tracing::{Instrument, Span, info_span};

#[derive(Debug, Clone, PartialEq)]
pub struct DisappearingMessage {
    pub room_id: String,
    pub event_id: String,
    /// Unix milliseconds at which the event must be redacted.
    pub expire_at_ms: i64,
}

impl Scannable for DisappearingMessage {
    fn scan(row: &StoreRow) -> StoreResult<Self> {
        Ok(Self {
            room_id: row.get_str("room_id")?,
            event_id: row.get_str("event_id")?,
            expire_at_ms: row.get_i64("expire_at_ms")?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct DisappearingMessageStore {
    db: Arc<StoreHandle>,
    span: Span,
}

impl DisappearingMessageStore {
    pub(crate) fn new(db: Arc<StoreHandle>) -> Self {
        Self {
            db,
            span: info_span!("store", entity = "disappearing_message"),
        }
    }

    pub fn handle(&self) -> &Arc<StoreHandle> {
        &self.db
    }

    pub async fn insert(&self, timer: &DisappearingMessage) -> StoreResult<()> {
        self.db
            .execute(
                "INSERT INTO disappearing_message (room_id, event_id, expire_at_ms) \
                 VALUES ($1, $2, $3) ON CONFLICT (room_id, event_id) DO NOTHING",
                &[
                    StoreValue::text(&timer.room_id),
                    StoreValue::text(&timer.event_id),
                    StoreValue::int(timer.expire_at_ms),
                ],
            )
            .instrument(self.span.clone())
            .await?;
        Ok(())
    }

    /// Timers whose expiry is at or before now, oldest first.
    pub async fn get_expired(&self) -> StoreResult<Vec<DisappearingMessage>> {
        let now_ms = chrono::Utc::now().timestamp_millis();
        self.db
            .fetch_all(
                "SELECT room_id, event_id, expire_at_ms FROM disappearing_message \
                 WHERE expire_at_ms <= $1 ORDER BY expire_at_ms",
                &[StoreValue::int(now_ms)],
            )
            .instrument(self.span.clone())
            .await
    }

    pub async fn delete(&self, room_id: &str, event_id: &str) -> StoreResult<()> {
        self.db
            .execute(
                "DELETE FROM disappearing_message WHERE room_id=$1 AND event_id=$2",
                &[StoreValue::text(room_id), StoreValue::text(event_id)],
            )
            .instrument(self.span.clone())
            .await?;
        Ok(())
    }
}
