//! Bridged messages: maps remote message IDs to Matrix event IDs.

use crate::error::StoreResult;
use crate::pool::StoreHandle;
use crate::row::{Scannable, StoreRow, StoreValue};
use std::sync::Arc;
use tracing::{Instrument, Span, info_span};

#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub chat_jid: String,
    /// Remote message identifier, unique within the chat.
    pub jid: String,
    pub mxid: String,
    pub sender: String,
    pub timestamp_ms: i64,
    /// False while the echo for an outgoing message is still pending.
    pub sent: bool,
}

impl Scannable for Message {
    fn scan(row: &StoreRow) -> StoreResult<Self> {
        Ok(Self {
            chat_jid: row.get_str("chat_jid")?,
            jid: row.get_str("jid")?,
            mxid: row.get_str("mxid")?,
            sender: row.get_str("sender")?,
            timestamp_ms: row.get_i64("timestamp_ms")?,
            sent: row.get_bool("sent")?,
        })
    }
}

const COLUMNS: &str = "chat_jid, jid, mxid, sender, timestamp_ms, sent";

#[derive(Debug, Clone)]
pub struct MessageStore {
    db: Arc<StoreHandle>,
    span: Span,
}

impl MessageStore {
    pub(crate) fn new(db: Arc<StoreHandle>) -> Self {
        Self {
            db,
            span: info_span!("store", entity = "message"),
        }
    }

    pub fn handle(&self) -> &Arc<StoreHandle> {
        &self.db
    }

    pub async fn get_by_jid(&self, chat_jid: &str, jid: &str) -> StoreResult<Option<Message>> {
        let sql = format!("SELECT {COLUMNS} FROM message WHERE chat_jid=$1 AND jid=$2");
        self.db
            .fetch_optional(&sql, &[StoreValue::text(chat_jid), StoreValue::text(jid)])
            .instrument(self.span.clone())
            .await
    }

    pub async fn get_by_mxid(&self, mxid: &str) -> StoreResult<Option<Message>> {
        let sql = format!("SELECT {COLUMNS} FROM message WHERE mxid=$1");
        self.db
            .fetch_optional(&sql, &[StoreValue::text(mxid)])
            .instrument(self.span.clone())
            .await
    }

    pub async fn get_last_in_chat(&self, chat_jid: &str) -> StoreResult<Option<Message>> {
        let sql = format!(
            "SELECT {COLUMNS} FROM message WHERE chat_jid=$1 AND sent=true \
             ORDER BY timestamp_ms DESC LIMIT 1"
        );
        self.db
            .fetch_optional(&sql, &[StoreValue::text(chat_jid)])
            .instrument(self.span.clone())
            .await
    }

    pub async fn insert(&self, message: &Message) -> StoreResult<()> {
        let sql = format!("INSERT INTO message ({COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6)");
        self.db
            .execute(
                &sql,
                &[
                    StoreValue::text(&message.chat_jid),
                    StoreValue::text(&message.jid),
                    StoreValue::text(&message.mxid),
                    StoreValue::text(&message.sender),
                    StoreValue::int(message.timestamp_ms),
                    StoreValue::bool(message.sent),
                ],
            )
            .instrument(self.span.clone())
            .await?;
        Ok(())
    }

    pub async fn delete(&self, chat_jid: &str, jid: &str) -> StoreResult<()> {
        self.db
            .execute(
                "DELETE FROM message WHERE chat_jid=$1 AND jid=$2",
                &[StoreValue::text(chat_jid), StoreValue::text(jid)],
            )
            .instrument(self.span.clone())
            .await?;
        Ok(())
    }
}
