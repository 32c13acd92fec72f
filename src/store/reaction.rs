//! Message reactions. One row per (chat, target message, sender): a sender
//! replacing their reaction overwrites the previous row.

use crate::error::StoreResult;
use crate::pool::StoreHandle;
use crate::row::{Scannable, StoreRow, StoreValue};
use std::sync::Arc;
use tracing::{Instrument, Span, info_span};

#[derive(Debug, Clone, PartialEq)]
pub struct Reaction {
    pub chat_jid: String,
    pub target_jid: String,
    pub sender: String,
    pub mxid: String,
}

impl Scannable for Reaction {
    fn scan(row: &StoreRow) -> StoreResult<Self> {
        Ok(Self {
            chat_jid: row.get_str("chat_jid")?,
            target_jid: row.get_str("target_jid")?,
            sender: row.get_str("sender")?,
            mxid: row.get_str("mxid")?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct ReactionStore {
    db: Arc<StoreHandle>,
    span: Span,
}

impl ReactionStore {
    pub(crate) fn new(db: Arc<StoreHandle>) -> Self {
        Self {
            db,
            span: info_span!("store", entity = "reaction"),
        }
    }

    pub fn handle(&self) -> &Arc<StoreHandle> {
        &self.db
    }

    pub async fn get_by_target_jid(
        &self,
        chat_jid: &str,
        target_jid: &str,
        sender: &str,
    ) -> StoreResult<Option<Reaction>> {
        self.db
            .fetch_optional(
                "SELECT chat_jid, target_jid, sender, mxid FROM reaction \
                 WHERE chat_jid=$1 AND target_jid=$2 AND sender=$3",
                &[
                    StoreValue::text(chat_jid),
                    StoreValue::text(target_jid),
                    StoreValue::text(sender),
                ],
            )
            .instrument(self.span.clone())
            .await
    }

    pub async fn upsert(&self, reaction: &Reaction) -> StoreResult<()> {
        self.db
            .execute(
                "INSERT INTO reaction (chat_jid, target_jid, sender, mxid) \
                 VALUES ($1, $2, $3, $4) \
                 ON CONFLICT (chat_jid, target_jid, sender) DO UPDATE SET mxid=excluded.mxid",
                &[
                    StoreValue::text(&reaction.chat_jid),
                    StoreValue::text(&reaction.target_jid),
                    StoreValue::text(&reaction.sender),
                    StoreValue::text(&reaction.mxid),
                ],
            )
            .instrument(self.span.clone())
            .await?;
        Ok(())
    }

    pub async fn delete(&self, reaction: &Reaction) -> StoreResult<()> {
        self.db
            .execute(
                "DELETE FROM reaction WHERE chat_jid=$1 AND target_jid=$2 AND sender=$3",
                &[
                    StoreValue::text(&reaction.chat_jid),
                    StoreValue::text(&reaction.target_jid),
                    StoreValue::text(&reaction.sender),
                ],
            )
            .instrument(self.span.clone())
            .await?;
        Ok(())
    }
}
