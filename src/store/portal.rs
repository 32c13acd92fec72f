//! Chat portals: one row per bridged remote chat and its Matrix room.

use crate::error::StoreResult;
use crate::pool::StoreHandle;
use crate::row::{Scannable, StoreRow, StoreValue};
use std::sync::Arc;
use tracing::{Instrument, Span, info_span};

#[derive(Debug, Clone, PartialEq)]
pub struct Portal {
    /// Remote chat identifier.
    pub jid: String,
    /// Matrix room, absent until the portal room is created.
    pub mxid: Option<String>,
    pub name: String,
    pub topic: String,
    pub avatar_url: Option<String>,
    pub encrypted: bool,
}

impl Scannable for Portal {
    fn scan(row: &StoreRow) -> StoreResult<Self> {
        Ok(Self {
            jid: row.get_str("jid")?,
            mxid: row.get_opt_str("mxid")?,
            name: row.get_str("name")?,
            topic: row.get_str("topic")?,
            avatar_url: row.get_opt_str("avatar_url")?,
            encrypted: row.get_bool("encrypted")?,
        })
    }
}

const COLUMNS: &str = "jid, mxid, name, topic, avatar_url, encrypted";

#[derive(Debug, Clone)]
pub struct PortalStore {
    db: Arc<StoreHandle>,
    span: Span,
}

impl PortalStore {
    pub(crate) fn new(db: Arc<StoreHandle>) -> Self {
        Self {
            db,
            span: info_span!("store", entity = "portal"),
        }
    }

    pub fn handle(&self) -> &Arc<StoreHandle> {
        &self.db
    }

    pub async fn get_by_jid(&self, jid: &str) -> StoreResult<Option<Portal>> {
        let sql = format!("SELECT {COLUMNS} FROM portal WHERE jid=$1");
        self.db
            .fetch_optional(&sql, &[StoreValue::text(jid)])
            .instrument(self.span.clone())
            .await
    }

    pub async fn get_by_mxid(&self, mxid: &str) -> StoreResult<Option<Portal>> {
        let sql = format!("SELECT {COLUMNS} FROM portal WHERE mxid=$1");
        self.db
            .fetch_optional(&sql, &[StoreValue::text(mxid)])
            .instrument(self.span.clone())
            .await
    }

    pub async fn get_all(&self) -> StoreResult<Vec<Portal>> {
        let sql = format!("SELECT {COLUMNS} FROM portal");
        self.db.fetch_all(&sql, &[]).instrument(self.span.clone()).await
    }

    pub async fn insert(&self, portal: &Portal) -> StoreResult<()> {
        let sql = format!("INSERT INTO portal ({COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6)");
        self.db
            .execute(
                &sql,
                &[
                    StoreValue::text(&portal.jid),
                    StoreValue::opt_text(portal.mxid.as_deref()),
                    StoreValue::text(&portal.name),
                    StoreValue::text(&portal.topic),
                    StoreValue::opt_text(portal.avatar_url.as_deref()),
                    StoreValue::bool(portal.encrypted),
                ],
            )
            .instrument(self.span.clone())
            .await?;
        Ok(())
    }

    /// Delete the portal row. Entity rows referencing it (messages,
    /// reactions) are cleaned up by their own stores.
    pub async fn delete(&self, jid: &str) -> StoreResult<()> {
        self.db
            .execute("DELETE FROM portal WHERE jid=$1", &[StoreValue::text(jid)])
            .instrument(self.span.clone())
            .await?;
        Ok(())
    }
}
