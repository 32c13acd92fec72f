//! Remote-identity puppets: ghost Matrix users mirroring remote accounts.

use crate::error::StoreResult;
use crate::pool::StoreHandle;
use crate::row::{Scannable, StoreRow, StoreValue};
use std::sync::Arc;
use tracing::{Instrument, Span, info_span};

#[derive(Debug, Clone, PartialEq)]
pub struct Puppet {
    pub username: String,
    pub displayname: Option<String>,
    pub avatar_url: Option<String>,
    /// Set when a real Matrix user claimed this puppet (double puppeting).
    pub custom_mxid: Option<String>,
    pub access_token: Option<String>,
}

impl Scannable for Puppet {
    fn scan(row: &StoreRow) -> StoreResult<Self> {
        Ok(Self {
            username: row.get_str("username")?,
            displayname: row.get_opt_str("displayname")?,
            avatar_url: row.get_opt_str("avatar_url")?,
            custom_mxid: row.get_opt_str("custom_mxid")?,
            access_token: row.get_opt_str("access_token")?,
        })
    }
}

const COLUMNS: &str = "username, displayname, avatar_url, custom_mxid, access_token";

#[derive(Debug, Clone)]
pub struct PuppetStore {
    db: Arc<StoreHandle>,
    span: Span,
}

impl PuppetStore {
    pub(crate) fn new(db: Arc<StoreHandle>) -> Self {
        Self {
            db,
            span: info_span!("store", entity = "puppet"),
        }
    }

    pub fn handle(&self) -> &Arc<StoreHandle> {
        &self.db
    }

    pub async fn get(&self, username: &str) -> StoreResult<Option<Puppet>> {
        let sql = format!("SELECT {COLUMNS} FROM puppet WHERE username=$1");
        self.db
            .fetch_optional(&sql, &[StoreValue::text(username)])
            .instrument(self.span.clone())
            .await
    }

    pub async fn get_all_with_custom_mxid(&self) -> StoreResult<Vec<Puppet>> {
        let sql = format!("SELECT {COLUMNS} FROM puppet WHERE custom_mxid IS NOT NULL");
        self.db.fetch_all(&sql, &[]).instrument(self.span.clone()).await
    }

    pub async fn insert(&self, puppet: &Puppet) -> StoreResult<()> {
        let sql = format!("INSERT INTO puppet ({COLUMNS}) VALUES ($1, $2, $3, $4, $5)");
        self.db
            .execute(&sql, &puppet_values(puppet))
            .instrument(self.span.clone())
            .await?;
        Ok(())
    }

    pub async fn update(&self, puppet: &Puppet) -> StoreResult<()> {
        let sql = "UPDATE puppet SET displayname=$2, avatar_url=$3, custom_mxid=$4, \
                   access_token=$5 WHERE username=$1";
        self.db
            .execute(sql, &puppet_values(puppet))
            .instrument(self.span.clone())
            .await?;
        Ok(())
    }
}

fn puppet_values(puppet: &Puppet) -> [StoreValue; 5] {
    [
        StoreValue::text(&puppet.username),
        StoreValue::opt_text(puppet.displayname.as_deref()),
        StoreValue::opt_text(puppet.avatar_url.as_deref()),
        StoreValue::opt_text(puppet.custom_mxid.as_deref()),
        StoreValue::opt_text(puppet.access_token.as_deref()),
    ]
}
