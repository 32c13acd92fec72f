//! Bridge user accounts.

use crate::error::StoreResult;
use crate::pool::StoreHandle;
use crate::row::{Scannable, StoreRow, StoreValue};
use std::sync::Arc;
use tracing::{Instrument, Span, info_span};

/// A Matrix user logged into the bridge.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub mxid: String,
    /// Remote-network username; absent until login completes.
    pub username: Option<String>,
    pub device_id: Option<i64>,
    pub management_room: Option<String>,
    pub space_room: Option<String>,
}

impl Scannable for User {
    fn scan(row: &StoreRow) -> StoreResult<Self> {
        Ok(Self {
            mxid: row.get_str("mxid")?,
            username: row.get_opt_str("username")?,
            device_id: row.get_opt_i64("device_id")?,
            management_room: row.get_opt_str("management_room")?,
            space_room: row.get_opt_str("space_room")?,
        })
    }
}

const COLUMNS: &str = "mxid, username, device_id, management_room, space_room";

#[derive(Debug, Clone)]
pub struct UserStore {
    db: Arc<StoreHandle>,
    span: Span,
}

impl UserStore {
    pub(crate) fn new(db: Arc<StoreHandle>) -> Self {
        Self {
            db,
            span: info_span!("store", entity = "user"),
        }
    }

    pub fn handle(&self) -> &Arc<StoreHandle> {
        &self.db
    }

    pub async fn get_by_mxid(&self, mxid: &str) -> StoreResult<Option<User>> {
        let sql = format!("SELECT {COLUMNS} FROM \"user\" WHERE mxid=$1");
        self.db
            .fetch_optional(&sql, &[StoreValue::text(mxid)])
            .instrument(self.span.clone())
            .await
    }

    pub async fn get_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        let sql = format!("SELECT {COLUMNS} FROM \"user\" WHERE username=$1");
        self.db
            .fetch_optional(&sql, &[StoreValue::text(username)])
            .instrument(self.span.clone())
            .await
    }

    pub async fn get_all(&self) -> StoreResult<Vec<User>> {
        let sql = format!("SELECT {COLUMNS} FROM \"user\"");
        self.db.fetch_all(&sql, &[]).instrument(self.span.clone()).await
    }

    pub async fn insert(&self, user: &User) -> StoreResult<()> {
        let sql = format!("INSERT INTO \"user\" ({COLUMNS}) VALUES ($1, $2, $3, $4, $5)");
        self.db
            .execute(&sql, &user_values(user))
            .instrument(self.span.clone())
            .await?;
        Ok(())
    }

    pub async fn update(&self, user: &User) -> StoreResult<()> {
        let sql = "UPDATE \"user\" SET username=$2, device_id=$3, management_room=$4, \
                   space_room=$5 WHERE mxid=$1";
        self.db
            .execute(sql, &user_values(user))
            .instrument(self.span.clone())
            .await?;
        Ok(())
    }
}

fn user_values(user: &User) -> [StoreValue; 5] {
    [
        StoreValue::text(&user.mxid),
        StoreValue::opt_text(user.username.as_deref()),
        StoreValue::opt_int(user.device_id),
        StoreValue::opt_text(user.management_room.as_deref()),
        StoreValue::opt_text(user.space_room.as_deref()),
    ]
}
