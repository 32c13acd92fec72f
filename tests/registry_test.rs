//! Registry construction properties: one façade per entity group, all
//! sharing the same handle, and fatal configuration errors before any pool
//! exists.

use bridge_store::{BridgeDb, Dialect, StoreConfig, StoreError};
use std::sync::Arc;

fn sqlite_config() -> StoreConfig {
    StoreConfig {
        db_type: "sqlite".to_string(),
        uri: "sqlite::memory:".to_string(),
        max_open_conns: 1,
        max_idle_conns: 1,
        conn_max_idle_time: None,
        conn_max_lifetime: None,
    }
}

// Pool construction spawns maintenance tasks, so even the lazy handles here
// need a runtime.
#[tokio::test]
async fn every_facade_shares_one_handle() {
    let db = BridgeDb::new(&sqlite_config()).unwrap();
    let handle = db.handle();

    assert!(Arc::ptr_eq(handle, db.user.handle()));
    assert!(Arc::ptr_eq(handle, db.portal.handle()));
    assert!(Arc::ptr_eq(handle, db.puppet.handle()));
    assert!(Arc::ptr_eq(handle, db.message.handle()));
    assert!(Arc::ptr_eq(handle, db.reaction.handle()));
    assert!(Arc::ptr_eq(handle, db.disappearing_message.handle()));
    assert!(Arc::ptr_eq(handle, db.backfill.handle()));
    assert!(Arc::ptr_eq(handle, db.history_sync.handle()));
    assert!(Arc::ptr_eq(handle, db.media_backfill_request.handle()));
}

#[tokio::test]
async fn dialect_is_resolved_at_construction() {
    let db = BridgeDb::new(&sqlite_config()).unwrap();
    assert_eq!(db.handle().dialect(), Dialect::Sqlite);

    let pg = StoreConfig {
        db_type: "postgres".to_string(),
        uri: "postgres://bridge@127.0.0.1:1/bridge".to_string(),
        ..sqlite_config()
    };
    let db = BridgeDb::new(&pg).unwrap();
    assert_eq!(db.handle().dialect(), Dialect::Postgres);
}

#[test]
fn bad_duration_string_is_fatal() {
    let mut config = sqlite_config();
    config.conn_max_lifetime = Some("ninety seconds".to_string());
    let err = BridgeDb::new(&config).unwrap_err();
    assert!(matches!(err, StoreError::Config { .. }));
    assert!(err.to_string().contains("conn_max_lifetime"));
}

#[test]
fn unknown_engine_identifier_is_fatal() {
    let mut config = sqlite_config();
    config.db_type = "mongodb".to_string();
    let err = BridgeDb::new(&config).unwrap_err();
    assert!(matches!(err, StoreError::Config { .. }));
}
