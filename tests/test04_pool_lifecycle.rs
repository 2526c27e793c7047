mod common;

use std::time::Duration;

use common::{FakeManager, FakeStore};
use store_middleware::prelude::*;
use store_middleware::PoolState;

fn raw_pool(store: &FakeStore, config: PoolConfig) -> Pool<FakeManager> {
    Pool::new(store.manager(), config).unwrap()
}

#[tokio::test]
async fn max_open_blocks_until_release() -> Result<(), StoreMiddlewareError> {
    let store = FakeStore::new();
    let pool = raw_pool(&store, PoolConfig::new(2, 2));

    let a = pool.get().await?;
    let _b = pool.get().await?;
    assert_eq!(pool.state().in_use, 2);

    let blocked = tokio::time::timeout(Duration::from_millis(50), pool.get()).await;
    assert!(blocked.is_err());

    drop(a);
    let c = tokio::time::timeout(Duration::from_millis(500), pool.get())
        .await
        .expect("checkout after release")?;
    assert_eq!(c.id, 1);
    assert_eq!(store.connects(), 2);
    Ok(())
}

#[tokio::test]
async fn max_idle_caps_retained_connections() -> Result<(), StoreMiddlewareError> {
    let store = FakeStore::new();
    let pool = raw_pool(&store, PoolConfig::new(3, 1));

    let conns = vec![pool.get().await?, pool.get().await?, pool.get().await?];
    drop(conns);

    assert_eq!(pool.state(), PoolState { in_use: 0, idle: 1 });
    assert_eq!(store.closed(), 2);
    Ok(())
}

#[tokio::test]
async fn idle_connections_are_reused_most_recent_first() -> Result<(), StoreMiddlewareError> {
    let store = FakeStore::new();
    let pool = raw_pool(&store, PoolConfig::new(2, 2));

    let first = pool.get().await?;
    let second = pool.get().await?;
    drop(first);
    drop(second);

    let reused = pool.get().await?;
    assert_eq!(reused.id, 2);
    assert_eq!(store.connects(), 2);
    Ok(())
}

#[tokio::test]
async fn expired_idle_connections_are_not_reused() -> Result<(), StoreMiddlewareError> {
    let store = FakeStore::new();
    let config = PoolConfig {
        idle_timeout_secs: Some(0),
        ..PoolConfig::new(2, 2)
    };
    let pool = raw_pool(&store, config);

    drop(pool.get().await?);
    let fresh = pool.get().await?;
    assert_eq!(fresh.id, 2);
    assert_eq!(store.closed(), 1);
    Ok(())
}

#[tokio::test]
async fn unreachable_store_fails_before_the_statement() {
    let store = FakeStore::new();
    let pool = store.sql_pool(PoolConfig::new(2, 2), TransactionMode::Strict);

    // warm one idle connection, then cut the network
    pool.exec("UPDATE t SET n = 1", &[]).await.unwrap();
    store.set_unreachable(true);

    let err = pool.exec("UPDATE t SET n = 2", &[]).await.unwrap_err();
    assert!(err.is_connectivity());
    let err = pool.query("SELECT 1", &[]).await.unwrap_err();
    assert!(err.is_connectivity());
    assert_eq!(store.statements(), ["UPDATE t SET n = 1"]);
    assert_eq!(pool.pool().state().in_use, 0);
}

#[tokio::test]
async fn zero_open_ceiling_is_rejected() {
    let store = FakeStore::new();
    let err = Pool::new(store.manager(), PoolConfig::new(0, 0)).unwrap_err();
    assert!(matches!(err, StoreMiddlewareError::ConfigError(_)));
}

#[tokio::test]
async fn close_commits_an_open_transaction() -> Result<(), StoreMiddlewareError> {
    let store = FakeStore::new();
    let pool = store.sql_pool(PoolConfig::new(2, 2), TransactionMode::Strict);

    pool.transaction().await?;
    pool.exec("UPDATE t SET n = 1", &[]).await?;
    pool.close().await?;

    assert_eq!(
        store.statements(),
        ["START TRANSACTION", "UPDATE t SET n = 1", "COMMIT"]
    );
    assert!(!pool.in_transaction().await);
    assert!(pool.pool().is_closed());

    let err = pool.exec("UPDATE t SET n = 2", &[]).await.unwrap_err();
    assert!(err.is_connectivity());
    Ok(())
}

#[tokio::test]
async fn close_reports_a_failed_implicit_commit() -> Result<(), StoreMiddlewareError> {
    let store = FakeStore::new();
    let pool = store.sql_pool(PoolConfig::new(2, 2), TransactionMode::Strict);

    pool.transaction().await?;
    store.set_fail_commit(true);
    assert!(matches!(
        pool.close().await,
        Err(StoreMiddlewareError::StatementError(_))
    ));
    assert!(pool.pool().is_closed());
    assert_eq!(store.closed(), store.connects());
    Ok(())
}

#[tokio::test]
async fn close_releases_idle_connections() -> Result<(), StoreMiddlewareError> {
    let store = FakeStore::new();
    let pool = store.sql_pool(PoolConfig::new(2, 2), TransactionMode::Relaxed);

    pool.exec("UPDATE t SET n = 1", &[]).await?;
    assert_eq!(pool.pool().state().idle, 1);

    pool.close().await?;
    pool.close().await?;
    assert_eq!(pool.pool().state().idle, 0);
    assert_eq!(store.closed(), 1);
    Ok(())
}
