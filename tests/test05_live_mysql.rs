#![cfg(feature = "mysql")]
//! Runs against a real server when `STORE_MW_MYSQL_URL` is set, e.g.
//! `mysql://root:pw@127.0.0.1:3306/testing`; returns early otherwise.

use std::env;

use store_middleware::prelude::*;

async fn connect(mode: TransactionMode) -> Result<Option<MysqlPool>, StoreMiddlewareError> {
    let Ok(url) = env::var("STORE_MW_MYSQL_URL") else {
        return Ok(None);
    };
    let pool = SqlPool::new_mysql_from_url(&url, PoolConfig::new(4, 2), mode).await?;
    Ok(Some(pool))
}

#[tokio::test]
async fn round_trip_through_a_real_table() -> Result<(), StoreMiddlewareError> {
    let Some(pool) = connect(TransactionMode::Strict).await? else {
        return Ok(());
    };

    pool.exec("DROP TABLE IF EXISTS store_mw_people", &[]).await?;
    pool.exec(
        "CREATE TABLE store_mw_people (
            id BIGINT PRIMARY KEY AUTO_INCREMENT,
            name VARCHAR(64) NOT NULL,
            score DOUBLE,
            visits INT UNSIGNED,
            big BIGINT UNSIGNED,
            born DATE,
            seen DATETIME(6)
        )",
        &[],
    )
    .await?;

    let id = pool
        .insert(
            "INSERT INTO store_mw_people (name, score, visits, big, born, seen) VALUES (?, ?, ?, ?, ?, ?)",
            &[
                "alice".into(),
                1.5.into(),
                3_i64.into(),
                u64::MAX.into(),
                "1990-04-02".into(),
                "2024-03-01 12:30:45.250000".into(),
            ],
        )
        .await?;
    assert!(id > 0);

    let id = i64::try_from(id).unwrap();
    for (statement, params) in [
        ("SELECT * FROM store_mw_people WHERE id = ?", vec![id.into()]),
        ("SELECT * FROM store_mw_people", vec![]),
    ] {
        let row = pool.get_one(statement, &params).await?;
        assert_eq!(row.get("id"), Some(&RowValues::Int(id)));
        assert_eq!(row.get("name"), Some(&RowValues::Text("alice".into())));
        assert_eq!(row.get("score"), Some(&RowValues::Float(1.5)));
        assert_eq!(row.get("visits"), Some(&RowValues::Int(3)));
        assert_eq!(row.get("big"), Some(&RowValues::UInt(u64::MAX)));
        assert_eq!(row.get("born"), Some(&RowValues::Text("1990-04-02".into())));
        assert!(row.get("seen").and_then(RowValues::as_timestamp).is_some());
    }

    pool.transaction().await?;
    let changed = pool
        .update(
            "UPDATE store_mw_people SET name = ? WHERE id = ?",
            &["bob".into(), id.into()],
        )
        .await?;
    assert_eq!(changed, 1);
    pool.rollback().await?;

    let row = pool
        .get_one("SELECT name FROM store_mw_people WHERE id = ?", &[id.into()])
        .await?;
    assert_eq!(row.get("name").and_then(RowValues::as_text), Some("alice"));

    pool.exec("DROP TABLE store_mw_people", &[]).await?;
    pool.close().await
}

#[tokio::test]
async fn relaxed_handles_commit_independently() -> Result<(), StoreMiddlewareError> {
    let Some(pool) = connect(TransactionMode::Relaxed).await? else {
        return Ok(());
    };

    pool.exec("DROP TABLE IF EXISTS store_mw_counter", &[]).await?;
    pool.exec(
        "CREATE TABLE store_mw_counter (id INT PRIMARY KEY, n INT NOT NULL) ENGINE=InnoDB",
        &[],
    )
    .await?;
    pool.exec("INSERT INTO store_mw_counter VALUES (1, 0), (2, 0)", &[])
        .await?;

    let mut kept = pool.begin().await?;
    let mut dropped = pool.begin().await?;
    kept.update("UPDATE store_mw_counter SET n = 1 WHERE id = 1", &[])
        .await?;
    dropped
        .update("UPDATE store_mw_counter SET n = 1 WHERE id = 2", &[])
        .await?;
    kept.commit().await?;
    dropped.rollback().await?;

    let rs = pool
        .query("SELECT id, n FROM store_mw_counter ORDER BY id", &[])
        .await?;
    let counts: Vec<Option<&i64>> = rs.iter().map(|r| r.get("n").and_then(RowValues::as_int)).collect();
    assert_eq!(counts, [Some(&1), Some(&0)]);

    pool.exec("DROP TABLE store_mw_counter", &[]).await?;
    pool.close().await
}
