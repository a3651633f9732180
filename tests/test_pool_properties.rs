//! Behavioral tests for the pool's core contract
//!
//! Covers the hard cap on live connections, FIFO fairness among waiters,
//! exhaustion timeouts, and return-to-pool semantics.

mod pool_helpers;

use dbpool::{Pool, PoolError};
use pool_helpers::{test_config, test_config_builder, MockConnector};
use std::time::Duration;

#[tokio::test]
async fn test_connection_count_bounded_by_max() {
    let connector = MockConnector::new();
    let config = test_config_builder(0, 3).prewarm(false).build().unwrap();
    let pool = Pool::connect(config, connector.clone()).await.unwrap();

    let mut guards = Vec::new();
    for _ in 0..3 {
        guards.push(pool.acquire(Duration::from_secs(1)).await.unwrap());
    }
    assert_eq!(connector.opened(), 3);
    assert_eq!(pool.stats().active.get(), 3);

    // A fourth caller must wait, and times out without a release
    let result = pool.acquire(Duration::from_millis(50)).await;
    assert!(matches!(result, Err(PoolError::PoolExhausted { .. })));
    assert_eq!(connector.opened(), 3);

    for guard in guards {
        pool.release(guard).await;
    }
    pool.close().await;
}

#[tokio::test]
async fn test_waiters_served_in_arrival_order() {
    let connector = MockConnector::new();
    let pool = Pool::connect(test_config(0, 1), connector).await.unwrap();

    let guard = pool.acquire(Duration::from_secs(1)).await.unwrap();
    let (order_tx, mut order_rx) = tokio::sync::mpsc::unbounded_channel();

    let mut tasks = Vec::new();
    for label in ["first", "second", "third"] {
        let pool = pool.clone();
        let order_tx = order_tx.clone();
        tasks.push(tokio::spawn(async move {
            let guard = pool.acquire(Duration::from_secs(5)).await.unwrap();
            order_tx.send(label).unwrap();
            pool.release(guard).await;
        }));
        // Let this waiter enqueue before spawning the next one
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    assert_eq!(pool.stats().waiters.get(), 3);
    pool.release(guard).await;

    for task in tasks {
        task.await.unwrap();
    }
    let mut order = Vec::new();
    while let Ok(label) = order_rx.try_recv() {
        order.push(label);
    }
    assert_eq!(order, vec!["first", "second", "third"]);
    pool.close().await;
}

#[tokio::test]
async fn test_exhausted_pool_recovers_on_release() {
    let connector = MockConnector::new();
    let pool = Pool::connect(test_config(2, 5), connector.clone())
        .await
        .unwrap();

    // Two prewarmed connections are reused; three more are created
    let mut guards = Vec::new();
    for _ in 0..5 {
        guards.push(pool.acquire(Duration::from_secs(1)).await.unwrap());
    }
    assert_eq!(connector.opened(), 5);
    assert_eq!(pool.stats().active.get(), 5);
    assert_eq!(pool.stats().idle.get(), 0);

    let result = pool.acquire(Duration::from_millis(100)).await;
    match result {
        Err(PoolError::PoolExhausted { waited }) => {
            assert_eq!(waited, Duration::from_millis(100));
        }
        other => panic!("expected PoolExhausted, got {:?}", other.map(|_| ())),
    }

    // One release makes the next acquire succeed without a new connection
    pool.release(guards.pop().unwrap()).await;
    let guard = pool.acquire(Duration::from_secs(1)).await.unwrap();
    assert_eq!(connector.opened(), 5);

    pool.release(guard).await;
    for guard in guards {
        pool.release(guard).await;
    }
    pool.close().await;
}

#[tokio::test]
async fn test_release_unblocks_parked_waiter() {
    let connector = MockConnector::new();
    let pool = Pool::connect(test_config(0, 1), connector.clone())
        .await
        .unwrap();

    let guard = pool.acquire(Duration::from_secs(1)).await.unwrap();

    let waiter = {
        let pool = pool.clone();
        tokio::spawn(async move {
            let guard = pool.acquire(Duration::from_secs(5)).await.unwrap();
            pool.release(guard).await;
        })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(pool.stats().waiters.get(), 1);

    pool.release(guard).await;
    waiter.await.unwrap();

    // The single connection served both callers
    assert_eq!(connector.opened(), 1);
    assert_eq!(pool.stats().waiters.get(), 0);
    pool.close().await;
}

#[tokio::test]
async fn test_dropped_guard_returns_to_pool() {
    let connector = MockConnector::new();
    let config = test_config_builder(0, 2).prewarm(false).build().unwrap();
    let pool = Pool::connect(config, connector).await.unwrap();

    let guard = pool.acquire(Duration::from_secs(1)).await.unwrap();
    assert_eq!(pool.stats().active.get(), 1);
    drop(guard);

    // The return runs in a spawned task
    tokio::time::sleep(Duration::from_millis(100)).await;
    let stats = pool.stats();
    assert_eq!(stats.active.get(), 0);
    assert_eq!(stats.idle.get(), 1);
    pool.close().await;
}

#[tokio::test]
async fn test_unhealthy_connection_discarded_on_release() {
    let connector = MockConnector::new();
    let config = test_config_builder(0, 2).prewarm(false).build().unwrap();
    let pool = Pool::connect(config, connector.clone()).await.unwrap();

    let guard = pool.acquire(Duration::from_secs(1)).await.unwrap();
    connector.set_healthy(false);
    pool.release(guard).await;

    let stats = pool.stats();
    assert_eq!(stats.idle.get(), 0);
    assert_eq!(stats.discarded.get(), 1);
    assert_eq!(connector.closed(), 1);

    // The pool replaces it on the next acquire
    connector.set_healthy(true);
    let guard = pool.acquire(Duration::from_secs(1)).await.unwrap();
    assert_eq!(connector.opened(), 2);
    pool.release(guard).await;
    pool.close().await;
}

#[tokio::test]
async fn test_unreachable_backend_surfaces_connect_failed() {
    let connector = MockConnector::new();
    connector.set_refuse_opens(true);
    let config = test_config_builder(0, 2)
        .prewarm(false)
        .connect_attempts(3)
        .build()
        .unwrap();
    let pool = Pool::connect(config, connector.clone()).await.unwrap();

    match pool.acquire(Duration::from_secs(1)).await {
        Err(PoolError::ConnectFailed { attempts, .. }) => assert_eq!(attempts, 3),
        other => panic!("expected ConnectFailed, got {:?}", other.map(|_| ())),
    }

    // Recovery: the backend comes back and the pool creates normally
    connector.set_refuse_opens(false);
    let guard = pool.acquire(Duration::from_secs(1)).await.unwrap();
    pool.release(guard).await;
    pool.close().await;
}

#[tokio::test]
async fn test_validate_reports_connection_health() {
    let connector = MockConnector::new();
    let config = test_config_builder(0, 1).prewarm(false).build().unwrap();
    let pool = Pool::connect(config, connector.clone()).await.unwrap();

    let mut guard = pool.acquire(Duration::from_secs(1)).await.unwrap();
    assert!(pool.validate(&mut guard).await.is_ok());

    connector.set_healthy(false);
    let result = pool.validate(&mut guard).await;
    assert!(matches!(result, Err(PoolError::ValidationFailed { .. })));

    pool.release(guard).await;
    pool.close().await;
}
