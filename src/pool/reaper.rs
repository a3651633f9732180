//! Background idle reclamation and eager replenishment
//!
//! One task per pool: each cycle it evicts connections idle longer than the
//! configured timeout (never dropping the pool below its floor), then
//! creates connections to restore the floor. It coordinates with callers
//! only through the shared pool state and never holds the state lock across
//! connector I/O.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::backend::BackendConnector;

use super::connection::PooledConnection;
use super::manager::PoolInner;

/// Run reclamation cycles until shutdown is signalled
///
/// Wakes on the configured interval or early when a discard leaves the pool
/// below its floor (via the replenish notifier).
pub(super) async fn run<B: BackendConnector>(
    inner: Arc<PoolInner<B>>,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    info!(
        interval_secs = inner.config.reap_interval.as_secs(),
        idle_timeout_secs = inner.config.idle_timeout.as_secs(),
        "starting pool reclamation task"
    );

    loop {
        tokio::select! {
            _ = tokio::time::sleep(inner.config.reap_interval) => {}
            _ = inner.replenish.notified() => {}
            changed = shutdown_rx.changed() => {
                if changed.is_err() || *shutdown_rx.borrow() {
                    break;
                }
                continue;
            }
        }

        reap_expired(&inner).await;
        replenish_to_floor(&inner).await;
    }

    debug!("pool reclamation task terminated");
}

/// Evict idle connections older than the idle timeout, down to the floor
async fn reap_expired<B: BackendConnector>(inner: &Arc<PoolInner<B>>) {
    if !inner.config.evicts_idle() {
        return;
    }

    // The idle deque is ordered least-recently-used first, so expired
    // connections cluster at the front.
    let expired = {
        let mut state = inner.lock();
        if state.closed {
            return;
        }
        let mut out = Vec::new();
        loop {
            let front_expired = state
                .idle
                .front()
                .is_some_and(|conn| conn.idle_for() > inner.config.idle_timeout);
            if !front_expired || state.total() <= inner.config.min_pool_size {
                break;
            }
            if let Some(conn) = state.idle.pop_front() {
                state.discarded_total += 1;
                out.push(conn);
            }
        }
        out
    };

    if expired.is_empty() {
        return;
    }
    debug!(count = expired.len(), "reclaiming idle connections");
    for conn in expired {
        inner.connector.close(conn.into_raw()).await;
    }
}

/// Create connections until the pool is back at its floor
///
/// Creation happens outside the lock; a creation slot is reserved first so
/// concurrent acquires still respect the cap. A creation failure (after the
/// bounded internal retries) leaves the deficit for the next cycle.
async fn replenish_to_floor<B: BackendConnector>(inner: &Arc<PoolInner<B>>) {
    loop {
        {
            let mut state = inner.lock();
            if state.closed || state.total() >= inner.config.min_pool_size {
                return;
            }
            state.pending += 1;
        }

        match inner.create_with_backoff().await {
            Ok(raw) => {
                let mut conn = PooledConnection::new(raw);
                let stillborn = {
                    let mut state = inner.lock();
                    state.pending -= 1;
                    state.created_total += 1;
                    if state.closed {
                        state.discarded_total += 1;
                        Some(conn)
                    } else {
                        conn.mark_in_use();
                        match state.hand_to_waiter(conn) {
                            None => {
                                // Delivered straight to a waiter
                                state.active += 1;
                                None
                            }
                            Some(mut conn) => {
                                conn.mark_idle();
                                state.idle.push_back(conn);
                                None
                            }
                        }
                    }
                };
                if let Some(conn) = stillborn {
                    inner.connector.close(conn.into_raw()).await;
                    return;
                }
                debug!("replenished one connection toward pool floor");
            }
            Err(e) => {
                inner.lock().pending -= 1;
                warn!(error = %e, "replenishment failed; deferring to next cycle");
                return;
            }
        }
    }
}
