//! Connection pool manager
//!
//! Owns the bounded set of live backend connections and serves
//! acquire/release requests from concurrent callers. All shared state lives
//! behind a single mutex; connector I/O (open/probe/close) always happens
//! outside it. Waiting acquirers park on per-waiter oneshot channels and are
//! served in FIFO arrival order.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::{oneshot, watch, Notify};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::backend::BackendConnector;
use crate::config::PoolConfig;
use crate::error::{PoolError, PoolResult};
use crate::types::{
    ActiveConnections, CreatedConnections, DiscardedConnections, IdleConnections, PoolStats,
    WaitingAcquirers,
};

use super::connection::PooledConnection;
use super::guard::PoolGuard;
use super::reaper;

/// Message delivered to a parked acquirer
pub(super) enum Handoff<C> {
    /// A connection, ownership included
    Ready(PooledConnection<C>),
    /// Capacity freed up; re-run the acquisition loop
    Retry,
}

struct Waiter<C> {
    id: u64,
    tx: oneshot::Sender<Handoff<C>>,
}

/// Mutable pool state, guarded by a single mutex
pub(super) struct PoolState<C> {
    pub(super) idle: VecDeque<PooledConnection<C>>,
    waiters: VecDeque<Waiter<C>>,
    pub(super) active: usize,
    /// Connection creations currently in flight; counted against the cap
    pub(super) pending: usize,
    pub(super) closed: bool,
    pub(super) created_total: usize,
    pub(super) discarded_total: usize,
    next_waiter_id: u64,
}

impl<C> PoolState<C> {
    fn new() -> Self {
        Self {
            idle: VecDeque::new(),
            waiters: VecDeque::new(),
            active: 0,
            pending: 0,
            closed: false,
            created_total: 0,
            discarded_total: 0,
            next_waiter_id: 0,
        }
    }

    /// Live connections plus creations in flight
    pub(super) fn total(&self) -> usize {
        self.active + self.idle.len() + self.pending
    }

    /// Number of queued waiters
    pub(super) fn waiter_count(&self) -> usize {
        self.waiters.len()
    }

    /// Hand out the next waiter id; ids are monotonic in arrival order
    fn allocate_waiter_id(&mut self) -> u64 {
        let id = self.next_waiter_id;
        self.next_waiter_id += 1;
        id
    }

    /// Insert a waiter at its id-sorted position
    ///
    /// Ids are allocated in arrival order, so a queue sorted by id is a
    /// FIFO queue. Sorted insertion (rather than push_back) matters for
    /// retried waiters: two waiters woken with `Retry` can re-enqueue in
    /// either order, and each must land back in its original position.
    fn enqueue_waiter(&mut self, waiter: Waiter<C>) {
        let pos = self
            .waiters
            .iter()
            .position(|w| w.id > waiter.id)
            .unwrap_or(self.waiters.len());
        self.waiters.insert(pos, waiter);
    }

    /// Offer a connection to the first live waiter, FIFO
    ///
    /// Waiters whose receiver is already gone (timed out between handoff and
    /// unregistration) are skipped. Returns the connection if nobody took it.
    pub(super) fn hand_to_waiter(&mut self, conn: PooledConnection<C>) -> Option<PooledConnection<C>> {
        let mut conn = conn;
        while let Some(waiter) = self.waiters.pop_front() {
            conn.touch();
            match waiter.tx.send(Handoff::Ready(conn)) {
                Ok(()) => return None,
                Err(Handoff::Ready(returned)) => conn = returned,
                Err(Handoff::Retry) => unreachable!("retry is never handed back"),
            }
        }
        Some(conn)
    }

    /// Tell the first live waiter that capacity freed up
    fn wake_one_retry(&mut self) {
        while let Some(waiter) = self.waiters.pop_front() {
            if waiter.tx.send(Handoff::Retry).is_ok() {
                return;
            }
        }
    }

    /// Remove a waiter by id; false means a handoff already claimed it
    fn unregister_waiter(&mut self, id: u64) -> bool {
        if let Some(pos) = self.waiters.iter().position(|w| w.id == id) {
            self.waiters.remove(pos);
            true
        } else {
            false
        }
    }
}

/// Shared pool internals, reachable from guards and the reaper task
pub(super) struct PoolInner<B: BackendConnector> {
    pub(super) connector: B,
    pub(super) config: PoolConfig,
    state: Mutex<PoolState<B::Conn>>,
    /// Nudges the reaper to replenish ahead of its next cycle
    pub(super) replenish: Notify,
    shutdown_tx: watch::Sender<bool>,
}

impl<B: BackendConnector> PoolInner<B> {
    pub(super) fn lock(&self) -> MutexGuard<'_, PoolState<B::Conn>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Open one connection, retrying with doubling backoff
    ///
    /// This is the only internally retried failure class; the attempt count
    /// and delays come from the configuration.
    pub(super) async fn create_with_backoff(&self) -> PoolResult<B::Conn> {
        use crate::constants::backoff::MAX_CONNECT_BACKOFF;

        let attempts = self.config.connect_attempts;
        let mut delay = self.config.connect_backoff;
        let mut last_err: Option<std::io::Error> = None;

        for attempt in 1..=attempts {
            match self.connector.open().await {
                Ok(raw) => return Ok(raw),
                Err(e) => {
                    warn!(
                        attempt,
                        attempts,
                        error = %e,
                        "backend connection attempt failed"
                    );
                    last_err = Some(e);
                }
            }
            if attempt < attempts {
                tokio::time::sleep(delay).await;
                delay = (delay * 2).min(MAX_CONNECT_BACKOFF);
            }
        }

        Err(PoolError::connect_failed(
            attempts,
            last_err.unwrap_or_else(|| std::io::Error::other("no connection attempt made")),
        ))
    }

    /// Return a checked-out connection to the pool
    ///
    /// The connection is probed first (unless `validated`); unhealthy
    /// connections are discarded and, if the pool dropped below the floor,
    /// the replenisher is nudged. Healthy connections go to the first FIFO
    /// waiter or back to the idle set.
    pub(super) async fn return_to_pool(&self, mut conn: PooledConnection<B::Conn>, validated: bool) {
        let healthy = if validated {
            true
        } else {
            self.connector
                .probe(conn.raw_mut(), self.config.validation_query.as_deref())
                .await
        };

        let mut to_close = None;
        let mut nudge = false;
        {
            let mut state = self.lock();
            if state.closed {
                state.active -= 1;
                state.discarded_total += 1;
                to_close = Some(conn.into_raw());
            } else if !healthy {
                let id = conn.id();
                state.active -= 1;
                state.discarded_total += 1;
                nudge = state.total() < self.config.min_pool_size;
                state.wake_one_retry();
                to_close = Some(conn.into_raw());
                warn!(connection = %id, "discarding connection that failed validation on release");
            } else if let Some(mut conn) = state.hand_to_waiter(conn) {
                // No waiter took it; park it
                state.active -= 1;
                conn.mark_idle();
                state.idle.push_back(conn);
            }
        }

        if let Some(raw) = to_close {
            self.connector.close(raw).await;
        }
        if nudge {
            self.replenish.notify_one();
        }
    }

    /// Discard a connection that failed an acquire-time probe
    async fn discard_unvalidated(&self, conn: PooledConnection<B::Conn>) {
        let id = conn.id();
        let nudge;
        {
            let mut state = self.lock();
            state.active -= 1;
            state.discarded_total += 1;
            nudge = state.total() < self.config.min_pool_size;
            state.wake_one_retry();
        }
        self.connector.close(conn.into_raw()).await;
        warn!(connection = %id, "discarding stale connection found during acquire");
        if nudge {
            self.replenish.notify_one();
        }
    }

    /// Synchronous bookkeeping for a connection dropped outside a runtime
    pub(super) fn forget_connection(&self, conn: PooledConnection<B::Conn>) {
        let mut state = self.lock();
        state.active -= 1;
        state.discarded_total += 1;
        state.wake_one_retry();
        drop(conn.into_raw());
    }
}

/// What the acquisition loop decided to do, with the lock already released
enum Plan<C> {
    Validate(PooledConnection<C>, bool),
    Create,
    Wait(oneshot::Receiver<Handoff<C>>, u64),
}

/// Bounded, FIFO-fair connection pool over a [`BackendConnector`]
///
/// Cheap to clone; all clones share the same pool.
///
/// # Examples
///
/// ```no_run
/// use dbpool::{Pool, PoolConfig, TcpConnector};
/// use std::time::Duration;
///
/// # async fn example() -> Result<(), dbpool::PoolError> {
/// let config = PoolConfig::builder("mysql", "mysql://db.example.com:3306/shop")
///     .min_pool_size(2)
///     .max_pool_size(10)
///     .build()?;
/// let connector = TcpConnector::from_config(&config)?;
/// let pool = Pool::connect(config, connector).await?;
///
/// let conn = pool.acquire(Duration::from_secs(5)).await?;
/// // ... use the connection ...
/// pool.release(conn).await;
/// pool.close().await;
/// # Ok(())
/// # }
/// ```
pub struct Pool<B: BackendConnector> {
    inner: Arc<PoolInner<B>>,
}

impl<B: BackendConnector> Clone for Pool<B> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<B: BackendConnector> std::fmt::Debug for Pool<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let stats = self.stats();
        f.debug_struct("Pool")
            .field("driver", &self.inner.config.driver.as_str())
            .field("stats", &stats)
            .finish()
    }
}

impl<B: BackendConnector> Pool<B> {
    /// Build a pool from a validated configuration and a connector
    ///
    /// Pre-creates `min_pool_size` connections when `prewarm` is enabled
    /// (the default) and starts the background reclamation task.
    ///
    /// # Errors
    ///
    /// `ConfigInvalid` for a rejected configuration; `ConnectFailed` if the
    /// eager startup fill cannot reach the backend after bounded retries.
    pub async fn connect(config: PoolConfig, connector: B) -> PoolResult<Self> {
        config.validate()?;

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let inner = Arc::new(PoolInner {
            connector,
            config,
            state: Mutex::new(PoolState::new()),
            replenish: Notify::new(),
            shutdown_tx,
        });
        let pool = Self { inner };

        if pool.inner.config.prewarm {
            pool.prewarm().await?;
        }

        tokio::spawn(reaper::run(Arc::clone(&pool.inner), shutdown_rx));

        info!(
            driver = %pool.inner.config.driver,
            min = pool.inner.config.min_pool_size,
            max = pool.inner.config.max_pool_size,
            prewarm = pool.inner.config.prewarm,
            "connection pool started"
        );
        Ok(pool)
    }

    /// Eagerly fill the pool to the configured floor
    async fn prewarm(&self) -> PoolResult<()> {
        let floor = self.inner.config.min_pool_size;
        for _ in 0..floor {
            {
                let mut state = self.inner.lock();
                if state.total() >= floor {
                    break;
                }
                state.pending += 1;
            }
            match self.inner.create_with_backoff().await {
                Ok(raw) => {
                    let mut conn = PooledConnection::new(raw);
                    conn.mark_idle();
                    let mut state = self.inner.lock();
                    state.pending -= 1;
                    state.created_total += 1;
                    state.idle.push_back(conn);
                }
                Err(e) => {
                    self.inner.lock().pending -= 1;
                    return Err(e);
                }
            }
        }
        debug!(count = floor, "pool prewarmed to floor");
        Ok(())
    }

    /// Acquire a connection, waiting up to `timeout`
    ///
    /// Hands out an idle connection (probed first when it has been idle
    /// longer than the staleness window), creates one when the pool is
    /// under its cap, or joins the FIFO wait queue otherwise.
    ///
    /// # Errors
    ///
    /// - `PoolExhausted` if no connection became available in time
    /// - `PoolClosed` after shutdown
    /// - `ConnectFailed` if a needed creation failed after bounded retries
    pub async fn acquire(&self, timeout: Duration) -> PoolResult<PoolGuard<B>> {
        let deadline = Instant::now() + timeout;
        // Set after a Retry handoff so the caller keeps its original queue
        // position (and arrival id) when it has to wait again
        let mut resume_id = None;

        loop {
            let plan = {
                let mut state = self.inner.lock();
                if state.closed {
                    return Err(PoolError::PoolClosed);
                }
                if let Some(mut conn) = state.idle.pop_front() {
                    let needs_probe = conn.stale(self.inner.config.validation_window);
                    state.active += 1;
                    conn.mark_in_use();
                    Plan::Validate(conn, needs_probe)
                } else if state.total() < self.inner.config.max_pool_size {
                    state.pending += 1;
                    Plan::Create
                } else {
                    let (tx, rx) = oneshot::channel();
                    let id = match resume_id {
                        Some(id) => id,
                        None => state.allocate_waiter_id(),
                    };
                    state.enqueue_waiter(Waiter { id, tx });
                    Plan::Wait(rx, id)
                }
            };

            match plan {
                Plan::Validate(mut conn, needs_probe) => {
                    if !needs_probe {
                        return Ok(PoolGuard::new(conn, Arc::clone(&self.inner)));
                    }
                    let query = self.inner.config.validation_query.as_deref();
                    let probe = self.inner.connector.probe(conn.raw_mut(), query);
                    match tokio::time::timeout_at(deadline, probe).await {
                        Ok(true) => {
                            return Ok(PoolGuard::new(conn, Arc::clone(&self.inner)));
                        }
                        Ok(false) => {
                            self.inner.discard_unvalidated(conn).await;
                            // Try again within the same deadline
                        }
                        Err(_elapsed) => {
                            // The probe overran the caller's deadline; the
                            // connection's health is unknown, so it is not
                            // returned to the idle set
                            self.inner.discard_unvalidated(conn).await;
                            return Err(PoolError::PoolExhausted { waited: timeout });
                        }
                    }
                }
                Plan::Create => {
                    let created =
                        tokio::time::timeout_at(deadline, self.inner.create_with_backoff()).await;
                    match created {
                        Ok(Ok(raw)) => {
                            let mut conn = PooledConnection::new(raw);
                            conn.mark_in_use();
                            let mut state = self.inner.lock();
                            state.pending -= 1;
                            state.active += 1;
                            state.created_total += 1;
                            drop(state);
                            return Ok(PoolGuard::new(conn, Arc::clone(&self.inner)));
                        }
                        Ok(Err(e)) => {
                            let mut state = self.inner.lock();
                            state.pending -= 1;
                            state.wake_one_retry();
                            return Err(e);
                        }
                        Err(_elapsed) => {
                            let mut state = self.inner.lock();
                            state.pending -= 1;
                            state.wake_one_retry();
                            return Err(PoolError::PoolExhausted { waited: timeout });
                        }
                    }
                }
                Plan::Wait(mut rx, id) => {
                    tokio::select! {
                        handoff = &mut rx => match handoff {
                            Ok(Handoff::Ready(conn)) => {
                                return Ok(PoolGuard::new(conn, Arc::clone(&self.inner)));
                            }
                            Ok(Handoff::Retry) => {
                                resume_id = Some(id);
                            }
                            Err(_) => {
                                // Senders are only dropped unsent at shutdown
                                if self.inner.lock().closed {
                                    return Err(PoolError::PoolClosed);
                                }
                                resume_id = Some(id);
                            }
                        },
                        _ = tokio::time::sleep_until(deadline) => {
                            return self.give_up_waiting(rx, id, timeout).await;
                        }
                    }
                }
            }
        }
    }

    /// Unregister a timed-out waiter, resolving any racing handoff
    ///
    /// A handoff sent before we removed ourselves from the queue is sitting
    /// in the channel; the connection must go back to the pool rather than
    /// leak past a caller that already gave up.
    async fn give_up_waiting(
        &self,
        mut rx: oneshot::Receiver<Handoff<B::Conn>>,
        id: u64,
        waited: Duration,
    ) -> PoolResult<PoolGuard<B>> {
        let still_queued = self.inner.lock().unregister_waiter(id);
        if !still_queued {
            match rx.try_recv() {
                Ok(Handoff::Ready(conn)) => {
                    debug!(connection = %conn.id(), "returning connection from raced handoff");
                    self.inner.return_to_pool(conn, true).await;
                }
                Ok(Handoff::Retry) => {
                    // Pass the capacity signal along
                    self.inner.lock().wake_one_retry();
                }
                Err(_) => {}
            }
        }
        Err(PoolError::PoolExhausted { waited })
    }

    /// Return a connection to the pool after probing it
    ///
    /// Unhealthy connections are discarded and counted; see
    /// [`PoolStats::discarded`](crate::types::PoolStats).
    pub async fn release(&self, guard: PoolGuard<B>) {
        let conn = guard.into_connection();
        self.inner.return_to_pool(conn, false).await;
    }

    /// Probe a checked-out connection without returning it
    ///
    /// Runs the configured validation query (or the connector's liveness
    /// check) against the connection the caller is holding.
    ///
    /// # Errors
    ///
    /// `ValidationFailed` when the probe reports the connection unusable.
    /// The connection stays checked out; releasing it will discard it.
    pub async fn validate(&self, guard: &mut PoolGuard<B>) -> PoolResult<()> {
        let query = self.inner.config.validation_query.as_deref();
        if self.inner.connector.probe(guard.raw_mut(), query).await {
            Ok(())
        } else {
            Err(PoolError::ValidationFailed {
                reason: format!("connection {} failed liveness probe", guard.id()),
            })
        }
    }

    /// Point-in-time pool statistics
    #[must_use]
    pub fn stats(&self) -> PoolStats {
        let state = self.inner.lock();
        PoolStats {
            active: ActiveConnections::new(state.active),
            idle: IdleConnections::new(state.idle.len()),
            waiters: WaitingAcquirers::new(state.waiter_count()),
            created: CreatedConnections::new(state.created_total),
            discarded: DiscardedConnections::new(state.discarded_total),
        }
    }

    /// Whether `close()` has run
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.inner.lock().closed
    }

    /// The configuration this pool was built from
    #[must_use]
    pub fn config(&self) -> &PoolConfig {
        &self.inner.config
    }

    /// Shut the pool down
    ///
    /// Stops the reclamation task, fails queued waiters with `PoolClosed`,
    /// and closes idle connections. Checked-out connections are closed as
    /// they are released. Idempotent.
    pub async fn close(&self) {
        let _ = self.inner.shutdown_tx.send(true);

        let (idle, waiters) = {
            let mut state = self.inner.lock();
            if state.closed {
                return;
            }
            state.closed = true;
            state.discarded_total += state.idle.len();
            (
                std::mem::take(&mut state.idle),
                std::mem::take(&mut state.waiters),
            )
        };

        // Dropping the senders fails queued acquirers with PoolClosed
        drop(waiters);

        let count = idle.len();
        for conn in idle {
            self.inner.connector.close(conn.into_raw()).await;
        }
        info!(closed = count, "connection pool shut down");
    }
}
