//! Shared test helpers: an in-memory backend connector and config builders

use async_trait::async_trait;
use dbpool::{BackendConnector, PoolConfig, PoolConfigBuilder};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// In-memory connector whose connections are plain tickets
///
/// Health and reachability are toggled from the test body; open/close
/// counters observe what the pool actually did.
#[derive(Clone)]
pub struct MockConnector {
    state: Arc<MockState>,
}

struct MockState {
    opened: AtomicUsize,
    closed: AtomicUsize,
    healthy: AtomicBool,
    refuse_opens: AtomicBool,
}

impl MockConnector {
    pub fn new() -> Self {
        Self {
            state: Arc::new(MockState {
                opened: AtomicUsize::new(0),
                closed: AtomicUsize::new(0),
                healthy: AtomicBool::new(true),
                refuse_opens: AtomicBool::new(false),
            }),
        }
    }

    /// Total connections opened so far
    pub fn opened(&self) -> usize {
        self.state.opened.load(Ordering::SeqCst)
    }

    /// Total connections closed so far
    pub fn closed(&self) -> usize {
        self.state.closed.load(Ordering::SeqCst)
    }

    /// Make subsequent probes succeed or fail
    pub fn set_healthy(&self, healthy: bool) {
        self.state.healthy.store(healthy, Ordering::SeqCst);
    }

    /// Make subsequent opens fail with `ConnectionRefused`
    pub fn set_refuse_opens(&self, refuse: bool) {
        self.state.refuse_opens.store(refuse, Ordering::SeqCst);
    }
}

#[async_trait]
impl BackendConnector for MockConnector {
    type Conn = usize;

    async fn open(&self) -> std::io::Result<usize> {
        if self.state.refuse_opens.load(Ordering::SeqCst) {
            return Err(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "backend refused connection",
            ));
        }
        Ok(self.state.opened.fetch_add(1, Ordering::SeqCst))
    }

    async fn probe(&self, _conn: &mut usize, _validation_query: Option<&str>) -> bool {
        self.state.healthy.load(Ordering::SeqCst)
    }

    async fn close(&self, _conn: usize) {
        self.state.closed.fetch_add(1, Ordering::SeqCst);
    }
}

/// Builder with fast timings suitable for tests
///
/// Idle eviction is off by default; tests that exercise reclamation set
/// their own idle timeout and reap interval.
pub fn test_config_builder(min: usize, max: usize) -> PoolConfigBuilder {
    PoolConfig::builder("mock", "mock://backend:1/test")
        .min_pool_size(min)
        .max_pool_size(max)
        .idle_timeout(Duration::ZERO)
        .connect_backoff(Duration::from_millis(1))
        .reap_interval(Duration::from_millis(50))
}

/// Validated config with fast timings and the given bounds
pub fn test_config(min: usize, max: usize) -> PoolConfig {
    test_config_builder(min, max)
        .build()
        .expect("test config is valid")
}
