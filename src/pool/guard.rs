//! RAII guard for checked-out connections
//!
//! Ownership of a connection transfers to the caller on acquire and must
//! come back, either through [`Pool::release`](super::Pool::release) (the
//! validated path) or by dropping the guard, which schedules the same
//! validated return on the current runtime.

use std::sync::Arc;

use tracing::debug;
use uuid::Uuid;

use crate::backend::BackendConnector;

use super::connection::PooledConnection;
use super::manager::PoolInner;

/// A connection checked out of the pool
///
/// Dereferences to the raw backend connection. Prefer returning it with
/// `Pool::release`; a dropped guard is returned in a spawned task, and when
/// no runtime is available the connection is closed and counted as
/// discarded instead.
pub struct PoolGuard<B: BackendConnector> {
    conn: Option<PooledConnection<B::Conn>>,
    inner: Arc<PoolInner<B>>,
}

impl<B: BackendConnector> PoolGuard<B> {
    pub(super) fn new(conn: PooledConnection<B::Conn>, inner: Arc<PoolInner<B>>) -> Self {
        Self {
            conn: Some(conn),
            inner,
        }
    }

    /// Take the connection out, defusing the drop hook
    pub(super) fn into_connection(mut self) -> PooledConnection<B::Conn> {
        self.conn.take().expect("guard holds a connection until consumed")
    }

    /// Unique identifier of the underlying connection
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.conn().id()
    }

    /// Time since the underlying connection was opened
    #[must_use]
    pub fn age(&self) -> std::time::Duration {
        self.conn().age()
    }

    /// Mutable access to the raw backend connection
    pub fn raw_mut(&mut self) -> &mut B::Conn {
        self.conn
            .as_mut()
            .expect("guard holds a connection until consumed")
            .raw_mut()
    }

    fn conn(&self) -> &PooledConnection<B::Conn> {
        self.conn
            .as_ref()
            .expect("guard holds a connection until consumed")
    }
}

impl<B: BackendConnector> std::ops::Deref for PoolGuard<B> {
    type Target = B::Conn;

    fn deref(&self) -> &B::Conn {
        self.conn().raw()
    }
}

impl<B: BackendConnector> std::ops::DerefMut for PoolGuard<B> {
    fn deref_mut(&mut self) -> &mut B::Conn {
        self.raw_mut()
    }
}

impl<B: BackendConnector> std::fmt::Debug for PoolGuard<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PoolGuard")
            .field("id", &self.conn.as_ref().map(PooledConnection::id))
            .finish()
    }
}

impl<B: BackendConnector> Drop for PoolGuard<B> {
    fn drop(&mut self) {
        let Some(conn) = self.conn.take() else {
            return;
        };
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                debug!(connection = %conn.id(), "guard dropped; scheduling return to pool");
                let inner = Arc::clone(&self.inner);
                handle.spawn(async move {
                    inner.return_to_pool(conn, false).await;
                });
            }
            Err(_) => {
                // No runtime to probe or close on; account for the loss
                self.inner.forget_connection(conn);
            }
        }
    }
}
