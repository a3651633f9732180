//! Backend connector trait - the pool's only window onto a backend
//!
//! The pool never touches driver-level details; everything it needs from a
//! backend is expressed here. This makes it easy to swap implementations
//! (and to drive the pool with a mock in tests).

use async_trait::async_trait;

/// Produces and retires raw backend connections on behalf of the pool
///
/// `open` failures are the only failure class the pool retries (with
/// bounded backoff); `probe` failures cause the connection to be discarded
/// without retry.
#[async_trait]
pub trait BackendConnector: Send + Sync + 'static {
    /// The raw connection type handed out to callers
    type Conn: Send + 'static;

    /// Open one raw connection to the backend
    async fn open(&self) -> std::io::Result<Self::Conn>;

    /// Check that a connection is still usable
    ///
    /// When a validation query is configured it is passed through here;
    /// connectors that cannot execute queries fall back to a lightweight
    /// liveness check.
    async fn probe(&self, conn: &mut Self::Conn, validation_query: Option<&str>) -> bool;

    /// Close a connection, releasing backend resources
    ///
    /// Close failures are logged by implementations, never surfaced: the
    /// connection is gone either way.
    async fn close(&self, conn: Self::Conn);
}
