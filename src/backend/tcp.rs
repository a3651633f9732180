//! TCP backend connector
//!
//! Opens socket2-tuned TCP connections to the backend address from the
//! connection URI. The liveness probe uses a non-blocking peek: an idle,
//! healthy connection has nothing to read, so `WouldBlock` is the expected
//! (healthy) outcome.

use async_trait::async_trait;
use socket2::{SockRef, TcpKeepalive};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::config::PoolConfig;
use crate::constants::{socket, CONNECT_TIMEOUT};
use crate::error::PoolError;

use super::connector::BackendConnector;

/// Connector that opens tuned TCP streams to a fixed backend address
#[derive(Debug, Clone)]
pub struct TcpConnector {
    addr: String,
    connect_timeout: std::time::Duration,
}

impl TcpConnector {
    /// Create a connector for the given `host:port` address
    #[must_use]
    pub fn new(addr: impl Into<String>) -> Self {
        Self {
            addr: addr.into(),
            connect_timeout: CONNECT_TIMEOUT,
        }
    }

    /// Build a connector from the pool configuration's connection URI
    ///
    /// # Errors
    ///
    /// Returns `ConfigInvalid` if the URI has no `host:port` authority.
    pub fn from_config(config: &PoolConfig) -> Result<Self, PoolError> {
        let authority = config
            .url
            .authority()
            .map_err(|e| PoolError::ConfigInvalid(e.to_string()))?;
        Ok(Self::new(authority))
    }

    /// Backend address this connector dials
    #[must_use]
    pub fn addr(&self) -> &str {
        &self.addr
    }

    /// Apply keepalive and latency tuning to a fresh stream
    fn tune(stream: &TcpStream) -> std::io::Result<()> {
        let sock = SockRef::from(stream);
        sock.set_nodelay(true)?;
        let keepalive = TcpKeepalive::new()
            .with_time(socket::KEEPALIVE_TIME)
            .with_interval(socket::KEEPALIVE_INTERVAL);
        sock.set_tcp_keepalive(&keepalive)?;
        Ok(())
    }
}

#[async_trait]
impl BackendConnector for TcpConnector {
    type Conn = TcpStream;

    async fn open(&self) -> std::io::Result<TcpStream> {
        let stream = timeout(self.connect_timeout, TcpStream::connect(&self.addr))
            .await
            .map_err(|_| {
                std::io::Error::new(
                    std::io::ErrorKind::TimedOut,
                    format!("connect to {} timed out", self.addr),
                )
            })??;

        if let Err(e) = Self::tune(&stream) {
            // Tuning is best-effort; an untuned connection still works
            warn!(addr = %self.addr, error = %e, "failed to tune backend socket");
        }

        debug!(addr = %self.addr, "opened backend connection");
        Ok(stream)
    }

    async fn probe(&self, conn: &mut TcpStream, validation_query: Option<&str>) -> bool {
        if validation_query.is_some() {
            // A raw TCP connector has no query channel; the peek below is
            // the strongest check available at this layer.
            debug!("validation query configured but not executable over raw TCP");
        }

        let mut peek_buf = [0u8; socket::PEEK_BUFFER_SIZE];
        match conn.try_read(&mut peek_buf) {
            // EOF: closed by the backend
            Ok(0) => false,
            // Unconsumed data on an idle connection; reject it
            Ok(_) => false,
            // No data pending is the healthy case for an idle connection
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => true,
            Err(e) => {
                debug!(error = %e, "liveness probe failed");
                false
            }
        }
    }

    async fn close(&self, conn: TcpStream) {
        use tokio::io::AsyncWriteExt;
        let mut conn = conn;
        if let Err(e) = conn.shutdown().await {
            debug!(error = %e, "error shutting down backend connection");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PoolConfig;
    use tokio::io::AsyncWriteExt;
    use tokio::net::TcpListener;

    #[test]
    fn test_from_config_extracts_authority() {
        let config = PoolConfig::builder("mysql", "mysql://db.example.com:3306/shop")
            .build()
            .unwrap();
        let connector = TcpConnector::from_config(&config).unwrap();
        assert_eq!(connector.addr(), "db.example.com:3306");
    }

    #[test]
    fn test_from_config_bare_address() {
        let config = PoolConfig::builder("mysql", "db.example.com:3306")
            .build()
            .unwrap();
        let connector = TcpConnector::from_config(&config).unwrap();
        assert_eq!(connector.addr(), "db.example.com:3306");
    }

    #[test]
    fn test_from_config_rejects_missing_authority() {
        let config = PoolConfig::builder("mysql", "mysql:///shop").build().unwrap();
        assert!(matches!(
            TcpConnector::from_config(&config),
            Err(PoolError::ConfigInvalid(_))
        ));
    }

    #[tokio::test]
    async fn test_open_and_probe_live_connection() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let connector = TcpConnector::new(addr.to_string());

        let accept = tokio::spawn(async move { listener.accept().await.unwrap().0 });
        let mut conn = connector.open().await.unwrap();
        let _server_side = accept.await.unwrap();

        assert!(connector.probe(&mut conn, None).await);
        connector.close(conn).await;
    }

    #[tokio::test]
    async fn test_probe_detects_closed_connection() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let connector = TcpConnector::new(addr.to_string());

        let accept = tokio::spawn(async move { listener.accept().await.unwrap().0 });
        let mut conn = connector.open().await.unwrap();
        let server_side = accept.await.unwrap();

        drop(server_side);
        // Give the FIN time to arrive
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        assert!(!connector.probe(&mut conn, None).await);
    }

    #[tokio::test]
    async fn test_probe_rejects_unconsumed_data() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let connector = TcpConnector::new(addr.to_string());

        let accept = tokio::spawn(async move { listener.accept().await.unwrap().0 });
        let mut conn = connector.open().await.unwrap();
        let mut server_side = accept.await.unwrap();

        server_side.write_all(b"unexpected").await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        assert!(!connector.probe(&mut conn, None).await);
    }

    #[tokio::test]
    async fn test_open_unreachable_backend_fails() {
        // Port 1 on localhost is almost certainly closed
        let connector = TcpConnector::new("127.0.0.1:1");
        assert!(connector.open().await.is_err());
    }
}
