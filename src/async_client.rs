//! Asynchronous ident client (requires `tokio` feature).

use std::future::Future;
use std::time::Duration;

use tokio::net::TcpStream;
use tracing::debug;

use crate::client::{join_host_port, DEFAULT_PORT, DEFAULT_TIMEOUT};
use crate::error::{IdentError, Result};
use crate::protocol;
use crate::types::Response;

/// Asynchronous client for querying identd servers.
///
/// This client requires the `tokio` feature to be enabled.
///
/// # Example
///
/// ```no_run
/// use getident::AsyncClient;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), getident::IdentError> {
/// let client = AsyncClient::new();
/// let response = client.query("192.0.2.7", 6667, 51234).await?;
/// println!("User: {}", response.identifier);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct AsyncClient {
    port: u16,
    timeout: Option<Duration>,
}

impl Default for AsyncClient {
    fn default() -> Self {
        Self::new()
    }
}

impl AsyncClient {
    /// Create a new async client with default settings.
    pub fn new() -> Self {
        Self {
            port: DEFAULT_PORT,
            timeout: Some(DEFAULT_TIMEOUT),
        }
    }

    /// Create an async client builder for custom configuration.
    pub fn builder() -> AsyncClientBuilder {
        AsyncClientBuilder::new()
    }

    /// Query the identd server on `host` asynchronously.
    ///
    /// Same exchange as [`Client::query`](crate::Client::query). With a
    /// timeout configured, the connect and the write/read exchange are each
    /// bounded by it separately.
    ///
    /// # Errors
    ///
    /// Returns [`IdentError::Timeout`] when either stage runs out of time,
    /// otherwise the same errors as the blocking client.
    pub async fn query(&self, host: &str, remote_port: u16, local_port: u16) -> Result<Response> {
        let addr = join_host_port(host, self.port);
        debug!(%addr, timeout = ?self.timeout, "connecting to identd");

        let connect = async {
            TcpStream::connect((host, self.port))
                .await
                .map_err(|e| IdentError::ConnectionFailed {
                    addr: addr.clone(),
                    source: e,
                })
        };
        let mut stream = bounded(self.timeout, connect).await?;

        bounded(
            self.timeout,
            protocol::exchange_async(&mut stream, remote_port, local_port),
        )
        .await
    }

    /// Get the configured identd port.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Get the configured timeout.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

/// Run `stage` under `timeout`, if any.
async fn bounded<T, F>(timeout: Option<Duration>, stage: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match timeout {
        Some(timeout) => tokio::time::timeout(timeout, stage)
            .await
            .map_err(|_| IdentError::Timeout(timeout))?,
        None => stage.await,
    }
}

/// Builder for creating a customized [`AsyncClient`].
#[derive(Debug, Clone)]
pub struct AsyncClientBuilder {
    port: u16,
    timeout: Option<Duration>,
}

impl Default for AsyncClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl AsyncClientBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self {
            port: DEFAULT_PORT,
            timeout: Some(DEFAULT_TIMEOUT),
        }
    }

    /// Set the port identd is queried on.
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the timeout.
    ///
    /// Pass `None` or a zero duration to disable timeouts.
    pub fn timeout(mut self, timeout: impl Into<Option<Duration>>) -> Self {
        self.timeout = timeout.into().filter(|t| !t.is_zero());
        self
    }

    /// Build the async client.
    pub fn build(self) -> AsyncClient {
        AsyncClient {
            port: self.port,
            timeout: self.timeout,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
    use tokio::net::TcpListener;

    use crate::types::ResponseErrorKind;

    async fn serve_once(reply: &'static str) -> (u16, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let handle = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut reader = BufReader::new(stream);
            let mut query = String::new();
            reader.read_line(&mut query).await.unwrap();
            reader.get_mut().write_all(reply.as_bytes()).await.unwrap();
            query
        });
        (port, handle)
    }

    #[tokio::test]
    async fn test_async_query_success() {
        let (port, server) = serve_once("6195, 23 : USERID : UNIX,ASCII : stjohns\r\n").await;

        let client = AsyncClient::builder().port(port).build();
        let response = client.query("127.0.0.1", 23, 6195).await.unwrap();

        assert_eq!(server.await.unwrap(), "6195, 23\r\n");
        assert_eq!(response.os, "UNIX");
        assert_eq!(response.charset, "ASCII");
        assert_eq!(response.identifier, "stjohns");
    }

    #[tokio::test]
    async fn test_async_query_error_reply() {
        let (port, server) = serve_once("113, 45 : ERROR : HIDDEN-USER\r\n").await;

        let client = AsyncClient::builder().port(port).timeout(None).build();
        let err = client.query("127.0.0.1", 45, 113).await.unwrap_err();
        server.await.unwrap();

        assert!(matches!(
            err,
            IdentError::Response { kind: ResponseErrorKind::HiddenUser }
        ));
    }

    #[tokio::test]
    async fn test_async_query_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let server = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_millis(500)).await;
            drop(stream);
        });

        let client = AsyncClient::builder()
            .port(port)
            .timeout(Duration::from_millis(100))
            .build();
        let err = client.query("127.0.0.1", 1, 2).await.unwrap_err();

        assert!(matches!(err, IdentError::Timeout(_)));
        assert!(err.is_transport());
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_async_connect_times_out() {
        // Stands in for a connect that never completes; nothing may run after it.
        let wrote_query = std::sync::atomic::AtomicBool::new(false);
        let stage = async {
            std::future::pending::<()>().await;
            wrote_query.store(true, std::sync::atomic::Ordering::SeqCst);
            Ok(())
        };

        let err = bounded(Some(Duration::from_millis(50)), stage).await.unwrap_err();

        assert!(matches!(err, IdentError::Timeout(t) if t == Duration::from_millis(50)));
        assert!(err.is_transport());
        assert!(!wrote_query.load(std::sync::atomic::Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_bounded_without_timeout_passes_result_through() {
        let result = bounded(None, async { Ok(7) }).await.unwrap();

        assert_eq!(result, 7);
    }

    #[test]
    fn test_async_client_builder() {
        let client = AsyncClient::builder()
            .port(1113)
            .timeout(Duration::from_secs(10))
            .build();

        assert_eq!(client.port(), 1113);
        assert_eq!(client.timeout(), Some(Duration::from_secs(10)));
    }

    #[test]
    fn test_async_client_builder_no_timeout() {
        let client = AsyncClient::builder().timeout(None).build();

        assert_eq!(client.timeout(), None);
    }

    #[test]
    fn test_default_async_client() {
        let client = AsyncClient::new();

        assert_eq!(client.port(), DEFAULT_PORT);
        assert_eq!(client.timeout(), Some(DEFAULT_TIMEOUT));
    }
}
