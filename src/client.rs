//! Synchronous ident client.

use std::io::{self, Read, Write};
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::time::{Duration, Instant};

use tracing::debug;

use crate::error::{IdentError, Result};
use crate::protocol;
use crate::types::Response;

/// Port identd listens on.
pub const DEFAULT_PORT: u16 = 113;

/// Default timeout for connecting and for the exchange that follows.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Synchronous client for querying identd servers.
///
/// # Example
///
/// ```no_run
/// use getident::Client;
///
/// let client = Client::new();
/// let response = client.query("192.0.2.7", 6667, 51234)?;
/// println!("User: {}", response.identifier);
/// # Ok::<(), getident::IdentError>(())
/// ```
#[derive(Debug, Clone)]
pub struct Client {
    port: u16,
    timeout: Option<Duration>,
}

impl Default for Client {
    fn default() -> Self {
        Self::new()
    }
}

impl Client {
    /// Create a new client with default settings.
    ///
    /// Queries port 113 with a five second timeout.
    pub fn new() -> Self {
        Self {
            port: DEFAULT_PORT,
            timeout: Some(DEFAULT_TIMEOUT),
        }
    }

    /// Create a client builder for custom configuration.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Ask the identd server on `host` who owns the connection between
    /// `remote_port` (on `host`) and `local_port` (on this machine).
    ///
    /// Opens one connection, sends `"<local_port>, <remote_port>\r\n"`, reads
    /// one reply line and closes the connection.
    ///
    /// With a timeout configured, the connect is bounded by it, and the write
    /// and read together must finish within the same duration measured from
    /// the moment the connection was established.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The host cannot be resolved or connected to
    /// - Writing the query or reading the reply fails or times out
    /// - The reply is malformed ([`IdentError::Protocol`])
    /// - The server answers with `ERROR` ([`IdentError::Response`])
    pub fn query(&self, host: &str, remote_port: u16, local_port: u16) -> Result<Response> {
        self.query_with(host, remote_port, local_port, TcpStream::connect_timeout)
    }

    /// Get the configured identd port.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Get the configured timeout.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    fn query_with<D>(&self, host: &str, remote_port: u16, local_port: u16, dial: D) -> Result<Response>
    where
        D: FnMut(&SocketAddr, Duration) -> io::Result<TcpStream>,
    {
        let stream = self.connect(host, dial)?;
        let deadline = self.timeout.map(|timeout| Instant::now() + timeout);

        let mut stream = DeadlineStream {
            stream: &stream,
            deadline,
        };
        protocol::exchange(&mut stream, remote_port, local_port)
    }

    fn connect<D>(&self, host: &str, dial: D) -> Result<TcpStream>
    where
        D: FnMut(&SocketAddr, Duration) -> io::Result<TcpStream>,
    {
        let addr = join_host_port(host, self.port);
        debug!(%addr, timeout = ?self.timeout, "connecting to identd");

        let connect_failed = |source| IdentError::ConnectionFailed {
            addr: addr.clone(),
            source,
        };

        let timeout = match self.timeout {
            Some(timeout) => timeout,
            None => return TcpStream::connect((host, self.port)).map_err(connect_failed),
        };

        let addrs = (host, self.port).to_socket_addrs().map_err(connect_failed)?;
        dial_within(addrs, timeout, dial).map_err(connect_failed)
    }
}

/// Try each address in turn, all attempts sharing one `timeout` budget.
fn dial_within<T, I, D>(addrs: I, timeout: Duration, mut dial: D) -> io::Result<T>
where
    I: IntoIterator<Item = SocketAddr>,
    D: FnMut(&SocketAddr, Duration) -> io::Result<T>,
{
    let deadline = Instant::now() + timeout;
    let mut last_err = None;

    for addr in addrs {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Err(io::Error::new(io::ErrorKind::TimedOut, "ident connect timed out"));
        }
        match dial(&addr, remaining) {
            Ok(stream) => return Ok(stream),
            Err(e) => last_err = Some(e),
        }
    }

    Err(last_err.unwrap_or_else(|| {
        io::Error::new(io::ErrorKind::InvalidInput, "host resolved to no addresses")
    }))
}

/// Builder for creating a customized [`Client`].
///
/// # Example
///
/// ```no_run
/// use std::time::Duration;
/// use getident::Client;
///
/// let client = Client::builder()
///     .port(1113)
///     .timeout(Duration::from_secs(10))
///     .build();
/// ```
#[derive(Debug, Clone)]
pub struct ClientBuilder {
    port: u16,
    timeout: Option<Duration>,
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ClientBuilder {
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

    /// Build the client.
    pub fn build(self) -> Client {
        Client {
            port: self.port,
            timeout: self.timeout,
        }
    }
}

/// Format `host:port`, bracketing IPv6 literals.
pub(crate) fn join_host_port(host: &str, port: u16) -> String {
    if host.contains(':') {
        format!("[{}]:{}", host, port)
    } else {
        format!("{}:{}", host, port)
    }
}

/// Socket wrapper that gives every read and write only the time left until
/// a fixed deadline.
struct DeadlineStream<'a> {
    stream: &'a TcpStream,
    deadline: Option<Instant>,
}

impl DeadlineStream<'_> {
    fn remaining(&self) -> io::Result<Option<Duration>> {
        let Some(deadline) = self.deadline else {
            return Ok(None);
        };
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Err(io::Error::new(io::ErrorKind::TimedOut, "ident deadline elapsed"));
        }
        Ok(Some(remaining))
    }
}

impl Read for DeadlineStream<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.stream.set_read_timeout(self.remaining()?)?;
        self.stream.read(buf)
    }
}

impl Write for DeadlineStream<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.stream.set_write_timeout(self.remaining()?)?;
        self.stream.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.stream.flush()
    }
}
