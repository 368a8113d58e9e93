//! # getident
//!
//! A Rust client library for the identification protocol ([RFC 1413]).
//!
//! Ask a remote host's identd which user owns a given TCP connection. Each
//! query opens one connection to port 113, sends one line, reads one line and
//! closes the connection again.
//!
//! ## Features
//!
//! - **Synchronous client**: Default
//! - **Asynchronous client**: Enable the `tokio` feature for async support
//! - **Builder pattern**: Port and timeout configuration
//! - **Typed failures**: Transport, protocol and server-reported errors are distinct
//!
//! ## Quick Start
//!
//! ### Synchronous Usage
//!
//! ```no_run
//! use std::time::Duration;
//!
//! fn main() -> Result<(), getident::IdentError> {
//!     let response = getident::query("192.0.2.7", 6667, 51234, Some(Duration::from_secs(5)))?;
//!
//!     println!("User: {}", response.identifier);
//!     println!("OS: {} ({})", response.os, response.charset);
//!
//!     Ok(())
//! }
//! ```
//!
//! ### Asynchronous Usage (requires `tokio` feature)
//!
//! ```ignore
//! use getident::AsyncClient;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), getident::IdentError> {
//!     let client = AsyncClient::new();
//!     let response = client.query("192.0.2.7", 6667, 51234).await?;
//!
//!     println!("User: {}", response.identifier);
//!
//!     Ok(())
//! }
//! ```
//!
//! ### Handling Failures
//!
//! ```no_run
//! use getident::{Client, ErrorCategory};
//!
//! let client = Client::new();
//! match client.query("192.0.2.7", 6667, 51234) {
//!     Ok(response) => println!("user {}", response.identifier),
//!     Err(e) => match e.category() {
//!         ErrorCategory::Response => println!("server refused: {}", e),
//!         ErrorCategory::Protocol => println!("bad reply: {}", e),
//!         ErrorCategory::Transport => println!("no identd: {}", e),
//!     },
//! }
//! ```
//!
//! [RFC 1413]: https://www.rfc-editor.org/rfc/rfc1413

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod client;
mod error;
pub mod protocol;
mod types;

#[cfg(feature = "tokio")]
mod async_client;

// Re-export main types
pub use client::{Client, ClientBuilder, DEFAULT_PORT, DEFAULT_TIMEOUT};
pub use error::{ErrorCategory, IdentError, Result};
pub use types::{Response, ResponseErrorKind, DEFAULT_CHARSET};

#[cfg(feature = "tokio")]
pub use async_client::{AsyncClient, AsyncClientBuilder};

use std::time::Duration;

/// Query the identd server on `host` for the connection between
/// `remote_port` (on `host`) and `local_port` (on this machine).
///
/// `timeout` bounds the connect and, separately, the exchange after it.
/// `None` or a zero duration means no timeout.
///
/// # Example
///
/// ```no_run
/// let response = getident::query("192.0.2.7", 6667, 51234, None)?;
/// println!("User: {}", response.identifier);
/// # Ok::<(), getident::IdentError>(())
/// ```
pub fn query(host: &str, remote_port: u16, local_port: u16, timeout: Option<Duration>) -> Result<Response> {
    Client::builder()
        .timeout(timeout)
        .build()
        .query(host, remote_port, local_port)
}
