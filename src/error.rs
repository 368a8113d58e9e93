//! Error types for the ident client.

use std::time::Duration;

use thiserror::Error;

use crate::types::ResponseErrorKind;

/// Errors that can occur while querying an identd server.
#[derive(Debug, Error)]
pub enum IdentError {
    /// Failed to resolve or connect to the identd server.
    #[error("failed to connect to {addr}: {source}")]
    ConnectionFailed {
        /// The `host:port` that was dialed.
        addr: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to send the query line.
    #[error("failed to write query: {0}")]
    WriteError(#[source] std::io::Error),

    /// Failed to read the reply line (including EOF before a newline).
    #[error("failed to read response: {0}")]
    ReadError(#[source] std::io::Error),

    /// The exchange did not finish in time.
    #[error("ident query timed out after {0:?}")]
    Timeout(Duration),

    /// The reply could not be parsed.
    #[error("unexpected response from server: {line}")]
    Protocol {
        /// The trimmed reply line.
        line: String,
    },

    /// The server answered with an `ERROR` reply.
    #[error("ident error: {kind}")]
    Response {
        /// The error token sent by the server.
        kind: ResponseErrorKind,
    },
}

/// Coarse classification of an [`IdentError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Network or I/O failure.
    Transport,
    /// Malformed reply.
    Protocol,
    /// Well-formed `ERROR` reply.
    Response,
}

impl IdentError {
    /// Which of the three failure categories this error belongs to.
    pub fn category(&self) -> ErrorCategory {
        match self {
            IdentError::ConnectionFailed { .. }
            | IdentError::WriteError(_)
            | IdentError::ReadError(_)
            | IdentError::Timeout(_) => ErrorCategory::Transport,
            IdentError::Protocol { .. } => ErrorCategory::Protocol,
            IdentError::Response { .. } => ErrorCategory::Response,
        }
    }

    /// True for network and I/O failures.
    pub fn is_transport(&self) -> bool {
        self.category() == ErrorCategory::Transport
    }

    /// True when the reply was malformed.
    pub fn is_protocol(&self) -> bool {
        self.category() == ErrorCategory::Protocol
    }

    /// True when the server returned an `ERROR` reply.
    pub fn is_response(&self) -> bool {
        self.category() == ErrorCategory::Response
    }
}

/// Result type alias for ident operations.
pub type Result<T> = std::result::Result<T, IdentError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categories() {
        let io = || std::io::Error::from(std::io::ErrorKind::TimedOut);

        assert!(IdentError::ReadError(io()).is_transport());
        assert!(IdentError::WriteError(io()).is_transport());
        assert!(IdentError::Timeout(Duration::from_secs(1)).is_transport());
        assert!(IdentError::Protocol { line: "garbage".into() }.is_protocol());
        assert!(IdentError::Response { kind: ResponseErrorKind::NoUser }.is_response());
    }

    #[test]
    fn test_display() {
        let err = IdentError::Response { kind: ResponseErrorKind::NoUser };
        assert_eq!(err.to_string(), "ident error: NO-USER");

        let err = IdentError::Protocol { line: "garbage".into() };
        assert_eq!(err.to_string(), "unexpected response from server: garbage");
    }
}
