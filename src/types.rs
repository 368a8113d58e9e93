//! Result types returned by identd queries.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Charset assumed when the server does not name one.
pub const DEFAULT_CHARSET: &str = "US-ASCII";

/// A successful `USERID` answer from an identd server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    /// Operating system token reported by the server (may be empty).
    pub os: String,

    /// Character set of the identifier, `US-ASCII` unless the server says otherwise.
    pub charset: String,

    /// User identifier, verbatim.
    pub identifier: String,
}

/// Error token carried by an `ERROR` reply.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ResponseErrorKind {
    /// `INVALID-PORT`
    InvalidPort,
    /// `NO-USER`
    NoUser,
    /// `HIDDEN-USER`
    HiddenUser,
    /// `UNKNOWN-ERROR`
    UnknownError,
    /// Any other token, such as an `X-` extension.
    Other(String),
}

impl ResponseErrorKind {
    /// The token exactly as the server sent it.
    pub fn as_str(&self) -> &str {
        match self {
            ResponseErrorKind::InvalidPort => "INVALID-PORT",
            ResponseErrorKind::NoUser => "NO-USER",
            ResponseErrorKind::HiddenUser => "HIDDEN-USER",
            ResponseErrorKind::UnknownError => "UNKNOWN-ERROR",
            ResponseErrorKind::Other(token) => token,
        }
    }
}

impl From<&str> for ResponseErrorKind {
    fn from(token: &str) -> Self {
        match token {
            "INVALID-PORT" => ResponseErrorKind::InvalidPort,
            "NO-USER" => ResponseErrorKind::NoUser,
            "HIDDEN-USER" => ResponseErrorKind::HiddenUser,
            "UNKNOWN-ERROR" => ResponseErrorKind::UnknownError,
            other => ResponseErrorKind::Other(other.to_string()),
        }
    }
}

impl fmt::Display for ResponseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
