//! RFC 1413 wire handling: request formatting, reply reading and classification.
//!
//! Everything here works on plain byte streams so it can be driven by a real
//! socket or by an in-memory buffer.

use std::io::{self, BufRead, BufReader, Read, Write};

use tracing::{debug, trace};

use crate::error::{IdentError, Result};
use crate::types::{Response, ResponseErrorKind, DEFAULT_CHARSET};

/// Longest reply RFC 1413 allows, excluding the line terminator.
pub const MAX_LINE_LEN: usize = 1000;

/// Bytes read before giving up on finding a newline (line plus CRLF).
const READ_LIMIT: u64 = MAX_LINE_LEN as u64 + 2;

const FIELD_DELIMITER: &str = " : ";

/// Format the query line for a port pair.
///
/// The first number is `local_port`, the port on the querying machine; the
/// second is `remote_port`, the port on the host being asked.
pub fn format_request(local_port: u16, remote_port: u16) -> String {
    format!("{}, {}\r\n", local_port, remote_port)
}

/// Classify a single reply line.
///
/// The line is trimmed before splitting; a [`IdentError::Protocol`] carries the
/// trimmed text.
pub fn parse_response(line: &str) -> Result<Response> {
    let line = line.trim();
    let fields: Vec<&str> = line.splitn(4, FIELD_DELIMITER).collect();
    if fields.len() < 3 {
        return Err(protocol_error(line));
    }

    match fields[1] {
        "USERID" => {
            if fields.len() != 4 {
                return Err(protocol_error(line));
            }

            let (os, charset) = match fields[2].split_once(',') {
                Some((os, charset)) => (os, charset),
                None => (fields[2], DEFAULT_CHARSET),
            };

            debug!(os, charset, "ident reply: USERID");
            Ok(Response {
                os: os.to_string(),
                charset: charset.to_string(),
                identifier: fields[3].to_string(),
            })
        }
        "ERROR" => {
            if fields.len() != 3 {
                return Err(protocol_error(line));
            }

            let kind = ResponseErrorKind::from(fields[2]);
            debug!(%kind, "ident reply: ERROR");
            Err(IdentError::Response { kind })
        }
        _ => Err(protocol_error(line)),
    }
}

/// Send the query for a port pair over `stream` and parse the single reply line.
///
/// No timeouts are applied here; bound the stream itself if needed.
pub fn exchange<S: Read + Write>(stream: &mut S, remote_port: u16, local_port: u16) -> Result<Response> {
    let request = format_request(local_port, remote_port);
    trace!(request = request.trim_end(), "sending ident query");
    stream
        .write_all(request.as_bytes())
        .map_err(IdentError::WriteError)?;
    stream.flush().map_err(IdentError::WriteError)?;

    let mut buf = Vec::new();
    BufReader::new(stream)
        .take(READ_LIMIT)
        .read_until(b'\n', &mut buf)
        .map_err(IdentError::ReadError)?;

    parse_response(&decode_line(buf)?)
}

/// Async version of [`exchange`].
#[cfg(feature = "tokio")]
pub async fn exchange_async<S>(stream: &mut S, remote_port: u16, local_port: u16) -> Result<Response>
where
    S: tokio::io::AsyncRead + tokio::io::AsyncWrite + Unpin,
{
    use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt};

    let request = format_request(local_port, remote_port);
    trace!(request = request.trim_end(), "sending ident query");
    stream
        .write_all(request.as_bytes())
        .await
        .map_err(IdentError::WriteError)?;
    stream.flush().await.map_err(IdentError::WriteError)?;

    let mut buf = Vec::new();
    tokio::io::BufReader::new(stream)
        .take(READ_LIMIT)
        .read_until(b'\n', &mut buf)
        .await
        .map_err(IdentError::ReadError)?;

    parse_response(&decode_line(buf)?)
}

/// Turn the raw bytes of one read into a reply line.
///
/// Bytes that are not UTF-8 are replaced rather than rejected; the charset
/// field tells the caller how the server meant them.
fn decode_line(buf: Vec<u8>) -> Result<String> {
    if buf.last() != Some(&b'\n') {
        if buf.len() as u64 >= READ_LIMIT {
            return Err(protocol_error(&String::from_utf8_lossy(&buf)));
        }
        return Err(IdentError::ReadError(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "connection closed before end of line",
        )));
    }

    let content = buf.strip_suffix(b"\n").unwrap_or(&buf[..]);
    let content = content.strip_suffix(b"\r").unwrap_or(content);
    if content.len() > MAX_LINE_LEN {
        return Err(protocol_error(&String::from_utf8_lossy(content)));
    }

    let line = match String::from_utf8(buf) {
        Ok(line) => line,
        Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
    };
    trace!(line = line.trim_end(), "received ident reply");
    Ok(line)
}

fn protocol_error(line: &str) -> IdentError {
    IdentError::Protocol {
        line: line.trim().to_string(),
    }
}
