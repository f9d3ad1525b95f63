//! Request head parsing
//!
//! Reads the request line and header block from a buffered stream. The body,
//! if a client sends one, is never read.

use std::collections::HashMap;
use std::io;

use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use crate::error::ParseError;

/// Parsed request head
#[derive(Debug, Clone)]
pub struct Request {
    method: String,
    resource: String,
    protocol: String,
    headers: HashMap<String, String>,
}

impl Request {
    /// Uppercased method token
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Lowercased resource token, not decoded
    pub fn resource(&self) -> &str {
        &self.resource
    }

    /// Protocol token exactly as received
    pub fn protocol(&self) -> &str {
        &self.protocol
    }

    /// Header value by lowercase name
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }

    pub fn user_agent(&self) -> &str {
        self.header("user-agent").unwrap_or("")
    }

    pub fn accept_encoding(&self) -> &str {
        self.header("accept-encoding").unwrap_or("")
    }
}

/// Read one request line and its headers, consuming the terminating empty line.
///
/// The header block is read even when the request line turns out to be
/// malformed, so the peer is done sending before it gets the error response.
pub async fn parse_request<R>(reader: &mut R) -> Result<Request, ParseError>
where
    R: AsyncBufRead + Unpin,
{
    let mut buf = Vec::new();
    let Some(request_line) = read_line(reader, &mut buf).await? else {
        return Err(ParseError::Closed);
    };
    let headers = parse_headers(reader, &mut buf).await?;

    let tokens: Vec<&str> = request_line.split_whitespace().take(3).collect();
    let [method, resource, protocol] = tokens.as_slice() else {
        return Err(ParseError::Malformed {
            line: request_line.clone(),
        });
    };

    Ok(Request {
        method: method.to_uppercase(),
        resource: resource.to_lowercase(),
        protocol: protocol.to_string(),
        headers,
    })
}

async fn parse_headers<R>(
    reader: &mut R,
    buf: &mut Vec<u8>,
) -> io::Result<HashMap<String, String>>
where
    R: AsyncBufRead + Unpin,
{
    let mut headers = HashMap::new();

    while let Some(line) = read_line(reader, buf).await? {
        if line.is_empty() {
            break;
        }
        let Some((name, value)) = line.split_once(':') else {
            continue;
        };
        let name = name.trim().to_lowercase();
        if name.is_empty() {
            continue;
        }
        headers.insert(name, value.trim().to_string());
    }

    Ok(headers)
}

/// Next line without its `\n` or `\r\n` terminator, `None` at end of stream
async fn read_line<R>(reader: &mut R, buf: &mut Vec<u8>) -> io::Result<Option<String>>
where
    R: AsyncBufRead + Unpin,
{
    buf.clear();
    if reader.read_until(b'\n', buf).await? == 0 {
        return Ok(None);
    }

    let line = buf.as_slice();
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    let line = line.strip_suffix(b"\r").unwrap_or(line);
    Ok(Some(String::from_utf8_lossy(line).into_owned()))
}
