//! Response head framing
//!
//! Serializes the status line and the fixed header set. Body bytes are written
//! separately through [`super::encoding::BodyEncoder`].

use std::fmt::Write as _;

use chrono::{DateTime, Utc};

use super::encoding::ResponseEncoding;
use super::status::Status;

/// Protocol echoed when the request line could not be parsed
pub const FALLBACK_PROTOCOL: &str = "HTTP/1.0";

/// `Date` header value, e.g. `Mon, 02 Jan 2006 15:04:05 GMT`
pub fn http_date(time: &DateTime<Utc>) -> String {
    time.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// Everything that goes before the body
#[derive(Debug, Clone)]
pub struct ResponseHead<'a> {
    pub protocol: &'a str,
    pub status: Status,
    pub server: &'a str,
    pub date: &'a str,
    pub encoding: ResponseEncoding,
    pub content_type: String,
    /// Length of the body before any compression
    pub content_length: u64,
}

impl ResponseHead<'_> {
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut head = String::with_capacity(256);
        // Writing into a String cannot fail
        let _ = write!(head, "{} {}\r\n", self.protocol, self.status);
        let _ = write!(head, "Server: {}\r\n", self.server);
        let _ = write!(head, "Date: {}\r\n", self.date);
        if let Some(encoding) = self.encoding.header_value() {
            let _ = write!(head, "Content-Encoding: {encoding}\r\n");
        }
        let _ = write!(head, "Content-Type: {}\r\n", self.content_type);
        let _ = write!(head, "Content-Length: {}\r\n", self.content_length);
        head.push_str("Connection: close\r\n\r\n");
        head.into_bytes()
    }
}
