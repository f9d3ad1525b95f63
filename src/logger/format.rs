//! Access log format module
//!
//! Supports multiple log formats:
//! - `classic` (`ADDRESS [DATE] "METHOD" STATUS UA RESOURCE`)
//! - `common` (Common Log Format - CLF)
//! - `json` (JSON structured logging)
//! - Custom patterns with variables

use std::net::IpAddr;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::http::{http_date, ResponseEncoding, Status};

/// One served request
#[derive(Debug, Clone)]
pub struct AccessLogEntry {
    /// Client IP address
    pub remote_addr: IpAddr,
    /// Time the response was framed; the `Date` header is derived from it
    pub time: DateTime<Utc>,
    /// Uppercased method, empty for a malformed request line
    pub method: String,
    pub status: Status,
    /// User-Agent header, empty if absent
    pub user_agent: String,
    /// Resource token as received (lowercased)
    pub resource: String,
    /// Uncompressed body size in bytes
    pub body_bytes: u64,
    pub encoding: ResponseEncoding,
}

#[derive(Serialize)]
struct JsonRecord<'a> {
    remote_addr: String,
    time: String,
    method: &'a str,
    resource: &'a str,
    status: u16,
    user_agent: &'a str,
    body_bytes: u64,
    encoding: &'a str,
}

impl AccessLogEntry {
    /// Format the log entry according to the specified format
    pub fn format(&self, format: &str) -> String {
        match format {
            "classic" => self.format_classic(),
            "common" => self.format_common(),
            "json" => self.format_json(),
            custom => self.format_custom(custom),
        }
    }

    fn date(&self) -> String {
        http_date(&self.time)
    }

    fn time_local(&self) -> String {
        self.time.format("%d/%b/%Y:%H:%M:%S %z").to_string()
    }

    const fn encoding_name(&self) -> &'static str {
        match self.encoding {
            ResponseEncoding::Identity => "identity",
            ResponseEncoding::Gzip => "gzip",
        }
    }

    fn format_classic(&self) -> String {
        format!(
            "{} [{}] \"{}\" {} {} {}",
            self.remote_addr,
            self.date(),
            self.method,
            self.status,
            self.user_agent,
            self.resource,
        )
    }

    /// `$remote_addr - - [$time_local] "$request_method $request_uri" $status $body_bytes`
    fn format_common(&self) -> String {
        format!(
            "{} - - [{}] \"{} {}\" {} {}",
            self.remote_addr,
            self.time_local(),
            self.method,
            self.resource,
            self.status.code(),
            self.body_bytes,
        )
    }

    fn format_json(&self) -> String {
        let record = JsonRecord {
            remote_addr: self.remote_addr.to_string(),
            time: self.time.to_rfc3339(),
            method: &self.method,
            resource: &self.resource,
            status: self.status.code(),
            user_agent: &self.user_agent,
            body_bytes: self.body_bytes,
            encoding: self.encoding_name(),
        };
        serde_json::to_string(&record).unwrap_or_default()
    }

    /// Custom format with variable substitution
    ///
    /// Supported variables:
    /// - `$remote_addr` - Client IP address
    /// - `$time_local` - Local time in Common Log Format
    /// - `$time_iso8601` - ISO 8601 timestamp
    /// - `$date` - The response `Date` header value
    /// - `$request_method` - HTTP method
    /// - `$request_uri` - Resource token
    /// - `$status` - Response status code
    /// - `$body_bytes` - Uncompressed body size
    /// - `$http_user_agent` - User-Agent header
    /// - `$encoding` - `identity` or `gzip`
    fn format_custom(&self, pattern: &str) -> String {
        pattern
            .replace("$remote_addr", &self.remote_addr.to_string())
            .replace("$time_local", &self.time_local())
            .replace("$time_iso8601", &self.time.to_rfc3339())
            .replace("$date", &self.date())
            .replace("$request_method", &self.method)
            .replace("$request_uri", &self.resource)
            .replace("$status", &self.status.code().to_string())
            .replace("$body_bytes", &self.body_bytes.to_string())
            .replace("$http_user_agent", &self.user_agent)
            .replace("$encoding", self.encoding_name())
    }
}
