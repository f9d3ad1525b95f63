// Configuration types module
// Defines all configuration-related data structures

use serde::Deserialize;
use std::path::PathBuf;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub http: HttpConfig,
    pub logging: LoggingConfig,
}

/// Listener configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Bind name, an IP literal or a resolvable host name
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

/// Request handling configuration
#[derive(Debug, Deserialize, Clone)]
pub struct HttpConfig {
    /// Value of the `Server` response header
    pub server_name: String,
    /// Directory holding the fixed 400/404/501 documents
    pub server_root: PathBuf,
    /// Directory all successful responses are served from
    pub web_root: PathBuf,
    /// Document served for `/` and for directories
    pub index_file: String,
}

impl HttpConfig {
    pub fn server_document(&self, name: &str) -> PathBuf {
        self.server_root.join(name)
    }
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub access_log: bool,
    /// Access log format (classic, common, json, or custom pattern)
    pub access_log_format: String,
    /// Access log file path (optional, stdout if not set)
    #[serde(default)]
    pub access_log_file: Option<String>,
    /// Error log file path (optional, stderr if not set)
    #[serde(default)]
    pub error_log_file: Option<String>,
}
