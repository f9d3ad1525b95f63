// Configuration module entry point
// Loads the read-only configuration shared by every connection

mod types;

use std::net::{SocketAddr, ToSocketAddrs};

use crate::error::StartupError;
use crate::http::Status;

pub use types::{Config, HttpConfig, LoggingConfig, ServerConfig};

/// Environment variable prefix, e.g. `DOCROOT_SERVER__PORT=9000`
const ENV_PREFIX: &str = "DOCROOT";

impl Config {
    /// Load configuration from the given file, overridden by environment variables.
    /// A missing file is not an error: defaults and environment still apply.
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .set_default(
                "http.server_name",
                concat!("docroot/", env!("CARGO_PKG_VERSION")),
            )?
            .set_default("http.server_root", "server")?
            .set_default("http.web_root", "www")?
            .set_default("http.index_file", "index.html")?
            .set_default("logging.level", "info")?
            .set_default("logging.access_log", true)?
            .set_default("logging.access_log_format", "classic")?
            .build()?;

        settings.try_deserialize()
    }

    /// Check that both roots exist and the fixed documents are in place
    pub fn validate(&self) -> Result<(), StartupError> {
        let roots = [
            ("http.server_root", &self.http.server_root),
            ("http.web_root", &self.http.web_root),
        ];
        for (key, path) in roots {
            if !path.is_dir() {
                return Err(StartupError::MissingDirectory {
                    key,
                    path: path.clone(),
                });
            }
        }

        for status in Status::ERRORS {
            if let Some(name) = status.document() {
                let path = self.http.server_document(name);
                if !path.is_file() {
                    return Err(StartupError::MissingDocument { path });
                }
            }
        }

        Ok(())
    }

    /// Resolve the bind address; host names are looked up, first result wins
    pub fn get_socket_addr(&self) -> Result<SocketAddr, StartupError> {
        let addr = format!("{}:{}", self.server.host, self.server.port);
        let mut resolved = addr
            .to_socket_addrs()
            .map_err(|e| StartupError::Address {
                addr: addr.clone(),
                reason: e.to_string(),
            })?;

        resolved.next().ok_or_else(|| StartupError::Address {
            addr,
            reason: "host resolved to no addresses".to_string(),
        })
    }
}
