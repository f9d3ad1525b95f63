//! Request dispatch module
//!
//! One full request/response cycle over a single connection: parse the head,
//! select the target, frame the response and stream the body.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use chrono::Utc;
use tokio::fs::File;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};

use crate::config::Config;
use crate::error::{ParseError, ServeError};
use crate::handler::static_files::{self, ResolvedTarget};
use crate::http::{self, mime, BodyEncoder, ResponseEncoding, ResponseHead, Status};
use crate::logger::{self, AccessLogEntry};

const CHUNK_SIZE: usize = 8 * 1024;

/// Per-connection handler state; built fresh for every accepted connection
pub struct RequestHandler {
    config: Arc<Config>,
    peer_addr: SocketAddr,
}

/// What the request turned into before any byte is written
struct Plan {
    method: String,
    resource: String,
    protocol: String,
    user_agent: String,
    encoding: ResponseEncoding,
    target: ResolvedTarget,
}

impl RequestHandler {
    pub const fn new(config: Arc<Config>, peer_addr: SocketAddr) -> Self {
        Self { config, peer_addr }
    }

    /// Serve exactly one request.
    ///
    /// Returns `Ok(None)` when the peer closed without sending anything, and the
    /// access record otherwise. Both halves and the body file are dropped before
    /// this returns, whatever the outcome.
    pub async fn serve<R, W>(
        &self,
        reader: R,
        writer: W,
    ) -> Result<Option<AccessLogEntry>, ServeError>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut reader = BufReader::new(reader);
        let plan = match http::parse_request(&mut reader).await {
            Ok(request) => self.plan(&request).await,
            Err(ParseError::Closed) => return Ok(None),
            Err(ParseError::Malformed { line }) => {
                logger::log_debug(&format!(
                    "Malformed request line from {}: {line:?}",
                    self.peer_addr
                ));
                self.malformed_plan()
            }
            Err(ParseError::Io(e)) => return Err(ServeError::Read(e)),
        };
        drop(reader);

        let now = Utc::now();
        let date = http::http_date(&now);
        let body_bytes = self.respond(&plan, &date, writer).await?;

        Ok(Some(AccessLogEntry {
            remote_addr: self.peer_addr.ip(),
            time: now,
            method: plan.method,
            status: plan.target.status,
            user_agent: plan.user_agent,
            resource: plan.resource,
            body_bytes,
            encoding: plan.encoding,
        }))
    }

    async fn plan(&self, request: &http::Request) -> Plan {
        let target =
            static_files::select_target(request.method(), request.resource(), &self.config.http)
                .await;

        Plan {
            method: request.method().to_string(),
            resource: request.resource().to_string(),
            protocol: request.protocol().to_string(),
            user_agent: request.user_agent().to_string(),
            encoding: ResponseEncoding::negotiate(request.accept_encoding()),
            target,
        }
    }

    fn malformed_plan(&self) -> Plan {
        Plan {
            method: String::new(),
            resource: String::new(),
            protocol: http::FALLBACK_PROTOCOL.to_string(),
            user_agent: String::new(),
            encoding: ResponseEncoding::Identity,
            target: ResolvedTarget::error(Status::BadRequest, &self.config.http),
        }
    }

    /// Write head and body, returning the uncompressed body length
    async fn respond<W>(&self, plan: &Plan, date: &str, mut writer: W) -> Result<u64, ServeError>
    where
        W: AsyncWrite + Unpin,
    {
        let path = &plan.target.path;
        let body_error = |source| ServeError::Body {
            path: path.clone(),
            source,
        };
        let mut file = File::open(path).await.map_err(body_error)?;
        let metadata = file.metadata().await.map_err(body_error)?;
        if !metadata.is_file() {
            return Err(body_error(io::Error::new(
                io::ErrorKind::InvalidInput,
                "not a regular file",
            )));
        }
        let content_length = metadata.len();

        let head = ResponseHead {
            protocol: &plan.protocol,
            status: plan.target.status,
            server: &self.config.http.server_name,
            date,
            encoding: plan.encoding,
            content_type: mime::content_type(path),
            content_length,
        };
        writer
            .write_all(&head.to_bytes())
            .await
            .map_err(ServeError::Write)?;
        writer.flush().await.map_err(ServeError::Write)?;

        let mut body = BodyEncoder::new(plan.encoding, writer);
        let mut chunk = vec![0u8; CHUNK_SIZE];
        loop {
            let read = file.read(&mut chunk).await.map_err(body_error)?;
            if read == 0 {
                break;
            }
            body.write(&chunk[..read]).await.map_err(ServeError::Write)?;
        }

        let mut writer = body.finish().await.map_err(ServeError::Write)?;
        writer.shutdown().await.map_err(ServeError::Write)?;
        Ok(content_length)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{HttpConfig, LoggingConfig, ServerConfig};
    use flate2::read::GzDecoder;
    use std::fs;
    use std::io::Read;
    use tempfile::TempDir;

    fn fixture() -> (TempDir, RequestHandler) {
        let dir = tempfile::tempdir().unwrap();
        let server_root = dir.path().join("server");
        let web_root = dir.path().join("www");
        fs::create_dir_all(&server_root).unwrap();
        fs::create_dir_all(web_root.join("docs")).unwrap();
        fs::create_dir_all(web_root.join("empty")).unwrap();
        fs::write(server_root.join("400.html"), "<h1>400 Bad Request</h1>").unwrap();
        fs::write(server_root.join("404.html"), "<h1>404 Not Found</h1>").unwrap();
        fs::write(server_root.join("501.html"), "<h1>501 Not Implemented</h1>").unwrap();
        fs::write(web_root.join("index.html"), "<h1>home</h1>").unwrap();
        fs::write(web_root.join("docs/index.html"), "<h1>docs</h1>").unwrap();
        let big: String = (0..4000).map(|i| format!("line {i}\n")).collect();
        fs::write(web_root.join("docs/big.txt"), big).unwrap();
        fs::write(dir.path().join("secret"), "top secret").unwrap();

        let config = Config {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                workers: None,
            },
            http: HttpConfig {
                server_name: "docroot/test".to_string(),
                server_root,
                web_root,
                index_file: "index.html".to_string(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                access_log: true,
                access_log_format: "classic".to_string(),
                access_log_file: None,
                error_log_file: None,
            },
        };
        let peer: SocketAddr = "192.0.2.7:50123".parse().unwrap();
        (dir, RequestHandler::new(Arc::new(config), peer))
    }

    struct Reply {
        head: String,
        body: Vec<u8>,
    }

    impl Reply {
        fn status_line(&self) -> &str {
            self.head.lines().next().unwrap()
        }

        fn header(&self, name: &str) -> Option<&str> {
            self.head.lines().skip(1).find_map(|line| {
                let (key, value) = line.split_once(": ")?;
                (key == name).then_some(value)
            })
        }
    }

    async fn exchange(
        handler: &RequestHandler,
        request: &str,
    ) -> (Reply, Option<AccessLogEntry>) {
        let mut out = Vec::new();
        let entry = handler.serve(request.as_bytes(), &mut out).await.unwrap();
        let split = out
            .windows(4)
            .position(|w| w == b"\r\n\r\n")
            .expect("response has a header block");
        let reply = Reply {
            head: String::from_utf8(out[..split].to_vec()).unwrap(),
            body: out[split + 4..].to_vec(),
        };
        (reply, entry)
    }

    #[tokio::test]
    async fn test_root_serves_index_document() {
        let (_dir, handler) = fixture();
        let (reply, entry) = exchange(&handler, "GET / HTTP/1.1\r\nUser-Agent: test/1\r\n\r\n").await;

        assert_eq!(reply.status_line(), "HTTP/1.1 200 OK");
        assert_eq!(reply.body, b"<h1>home</h1>");
        assert_eq!(reply.header("Content-Length"), Some("13"));
        assert_eq!(reply.header("Content-Type"), Some("text/html; charset=utf-8"));
        assert_eq!(reply.header("Server"), Some("docroot/test"));
        assert_eq!(reply.header("Connection"), Some("close"));
        assert_eq!(reply.header("Content-Encoding"), None);
        assert!(reply.header("Date").unwrap().ends_with(" GMT"));

        let entry = entry.unwrap();
        assert_eq!(reply.header("Date"), Some(http::http_date(&entry.time).as_str()));
        assert_eq!(entry.status, Status::Ok);
        assert_eq!(entry.method, "GET");
        assert_eq!(entry.resource, "/");
        assert_eq!(entry.user_agent, "test/1");
        assert_eq!(entry.remote_addr.to_string(), "192.0.2.7");
    }

    #[tokio::test]
    async fn test_header_order() {
        let (_dir, handler) = fixture();
        let (reply, _) =
            exchange(&handler, "GET / HTTP/1.1\r\nAccept-Encoding: gzip\r\n\r\n").await;
        let names: Vec<&str> = reply
            .head
            .lines()
            .skip(1)
            .filter_map(|line| line.split_once(": ").map(|(k, _)| k))
            .collect();
        assert_eq!(
            names,
            [
                "Server",
                "Date",
                "Content-Encoding",
                "Content-Type",
                "Content-Length",
                "Connection"
            ]
        );
    }

    #[tokio::test]
    async fn test_traversal_gets_bad_request_document() {
        let (_dir, handler) = fixture();
        for method in ["GET", "POST"] {
            let request = format!("{method} /../secret HTTP/1.1\r\n\r\n");
            let (reply, entry) = exchange(&handler, &request).await;
            assert_eq!(reply.status_line(), "HTTP/1.1 400 Bad Request");
            assert_eq!(reply.body, b"<h1>400 Bad Request</h1>");
            assert_eq!(entry.unwrap().resource, "/../secret");
        }
    }

    #[tokio::test]
    async fn test_non_get_gets_not_implemented() {
        let (_dir, handler) = fixture();
        let (reply, _) = exchange(&handler, "HEAD /index.html HTTP/1.0\r\n\r\n").await;
        assert_eq!(reply.status_line(), "HTTP/1.0 501 Not Implemented");
        assert_eq!(reply.body, b"<h1>501 Not Implemented</h1>");
    }

    #[tokio::test]
    async fn test_missing_and_indexless_are_not_found() {
        let (_dir, handler) = fixture();
        for resource in ["/missing.html", "/empty"] {
            let request = format!("GET {resource} HTTP/1.1\r\n\r\n");
            let (reply, entry) = exchange(&handler, &request).await;
            assert_eq!(reply.status_line(), "HTTP/1.1 404 Not Found");
            assert_eq!(reply.body, b"<h1>404 Not Found</h1>");
            assert_eq!(entry.unwrap().status, Status::NotFound);
        }
    }

    #[tokio::test]
    async fn test_directory_serves_index() {
        let (_dir, handler) = fixture();
        let (reply, _) = exchange(&handler, "GET /DOCS HTTP/1.1\r\n\r\n").await;
        assert_eq!(reply.status_line(), "HTTP/1.1 200 OK");
        assert_eq!(reply.body, b"<h1>docs</h1>");
    }

    #[tokio::test]
    async fn test_gzip_round_trip_keeps_uncompressed_length() {
        let (dir, handler) = fixture();
        let original = fs::read(dir.path().join("www/docs/big.txt")).unwrap();

        let (reply, entry) = exchange(
            &handler,
            "GET /docs/big.txt HTTP/1.1\r\nAccept-Encoding: deflate, gzip\r\n\r\n",
        )
        .await;

        assert_eq!(reply.header("Content-Encoding"), Some("gzip"));
        assert_eq!(reply.header("Content-Type"), Some("text/plain; charset=utf-8"));
        assert_eq!(
            reply.header("Content-Length"),
            Some(original.len().to_string().as_str())
        );
        assert!(reply.body.len() < original.len());

        let mut decoded = Vec::new();
        GzDecoder::new(reply.body.as_slice())
            .read_to_end(&mut decoded)
            .unwrap();
        assert_eq!(decoded, original);
        assert_eq!(entry.unwrap().encoding, ResponseEncoding::Gzip);
    }

    #[tokio::test]
    async fn test_identity_body_matches_file() {
        let (dir, handler) = fixture();
        let original = fs::read(dir.path().join("www/docs/big.txt")).unwrap();
        let (reply, entry) = exchange(&handler, "GET /docs/big.txt HTTP/1.1\r\n\r\n").await;
        assert_eq!(reply.body, original);
        assert_eq!(entry.unwrap().body_bytes, original.len() as u64);
    }

    #[tokio::test]
    async fn test_repeated_requests_are_identical() {
        let (_dir, handler) = fixture();
        let (first, _) = exchange(&handler, "GET /docs/ HTTP/1.1\r\n\r\n").await;
        let (second, _) = exchange(&handler, "GET /docs/ HTTP/1.1\r\n\r\n").await;
        assert_eq!(first.status_line(), second.status_line());
        assert_eq!(first.body, second.body);
    }

    #[tokio::test]
    async fn test_malformed_request_line_gets_bad_request() {
        let (_dir, handler) = fixture();
        let (reply, entry) = exchange(&handler, "GARBAGE\r\nHost: x\r\n\r\n").await;
        assert_eq!(reply.status_line(), "HTTP/1.0 400 Bad Request");
        assert_eq!(reply.body, b"<h1>400 Bad Request</h1>");
        assert_eq!(entry.unwrap().status, Status::BadRequest);
    }

    #[tokio::test]
    async fn test_closed_connection_writes_nothing() {
        let (_dir, handler) = fixture();
        let mut out = Vec::new();
        let entry = handler.serve(&b""[..], &mut out).await.unwrap();
        assert!(entry.is_none());
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn test_missing_error_document_aborts_response() {
        let (dir, handler) = fixture();
        fs::remove_file(dir.path().join("server/404.html")).unwrap();

        let mut out = Vec::new();
        let result = handler
            .serve(&b"GET /nope HTTP/1.1\r\n\r\n"[..], &mut out)
            .await;
        assert!(matches!(result, Err(ServeError::Body { .. })));
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn test_directory_index_document_aborts_before_head() {
        let (dir, handler) = fixture();
        let index = dir.path().join("www/docs/index.html");
        fs::remove_file(&index).unwrap();
        fs::create_dir(&index).unwrap();

        let mut out = Vec::new();
        let result = handler
            .serve(&b"GET /docs HTTP/1.1\r\n\r\n"[..], &mut out)
            .await;
        match result {
            Err(ServeError::Body { path, source }) => {
                assert_eq!(path, index);
                assert_eq!(source.kind(), io::ErrorKind::InvalidInput);
            }
            other => panic!("expected body error, got {other:?}"),
        }
        assert!(out.is_empty());
    }
}
