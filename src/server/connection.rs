// Connection handling module
// Runs one request handler per accepted TCP connection

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpStream;
use tokio::task::JoinSet;

use crate::config::Config;
use crate::handler::RequestHandler;
use crate::logger;

/// Handle a single connection in a task tracked by `tasks`.
///
/// The task owns the stream; it is closed when the task ends, on success and
/// on every error path. Failures are logged and never reach the accept loop.
pub fn handle_connection(
    tasks: &mut JoinSet<()>,
    stream: TcpStream,
    peer_addr: SocketAddr,
    config: Arc<Config>,
) {
    tasks.spawn(async move {
        logger::log_debug(&format!("Accepted connection from {peer_addr}"));

        let (reader, writer) = stream.into_split();
        let handler = RequestHandler::new(Arc::clone(&config), peer_addr);

        match handler.serve(reader, writer).await {
            Ok(Some(entry)) => {
                if config.logging.access_log {
                    logger::log_access(&entry, &config.logging.access_log_format);
                }
            }
            Ok(None) => {
                logger::log_debug(&format!("{peer_addr} closed without sending a request"));
            }
            Err(e) => logger::log_connection_error(&peer_addr, &e),
        }
    });
}
